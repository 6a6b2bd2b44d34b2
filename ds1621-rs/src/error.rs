use core::fmt;

#[derive(Debug, PartialEq)]
/// Represents errors that can occur while interacting with the DS1621 sensor.
pub enum Error<E> {
    /// An error occurred while communicating with the I2C bus.
    I2c(E),
    /// The conversion did not report completion within the configured number of polls.
    Timeout,
    /// The slope register read back as zero, so the temperature cannot be interpolated.
    DivideByZero,
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::I2c(e)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C bus error: {e:?}"),
            Error::Timeout => write!(f, "temperature conversion timed out"),
            Error::DivideByZero => write!(f, "slope register is zero"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {}
