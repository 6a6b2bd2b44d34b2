use bitfield_struct::bitfield;
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

use crate::{Error, device::Ds1621};

/// Time in milliseconds the device needs to commit a write to its EEPROM.
pub(crate) const DS1621_EEPROM_WRITE_MS: u32 = 15;

pub(crate) trait Ds1621Register: Default {
    const REGISTER: Register;

    fn read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds1621<I, D>,
    ) -> Result<(), Error<I::Error>>;
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Registers of the DS1621, each selected by a single command byte.
pub enum Register {
    /// Last converted temperature, whole degrees (`0xAA`).
    Temperature = 0xaa,
    /// Upper thermostat trip point, TH (`0xA1`).
    HighThreshold = 0xa1,
    /// Lower thermostat trip point, TL (`0xA2`).
    LowThreshold = 0xa2,
    /// Configuration and status register (`0xAC`).
    Configuration = 0xac,
    /// Counts remaining at the end of the last conversion (`0xA8`).
    Counter = 0xa8,
    /// Counts per degree at the last conversion temperature (`0xA9`).
    Slope = 0xa9,
}

impl Register {
    /// The command byte that selects this register.
    #[inline]
    pub const fn command(self) -> u8 {
        self as u8
    }

    /// Whether the register holds a temperature in whole degrees.
    #[inline]
    pub const fn is_temperature(self) -> bool {
        matches!(
            self,
            Register::Temperature | Register::HighThreshold | Register::LowThreshold
        )
    }

    /// Whether the register is one of the writable thermostat thresholds.
    #[inline]
    pub const fn is_threshold(self) -> bool {
        matches!(self, Register::HighThreshold | Register::LowThreshold)
    }
}

impl TryFrom<u8> for Register {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use Register::*;
        match value {
            0xaa => Ok(Temperature),
            0xa1 => Ok(HighThreshold),
            0xa2 => Ok(LowThreshold),
            0xac => Ok(Configuration),
            0xa8 => Ok(Counter),
            0xa9 => Ok(Slope),
            _ => Err("Invalid register command"),
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Commands that act on the device without selecting a register.
pub enum Command {
    /// Start a temperature conversion (`0xEE`).
    StartConversion = 0xee,
    /// Stop a continuous temperature conversion (`0x22`).
    StopConversion = 0x22,
}

#[bitfield(u8)]
/// The DS1621 configuration and status register.
pub struct Configuration {
    /// Continuous or one-shot conversions.
    #[bits(1, default = ConversionMode::Continuous)]
    pub mode: ConversionMode,
    /// Active level of the thermostat output.
    #[bits(1, default = Polarity::ActiveLow)]
    pub polarity: Polarity,
    #[bits(2)]
    __: u8,
    /// The EEPROM is busy committing a write.
    #[bits(1, access = RO)]
    pub nv_busy: bool,
    /// The temperature has been at or below TL. Sticky until cleared.
    #[bits(1)]
    pub low_flag: bool,
    /// The temperature has been at or above TH. Sticky until cleared.
    #[bits(1)]
    pub high_flag: bool,
    /// The last conversion has completed.
    #[bits(1, access = RO)]
    pub done: bool,
}

impl Ds1621Register for Configuration {
    const REGISTER: Register = Register::Configuration;

    fn read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds1621<I, D>,
    ) -> Result<(), Error<I::Error>> {
        *self = dev.read_register(Self::REGISTER)?.into();
        Ok(())
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Conversion mode of the DS1621.
pub enum ConversionMode {
    #[default]
    /// Convert continuously after a start command until stopped.
    Continuous = 0b0,
    /// Perform a single conversion per start command.
    OneShot = 0b1,
}

impl ConversionMode {
    pub(crate) const fn from_bits(bits: u8) -> Self {
        if bits & 0b1 == 0b1 {
            ConversionMode::OneShot
        } else {
            ConversionMode::Continuous
        }
    }

    pub(crate) const fn into_bits(self) -> u8 {
        self as u8
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Active level of the thermostat output pin.
pub enum Polarity {
    #[default]
    /// The output is driven low when the thermostat trips.
    ActiveLow = 0b0,
    /// The output is driven high when the thermostat trips.
    ActiveHigh = 0b1,
}

impl Polarity {
    pub(crate) const fn from_bits(bits: u8) -> Self {
        if bits & 0b1 == 0b1 {
            Polarity::ActiveHigh
        } else {
            Polarity::ActiveLow
        }
    }

    pub(crate) const fn into_bits(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Default)]
/// Counts remaining in the slope accumulator at the end of a conversion.
pub(crate) struct CountRemain(pub(crate) u8);

impl Ds1621Register for CountRemain {
    const REGISTER: Register = Register::Counter;

    fn read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds1621<I, D>,
    ) -> Result<(), Error<I::Error>> {
        self.0 = dev.read_register(Self::REGISTER)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
/// Counts per degree Celsius at the temperature of the last conversion.
pub(crate) struct CountsPerDegree(pub(crate) u8);

impl Ds1621Register for CountsPerDegree {
    const REGISTER: Register = Register::Slope;

    fn read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds1621<I, D>,
    ) -> Result<(), Error<I::Error>> {
        self.0 = dev.read_register(Self::REGISTER)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
/// A temperature in hundredths of a degree Celsius.
pub struct HighResTemperature(pub(crate) i32);

impl HighResTemperature {
    /// Creates a temperature from hundredths of a degree Celsius.
    pub const fn from_centi(centi: i32) -> Self {
        Self(centi)
    }

    /// The temperature in hundredths of a degree Celsius.
    pub const fn centi(&self) -> i32 {
        self.0
    }

    /// The whole-degree part of the temperature, truncated toward zero.
    pub const fn whole(&self) -> i32 {
        self.0 / 100
    }

    /// Converts the temperature to degrees Celsius.
    pub fn celsius(&self) -> f32 {
        self.0 as f32 / 100.0
    }
}

impl core::fmt::Display for HighResTemperature {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Interprets a temperature register byte as a two's complement whole-degree value.
#[inline]
pub const fn sign_extend(raw: u8) -> i16 {
    raw as i8 as i16
}

/// Computes the temperature in hundredths of a degree from a whole-degree reading and
/// the counter and slope registers.
///
/// The half-degree bit the DS1621 drops from the whole-degree reading is replaced by the
/// count interpolation: `T = whole - 0.25 + (slope - remain) / slope`, with the magnitude
/// taken before subtracting for negative readings.
///
/// Returns [`None`] if `slope` is zero.
pub const fn high_resolution(whole: i16, count_remain: u8, slope: u8) -> Option<i32> {
    if slope == 0 {
        return None;
    }
    let whole = whole as i32;
    let slope = slope as i32;
    let frac = (slope - count_remain as i32) * 100 / slope;
    if whole >= 0 {
        Some(whole * 100 - 25 + frac)
    } else {
        Some(25 - (-whole) * 100 + frac)
    }
}
