use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

use crate::{
    Error, HighResTemperature,
    address::SlaveAddress,
    register::{
        Command, Configuration, ConversionMode, CountRemain, CountsPerDegree,
        DS1621_EEPROM_WRITE_MS, Ds1621Register, Polarity, Register, high_resolution, sign_extend,
    },
};

/// Represents the DS1621 sensor.
///
/// The driver owns the bus and a delay provider. Every read goes to the device; nothing
/// read from a register is kept between calls.
pub struct Ds1621<I, D> {
    pub(crate) i2c: I,
    pub(crate) delay: D,
    pub(crate) address: u8,
    pub(crate) timeout: Option<u32>,
    pub(crate) poll_interval_us: u32,
}

#[derive(Debug, Default)]
/// Builder for a DS1621 sensor.
pub struct Ds1621Builder {
    pub(crate) address: SlaveAddress,
    pub(crate) timeout: Option<u32>,
    pub(crate) poll_interval_us: u32,
}

impl Ds1621Builder {
    /// Set the address of the DS1621 sensor.
    pub fn with_address(mut self, address: SlaveAddress) -> Self {
        self.address = address;
        self
    }

    /// Give up waiting for a conversion after `polls` reads of the configuration register.
    ///
    /// The register is always read at least once, so a bound of `0` behaves like `1`.
    /// Without a bound, [`Ds1621::read_high_resolution_temperature`] blocks until the device
    /// reports the conversion done.
    pub fn with_conversion_timeout(mut self, polls: u32) -> Self {
        self.timeout = Some(polls);
        self
    }

    /// Wait `interval` microseconds between reads of the configuration register while a
    /// conversion is in progress.
    pub fn with_poll_interval_us(mut self, interval: u32) -> Self {
        self.poll_interval_us = interval;
        self
    }

    /// Build the DS1621 sensor with the specified configuration.
    ///
    /// The bus must already be initialized. No bus traffic happens here.
    pub fn build<I: I2c<SevenBitAddress>, D: DelayNs>(self, i2c: I, delay: D) -> Ds1621<I, D> {
        Ds1621 {
            i2c,
            delay,
            address: self.address.into_bits(),
            timeout: self.timeout,
            poll_interval_us: self.poll_interval_us,
        }
    }
}

impl<I: I2c<SevenBitAddress>, D: DelayNs> Ds1621<I, D> {
    /// Create a driver for the device at `address` with unbounded conversion polling.
    pub fn new(i2c: I, delay: D, address: SlaveAddress) -> Self {
        Ds1621Builder::default().with_address(address).build(i2c, delay)
    }

    /// Get the address of the device.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Release the bus and the delay provider.
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    /// Get the builder for the DS1621 sensor.
    /// This allows you to change the polling policy.
    pub fn to_builder(self) -> (Ds1621Builder, I, D) {
        (
            Ds1621Builder {
                address: SlaveAddress::from_bits(self.address),
                timeout: self.timeout,
                poll_interval_us: self.poll_interval_us,
            },
            self.i2c,
            self.delay,
        )
    }

    /// Write a raw byte to the configuration register.
    ///
    /// Blocks for the EEPROM write time after the transfer.
    pub fn set_configuration(&mut self, cfg: u8) -> Result<(), Error<I::Error>> {
        log::debug!("[DS1621] 0x{:02x}> Configuration <- 0x{cfg:02x}", self.address);
        self.i2c
            .write(self.address, &[Register::Configuration.command(), cfg])?;
        self.delay.delay_ms(DS1621_EEPROM_WRITE_MS);
        Ok(())
    }

    /// Write the configuration register.
    ///
    /// The `done` and `nv_busy` bits are written as they are; the device ignores them.
    pub fn write_configuration(&mut self, cfg: Configuration) -> Result<(), Error<I::Error>> {
        self.set_configuration(cfg.into_bits())
    }

    /// Read the configuration register.
    pub fn read_configuration(&mut self) -> Result<Configuration, Error<I::Error>> {
        let mut cfg = Configuration::default();
        cfg.read(self)?;
        Ok(cfg)
    }

    /// Set one-shot or continuous conversions.
    pub fn set_conversion_mode(&mut self, mode: ConversionMode) -> Result<(), Error<I::Error>> {
        let cfg = self.read_configuration()?;
        self.write_configuration(cfg.with_mode(mode))
    }

    /// Set the active level of the thermostat output.
    pub fn set_polarity(&mut self, polarity: Polarity) -> Result<(), Error<I::Error>> {
        let cfg = self.read_configuration()?;
        self.write_configuration(cfg.with_polarity(polarity))
    }

    /// Clear the sticky high and low temperature flags.
    pub fn clear_flags(&mut self) -> Result<(), Error<I::Error>> {
        let cfg = self.read_configuration()?;
        self.write_configuration(cfg.with_high_flag(false).with_low_flag(false))
    }

    /// Set a thermostat trip point in whole degrees Celsius.
    ///
    /// Only [`Register::LowThreshold`] and [`Register::HighThreshold`] are accepted; for any
    /// other register this does nothing and touches no bus. The value is written as the low
    /// 8 bits of `celsius` in two's complement, with the half-degree byte cleared.
    pub fn set_threshold(&mut self, reg: Register, celsius: i16) -> Result<(), Error<I::Error>> {
        if !reg.is_threshold() {
            return Ok(());
        }
        log::debug!("[DS1621] 0x{:02x}> {reg:?} <- {celsius}", self.address);
        self.i2c
            .write(self.address, &[reg.command(), celsius as u8, 0])?;
        self.delay.delay_ms(DS1621_EEPROM_WRITE_MS);
        Ok(())
    }

    /// Read the low and high thermostat trip points, in that order.
    pub fn read_thresholds(&mut self) -> Result<(i16, i16), Error<I::Error>> {
        let low = self.read_temperature(Register::LowThreshold)?;
        let high = self.read_temperature(Register::HighThreshold)?;
        Ok((low, high))
    }

    /// Send a start or stop conversion command.
    pub fn set_conversion(&mut self, start: bool) -> Result<(), Error<I::Error>> {
        let cmd = if start {
            Command::StartConversion
        } else {
            Command::StopConversion
        };
        self.i2c.write(self.address, &[cmd as u8])?;
        Ok(())
    }

    /// Start a temperature conversion.
    pub fn start_conversion(&mut self) -> Result<(), Error<I::Error>> {
        self.set_conversion(true)
    }

    /// Stop a continuous temperature conversion.
    pub fn stop_conversion(&mut self) -> Result<(), Error<I::Error>> {
        self.set_conversion(false)
    }

    /// Read a single register byte.
    ///
    /// The register is selected in one transfer and read back in a second one.
    pub fn read_register(&mut self, reg: Register) -> Result<u8, Error<I::Error>> {
        self.i2c.write(self.address, &[reg.command()])?;
        let mut buf = [0u8; 1];
        self.i2c.read(self.address, &mut buf)?;
        Ok(buf[0])
    }

    /// Read a temperature register in whole degrees Celsius.
    ///
    /// Only [`Register::Temperature`], [`Register::LowThreshold`] and
    /// [`Register::HighThreshold`] hold temperatures; any other register reads as `0`
    /// without touching the bus.
    pub fn read_temperature(&mut self, reg: Register) -> Result<i16, Error<I::Error>> {
        if !reg.is_temperature() {
            return Ok(0);
        }
        let raw = self.read_register(reg)?;
        Ok(sign_extend(raw))
    }

    /// Check whether the last conversion has completed.
    pub fn is_conversion_done(&mut self) -> Result<bool, Error<I::Error>> {
        Ok(self.read_configuration()?.done())
    }

    /// Poll the configuration register until the device reports the conversion done.
    pub fn wait_for_conversion(&mut self) -> Result<(), Error<I::Error>> {
        let mut polls: u32 = 0;
        loop {
            let cfg = self.read_configuration()?;
            polls = polls.saturating_add(1);
            log::trace!(
                "[DS1621] 0x{:02x}> Poll {polls}: config 0x{:02x}",
                self.address,
                cfg.into_bits()
            );
            if cfg.done() {
                return Ok(());
            }
            if let Some(max) = self.timeout {
                if polls >= max {
                    log::warn!(
                        "[DS1621] 0x{:02x}> Conversion not done after {polls} polls",
                        self.address
                    );
                    return Err(Error::Timeout);
                }
            }
            if self.poll_interval_us > 0 {
                self.delay.delay_us(self.poll_interval_us);
            }
        }
    }

    /// Run a conversion and read the temperature in hundredths of a degree Celsius.
    ///
    /// The device should be in one-shot mode. Blocks until the conversion completes, or
    /// fails with [`Error::Timeout`] if a polling bound was configured and exceeded.
    /// Fails with [`Error::DivideByZero`] if the slope register reads zero.
    pub fn read_high_resolution_temperature(
        &mut self,
    ) -> Result<HighResTemperature, Error<I::Error>> {
        self.start_conversion()?;
        self.wait_for_conversion()?;
        let whole = self.read_temperature(Register::Temperature)?;
        let mut remain = CountRemain::default();
        remain.read(self)?;
        let mut slope = CountsPerDegree::default();
        slope.read(self)?;
        match high_resolution(whole, remain.0, slope.0) {
            Some(centi) => {
                log::debug!(
                    "[DS1621] 0x{:02x}> {whole} C, remain {}, slope {}: {centi} cC",
                    self.address,
                    remain.0,
                    slope.0
                );
                Ok(HighResTemperature(centi))
            }
            None => {
                log::warn!("[DS1621] 0x{:02x}> Slope register is zero", self.address);
                Err(Error::DivideByZero)
            }
        }
    }
}
