#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]
//!# DS1621 - Driver for the Analog Devices DS1621 Digital Thermometer and Thermostat
//! This crate provides a driver for the DS1621 sensor, allowing you to configure the thermostat,
//! start and stop temperature conversions, and read whole-degree or high-resolution temperatures.
//!
//! The driver owns the I2C bus handle and a delay provider. It holds no device state: every
//! read goes to the bus.
//!
//! Every transfer, including configuration writes and register reads, goes to the address the
//! driver was built with. Some DS1621 code sends those to the fixed address `0x48` and only
//! threshold writes and conversion commands to the configured one; the two schemes agree only
//! when all address pins are tied low.
mod address;
mod device;
mod error;
mod register;

pub use address::SlaveAddress;
pub use device::{Ds1621, Ds1621Builder};
pub use error::Error;
pub use register::{
    Command, Configuration, ConversionMode, HighResTemperature, Polarity, Register,
    high_resolution, sign_extend,
};
