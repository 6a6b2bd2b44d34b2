use bitfield_struct::bitfield;

#[bitfield(u8)]
/// Represents the slave address for the DS1621 sensor.
/// The address is 7 bits long: the fixed device type `0b1001` followed by the three address pins.
/// The default address is 0x48 (0x90 >> 1), with all address pins tied low.
/// The address can be configured by setting the `a0`, `a1` and `a2` bits.
pub struct SlaveAddress {
    /// State of the A0 address pin.
    #[bits(1, default = false)]
    pub a0: bool,
    /// State of the A1 address pin.
    #[bits(1, default = false)]
    pub a1: bool,
    /// State of the A2 address pin.
    #[bits(1, default = false)]
    pub a2: bool,
    /// Fixed device type code.
    #[bits(4, default = 0x90 >> 4, access = RO)]
    pub device_type: u8,
    #[bits(1)]
    __: u8,
}
