use ds1621::{
    ConversionMode, Ds1621, Ds1621Builder, Error, Polarity, Register, SlaveAddress,
};
use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::{
    delay::{CheckedDelay, NoopDelay, Transaction as DelayTransaction},
    i2c::{Mock as I2cMock, Transaction as I2cTransaction},
};

const ADDR: u8 = 0x48;

fn select(reg: u8, value: u8) -> [I2cTransaction; 2] {
    [
        I2cTransaction::write(ADDR, vec![reg]),
        I2cTransaction::read(ADDR, vec![value]),
    ]
}

fn driver(expectations: &[I2cTransaction]) -> Ds1621<I2cMock, NoopDelay> {
    Ds1621::new(I2cMock::new(expectations), NoopDelay::new(), SlaveAddress::default())
}

fn finish(dev: Ds1621<I2cMock, NoopDelay>) {
    let (mut i2c, _) = dev.release();
    i2c.done();
}

fn checked(
    i2c: &[I2cTransaction],
    delays: &[DelayTransaction],
    builder: Ds1621Builder,
) -> Ds1621<I2cMock, CheckedDelay> {
    builder.build(I2cMock::new(i2c), CheckedDelay::new(delays))
}

fn finish_checked(dev: Ds1621<I2cMock, CheckedDelay>) {
    let (mut i2c, mut delay) = dev.release();
    i2c.done();
    delay.done();
}

#[test]
fn set_configuration() {
    let mut dev = driver(&[I2cTransaction::write(ADDR, vec![0xac, 0x01])]);
    dev.set_configuration(0x01).unwrap();
    finish(dev);
}

#[test]
fn set_threshold_writes_whole_and_zero_fraction() {
    let mut dev = driver(&[
        I2cTransaction::write(ADDR, vec![0xa1, 30, 0x00]),
        I2cTransaction::write(ADDR, vec![0xa2, 0xf6, 0x00]),
    ]);
    dev.set_threshold(Register::HighThreshold, 30).unwrap();
    dev.set_threshold(Register::LowThreshold, -10).unwrap();
    finish(dev);
}

#[test]
fn set_threshold_truncates_to_low_byte() {
    let mut dev = driver(&[I2cTransaction::write(ADDR, vec![0xa1, 0x2c, 0x00])]);
    dev.set_threshold(Register::HighThreshold, 300).unwrap();
    finish(dev);
}

#[test]
fn set_threshold_ignores_other_registers() {
    let mut dev = driver(&[]);
    for reg in [
        Register::Temperature,
        Register::Configuration,
        Register::Counter,
        Register::Slope,
    ] {
        dev.set_threshold(reg, 42).unwrap();
    }
    finish(dev);
}

#[test]
fn start_stop_conversion() {
    let mut dev = driver(&[
        I2cTransaction::write(ADDR, vec![0xee]),
        I2cTransaction::write(ADDR, vec![0x22]),
        I2cTransaction::write(ADDR, vec![0xee]),
    ]);
    dev.set_conversion(true).unwrap();
    dev.set_conversion(false).unwrap();
    dev.start_conversion().unwrap();
    finish(dev);
}

#[test]
fn read_register_uses_two_transfers() {
    let mut dev = driver(&select(0xa8, 0x05));
    assert_eq!(dev.read_register(Register::Counter).unwrap(), 0x05);
    finish(dev);
}

#[test]
fn read_temperature_sign_extends() {
    let mut expectations = Vec::new();
    expectations.extend(select(0xaa, 0x19));
    expectations.extend(select(0xaa, 0xf6));
    expectations.extend(select(0xa2, 0x80));
    expectations.extend(select(0xa1, 0x7f));
    let mut dev = driver(&expectations);
    assert_eq!(dev.read_temperature(Register::Temperature).unwrap(), 25);
    assert_eq!(dev.read_temperature(Register::Temperature).unwrap(), -10);
    assert_eq!(dev.read_temperature(Register::LowThreshold).unwrap(), -128);
    assert_eq!(dev.read_temperature(Register::HighThreshold).unwrap(), 127);
    finish(dev);
}

#[test]
fn read_temperature_other_registers_are_zero() {
    let mut dev = driver(&[]);
    for reg in [Register::Configuration, Register::Counter, Register::Slope] {
        assert_eq!(dev.read_temperature(reg).unwrap(), 0);
    }
    finish(dev);
}

#[test]
fn read_thresholds() {
    let mut expectations = Vec::new();
    expectations.extend(select(0xa2, 0xfb));
    expectations.extend(select(0xa1, 0x1e));
    let mut dev = driver(&expectations);
    assert_eq!(dev.read_thresholds().unwrap(), (-5, 30));
    finish(dev);
}

#[test]
fn high_resolution_positive() {
    let mut expectations = vec![I2cTransaction::write(ADDR, vec![0xee])];
    expectations.extend(select(0xac, 0x01));
    expectations.extend(select(0xac, 0x01));
    expectations.extend(select(0xac, 0x81));
    expectations.extend(select(0xaa, 25));
    expectations.extend(select(0xa8, 4));
    expectations.extend(select(0xa9, 16));
    let mut dev = driver(&expectations);
    let t = dev.read_high_resolution_temperature().unwrap();
    assert_eq!(t.centi(), 2550);
    finish(dev);
}

#[test]
fn high_resolution_negative() {
    let mut expectations = vec![I2cTransaction::write(ADDR, vec![0xee])];
    expectations.extend(select(0xac, 0x81));
    expectations.extend(select(0xaa, 0xf6));
    expectations.extend(select(0xa8, 4));
    expectations.extend(select(0xa9, 16));
    let mut dev = driver(&expectations);
    let t = dev.read_high_resolution_temperature().unwrap();
    assert_eq!(t.centi(), -900);
    finish(dev);
}

#[test]
fn high_resolution_zero_slope() {
    let mut expectations = vec![I2cTransaction::write(ADDR, vec![0xee])];
    expectations.extend(select(0xac, 0x80));
    expectations.extend(select(0xaa, 25));
    expectations.extend(select(0xa8, 4));
    expectations.extend(select(0xa9, 0));
    let mut dev = driver(&expectations);
    assert_eq!(
        dev.read_high_resolution_temperature(),
        Err(Error::DivideByZero)
    );
    finish(dev);
}

#[test]
fn conversion_timeout() {
    let mut expectations = vec![I2cTransaction::write(ADDR, vec![0xee])];
    for _ in 0..3 {
        expectations.extend(select(0xac, 0x01));
    }
    let mut dev = Ds1621Builder::default()
        .with_conversion_timeout(3)
        .with_poll_interval_us(10)
        .build(I2cMock::new(&expectations), NoopDelay::new());
    assert_eq!(dev.read_high_resolution_temperature(), Err(Error::Timeout));
    finish(dev);
}

#[test]
fn typed_configuration() {
    let mut expectations = Vec::new();
    expectations.extend(select(0xac, 0x8c));
    expectations.push(I2cTransaction::write(ADDR, vec![0xac, 0x8d]));
    expectations.extend(select(0xac, 0x8d));
    expectations.push(I2cTransaction::write(ADDR, vec![0xac, 0x8f]));
    expectations.extend(select(0xac, 0xef));
    expectations.push(I2cTransaction::write(ADDR, vec![0xac, 0x8f]));
    let mut dev = driver(&expectations);
    dev.set_conversion_mode(ConversionMode::OneShot).unwrap();
    dev.set_polarity(Polarity::ActiveHigh).unwrap();
    dev.clear_flags().unwrap();
    finish(dev);
}

#[test]
fn addressed_device() {
    let addr = 0x4b;
    let mut dev = Ds1621Builder::default()
        .with_address(SlaveAddress::default().with_a0(true).with_a1(true))
        .build(
            I2cMock::new(&[
                I2cTransaction::write(addr, vec![0xac, 0x01]),
                I2cTransaction::write(addr, vec![0xa9]),
                I2cTransaction::read(addr, vec![0x10]),
            ]),
            NoopDelay::new(),
        );
    assert_eq!(dev.address(), addr);
    dev.set_configuration(0x01).unwrap();
    assert_eq!(dev.read_register(Register::Slope).unwrap(), 0x10);
    finish(dev);
}

#[test]
fn bus_errors_propagate() {
    let mut dev = driver(&[I2cTransaction::write(ADDR, vec![0xaa]).with_error(ErrorKind::Other)]);
    assert_eq!(
        dev.read_temperature(Register::Temperature),
        Err(Error::I2c(ErrorKind::Other))
    );
    finish(dev);
}

#[test]
fn writes_wait_for_eeprom() {
    let mut dev = checked(
        &[
            I2cTransaction::write(ADDR, vec![0xac, 0x01]),
            I2cTransaction::write(ADDR, vec![0xa1, 30, 0x00]),
            I2cTransaction::write(ADDR, vec![0xa2, 20, 0x00]),
        ],
        &[
            DelayTransaction::delay_ms(15),
            DelayTransaction::delay_ms(15),
            DelayTransaction::delay_ms(15),
        ],
        Ds1621Builder::default(),
    );
    dev.set_configuration(0x01).unwrap();
    dev.set_threshold(Register::HighThreshold, 30).unwrap();
    dev.set_threshold(Register::LowThreshold, 20).unwrap();
    // ignored selector: no transfer, no wait
    dev.set_threshold(Register::Slope, 20).unwrap();
    finish_checked(dev);
}

#[test]
fn typed_configuration_waits_for_eeprom() {
    let mut i2c = Vec::new();
    i2c.extend(select(0xac, 0x8c));
    i2c.push(I2cTransaction::write(ADDR, vec![0xac, 0x8d]));
    let mut dev = checked(
        &i2c,
        &[DelayTransaction::delay_ms(15)],
        Ds1621Builder::default(),
    );
    dev.set_conversion_mode(ConversionMode::OneShot).unwrap();
    finish_checked(dev);
}

#[test]
fn conversion_commands_do_not_wait() {
    let mut dev = checked(
        &[
            I2cTransaction::write(ADDR, vec![0xee]),
            I2cTransaction::write(ADDR, vec![0x22]),
        ],
        &[],
        Ds1621Builder::default(),
    );
    dev.start_conversion().unwrap();
    dev.stop_conversion().unwrap();
    finish_checked(dev);
}

#[test]
fn poll_interval_spaces_busy_polls() {
    let mut i2c = vec![I2cTransaction::write(ADDR, vec![0xee])];
    i2c.extend(select(0xac, 0x01));
    i2c.extend(select(0xac, 0x01));
    i2c.extend(select(0xac, 0x81));
    i2c.extend(select(0xaa, 25));
    i2c.extend(select(0xa8, 4));
    i2c.extend(select(0xa9, 16));
    let mut dev = checked(
        &i2c,
        &[
            DelayTransaction::delay_us(250),
            DelayTransaction::delay_us(250),
        ],
        Ds1621Builder::default().with_poll_interval_us(250),
    );
    assert_eq!(dev.read_high_resolution_temperature().unwrap().centi(), 2550);
    finish_checked(dev);
}

#[test]
fn zero_poll_interval_polls_back_to_back() {
    let mut i2c = vec![I2cTransaction::write(ADDR, vec![0xee])];
    i2c.extend(select(0xac, 0x01));
    i2c.extend(select(0xac, 0x81));
    i2c.extend(select(0xaa, 25));
    i2c.extend(select(0xa8, 4));
    i2c.extend(select(0xa9, 16));
    let mut dev = checked(&i2c, &[], Ds1621Builder::default());
    assert_eq!(dev.read_high_resolution_temperature().unwrap().centi(), 2550);
    finish_checked(dev);
}

#[test]
fn timeout_does_not_wait_after_last_poll() {
    let mut i2c = vec![I2cTransaction::write(ADDR, vec![0xee])];
    for _ in 0..3 {
        i2c.extend(select(0xac, 0x01));
    }
    let mut dev = checked(
        &i2c,
        &[
            DelayTransaction::delay_us(100),
            DelayTransaction::delay_us(100),
        ],
        Ds1621Builder::default()
            .with_conversion_timeout(3)
            .with_poll_interval_us(100),
    );
    assert_eq!(dev.read_high_resolution_temperature(), Err(Error::Timeout));
    finish_checked(dev);
}

#[test]
fn zero_timeout_reads_once() {
    let mut i2c = vec![I2cTransaction::write(ADDR, vec![0xee])];
    i2c.extend(select(0xac, 0x01));
    let mut dev = checked(
        &i2c,
        &[],
        Ds1621Builder::default()
            .with_conversion_timeout(0)
            .with_poll_interval_us(100),
    );
    assert_eq!(dev.read_high_resolution_temperature(), Err(Error::Timeout));
    finish_checked(dev);
}
