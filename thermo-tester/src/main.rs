use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use clap::Parser;
use ds1621::{ConversionMode, Ds1621, Ds1621Builder, Register, SlaveAddress};
use linux_embedded_hal::{Delay, I2cdev};

/// Read high-resolution temperatures from a DS1621 sensor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to I2C bus (e.g., /dev/i2c-1)
    #[arg(short, long)]
    path: String,
    /// A0 address pin is tied high
    #[arg(long, default_value_t = false)]
    a0: bool,
    /// A1 address pin is tied high
    #[arg(long, default_value_t = false)]
    a1: bool,
    /// A2 address pin is tied high
    #[arg(long, default_value_t = false)]
    a2: bool,
    /// Leave the sensor in continuous conversion mode instead of switching it to one-shot
    #[arg(long, default_value_t = false)]
    continuous: bool,
    /// Low thermostat trip point in whole degrees Celsius
    #[arg(long, allow_negative_numbers = true)]
    low: Option<i16>,
    /// High thermostat trip point in whole degrees Celsius
    #[arg(long, allow_negative_numbers = true)]
    high: Option<i16>,
    /// Sampling period in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    interval_ms: u64,
    /// Give up on a conversion after this many status polls (0 = wait indefinitely)
    #[arg(long, default_value_t = 100)]
    timeout_polls: u32,
    /// Delay between status polls in microseconds
    #[arg(long, default_value_t = 10_000)]
    poll_us: u32,
    /// Number of samples to take (0 = run until interrupted)
    #[arg(short, long, default_value_t = 0)]
    count: u64,
}

impl Args {
    fn conversion_mode(&self) -> ConversionMode {
        if self.continuous {
            ConversionMode::Continuous
        } else {
            ConversionMode::OneShot
        }
    }

    fn conversion_timeout(&self) -> Option<u32> {
        (self.timeout_polls > 0).then_some(self.timeout_polls)
    }
}

fn main() {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    log::info!("Arguments: {args:#?}");
    // Synchronizer
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            if !running.swap(false, Ordering::Relaxed) {
                log::warn!("Received second Ctrl+C, exiting");
                std::process::exit(130);
            }
            log::info!("Received Ctrl+C, stopping... (press again to exit now)");
        })
        .expect("Error setting Ctrl-C handler");
    }
    let mut dev = init(&args);
    sample(&args, &mut dev, &running);
    if let Err(e) = dev.stop_conversion() {
        log::warn!("[DS1621] {}> Could not stop conversions: {e}", args.path);
    }
}

fn init(args: &Args) -> Ds1621<I2cdev, Delay> {
    log::info!("[DS1621] Opening bus: {}", args.path);
    // Open the I2C bus
    let i2c = I2cdev::new(&args.path).expect("Failed to open I2C device");
    let address = SlaveAddress::default()
        .with_a0(args.a0)
        .with_a1(args.a1)
        .with_a2(args.a2);
    let mut builder = Ds1621Builder::default()
        .with_address(address)
        .with_poll_interval_us(args.poll_us);
    if let Some(polls) = args.conversion_timeout() {
        builder = builder.with_conversion_timeout(polls);
    }
    let mut dev = builder.build(i2c, Delay);
    let path = &args.path;
    let addr = dev.address();

    let mode = args.conversion_mode();
    dev.set_conversion_mode(mode)
        .unwrap_or_else(|e| panic!("[DS1621] {path}> 0x{addr:02x}: Could not set {mode:?} mode: {e}"));
    if let Some(low) = args.low {
        dev.set_threshold(Register::LowThreshold, low)
            .unwrap_or_else(|e| panic!("[DS1621] {path}> 0x{addr:02x}: Could not set TL: {e}"));
    }
    if let Some(high) = args.high {
        dev.set_threshold(Register::HighThreshold, high)
            .unwrap_or_else(|e| panic!("[DS1621] {path}> 0x{addr:02x}: Could not set TH: {e}"));
    }
    match dev.read_configuration() {
        Ok(cfg) => log::info!("[DS1621] {path}> 0x{addr:02x}: {cfg:?}"),
        Err(e) => log::warn!("[DS1621] {path}> 0x{addr:02x}: Could not read configuration: {e}"),
    }
    match dev.read_thresholds() {
        Ok((low, high)) => log::info!("[DS1621] {path}> 0x{addr:02x}: TL {low} C, TH {high} C"),
        Err(e) => log::warn!("[DS1621] {path}> 0x{addr:02x}: Could not read thresholds: {e}"),
    }
    dev
}

fn sample(args: &Args, dev: &mut Ds1621<I2cdev, Delay>, running: &AtomicBool) {
    let period = Duration::from_millis(args.interval_ms);
    let path = &args.path;
    let addr = dev.address();
    let mut taken = 0u64;
    while running.load(Ordering::Relaxed) && (args.count == 0 || taken < args.count) {
        let start = Instant::now();
        taken += 1;
        match dev.read_high_resolution_temperature() {
            Ok(t) => {
                let whole = dev.read_temperature(Register::Temperature);
                let flags = dev.read_configuration();
                match (whole, flags) {
                    (Ok(whole), Ok(cfg)) => log::info!(
                        "[DS1621] {path}> 0x{addr:02x}: {t} C ({whole} C), TH flag {}, TL flag {}",
                        cfg.high_flag(),
                        cfg.low_flag()
                    ),
                    _ => log::info!("[DS1621] {path}> 0x{addr:02x}: {t} C"),
                }
            }
            Err(e) => log::warn!("[DS1621] {path}> 0x{addr:02x}: Error reading: {e}"),
        }
        log::debug!(
            "[DS1621] {path}> Sample {taken} took {:.2} ms.",
            start.elapsed().as_secs_f64() * 1000.0
        );
        if let Some(rest) = period.checked_sub(start.elapsed()) {
            thread::sleep(rest);
        }
    }
}
