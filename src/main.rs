mod actuators;
mod channels;
mod config;
mod control;
mod indicators;
mod lights;
mod serial;
mod siren;
mod telemetry;

use actuators::Actuators;
use channels::{ChannelBank, ChannelId};
use config::Settings;
use control::{Arbitrator, DriveMode, mode_from_pulse, parse_line};
use indicators::Indicators;
use lights::{IndicatorLamps, RgbFlasher};
use serial::serial_thread;
use siren::Siren;
use telemetry::{TelemetrySnapshot, telemetry_thread};

use anyhow::Result;
use rppal::gpio::Gpio;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const SETTINGS_PATH: &str = "settings.json";
const CYCLE_MS: u64 = 5;
const SERIAL_QUEUE: usize = 8;

fn main() -> Result<()> {
    println!("Starting RC Car Controller");

    let settings = match Settings::load(SETTINGS_PATH) {
        Ok(s) => {
            println!("[CFG] loaded {}", SETTINGS_PATH);
            s
        }
        Err(e) => {
            println!("[CFG] {} not usable ({}), using defaults", SETTINGS_PATH, e);
            Settings::default()
        }
    };
    if let Err(e) = settings.save(SETTINGS_PATH) {
        eprintln!("[CFG] save failed: {}", e);
    }

    let gpio = Gpio::new()?;
    let bank = ChannelBank::new(
        &gpio,
        [
            settings.pins.steer_in,
            settings.pins.throttle_in,
            settings.pins.mode_in,
            settings.pins.rgb_in,
            settings.pins.siren_in,
        ],
    )?;
    let mut actuators = Actuators::new(&gpio, settings.pins.steer_out, settings.pins.esc_out)?;
    let mut lamps = IndicatorLamps::new(&gpio, settings.pins.left_led, settings.pins.right_led)?;
    let mut rgb = RgbFlasher::new(&gpio, settings.pins.red, settings.pins.green, settings.pins.blue)?;
    let mut siren = Siren::new(&gpio, settings.pins.speaker)?;

    let (tx_line, rx_line): (SyncSender<String>, Receiver<String>) =
        mpsc::sync_channel(SERIAL_QUEUE);
    {
        let path = settings.uart_path.clone();
        let baud = settings.uart_baud;
        thread::spawn(move || serial_thread(path, baud, tx_line));
    }

    let snapshot_slot: Arc<Mutex<Option<TelemetrySnapshot>>> = Arc::new(Mutex::new(None));
    {
        let slot = Arc::clone(&snapshot_slot);
        let port = settings.telemetry_port;
        thread::spawn(move || telemetry_thread(port, slot));
    }

    let failsafe_timeout_us = settings.failsafe_timeout_ms * 1000;
    let mut arbitrator = Arbitrator::new();
    let mut indicators = Indicators::new(Instant::now());
    let mut previous_mode: Option<DriveMode> = None;
    let mut receiver_was_lost = false;

    loop {
        let now = Instant::now();
        let steer_us = bank.width_us(ChannelId::Steer);
        let throttle_us = bank.width_us(ChannelId::Throttle);
        let mode_us = bank.width_us(ChannelId::ModeSelect);
        let rgb_us = bank.width_us(ChannelId::RgbTrigger);
        let siren_us = bank.width_us(ChannelId::SirenTrigger);

        let receiver_lost = bank.receiver_lost(failsafe_timeout_us);
        if receiver_lost != receiver_was_lost {
            if receiver_lost {
                println!("[FAILSAFE] receiver silent, issuing stop command");
            } else {
                println!("[FAILSAFE] receiver pulses back");
            }
            receiver_was_lost = receiver_lost;
        }

        let mode = mode_from_pulse(mode_us);
        if previous_mode != Some(mode) {
            println!("[MODE] {:?}", mode);
            previous_mode = Some(mode);
        }

        let issued = if receiver_lost {
            Some(arbitrator.failsafe())
        } else {
            let message = match mode {
                DriveMode::Autonomous => {
                    rx_line.try_recv().ok().and_then(|line| parse_line(&line))
                }
                DriveMode::Manual => {
                    // Deviations that arrived while under manual control are
                    // stale by the time the mode switch flips; discard them.
                    while rx_line.try_recv().is_ok() {}
                    None
                }
            };
            arbitrator.update(mode, steer_us, throttle_us, message)
        };

        if let Some(command) = issued {
            if let Err(e) = actuators.apply(&command) {
                eprintln!("[PWM] apply failed: {}", e);
            }
        }

        let current = arbitrator.last();
        let (left_on, right_on) = indicators.update(&current, now);
        lamps.set(left_on, right_on);
        rgb.update(rgb_us, now);
        if let Err(e) = siren.update(siren_us, now) {
            eprintln!("[SIREN] update failed: {}", e);
        }

        let mode_label = if receiver_lost {
            "FAILSAFE"
        } else {
            match mode {
                DriveMode::Manual => "MANUAL",
                DriveMode::Autonomous => "AUTO",
            }
        };
        let snapshot = TelemetrySnapshot {
            steer_us,
            throttle_us,
            mode_us,
            rgb_us,
            siren_us,
            mode: mode_label.to_string(),
            steering: current.steering,
            speed: current.speed,
            left_indicator: left_on,
            right_indicator: right_on,
            receiver_lost,
        };
        {
            let mut locked = snapshot_slot.lock().unwrap();
            *locked = Some(snapshot);
        }

        thread::sleep(Duration::from_millis(CYCLE_MS));
    }
}
