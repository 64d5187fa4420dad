//! Receiver PWM inputs. Each channel gets its own pin-change interrupt that
//! measures the high pulse and publishes the width through an atomic cell.

use anyhow::Result;
use rppal::gpio::{Gpio, InputPin, Level, Trigger};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

pub const CHANNEL_COUNT: usize = 5;
pub const NEUTRAL_US: u16 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelId {
    Steer = 0,
    Throttle = 1,
    ModeSelect = 2,
    RgbTrigger = 3,
    SirenTrigger = 4,
}

/// One channel's published measurement. Written only by that channel's
/// interrupt callback, read by the control cycle. Width and last-pulse time
/// are separate atomics; a reader sees either the previous or the newly
/// completed pulse, never a torn value.
pub struct PulseCell {
    width_us: AtomicU32,
    last_pulse_us: AtomicU64,
}

impl PulseCell {
    pub fn new() -> Self {
        PulseCell {
            width_us: AtomicU32::new(NEUTRAL_US as u32),
            last_pulse_us: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, width_us: u32, at_us: u64) {
        self.width_us.store(width_us, Ordering::Relaxed);
        self.last_pulse_us.store(at_us, Ordering::Relaxed);
    }

    pub fn width_us(&self) -> u16 {
        self.width_us.load(Ordering::Relaxed).min(u16::MAX as u32) as u16
    }

    /// No completed pulse for longer than `timeout_us`. A cell that never saw
    /// an edge counts as stale once the timeout has passed since startup.
    pub fn is_stale(&self, now_us: u64, timeout_us: u64) -> bool {
        now_us.saturating_sub(self.last_pulse_us.load(Ordering::Relaxed)) > timeout_us
    }
}

pub struct ChannelBank {
    epoch: Instant,
    cells: [Arc<PulseCell>; CHANNEL_COUNT],
    _pins: Vec<InputPin>,
}

impl ChannelBank {
    pub fn new(gpio: &Gpio, pin_numbers: [u8; CHANNEL_COUNT]) -> Result<Self> {
        let epoch = Instant::now();
        let cells: [Arc<PulseCell>; CHANNEL_COUNT] =
            std::array::from_fn(|_| Arc::new(PulseCell::new()));
        let mut pins = Vec::new();

        for (i, &pin_num) in pin_numbers.iter().enumerate() {
            let mut pin = gpio.get(pin_num)?.into_input_pulldown();
            let cell = Arc::clone(&cells[i]);
            let mut rising_at: Option<Instant> = None;

            pin.set_async_interrupt(Trigger::Both, move |level| match level {
                Level::High => rising_at = Some(Instant::now()),
                Level::Low => {
                    if let Some(start) = rising_at.take() {
                        let now = Instant::now();
                        cell.publish(
                            now.duration_since(start).as_micros() as u32,
                            now.duration_since(epoch).as_micros() as u64,
                        );
                    }
                }
            })?;

            println!("[RX] channel input on GPIO {}", pin_num);
            pins.push(pin);
        }

        Ok(ChannelBank { epoch, cells, _pins: pins })
    }

    pub fn width_us(&self, id: ChannelId) -> u16 {
        self.cells[id as usize].width_us()
    }

    pub fn now_us(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }

    /// The receiver counts as lost when steering, throttle and mode-select
    /// have all gone silent. The auxiliary channels don't matter here.
    pub fn receiver_lost(&self, timeout_us: u64) -> bool {
        let now = self.now_us();
        [ChannelId::Steer, ChannelId::Throttle, ChannelId::ModeSelect]
            .iter()
            .all(|&id| self.cells[id as usize].is_stale(now, timeout_us))
    }
}
