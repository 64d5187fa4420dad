use anyhow::Result;
use rppal::gpio::{Gpio, OutputPin};
use std::time::{Duration, Instant};

const SIREN_ON_US: u16 = 1500;
const FREQ_MIN_HZ: u32 = 500;
const FREQ_MAX_HZ: u32 = 1000;
const FREQ_STEP_HZ: u32 = 10;
const STEP_PERIOD: Duration = Duration::from_millis(5);

/// Sweeping two-way tone on the speaker pin, gated by the siren channel.
pub struct Siren {
    pin: OutputPin,
    freq_hz: u32,
    rising: bool,
    last_step: Instant,
    active: bool,
}

impl Siren {
    pub fn new(gpio: &Gpio, speaker_pin: u8) -> Result<Self> {
        let pin = gpio.get(speaker_pin)?.into_output_low();
        println!("[SIREN] speaker on GPIO {}", speaker_pin);
        Ok(Siren {
            pin,
            freq_hz: FREQ_MIN_HZ,
            rising: true,
            last_step: Instant::now(),
            active: false,
        })
    }

    pub fn update(&mut self, trigger_us: u16, now: Instant) -> Result<()> {
        if trigger_us > SIREN_ON_US {
            if now.duration_since(self.last_step) >= STEP_PERIOD {
                self.pin.set_pwm_frequency(self.freq_hz as f64, 0.5)?;
                self.last_step = now;

                if self.rising {
                    self.freq_hz += FREQ_STEP_HZ;
                    if self.freq_hz >= FREQ_MAX_HZ {
                        self.rising = false;
                    }
                } else {
                    self.freq_hz -= FREQ_STEP_HZ;
                    if self.freq_hz <= FREQ_MIN_HZ {
                        self.rising = true;
                    }
                }
            }
            self.active = true;
        } else if self.active {
            self.pin.clear_pwm()?;
            self.active = false;
        }

        Ok(())
    }
}
