use anyhow::Result;
use rppal::gpio::{Gpio, OutputPin};
use std::time::{Duration, Instant};

const RGB_ON_US: u16 = 1600;
const FLASH_PERIOD: Duration = Duration::from_millis(300);

pub struct IndicatorLamps {
    left: OutputPin,
    right: OutputPin,
}

impl IndicatorLamps {
    pub fn new(gpio: &Gpio, left_pin: u8, right_pin: u8) -> Result<Self> {
        let left = gpio.get(left_pin)?.into_output_low();
        let right = gpio.get(right_pin)?.into_output_low();
        println!("[LED] indicators on GPIO {} (left) and GPIO {} (right)", left_pin, right_pin);
        Ok(IndicatorLamps { left, right })
    }

    pub fn set(&mut self, left_on: bool, right_on: bool) {
        if left_on { self.left.set_high() } else { self.left.set_low() }
        if right_on { self.right.set_high() } else { self.right.set_low() }
    }
}

/// Red/blue alternating flash while the RGB trigger channel is held high.
pub struct RgbFlasher {
    red: OutputPin,
    green: OutputPin,
    blue: OutputPin,
    red_phase: bool,
    last_toggle: Instant,
}

impl RgbFlasher {
    pub fn new(gpio: &Gpio, red_pin: u8, green_pin: u8, blue_pin: u8) -> Result<Self> {
        let red = gpio.get(red_pin)?.into_output_low();
        let green = gpio.get(green_pin)?.into_output_low();
        let blue = gpio.get(blue_pin)?.into_output_low();
        println!("[LED] RGB on GPIO {}/{}/{}", red_pin, green_pin, blue_pin);
        Ok(RgbFlasher {
            red,
            green,
            blue,
            red_phase: false,
            last_toggle: Instant::now(),
        })
    }

    pub fn update(&mut self, trigger_us: u16, now: Instant) {
        if trigger_us > RGB_ON_US {
            if now.duration_since(self.last_toggle) >= FLASH_PERIOD {
                self.red_phase = !self.red_phase;
                self.last_toggle = now;

                if self.red_phase {
                    self.red.set_high();
                    self.blue.set_low();
                } else {
                    self.red.set_low();
                    self.blue.set_high();
                }
                self.green.set_low();
            }
        } else {
            self.red.set_low();
            self.green.set_low();
            self.blue.set_low();
        }
    }
}
