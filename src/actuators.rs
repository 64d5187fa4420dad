use anyhow::Result;
use rppal::gpio::{Gpio, OutputPin};
use std::time::Duration;

use crate::control::MotionCommand;

const PERIOD_MS: u64 = 20;

pub struct Actuators {
    steer: OutputPin,
    esc: OutputPin,
}

impl Actuators {
    pub fn new(gpio: &Gpio, steer_pin: u8, esc_pin: u8) -> Result<Self> {
        let steer = gpio.get(steer_pin)?.into_output();
        let esc = gpio.get(esc_pin)?.into_output();
        println!("[PWM] steering servo on GPIO {}, ESC on GPIO {}", steer_pin, esc_pin);
        Ok(Actuators { steer, esc })
    }

    fn set_pulse(pin: &mut OutputPin, width_us: u16) -> Result<()> {
        let width_us = width_us.clamp(1000, 2000);
        pin.set_pwm(
            Duration::from_millis(PERIOD_MS),
            Duration::from_micros(width_us as u64),
        )?;
        Ok(())
    }

    pub fn apply(&mut self, command: &MotionCommand) -> Result<()> {
        Self::set_pulse(&mut self.steer, command.steering)?;
        Self::set_pulse(&mut self.esc, command.speed)?;
        Ok(())
    }
}
