use serde::{Serialize, Deserialize};
use std::fs;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinMap {
    pub steer_in: u8,
    pub throttle_in: u8,
    pub mode_in: u8,
    pub rgb_in: u8,
    pub siren_in: u8,
    pub steer_out: u8,
    pub esc_out: u8,
    pub left_led: u8,
    pub right_led: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub speaker: u8,
}

impl Default for PinMap {
    fn default() -> Self {
        PinMap {
            steer_in: 17,
            throttle_in: 27,
            mode_in: 22,
            rgb_in: 5,
            siren_in: 6,
            steer_out: 23,
            esc_out: 24,
            left_led: 13,
            right_led: 19,
            red: 16,
            green: 20,
            blue: 21,
            speaker: 18,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub pins: PinMap,
    pub uart_path: String,
    pub uart_baud: u32,
    pub failsafe_timeout_ms: u64,
    pub telemetry_port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            pins: PinMap::default(),
            uart_path: String::from("/dev/serial0"),
            uart_baud: 9600,
            failsafe_timeout_ms: 500,
            telemetry_port: 10013,
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> io::Result<Settings> {
        let content = fs::read_to_string(path)?;
        let loaded: Settings = serde_json::from_str(&content)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(loaded)
    }

    pub fn save(&self, path: &str) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
