//! Mode arbitration and the deviation-to-command mapping.

pub const STEER_MIN_US: u16 = 1000;
pub const STEER_MAX_US: u16 = 2000;
pub const SPEED_MIN_US: u16 = 1440;
pub const SPEED_MAX_US: u16 = 1560;
pub const MODE_THRESHOLD_US: u16 = 1500;

const STOP_SPEED_US: u16 = 1435;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionCommand {
    pub steering: u16,
    pub speed: u16,
}

impl MotionCommand {
    pub const fn neutral() -> Self {
        MotionCommand { steering: 1500, speed: 1500 }
    }

    /// Straight steering, ESC in the stop band. Issued for the "S"/"N"
    /// messages and on receiver loss.
    pub const fn stop() -> Self {
        MotionCommand { steering: 1500, speed: STOP_SPEED_US }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    Manual,
    Autonomous,
}

pub fn mode_from_pulse(width_us: u16) -> DriveMode {
    if width_us > MODE_THRESHOLD_US {
        DriveMode::Autonomous
    } else {
        DriveMode::Manual
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviationMessage {
    Deviation(i32),
    Neutral,
}

/// Parses one trimmed line from the perception peer.
/// `D:<signed int>` carries a lateral deviation, `S`/`N` request a stop.
/// Anything else is dropped without a command change.
pub fn parse_line(line: &str) -> Option<DeviationMessage> {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix("D:") {
        rest.trim().parse::<i32>().ok().map(DeviationMessage::Deviation)
    } else if line == "S" || line == "N" {
        Some(DeviationMessage::Neutral)
    } else {
        None
    }
}

/// Open-loop bucket policy: proportional steering near center, full lock
/// with reduced speed further out, reverse-assisted recovery at the
/// extremes. No smoothing between cycles; chattering at bucket boundaries
/// is accepted.
///
/// Zero deviation means on-course: drive straight at the near-center
/// forward speed.
pub fn map_deviation(message: DeviationMessage) -> MotionCommand {
    let d = match message {
        DeviationMessage::Neutral => return MotionCommand::stop(),
        DeviationMessage::Deviation(d) => d,
    };

    let (steering, speed): (i32, u16) = if d == 0 {
        (1500, 1560)
    } else if d > -40 && d < 40 {
        ((1500 - d * 40).clamp(1400, 1600), 1560)
    } else if d >= 40 && d < 80 {
        (1000, 1550)
    } else if d <= -40 && d > -80 {
        (2000, 1550)
    } else if d >= 80 && d < 100 {
        (1800, 1440)
    } else if d <= -80 && d > -100 {
        (1200, 1440)
    } else if d >= 100 {
        (1800, 1430)
    } else {
        (1200, 1430)
    };

    MotionCommand { steering: steering as u16, speed }
}

pub fn manual_command(steer_raw: u16, throttle_raw: u16) -> MotionCommand {
    MotionCommand {
        steering: steer_raw.clamp(STEER_MIN_US, STEER_MAX_US),
        speed: throttle_raw.clamp(SPEED_MIN_US, SPEED_MAX_US),
    }
}

/// Selects the command source each cycle and remembers the last command it
/// issued. Manual mode issues every cycle; autonomous mode only issues when
/// a message arrived, so the previous command stays in effect in between.
pub struct Arbitrator {
    last: MotionCommand,
}

impl Arbitrator {
    pub fn new() -> Self {
        Arbitrator { last: MotionCommand::neutral() }
    }

    pub fn last(&self) -> MotionCommand {
        self.last
    }

    pub fn update(
        &mut self,
        mode: DriveMode,
        steer_raw: u16,
        throttle_raw: u16,
        message: Option<DeviationMessage>,
    ) -> Option<MotionCommand> {
        let issued = match mode {
            DriveMode::Manual => Some(manual_command(steer_raw, throttle_raw)),
            DriveMode::Autonomous => message.map(map_deviation),
        };

        if let Some(command) = issued {
            self.last = command;
        }
        issued
    }

    pub fn failsafe(&mut self) -> MotionCommand {
        self.last = MotionCommand::stop();
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_select_threshold() {
        assert_eq!(mode_from_pulse(1000), DriveMode::Manual);
        assert_eq!(mode_from_pulse(1500), DriveMode::Manual);
        assert_eq!(mode_from_pulse(1501), DriveMode::Autonomous);
        assert_eq!(mode_from_pulse(2000), DriveMode::Autonomous);
    }

    #[test]
    fn manual_passthrough_in_range() {
        for steer in [1000u16, 1234, 1500, 1999, 2000] {
            for throttle in [1440u16, 1480, 1500, 1559, 1560] {
                let cmd = manual_command(steer, throttle);
                assert_eq!(cmd.steering, steer);
                assert_eq!(cmd.speed, throttle);
            }
        }
    }

    #[test]
    fn manual_clamps_out_of_range() {
        let cmd = manual_command(900, 2100);
        assert_eq!(cmd, MotionCommand { steering: 1000, speed: 1560 });

        let cmd = manual_command(2500, 800);
        assert_eq!(cmd, MotionCommand { steering: 2000, speed: 1440 });
    }

    #[test]
    fn manual_is_idempotent() {
        let first = manual_command(1750, 1520);
        for _ in 0..100 {
            assert_eq!(manual_command(1750, 1520), first);
        }
    }

    #[test]
    fn parse_deviation_lines() {
        assert_eq!(parse_line("D:17"), Some(DeviationMessage::Deviation(17)));
        assert_eq!(parse_line("D:-42"), Some(DeviationMessage::Deviation(-42)));
        assert_eq!(parse_line("D:0"), Some(DeviationMessage::Deviation(0)));
        assert_eq!(parse_line("  D: 5 \r"), Some(DeviationMessage::Deviation(5)));
    }

    #[test]
    fn parse_stop_markers() {
        assert_eq!(parse_line("S"), Some(DeviationMessage::Neutral));
        assert_eq!(parse_line("N"), Some(DeviationMessage::Neutral));
        assert_eq!(parse_line(" N "), Some(DeviationMessage::Neutral));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_line("X:abc"), None);
        assert_eq!(parse_line("D:"), None);
        assert_eq!(parse_line("D:abc"), None);
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("SN"), None);
    }

    #[test]
    fn stop_marker_maps_to_stop_command() {
        let cmd = map_deviation(DeviationMessage::Neutral);
        assert_eq!(cmd, MotionCommand { steering: 1500, speed: 1435 });
    }

    #[test]
    fn proportional_band_positive() {
        for d in 1..40 {
            let cmd = map_deviation(DeviationMessage::Deviation(d));
            assert_eq!(cmd.steering as i32, (1500 - d * 40).clamp(1400, 1600));
            assert_eq!(cmd.speed, 1560);
        }
    }

    #[test]
    fn proportional_band_negative() {
        for d in -39..0 {
            let cmd = map_deviation(DeviationMessage::Deviation(d));
            assert_eq!(cmd.steering as i32, (1500 - d * 40).clamp(1400, 1600));
            assert_eq!(cmd.speed, 1560);
        }
    }

    #[test]
    fn zero_deviation_drives_straight() {
        let cmd = map_deviation(DeviationMessage::Deviation(0));
        assert_eq!(cmd, MotionCommand { steering: 1500, speed: 1560 });
    }

    #[test]
    fn saturated_band() {
        assert_eq!(
            map_deviation(DeviationMessage::Deviation(45)),
            MotionCommand { steering: 1000, speed: 1550 }
        );
        assert_eq!(
            map_deviation(DeviationMessage::Deviation(-45)),
            MotionCommand { steering: 2000, speed: 1550 }
        );
        assert_eq!(
            map_deviation(DeviationMessage::Deviation(40)),
            MotionCommand { steering: 1000, speed: 1550 }
        );
        assert_eq!(
            map_deviation(DeviationMessage::Deviation(-40)),
            MotionCommand { steering: 2000, speed: 1550 }
        );
        assert_eq!(
            map_deviation(DeviationMessage::Deviation(79)),
            MotionCommand { steering: 1000, speed: 1550 }
        );
    }

    #[test]
    fn reverse_recovery_band() {
        assert_eq!(
            map_deviation(DeviationMessage::Deviation(80)),
            MotionCommand { steering: 1800, speed: 1440 }
        );
        assert_eq!(
            map_deviation(DeviationMessage::Deviation(99)),
            MotionCommand { steering: 1800, speed: 1440 }
        );
        assert_eq!(
            map_deviation(DeviationMessage::Deviation(-80)),
            MotionCommand { steering: 1200, speed: 1440 }
        );
        assert_eq!(
            map_deviation(DeviationMessage::Deviation(-99)),
            MotionCommand { steering: 1200, speed: 1440 }
        );
    }

    #[test]
    fn extreme_deviation_band() {
        assert_eq!(
            map_deviation(DeviationMessage::Deviation(100)),
            MotionCommand { steering: 1800, speed: 1430 }
        );
        assert_eq!(
            map_deviation(DeviationMessage::Deviation(150)),
            MotionCommand { steering: 1800, speed: 1430 }
        );
        assert_eq!(
            map_deviation(DeviationMessage::Deviation(-100)),
            MotionCommand { steering: 1200, speed: 1430 }
        );
        assert_eq!(
            map_deviation(DeviationMessage::Deviation(-150)),
            MotionCommand { steering: 1200, speed: 1430 }
        );
    }

    #[test]
    fn manual_mode_issues_every_cycle() {
        let mut arbitrator = Arbitrator::new();
        let issued = arbitrator.update(DriveMode::Manual, 1400, 1550, None);
        assert_eq!(issued, Some(MotionCommand { steering: 1400, speed: 1550 }));
        assert_eq!(arbitrator.last(), MotionCommand { steering: 1400, speed: 1550 });
    }

    #[test]
    fn autonomous_without_message_holds_last_command() {
        let mut arbitrator = Arbitrator::new();
        arbitrator.update(
            DriveMode::Autonomous,
            1500,
            1500,
            Some(DeviationMessage::Deviation(45)),
        );
        let held = arbitrator.last();

        let issued = arbitrator.update(DriveMode::Autonomous, 1500, 1500, None);
        assert_eq!(issued, None);
        assert_eq!(arbitrator.last(), held);
    }

    #[test]
    fn autonomous_consumes_message_once() {
        let mut arbitrator = Arbitrator::new();
        let issued = arbitrator.update(
            DriveMode::Autonomous,
            1500,
            1500,
            Some(DeviationMessage::Deviation(150)),
        );
        assert_eq!(issued, Some(MotionCommand { steering: 1800, speed: 1430 }));

        // Same message is gone next cycle; nothing re-issued.
        assert_eq!(arbitrator.update(DriveMode::Autonomous, 1500, 1500, None), None);
    }

    #[test]
    fn failsafe_overrides_last_command() {
        let mut arbitrator = Arbitrator::new();
        arbitrator.update(DriveMode::Manual, 2000, 1560, None);

        let cmd = arbitrator.failsafe();
        assert_eq!(cmd, MotionCommand::stop());
        assert_eq!(arbitrator.last(), MotionCommand::stop());
    }
}
