use std::time::Duration;

/// Admits at most one frame per interval
#[derive(Debug, Clone)]
pub struct FrameGate {
    interval: Duration,
    slack: Duration,
    last: Option<Duration>,
}

impl FrameGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            slack: Duration::ZERO,
            last: None,
        }
    }

    /// Gate for a target rate; 30 fps gives a ~33.3 ms interval
    pub fn from_rate(frames_per_second: u32) -> Self {
        Self::new(Duration::from_secs_f64(
            1.0 / f64::from(frames_per_second.max(1)),
        ))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Accept wake-ups up to `slack` before the interval elapses; capped at
    /// a quarter of the interval
    pub fn set_slack(&mut self, slack: Duration) {
        self.slack = slack.min(self.interval / 4);
    }

    pub fn slack(&self) -> Duration {
        self.slack
    }

    /// Whether enough time has passed since the last admitted frame
    pub fn is_open(&self, now: Duration) -> bool {
        match self.last {
            Some(last) => now.saturating_sub(last) + self.slack >= self.interval,
            None => true,
        }
    }

    /// Record `now` as the last processed frame
    pub fn admit(&mut self, now: Duration) {
        self.last = Some(now);
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_from_rate() {
        let gate = FrameGate::from_rate(30);
        assert_eq!(gate.interval().as_micros(), 33_333);
        assert_eq!(FrameGate::from_rate(0).interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_first_frame_is_admitted_immediately() {
        let mut gate = FrameGate::from_rate(30);
        assert!(gate.is_open(Duration::ZERO));

        gate.admit(Duration::from_millis(100));
        assert!(!gate.is_open(Duration::from_millis(120)));
        assert!(gate.is_open(Duration::from_millis(134)));

        gate.reset();
        assert!(gate.is_open(Duration::from_millis(101)));
    }

    #[test]
    fn test_slack_absorbs_late_admission() {
        let mut gate = FrameGate::from_rate(30);
        gate.set_slack(Duration::from_micros(8_333));
        assert_eq!(gate.slack(), Duration::from_micros(8_333));

        // 60 Hz ticks rounded to whole milliseconds
        gate.admit(Duration::from_millis(34));
        assert!(!gate.is_open(Duration::from_millis(50)));
        assert!(gate.is_open(Duration::from_millis(67)));

        let mut strict = FrameGate::from_rate(30);
        strict.admit(Duration::from_millis(34));
        assert!(!strict.is_open(Duration::from_millis(67)));

        gate.set_slack(Duration::from_secs(1));
        assert_eq!(gate.slack(), gate.interval() / 4);
    }
}
