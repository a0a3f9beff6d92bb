//! Sensor gate: cooldown and active-hours filtering of motion events

use std::fmt;
use std::time::Duration;

use chrono::{NaiveDateTime, TimeDelta, Timelike};

use crate::{Error, Result};

/// Default minimum interval between two cycle starts
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(25);

/// Hour window `[start, end)` during which motion is honored
///
/// A window whose start is after its end wraps past midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveHours {
    start: u32,
    end: u32,
}

impl ActiveHours {
    /// The whole day, effectively disabling the filter
    pub const ALL_DAY: Self = Self { start: 0, end: 24 };

    /// Create a window
    ///
    /// # Errors
    ///
    /// Returns error if `start` is not in `0..24` or `end` is not in `0..=24`
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start > 23 || end > 24 {
            return Err(Error::Config(format!(
                "active hours out of range: {start}-{end} (start 0-23, end 0-24)"
            )));
        }
        Ok(Self { start, end })
    }

    /// First active hour
    #[must_use]
    pub const fn start(&self) -> u32 {
        self.start
    }

    /// First inactive hour after the window
    #[must_use]
    pub const fn end(&self) -> u32 {
        self.end
    }

    /// Whether `hour` (0-23) lies inside the window
    #[must_use]
    pub const fn contains(&self, hour: u32) -> bool {
        if self.start <= self.end {
            self.start <= hour && hour < self.end
        } else {
            hour >= self.start || hour < self.end
        }
    }
}

impl fmt::Display for ActiveHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start, self.end)
    }
}

/// Outcome of a positive sensor read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Start a cycle now
    Accepted,
    /// Too soon after the previous trigger
    CoolingDown {
        /// Time left until the next trigger is honored
        remaining: Duration,
    },
    /// Outside active hours; the trigger still consumed the cooldown slot
    OutsideActiveHours,
}

/// Decides whether a motion event starts a cycle
///
/// Owns the only mutable state that survives between cycles: the time of
/// the last honored (or consumed) trigger
#[derive(Debug, Clone)]
pub struct SensorGate {
    cooldown: Duration,
    active_hours: ActiveHours,
    last_trigger: Option<NaiveDateTime>,
}

impl SensorGate {
    /// Create a gate that has never triggered
    #[must_use]
    pub const fn new(cooldown: Duration, active_hours: ActiveHours) -> Self {
        Self {
            cooldown,
            active_hours,
            last_trigger: None,
        }
    }

    /// Configured cooldown
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Configured active-hours window
    #[must_use]
    pub const fn active_hours(&self) -> ActiveHours {
        self.active_hours
    }

    /// Timestamp of the last trigger that consumed the cooldown slot
    #[must_use]
    pub const fn last_trigger(&self) -> Option<NaiveDateTime> {
        self.last_trigger
    }

    /// Evaluate a motion event observed at `now`
    ///
    /// Cooldown is checked first. A trigger outside active hours updates the
    /// last-trigger timestamp without starting a cycle.
    pub fn evaluate(&mut self, now: NaiveDateTime) -> GateDecision {
        if let Some(last) = self.last_trigger {
            let elapsed = now - last;
            let cooldown = TimeDelta::from_std(self.cooldown).unwrap_or(TimeDelta::MAX);
            if elapsed < cooldown {
                let remaining = (cooldown - elapsed).to_std().unwrap_or_default();
                return GateDecision::CoolingDown { remaining };
            }
        }

        self.last_trigger = Some(now);

        if self.active_hours.contains(now.hour()) {
            GateDecision::Accepted
        } else {
            GateDecision::OutsideActiveHours
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(hour: u32, min: u32, sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 12, 10)
            .unwrap()
            .and_hms_opt(hour, min, sec)
            .unwrap()
    }

    #[test]
    fn test_active_hours_half_open() {
        let hours = ActiveHours::new(16, 18).unwrap();
        for h in 0..24 {
            assert_eq!(hours.contains(h), (16..18).contains(&h), "hour {h}");
        }
    }

    #[test]
    fn test_all_day_always_active() {
        assert!((0..24).all(|h| ActiveHours::ALL_DAY.contains(h)));
        assert_eq!(ActiveHours::new(0, 24).unwrap(), ActiveHours::ALL_DAY);
    }

    #[test]
    fn test_active_hours_wrap_midnight() {
        let hours = ActiveHours::new(22, 2).unwrap();
        assert!(hours.contains(23));
        assert!(hours.contains(0));
        assert!(hours.contains(1));
        assert!(!hours.contains(2));
        assert!(!hours.contains(12));
    }

    #[test]
    fn test_active_hours_empty_window() {
        let hours = ActiveHours::new(10, 10).unwrap();
        assert!((0..24).all(|h| !hours.contains(h)));
    }

    #[test]
    fn test_active_hours_rejects_out_of_range() {
        assert!(ActiveHours::new(24, 24).is_err());
        assert!(ActiveHours::new(8, 25).is_err());
    }

    #[test]
    fn test_active_hours_display() {
        assert_eq!(ActiveHours::new(16, 18).unwrap().to_string(), "16:00-18:00");
    }

    #[test]
    fn test_first_trigger_accepted() {
        let mut gate = SensorGate::new(DEFAULT_COOLDOWN, ActiveHours::ALL_DAY);
        assert_eq!(gate.evaluate(at(16, 0, 0)), GateDecision::Accepted);
        assert_eq!(gate.last_trigger(), Some(at(16, 0, 0)));
    }

    #[test]
    fn test_cooldown_suppresses_and_keeps_timestamp() {
        let mut gate = SensorGate::new(Duration::from_secs(25), ActiveHours::ALL_DAY);
        assert_eq!(gate.evaluate(at(16, 0, 0)), GateDecision::Accepted);

        let decision = gate.evaluate(at(16, 0, 5));
        assert_eq!(
            decision,
            GateDecision::CoolingDown {
                remaining: Duration::from_secs(20)
            }
        );
        assert_eq!(gate.last_trigger(), Some(at(16, 0, 0)));
    }

    #[test]
    fn test_cooldown_boundary_is_inclusive() {
        let mut gate = SensorGate::new(Duration::from_secs(25), ActiveHours::ALL_DAY);
        gate.evaluate(at(16, 0, 0));
        assert!(matches!(
            gate.evaluate(at(16, 0, 24)),
            GateDecision::CoolingDown { .. }
        ));
        assert_eq!(gate.evaluate(at(16, 0, 25)), GateDecision::Accepted);
    }

    #[test]
    fn test_outside_hours_consumes_cooldown_slot() {
        let mut gate = SensorGate::new(Duration::from_secs(25), ActiveHours::new(16, 18).unwrap());

        assert_eq!(gate.evaluate(at(15, 59, 50)), GateDecision::OutsideActiveHours);
        assert_eq!(gate.last_trigger(), Some(at(15, 59, 50)));

        // Inside hours now, but the rejected trigger started a cooldown
        assert!(matches!(
            gate.evaluate(at(16, 0, 0)),
            GateDecision::CoolingDown { .. }
        ));
        assert_eq!(gate.evaluate(at(16, 0, 15)), GateDecision::Accepted);
    }

    #[test]
    fn test_cycles_never_start_closer_than_cooldown() {
        let cooldown = Duration::from_secs(25);
        let mut gate = SensorGate::new(cooldown, ActiveHours::ALL_DAY);
        let mut starts = Vec::new();

        // Motion every 3 seconds for ten minutes
        for tick in 0..200 {
            let now = at(12, 0, 0) + TimeDelta::seconds(tick * 3);
            if gate.evaluate(now) == GateDecision::Accepted {
                starts.push(now);
            }
        }

        assert!(starts.len() > 1);
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= TimeDelta::seconds(25));
        }
    }

    #[test]
    fn test_clock_going_backwards_stays_suppressed() {
        let mut gate = SensorGate::new(Duration::from_secs(25), ActiveHours::ALL_DAY);
        gate.evaluate(at(16, 0, 30));
        assert!(matches!(
            gate.evaluate(at(16, 0, 0)),
            GateDecision::CoolingDown { .. }
        ));
    }
}
