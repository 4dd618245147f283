//! Clock arithmetic for shifts and attendance.
//!
//! Every function here works on `HH:mm` wall-clock strings and never fails:
//! a malformed or missing time degrades to a zero result.

use chrono::NaiveDateTime;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A parsed `HH:mm` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Clock {
    hour: u32,
    minute: u32,
}

impl Clock {
    fn parse(value: &str) -> Option<Self> {
        let (h, m) = value.trim().split_once(':')?;
        let hour: u32 = h.trim().parse().ok()?;
        let minute: u32 = m.trim().parse().ok()?;

        if hour > 23 || minute > 59 {
            return None;
        }

        Some(Self { hour, minute })
    }

    fn minutes(self) -> u32 {
        self.hour * 60 + self.minute
    }
}

/// Formats the wall-clock part of an attendance instant as `HH:mm`.
pub fn clock_of(instant: &NaiveDateTime) -> String {
    instant.format("%H:%M").to_string()
}

/// Minutes of lateness beyond the grace period.
///
/// For an overnight shift (end before start), a clock-in whose hour is before
/// both the scheduled start hour and noon is read as happening after midnight
/// of the following day.
pub fn lateness_minutes(
    scheduled_start: &str,
    scheduled_end: &str,
    actual_in: &str,
    grace_minutes: u32,
) -> u32 {
    let (Some(start), Some(end), Some(actual)) = (
        Clock::parse(scheduled_start),
        Clock::parse(scheduled_end),
        Clock::parse(actual_in),
    ) else {
        return 0;
    };

    let scheduled = start.minutes() as i64;
    let mut arrived = actual.minutes() as i64;

    let overnight = end.minutes() < start.minutes();
    if overnight && actual.hour < start.hour && actual.hour < 12 {
        arrived += MINUTES_PER_DAY as i64;
    }

    let diff = arrived - scheduled;
    if diff <= 0 {
        return 0;
    }

    (diff - grace_minutes as i64).max(0) as u32
}

/// Minutes between clock-in and clock-out, wrapping past midnight when the
/// clock-out reads earlier than the clock-in.
pub fn worked_minutes(time_in: &str, time_out: &str) -> u32 {
    let (Some(clock_in), Some(clock_out)) = (Clock::parse(time_in), Clock::parse(time_out)) else {
        return 0;
    };

    let start = clock_in.minutes();
    let mut end = clock_out.minutes();
    if end < start {
        end += MINUTES_PER_DAY;
    }

    end - start
}
