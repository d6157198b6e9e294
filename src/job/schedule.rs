use std::{fmt::Display, str::FromStr};

use jiff::{civil::Weekday, tz::TimeZone, ToSpan, Zoned};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid schedule `{0}`, expecting `MIN HOUR * * DOW`")]
pub struct ScheduleError(pub String);

/// A weekly slot in UTC, written as the cron subset `MIN HOUR * * DOW`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    pub minute: i8,
    pub hour: i8,
    pub weekday: Weekday,
}

impl Default for WeeklySchedule {
    /// Thursdays at 06:00 UTC
    fn default() -> Self {
        WeeklySchedule {
            minute: 0,
            hour: 6,
            weekday: Weekday::Thursday,
        }
    }
}

impl WeeklySchedule {
    /// The first slot strictly after `now`.
    pub fn next_after(&self, now: &Zoned) -> Result<Zoned, jiff::Error> {
        let now = now.with_time_zone(TimeZone::UTC);
        let today = now.date();
        let days_ahead =
            (self.weekday.to_monday_zero_offset() - today.weekday().to_monday_zero_offset())
                .rem_euclid(7);
        let slot = today
            .checked_add(i64::from(days_ahead).days())?
            .at(self.hour, self.minute, 0, 0)
            .to_zoned(TimeZone::UTC)?;
        if slot > now {
            Ok(slot)
        } else {
            slot.checked_add(1.week())
        }
    }
}

fn cron_weekday(n: i8) -> Option<Weekday> {
    match n {
        0 | 7 => Some(Weekday::Sunday),
        1 => Some(Weekday::Monday),
        2 => Some(Weekday::Tuesday),
        3 => Some(Weekday::Wednesday),
        4 => Some(Weekday::Thursday),
        5 => Some(Weekday::Friday),
        6 => Some(Weekday::Saturday),
        _ => None,
    }
}

impl FromStr for WeeklySchedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ScheduleError(s.to_string());
        let fields: Vec<&str> = s.split_whitespace().collect();
        let [minute, hour, "*", "*", dow] = fields.as_slice() else {
            return Err(err());
        };
        let minute: i8 = minute.parse().map_err(|_| err())?;
        let hour: i8 = hour.parse().map_err(|_| err())?;
        if !(0..60).contains(&minute) || !(0..24).contains(&hour) {
            return Err(err());
        }
        let weekday = dow
            .parse::<i8>()
            .ok()
            .and_then(cron_weekday)
            .ok_or_else(err)?;
        Ok(WeeklySchedule {
            minute,
            hour,
            weekday,
        })
    }
}

impl Display for WeeklySchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} * * {}",
            self.minute,
            self.hour,
            self.weekday.to_sunday_zero_offset()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;
    use std::error::Error;

    fn at(s: &str) -> Zoned {
        utc(s).to_zoned(TimeZone::UTC)
    }

    fn utc(s: &str) -> Timestamp {
        format!("{}Z", s).parse().unwrap()
    }

    #[test]
    fn parse() -> Result<(), Box<dyn Error>> {
        assert_eq!("0 6 * * 4".parse::<WeeklySchedule>()?, WeeklySchedule::default());
        let s: WeeklySchedule = "30 23 * * 7".parse()?;
        assert_eq!(s.weekday, Weekday::Sunday);
        assert_eq!(s.to_string(), "30 23 * * 0");
        assert!("0 6 * * *".parse::<WeeklySchedule>().is_err());
        assert!("0 24 * * 4".parse::<WeeklySchedule>().is_err());
        assert!("0 6 1 * 4".parse::<WeeklySchedule>().is_err());
        assert!("0 6 * * 8".parse::<WeeklySchedule>().is_err());
        assert!("0 6 * *".parse::<WeeklySchedule>().is_err());
        Ok(())
    }

    #[test]
    fn next_slot() -> Result<(), Box<dyn Error>> {
        let schedule = WeeklySchedule::default();
        // Monday
        assert_eq!(
            schedule.next_after(&at("2025-05-05T12:00:00"))?.timestamp(),
            utc("2025-05-08T06:00:00")
        );
        // Thursday, before the slot
        assert_eq!(
            schedule.next_after(&at("2025-05-08T05:59:00"))?.timestamp(),
            utc("2025-05-08T06:00:00")
        );
        // Thursday, exactly at the slot
        assert_eq!(
            schedule.next_after(&at("2025-05-08T06:00:00"))?.timestamp(),
            utc("2025-05-15T06:00:00")
        );
        // Saturday, across a month end
        assert_eq!(
            schedule.next_after(&at("2025-05-31T08:00:00"))?.timestamp(),
            utc("2025-06-05T06:00:00")
        );
        Ok(())
    }

    #[test]
    fn next_slot_from_another_zone() -> Result<(), Box<dyn Error>> {
        let schedule = WeeklySchedule::default();
        // Thursday 01:30 at UTC-4 is 05:30 UTC
        let now: Zoned = "2025-05-08T01:30:00-04:00[-04:00]".parse()?;
        assert_eq!(schedule.next_after(&now)?.timestamp(), utc("2025-05-08T06:00:00"));
        Ok(())
    }
}
