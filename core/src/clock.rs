//! Evaluation clock and time-zone handling.
//!
//! RULE: "now" is sampled once per pass. Every window check in the pass
//! compares against that single `Instant`.
//!
//! A `Zone` is either a named IANA zone or `Naive`, the server's local wall
//! clock. Naive instants live on a floating timeline: the wall-clock reading
//! stamped as if it were UTC, so arithmetic and ordering still work without
//! any offset information.

use chrono::{
    DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
    Weekday,
};
use chrono_tz::Tz;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Named(Tz),
    Naive,
}

impl Zone {
    /// Resolve a configured zone name. Blank means `Naive`; an unknown name
    /// falls back to `Naive` with a warning.
    pub fn resolve(name: Option<&str>) -> Self {
        let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
            return Zone::Naive;
        };
        match name.parse::<Tz>() {
            Ok(tz) => Zone::Named(tz),
            Err(_) => {
                log::warn!("Unknown time zone '{name}'; using server local time (naive)");
                Zone::Naive
            }
        }
    }

    /// Place a local calendar date + time-of-day on this zone's timeline.
    ///
    /// Total: an ambiguous local time (DST fall-back) resolves to the earlier
    /// instant, a skipped one (DST spring-forward gap) is pushed past the gap.
    pub fn to_instant(&self, date: NaiveDate, time: NaiveTime) -> Instant {
        let wall = date.and_time(time);
        let utc = match self {
            Zone::Naive => wall.and_utc(),
            Zone::Named(tz) => tz
                .from_local_datetime(&wall)
                .earliest()
                .or_else(|| tz.from_local_datetime(&(wall + Duration::hours(1))).earliest())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| tz.from_utc_datetime(&wall).with_timezone(&Utc)),
        };
        Instant { utc, zone: *self }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Named(tz) => write!(f, "{}", tz.name()),
            Zone::Naive     => write!(f, "local"),
        }
    }
}

/// A point in time together with the zone it is read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instant {
    utc:  DateTime<Utc>,
    zone: Zone,
}

impl Instant {
    /// The instant `utc` as observed in `zone`.
    pub fn at(utc: DateTime<Utc>, zone: Zone) -> Self {
        match zone {
            Zone::Named(_) => Self { utc, zone },
            Zone::Naive => Self {
                utc: Local.from_utc_datetime(&utc.naive_utc()).naive_local().and_utc(),
                zone,
            },
        }
    }

    /// A zone-naive instant read directly off a wall clock.
    pub fn floating(wall: NaiveDateTime) -> Self {
        Self { utc: wall.and_utc(), zone: Zone::Naive }
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Wall-clock reading in this instant's zone.
    pub fn local(&self) -> NaiveDateTime {
        match self.zone {
            Zone::Named(tz) => self.utc.with_timezone(&tz).naive_local(),
            Zone::Naive     => self.utc.naive_utc(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.local().date()
    }

    pub fn time(&self) -> NaiveTime {
        self.local().time()
    }

    pub fn weekday(&self) -> Weekday {
        self.local().weekday()
    }

    pub fn plus(&self, delta: Duration) -> Self {
        Self { utc: self.utc + delta, zone: self.zone }
    }
}

impl PartialOrd for Instant {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.utc.cmp(&other.utc))
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.local().format("%Y-%m-%d %H:%M:%S"), self.zone)
    }
}

/// Source of "now" for a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeskClock {
    System,
    Fixed(DateTime<Utc>),
}

impl DeskClock {
    pub fn utc_now(&self) -> DateTime<Utc> {
        match self {
            DeskClock::System       => Utc::now(),
            DeskClock::Fixed(fixed) => *fixed,
        }
    }

    pub fn now_in(&self, zone: Zone) -> Instant {
        Instant::at(self.utc_now(), zone)
    }
}
