//! Decoding of CF style time coordinates ("hours since 2019-03-07 00:00:00").
//!
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Calendars that can be decoded.
///
/// Other CF calendars (`noleap`, `360_day`, `julian`, ...) are rejected with `Error::Units`.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Calendar {
    /// Mixed Julian/Gregorian. Only dates from 1582-10-15 on are supported.
    #[default]
    Standard,
    ProlepticGregorian,
}

impl Calendar {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::ProlepticGregorian => "proleptic_gregorian",
        }
    }
}

impl FromStr for Calendar {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "standard" | "gregorian" => Ok(Self::Standard),
            "proleptic_gregorian" => Ok(Self::ProlepticGregorian),
            other => Err(Error::units(format!("calendar {other} is not supported"))),
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A parsed `<unit> since <reference>` time units string.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeUnits {
    /// Length of one unit, in microseconds
    step: i64,

    /// The reference time values are counted from
    epoch: DateTime<Utc>,
}

impl TimeUnits {
    pub fn parse(units: &str, calendar: Calendar) -> Result<Self> {
        let lower = units.trim().to_ascii_lowercase();
        let (unit, reference) = lower
            .split_once(" since ")
            .ok_or_else(|| Error::units(format!("expected '<unit> since <date>', got {units:?}")))?;
        let step = unit_micros(unit.trim())
            .ok_or_else(|| Error::units(format!("unknown time unit {unit:?} in {units:?}")))?;
        let epoch = parse_reference(reference)
            .ok_or_else(|| Error::units(format!("bad reference time in {units:?}")))?;

        if calendar == Calendar::Standard && epoch < gregorian_start() {
            return Err(Error::units(format!(
                "reference time in {units:?} falls before the Gregorian switch-over, which the \
                 standard calendar can't decode"
            )));
        }

        Ok(Self { step, epoch })
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// Convert one raw value into a timestamp, rounded to the microsecond.
    ///
    pub fn decode(&self, value: f64) -> Result<DateTime<Utc>> {
        let micros = value * self.step as f64;
        if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
            return Err(Error::units(format!("time value {value} can't be decoded")));
        }

        self.epoch
            .checked_add_signed(Duration::microseconds(micros.round() as i64))
            .ok_or_else(|| Error::units(format!("time value {value} out of range")))
    }
}

fn gregorian_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1582, 10, 15, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn unit_micros(unit: &str) -> Option<i64> {
    Some(match unit {
        "microseconds" | "microsecond" | "microsecs" | "microsec" | "us" => 1,
        "milliseconds" | "millisecond" | "millisecs" | "millisec" | "msecs" | "msec" | "ms" => {
            1_000
        }
        "seconds" | "second" | "secs" | "sec" | "s" => 1_000_000,
        "minutes" | "minute" | "mins" | "min" => 60_000_000,
        "hours" | "hour" | "hrs" | "hr" | "h" => 3_600_000_000,
        "days" | "day" | "d" => 86_400_000_000,
        "weeks" | "week" => 604_800_000_000,
        _ => return None,
    })
}

/// Parse `Y-M-D[( |T)h[:m[:s[.f]]]][Z|UTC|(+|-)hh[:mm]]`, all fields possibly unpadded.
///
/// Expects lower case input.
///
fn parse_reference(reference: &str) -> Option<DateTime<Utc>> {
    let reference = reference.trim();
    let (date, rest) = match reference.find(|c: char| c == ' ' || c == 't') {
        Some(i) => (&reference[..i], reference[i + 1..].trim()),
        None => (reference, ""),
    };

    let mut fields = date.split('-');
    let year = fields.next()?.parse().ok()?;
    let month = fields.next()?.parse().ok()?;
    let day = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let rest = rest
        .strip_suffix("utc")
        .or_else(|| rest.strip_suffix('z'))
        .unwrap_or(rest)
        .trim();
    let (clock, offset) = match rest.find(|c: char| c == '+' || c == '-' || c == ' ') {
        Some(i) => (&rest[..i], Some(rest[i..].trim())),
        None => (rest, None),
    };

    let mut naive = date.and_time(NaiveTime::from_hms_opt(0, 0, 0)?);
    if !clock.is_empty() {
        let mut fields = clock.split(':');
        let hour = fields.next()?.parse().ok()?;
        let minute = fields.next().map(str::parse).transpose().ok()?.unwrap_or(0);
        let second: f64 = fields.next().map(str::parse).transpose().ok()?.unwrap_or(0.0);
        if fields.next().is_some() || !(0.0..61.0).contains(&second) {
            return None;
        }
        naive = date.and_time(NaiveTime::from_hms_opt(hour, minute, 0)?);
        naive += Duration::microseconds((second * 1e6).round() as i64);
    }

    if let Some(offset) = offset {
        naive -= parse_offset(offset)?;
    }

    Some(Utc.from_utc_datetime(&naive))
}

fn parse_offset(offset: &str) -> Option<Duration> {
    let (sign, digits) = match offset.chars().next()? {
        '+' => (1, &offset[1..]),
        '-' => (-1, &offset[1..]),
        _ => (1, offset),
    };
    let (hours, minutes) = match digits.split_once(':') {
        Some((hours, minutes)) => (hours.parse::<i64>().ok()?, minutes.parse::<i64>().ok()?),
        None if digits.len() == 4 => (
            digits.get(..2)?.parse().ok()?,
            digits.get(2..)?.parse().ok()?,
        ),
        None => (digits.parse().ok()?, 0),
    };

    Some(Duration::minutes(sign * (hours * 60 + minutes)))
}
