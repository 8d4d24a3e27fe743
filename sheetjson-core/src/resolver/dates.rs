//! Excel serial dates and their ISO-8601 rendering

use crate::reader::DateSystem;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// `yyyy-MM-dd'T'HH:mm:ss.SSSZ`: milliseconds and a colon-less numeric offset
pub const DATE_PATTERN: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

const DAY_MILLISECONDS: f64 = 86_400_000.0;

/// First serial after the fictitious 1900-02-29
const FIRST_SERIAL_AFTER_LEAP_BUG: i64 = 61;

static OFFSET_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^([+-])(\d{2}):?(\d{2})$").ok());

/// Convert a serial number into a calendar date-time
///
/// Negative serials are not dates. In the 1900 system serials below 61 are
/// counted from 1899-12-31 and later ones from 1899-12-30, which absorbs the
/// 1900-02-29 that Excel believes exists.
pub fn serial_to_datetime(serial: f64, system: DateSystem) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }

    let whole_days = serial.floor();
    let millis = ((serial - whole_days) * DAY_MILLISECONDS + 0.5) as i64;
    let whole_days = whole_days as i64;

    let (epoch, days) = match system {
        DateSystem::V1900 if whole_days < FIRST_SERIAL_AFTER_LEAP_BUG => {
            (NaiveDate::from_ymd_opt(1899, 12, 31)?, whole_days)
        }
        DateSystem::V1900 => (NaiveDate::from_ymd_opt(1899, 12, 30)?, whole_days),
        DateSystem::V1904 => (NaiveDate::from_ymd_opt(1904, 1, 1)?, whole_days),
    };

    epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_days(days)?)?
        .checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

/// Convert a calendar date-time back into a serial number
pub fn datetime_to_serial(datetime: NaiveDateTime, system: DateSystem) -> Option<f64> {
    let epoch = match system {
        DateSystem::V1900 => NaiveDate::from_ymd_opt(1899, 12, 30)?,
        DateSystem::V1904 => NaiveDate::from_ymd_opt(1904, 1, 1)?,
    };
    let elapsed = datetime.signed_duration_since(epoch.and_hms_opt(0, 0, 0)?);
    let mut serial = elapsed.num_milliseconds() as f64 / DAY_MILLISECONDS;
    if system == DateSystem::V1900 && serial < FIRST_SERIAL_AFTER_LEAP_BUG as f64 {
        serial -= 1.0;
    }
    (serial >= 0.0).then_some(serial)
}

/// Parse ISO-8601 date or date-time text as written by ODS documents
pub fn parse_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a UTC offset written as `Z`, `UTC`, `+HH:MM` or `+HHMM`
pub fn parse_utc_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let caps = OFFSET_PATTERN.as_ref()?.captures(value)?;
    let hours: i32 = caps[2].parse().ok()?;
    let minutes: i32 = caps[3].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }

    let seconds = hours * 3600 + minutes * 60;
    if &caps[1] == "-" {
        FixedOffset::west_opt(seconds)
    } else {
        FixedOffset::east_opt(seconds)
    }
}

/// Renders serial numbers with [`DATE_PATTERN`]
///
/// The serial's wall-clock time is kept as is and stamped with the
/// configured offset; no timezone conversion happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRenderer {
    system: DateSystem,
    offset: FixedOffset,
}

impl DateRenderer {
    pub fn new(system: DateSystem, offset: FixedOffset) -> Self {
        Self { system, offset }
    }

    /// Renderer stamped with `+0000`
    pub fn utc(system: DateSystem) -> Self {
        Self::new(system, Utc.fix())
    }

    /// Render a serial, or `None` when it is not a representable date
    pub fn render(&self, serial: f64) -> Option<String> {
        let naive = serial_to_datetime(serial, self.system)?;
        let stamped = self.offset.from_local_datetime(&naive).single()?;
        Some(stamped.format(DATE_PATTERN).to_string())
    }
}
