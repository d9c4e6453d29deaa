//! Excel serial date conversion (1900 date system).
//!
//! A serial is the number of days since 1899-12-30, the fractional part
//! being the time of day. Using 1899-12-30 as day zero absorbs the 1900
//! leap-year bug for every date after 1900-03-01, which is the range
//! sheetdb writes.

use chrono::{Duration, NaiveDate, NaiveDateTime};

const SECONDS_PER_DAY: f64 = 86_400.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

fn serial_base() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)
}

/// Converts a timestamp to its Excel serial number.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn datetime_to_serial(dt: NaiveDateTime) -> f64 {
    let Some(base) = serial_base() else {
        return 0.0;
    };
    let delta = dt - base;
    let millis = delta.num_milliseconds() as f64;
    millis / 1000.0 / SECONDS_PER_DAY
}

/// Converts an Excel serial number to a timestamp, rounded to the
/// millisecond. Finer fractions are lost.
///
/// Returns `None` for non-finite serials and serials outside the range
/// chrono can represent.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let millis = (serial * MILLIS_PER_DAY).round();
    if millis.abs() >= i64::MAX as f64 {
        return None;
    }
    let delta = Duration::try_milliseconds(millis as i64)?;
    serial_base()?.checked_add_signed(delta)
}
