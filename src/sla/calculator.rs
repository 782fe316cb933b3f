//! Pure due-date and elapsed-time arithmetic.
//!
//! The business window is Monday through Friday, 09:00 to 17:00 UTC, with
//! no holiday calendar. All functions here are deterministic: time comes in
//! as arguments, never from the wall clock.
//!
//! Hour counting is deliberately coarse. Adding hours keeps sub-hour
//! minutes only while the walk stays inside the first business day; every
//! day rollover lands on an exact 09:00 boundary. Elapsed business hours
//! subtract integer hours-of-day, never fractional minutes.

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, Timelike, Utc, Weekday};

/// First hour of the business day (inclusive).
pub const BUSINESS_DAY_START: u32 = 9;

/// End hour of the business day (exclusive).
pub const BUSINESS_DAY_END: u32 = 17;

/// When a timer started at `start` runs out.
///
/// Plain wall-clock addition unless `business_hours_only` is set, in which
/// case hours are consumed inside the business window only.
///
/// # Example
///
/// ```rust
/// use chrono::{Duration, TimeZone, Utc};
/// use trellis::sla::calculator::due_date;
///
/// let start = Utc.with_ymd_and_hms(2026, 3, 3, 10, 0, 0).unwrap();
/// assert_eq!(due_date(start, 5, false), start + Duration::hours(5));
/// ```
pub fn due_date(start: DateTime<Utc>, duration_hours: i64, business_hours_only: bool) -> DateTime<Utc> {
    if business_hours_only {
        add_business_hours(start, duration_hours)
    } else {
        start + Duration::hours(duration_hours)
    }
}

/// When a timer started at `start` should raise a warning.
pub fn warning_date(start: DateTime<Utc>, warning_hours: i64, business_hours_only: bool) -> DateTime<Utc> {
    due_date(start, warning_hours, business_hours_only)
}

/// Advance `start` by `hours` business hours.
///
/// The walk consumes what is left of the current business day, then rolls
/// to 09:00 of the next day, skipping Saturdays and Sundays, until the
/// remaining hours fit in a single day.
///
/// # Example
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use trellis::sla::calculator::add_business_hours;
///
/// // Friday 16:00 plus 3 business hours: one hour to close of business,
/// // two more from Monday 09:00.
/// let friday = Utc.with_ymd_and_hms(2026, 3, 6, 16, 0, 0).unwrap();
/// let monday = Utc.with_ymd_and_hms(2026, 3, 9, 11, 0, 0).unwrap();
/// assert_eq!(add_business_hours(friday, 3), monday);
/// ```
pub fn add_business_hours(start: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    let mut cursor = start;
    let mut remaining = hours;

    while remaining > 0 {
        if is_weekend(cursor) {
            cursor = next_day_start(cursor);
            continue;
        }

        let hour = i64::from(cursor.hour());
        if hour < i64::from(BUSINESS_DAY_START) {
            cursor = clamp_to_morning(cursor);
            continue;
        }
        if hour >= i64::from(BUSINESS_DAY_END) {
            cursor = next_day_start(cursor);
            continue;
        }

        let available = i64::from(BUSINESS_DAY_END) - hour;
        if remaining <= available {
            cursor += Duration::hours(remaining);
            remaining = 0;
        } else {
            remaining -= available;
            cursor = next_day_start(cursor);
        }
    }

    cursor
}

/// Whole wall-clock hours between two instants. Never negative.
pub fn elapsed_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_hours().max(0)
}

/// Business hours consumed between two instants.
///
/// Walks the same daily window as [`add_business_hours`], capping each
/// day's contribution at whichever comes first, `end` or 17:00, and
/// subtracting integer hours-of-day.
pub fn elapsed_business_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    if end <= start {
        return 0;
    }

    let mut cursor = start;
    let mut total = 0;

    while cursor < end {
        if is_weekend(cursor) {
            cursor = next_day_start(cursor);
            continue;
        }
        if cursor.hour() < BUSINESS_DAY_START {
            cursor = clamp_to_morning(cursor);
        }
        if cursor.hour() >= BUSINESS_DAY_END {
            cursor = next_day_start(cursor);
            continue;
        }

        let close = day_end(cursor);
        let slice_end = end.min(close);
        let contributed = i64::from(slice_end.hour()) - i64::from(cursor.hour());
        if contributed > 0 {
            total += contributed;
        }
        cursor = next_day_start(cursor);
    }

    total
}

fn is_weekend(t: DateTime<Utc>) -> bool {
    matches!(t.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Same date, hour forced to 09, minutes preserved.
fn clamp_to_morning(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_hour(BUSINESS_DAY_START)
        .expect("09 is a valid hour")
}

fn morning(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(BUSINESS_DAY_START, 0, 0)
        .expect("09:00:00 is a valid time")
        .and_utc()
}

fn day_end(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive()
        .and_hms_opt(BUSINESS_DAY_END, 0, 0)
        .expect("17:00:00 is a valid time")
        .and_utc()
}

fn next_day_start(t: DateTime<Utc>) -> DateTime<Utc> {
    let next = t
        .date_naive()
        .checked_add_days(Days::new(1))
        .expect("date within supported range");
    morning(next)
}
