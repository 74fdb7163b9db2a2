//! Conversions between this protocol's epoch-relative temporal scalars and
//! `chrono`/`uuid` types a caller actually wants to hold.
//!
//! Grounded on `qail-sqlx/src/params.rs`'s `pub use chrono::{DateTime, Utc}`
//! re-export — that crate hands callers real `chrono` types at its param
//! boundary rather than raw wire integers; this module does the same for
//! [`Scalar::Date`], [`Scalar::Timestamp`], and [`Scalar::Guid`], which are
//! otherwise just offsets and bytes with no conversion path out.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::value::Scalar;

fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).expect("2000-01-01 is a valid date")
}

fn epoch_datetime() -> DateTime<Utc> {
    Utc.from_utc_datetime(&epoch_date().and_hms_opt(0, 0, 0).expect("midnight is a valid time"))
}

/// Days since 2000-01-01 to a calendar date, or `None` if it over/underflows
/// `chrono`'s representable range.
pub fn date_to_naive_date(days: i32) -> Option<NaiveDate> {
    epoch_date().checked_add_signed(Duration::days(days as i64))
}

/// The inverse of [`date_to_naive_date`].
pub fn naive_date_to_date(date: NaiveDate) -> i32 {
    (date - epoch_date()).num_days() as i32
}

/// Nanoseconds since 2000-01-01T00:00:00Z to a UTC instant, or `None` on
/// overflow.
pub fn timestamp_to_datetime(nanos: i64) -> Option<DateTime<Utc>> {
    epoch_datetime().checked_add_signed(Duration::nanoseconds(nanos))
}

/// The inverse of [`timestamp_to_datetime`].
pub fn datetime_to_timestamp(dt: DateTime<Utc>) -> i64 {
    (dt - epoch_datetime()).num_nanoseconds().unwrap_or(i64::MAX)
}

/// [`Scalar::Guid`]'s raw 16 bytes as a [`uuid::Uuid`].
pub fn guid_to_uuid(bytes: [u8; 16]) -> uuid::Uuid {
    uuid::Uuid::from_bytes(bytes)
}

/// The inverse of [`guid_to_uuid`].
pub fn uuid_to_guid(id: uuid::Uuid) -> [u8; 16] {
    *id.as_bytes()
}

/// A fresh random guid, for callers building a row to insert rather than
/// decoding one off the wire.
pub fn new_guid() -> [u8; 16] {
    uuid_to_guid(uuid::Uuid::new_v4())
}

impl Scalar {
    /// This scalar as a `chrono` value, for the kinds that carry one.
    /// `Date` maps to [`NaiveDate`], `Timestamp` to a UTC instant; every
    /// other kind returns `None` since it has no `chrono` counterpart
    /// (or, for `Guid`, belongs to [`guid_to_uuid`] instead).
    pub fn as_naive_date(&self) -> Option<NaiveDate> {
        match self {
            Scalar::Date(days) => date_to_naive_date(*days),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Scalar::Timestamp(nanos) => timestamp_to_datetime(*nanos),
            _ => None,
        }
    }

    /// This scalar's raw bytes as a [`uuid::Uuid`], for [`Scalar::Guid`].
    pub fn as_uuid(&self) -> Option<uuid::Uuid> {
        match self {
            Scalar::Guid(bytes) => Some(guid_to_uuid(*bytes)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_round_trips_through_naive_date() {
        let original = 9131; // 2025-01-01
        let date = date_to_naive_date(original).unwrap();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2025-01-01");
        assert_eq!(naive_date_to_date(date), original);
    }

    #[test]
    fn timestamp_round_trips_through_datetime() {
        let original = 788_918_400_000_000_000; // 25 years after epoch, in ns
        let dt = timestamp_to_datetime(original).unwrap();
        assert_eq!(datetime_to_timestamp(dt), original);
    }

    #[test]
    fn guid_round_trips_through_uuid() {
        let bytes = [1u8; 16];
        assert_eq!(uuid_to_guid(guid_to_uuid(bytes)), bytes);
    }

    #[test]
    fn new_guid_produces_distinct_values() {
        assert_ne!(new_guid(), new_guid());
    }

    #[test]
    fn scalar_accessors_return_none_for_mismatched_kind() {
        let s = Scalar::Long(42);
        assert_eq!(s.as_naive_date(), None);
        assert_eq!(s.as_datetime(), None);
        assert_eq!(s.as_uuid(), None);
    }
}
