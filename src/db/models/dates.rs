//! Date handling shared by the wire format, storage and reporting.
//!
//! Clients send either full RFC 3339 timestamps or bare `YYYY-MM-DD` dates;
//! the latter are taken as UTC midnight. Everything is written back as
//! RFC 3339.

use serde::{de, ser, Deserialize, Deserializer, Serializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

pub fn parse(value: &str) -> Result<OffsetDateTime, time::error::Parse> {
    let value = value.trim();
    OffsetDateTime::parse(value, &Rfc3339).or_else(|err| {
        Date::parse(value, format_description!("[year]-[month]-[day]"))
            .map(|date| date.midnight().assume_utc())
            .map_err(|_| err)
    })
}

/// Human readable month, e.g. "October 2025".
pub fn month_label(at: OffsetDateTime) -> String {
    let at = at.to_offset(UtcOffset::UTC);
    format!("{} {}", at.month(), at.year())
}

/// Sortable month bucket key, e.g. "2025-10".
pub fn month_key(at: OffsetDateTime) -> String {
    let at = at.to_offset(UtcOffset::UTC);
    format!("{:04}-{:02}", at.year(), u8::from(at.month()))
}

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let formatted = value.format(&Rfc3339).map_err(ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(de::Error::custom)
}

pub mod option {
    use super::*;

    pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(at) => super::serialize(at, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => parse(&raw).map(Some).map_err(de::Error::custom),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_bare_dates_as_utc_midnight() {
        assert_eq!(parse("2025-10-15").unwrap(), datetime!(2025-10-15 00:00 UTC));
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let at = parse("2025-10-15T10:30:00+05:30").unwrap();
        assert_eq!(at, datetime!(2025-10-15 05:00 UTC));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("next tuesday").is_err());
    }

    #[test]
    fn month_label_uses_long_month_name() {
        assert_eq!(month_label(datetime!(2025-10-15 00:00 UTC)), "October 2025");
    }

    #[test]
    fn month_key_is_zero_padded() {
        assert_eq!(month_key(datetime!(2025-03-01 00:00 UTC)), "2025-03");
        assert_eq!(month_key(datetime!(2025-11-30 23:59 UTC)), "2025-11");
    }
}
