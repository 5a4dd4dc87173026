//! Fixed-format timestamp handling.
//!
//! The API returns timestamps as `"%Y-%m-%d %H:%M:%S"` strings with no
//! timezone, e.g. `"2023-03-11 14:43:29"`.  They are parsed into a naive
//! [`time::PrimitiveDateTime`] and serialized back in the exact same format.

use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// Wire format of every `createdAt` field.
pub(crate) const WIRE_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Render a timestamp in the wire format.
///
/// Formatting a valid datetime with a fixed format cannot fail, so this
/// falls back to the `Display` impl rather than propagating an error.
pub(crate) fn format(datetime: &PrimitiveDateTime) -> String {
    datetime
        .format(WIRE_FORMAT)
        .unwrap_or_else(|_| datetime.to_string())
}

/// Serde adapter for `#[serde(with = "...")]` on timestamp fields.
pub(crate) mod wire {
    use serde::{Deserialize, Deserializer, Serializer, de};
    use time::PrimitiveDateTime;

    use super::WIRE_FORMAT;

    pub fn serialize<S>(datetime: &PrimitiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format(datetime))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<PrimitiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        PrimitiveDateTime::parse(&raw, WIRE_FORMAT).map_err(de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Stamp {
        #[serde(with = "wire")]
        at: PrimitiveDateTime,
    }

    #[test]
    fn parses_wire_format() {
        let stamp: Stamp = serde_json::from_str(r#"{"at": "2023-03-11 14:43:29"}"#).unwrap();
        assert_eq!(stamp.at.year(), 2023);
        assert_eq!(u8::from(stamp.at.month()), 3);
        assert_eq!(stamp.at.day(), 11);
        assert_eq!(stamp.at.hour(), 14);
        assert_eq!(stamp.at.minute(), 43);
        assert_eq!(stamp.at.second(), 29);
    }

    #[test]
    fn round_trips_exactly() {
        let stamp: Stamp = serde_json::from_str(r#"{"at": "2021-01-09 00:05:00"}"#).unwrap();
        let json = serde_json::to_value(&stamp).unwrap();
        assert_eq!(json["at"], "2021-01-09 00:05:00");
    }

    #[test]
    fn rejects_other_formats() {
        assert!(serde_json::from_str::<Stamp>(r#"{"at": "2023-03-11T14:43:29Z"}"#).is_err());
        assert!(serde_json::from_str::<Stamp>(r#"{"at": "11/03/2023"}"#).is_err());
    }
}
