use chrono::{Local, NaiveDate, NaiveTime, ParseError, Timelike};

const MINUTES_PER_HOUR: u32 = 60;

/// Minutes elapsed since midnight. Seconds are ignored, slots are minute aligned.
pub fn minutes_of_day(time: NaiveTime) -> u32 {
    time.hour() * MINUTES_PER_HOUR + time.minute()
}

/// Like [`minutes_of_day`] but a time with seconds rounds up to the next minute.
pub fn minutes_of_day_ceil(time: NaiveTime) -> u32 {
    let partial = time.second() > 0 || time.nanosecond() > 0;
    minutes_of_day(time) + u32::from(partial)
}

/// Inverse of [`minutes_of_day`]. Returns `None` once the day is exceeded instead of
/// wrapping around midnight.
pub fn from_minutes(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / MINUTES_PER_HOUR, minutes % MINUTES_PER_HOUR, 0)
}

pub fn format_hh_mm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn parse_hh_mm(raw: &str) -> Result<NaiveTime, ParseError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M").or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
}

/// The clinic runs in a single fixed locale, the server's local time zone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Serde adapter writing times of day as `HH:MM`.
pub mod hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_hh_mm(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_hh_mm(&raw).map_err(serde::de::Error::custom)
    }
}

/// Like [`hh_mm`] but an absent or blank value reads as `None`.
pub mod hh_mm_opt {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(time) => serializer.serialize_some(&super::format_hh_mm(*time)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => super::parse_hh_mm(&raw)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

/// Calendar dates as `YYYY-MM-DD`; an absent or blank value reads as `None`.
pub mod date_opt {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        date.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<NaiveDate>()
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test_case::test_case("09:00", 540)]
    #[test_case::test_case("00:00", 0)]
    #[test_case::test_case("23:59", 1439)]
    #[test_case::test_case("17:30:00", 1050)]
    fn test_minutes_of_day(raw: &str, expected: u32) {
        let time = parse_hh_mm(raw).unwrap();
        assert_eq!(minutes_of_day(time), expected);
        assert_eq!(from_minutes(expected), Some(time));
    }

    #[test_case::test_case("09:00", 540)]
    #[test_case::test_case("09:00:30", 541)]
    #[test_case::test_case("23:59:59", 1440)]
    fn test_minutes_of_day_ceil(raw: &str, expected: u32) {
        assert_eq!(minutes_of_day_ceil(parse_hh_mm(raw).unwrap()), expected);
    }

    #[test]
    fn test_from_minutes_does_not_wrap() {
        assert_eq!(from_minutes(24 * 60), None);
        assert_eq!(from_minutes(24 * 60 + 15), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        parse_hh_mm("nine").unwrap_err();
        parse_hh_mm("25:00").unwrap_err();
        parse_hh_mm("").unwrap_err();
    }

    #[test]
    fn test_format_hh_mm() {
        let time = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        assert_eq!(format_hh_mm(time), "09:05");
    }
}
