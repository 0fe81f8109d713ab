use chrono::{DateTime, Duration, NaiveDateTime, Utc};

pub const XMLTV_DATETIME_FORMAT: &str = "%Y%m%d%H%M%S";
const XMLTV_DATETIME_LEN: usize = 14;
const GMT_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// The guide is queried one hour ahead of the wall clock to line up with the
/// provider broadcast time. Fixed bias, not derived from the feed.
pub const NOW_BIAS_HOURS: i64 = 1;

// `+0200` => 120, `-0530` => -330
fn parse_utc_offset_minutes(offset: &str) -> Option<i64> {
    let (sign, digits) = match offset.as_bytes().first()? {
        b'+' => (1, &offset[1..]),
        b'-' => (-1, &offset[1..]),
        _ => return None,
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i64 = digits[0..2].parse().ok()?;
    let minutes: i64 = digits[2..4].parse().ok()?;
    Some(sign * (hours * 60 + minutes))
}

/// Converts a broadcast grid timestamp `YYYYMMDDHHMMSS ±HHMM` into an absolute instant.
/// A missing offset is read as UTC.
pub fn parse_xmltv_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    let timestamp = timestamp.trim();
    let local_part = timestamp.get(..XMLTV_DATETIME_LEN)?;
    let naive = NaiveDateTime::parse_from_str(local_part, XMLTV_DATETIME_FORMAT).ok()?;
    let offset_part = timestamp.get(XMLTV_DATETIME_LEN..).map_or("", str::trim);
    let offset_minutes = if offset_part.is_empty() { 0 } else { parse_utc_offset_minutes(offset_part)? };
    let utc = naive.checked_sub_signed(Duration::minutes(offset_minutes))?;
    Some(utc.and_utc())
}

pub fn format_gmt(date_time: &DateTime<Utc>) -> String {
    date_time.format(GMT_FORMAT).to_string()
}

pub fn xmltv_timestamp_to_gmt(timestamp: &str) -> Option<String> {
    parse_xmltv_timestamp(timestamp).map(|dt| format_gmt(&dt))
}

/// Renders an instant in the feed's fixed-width format with a literal `+0000` suffix,
/// so it compares lexically with feed timestamps.
pub fn format_xmltv_utc(date_time: &DateTime<Utc>) -> String {
    format!("{} +0000", date_time.format(XMLTV_DATETIME_FORMAT))
}

pub fn guide_now() -> String {
    format_xmltv_utc(&(Utc::now() + Duration::hours(NOW_BIAS_HOURS)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_positive_offset() {
        let dt = parse_xmltv_timestamp("20240101120000 +0200").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_negative_offset() {
        let dt = parse_xmltv_timestamp("20240101120000 -0500").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 1, 17, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_offset_crossing_day() {
        let dt = parse_xmltv_timestamp("20240101003000 +0130").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_xmltv_timestamp("").is_none());
        assert!(parse_xmltv_timestamp("2024010112").is_none());
        assert!(parse_xmltv_timestamp("20241301120000 +0000").is_none());
        assert!(parse_xmltv_timestamp("20240101120000 0200").is_none());
        assert_eq!(parse_xmltv_timestamp("20240101120000"), Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).single());
    }

    #[test]
    fn test_gmt_rendering() {
        assert_eq!(xmltv_timestamp_to_gmt("20240101120000 +0200").as_deref(), Some("Mon, 01 Jan 2024 10:00:00 GMT"));
    }

    #[test]
    fn test_xmltv_utc_rendering() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 3).unwrap();
        assert_eq!(format_xmltv_utc(&dt), "20240309070503 +0000");
        assert_eq!(guide_now().len(), "20240309070503 +0000".len());
    }

    #[test]
    fn test_guide_now_is_one_hour_ahead() {
        let ahead = parse_xmltv_timestamp(&guide_now()).unwrap();
        let minutes = (ahead - Utc::now()).num_minutes();
        assert!((59..=60).contains(&minutes), "unexpected bias {minutes}");
    }
}
