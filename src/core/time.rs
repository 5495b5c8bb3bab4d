use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn to_primitive_utc(value: OffsetDateTime) -> PrimitiveDateTime {
    let utc = value.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

pub(crate) fn parse_rfc3339(value: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    OffsetDateTime::parse(value, &Rfc3339).map(to_primitive_utc)
}

/// Whole calendar days between two instants, by UTC date. Time of day is
/// ignored: 23:59 to 00:01 the next day counts as one day.
pub(crate) fn days_between(earlier: PrimitiveDateTime, later: PrimitiveDateTime) -> i64 {
    (later.date() - earlier.date()).whole_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn format_primitive_outputs_utc_z() {
        let value = datetime!(2025-01-02 10:20:30);
        assert_eq!(format_primitive(value), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn parse_rfc3339_normalizes_to_utc() {
        let parsed = parse_rfc3339("2025-01-02T13:20:30+03:00").expect("parse");
        assert_eq!(parsed, datetime!(2025-01-02 10:20:30));
    }

    #[test]
    fn days_between_uses_calendar_dates() {
        let late_night = datetime!(2025-03-01 23:59:00);
        let early_morning = datetime!(2025-03-02 00:01:00);
        assert_eq!(days_between(late_night, early_morning), 1);

        let same_day = datetime!(2025-03-01 08:00:00);
        assert_eq!(days_between(same_day, late_night), 0);

        let two_days = datetime!(2025-03-03 00:00:00);
        assert_eq!(days_between(late_night, two_days), 2);
    }
}
