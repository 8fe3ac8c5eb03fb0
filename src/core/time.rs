use time::{
    format_description::well_known::Rfc3339, macros::format_description, Duration, OffsetDateTime,
    PrimitiveDateTime,
};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn primitive_days_ago(days: i64) -> PrimitiveDateTime {
    primitive_now_utc() - Duration::days(days)
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

/// Parses an RFC 3339 timestamp and normalises it to UTC.
pub(crate) fn parse_rfc3339_utc(value: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    let parsed = OffsetDateTime::parse(value.trim(), &Rfc3339)?.to_offset(time::UtcOffset::UTC);
    Ok(PrimitiveDateTime::new(parsed.date(), parsed.time()))
}

/// `yyyymmdd`, used inside certificate numbers.
pub(crate) fn compact_date(value: PrimitiveDateTime) -> String {
    value
        .format(format_description!("[year][month][day]"))
        .unwrap_or_else(|_| value.date().to_string().replace('-', ""))
}
