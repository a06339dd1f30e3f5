use chrono::{DateTime, FixedOffset, Offset, Utc};

const BEIJING_OFFSET_SECS: i32 = 8 * 3600;

/// Current time in UTC+8, the zone report timestamps and history days are written in.
pub fn beijing_now() -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(BEIJING_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    Utc::now().with_timezone(&offset)
}
