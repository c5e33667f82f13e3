use chrono::{DateTime, Days, Local, Utc};

/// Renders a timestamp the way the task list displays it: clock time
/// for today, the literal "Yesterday" for exactly one calendar day
/// ago, abbreviated month and day otherwise. A missing timestamp
/// renders as the empty string.
#[must_use]
pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    format_timestamp_at(ts, Local::now())
}

/// Same as [`format_timestamp`] with an explicit "now", so callers and
/// tests are not pinned to the wall clock.
#[must_use]
pub fn format_timestamp_at(ts: Option<DateTime<Utc>>, now: DateTime<Local>) -> String {
    let Some(ts) = ts else {
        return String::new();
    };

    let local = ts.with_timezone(&now.timezone());
    let day = local.date_naive();
    let today = now.date_naive();

    if day == today {
        return local.format("%H:%M").to_string();
    }
    if today.checked_sub_days(Days::new(1)) == Some(day) {
        return "Yesterday".to_string();
    }
    local.format("%b %-d").to_string()
}
