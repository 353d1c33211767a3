use chrono::{DateTime, Duration, Utc};

pub(crate) trait AlsoChain {
    fn also_<F, R>(self, f: F) -> Self
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> R;
}
impl<T> AlsoChain for T {
    #[inline]
    fn also_<F, R>(mut self, f: F) -> Self
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> R,
    {
        f(&mut self);
        self
    }
}

/// Posts younger than this carry the "NEW" badge.
pub const NEW_FOR_HOURS: i64 = 24;

pub fn is_new(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match created_at {
        Some(t) => now - t < Duration::hours(NEW_FOR_HOURS),
        None => false,
    }
}

/// Relative age: `just now`, `5m ago`, `3h ago`, `2d ago`.
pub fn format_ago(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let t = match created_at {
        Some(t) => t,
        None => return String::new(),
    };

    let mins = (now - t).num_minutes();
    match mins {
        m if m < 1 => "just now".to_string(),
        m if m < 60 => format!("{}m ago", m),
        m if m < 60 * 24 => format!("{}h ago", m / 60),
        m => format!("{}d ago", m / (60 * 24)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn relative_age() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let ago = |secs: i64| format_ago(Some(now - Duration::seconds(secs)), now);

        assert_eq!(ago(20), "just now");
        assert_eq!(ago(5 * 60), "5m ago");
        assert_eq!(ago(3 * 3600 + 59), "3h ago");
        assert_eq!(ago(2 * 86400), "2d ago");
        assert_eq!(format_ago(None, now), "");
    }

    #[test]
    fn new_badge_lasts_a_day() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        assert!(is_new(Some(now - Duration::hours(23)), now));
        assert!(!is_new(Some(now - Duration::hours(24)), now));
        assert!(!is_new(None, now));
    }

    #[test]
    fn chains() {
        assert_eq!(vec![1].also_(|v| v.push(2)), vec![1, 2]);
    }
}
