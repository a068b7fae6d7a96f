//! Entry expiration options.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// When a cache entry expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEntryOptions {
    /// Expire at an absolute instant.
    Absolute(DateTime<Utc>),
    /// Expire after a duration measured from the write.
    RelativeToNow(Duration),
}

/// Expiration resolved against the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// No expiration requested.
    Never,
    /// Expire after this many seconds (at least 1).
    After(u64),
    /// The requested expiration has already passed.
    Elapsed,
}

impl Expiry {
    /// Resolve optional entry options at `now`.
    #[must_use]
    pub fn resolve(options: Option<&CacheEntryOptions>, now: DateTime<Utc>) -> Self {
        match options {
            None => Self::Never,
            Some(options) => options.resolve(now),
        }
    }

    /// The TTL to send to the store, `None` meaning "persist".
    #[must_use]
    pub const fn ttl_secs(&self) -> Option<u64> {
        match self {
            Self::After(secs) => Some(*secs),
            Self::Never | Self::Elapsed => None,
        }
    }
}

impl CacheEntryOptions {
    /// Expire at `at`.
    #[must_use]
    pub const fn absolute(at: DateTime<Utc>) -> Self {
        Self::Absolute(at)
    }

    /// Expire `duration` after the write.
    #[must_use]
    pub const fn relative(duration: Duration) -> Self {
        Self::RelativeToNow(duration)
    }

    /// Resolve against `now`.
    ///
    /// Remaining time is rounded up to whole seconds so that a sub-second
    /// expiration never turns into "no expiration".
    #[must_use]
    pub fn resolve(&self, now: DateTime<Utc>) -> Expiry {
        let remaining_ms: i64 = match self {
            Self::Absolute(at) => (*at - now).num_milliseconds(),
            Self::RelativeToNow(duration) => i64::try_from(duration.as_millis()).unwrap_or(i64::MAX),
        };

        if remaining_ms <= 0 {
            return Expiry::Elapsed;
        }

        let secs = remaining_ms.saturating_add(999) / 1000;
        Expiry::After(u64::try_from(secs).unwrap_or(u64::MAX))
    }

    /// Remaining time in whole seconds; 0 when no time remains.
    #[must_use]
    pub fn ttl_seconds(&self, now: DateTime<Utc>) -> u64 {
        self.resolve(now).ttl_secs().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_absolute_five_minutes_ahead() {
        let options = CacheEntryOptions::absolute(now() + ChronoDuration::minutes(5));
        assert_eq!(options.ttl_seconds(now()), 300);
        assert_eq!(options.resolve(now()), Expiry::After(300));
    }

    #[test]
    fn test_absolute_in_the_past_clamps_to_zero() {
        let options = CacheEntryOptions::absolute(now() - ChronoDuration::seconds(10));
        assert_eq!(options.ttl_seconds(now()), 0);
        assert_eq!(options.resolve(now()), Expiry::Elapsed);
    }

    #[test]
    fn test_absolute_exactly_now_is_elapsed() {
        let options = CacheEntryOptions::absolute(now());
        assert_eq!(options.resolve(now()), Expiry::Elapsed);
    }

    #[test]
    fn test_relative_duration() {
        let options = CacheEntryOptions::relative(Duration::from_secs(90));
        assert_eq!(options.resolve(now()), Expiry::After(90));
        assert_eq!(options.ttl_seconds(now()), 90);
    }

    #[test]
    fn test_sub_second_rounds_up() {
        let options = CacheEntryOptions::absolute(now() + ChronoDuration::milliseconds(5));
        assert_eq!(options.resolve(now()), Expiry::After(1));

        let options = CacheEntryOptions::relative(Duration::from_millis(1500));
        assert_eq!(options.resolve(now()), Expiry::After(2));
    }

    #[test]
    fn test_zero_relative_is_elapsed() {
        let options = CacheEntryOptions::relative(Duration::ZERO);
        assert_eq!(options.resolve(now()), Expiry::Elapsed);
    }

    #[test]
    fn test_no_options_never_expires() {
        let expiry = Expiry::resolve(None, now());
        assert_eq!(expiry, Expiry::Never);
        assert_eq!(expiry.ttl_secs(), None);
    }
}
