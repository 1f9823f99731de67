use chrono::{DateTime, Duration, Utc};
use parlor_types::Message;

/// Default age after which a message is swept (5 minutes)
pub const DEFAULT_MAX_AGE_SECS: u64 = 300;

/// Age-based expiry: a message stamped `t` is kept while `now < t + max_age`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    max_age: Duration,
}

impl RetentionPolicy {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    /// `None` when `secs` is beyond what a timestamp delta can hold
    pub fn try_from_secs(secs: u64) -> Option<Self> {
        let secs = i64::try_from(secs).ok()?;
        Duration::try_seconds(secs).map(Self::new)
    }

    /// Like [`RetentionPolicy::try_from_secs`], saturating at the largest delta
    pub fn from_secs(secs: u64) -> Self {
        Self::try_from_secs(secs).unwrap_or(Self::new(Duration::MAX))
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Oldest timestamp that is still retained at `now`, exclusive
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.max_age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn is_expired(&self, message: &Message, now: DateTime<Utc>) -> bool {
        message.timestamp <= self.cutoff(now)
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from_secs(DEFAULT_MAX_AGE_SECS)
    }
}
