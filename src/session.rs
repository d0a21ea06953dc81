use time::{OffsetDateTime, UtcOffset};

/// Who is looking at the statistics, and when.
///
/// Every time-dependent computation reads its reference instant and the
/// viewer's UTC offset from here instead of the system clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    user_id: String,
    now: OffsetDateTime,
}

impl SessionContext {
    pub fn new(user_id: impl Into<String>, now: OffsetDateTime) -> Self {
        Self {
            user_id: user_id.into(),
            now,
        }
    }

    /// A session anchored at the current wall-clock time in the local offset.
    pub fn at_current_time(user_id: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|err| {
            log::debug!("local offset unavailable ({err}), using UTC");
            OffsetDateTime::now_utc()
        });
        Self::new(user_id, now)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn now(&self) -> OffsetDateTime {
        self.now
    }

    pub fn offset(&self) -> UtcOffset {
        self.now.offset()
    }

    /// `at` as the viewer's wall clock shows it.
    pub fn local(&self, at: OffsetDateTime) -> OffsetDateTime {
        at.to_offset(self.offset())
    }
}
