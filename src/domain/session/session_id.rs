//! Session identifier value object

use std::fmt;

use chrono::{Local, NaiveDateTime};

/// Timestamp-derived identifier shared by all files of one session.
///
/// Format: `session_YYYYMMDD_HHMMSS`, with `_2`, `_3`, ... appended when two
/// sessions start within the same second.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    const PREFIX: &'static str = "session_";
    const TIME_FORMAT: &'static str = "%Y%m%d_%H%M%S";

    /// Identifier for a session started at `time`
    pub fn at(time: NaiveDateTime) -> Self {
        Self(format!("{}{}", Self::PREFIX, time.format(Self::TIME_FORMAT)))
    }

    /// Identifier for a session starting now, distinct from `previous`
    pub fn generate(previous: Option<&SessionId>) -> Self {
        Self::at(Local::now().naive_local()).distinct_from(previous)
    }

    /// Return an id that sorts after `previous`.
    ///
    /// When the clock has not moved past `previous` (same second, or stepped
    /// back), the previous timestamp is kept and its counter is bumped.
    pub fn distinct_from(self, previous: Option<&SessionId>) -> Self {
        match previous {
            Some(previous) if self.0.as_str() <= previous.base() => previous.next(),
            _ => self,
        }
    }

    /// Same timestamp with the counter suffix incremented
    pub fn next(&self) -> Self {
        let counter = self.counter().unwrap_or(1);
        Self(format!("{}_{}", self.base(), counter + 1))
    }

    /// Timestamp part without any counter suffix
    fn base(&self) -> &str {
        let len = Self::PREFIX.len() + "YYYYMMDD_HHMMSS".len();
        self.0.get(..len).unwrap_or(&self.0)
    }

    fn counter(&self) -> Option<u32> {
        self.0
            .strip_prefix(self.base())
            .and_then(|rest| rest.strip_prefix('_'))
            .and_then(|n| n.parse().ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
