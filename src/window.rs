// src/window.rs
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

use crate::ingest::types::Post;

/// Time window around an anchor date, both bounds exclusive.
///
/// The anchor is the anchor date at a fixed local time of day (09:00 by
/// default) so feeds that publish around midnight do not flap between days.
/// The default window is the day before the anchor: yesterday 09:00 to
/// today 09:00.
#[derive(Debug, Clone, Copy)]
pub struct WindowSelector {
    pub before: Duration,
    pub after: Duration,
    pub anchor_time: NaiveTime,
    pub offset: FixedOffset,
}

impl Default for WindowSelector {
    fn default() -> Self {
        Self {
            before: Duration::hours(24),
            after: Duration::zero(),
            anchor_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            offset: Utc.fix(),
        }
    }
}

impl WindowSelector {
    pub fn new(before: Duration, after: Duration) -> Self {
        Self {
            before,
            after,
            ..Self::default()
        }
    }

    pub fn with_anchor_time(mut self, t: NaiveTime) -> Self {
        self.anchor_time = t;
        self
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Anchor instant in UTC.
    pub fn anchor(&self, date: NaiveDate) -> DateTime<Utc> {
        let local = date.and_time(self.anchor_time);
        (local - Duration::seconds(i64::from(self.offset.local_minus_utc()))).and_utc()
    }

    /// `(start, end)`, both exclusive. Saturates at the representable range.
    pub fn bounds(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let anchor = self.anchor(date);
        (
            anchor
                .checked_sub_signed(self.before)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            anchor
                .checked_add_signed(self.after)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        )
    }

    pub fn contains(&self, date: NaiveDate, at: DateTime<Utc>) -> bool {
        let (start, end) = self.bounds(date);
        start < at && at < end
    }

    pub fn select_window(&self, posts: &[Post], anchor_date: NaiveDate) -> Vec<Post> {
        posts
            .iter()
            .filter(|p| self.contains(anchor_date, p.published))
            .cloned()
            .collect()
    }
}
