//! Staleness evaluation against the feed publisher's daily schedule.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Daily publication threshold, expressed as a wall-clock time in the
/// publisher's civil timezone.
///
/// Comparisons go through the civil timezone rather than a fixed UTC offset,
/// so the threshold instant tracks daylight-saving shifts over the year.
#[derive(Debug, Clone, Copy)]
pub struct RefreshSchedule {
    timezone: Tz,
    publish_time: NaiveTime,
}

impl RefreshSchedule {
    pub fn new(timezone: Tz, publish_time: NaiveTime) -> Self {
        Self {
            timezone,
            publish_time,
        }
    }

    /// Whether the cached feed must be re-downloaded.
    ///
    /// `last_refresh` of `None` means no usable cache exists and always
    /// reports stale. Otherwise the cache is stale exactly when `now` has
    /// passed today's publication threshold and the last refresh has not.
    /// A refresh recorded after today's threshold stays fresh until the next
    /// day's threshold passes, including across weekends and holidays when
    /// the upstream feed does not actually change.
    pub fn is_stale(&self, now: DateTime<Utc>, last_refresh: Option<DateTime<Utc>>) -> bool {
        let Some(last_refresh) = last_refresh else {
            return true;
        };
        let threshold = self.threshold_for(now);
        now >= threshold && last_refresh < threshold
    }

    /// Publication threshold instant for the civil date of `now`.
    fn threshold_for(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let date = now.with_timezone(&self.timezone).date_naive();
        let mut local = date.and_time(self.publish_time);
        loop {
            // On a DST fold the earlier instant wins; a wall-clock time
            // inside a DST gap resolves to the first hour after the gap.
            match self.timezone.from_local_datetime(&local).earliest() {
                Some(instant) => return instant.with_timezone(&Utc),
                None => local += Duration::hours(1),
            }
        }
    }
}
