use serde::{Deserialize, Serialize};

/// Usage counters kept on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_searches: u64,
    pub total_bookmarks: u64,
    pub total_chats_started: u64,
    pub chemicals_viewed: u64,
    /// Milliseconds since the Unix epoch.
    pub joined_date: i64,
    /// Milliseconds since the Unix epoch.
    pub last_active: i64,
}

impl Default for Statistics {
    fn default() -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            total_searches: 0,
            total_bookmarks: 0,
            total_chats_started: 0,
            chemicals_viewed: 0,
            joined_date: now,
            last_active: now,
        }
    }
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct StatisticsUpdate {
    pub total_searches: Option<u64>,
    pub total_bookmarks: Option<u64>,
    pub total_chats_started: Option<u64>,
    pub chemicals_viewed: Option<u64>,
    pub joined_date: Option<i64>,
}

impl Statistics {
    /// Applies `update` and stamps `last_active` with `now`.
    pub fn merge(&mut self, update: &StatisticsUpdate, now: i64) {
        if let Some(v) = update.total_searches {
            self.total_searches = v;
        }
        if let Some(v) = update.total_bookmarks {
            self.total_bookmarks = v;
        }
        if let Some(v) = update.total_chats_started {
            self.total_chats_started = v;
        }
        if let Some(v) = update.chemicals_viewed {
            self.chemicals_viewed = v;
        }
        if let Some(v) = update.joined_date {
            self.joined_date = v;
        }
        self.last_active = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_only_touches_set_fields() {
        let mut stats = Statistics {
            total_searches: 3,
            total_bookmarks: 1,
            total_chats_started: 0,
            chemicals_viewed: 7,
            joined_date: 10,
            last_active: 10,
        };

        stats.merge(
            &StatisticsUpdate {
                total_searches: Some(4),
                ..Default::default()
            },
            99,
        );

        assert_eq!(stats.total_searches, 4);
        assert_eq!(stats.total_bookmarks, 1);
        assert_eq!(stats.chemicals_viewed, 7);
        assert_eq!(stats.joined_date, 10);
        assert_eq!(stats.last_active, 99);
    }
}
