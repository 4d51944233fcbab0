use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryItem {
    pub query: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_count: Option<usize>,
}

impl SearchHistoryItem {
    #[must_use]
    pub fn new(query: impl Into<String>, results_count: Option<usize>) -> Self {
        Self {
            query: query.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            results_count,
        }
    }

    #[must_use]
    pub fn same_query(&self, other: &str) -> bool {
        self.query.to_lowercase() == other.to_lowercase()
    }
}
