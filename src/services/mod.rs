pub mod auth;
pub use auth::{AuthError, AuthSession};

pub mod bookmarks;
pub use bookmarks::Bookmarks;

pub mod chat_history;
pub use chat_history::ChatHistory;

pub mod chat_session;
pub use chat_session::ChatSession;

pub mod search;
pub use search::{HybridSearch, SearchState, merge_results};

pub mod search_history;
pub use search_history::SearchHistory;

pub mod statistics;
pub use statistics::StatisticsStore;
