pub mod chat;
pub mod chemical;
pub mod history;
pub mod statistics;
pub mod user;

pub use chat::{ChatContext, ChatMessage, Role};
pub use chemical::{Category, Chemical, HazardLevel};
pub use history::SearchHistoryItem;
pub use statistics::{Statistics, StatisticsUpdate};
pub use user::{AuthResponse, GoogleLoginData, LoginCredentials, ProfileUpdate, SignUpCredentials, User};
