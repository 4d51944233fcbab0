mod account;
mod bookmark;
mod chat;
mod history;
mod safety;
mod search;
mod shell;
mod stats;

pub use account::{cmd_forgot_password, cmd_login, cmd_logout, cmd_signup, cmd_whoami};
pub use bookmark::{
    cmd_bookmark_add, cmd_bookmark_clear, cmd_bookmark_list, cmd_bookmark_remove,
    cmd_bookmark_toggle,
};
pub use chat::{cmd_chat, cmd_chat_clear, cmd_chat_history};
pub use history::{cmd_history_clear, cmd_history_list, cmd_history_remove};
pub use safety::cmd_safety;
pub use search::{cmd_catalog, cmd_info, cmd_search};
pub use shell::cmd_shell;
pub use stats::{cmd_stats_reset, cmd_stats_show};
