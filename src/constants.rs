pub mod storage_keys {

    pub const SEARCH_HISTORY: &str = "@safechem_search_history";

    pub const BOOKMARKS: &str = "@safechem_bookmarks";

    pub const CHAT_HISTORY: &str = "@safechem_chat_history";

    pub const STATISTICS: &str = "@safechem_statistics";

    pub const AUTH_TOKEN: &str = "@safechem_auth_token";

    pub const AUTH_USER: &str = "@safechem_user";
}

pub mod limits {

    pub const MAX_HISTORY_ITEMS: usize = 20;

    pub const MAX_CHAT_MESSAGES: usize = 100;

    /// History messages forwarded to Gemini with each prompt.
    pub const GEMINI_HISTORY_WINDOW: usize = 6;

    /// History messages forwarded to OpenAI with each request.
    pub const OPENAI_HISTORY_WINDOW: usize = 10;

    pub const MAX_SEARCH_QUERY_LEN: usize = 200;
}
