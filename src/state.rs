use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::auth::AuthClient;
use crate::clients::catalog::ChemicalCatalog;
use crate::clients::chat::{ChatApi, ChatClient};
use crate::clients::pubchem::{ChemicalSource, PubChemClient};
use crate::config::Config;
use crate::db::Store;
use crate::rate_limit::RateLimiter;
use crate::services::{
    AuthSession, Bookmarks, ChatHistory, ChatSession, HybridSearch, SearchHistory,
    StatisticsStore,
};
use crate::storage::KeyValueStore;

/// Everything a command needs, wired once at startup.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub catalog: Arc<ChemicalCatalog>,

    pub pubchem: Arc<PubChemClient>,

    pub chat_api: Arc<dyn ChatApi>,

    /// `None` when no account API is configured.
    pub auth: Option<Arc<AuthSession>>,

    pub search_history: Arc<SearchHistory>,

    pub bookmarks: Arc<Bookmarks>,

    pub chat_history: Arc<ChatHistory>,

    pub statistics: Arc<StatisticsStore>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::new(&config.general.database_path).await?;
        Self::with_store(config, store).await
    }

    pub async fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let kv: Arc<dyn KeyValueStore> = Arc::new(store.clone());

        let catalog = Arc::new(ChemicalCatalog::bundled()?);
        let pubchem = Arc::new(PubChemClient::new(&config.pubchem)?);
        let chat_api: Arc<dyn ChatApi> = Arc::new(ChatClient::new(&config.chat)?);

        let auth = match AuthClient::new(&config.auth, kv.clone()) {
            Ok(client) => {
                let limiter =
                    RateLimiter::new(config.security.max_login_attempts, config.login_window());
                let session = AuthSession::new(Arc::new(client), limiter);
                session.initialize().await;
                Some(Arc::new(session))
            }
            Err(e) => {
                warn!("Account features disabled: {}", e);
                None
            }
        };

        let search_history = Arc::new(SearchHistory::new(kv.clone()));
        let bookmarks = Arc::new(Bookmarks::new(kv.clone()));
        let chat_history = Arc::new(ChatHistory::new(kv.clone()));
        let statistics = Arc::new(StatisticsStore::new(kv));

        tokio::join!(
            search_history.load(),
            bookmarks.load(),
            chat_history.load(),
            statistics.load(),
        );

        info!(
            chemicals = catalog.all().len(),
            bookmarks = bookmarks.list().await.len(),
            "State initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            catalog,
            pubchem,
            chat_api,
            auth,
            search_history,
            bookmarks,
            chat_history,
            statistics,
        })
    }

    #[must_use]
    pub fn hybrid_search(&self) -> HybridSearch {
        let source: Arc<dyn ChemicalSource> = self.pubchem.clone();
        HybridSearch::new(self.catalog.clone(), Some(source), &self.config.search)
    }

    #[must_use]
    pub fn chat_session(&self) -> ChatSession {
        ChatSession::new(
            self.chat_api.clone(),
            self.chat_history.clone(),
            self.statistics.clone(),
        )
    }

    /// The signed-in session, or an error explaining how to enable accounts.
    pub fn auth(&self) -> anyhow::Result<&AuthSession> {
        self.auth.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "Account API is not configured. Set auth.base_url in config.toml or SAFECHEM_API_URL."
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wires_without_an_account_api() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let state = SharedState::with_store(Config::default(), store)
            .await
            .unwrap();

        assert!(state.auth.is_none());
        assert!(state.auth().is_err());
        assert!(!state.catalog.all().is_empty());
        assert!(state.bookmarks.list().await.is_empty());
        assert_eq!(state.statistics.get().await.total_searches, 0);
    }
}
