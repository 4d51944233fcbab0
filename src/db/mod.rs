use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

/// SQLite-backed key-value store for everything the client keeps on the device.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        // `sqlite::memory:` databases only live as long as their connection.
        opt.max_connections(1)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!("Database connected & migrations applied ({})", db_url);

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn kv_repo(&self) -> repositories::kv::KvRepository {
        repositories::kv::KvRepository::new(self.conn.clone())
    }

    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        self.kv_repo().get(key).await
    }

    pub async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.kv_repo().set(key, value).await
    }

    pub async fn set_values(&self, pairs: &[(&str, String)]) -> Result<()> {
        self.kv_repo().set_many(pairs).await
    }

    pub async fn remove_value(&self, key: &str) -> Result<bool> {
        self.kv_repo().remove(key).await
    }

    pub async fn remove_values(&self, keys: &[&str]) -> Result<u64> {
        self.kv_repo().remove_many(keys).await
    }

    pub async fn list_keys(&self) -> Result<Vec<String>> {
        self.kv_repo().keys().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_round_trip_through_sqlite() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        store.ping().await.unwrap();

        assert_eq!(store.get_value("missing").await.unwrap(), None);

        store.set_value("a", "1").await.unwrap();
        store.set_value("a", "2").await.unwrap();
        assert_eq!(store.get_value("a").await.unwrap().as_deref(), Some("2"));

        store
            .set_values(&[("b", "x".to_string()), ("c", "y".to_string())])
            .await
            .unwrap();
        assert_eq!(store.list_keys().await.unwrap(), vec!["a", "b", "c"]);

        assert!(store.remove_value("a").await.unwrap());
        assert!(!store.remove_value("a").await.unwrap());
        assert_eq!(store.remove_values(&["b", "c", "zzz"]).await.unwrap(), 2);
        assert!(store.list_keys().await.unwrap().is_empty());
    }
}
