use crate::entities::{kv_entries, prelude::*};
use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

pub struct KvRepository {
    conn: DatabaseConnection,
}

impl KvRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = KvEntries::find_by_id(key.to_string())
            .one(&self.conn)
            .await
            .with_context(|| format!("Failed to read key {key}"))?;

        Ok(row.map(|r| r.value))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        upsert(&self.conn, key, value).await
    }

    /// Writes every pair or none of them.
    pub async fn set_many(&self, pairs: &[(&str, String)]) -> Result<()> {
        let txn = self.conn.begin().await?;
        for (key, value) in pairs {
            upsert(&txn, key, value).await?;
        }
        txn.commit().await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<bool> {
        let res = KvEntries::delete_by_id(key.to_string())
            .exec(&self.conn)
            .await
            .with_context(|| format!("Failed to delete key {key}"))?;

        Ok(res.rows_affected > 0)
    }

    pub async fn remove_many(&self, keys: &[&str]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let res = KvEntries::delete_many()
            .filter(kv_entries::Column::Key.is_in(keys.iter().copied()))
            .exec(&self.conn)
            .await?;

        Ok(res.rows_affected)
    }

    pub async fn keys(&self) -> Result<Vec<String>> {
        let rows = KvEntries::find()
            .order_by_asc(kv_entries::Column::Key)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|r| r.key).collect())
    }
}

async fn upsert<C: ConnectionTrait>(conn: &C, key: &str, value: &str) -> Result<()> {
    let active_model = kv_entries::ActiveModel {
        key: Set(key.to_string()),
        value: Set(value.to_string()),
        updated_at: Set(chrono::Utc::now().to_rfc3339()),
    };

    KvEntries::insert(active_model)
        .on_conflict(
            OnConflict::column(kv_entries::Column::Key)
                .update_columns([kv_entries::Column::Value, kv_entries::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await
        .with_context(|| format!("Failed to write key {key}"))?;

    Ok(())
}
