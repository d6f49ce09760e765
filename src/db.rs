use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use std::time::Duration;

use crate::config::Config;
use crate::error::StorageError;
use crate::models::grant::{GrantRecord, Role};
use crate::services::whitelist::GrantStore;

// An admin row wins over any player row for the same inviter.
const FIND_ROLE: &str =
    "SELECT role FROM users WHERE invited_by = ? ORDER BY role = 'admin' DESC LIMIT 1";

/// Build the pool without connecting. Connections are opened by the first
/// query, so a database that is down at startup only fails lookups and writes.
pub fn establish_connection(config: &Config) -> MySqlPool {
    let options = MySqlConnectOptions::new()
        .host(&config.db_host)
        .port(config.db_port)
        .database(&config.db_name)
        .username(&config.db_user)
        .password(&config.db_password);

    MySqlPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy_with(options)
}

/// Create the `users` table on first start.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            invited_by BIGINT NOT NULL,
            minecraft_nick VARCHAR(16) NOT NULL,
            added_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            role VARCHAR(16) NOT NULL DEFAULT 'player',
            INDEX idx_users_invited_by (invited_by)
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

#[derive(Clone)]
pub struct MySqlGrantStore {
    pool: MySqlPool,
}

impl MySqlGrantStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GrantStore for MySqlGrantStore {
    async fn find_role(&self, invited_by: i64) -> Result<Option<Role>, StorageError> {
        let role = sqlx::query_scalar::<_, String>(FIND_ROLE)
            .bind(invited_by)
            .fetch_optional(&self.pool)
            .await?;

        role_from_column(role)
    }

    async fn insert_grant(&self, record: &GrantRecord) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO users (invited_by, minecraft_nick, added_at, role) VALUES (?, ?, ?, ?)")
            .bind(record.invited_by)
            .bind(&record.minecraft_nick)
            .bind(record.added_at)
            .bind(&record.role)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn role_from_column(role: Option<String>) -> Result<Option<Role>, StorageError> {
    role.map(|r| r.parse()).transpose()
}
