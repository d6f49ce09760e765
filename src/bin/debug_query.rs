use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use std::env;

// Usage: debug_query <telegram user id>
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let invited_by: i64 = env::args()
        .nth(1)
        .ok_or("usage: debug_query <telegram user id>")?
        .parse()?;

    let options = MySqlConnectOptions::new()
        .host(&env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string()))
        .port(env::var("DB_PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3306))
        .database(&env::var("DB_NAME")?)
        .username(&env::var("DB_USER")?)
        .password(&env::var("DB_PASSWORD").unwrap_or_default());

    let pool = MySqlPoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    let rows: Vec<(String, DateTime<Utc>, String)> = sqlx::query_as(
        "SELECT minecraft_nick, added_at, role FROM users WHERE invited_by = ? ORDER BY added_at",
    )
    .bind(invited_by)
    .fetch_all(&pool)
    .await?;

    if rows.is_empty() {
        println!("DEBUG RESULT: no grants for {}", invited_by);
    }
    for (nick, added_at, role) in rows {
        println!("DEBUG RESULT: {} added {} at {} ({})", invited_by, nick, added_at, role);
    }

    Ok(())
}
