use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use std::env;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let host = env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port: u16 = env::var("DB_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3306);
    let name = env::var("DB_NAME").expect("DB_NAME must be set");
    let user = env::var("DB_USER").expect("DB_USER must be set");
    let password = env::var("DB_PASSWORD").unwrap_or_default();

    println!("Connecting to {}:{}/{} to drop the users table...", host, port, name);

    let options = MySqlConnectOptions::new()
        .host(&host)
        .port(port)
        .database(&name)
        .username(&user)
        .password(&password);

    let pool = MySqlPoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to connect to database");

    sqlx::query("DROP TABLE IF EXISTS users")
        .execute(&pool)
        .await
        .expect("Failed to drop users table");

    println!("Table dropped. It is recreated on the next bot start.");
}
