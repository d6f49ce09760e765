use dotenvy::dotenv;
use std::sync::Arc;

mod bg_task;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;
mod utils;

use config::Config;
use db::MySqlGrantStore;
use services::telegram::TelegramService;
use services::whitelist::WhitelistService;
use utils::rcon::RconClient;

// Application State
pub struct AppState {
    pub telegram: TelegramService,
    pub whitelist: WhitelistService<MySqlGrantStore, RconClient>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("Loaded configuration: {:?}", config);

    let pool = db::establish_connection(&config);
    if let Err(e) = db::ensure_schema(&pool).await {
        tracing::error!("Failed to prepare the users table: {}", e);
    }

    let rcon = RconClient::new(
        config.rcon_host.clone(),
        config.rcon_port,
        config.rcon_password.clone(),
        config.rcon_timeout,
    );

    let state = Arc::new(AppState {
        telegram: TelegramService::new(&config.telegram_api_url, &config.telegram_token)?,
        whitelist: WhitelistService::new(
            MySqlGrantStore::new(pool.clone()),
            rcon,
            config.grant_strategy,
            config.permission_group.clone(),
        ),
    });

    tokio::select! {
        _ = bg_task::start_polling(state.clone()) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    pool.close().await;
    Ok(())
}
