use std::sync::Arc;
use tokio::time::{sleep, Duration};

use crate::handlers::chat::handle_update;
use crate::AppState;

/// Poll Telegram for updates and answer them one at a time. Never returns.
pub async fn start_polling(state: Arc<AppState>) {
    tracing::info!("Bot polling started");
    let mut offset = 0;

    loop {
        let updates = match state.telegram.get_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::error!("Polling error: {:#}", e);
                sleep(Duration::from_secs(2)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(reply) = handle_update(&state.whitelist, &update).await else {
                continue;
            };
            if let Err(e) = state.telegram.send_message(reply.chat_id, &reply.text).await {
                tracing::error!("Failed to reply in chat {}: {:#}", reply.chat_id, e);
            }
        }
    }
}
