use crate::services::telegram::Update;
use crate::services::whitelist::{Console, GrantStore, WhitelistService};

pub const GREETING: &str = "Привет! Отправь мне ник игрока, и я добавлю его на сервер!";
pub const HELP: &str = "Отправь ник Minecraft (3-16 символов: латинские буквы, цифры, _). \
Каждый участник может пригласить одного игрока.";

/// What an inbound text means to the bot.
#[derive(Debug, PartialEq, Eq)]
pub enum Inbound<'a> {
    Start,
    Help,
    /// Any other `/command`; ignored.
    OtherCommand,
    Nickname(&'a str),
}

pub fn classify(text: &str) -> Inbound<'_> {
    let trimmed = text.trim_start();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Inbound::Nickname(text);
    };

    // "/start@my_bot payload" -> "start"
    let command = rest
        .split_whitespace()
        .next()
        .unwrap_or("")
        .split('@')
        .next()
        .unwrap_or("");

    match command.to_ascii_lowercase().as_str() {
        "start" => Inbound::Start,
        "help" => Inbound::Help,
        _ => Inbound::OtherCommand,
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Reply {
    pub chat_id: i64,
    pub text: String,
}

/// Turn one update into at most one reply.
pub async fn handle_update<S, C>(service: &WhitelistService<S, C>, update: &Update) -> Option<Reply>
where
    S: GrantStore,
    C: Console,
{
    let message = update.message.as_ref()?;
    let text = message.text.as_deref()?;
    let sender = message.from.as_ref()?;
    if sender.is_bot {
        return None;
    }

    let reply = match classify(text) {
        Inbound::Start => GREETING.to_string(),
        Inbound::Help => HELP.to_string(),
        Inbound::OtherCommand => return None,
        Inbound::Nickname(raw) => {
            tracing::info!(
                "Nickname submission from {} (@{})",
                sender.id,
                sender.username.as_deref().unwrap_or("-")
            );
            let outcome = service.submit_nickname(sender.id, raw).await;
            tracing::info!("Submission from {} finished: {}", sender.id, outcome);
            outcome.reply_text()
        }
    };

    Some(Reply {
        chat_id: message.chat.id,
        text: reply,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::telegram::{Chat, Message, User};
    use crate::services::whitelist::tests::{FakeConsole, MemoryStore};
    use crate::services::whitelist::{GrantStrategy, Outcome};

    fn text_update(from: i64, text: &str) -> Update {
        Update {
            update_id: 1,
            message: Some(Message {
                chat: Chat { id: from + 1 },
                from: Some(User {
                    id: from,
                    is_bot: false,
                    username: None,
                }),
                text: Some(text.to_string()),
            }),
        }
    }

    #[test]
    fn classifies_commands_and_text() {
        assert_eq!(classify("/start"), Inbound::Start);
        assert_eq!(classify("/START@whitelist_bot"), Inbound::Start);
        assert_eq!(classify("/help please"), Inbound::Help);
        assert_eq!(classify("/ban Steve"), Inbound::OtherCommand);
        assert_eq!(classify("/"), Inbound::OtherCommand);
        assert_eq!(classify("Steve_01"), Inbound::Nickname("Steve_01"));
        assert_eq!(classify(" bad name! "), Inbound::Nickname(" bad name! "));
    }

    #[tokio::test]
    async fn start_replies_with_greeting_and_no_side_effects() {
        let store = MemoryStore::default();
        let console = FakeConsole::default();
        let svc = WhitelistService::new(&store, &console, GrantStrategy::Combined, "default");

        let reply = handle_update(&svc, &text_update(1001, "/start")).await.unwrap();
        assert_eq!(reply.chat_id, 1002);
        assert_eq!(reply.text, GREETING);
        assert!(console.calls().is_empty());
        assert_eq!(store.lookups(), 0);
    }

    #[tokio::test]
    async fn nickname_text_goes_through_the_service() {
        let store = MemoryStore::default();
        let console = FakeConsole::default();
        let svc = WhitelistService::new(&store, &console, GrantStrategy::Combined, "default");

        let reply = handle_update(&svc, &text_update(1001, "Steve_01")).await.unwrap();
        assert!(reply.text.contains("Steve_01"));
        assert_eq!(store.inserted().len(), 1);

        let reply = handle_update(&svc, &text_update(1001, "Steve_02")).await.unwrap();
        assert_eq!(reply.text, Outcome::LimitExceeded.reply_text());

        let reply = handle_update(&svc, &text_update(2002, "bad name!")).await.unwrap();
        assert_eq!(reply.text, Outcome::InvalidFormat.reply_text());
        assert_eq!(console.calls().len(), 1);
    }

    #[tokio::test]
    async fn ignored_updates_produce_no_reply() {
        let store = MemoryStore::default();
        let console = FakeConsole::default();
        let svc = WhitelistService::new(&store, &console, GrantStrategy::Combined, "default");

        assert!(handle_update(&svc, &text_update(1, "/unknown")).await.is_none());

        let mut from_bot = text_update(1, "Steve_01");
        if let Some(m) = from_bot.message.as_mut() {
            m.from.as_mut().unwrap().is_bot = true;
        }
        assert!(handle_update(&svc, &from_bot).await.is_none());

        let no_message = Update {
            update_id: 9,
            message: None,
        };
        assert!(handle_update(&svc, &no_message).await.is_none());
        assert!(console.calls().is_empty());
    }
}
