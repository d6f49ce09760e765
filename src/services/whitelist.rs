use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

use crate::error::{RconError, StorageError};
use crate::models::grant::{GrantRecord, Role};
use crate::utils::normalize_nickname;
use crate::utils::rcon::RconClient;

/// Persistence of grants, keyed by the inviter's chat identity.
#[async_trait]
pub trait GrantStore: Send + Sync {
    async fn find_role(&self, invited_by: i64) -> Result<Option<Role>, StorageError>;

    async fn insert_grant(&self, record: &GrantRecord) -> Result<(), StorageError>;
}

/// Something that can run console commands on the game server.
#[async_trait]
pub trait Console: Send + Sync {
    /// Run `commands` in order within one session, one response per command.
    async fn execute(&self, commands: &[String]) -> Result<Vec<String>, RconError>;
}

#[async_trait]
impl Console for RconClient {
    async fn execute(&self, commands: &[String]) -> Result<Vec<String>, RconError> {
        RconClient::execute(self, commands).await
    }
}

/// How the whitelist and permission-group commands reach the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantStrategy {
    /// One request, both commands joined with `&&` for the console's shell.
    Combined,
    /// Two requests inside the same session.
    Sequential,
}

impl FromStr for GrantStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "combined" => Ok(GrantStrategy::Combined),
            "sequential" => Ok(GrantStrategy::Sequential),
            other => Err(format!("unknown grant strategy {other:?}, expected combined or sequential")),
        }
    }
}

impl GrantStrategy {
    pub fn commands(&self, nickname: &str, group: &str) -> Vec<String> {
        let whitelist = format!("whitelist add {}", nickname);
        let permission = format!("lp user {} group add {}", nickname, group);
        match self {
            GrantStrategy::Combined => vec![format!("{} && {}", whitelist, permission)],
            GrantStrategy::Sequential => vec![whitelist, permission],
        }
    }
}

/// The single reply produced for one nickname submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    InvalidFormat,
    LimitExceeded,
    Granted { nickname: String, response: String },
    ServerError,
}

impl Outcome {
    pub fn reply_text(&self) -> String {
        match self {
            Outcome::InvalidFormat => {
                "Неверный формат ника. Допустимы латинские буквы, цифры и _, от 3 до 16 символов.".to_string()
            }
            Outcome::LimitExceeded => "Вы уже добавили игрока на сервер. Можно пригласить только одного.".to_string(),
            Outcome::Granted { nickname, response } => {
                format!("Игрок {} добавлен! Ответ сервера: {}", nickname, response)
            }
            Outcome::ServerError => "Произошла ошибка при отправке команды на сервер.".to_string(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::InvalidFormat => "invalid_format",
            Outcome::LimitExceeded => "limit_exceeded",
            Outcome::Granted { .. } => "granted",
            Outcome::ServerError => "server_error",
        };
        f.write_str(name)
    }
}

pub struct WhitelistService<S, C> {
    store: S,
    console: C,
    strategy: GrantStrategy,
    group: String,
}

impl<S, C> WhitelistService<S, C>
where
    S: GrantStore,
    C: Console,
{
    pub fn new(store: S, console: C, strategy: GrantStrategy, group: impl Into<String>) -> Self {
        Self {
            store,
            console,
            strategy,
            group: group.into(),
        }
    }

    pub async fn submit_nickname(&self, inviter_id: i64, raw_text: &str) -> Outcome {
        let nickname = match normalize_nickname(raw_text) {
            Some(n) => n,
            None => {
                tracing::info!("Rejected nickname {:?} from inviter {}", raw_text.trim(), inviter_id);
                return Outcome::InvalidFormat;
            }
        };

        // A failed lookup must not lock the user out, so treat it as "no record".
        let role = self.store.find_role(inviter_id).await.unwrap_or_else(|e| {
            tracing::error!("Failed to look up inviter {}: {}", inviter_id, e);
            None
        });

        if role == Some(Role::Player) {
            tracing::info!("Inviter {} already used their grant", inviter_id);
            return Outcome::LimitExceeded;
        }

        let commands = self.strategy.commands(nickname, &self.group);
        let response = match self.console.execute(&commands).await {
            Ok(responses) => responses.join("\n"),
            Err(e) => {
                tracing::error!("RCON error while granting {} for inviter {}: {}", nickname, inviter_id, e);
                return Outcome::ServerError;
            }
        };

        if role == Some(Role::Admin) {
            tracing::info!("Admin {} granted {}, not recorded", inviter_id, nickname);
        } else if let Err(e) = self.store.insert_grant(&GrantRecord::player(inviter_id, nickname)).await {
            // The server already whitelisted the player; the reply still reports success.
            tracing::error!("Failed to record grant of {} for inviter {}: {}", nickname, inviter_id, e);
        } else {
            tracing::info!("Inviter {} granted {}", inviter_id, nickname);
        }

        Outcome::Granted {
            nickname: nickname.to_string(),
            response,
        }
    }
}
