use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::error::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Player,
    /// Pre-seeded outside the bot; exempt from the one-grant limit.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Player => "player",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "player" => Ok(Role::Player),
            "admin" => Ok(Role::Admin),
            _ => Err(StorageError::UnknownRole(s.to_string())),
        }
    }
}

/// One row of the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GrantRecord {
    pub invited_by: i64,
    pub minecraft_nick: String,
    pub added_at: DateTime<Utc>,
    pub role: String, // 'player' or 'admin'
}

impl GrantRecord {
    pub fn player(invited_by: i64, minecraft_nick: &str) -> Self {
        Self {
            invited_by,
            minecraft_nick: minecraft_nick.to_string(),
            added_at: Utc::now(),
            role: Role::Player.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("player".parse::<Role>().unwrap(), Role::Player);
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!(matches!(
            "moderator".parse::<Role>(),
            Err(StorageError::UnknownRole(r)) if r == "moderator"
        ));
    }

    #[test]
    fn new_records_default_to_player() {
        let record = GrantRecord::player(1001, "Steve_01");
        assert_eq!(record.role, "player");
        assert_eq!(record.invited_by, 1001);
        assert_eq!(Role::default(), Role::Player);
    }
}
