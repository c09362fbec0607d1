use std::{collections::HashSet, fmt::Display};

use teloxide::types::{ChatId, UserId};

const ADMIN_LOG_CHAT_ID_VAR: &str = "ADMIN_LOG_CHAT_ID";
const OWNER_USER_ID_VAR: &str = "OWNER_USER_ID";
const ADMIN_USER_IDS_VAR: &str = "ADMIN_USER_IDS";

/// Everything the bot needs to know that isn't baked into the code.
/// Read once at startup; immutable afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// The chat that receives admin log events.
    pub admin_log_chat: ChatId,
    /// The single owner, if one is configured.
    pub owner: Option<UserId>,
    /// Admins on top of the owner.
    pub admins: HashSet<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingAdminLogChatId,
    MalformedAdminLogChatId(String),
    MalformedOwnerUserId(String),
    MalformedAdminUserIds(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingAdminLogChatId => {
                write!(f, "{ADMIN_LOG_CHAT_ID_VAR} is not set")
            }
            ConfigError::MalformedAdminLogChatId(raw) => write!(
                f,
                "{ADMIN_LOG_CHAT_ID_VAR} must be a chat ID like -1001234567890, got \"{raw}\""
            ),
            ConfigError::MalformedOwnerUserId(raw) => {
                write!(f, "{OWNER_USER_ID_VAR} must be a user ID, got \"{raw}\"")
            }
            ConfigError::MalformedAdminUserIds(raw) => write!(
                f,
                "{ADMIN_USER_IDS_VAR} must be comma-separated user IDs, got \"{raw}\""
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Read configuration from the environment.
    ///
    /// # Errors
    /// Errors if the admin log chat ID is missing, or if any of the
    /// variables fail to parse.
    pub fn from_env() -> Result<Config, ConfigError> {
        let admin_log_chat = match std::env::var(ADMIN_LOG_CHAT_ID_VAR) {
            Ok(raw) => ChatId(
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::MalformedAdminLogChatId(raw))?,
            ),
            Err(_) => return Err(ConfigError::MissingAdminLogChatId),
        };

        let owner = match std::env::var(OWNER_USER_ID_VAR) {
            Ok(raw) => Some(UserId(
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::MalformedOwnerUserId(raw))?,
            )),
            Err(_) => None,
        };

        let admins = match std::env::var(ADMIN_USER_IDS_VAR) {
            Ok(raw) => parse_admin_ids(&raw)?,
            Err(_) => HashSet::new(),
        };

        Ok(Config {
            admin_log_chat,
            owner,
            admins,
        })
    }

    /// True if this user is the configured owner.
    #[must_use]
    pub fn is_owner(&self, user: UserId) -> bool {
        self.owner == Some(user)
    }

    /// True if this user is the owner or one of the configured admins.
    #[must_use]
    pub fn is_admin(&self, user: UserId) -> bool {
        self.is_owner(user) || self.admins.contains(&user)
    }
}

/// Parse a comma-separated list of user IDs. Empty items are skipped,
/// so a trailing comma is fine.
fn parse_admin_ids(raw: &str) -> Result<HashSet<UserId>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse()
                .map(UserId)
                .map_err(|_| ConfigError::MalformedAdminUserIds(part.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(owner: Option<u64>, admins: &[u64]) -> Config {
        Config {
            admin_log_chat: ChatId(-1001234567890),
            owner: owner.map(UserId),
            admins: admins.iter().copied().map(UserId).collect(),
        }
    }

    #[test]
    fn owner_is_admin_even_with_empty_admin_set() {
        let config = config_with(Some(10), &[]);
        assert!(config.is_owner(UserId(10)));
        assert!(config.is_admin(UserId(10)));
    }

    #[test]
    fn arbitrary_user_is_neither() {
        let config = config_with(Some(10), &[20]);
        assert!(!config.is_owner(UserId(999)));
        assert!(!config.is_admin(UserId(999)));
    }

    #[test]
    fn configured_admin_is_admin_but_not_owner() {
        let config = config_with(Some(10), &[20]);
        assert!(config.is_admin(UserId(20)));
        assert!(!config.is_owner(UserId(20)));
    }

    #[test]
    fn no_owner_configured() {
        let config = config_with(None, &[20]);
        assert!(!config.is_owner(UserId(10)));
        assert!(config.is_admin(UserId(20)));
    }

    #[test]
    fn admin_id_list_parsing() {
        let ids = parse_admin_ids("1, 2,3,").unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&UserId(2)));

        assert!(parse_admin_ids("").unwrap().is_empty());
        assert!(matches!(
            parse_admin_ids("1,bogus"),
            Err(ConfigError::MalformedAdminUserIds(_))
        ));
    }
}
