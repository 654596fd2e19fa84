//! Server configuration loaded from the environment.

use std::str::FromStr;
use std::time::Duration;

use sketchturn_room::{GameConfig, RoomError};

/// Startup configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error(transparent)]
    Game(#[from] RoomError),
}

/// Everything the server binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Applied to every room the server creates.
    pub game: GameConfig,
    /// How long a new connection may take to send its `Join`.
    pub join_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            game: GameConfig::default(),
            join_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    /// Reads `SKETCHTURN_*` variables, falling back to defaults for unset
    /// ones.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `SKETCHTURN_BIND` | `bind_addr` |
    /// | `SKETCHTURN_SELECTION_SECS` | `game.selection_secs` |
    /// | `SKETCHTURN_GUESSING_SECS` | `game.guessing_secs` |
    /// | `SKETCHTURN_HINT_THRESHOLD_SECS` | `game.hint_threshold_secs` |
    /// | `SKETCHTURN_MAX_ROUNDS` | `game.max_rounds` |
    /// | `SKETCHTURN_JOIN_TIMEOUT_SECS` | `join_timeout` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reads variables through
    /// `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = lookup("SKETCHTURN_BIND").filter(|a| !a.is_empty()) {
            config.bind_addr = addr;
        }
        if let Some(secs) = parse(&lookup, "SKETCHTURN_SELECTION_SECS")? {
            config.game.selection_secs = secs;
        }
        if let Some(secs) = parse(&lookup, "SKETCHTURN_GUESSING_SECS")? {
            config.game.guessing_secs = secs;
        }
        if let Some(secs) = parse(&lookup, "SKETCHTURN_HINT_THRESHOLD_SECS")? {
            config.game.hint_threshold_secs = secs;
        }
        if let Some(rounds) = parse(&lookup, "SKETCHTURN_MAX_ROUNDS")? {
            config.game.max_rounds = rounds;
        }
        if let Some(secs) = parse(&lookup, "SKETCHTURN_JOIN_TIMEOUT_SECS")? {
            config.join_timeout = Duration::from_secs(secs);
        }

        config.game.validate()?;
        Ok(config)
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.game, GameConfig::default());
        assert_eq!(config.join_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides_apply() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("SKETCHTURN_BIND", "0.0.0.0:9000"),
            ("SKETCHTURN_GUESSING_SECS", "60"),
            ("SKETCHTURN_MAX_ROUNDS", " 5 "),
            ("SKETCHTURN_JOIN_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.game.guessing_secs, 60);
        assert_eq!(config.game.max_rounds, 5);
        assert_eq!(config.game.selection_secs, 7);
        assert_eq!(config.join_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_malformed_number_is_an_error() {
        let err = ServerConfig::from_lookup(lookup(&[("SKETCHTURN_SELECTION_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: "SKETCHTURN_SELECTION_SECS", .. }
        ));
    }

    #[test]
    fn test_inconsistent_game_settings_are_rejected() {
        let err = ServerConfig::from_lookup(lookup(&[
            ("SKETCHTURN_GUESSING_SECS", "15"),
            ("SKETCHTURN_HINT_THRESHOLD_SECS", "20"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Game(RoomError::InvalidConfig(_))));
    }
}
