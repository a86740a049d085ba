//! Server settings loaded via OrthoConfig.
//!
//! Values come from `RECIPES_*` environment variables, an optional config
//! file and command-line flags, in increasing order of precedence.

use std::net::SocketAddr;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MEDIA_ROOT: &str = "./media";

/// Settings controlling how the HTTP server starts.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RECIPES")]
pub struct ServerSettings {
    /// Listen address, e.g. `127.0.0.1:8080`.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without one the server keeps data in memory.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub database_max_connections: Option<u32>,
    /// Directory uploaded images are written below.
    pub media_root: Option<PathBuf>,
    /// Skip applying embedded migrations at startup.
    #[ortho_config(default = false)]
    pub skip_migrations: bool,
}

/// Rejected setting value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address {value:?}: {message}")]
    BindAddr { value: String, message: String },
    #[error("database_max_connections must be at least 1")]
    MaxConnections,
}

impl ServerSettings {
    /// Parsed listen address, falling back to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    /// Database URL with surrounding whitespace removed; blank counts as unset.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn database_max_connections(&self) -> Result<u32, SettingsError> {
        match self.database_max_connections {
            Some(0) => Err(SettingsError::MaxConnections),
            Some(max) => Ok(max),
            None => Ok(DEFAULT_MAX_CONNECTIONS),
        }
    }

    pub fn media_root(&self) -> PathBuf {
        self.media_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_ROOT))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for server settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const KEYS: [&str; 5] = [
        "RECIPES_BIND_ADDR",
        "RECIPES_DATABASE_URL",
        "RECIPES_DATABASE_MAX_CONNECTIONS",
        "RECIPES_MEDIA_ROOT",
        "RECIPES_SKIP_MIGRATIONS",
    ];

    fn load_from_empty_args() -> ServerSettings {
        ServerSettings::load_from_iter([OsString::from("recipe-backend")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(KEYS.map(|key| (key, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr(),
            Ok(SocketAddr::from(([0, 0, 0, 0], 8080)))
        );
        assert_eq!(settings.database_url(), None);
        assert_eq!(settings.database_max_connections(), Ok(10));
        assert_eq!(settings.media_root(), PathBuf::from("./media"));
        assert!(!settings.skip_migrations);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("RECIPES_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            (
                "RECIPES_DATABASE_URL",
                Some(" postgres://localhost/recipes ".to_owned()),
            ),
            ("RECIPES_DATABASE_MAX_CONNECTIONS", Some("4".to_owned())),
            ("RECIPES_MEDIA_ROOT", Some("/srv/media".to_owned())),
            ("RECIPES_SKIP_MIGRATIONS", Some("true".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr(),
            Ok(SocketAddr::from(([127, 0, 0, 1], 9000)))
        );
        assert_eq!(settings.database_url(), Some("postgres://localhost/recipes"));
        assert_eq!(settings.database_max_connections(), Ok(4));
        assert_eq!(settings.media_root(), PathBuf::from("/srv/media"));
        assert!(settings.skip_migrations);
    }

    #[rstest]
    #[case(Some("not-an-address"), None)]
    #[case(None, Some("0"))]
    fn invalid_values_are_reported(
        #[case] bind_addr: Option<&str>,
        #[case] max_connections: Option<&str>,
    ) {
        let _guard = lock_env([
            ("RECIPES_BIND_ADDR", bind_addr.map(str::to_owned)),
            ("RECIPES_DATABASE_URL", None),
            (
                "RECIPES_DATABASE_MAX_CONNECTIONS",
                max_connections.map(str::to_owned),
            ),
            ("RECIPES_MEDIA_ROOT", None),
            ("RECIPES_SKIP_MIGRATIONS", None),
        ]);

        let settings = load_from_empty_args();
        let failed = settings.bind_addr().is_err() || settings.database_max_connections().is_err();
        assert!(failed);
    }
}
