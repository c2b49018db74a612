//! GitHub credentials from the environment.

use super::ConfigError;
use std::path::Path;
use tracing::{debug, info};

/// Variable holding the personal access token.
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Variable holding the account name, only used in logs.
pub const USERNAME_VAR: &str = "GITHUB_USERNAME";

/// Environment file read when none is given.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Token and optional user name for the GitHub API.
#[derive(Clone)]
pub struct Credentials {
    token: String,
    username: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

impl Credentials {
    /// Creates credentials directly.
    pub fn new(token: impl Into<String>, username: Option<String>) -> Self {
        Self {
            token: token.into(),
            username,
        }
    }

    /// Resolves credentials.
    ///
    /// `explicit_token` (from a flag) wins. Otherwise the process environment
    /// is consulted after loading `env_file`, whose values never override
    /// variables that are already set. A missing default `.env` is ignored;
    /// a missing explicitly named file is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment file cannot be loaded or no token
    /// is available.
    pub fn load(env_file: Option<&Path>, explicit_token: Option<String>) -> Result<Self, ConfigError> {
        load_env_file(env_file)?;

        let username = non_empty_var(USERNAME_VAR);
        let token = explicit_token
            .filter(|t| !t.trim().is_empty())
            .or_else(|| non_empty_var(TOKEN_VAR))
            .ok_or_else(|| ConfigError::MissingCredential {
                name: TOKEN_VAR.to_string(),
            })?;

        match &username {
            Some(user) => info!(user = %user, "Using GitHub credentials"),
            None => info!("Using GitHub token"),
        }
        Ok(Self::new(token, username))
    }

    /// Returns the token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the user name, if known.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn load_env_file(env_file: Option<&Path>) -> Result<(), ConfigError> {
    let (path, explicit) = match env_file {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_ENV_FILE), false),
    };

    match dotenvy::from_path(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Loaded environment file");
            Ok(())
        }
        Err(e) if e.not_found() && !explicit => Ok(()),
        Err(source) => Err(ConfigError::EnvFile {
            path: path.display().to_string(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_token_from_env_file() {
        let file = env_file("GITHUB_TOKEN=from-file\nGITHUB_USERNAME=octo\n");
        temp_env::with_vars_unset([TOKEN_VAR, USERNAME_VAR], || {
            let creds = Credentials::load(Some(file.path()), None).unwrap();
            assert_eq!(creds.token(), "from-file");
            assert_eq!(creds.username(), Some("octo"));
        });
    }

    #[test]
    fn process_environment_wins_over_file() {
        let file = env_file("GITHUB_TOKEN=from-file\n");
        temp_env::with_vars(
            [(TOKEN_VAR, Some("from-env")), (USERNAME_VAR, None)],
            || {
                let creds = Credentials::load(Some(file.path()), None).unwrap();
                assert_eq!(creds.token(), "from-env");
            },
        );
    }

    #[test]
    fn explicit_token_wins() {
        temp_env::with_vars([(TOKEN_VAR, Some("from-env"))], || {
            let file = env_file("");
            let creds = Credentials::load(Some(file.path()), Some("flag".to_string())).unwrap();
            assert_eq!(creds.token(), "flag");
        });
    }

    #[test]
    fn missing_token_is_an_error() {
        let file = env_file("OTHER=1\n");
        temp_env::with_vars_unset([TOKEN_VAR, USERNAME_VAR, "OTHER"], || {
            let err = Credentials::load(Some(file.path()), None).unwrap_err();
            assert!(matches!(err, ConfigError::MissingCredential { .. }));
        });
    }

    #[test]
    fn missing_explicit_env_file_is_an_error() {
        let err = Credentials::load(Some(Path::new("no/such/.env")), Some("t".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvFile { .. }));
    }

    #[test]
    fn debug_redacts_token() {
        let creds = Credentials::new("secret", None);
        assert!(!format!("{creds:?}").contains("secret"));
    }
}
