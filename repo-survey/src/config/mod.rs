//! Configuration and credential loading.
//!
//! Settings come from an optional `survey.toml`; the GitHub token comes
//! from the environment, layered over a `.env` file.

mod credentials;
mod error;
mod survey;

pub use credentials::{Credentials, DEFAULT_ENV_FILE, TOKEN_VAR, USERNAME_VAR};
pub use error::ConfigError;
pub use survey::{RateLimitSettings, RunSettings, StrategyKind, SurveyConfig};
