use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PatchlensError;

/// Top-level configuration loaded from `.patchlens.toml`.
///
/// CLI flags take precedence over file values, which take precedence over the
/// built-in defaults.
///
/// # Examples
///
/// ```
/// use patchlens_core::PatchlensConfig;
///
/// let config = PatchlensConfig::default();
/// assert_eq!(config.review.language, "Rust");
/// assert_eq!(config.agent.command, "claude");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchlensConfig {
    /// Review context settings.
    #[serde(default)]
    pub review: ReviewConfig,
    /// Checkout location settings.
    #[serde(default)]
    pub checkout: CheckoutConfig,
    /// Analysis agent settings.
    #[serde(default)]
    pub agent: AgentConfig,
    /// Hosting platform credentials.
    #[serde(default)]
    pub github: GithubConfig,
}

impl PatchlensConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PatchlensError::Io`] if the file cannot be read, or
    /// [`PatchlensError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use patchlens_core::PatchlensConfig;
    /// use std::path::Path;
    ///
    /// let config = PatchlensConfig::from_file(Path::new(".patchlens.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, PatchlensError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`PatchlensError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use patchlens_core::PatchlensConfig;
    ///
    /// let toml = r#"
    /// [review]
    /// language = "C++"
    /// "#;
    /// let config = PatchlensConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.review.language, "C++");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, PatchlensError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Review context configuration.
///
/// # Examples
///
/// ```
/// use patchlens_core::ReviewConfig;
///
/// let config = ReviewConfig::default();
/// assert_eq!(config.language, "Rust");
/// assert!(config.questions.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Programming language framing for the review (default: `"Rust"`).
    #[serde(default = "default_language")]
    pub language: String,
    /// Extra questions appended verbatim to every prompt.
    pub questions: Option<String>,
}

fn default_language() -> String {
    "Rust".into()
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            questions: None,
        }
    }
}

/// Checkout location configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Base directory for repository clones (default: `~/repos`).
    /// A leading `~` is expanded to the home directory.
    #[serde(default = "default_base_dir")]
    pub base_dir: String,
}

fn default_base_dir() -> String {
    "~/repos".into()
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}

impl CheckoutConfig {
    /// The base directory with `~` expanded.
    ///
    /// # Examples
    ///
    /// ```
    /// use patchlens_core::CheckoutConfig;
    ///
    /// let config = CheckoutConfig { base_dir: "/srv/repos".into() };
    /// assert_eq!(config.resolved_base_dir(), std::path::PathBuf::from("/srv/repos"));
    /// ```
    pub fn resolved_base_dir(&self) -> PathBuf {
        if let Some(rest) = self.base_dir.strip_prefix("~") {
            if let Some(home) = dirs::home_dir() {
                let rest = rest
                    .strip_prefix('/')
                    .or_else(|| rest.strip_prefix('\\'))
                    .unwrap_or(rest);
                return home.join(rest);
            }
        }
        PathBuf::from(&self.base_dir)
    }
}

/// Analysis agent configuration.
///
/// The agent is an external process that receives the full prompt on standard
/// input and returns its analysis on standard output.
///
/// # Examples
///
/// ```
/// use patchlens_core::AgentConfig;
///
/// let config = AgentConfig::default();
/// assert_eq!(config.command, "claude");
/// assert_eq!(config.args, vec!["--print".to_string()]);
/// assert_eq!(config.timeout_secs, 300);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Executable to invoke (default: `"claude"`).
    #[serde(default = "default_agent_command")]
    pub command: String,
    /// Arguments passed to the executable (default: `["--print"]`).
    #[serde(default = "default_agent_args")]
    pub args: Vec<String>,
    /// Hard ceiling for one invocation, in seconds (default: 300).
    #[serde(default = "default_agent_timeout")]
    pub timeout_secs: u64,
}

fn default_agent_command() -> String {
    "claude".into()
}

fn default_agent_args() -> Vec<String> {
    vec!["--print".into()]
}

fn default_agent_timeout() -> u64 {
    300
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            command: default_agent_command(),
            args: default_agent_args(),
            timeout_secs: default_agent_timeout(),
        }
    }
}

/// GitHub API credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Personal access token; raises unauthenticated rate limits.
    pub token: Option<String>,
}

impl GithubConfig {
    /// The configured token, or `GITHUB_TOKEN` / `GH_TOKEN` from the
    /// environment.
    pub fn resolve_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .or_else(|| std::env::var("GH_TOKEN").ok())
    }
}
