//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every section is `#[serde(default)]`, so a settings file only needs the
//! keys it wants to override.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// TrackingConfig
// ---------------------------------------------------------------------------

/// Capture loop and gesture-stabilisation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Consecutive identical observations needed before a token commits.
    pub required_stability: u32,
    /// Minimum seconds between two commits.
    pub cooldown_secs: f64,
    /// Capture loop rate in ticks per second.
    pub tick_hz: f64,
    /// JSON-lines detection script replayed in place of a camera.  `None`
    /// means no capture device is available and `start-tracking` fails.
    pub replay_script: Option<PathBuf>,
    /// Restart the replay script when it runs out.
    pub replay_loop: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            required_stability: 15,
            cooldown_secs: 1.5,
            tick_hz: 10.0,
            replay_script: None,
            replay_loop: false,
        }
    }
}

impl TrackingConfig {
    /// Cooldown as a [`Duration`].
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_secs.max(0.0))
    }

    /// Time budget of one capture-loop tick.  Falls back to 10 Hz for rates
    /// [`validate`](Self::validate) would reject.
    pub fn tick_period(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.tick_hz).unwrap_or(Duration::from_millis(100))
    }

    /// Reject values the capture loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.required_stability == 0 {
            bail!("tracking.required_stability must be at least 1");
        }
        if !self.cooldown_secs.is_finite() || self.cooldown_secs < 0.0 {
            bail!(
                "tracking.cooldown_secs must be a non-negative number, got {}",
                self.cooldown_secs
            );
        }
        if !self.tick_hz.is_finite() || self.tick_hz <= 0.0 || self.tick_hz > 120.0 {
            bail!("tracking.tick_hz must be in (0, 120], got {}", self.tick_hz);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// HTTP status API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the API listens on.
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
        }
    }
}

// ---------------------------------------------------------------------------
// ContentConfig
// ---------------------------------------------------------------------------

/// Settings for the word generator used by word-building exercises.
///
/// Speaks the OpenAI chat-completions wire format (Ollama, OpenAI, Groq,
/// LM Studio, …).  When disabled, or when the endpoint fails, the static
/// word table is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Whether to call the text-generation endpoint at all.
    pub enabled: bool,
    /// Base URL of the API endpoint (e.g. `http://localhost:11434`).
    pub base_url: String,
    /// API key; `None` for local providers.
    pub api_key: Option<String>,
    /// Model identifier sent to the API.
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f32,
    /// Maximum seconds to wait for a response.
    pub timeout_secs: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:11434".into(),
            api_key: None,
            model: "qwen2.5:3b".into(),
            temperature: 0.7,
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// ProgressConfig
// ---------------------------------------------------------------------------

/// Where completed exercises are recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Identity the local server records progress under.
    pub user_id: String,
    /// Overrides [`AppPaths::progress_dir`].
    pub store_dir: Option<PathBuf>,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            user_id: "local".into(),
            store_dir: None,
        }
    }
}

impl ProgressConfig {
    /// The configured store directory, or the platform default.
    pub fn resolved_store_dir(&self) -> PathBuf {
        self.store_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().progress_dir)
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use fingerspell::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Capture loop / stabilisation settings.
    pub tracking: TrackingConfig,
    /// HTTP API settings.
    pub server: ServerConfig,
    /// Exercise word generation settings.
    pub content: ContentConfig,
    /// Progress record settings.
    pub progress: ProgressConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// so callers never need to special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
