use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default nesting guard for trees, compound rules and mining segments.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    profiled_env_opt(profile, key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

// ── Engine config ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Directory scanned for model documents.
    pub models_dir: PathBuf,
    /// Maximum nesting depth before evaluation fails with a structural error.
    pub max_depth: usize,
    /// Hot-reload model documents when files change.
    pub watch: bool,
    /// Default `tracing` filter directive.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profile: String::new(),
            models_dir: PathBuf::from("data/models"),
            max_depth: DEFAULT_MAX_DEPTH,
            watch: false,
            log_filter: "warn".to_string(),
        }
    }
}

impl EngineConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SYLVA_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SYLVA_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        let defaults = Self::default();
        Self {
            profile: p.to_string(),
            models_dir: PathBuf::from(profiled_env_or(
                p,
                "SYLVA_MODELS_DIR",
                defaults.models_dir.to_str().unwrap_or("data/models"),
            )),
            max_depth: profiled_env_usize(p, "SYLVA_MAX_DEPTH", defaults.max_depth).max(1),
            watch: profiled_env_bool(p, "SYLVA_WATCH", defaults.watch),
            log_filter: profiled_env_or(p, "SYLVA_LOG", &defaults.log_filter),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  models_dir:  {}", self.models_dir.display());
        tracing::info!("  max_depth:   {}", self.max_depth);
        tracing::info!("  watch:       {}", self.watch);
    }
}
