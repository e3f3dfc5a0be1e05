//! Configuration for the basket client.
//!
//! # Example
//!
//! ```
//! use basketi_sync::BasketConfig;
//!
//! // Minimal config (uses defaults)
//! let config = BasketConfig::default();
//! assert_eq!(config.poll_interval_ms, 30_000);
//!
//! // Full config
//! let config = BasketConfig {
//!     api_base_url: "https://basketi.example".into(),
//!     poll_interval_ms: 10_000,
//!     status_display_ms: 2_000,
//!     ..Default::default()
//! };
//! ```

use serde::Deserialize;

/// Configuration for the sync engine and the cache proxy.
///
/// All fields have sensible defaults. At minimum, you should configure
/// `api_base_url` to point at the remote authority.
#[derive(Debug, Clone, Deserialize)]
pub struct BasketConfig {
    /// Base URL of the remote authority (e.g., "https://basketi.example")
    #[serde(default)]
    pub api_base_url: String,

    /// Background poll interval in milliseconds (default: 30 s)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long a Success/Error status stays visible before reverting
    /// to Idle (default: 2 s)
    #[serde(default = "default_status_display_ms")]
    pub status_display_ms: u64,

    /// Version tag for the cache proxy's store. Bumping this string on a
    /// deploy is the only cache-invalidation mechanism.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Prefix for durable storage keys (snapshots, credential book)
    #[serde(default = "default_storage_prefix")]
    pub storage_prefix: String,

    /// Essential resources the proxy precaches during install
    #[serde(default = "default_precache_manifest")]
    pub precache_manifest: Vec<String>,
}

fn default_poll_interval_ms() -> u64 { 30_000 }
fn default_status_display_ms() -> u64 { 2_000 }
fn default_cache_version() -> String { "basketi-v1".to_string() }
fn default_storage_prefix() -> String { "basketi_".to_string() }
fn default_precache_manifest() -> Vec<String> {
    vec![
        "/".to_string(),
        "/index.html".to_string(),
        "/offline.html".to_string(),
        "/icon.png".to_string(),
    ]
}

impl Default for BasketConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            poll_interval_ms: default_poll_interval_ms(),
            status_display_ms: default_status_display_ms(),
            cache_version: default_cache_version(),
            storage_prefix: default_storage_prefix(),
            precache_manifest: default_precache_manifest(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BasketConfig::default();
        assert_eq!(config.poll_interval_ms, 30_000);
        assert_eq!(config.status_display_ms, 2_000);
        assert_eq!(config.cache_version, "basketi-v1");
        assert_eq!(config.storage_prefix, "basketi_");
        assert!(config.precache_manifest.contains(&"/index.html".to_string()));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: BasketConfig = serde_json::from_str(
            r#"{"api_base_url": "https://basketi.example", "poll_interval_ms": 5000}"#,
        )
        .unwrap();

        assert_eq!(config.api_base_url, "https://basketi.example");
        assert_eq!(config.poll_interval_ms, 5000);
        // Untouched fields fall back to defaults
        assert_eq!(config.cache_version, "basketi-v1");
    }
}
