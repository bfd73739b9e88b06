//! # Configuration
//!
//! A minimal string key/value store with `app.set()` / `app.get()`.
//! Services read typed values from an immutable snapshot taken per call.
//!
//! ```rust
//! use mohtaref_core::SiteApp;
//! let app = SiteApp::new();
//!
//! app.set("uploads.timeout_secs", "60");
//! assert_eq!(app.get("uploads.timeout_secs"), Some("60".to_string()));
//! ```
//!
//! Environment overrides use a prefix and double underscores as the
//! separator: `MOHTAREF__UPLOADS__TIMEOUTSECS=30` sets `uploads.timeoutsecs`.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SiteConfig {
    values: HashMap<String, String>,
}

impl SiteConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Copy every `PREFIX__A__B=value` pair into key `a.b`.
    pub fn load_env_prefixed(&mut self, prefix: &str, vars: impl IntoIterator<Item = (String, String)>) {
        let prefix = format!("{prefix}__");
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(&prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.set(normalized, value);
            }
        }
    }

    pub fn snapshot(&self) -> SiteConfigSnapshot {
        SiteConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SiteConfigSnapshot {
    map: HashMap<String, String>,
}

impl SiteConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.trim().parse::<bool>().ok())
    }
}
