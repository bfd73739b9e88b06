//! Startup configuration.
//!
//! Everything lives in the [`SiteApp`] key/value config: defaults first,
//! then the plain environment variables below, then any
//! `MOHTAREF__SECTION__KEY` override. [`ServerSettings`] is the typed view
//! the binaries build their state from.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use mohtaref_blob::BlobConfig;
use mohtaref_core::{SiteApp, SiteConfigSnapshot};

pub const ENV_PREFIX: &str = "MOHTAREF";

const MIB: u64 = 1024 * 1024;

/// `(environment variable, config key, default)`
const SETTINGS: [(&str, &str, &str); 9] = [
    ("HTTP_HOST", "http.host", "127.0.0.1"),
    ("HTTP_PORT", "http.port", "3000"),
    ("STORAGE_BACKEND", "storage.backend", "mongodb"),
    ("MONGODB_URI", "mongodb.uri", "mongodb://localhost:27017"),
    ("MONGODB_DB", "mongodb.database", "mohtaref"),
    ("UPLOAD_TIMEOUT_SECS", "uploads.timeout_secs", "60"),
    ("UPLOAD_MAX_IMAGE_MB", "uploads.max_image_mb", "10"),
    ("UPLOAD_MAX_VIDEO_MB", "uploads.max_video_mb", "200"),
    ("FFMPEG_BIN", "thumbnails.ffmpeg", "ffmpeg"),
];

/// Fill the app config from the process environment.
pub fn configure(app: &SiteApp) {
    configure_from(app, std::env::vars());
    app.load_env(ENV_PREFIX);
}

/// Fill the app config from explicit variables.
pub fn configure_from(app: &SiteApp, vars: impl IntoIterator<Item = (String, String)>) {
    let vars: HashMap<String, String> = vars.into_iter().collect();
    for (env, key, default) in SETTINGS {
        let value = vars
            .get(env)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(default);
        app.set(key, value.trim());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local stores, lost on exit.
    Memory,
    MongoDb,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "mongodb" | "mongo" => Ok(Self::MongoDb),
            other => bail!("unknown storage backend '{other}', expected 'memory' or 'mongodb'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub backend: StorageBackend,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub upload_timeout: Duration,
    pub max_image_bytes: u64,
    pub max_video_bytes: u64,
    pub ffmpeg_bin: String,
}

impl ServerSettings {
    pub fn from_app(app: &SiteApp) -> Result<Self> {
        Self::from_snapshot(&app.config_snapshot())
    }

    pub fn from_snapshot(cfg: &SiteConfigSnapshot) -> Result<Self> {
        let port = required(cfg, "http.port")?;
        let port = port
            .parse::<u16>()
            .with_context(|| format!("http.port must be a port number, got '{port}'"))?;

        Ok(Self {
            host: required(cfg, "http.host")?,
            port,
            backend: required(cfg, "storage.backend")?.parse()?,
            mongodb_uri: required(cfg, "mongodb.uri")?,
            mongodb_database: required(cfg, "mongodb.database")?,
            upload_timeout: Duration::from_secs(number(cfg, "uploads.timeout_secs")?),
            max_image_bytes: megabytes(cfg, "uploads.max_image_mb")?,
            max_video_bytes: megabytes(cfg, "uploads.max_video_mb")?,
            ffmpeg_bin: required(cfg, "thumbnails.ffmpeg")?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn blob_config(&self) -> BlobConfig {
        BlobConfig::new()
            .with_upload_timeout(self.upload_timeout)
            .with_max_image_bytes(self.max_image_bytes)
            .with_max_video_bytes(self.max_video_bytes)
    }
}

fn required(cfg: &SiteConfigSnapshot, key: &str) -> Result<String> {
    cfg.get_string(key)
        .with_context(|| format!("missing config key '{key}'"))
}

fn number(cfg: &SiteConfigSnapshot, key: &str) -> Result<u64> {
    let raw = required(cfg, key)?;
    cfg.get_u64(key)
        .with_context(|| format!("{key} must be a whole number, got '{raw}'"))
}

fn megabytes(cfg: &SiteConfigSnapshot, key: &str) -> Result<u64> {
    let mb = number(cfg, key)?;
    mb.checked_mul(MIB)
        .with_context(|| format!("{key} of {mb} MiB is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_without_environment() {
        let app = SiteApp::new();
        configure_from(&app, Vec::new());

        let settings = ServerSettings::from_app(&app).unwrap();
        assert_eq!(settings.addr(), "127.0.0.1:3000");
        assert_eq!(settings.backend, StorageBackend::MongoDb);
        assert_eq!(settings.upload_timeout, Duration::from_secs(60));
        assert_eq!(settings.max_image_bytes, 10 * MIB);
        assert_eq!(settings.max_video_bytes, 200 * MIB);
        assert_eq!(settings.ffmpeg_bin, "ffmpeg");
    }

    #[test]
    fn environment_overrides_defaults() {
        let app = SiteApp::new();
        configure_from(
            &app,
            vars(&[
                ("HTTP_PORT", "8080"),
                ("STORAGE_BACKEND", "memory"),
                ("UPLOAD_MAX_IMAGE_MB", "2"),
                ("MONGODB_DB", "  "),
            ]),
        );

        let settings = ServerSettings::from_app(&app).unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.backend, StorageBackend::Memory);
        assert_eq!(settings.blob_config().max_image_bytes, 2 * MIB);
        assert_eq!(settings.mongodb_database, "mohtaref");
    }

    #[test]
    fn bad_values_fail_startup() {
        let app = SiteApp::new();
        configure_from(&app, vars(&[("STORAGE_BACKEND", "s3")]));
        assert!(ServerSettings::from_app(&app).is_err());

        let app = SiteApp::new();
        configure_from(&app, vars(&[("UPLOAD_TIMEOUT_SECS", "soon")]));
        let err = ServerSettings::from_app(&app).unwrap_err();
        assert!(err.to_string().contains("uploads.timeout_secs"));
    }

    #[test]
    fn oversized_upload_limits_fail_startup() {
        let app = SiteApp::new();
        configure_from(&app, vars(&[("UPLOAD_MAX_VIDEO_MB", "18446744073709551615")]));
        let err = ServerSettings::from_app(&app).unwrap_err();
        assert!(err.to_string().contains("uploads.max_video_mb"));
    }
}
