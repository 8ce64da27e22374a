use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;

pub const MIB: u64 = 1024 * 1024;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Where the three backend services live. When `proxy_base` is set every
/// endpoint is derived from it and the direct URLs are ignored.
#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    pub proxy_base: Option<String>,
    pub upload_url: String,
    pub catalog_url: String,
    pub admin_url: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct UploadConfig {
    pub max_file_size: u64, // in bytes
    pub allowed_media_types: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Builds the configuration, optionally layering `path` on top of the
    /// run-mode file and below the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let upload = UploadConfig::default();

        let mut builder = Config::builder()
            // Start with default values
            .set_default("services.upload_url", ServicesConfig::default().upload_url)?
            .set_default("services.catalog_url", ServicesConfig::default().catalog_url)?
            .set_default("services.admin_url", ServicesConfig::default().admin_url)?
            .set_default("upload.max_file_size", upload.max_file_size)? // 50MB
            .set_default("upload.allowed_media_types", upload.allowed_media_types)?
            .set_default("http.timeout_secs", HttpConfig::default().timeout_secs)?
            // Layer on the environment-specific values
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let s = builder
            // E.g. `APP__SERVICES__PROXY_BASE=http://localhost/api` routes through a proxy
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("upload.allowed_media_types"),
            )
            .build()?;

        s.try_deserialize()
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            proxy_base: None,
            upload_url: "http://localhost:5003/upload".to_string(),
            catalog_url: "http://localhost:5001/videos".to_string(),
            admin_url: "http://localhost:5004/admin/videos".to_string(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * MIB,
            allowed_media_types: vec![
                "video/mp4".to_string(),
                "video/quicktime".to_string(),
                "video/x-matroska".to_string(),
                "video/x-msvideo".to_string(),
            ],
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl UploadConfig {
    pub fn allows(&self, media_type: &str) -> bool {
        self.allowed_media_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(media_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    // The environment is process-wide; loads that read it run one at a time.
    static ENV: Mutex<()> = Mutex::new(());

    const VARS: [&str; 4] = [
        "RUN_MODE",
        "APP__SERVICES__PROXY_BASE",
        "APP__UPLOAD__ALLOWED_MEDIA_TYPES",
        "APP__HTTP__TIMEOUT_SECS",
    ];

    struct Env {
        _guard: MutexGuard<'static, ()>,
    }

    impl Env {
        fn lock() -> Self {
            let guard = ENV.lock().unwrap_or_else(PoisonError::into_inner);
            for var in VARS {
                env::remove_var(var);
            }
            // keep config/development.toml out of the picture
            env::set_var("RUN_MODE", "unit-test");
            Self { _guard: guard }
        }

        fn set(&self, key: &str, value: &str) {
            env::set_var(key, value);
        }
    }

    impl Drop for Env {
        fn drop(&mut self) {
            for var in VARS {
                env::remove_var(var);
            }
        }
    }

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_match_observed_deployment() {
        let config = AppConfig::default();
        assert_eq!(config.upload.max_file_size, 52_428_800);
        assert!(config.upload.allows("video/mp4"));
        assert!(config.upload.allows("VIDEO/QUICKTIME"));
        assert!(!config.upload.allows("text/plain"));
        assert!(config.services.proxy_base.is_none());
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn missing_run_mode_file_loads_defaults() {
        let _env = Env::lock();
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.upload, UploadConfig::default());
        assert_eq!(config.services.catalog_url, "http://localhost:5001/videos");
        assert!(config.services.proxy_base.is_none());
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        let _env = Env::lock();
        let file = toml_file(
            r#"
            [services]
            proxy_base = "http://gateway/api"

            [upload]
            max_file_size = 1024
            "#,
        );
        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.services.proxy_base.as_deref(), Some("http://gateway/api"));
        assert_eq!(config.upload.max_file_size, 1024);
        assert_eq!(
            config.upload.allowed_media_types,
            UploadConfig::default().allowed_media_types
        );
        assert_eq!(config.services.upload_url, "http://localhost:5003/upload");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let _env = Env::lock();
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn environment_overrides_file() {
        let env = Env::lock();
        let file = toml_file(
            r#"
            [services]
            proxy_base = "http://gateway/api"
            "#,
        );
        env.set("APP__SERVICES__PROXY_BASE", "http://localhost/api");
        env.set("APP__HTTP__TIMEOUT_SECS", "5");
        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.services.proxy_base.as_deref(), Some("http://localhost/api"));
        assert_eq!(config.http.timeout_secs, 5);
    }

    #[test]
    fn media_types_from_environment_are_a_list() {
        let env = Env::lock();
        env.set("APP__UPLOAD__ALLOWED_MEDIA_TYPES", "video/mp4,video/webm");
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.upload.allowed_media_types, vec!["video/mp4", "video/webm"]);
        assert!(config.upload.allows("video/webm"));
        assert!(!config.upload.allows("video/quicktime"));

        env.set("APP__UPLOAD__ALLOWED_MEDIA_TYPES", "video/mp4");
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.upload.allowed_media_types, vec!["video/mp4"]);
    }
}
