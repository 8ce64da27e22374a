mod app_config;

pub use app_config::{AppConfig, HttpConfig, ServicesConfig, UploadConfig, MIB};
