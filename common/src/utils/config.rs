use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Local,
    Memory,
    S3,
}

fn default_storage_kind() -> StorageKind {
    StorageKind::Local
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub generation_api_token: String,
    #[serde(default = "default_generation_api_base_url")]
    pub generation_api_base_url: String,
    #[serde(default = "default_generation_model")]
    pub generation_model: String,
    pub http_port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_storage_kind")]
    pub storage: StorageKind,
    #[serde(default)]
    pub s3_bucket: Option<String>,
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default = "default_cleanup_max_age_hours")]
    pub cleanup_max_age_hours: i64,
    #[serde(default = "default_generate_max_body_bytes")]
    pub generate_max_body_bytes: usize,
}

fn default_generation_api_base_url() -> String {
    "https://api.replicate.com/v1".to_string()
}

fn default_generation_model() -> String {
    "google/nano-banana".to_string()
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:3000/api/v1/files".to_string()
}

fn default_cleanup_max_age_hours() -> i64 {
    48
}

fn default_generate_max_body_bytes() -> usize {
    10_000_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generation_api_token: String::new(),
            generation_api_base_url: default_generation_api_base_url(),
            generation_model: default_generation_model(),
            http_port: 0,
            data_dir: default_data_dir(),
            storage: default_storage_kind(),
            s3_bucket: None,
            public_base_url: default_public_base_url(),
            cleanup_max_age_hours: default_cleanup_max_age_hours(),
            generate_max_body_bytes: default_generate_max_body_bytes(),
        }
    }
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_optional_fields() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "generation_api_token": "token",
            "http_port": 3000
        }))
        .expect("minimal config deserializes");

        assert_eq!(config.generation_api_base_url, "https://api.replicate.com/v1");
        assert_eq!(config.generation_model, "google/nano-banana");
        assert_eq!(config.data_dir, "./data");
        assert_eq!(config.storage, StorageKind::Local);
        assert_eq!(config.cleanup_max_age_hours, 48);
        assert!(config.s3_bucket.is_none());
    }

    #[test]
    fn storage_kind_parses_lowercase() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "generation_api_token": "token",
            "http_port": 3000,
            "storage": "s3",
            "s3_bucket": "generated-images"
        }))
        .expect("s3 config deserializes");

        assert_eq!(config.storage, StorageKind::S3);
        assert_eq!(config.s3_bucket.as_deref(), Some("generated-images"));
    }
}
