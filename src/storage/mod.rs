//! Storage for configuration, paths, and the record database.

pub mod config;
pub mod paths;
pub mod records;
pub mod schema;

pub use config::{
    Config, ConfigSource, ConfigSources, ResolvedConfig, DEFAULT_API_KEY_ENV, ENV_CONFIG, ENV_DB,
    ENV_FORMAT, ENV_NO_COLOR, ENV_NO_COLOR_STD, ENV_OCR_BINARY, ENV_OCR_ENABLED, ENV_PRETTY,
    ENV_TIMEOUT, ENV_VISION_BASE_URL, ENV_VISION_MODEL,
};
pub use paths::AppPaths;
pub use records::RecordStore;
pub use schema::run_migrations;
