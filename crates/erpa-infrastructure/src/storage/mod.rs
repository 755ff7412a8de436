//! Storage layer for the client configuration file.

mod config_storage;

pub use config_storage::{
    ConfigStorage, ENV_BASE_URL, ENV_CSRF_TOKEN, ENV_METHOD_PREFIX, apply_env_overrides,
};
