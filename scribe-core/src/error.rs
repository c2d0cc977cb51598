use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScribeError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),
}
