use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid assignment rules: {0}")]
    InvalidRules(String),

    #[error("Invalid lead: {0}")]
    InvalidLead(String),
}
