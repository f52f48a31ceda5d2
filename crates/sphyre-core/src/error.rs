/// Core errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("invalid access level: {0}")]
    InvalidAccessLevel(String),

    #[error("configuration error: {0}")]
    Config(String),
}
