use crate::core_db::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AclError {
    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid IP mask: {0}")]
    InvalidMask(String),

    #[error("Broader IP mask exists.")]
    BroaderMaskExists,

    #[error("User has no IP masks.")]
    NoMasks,

    #[error("Failed to find specified IP mask.")]
    MaskNotFound,

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Db(#[from] DbError),
}
