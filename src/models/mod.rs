pub mod article;

pub use article::*;

/// Collection holding platform users; read-only for these tools.
pub const USERS_COLLECTION: &str = "users";
