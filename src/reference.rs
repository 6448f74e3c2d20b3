use std::fmt;

use mongodb::bson::{doc, Bson, Document};
use tracing::{debug, info};

use crate::db::DocumentStore;
use crate::errors::{StoreError, TaskError};
use crate::models::USERS_COLLECTION;

pub const CREATE_ADMIN_HINT: &str =
    "Please create an admin user first using 'make admin' or the create_admin tool.";

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Which user to borrow an identifier from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Username(String),
    /// First user in store-default order
    Any,
}

impl UserLookup {
    pub fn username(name: impl Into<String>) -> Self {
        UserLookup::Username(name.into())
    }

    pub fn admin() -> Self {
        Self::username(DEFAULT_ADMIN_USERNAME)
    }

    fn filter(&self) -> Document {
        match self {
            UserLookup::Username(name) => doc! { "username": name.as_str() },
            UserLookup::Any => Document::new(),
        }
    }
}

impl fmt::Display for UserLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserLookup::Username(name) => write!(f, "user '{}'", name),
            UserLookup::Any => write!(f, "any user"),
        }
    }
}

/// Resolves one user matching `lookup` and returns its identifier as a string.
///
/// Fails with [`TaskError::MissingReference`] when nothing matches; with
/// several matches the first one wins.
pub async fn resolve_user_id<S>(store: &S, lookup: &UserLookup) -> Result<String, TaskError>
where
    S: DocumentStore + ?Sized,
{
    debug!("Looking up {}", lookup);

    let user = store
        .find_one(USERS_COLLECTION, lookup.filter())
        .await?
        .ok_or_else(|| TaskError::MissingReference {
            lookup: lookup.clone(),
            hint: CREATE_ADMIN_HINT,
        })?;

    let id = user_id(&user)?;
    info!("Resolved {} to id {}", lookup, id);
    Ok(id)
}

fn user_id(user: &Document) -> Result<String, StoreError> {
    match user.get("_id") {
        Some(Bson::ObjectId(oid)) => Ok(oid.to_hex()),
        Some(Bson::String(id)) => Ok(id.clone()),
        Some(other) => Err(StoreError::Decode {
            message: format!("user _id has unsupported type {:?}", other.element_type()),
        }),
        None => Err(StoreError::Decode {
            message: "user document has no _id".to_string(),
        }),
    }
}
