use serde::{Deserialize, Serialize};

/// One row of the registered-users list, as shown to the user.
/// The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub email: String,
    pub created_at: String,
}
