use testapp_types::UserSummary;

/// Row shape of the `users` listing query. Kept separate from
/// `testapp_types::UserSummary` so the UI never depends on column layout.
pub struct UserRow {
    pub username: String,
    pub email: Option<String>,
    pub created_at: Option<String>,
}

impl From<UserRow> for UserSummary {
    fn from(row: UserRow) -> Self {
        Self {
            username: row.username,
            email: row.email.unwrap_or_default(),
            created_at: row.created_at.unwrap_or_default(),
        }
    }
}
