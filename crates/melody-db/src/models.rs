//! Database row types. These map directly to SQLite rows and stay
//! independent of the JSON shapes in melody-types.
//!
//! Timestamps are UTC text in the form `YYYY-MM-DD HH:MM:SS`.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub content: String,
    pub created_at: String,
}

pub struct MomentRow {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: String,
}

pub struct TodoRow {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub todo_date: String,
    pub content: String,
    pub created_at: String,
}

/// Insert payload for a moment; `image_url` is set only when an upload was accepted.
pub struct NewMoment<'a> {
    pub user_id: i64,
    pub username: &'a str,
    pub content: &'a str,
    pub image_url: Option<&'a str>,
}

/// Newest-first page selector for the feed tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct Page<'a> {
    /// `None` returns every row.
    pub limit: Option<u32>,
    /// Only rows created strictly before this timestamp.
    pub before: Option<&'a str>,
}

impl Page<'_> {
    /// SQLite treats a negative LIMIT as "no limit".
    pub(crate) fn sql_limit(&self) -> i64 {
        self.limit.map_or(-1, i64::from)
    }
}
