use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};

use crate::models::{MessageRow, MomentRow, NewMoment, Page, TodoRow, UserRow};
use crate::{Database, DbError};

impl Database {
    // -- Users --

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>, DbError> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    /// Insert a user and return the generated id.
    ///
    /// A UNIQUE violation on `username` maps to [`DbError::Conflict`], which is
    /// what a registration racing past the existence check runs into.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<i64, DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password) VALUES (?1, ?2)",
                (username, password_hash),
            )
            .map_err(|e| match e.sqlite_error_code() {
                Some(ErrorCode::ConstraintViolation) => DbError::Conflict,
                _ => DbError::Query(e),
            })?;
            Ok(conn.last_insert_rowid())
        })
    }

    // -- Messages --

    pub fn insert_message(&self, user_id: i64, username: &str, content: &str) -> Result<i64, DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (user_id, username, content) VALUES (?1, ?2, ?3)",
                params![user_id, username, content],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Newest first.
    pub fn list_messages(&self, page: Page<'_>) -> Result<Vec<MessageRow>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, username, content, created_at
                 FROM messages
                 WHERE (?1 IS NULL OR created_at < ?1)
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(params![page.before, page.sql_limit()], |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        username: row.get(2)?,
                        content: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Moments --

    pub fn insert_moment(&self, moment: &NewMoment<'_>) -> Result<i64, DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO moments (user_id, username, content, image_url) VALUES (?1, ?2, ?3, ?4)",
                params![moment.user_id, moment.username, moment.content, moment.image_url],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Newest first.
    pub fn list_moments(&self, page: Page<'_>) -> Result<Vec<MomentRow>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, username, content, image_url, created_at
                 FROM moments
                 WHERE (?1 IS NULL OR created_at < ?1)
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(params![page.before, page.sql_limit()], |row| {
                    Ok(MomentRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        username: row.get(2)?,
                        content: row.get(3)?,
                        image_url: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Calendar todos --

    pub fn insert_todo(
        &self,
        user_id: i64,
        username: &str,
        todo_date: &str,
        content: &str,
    ) -> Result<i64, DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO calendar_todos (user_id, username, todo_date, content) VALUES (?1, ?2, ?3, ?4)",
                params![user_id, username, todo_date, content],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Todos for one calendar date, oldest first.
    pub fn list_todos(&self, todo_date: &str) -> Result<Vec<TodoRow>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, username, todo_date, content, created_at
                 FROM calendar_todos
                 WHERE todo_date = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;

            let rows = stmt
                .query_map([todo_date], todo_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Delete by id regardless of owner. Returns the number of rows removed.
    pub fn delete_todo(&self, id: i64) -> Result<usize, DbError> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM calendar_todos WHERE id = ?1", [id])?))
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>, DbError> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<TodoRow> {
    Ok(TodoRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        todo_date: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}
