use axum::{
    Json,
    extract::{Path, Query, State, rejection::PathRejection},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, warn};

use melody_types::api::{AddTodoRequest, CreatedResponse, SuccessResponse, TodoResponse};

use crate::error::{ApiError, list_response};
use crate::time::parse_date;
use crate::{AppState, blocking};

#[derive(Debug, Deserialize)]
pub struct TodoQuery {
    pub date: Option<String>,
}

/// GET /api/todos?date=YYYY-MM-DD. A missing or unparseable date is an
/// empty day, not an error.
pub async fn list_todos(State(state): State<AppState>, Query(query): Query<TodoQuery>) -> Response {
    let Some(date) = query.date.as_deref().and_then(parse_date) else {
        return Json(Vec::<TodoResponse>::new()).into_response();
    };

    let todo_date = date.format("%Y-%m-%d").to_string();
    let result = blocking(&state, move |db| Ok(db.list_todos(&todo_date)?))
        .await
        .map(|rows| {
            rows.into_iter()
                .map(|row| TodoResponse {
                    id: row.id,
                    user_id: row.user_id,
                    username: row.username,
                    todo_date: row.todo_date,
                    content: row.content,
                    created_at: row.created_at,
                })
                .collect::<Vec<_>>()
        });

    list_response::<TodoResponse>(result)
}

pub async fn add_todo(
    State(state): State<AppState>,
    Json(req): Json<AddTodoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = req.user_id.ok_or(ApiError::MissingField("user_id"))?;
    let username = req.username.ok_or(ApiError::MissingField("username"))?;
    let raw_date = req.date.ok_or(ApiError::MissingField("date"))?;
    let content = req.content.ok_or(ApiError::MissingField("content"))?;

    let todo_date = parse_date(&raw_date)
        .ok_or_else(|| ApiError::BadRequest(format!("invalid date: {raw_date}")))?
        .format("%Y-%m-%d")
        .to_string();

    let id = blocking(&state, move |db| {
        Ok(db.insert_todo(user_id, &username, &todo_date, &content)?)
    })
    .await?;

    info!("Todo {} added by user {}", id, user_id);
    Ok(Json(CreatedResponse { success: true, id }))
}

/// DELETE /api/todos/{id}. Any caller may delete any todo, and a missing id
/// still reports success. A non-numeric id matches no route and is a 404.
pub async fn delete_todo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id.map_err(|e| {
        warn!("Rejected todo delete path: {}", e);
        ApiError::NotFound
    })?;
    let removed = blocking(&state, move |db| Ok(db.delete_todo(id)?)).await?;

    if removed == 0 {
        warn!("Delete of todo {} matched no rows", id);
    } else {
        info!("Deleted todo {}", id);
    }
    Ok(Json(SuccessResponse::ok()))
}
