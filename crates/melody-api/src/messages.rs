use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::info;

use melody_db::models::Page;
use melody_types::api::{MessageResponse, PostMessageRequest, SuccessResponse};

use crate::error::{ApiError, list_response};
use crate::time::minute_stamp;
use crate::{AppState, blocking};

/// Hard cap on an explicit page size.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Optional paging for the feed lists. With neither field set the whole
/// table is returned.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<u32>,
    /// Stored `created_at` of the oldest row already seen.
    pub before: Option<String>,
}

impl FeedQuery {
    pub(crate) fn limit(&self) -> Option<u32> {
        self.limit.map(|l| l.min(MAX_PAGE_SIZE))
    }
}

pub async fn list_messages(State(state): State<AppState>, Query(query): Query<FeedQuery>) -> Response {
    let result = blocking(&state, move |db| {
        let page = Page {
            limit: query.limit(),
            before: query.before.as_deref(),
        };
        Ok(db.list_messages(page)?)
    })
    .await
    .map(|rows| {
        rows.into_iter()
            .map(|row| MessageResponse {
                id: row.id,
                username: row.username,
                content: row.content,
                created_at: minute_stamp(&row.created_at),
            })
            .collect::<Vec<_>>()
    });

    list_response::<MessageResponse>(result)
}

pub async fn post_message(
    State(state): State<AppState>,
    Json(req): Json<PostMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = req.user_id.ok_or(ApiError::MissingField("user_id"))?;
    let username = req.username.ok_or(ApiError::MissingField("username"))?;
    let content = req.content.ok_or(ApiError::MissingField("content"))?;

    let id = blocking(&state, move |db| {
        Ok(db.insert_message(user_id, &username, &content)?)
    })
    .await?;

    info!("Message {} posted by user {}", id, user_id);
    Ok(Json(SuccessResponse::ok()))
}
