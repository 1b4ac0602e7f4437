use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Query, State},
    response::{IntoResponse, Response},
};
use tracing::{error, info, warn};

use melody_db::models::{NewMoment, Page};
use melody_types::api::{MomentResponse, SuccessResponse};

use crate::error::{ApiError, list_response};
use crate::messages::FeedQuery;
use crate::time::MomentStamp;
use crate::uploads::{allowed_file, stored_name};
use crate::{AppState, blocking};

pub async fn list_moments(State(state): State<AppState>, Query(query): Query<FeedQuery>) -> Response {
    let result = blocking(&state, move |db| {
        let page = Page {
            limit: query.limit(),
            before: query.before.as_deref(),
        };
        Ok(db.list_moments(page)?)
    })
    .await
    .map(|rows| {
        rows.into_iter()
            .map(|row| {
                let stamp = MomentStamp::from_stored(&row.created_at);
                MomentResponse {
                    id: row.id,
                    username: row.username,
                    content: row.content,
                    image_url: row.image_url,
                    date_str: stamp.as_ref().map(|s| s.date_str.clone()),
                    time_str: stamp.as_ref().map(|s| s.time_str.clone()),
                    day: stamp.as_ref().map(|s| s.day),
                    month: stamp.map(|s| s.month),
                    created_at: row.created_at,
                }
            })
            .collect::<Vec<_>>()
    });

    list_response::<MomentResponse>(result)
}

/// Fields of the moment form. Unknown fields are skipped.
#[derive(Default)]
struct MomentForm {
    user_id: Option<String>,
    username: Option<String>,
    content: Option<String>,
    /// Client filename and contents of the attached media, if any.
    file: Option<(String, Bytes)>,
}

impl MomentForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "user_id" => form.user_id = Some(field.text().await?),
                "username" => form.username = Some(field.text().await?),
                "content" => form.content = Some(field.text().await?),
                "file" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let data = field.bytes().await?;
                    // Browsers send an empty part when no file was picked.
                    if !file_name.is_empty() {
                        form.file = Some((file_name, data));
                    }
                }
                _ => {}
            }
        }
        Ok(form)
    }
}

/// POST /api/moments: multipart form with `user_id`, `username`, `content`
/// and an optional `file`. Files with a disallowed extension are dropped and
/// the moment is stored without media.
pub async fn post_moment(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = MomentForm::read(multipart).await?;

    let user_id = match form.user_id.as_deref().map(str::trim) {
        None | Some("") => return Err(ApiError::Unauthorized("not logged in")),
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| ApiError::BadRequest(format!("invalid user_id: {raw}")))?,
    };

    let mut saved = None;
    if let Some((client_name, data)) = form.file {
        if allowed_file(&client_name) {
            let name = stored_name(&client_name, chrono::Utc::now());
            let url = state.uploads.save(&name, &data).await.map_err(|e| {
                error!("Failed to write upload {}: {}", name, e);
                ApiError::Internal
            })?;
            saved = Some((name, url));
        } else {
            warn!("Ignoring upload '{}' from user {}: extension not allowed", client_name, user_id);
        }
    }

    let username = form.username.unwrap_or_default();
    let content = form.content.unwrap_or_default();
    let image_url = saved.as_ref().map(|(_, url)| url.clone());

    let inserted = blocking(&state, move |db| {
        Ok(db.insert_moment(&NewMoment {
            user_id,
            username: &username,
            content: &content,
            image_url: image_url.as_deref(),
        })?)
    })
    .await;

    match inserted {
        Ok(id) => {
            info!("Moment {} posted by user {}", id, user_id);
            Ok(Json(SuccessResponse::ok()))
        }
        Err(e) => {
            if let Some((name, _)) = &saved {
                state.uploads.discard(name).await;
            }
            Err(e)
        }
    }
}
