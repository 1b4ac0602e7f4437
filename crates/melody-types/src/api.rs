use serde::{Deserialize, Deserializer, Serialize};

// -- Auth --

/// Missing fields deserialize as empty strings so the handler can answer
/// with a 400 instead of an extractor rejection.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub user: UserSummary,
}

/// `token` is an opaque display value (`token-<id>`). Nothing verifies it.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserSummary,
    pub token: String,
}

// -- Generic acks --

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub success: bool,
    pub id: i64,
}

// -- Messages --

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: i64,
    pub username: String,
    pub content: String,
    /// `YYYY-MM-DD HH:MM`
    pub created_at: String,
}

// -- Moments --

#[derive(Debug, Serialize)]
pub struct MomentResponse {
    pub id: i64,
    pub username: String,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_str: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_str: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
}

// -- Calendar todos --

#[derive(Debug, Deserialize)]
pub struct AddTodoRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub date: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub todo_date: String,
    pub content: String,
    pub created_at: String,
}

/// Browser clients keep the user id from the login response in local storage
/// and send it back either as a number or as a string.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Str(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(id)) => Ok(Some(id)),
        Some(Raw::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Str(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid user id: {s:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_accepts_number_or_numeric_string() {
        let req: PostMessageRequest =
            serde_json::from_str(r#"{"user_id": 7, "username": "a", "content": "b"}"#).unwrap();
        assert_eq!(req.user_id, Some(7));

        let req: PostMessageRequest =
            serde_json::from_str(r#"{"user_id": "12", "username": "a", "content": "b"}"#).unwrap();
        assert_eq!(req.user_id, Some(12));
    }

    #[test]
    fn missing_or_blank_user_id_is_none() {
        let req: AddTodoRequest = serde_json::from_str(r#"{"date": "2024-05-01"}"#).unwrap();
        assert_eq!(req.user_id, None);
        assert!(req.content.is_none());

        let req: AddTodoRequest = serde_json::from_str(r#"{"user_id": ""}"#).unwrap();
        assert_eq!(req.user_id, None);
    }

    #[test]
    fn non_numeric_user_id_is_rejected() {
        let res = serde_json::from_str::<PostMessageRequest>(r#"{"user_id": "abc"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn register_fields_default_to_empty() {
        let req: RegisterRequest = serde_json::from_str("{}").unwrap();
        assert!(req.username.is_empty());
        assert!(req.password.is_empty());
    }

    #[test]
    fn moment_without_timestamp_parts_omits_derived_fields() {
        let moment = MomentResponse {
            id: 1,
            username: "amy".into(),
            content: "hi".into(),
            image_url: None,
            created_at: "garbage".into(),
            date_str: None,
            time_str: None,
            day: None,
            month: None,
        };
        let json = serde_json::to_value(&moment).unwrap();
        assert!(json.get("date_str").is_none());
        assert!(json["image_url"].is_null());
    }
}
