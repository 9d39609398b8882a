use super::UserContext;
use serde::Serialize;
use serde_json::Value;
use service_core::error::AppError;

/// Validated body of `POST /api/chat`.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    pub user_data: UserContext,
}

impl ChatRequest {
    /// Validate a raw JSON body. `message` must be a non-empty string;
    /// `userData` is optional and coerced leniently.
    pub fn from_json(body: &Value) -> Result<Self, AppError> {
        let message = match body.get("message") {
            Some(Value::String(message)) if !message.is_empty() => message.clone(),
            _ => {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Message is required and must be a string"
                )))
            }
        };

        let user_data = body
            .get("userData")
            .map(UserContext::from_json)
            .unwrap_or_default();

        Ok(Self { message, user_data })
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub timestamp: String,
}

/// Upstream failure body: an error code plus a sentence safe to show the end user.
#[derive(Debug, Serialize)]
pub struct ChatErrorResponse {
    pub error: &'static str,
    pub fallback: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_missing_null_numeric_and_empty_messages() {
        for body in [
            json!({}),
            json!({"message": null}),
            json!({"message": 42}),
            json!({"message": ""}),
            json!("just a string"),
        ] {
            let err = ChatRequest::from_json(&body).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "body: {body}");
        }
    }

    #[test]
    fn user_data_is_optional() {
        let req = ChatRequest::from_json(&json!({"message": "Where are my keys?"})).unwrap();
        assert_eq!(req.message, "Where are my keys?");
        assert_eq!(req.user_data, UserContext::default());
    }

    #[test]
    fn user_data_is_coerced() {
        let req = ChatRequest::from_json(&json!({
            "message": "hello",
            "userData": {"location": "Portland, OR", "medications": null}
        }))
        .unwrap();
        assert_eq!(req.user_data.location.as_deref(), Some("Portland, OR"));
        assert!(req.user_data.medications.is_empty());
    }
}
