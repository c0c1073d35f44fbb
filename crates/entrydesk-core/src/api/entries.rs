use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::types::{ApiResponse, EntryQuery, EntryStatus};
use super::{ApiClient, ApiError, ApiResult, encode};

/// Placeholder sent for the server-computed field.
pub const CALCULATED_FIELD_PLACEHOLDER: &str = "Auto-calculated";

impl ApiClient {
    /// `GET /entries?page=..[&status=..][&from=..][&to=..]`.
    ///
    /// # Errors
    /// Returns the transport or HTTP error unchanged.
    pub async fn get_entries(&self, query: &EntryQuery) -> ApiResult<ApiResponse> {
        self.get(self.entries_url(query)).await
    }

    /// `GET /entries/categories`.
    ///
    /// # Errors
    /// Returns the transport or HTTP error unchanged.
    pub async fn get_categories(&self) -> ApiResult<ApiResponse> {
        self.get(self.endpoint(&["entries", "categories"])).await
    }

    /// `POST /entries` with the cached user id and the creation placeholders
    /// merged over `draft`.
    ///
    /// `draft` must serialize to a JSON object. The server decides the real
    /// status, calculated field and approval metadata.
    ///
    /// # Errors
    /// Returns a parse error for a non-object draft, a storage error if the
    /// cached user cannot be read, or the transport/HTTP error unchanged.
    pub async fn create_entry<T: Serialize + ?Sized>(&self, draft: &T) -> ApiResult<ApiResponse> {
        let user_id = self.session.user_id().map_err(ApiError::storage)?;
        let payload = entry_payload(encode(draft)?, user_id)?;
        debug!(payload = %payload, "Creating entry");
        self.post(self.endpoint(&["entries"]), &payload).await
    }

    /// `PUT /entries/{id}/status` with `{"status": ..}`.
    ///
    /// # Errors
    /// Returns the transport or HTTP error unchanged.
    pub async fn update_entry_status(&self, id: u64, status: EntryStatus) -> ApiResult<ApiResponse> {
        let id = id.to_string();
        let url = self.endpoint(&["entries", &id, "status"]);
        self.put(url, &json!({ "status": status })).await
    }

    /// `DELETE /entries/{id}`.
    ///
    /// # Errors
    /// Returns the transport or HTTP error unchanged.
    pub async fn delete_entry(&self, id: u64) -> ApiResult<ApiResponse> {
        let id = id.to_string();
        self.delete(self.endpoint(&["entries", &id])).await
    }

    /// `GET /entries/statistics`.
    ///
    /// # Errors
    /// Returns the transport or HTTP error unchanged.
    pub async fn get_entry_statistics(&self) -> ApiResult<ApiResponse> {
        self.get(self.endpoint(&["entries", "statistics"])).await
    }
}

/// Builds the creation payload. Placeholders override anything the draft
/// set for the same keys. Without a cached user id the `user_id` key is
/// left out entirely.
fn entry_payload(draft: Value, user_id: Option<Value>) -> ApiResult<Value> {
    let mut payload = match draft {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(ApiError::parse(format!(
                "Entry data must be a JSON object, got {other}"
            )));
        }
    };

    match user_id {
        Some(id) => {
            payload.insert("user_id".to_string(), id);
        }
        None => {
            warn!("No cached user; creating entry without user_id");
            payload.remove("user_id");
        }
    }
    payload.insert("status".to_string(), json!(EntryStatus::Pending));
    payload.insert(
        "calculated_field".to_string(),
        json!(CALCULATED_FIELD_PLACEHOLDER),
    );
    payload.insert("approved_by".to_string(), Value::Null);
    payload.insert("approved_at".to_string(), Value::Null);

    Ok(Value::Object(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_merges_user_and_placeholders() {
        let payload = entry_payload(json!({"category": "X"}), Some(json!(7))).unwrap();
        assert_eq!(
            payload,
            json!({
                "category": "X",
                "user_id": 7,
                "status": "pending",
                "calculated_field": "Auto-calculated",
                "approved_by": null,
                "approved_at": null
            })
        );
    }

    #[test]
    fn test_placeholders_override_draft() {
        let draft = json!({"category": "X", "status": "approved", "approved_by": 1});
        let payload = entry_payload(draft, Some(json!(7))).unwrap();
        assert_eq!(payload["status"], json!("pending"));
        assert_eq!(payload["approved_by"], Value::Null);
    }

    #[test]
    fn test_missing_user_omits_user_id() {
        let draft = json!({"category": "X", "user_id": 99});
        let payload = entry_payload(draft, None).unwrap();
        assert!(payload.get("user_id").is_none());
        assert_eq!(payload["category"], json!("X"));
    }

    #[test]
    fn test_non_object_draft_is_rejected() {
        assert!(entry_payload(json!(["X"]), Some(json!(7))).is_err());
        assert!(entry_payload(Value::Null, Some(json!(7))).is_ok());
    }
}
