//! Request and response shapes for the entries API.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::error::{ApiError, ApiResult};

/// A completed HTTP exchange: status code and decoded body.
///
/// Bodies that are not JSON are kept as a JSON string; an empty body is `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Value,
}

impl ApiResponse {
    pub fn new(status: u16, data: Value) -> Self {
        Self { status, data }
    }

    /// Decodes the body into `T`.
    ///
    /// # Errors
    /// Returns a parse error if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        T::deserialize(&self.data)
            .map_err(|e| ApiError::parse(format!("Unexpected response body: {e}")))
    }

    /// The top-level `message` field, if the body has one.
    pub fn message(&self) -> Option<&str> {
        self.data.get("message").and_then(Value::as_str)
    }

    /// The `token` field as it should be cached.
    ///
    /// Non-empty strings are taken as-is and non-zero numbers are
    /// stringified. Anything else counts as no token.
    pub fn token(&self) -> Option<String> {
        match self.data.get("token")? {
            Value::String(token) if !token.is_empty() => Some(token.clone()),
            Value::Number(n) if n.as_f64().is_some_and(|f| f.abs() > 0.0) => {
                Some(n.to_string())
            }
            _ => None,
        }
    }
}

/// Login form.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Registration form.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

/// Approval state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Approved,
    Rejected,
}

impl EntryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryStatus::Pending => "pending",
            EntryStatus::Approved => "approved",
            EntryStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!(
                "Unknown entry status: {value} (expected pending, approved or rejected)"
            )),
        }
    }
}

/// Filters for the entries listing.
///
/// Empty `from`/`to` strings are treated like `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryQuery {
    pub page: u32,
    pub status: Option<EntryStatus>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl Default for EntryQuery {
    fn default() -> Self {
        Self {
            page: 1,
            status: None,
            from: None,
            to: None,
        }
    }
}

impl EntryQuery {
    /// Query pairs in wire order, skipping empty filters.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string())];
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        for (key, value) in [("from", &self.from), ("to", &self.to)] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((key, value.to_string()));
            }
        }
        pairs
    }
}

/// An entry as the server reports it. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<u64>,
    #[serde(deserialize_with = "lenient_id")]
    pub user_id: Option<u64>,
    pub category: Value,
    pub status: Option<String>,
    pub calculated_field: Value,
    pub approved_by: Value,
    pub approved_at: Option<String>,
    pub created_at: Option<String>,
}

/// Accepts ids sent as numbers or numeric strings. Anything else is `None`.
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// One page of the entries listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EntryPage {
    pub data: Vec<Entry>,
    pub current_page: u32,
    pub last_page: u32,
    pub total: u64,
}

impl EntryPage {
    /// Reads either a paginated object or a bare array of entries.
    ///
    /// # Errors
    /// Returns a parse error if the body is neither.
    pub fn from_response(response: &ApiResponse) -> ApiResult<Self> {
        if response.data.is_array() {
            let data: Vec<Entry> = response.json()?;
            return Ok(Self {
                total: data.len() as u64,
                data,
                current_page: 1,
                last_page: 1,
            });
        }
        let mut page: Self = response.json()?;
        page.current_page = page.current_page.max(1);
        page.last_page = page.last_page.max(page.current_page);
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_value(EntryStatus::Pending).unwrap(), json!("pending"));
        assert_eq!("Approved".parse::<EntryStatus>().unwrap(), EntryStatus::Approved);
        assert!("archived".parse::<EntryStatus>().is_err());
    }

    #[test]
    fn test_token_accepts_strings_and_numbers() {
        let token = |body| ApiResponse::new(200, body).token();
        assert_eq!(token(json!({"token": "T"})).as_deref(), Some("T"));
        assert_eq!(token(json!({"token": 12345})).as_deref(), Some("12345"));
        assert_eq!(token(json!({"token": ""})), None);
        assert_eq!(token(json!({"token": 0})), None);
        assert_eq!(token(json!({"token": null})), None);
        assert_eq!(token(json!({"token": true})), None);
        assert_eq!(token(json!({"user": {"id": 1}})), None);
    }

    #[test]
    fn test_query_skips_empty_filters() {
        let query = EntryQuery {
            page: 2,
            status: Some(EntryStatus::Approved),
            from: Some(String::new()),
            to: Some(String::new()),
        };
        assert_eq!(
            query.pairs(),
            vec![("page", "2".to_string()), ("status", "approved".to_string())]
        );
    }

    #[test]
    fn test_query_defaults_to_first_page() {
        assert_eq!(EntryQuery::default().pairs(), vec![("page", "1".to_string())]);
    }

    #[test]
    fn test_entry_page_from_paginator() {
        let response = ApiResponse::new(
            200,
            json!({
                "data": [{"id": 1, "category": "Travel", "status": "pending", "extra": true}],
                "current_page": 1,
                "last_page": 3,
                "total": 21
            }),
        );
        let page = EntryPage::from_response(&response).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, Some(1));
        assert_eq!(page.data[0].category, json!("Travel"));
        assert_eq!(page.last_page, 3);
        assert_eq!(page.total, 21);
    }

    #[test]
    fn test_entry_ids_may_arrive_as_strings() {
        let response = ApiResponse::new(
            200,
            json!({
                "data": [
                    {"id": "5", "user_id": "3", "category": "Travel"},
                    {"id": 6, "user_id": null},
                    {"id": "n/a"}
                ],
                "current_page": 1,
                "last_page": 1,
                "total": 3
            }),
        );
        let page = EntryPage::from_response(&response).unwrap();
        assert_eq!(page.data[0].id, Some(5));
        assert_eq!(page.data[0].user_id, Some(3));
        assert_eq!(page.data[1].id, Some(6));
        assert_eq!(page.data[1].user_id, None);
        assert_eq!(page.data[2].id, None);
    }

    #[test]
    fn test_entry_page_from_bare_array() {
        let response = ApiResponse::new(200, json!([{"id": 4}, {"id": 5}]));
        let page = EntryPage::from_response(&response).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.last_page, 1);
    }

    #[test]
    fn test_entry_page_rejects_scalar() {
        let response = ApiResponse::new(200, json!("nope"));
        assert!(EntryPage::from_response(&response).is_err());
    }
}
