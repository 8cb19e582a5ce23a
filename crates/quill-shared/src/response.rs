//! Response documents: rendered views and RFC 7807 problem details.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dto::UserResponse;

/// Flash categories used by the blog.
pub mod category {
    pub const SUCCESS: &str = "success";
    pub const INFO: &str = "info";
    pub const DANGER: &str = "danger";
}

/// A one-time notice shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub category: String,
    pub message: String,
}

impl FlashMessage {
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(category::SUCCESS, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(category::INFO, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(category::DANGER, message)
    }
}

/// A rendered view: what a template engine would receive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewResponse<T> {
    pub view: String,
    pub title: Option<String>,
    /// The logged-in user, for navigation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user: Option<UserResponse>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flashes: Vec<FlashMessage>,
    /// Inline form errors keyed by field.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, Vec<String>>,
    pub data: T,
}

impl<T> ViewResponse<T> {
    pub fn new(view: impl Into<String>, data: T) -> Self {
        Self {
            view: view.into(),
            title: None,
            current_user: None,
            flashes: Vec::new(),
            errors: BTreeMap::new(),
            data,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_current_user(mut self, user: Option<UserResponse>) -> Self {
        self.current_user = user;
        self
    }

    pub fn with_flashes(mut self, flashes: Vec<FlashMessage>) -> Self {
        self.flashes = flashes;
        self
    }

    pub fn with_errors(mut self, errors: BTreeMap<String, Vec<String>>) -> Self {
        self.errors = errors;
        self
    }
}

/// RFC 7807 Problem Details for HTTP APIs.
///
/// See: https://datatracker.ietf.org/doc/html/rfc7807
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub error_type: String,

    /// A short, human-readable summary of the problem type.
    pub title: String,

    /// The HTTP status code.
    pub status: u16,

    /// A human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Request ID for debugging purposes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: u16, title: impl Into<String>) -> Self {
        Self {
            error_type: "about:blank".to_string(),
            title: title.into(),
            status,
            detail: None,
            request_id: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(400, "Bad Request").with_detail(detail)
    }

    pub fn forbidden() -> Self {
        Self::new(403, "Forbidden")
            .with_detail("You do not have permission to modify this resource.")
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(404, "Not Found").with_detail(detail)
    }

    pub fn internal_error() -> Self {
        Self::new(500, "Internal Server Error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_omits_empty_sections() {
        let view = ViewResponse::new("about", serde_json::json!({})).with_title("About");
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["view"], "about");
        assert!(json.get("flashes").is_none());
        assert!(json.get("errors").is_none());
        assert!(json.get("current_user").is_none());
    }

    #[test]
    fn test_problem_document_shape() {
        let json = serde_json::to_value(ErrorResponse::not_found("post 1")).unwrap();
        assert_eq!(json["type"], "about:blank");
        assert_eq!(json["status"], 404);
        assert_eq!(json["detail"], "post 1");
    }
}
