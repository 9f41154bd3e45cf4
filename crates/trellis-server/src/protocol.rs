//! Wire types and routes.
//!
//! The success body is `trellis_core::TemplatesResponse`; this module
//! holds the rest of what goes over the wire.

use serde::{Deserialize, Serialize};
use trellis_core::TEMPLATES_ENDPOINT;

/// Body sent with a 500 response.
///
/// Deliberately generic: details of the failure stay in the server log.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    /// Predefined error: the index could not be built.
    pub fn index_failed() -> Self {
        Self::new("failed to list templates")
    }
}

/// Full route of the templates endpoint under `admin_base`.
///
/// ```
/// use trellis_server::templates_route;
///
/// assert_eq!(templates_route("/admin/"), "/admin/template-service/templates");
/// assert_eq!(templates_route(""), "/template-service/templates");
/// ```
pub fn templates_route(admin_base: &str) -> String {
    let base = admin_base.trim_matches('/');
    if base.is_empty() {
        format!("/{}", TEMPLATES_ENDPOINT)
    } else {
        format!("/{}/{}", base, TEMPLATES_ENDPOINT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes() {
        assert_eq!(templates_route("/admin"), "/admin/template-service/templates");
        assert_eq!(templates_route("cp"), "/cp/template-service/templates");
        assert_eq!(templates_route("/"), "/template-service/templates");
    }

    #[test]
    fn test_error_body_shape() {
        let body = serde_json::to_value(ErrorBody::index_failed()).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "failed to list templates" }));
    }
}
