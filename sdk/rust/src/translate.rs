//! Transport failure translation.

use gqlds_core::TransportError;

use crate::error::{ApiError, ApiErrorKind};

/// Maps a transport failure to the API error raised to callers.
///
/// The status code selects the kind: 401 is an authentication error, 403 is
/// forbidden, anything else (or no status at all) is generic. The message is
/// the upstream body text, or empty when there was none.
pub fn did_encounter_error(error: &TransportError) -> ApiError {
    let kind = match error.status_code {
        Some(401) => ApiErrorKind::Authentication,
        Some(403) => ApiErrorKind::Forbidden,
        _ => ApiErrorKind::Generic,
    };
    let message = error.body_text.clone().unwrap_or_default();

    ApiError::new(kind, message).with_status(error.status_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized() {
        let err = did_encounter_error(&TransportError::http(401, "token expired"));

        assert_eq!(err.kind(), ApiErrorKind::Authentication);
        assert_eq!(err.message(), "token expired");
    }

    #[test]
    fn test_forbidden() {
        let err = did_encounter_error(&TransportError::http(403, "missing scope"));

        assert_eq!(err.kind(), ApiErrorKind::Forbidden);
        assert_eq!(err.message(), "missing scope");
    }

    #[test]
    fn test_other_statuses_are_generic() {
        for status in [400, 404, 429, 500, 502] {
            let err = did_encounter_error(&TransportError::http(status, "upstream said no"));

            assert_eq!(err.kind(), ApiErrorKind::Generic, "status {status}");
            assert_eq!(err.message(), "upstream said no");
            assert_eq!(err.status_code(), Some(status));
        }
    }

    #[test]
    fn test_network_failure_is_generic_with_empty_message() {
        let err = did_encounter_error(&TransportError::network("connection refused"));

        assert_eq!(err.kind(), ApiErrorKind::Generic);
        assert_eq!(err.message(), "");
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_status_without_body() {
        let err = did_encounter_error(&TransportError::new("cut off").with_status(401));

        assert_eq!(err.kind(), ApiErrorKind::Authentication);
        assert_eq!(err.message(), "");
    }
}
