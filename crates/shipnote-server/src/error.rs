use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shipnote_core::ShipnoteError;

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if let Some(e) = self.0.downcast_ref::<ShipnoteError>() {
            match e {
                ShipnoteError::EventNotFound(_) | ShipnoteError::StatusNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                ShipnoteError::UnknownTemplateKind(_) => StatusCode::BAD_REQUEST,
                ShipnoteError::TemplateUnresolved(_)
                | ShipnoteError::Store(_)
                | ShipnoteError::Io(_)
                | ShipnoteError::Yaml(_)
                | ShipnoteError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_not_found_maps_to_404() {
        let err = AppError(ShipnoteError::EventNotFound(7).into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unknown_template_kind_maps_to_400() {
        let err = AppError(ShipnoteError::UnknownTemplateKind("digest".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_error_maps_to_500() {
        let err = AppError(ShipnoteError::Store("corrupt".into()).into());
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn response_body_is_json_with_error_field() {
        let err = AppError(anyhow::anyhow!("boom"));
        let response = err.into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(ct.to_str().unwrap().contains("application/json"));
    }
}
