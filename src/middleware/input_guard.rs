//! Input sanitation filter for the URL surface.
//!
//! Responsibility:
//! - Scan every decoded query value and every path parameter value against
//!   the attack signatures before any handler runs.
//! - Reject on the first match with 400, naming the parameter key only.
//!
//! Request bodies are NOT scanned here; handlers validate their DTOs.

use std::sync::Arc;

use axum::{
    Router,
    extract::{RawPathParams, Request, State, rejection::RawPathParamsRejection},
    middleware::{self, Next},
    response::Response,
};

use crate::error::{AppError, ParamLocation};
use crate::services::security::AttackSignatures;

/// Apply the filter to every matched route of `router`.
///
/// Apply it last so it wraps the auth gates and runs before them.
pub fn apply<S>(router: Router<S>, signatures: Arc<AttackSignatures>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(signatures, input_guard))
}

async fn input_guard(
    State(signatures): State<Arc<AttackSignatures>>,
    path_params: Result<RawPathParams, RawPathParamsRejection>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path_params = match &path_params {
        Ok(params) => params.iter().collect::<Vec<_>>(),
        Err(RawPathParamsRejection::InvalidUtf8InPathParam(_)) => {
            return Err(AppError::bad_request(
                "INVALID_INPUT",
                "invalid utf-8 in path parameter",
            ));
        }
        // route without parameters
        Err(_) => Vec::new(),
    };

    inspect(&signatures, req.uri().query(), path_params)?;

    Ok(next.run(req).await)
}

/// Pure inspection step, separated from the HTTP plumbing.
pub fn inspect<'a>(
    signatures: &AttackSignatures,
    query: Option<&str>,
    path_params: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<(), AppError> {
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if let Some(category) = signatures.classify(&value) {
                tracing::warn!(param = %key, ?category, "suspicious query parameter rejected");
                return Err(AppError::invalid_input(ParamLocation::Query, key));
            }
        }
    }

    for (key, value) in path_params {
        if let Some(category) = signatures.classify(value) {
            tracing::warn!(param = %key, ?category, "suspicious path parameter rejected");
            return Err(AppError::invalid_input(ParamLocation::Path, key));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get};
    use http_body_util::BodyExt;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn sigs() -> Arc<AttackSignatures> {
        Arc::new(AttackSignatures::new().unwrap())
    }

    fn app(reached: Arc<AtomicBool>) -> Router {
        let router = Router::new()
            .route(
                "/resource",
                get({
                    let reached = reached.clone();
                    move || async move {
                        reached.store(true, Ordering::SeqCst);
                        "ok"
                    }
                }),
            )
            .route(
                "/users/{id}",
                get(move || async move {
                    reached.store(true, Ordering::SeqCst);
                    "ok"
                }),
            );
        apply(router, sigs())
    }

    async fn get_status(uri: &str) -> (StatusCode, serde_json::Value, bool) {
        let reached = Arc::new(AtomicBool::new(false));
        let res = app(reached.clone())
            .oneshot(
                axum::http::Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body, reached.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn bobby_tables_never_reaches_handler() {
        let (status, body, reached) =
            get_status("/resource?name=Robert%27%29%3B%20DROP%20TABLE%20students%3B--").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
        assert_eq!(
            body["error"]["message"],
            "invalid input detected in query parameter: name"
        );
        assert!(!body["error"]["message"].as_str().unwrap().contains("DROP"));
        assert!(!reached);
    }

    #[tokio::test]
    async fn suspicious_path_parameter_is_rejected() {
        let (status, body, reached) = get_status("/users/1%20OR%201%3D1").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "invalid input detected in path parameter: id"
        );
        assert!(!reached);
    }

    #[tokio::test]
    async fn ordinary_values_pass() {
        let (status, _, reached) = get_status("/resource?name=alice&age=42&since=2024-01-01").await;
        assert_eq!(status, StatusCode::OK);
        assert!(reached);

        let (status, _, reached) = get_status("/users/42").await;
        assert_eq!(status, StatusCode::OK);
        assert!(reached);
    }

    #[test]
    fn inspect_rejects_listed_query_values() {
        let sigs = sigs();
        for raw in [
            "q=1%27%20OR%20%271%27%3D%271",
            "q=%3Cscript%3Ealert(1)%3C%2Fscript%3E",
            "q=1%3B%20DROP%20TABLE%20users%3B--",
            "q=1%22%20OR%20%22%22%3D%22",
        ] {
            let err = inspect(&sigs, Some(raw), Vec::<(&str, &str)>::new()).unwrap_err();
            assert!(
                matches!(&err, AppError::InvalidInput { location: ParamLocation::Query, param } if param == "q"),
                "{raw}: {err:?}"
            );
        }
    }

    #[test]
    fn inspect_checks_every_value() {
        let err = inspect(&sigs(), Some("a=ok&b=fine&c=x--"), Vec::<(&str, &str)>::new()).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { param, .. } if param == "c"));
    }
}
