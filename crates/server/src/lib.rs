use api_types::ErrorBody;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod accounts;
mod entries;
mod server;
mod transfers;
mod views;

/// Error returned by every handler, rendered as `{"error": ...}`.
pub enum ServerError {
    Engine(EngineError),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) | EngineError::CurrencyMismatch(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Concurrency(_) | EngineError::DeadlineExceeded(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        EngineError::Commit(_) | EngineError::RolledBack { .. } | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Commit(_) | EngineError::RolledBack { .. } | EngineError::Database(_) => {
            tracing::error!("database error: {err}");
            "internal server error".to_string()
        }
        EngineError::Concurrency(db_err) => {
            tracing::warn!("transient database error: {db_err}");
            "ledger busy, retry later".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let ServerError::Engine(err) = self;
        let (status, error) = (status_for_engine_error(&err), message_for_engine_error(err));

        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sea_orm::DbErr;

    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::Validation("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn engine_currency_mismatch_maps_to_422() {
        let res =
            ServerError::from(EngineError::CurrencyMismatch("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn transient_errors_map_to_503() {
        let res = ServerError::from(EngineError::DeadlineExceeded(Duration::from_secs(1)))
            .into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

        let res = ServerError::from(EngineError::Concurrency(DbErr::Custom("busy".to_string())))
            .into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn storage_errors_map_to_500_and_hide_details() {
        let err = EngineError::Database(DbErr::Custom("secret table".to_string()));
        assert_eq!(status_for_engine_error(&err), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message_for_engine_error(err), "internal server error");

        let err = EngineError::Commit(DbErr::Custom("disk full".to_string()));
        assert_eq!(status_for_engine_error(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn error_body_carries_the_engine_message() {
        use http_body_util::BodyExt;

        let res = ServerError::from(EngineError::KeyNotFound("account 3".to_string())).into_response();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "\"account 3\" key not found!");
    }
}
