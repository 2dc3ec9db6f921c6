pub mod cards;
pub mod menu;

use axum::{http::StatusCode, Json};
use serde::Serialize;
use std::sync::MutexGuard;

use crate::{app_state::AppState, wallet::{CardStore, WalletError}};

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub status: String,
    pub reason: String,
}

pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

fn error_response(status: StatusCode, reason: &str) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            status: "ERROR".to_string(),
            reason: reason.to_string(),
        })
    )
}

fn wallet_error(err: WalletError) -> (StatusCode, Json<ApiError>) {
    let status = match err {
        WalletError::Validation { .. } => StatusCode::BAD_REQUEST,
        WalletError::NotFound(_) | WalletError::NoCurrentCard | WalletError::NoActionMenu => {
            StatusCode::NOT_FOUND
        }
        WalletError::CorruptData(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, &err.to_string())
}

fn lock_store(state: &AppState) -> ApiResult<MutexGuard<'_, CardStore>> {
    state.store.lock().map_err(|_| {
        tracing::error!("Card store lock poisoned");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Card store unavailable")
    })
}
