use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::{
    app_state::AppState,
    handlers::{ApiResult, cards::StatusResponse, lock_store, wallet_error},
    wallet::{ActionMenu, MenuAction},
};

#[derive(Debug, Deserialize)]
pub struct MenuActionRequest {
    pub action: MenuAction,
}

/// POST /api/menu/{id}
/// Opens the action menu for a card (long press in the UI)
pub async fn open_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionMenu>> {
    let menu = lock_store(&state)?.open_action_menu(&id).map_err(wallet_error)?;
    Ok(Json(menu))
}

/// DELETE /api/menu
pub async fn close_menu(State(state): State<AppState>) -> ApiResult<Json<StatusResponse>> {
    lock_store(&state)?.close_action_menu();
    Ok(Json(StatusResponse {
        status: "OK".to_string(),
    }))
}

/// POST /api/menu/action
/// Applies a menu action to the card the open menu targets
pub async fn apply_action(
    State(state): State<AppState>,
    Json(req): Json<MenuActionRequest>,
) -> ApiResult<Json<StatusResponse>> {
    lock_store(&state)?
        .apply_menu_action(req.action)
        .map_err(wallet_error)?;

    Ok(Json(StatusResponse {
        status: "OK".to_string(),
    }))
}
