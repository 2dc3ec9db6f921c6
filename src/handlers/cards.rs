use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    app_state::AppState,
    handlers::{ApiResult, error_response, lock_store, wallet_error},
    qr::render_or_fallback,
    wallet::{CardRecord, FlipOutcome, PALETTE, PaletteColor, bank_color},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    pub number: String,
    pub expiry: String,
    pub cvv: String,
    pub color: Option<String>,
    pub make_primary: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletView {
    pub cards: Vec<CardRecord>,
    pub current_card_id: Option<String>,
    pub current_action_card_id: Option<String>,
    pub flipped: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct QrResponse {
    pub payload: String,
    pub fallback: bool,
    pub rows: Vec<String>,
}

fn ok() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "OK".to_string(),
    })
}

/// GET /api/cards
pub async fn list_cards(State(state): State<AppState>) -> ApiResult<Json<WalletView>> {
    let store = lock_store(&state)?;

    Ok(Json(WalletView {
        cards: store.cards().to_vec(),
        current_card_id: store.current_card_id().map(str::to_string),
        current_action_card_id: store.current_action_card_id().map(str::to_string),
        flipped: store.is_flipped(),
    }))
}

/// POST /api/cards
/// Adds a card from raw form input; the raw fields are dropped after tokenization
pub async fn create_card(
    State(state): State<AppState>,
    Json(req): Json<CreateCardRequest>,
) -> ApiResult<(StatusCode, Json<CardRecord>)> {
    let color = req
        .color
        .clone()
        .unwrap_or_else(|| bank_color(req.number.trim_start()).to_string());

    let mut store = lock_store(&state)?;
    let card = store
        .create(
            &req.number,
            &req.expiry,
            &req.cvv,
            &color,
            req.make_primary.unwrap_or(false),
        )
        .map_err(wallet_error)?;

    Ok((StatusCode::CREATED, Json(card)))
}

/// GET /api/cards/current
pub async fn current_card(State(state): State<AppState>) -> ApiResult<Json<CardRecord>> {
    let store = lock_store(&state)?;
    store
        .current_card()
        .cloned()
        .map(Json)
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "No card selected"))
}

/// POST /api/cards/{id}/select
pub async fn select_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    lock_store(&state)?.select(&id).map_err(wallet_error)?;
    Ok(ok())
}

/// POST /api/cards/{id}/primary
pub async fn set_primary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    lock_store(&state)?.set_primary(&id).map_err(wallet_error)?;
    Ok(ok())
}

/// DELETE /api/cards/{id}/primary
pub async fn remove_primary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    lock_store(&state)?.remove_primary(&id).map_err(wallet_error)?;
    Ok(ok())
}

/// DELETE /api/cards/{id}
pub async fn delete_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    lock_store(&state)?.delete(&id).map_err(wallet_error)?;
    Ok(ok())
}

/// POST /api/cards/flip
pub async fn flip_card(State(state): State<AppState>) -> ApiResult<Json<FlipOutcome>> {
    let outcome = lock_store(&state)?.toggle_flip().map_err(wallet_error)?;
    Ok(Json(outcome))
}

/// GET /api/cards/{id}/qr
/// Fresh payload for the back of a card, drawn with the fallback pattern when
/// no renderer is configured
pub async fn card_qr(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<QrResponse>> {
    let payload = lock_store(&state)?.qr_payload(&id).map_err(wallet_error)?;
    let encoded = payload.encode().map_err(|e| {
        tracing::error!("Failed to encode QR payload: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "QR payload unavailable")
    })?;
    let image = render_or_fallback(state.qr_renderer.as_deref(), &encoded);

    Ok(Json(QrResponse {
        payload: encoded,
        fallback: image.fallback,
        rows: image.to_rows(),
    }))
}

/// GET /api/palette
pub async fn palette() -> Json<&'static [PaletteColor]> {
    Json(&PALETTE[..])
}
