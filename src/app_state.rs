use std::sync::{Arc, Mutex};
use crate::{qr::QrRenderer, wallet::CardStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<CardStore>>,
    pub qr_renderer: Option<Arc<dyn QrRenderer>>,
}
