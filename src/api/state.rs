use std::sync::Arc;

use crate::service::Valuator;

#[derive(Clone)]
pub struct AppState {
    pub valuator: Arc<Valuator>,
}
