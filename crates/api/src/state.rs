//! Shared application state

use std::sync::Arc;

use crate::{
    auth::JwtManager,
    config::Config,
    gate::RequestGate,
    notices::OperatorNotices,
    routing::{BindingCache, BindingStore},
};

/// Operator tokens are issued by the backend login; we only validate them
const OPERATOR_TOKEN_EXPIRY_HOURS: i64 = 12;

/// State shared by every handler and the request gate
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub bindings: Arc<BindingCache>,
    pub gate: Arc<RequestGate>,
    pub notices: Arc<OperatorNotices>,
    pub jwt: JwtManager,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn BindingStore>) -> Self {
        let notices = Arc::new(OperatorNotices::new());
        let bindings = Arc::new(BindingCache::new(store, Arc::clone(&notices)));
        let gate = Arc::new(RequestGate::new(
            Arc::clone(&bindings),
            config.backend_uri.clone(),
            config.operator_themes,
        ));
        let jwt = JwtManager::new(&config.operator_jwt_secret, OPERATOR_TOKEN_EXPIRY_HOURS);

        Self {
            config: Arc::new(config),
            bindings,
            gate,
            notices,
            jwt,
        }
    }
}
