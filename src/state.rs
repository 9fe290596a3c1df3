use std::sync::Arc;

use crate::store::CommissionStore;

pub struct AppState<S> {
    pub store: Arc<S>,
    pub jwt_secret: Arc<str>,
}

impl<S: CommissionStore> AppState<S> {
    pub fn new(store: S, jwt_secret: &str) -> Self {
        Self {
            store: Arc::new(store),
            jwt_secret: Arc::from(jwt_secret),
        }
    }
}

// Manual impl: the store itself need not be `Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            jwt_secret: Arc::clone(&self.jwt_secret),
        }
    }
}
