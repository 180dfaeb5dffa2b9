use crate::{config::Config, services::AssessmentService, store::ResponseStore, utils::hash::AdminCredential};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub service: AssessmentService,
    pub config: Config,
    pub admin: AdminCredential,
}

impl FromRef<AppState> for AssessmentService {
    fn from_ref(state: &AppState) -> Self {
        state.service.clone()
    }
}

impl FromRef<AppState> for ResponseStore {
    fn from_ref(state: &AppState) -> Self {
        state.service.finalizer().responses().clone()
    }
}

impl FromRef<AppState> for AdminCredential {
    fn from_ref(state: &AppState) -> Self {
        state.admin.clone()
    }
}
