// src/lib.rs

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;

use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    error::AppError,
    services::{AssessmentService, Finalizer, sink::{ResponseSink, WebhookSink}},
    state::AppState,
    store::{QuestionStore, ResponseStore, SessionStore},
    utils::hash::AdminCredential,
};

// Re-export specific items for convenience if needed
pub use routes::create_router;

/// Wires stores, finalizer and credential together from `config`.
///
/// The response store is opened on `config.database_url`; the question bank
/// never fails to open (it degrades to empty).
pub async fn build_state(config: Config) -> Result<AppState, AppError> {
    let questions = QuestionStore::open(&config.questions_file, &config.active_set_file).await;
    let responses = ResponseStore::connect(&config.database_url).await?;

    let sink: Option<Arc<dyn ResponseSink>> = match &config.sink_url {
        Some(url) => {
            tracing::info!("Forwarding responses to {}", url);
            Some(Arc::new(WebhookSink::new(
                url.clone(),
                Duration::from_secs(config.sink_timeout_secs),
            )?))
        }
        None => None,
    };

    let admin = AdminCredential::new(config.admin_password.as_deref())?;
    if !admin.is_configured() {
        tracing::warn!("ADMIN_PASSWORD is not set; the admin API is locked");
    }

    let service = AssessmentService::new(
        questions,
        SessionStore::new(),
        Finalizer::new(responses, sink),
    );

    Ok(AppState {
        service,
        config,
        admin,
    })
}
