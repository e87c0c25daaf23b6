//! Click redirect gateway.
//!
//! Serves `GET {api_prefix}/w/redirect`: validates the click parameters,
//! normalizes them against the active session template, registers the click
//! with the session service and answers with a 302 to the messaging
//! destination. Probes are served on a separate admin listener.

pub mod config;
pub mod destination;
pub mod errors;
pub mod metrics_defs;
pub mod params;
pub mod service;
pub mod session;

use crate::errors::RedirectError;
use crate::service::RedirectService;
use attribution::config::get_store;
use attribution::{Normalizer, TemplateAccessor};
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub async fn run(config: config::Config) -> Result<(), RedirectError> {
    config.validate()?;

    let store = get_store(&config.template_store)?;
    let templates = Arc::new(TemplateAccessor::new(store));

    // Resolve the template once up front so the first click does not pay for it
    let template = templates.get_active_template().await;
    tracing::info!(template_id = %template.id, "Active template loaded");

    let redirect_service = RedirectService::new(&config, Normalizer::new(templates))?;

    let ready = Arc::new(AtomicBool::new(false));
    let is_ready = ready.clone();
    let admin_service: AdminService<_, RedirectError> =
        AdminService::new(move || is_ready.load(Ordering::Relaxed));

    let redirect_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        redirect_service,
    );
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    ready.store(true, Ordering::Relaxed);
    tokio::try_join!(redirect_task, admin_task)?;
    Ok(())
}
