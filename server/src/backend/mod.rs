//! # Backend Module
//!
//! Everything behind the HTTP surface of the finance tracker.
//!
//! ```text
//! IO layer (REST handlers, request context, auth)
//!     ↓
//! Domain layer (services, observers, cache)
//!     ↓
//! Storage layer (SQLite repositories)
//! ```
//!
//! Notifications and the scheduler sit beside the domain layer: the budget
//! service raises alerts through the notification service, and the scheduler
//! drives the daily budget commands.

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod notifications;
pub mod reporting;
pub mod scheduler;
pub mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    middleware, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::backend::cache::CacheStore;
use crate::backend::config::Config;
use crate::backend::domain::{
    BudgetService, CategoryService, DashboardService, ExportService, NotificationService, TransactionService,
    UserService,
};
use crate::backend::notifications::{mailer_from_config, Mailer};
use crate::backend::scheduler::{CheckBudgetLimits, RenewRecurringBudgets, Scheduler};
use crate::backend::storage::DbConnection;

/// Services shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DbConnection,
    pub user_service: UserService<DbConnection>,
    pub category_service: CategoryService<DbConnection>,
    pub transaction_service: TransactionService<DbConnection>,
    pub budget_service: BudgetService<DbConnection>,
    pub dashboard_service: DashboardService<DbConnection>,
    pub notification_service: NotificationService<DbConnection>,
    pub export_service: ExportService<DbConnection>,
}

impl AppState {
    pub fn new(config: Config, db: DbConnection, mailer: Arc<dyn Mailer>) -> Self {
        let cache = CacheStore::new(config.cache_ttl);
        let notification_service = NotificationService::new(&db, mailer, config.app_url.clone());
        let budget_service = BudgetService::new(&db, cache.clone(), notification_service.clone());

        Self {
            user_service: UserService::new(&db),
            category_service: CategoryService::new(&db, cache.clone()),
            transaction_service: TransactionService::new(&db, cache.clone()),
            dashboard_service: DashboardService::new(&db, cache, budget_service.clone()),
            export_service: ExportService::new(&db, budget_service.clone()),
            budget_service,
            notification_service,
            config: Arc::new(config),
            db,
        }
    }

    /// The daily budget commands at their configured times
    pub fn scheduler(&self) -> Scheduler<DbConnection> {
        Scheduler::new(&self.db, self.config.node_id.clone())
            .daily_at(
                Arc::new(CheckBudgetLimits::new(self.budget_service.clone())),
                self.config.budget_check_at,
            )
            .daily_at(
                Arc::new(RenewRecurringBudgets::new(self.budget_service.clone())),
                self.config.budget_renew_at,
            )
    }
}

/// Open the database and build the application state
pub async fn initialize_backend(config: Config) -> Result<AppState> {
    info!(target: "app", "Setting up database");
    let db = DbConnection::new(&config.database_url).await?;

    let mailer = mailer_from_config(&config)?;

    info!(target: "app", "Setting up application state");
    Ok(AppState::new(config, db, mailer))
}

/// The Axum router with every route and layer configured
pub fn create_router(app_state: AppState) -> Result<Router> {
    let origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS_ORIGIN: {}", app_state.config.cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    Ok(Router::new()
        .nest("/api", io::rest::api_router())
        .layer(middleware::from_fn(io::rest::request_context::capture_request_context))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state))
}
