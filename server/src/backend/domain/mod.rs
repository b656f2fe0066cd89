//! # Domain Module
//!
//! Business rules of the finance tracker: categories, transactions, budgets
//! with their progress, budget alerts, the dashboard and spreadsheet exports.
//!
//! Services are generic over the storage [`Connection`](crate::backend::storage::Connection)
//! and return [`AppResult`](crate::backend::error::AppResult). After every
//! successful write they run the model's observer, which invalidates cache
//! keys.
//!
//! ## Business Rules
//!
//! - A transaction always has the type of its category
//! - Budgets exist only for expense categories and never overlap per category
//! - Categories still referenced by transactions or budgets cannot be deleted
//! - A budget alert is sent at most once per level and budget period

pub mod budget_service;
pub mod category_service;
pub mod commands;
pub mod dashboard_service;
pub mod export_service;
pub mod models;
pub mod notification_service;
pub mod observers;
pub mod transaction_service;
pub mod user_service;

pub use budget_service::BudgetService;
pub use category_service::CategoryService;
pub use dashboard_service::DashboardService;
pub use export_service::ExportService;
pub use notification_service::NotificationService;
pub use transaction_service::TransactionService;
pub use user_service::UserService;
