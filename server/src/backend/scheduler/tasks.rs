//! The budget commands run by the scheduler and the CLI.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::backend::domain::BudgetService;
use crate::backend::storage::Connection;

use super::ScheduledTask;

pub const CHECK_BUDGET_LIMITS: &str = "budgets:check-limits";
pub const RENEW_RECURRING_BUDGETS: &str = "budgets:renew-recurring";

/// Raise warning and exceeded alerts for active budgets
pub struct CheckBudgetLimits<C: Connection> {
    budget_service: BudgetService<C>,
}

impl<C: Connection> CheckBudgetLimits<C> {
    pub fn new(budget_service: BudgetService<C>) -> Self {
        Self { budget_service }
    }
}

#[async_trait]
impl<C: Connection> ScheduledTask for CheckBudgetLimits<C> {
    fn name(&self) -> &'static str {
        CHECK_BUDGET_LIMITS
    }

    async fn run(&self, today: NaiveDate) -> anyhow::Result<String> {
        let summary = self.budget_service.check_limits(today).await?;
        Ok(format!(
            "Checked {} budgets: {} warnings, {} exceeded",
            summary.checked, summary.warnings, summary.exceeded
        ))
    }
}

/// Create the next period of recurring budgets that have ended
pub struct RenewRecurringBudgets<C: Connection> {
    budget_service: BudgetService<C>,
}

impl<C: Connection> RenewRecurringBudgets<C> {
    pub fn new(budget_service: BudgetService<C>) -> Self {
        Self { budget_service }
    }
}

#[async_trait]
impl<C: Connection> ScheduledTask for RenewRecurringBudgets<C> {
    fn name(&self) -> &'static str {
        RENEW_RECURRING_BUDGETS
    }

    async fn run(&self, today: NaiveDate) -> anyhow::Result<String> {
        let summary = self.budget_service.renew_recurring(today).await?;
        Ok(format!("Renewed {} budgets, skipped {}", summary.renewed, summary.skipped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::backend::cache::CacheStore;
    use crate::backend::domain::NotificationService;
    use crate::backend::notifications::mailer::testing::MemoryMailer;
    use crate::backend::storage::sqlite::test_utils::*;
    use crate::backend::storage::{BudgetStorage, Connection, DbConnection};
    use shared::TransactionType;

    async fn setup() -> (DbConnection, BudgetService<DbConnection>) {
        let db = DbConnection::init_test().await.unwrap();
        let mailer = Arc::new(MemoryMailer::default());
        let notifications = NotificationService::new(&db, mailer, "http://localhost:8080");
        let service = BudgetService::new(&db, CacheStore::new(Duration::from_secs(60)), notifications);
        (db, service)
    }

    #[tokio::test]
    async fn test_check_limits_summary() {
        let (db, service) = setup().await;
        create_test_user(&db, "u1").await.unwrap();
        let food = create_test_category(&db, "u1", "Food", TransactionType::Expense).await.unwrap();
        create_test_budget(&db, &food, 100.0, date(2025, 6, 1)).await.unwrap();
        create_test_transaction(&db, &food, 85.0, date(2025, 6, 10)).await.unwrap();

        let task = CheckBudgetLimits::new(service);
        assert_eq!(task.name(), "budgets:check-limits");
        let summary = task.run(date(2025, 6, 15)).await.unwrap();
        assert_eq!(summary, "Checked 1 budgets: 1 warnings, 0 exceeded");
    }

    #[tokio::test]
    async fn test_renew_recurring_summary() {
        let (db, service) = setup().await;
        create_test_user(&db, "u1").await.unwrap();
        let food = create_test_category(&db, "u1", "Food", TransactionType::Expense).await.unwrap();
        let mut budget = create_test_budget(&db, &food, 100.0, date(2025, 5, 1)).await.unwrap();
        budget.recurring = true;
        db.create_budget_repository().update_budget(&budget).await.unwrap();

        let task = RenewRecurringBudgets::new(service);
        let summary = task.run(date(2025, 6, 1)).await.unwrap();
        assert_eq!(summary, "Renewed 1 budgets, skipped 0");
    }
}
