use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{BudgetPeriod, BudgetStatus, TransactionType};

use crate::backend::cache::{keys, CacheStore};
use crate::backend::domain::budget_service::BudgetService;
use crate::backend::domain::models::{
    budget::{period_end, period_start},
    round_money,
};
use crate::backend::error::AppResult;
use crate::backend::storage::{Connection, TransactionStorage};

/// Totals for the month containing the requested day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Day the summary was computed for; a cached summary of another day is stale
    pub computed_for: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_income: f64,
    pub total_expense: f64,
    pub net: f64,
    pub active_budgets: usize,
    pub budgets_warning: usize,
    pub budgets_exceeded: usize,
}

#[derive(Clone)]
pub struct DashboardService<C: Connection> {
    transaction_repository: C::TransactionRepository,
    budget_service: BudgetService<C>,
    cache: CacheStore,
}

impl<C: Connection> DashboardService<C> {
    pub fn new(connection: &C, cache: CacheStore, budget_service: BudgetService<C>) -> Self {
        Self {
            transaction_repository: connection.create_transaction_repository(),
            budget_service,
            cache,
        }
    }

    pub async fn summary(&self, user_id: &str, today: NaiveDate) -> AppResult<DashboardSummary> {
        let key = keys::user_dashboard(user_id);
        if let Some(cached) = self.cache.get::<DashboardSummary>(&key) {
            if cached.computed_for == today {
                return Ok(cached);
            }
        }

        let summary = self.compute(user_id, today).await?;
        self.cache.put(&key, &summary);
        Ok(summary)
    }

    async fn compute(&self, user_id: &str, today: NaiveDate) -> AppResult<DashboardSummary> {
        let start = period_start(BudgetPeriod::Monthly, today);
        let end = period_end(BudgetPeriod::Monthly, start);

        let total_income = self
            .transaction_repository
            .sum_amount(user_id, None, TransactionType::Income, start, end)
            .await?;
        let total_expense = self
            .transaction_repository
            .sum_amount(user_id, None, TransactionType::Expense, start, end)
            .await?;

        let active: Vec<_> = self
            .budget_service
            .list_budgets(user_id)
            .await?
            .into_iter()
            .filter(|b| b.budget.is_active_on(today))
            .collect();
        let count = |status: BudgetStatus| active.iter().filter(|b| b.progress.status == status).count();

        Ok(DashboardSummary {
            computed_for: today,
            period_start: start,
            period_end: end,
            total_income: round_money(total_income),
            total_expense: round_money(total_expense),
            net: round_money(total_income - total_expense),
            active_budgets: active.len(),
            budgets_warning: count(BudgetStatus::Warning),
            budgets_exceeded: count(BudgetStatus::Exceeded),
        })
    }
}
