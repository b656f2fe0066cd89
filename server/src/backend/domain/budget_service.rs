//! Budgets, their progress, and the two scheduled budget jobs.

use std::collections::HashMap;

use chrono::{Local, NaiveDate, Utc};
use shared::{BudgetStatus, NotificationKind, TransactionType};
use tracing::{error, info};

use crate::backend::cache::{keys, CacheStore};
use crate::backend::domain::commands::budgets::{
    CreateBudgetCommand, LimitCheckSummary, RenewalSummary, UpdateBudgetCommand,
};
use crate::backend::domain::models::{
    budget::{period_end, period_start, Budget, BudgetProgress, BudgetWithProgress, DEFAULT_ALERT_THRESHOLD},
    round_money,
};
use crate::backend::domain::notification_service::NotificationService;
use crate::backend::domain::observers::{BudgetObserver, ModelObserver};
use crate::backend::error::{AppError, AppResult};
use crate::backend::notifications::{AlertLevel, BudgetAlert};
use crate::backend::storage::{BudgetStorage, CategoryStorage, Connection, TransactionStorage};

#[derive(Clone)]
pub struct BudgetService<C: Connection> {
    budget_repository: C::BudgetRepository,
    category_repository: C::CategoryRepository,
    transaction_repository: C::TransactionRepository,
    notification_service: NotificationService<C>,
    cache: CacheStore,
    observer: BudgetObserver,
}

impl<C: Connection> BudgetService<C> {
    pub fn new(connection: &C, cache: CacheStore, notification_service: NotificationService<C>) -> Self {
        Self {
            budget_repository: connection.create_budget_repository(),
            category_repository: connection.create_category_repository(),
            transaction_repository: connection.create_transaction_repository(),
            notification_service,
            observer: BudgetObserver::new(cache.clone()),
            cache,
        }
    }

    /// All budgets of the user with category names and progress
    pub async fn list_budgets(&self, user_id: &str) -> AppResult<Vec<BudgetWithProgress>> {
        self.cache
            .remember(&keys::user_budgets(user_id), || async {
                let names: HashMap<String, String> = self
                    .category_repository
                    .list_categories(user_id)
                    .await?
                    .into_iter()
                    .map(|c| (c.id, c.name))
                    .collect();

                let mut budgets = Vec::new();
                for budget in self.budget_repository.list_budgets(user_id).await? {
                    let progress = self.compute_progress(&budget).await?;
                    let category_name = names.get(&budget.category_id).cloned().unwrap_or_default();
                    budgets.push(BudgetWithProgress {
                        budget,
                        category_name,
                        progress,
                    });
                }
                Ok::<_, AppError>(budgets)
            })
            .await
    }

    pub async fn get_budget(&self, user_id: &str, budget_id: &str) -> AppResult<BudgetWithProgress> {
        let budget = self.find_budget(user_id, budget_id).await?;
        let progress = self.cached_progress(&budget).await?;
        let category_name = self.category_name(user_id, &budget.category_id).await?;
        Ok(BudgetWithProgress {
            budget,
            category_name,
            progress,
        })
    }

    pub async fn budget_progress(&self, user_id: &str, budget_id: &str) -> AppResult<BudgetProgress> {
        let budget = self.find_budget(user_id, budget_id).await?;
        self.cached_progress(&budget).await
    }

    pub async fn create_budget(&self, user_id: &str, command: CreateBudgetCommand) -> AppResult<BudgetWithProgress> {
        let amount = validate_amount(command.amount)?;
        let alert_threshold = validate_threshold(command.alert_threshold.unwrap_or(DEFAULT_ALERT_THRESHOLD))?;

        let category = self
            .category_repository
            .get_category(user_id, &command.category_id)
            .await?
            .ok_or_else(|| AppError::validation(format!("Unknown category: {}", command.category_id)))?;
        if category.category_type != TransactionType::Expense {
            return Err(AppError::validation("Budgets can only be set for expense categories"));
        }

        let today = Local::now().date_naive();
        let start_date = command
            .start_date
            .unwrap_or_else(|| period_start(command.period, today));
        let end_date = command
            .end_date
            .unwrap_or_else(|| period_end(command.period, start_date));
        if end_date < start_date {
            return Err(AppError::validation("end_date must not be before start_date"));
        }
        self.ensure_no_overlap(user_id, &category.id, start_date, end_date, None)
            .await?;

        let now = Utc::now();
        let budget = Budget {
            id: Budget::generate_id(),
            user_id: user_id.to_string(),
            category_id: category.id,
            amount,
            period: command.period,
            start_date,
            end_date,
            alert_threshold,
            notifications_enabled: command.notifications_enabled.unwrap_or(true),
            recurring: command.recurring.unwrap_or(false),
            created_at: now,
            updated_at: now,
        };
        self.budget_repository.store_budget(&budget).await?;
        self.observer.created(&budget).await;

        info!(target: "app", user_id, budget_id = %budget.id, "Budget created");
        let progress = self.compute_progress(&budget).await?;
        Ok(BudgetWithProgress {
            budget,
            category_name: category.name,
            progress,
        })
    }

    pub async fn update_budget(
        &self,
        user_id: &str,
        budget_id: &str,
        command: UpdateBudgetCommand,
    ) -> AppResult<BudgetWithProgress> {
        let before = self.find_budget(user_id, budget_id).await?;
        let mut after = before.clone();

        if let Some(amount) = command.amount {
            after.amount = validate_amount(amount)?;
        }
        if let Some(threshold) = command.alert_threshold {
            after.alert_threshold = validate_threshold(threshold)?;
        }
        if let Some(end_date) = command.end_date {
            if end_date < after.start_date {
                return Err(AppError::validation("end_date must not be before start_date"));
            }
            after.end_date = end_date;
            self.ensure_no_overlap(user_id, &after.category_id, after.start_date, end_date, Some(budget_id))
                .await?;
        }
        if let Some(enabled) = command.notifications_enabled {
            after.notifications_enabled = enabled;
        }
        if let Some(recurring) = command.recurring {
            after.recurring = recurring;
        }
        after.updated_at = Utc::now();

        self.budget_repository.update_budget(&after).await?;
        self.observer.updated(&before, &after).await;

        let progress = self.compute_progress(&after).await?;
        let category_name = self.category_name(user_id, &after.category_id).await?;
        Ok(BudgetWithProgress {
            budget: after,
            category_name,
            progress,
        })
    }

    pub async fn delete_budget(&self, user_id: &str, budget_id: &str) -> AppResult<()> {
        let budget = self.find_budget(user_id, budget_id).await?;
        self.budget_repository.delete_budget(user_id, budget_id).await?;
        self.observer.deleted(&budget).await;

        info!(target: "app", user_id, budget_id, "Budget deleted");
        Ok(())
    }

    /// Alert on every active budget that crossed its threshold or limit,
    /// at most once per level and budget period
    pub async fn check_limits(&self, today: NaiveDate) -> AppResult<LimitCheckSummary> {
        let mut summary = LimitCheckSummary::default();

        for budget in self.budget_repository.list_active_on(today).await? {
            if !budget.notifications_enabled {
                continue;
            }
            summary.checked += 1;

            match self.check_budget(&budget).await {
                Ok(Some(AlertLevel::Warning)) => summary.warnings += 1,
                Ok(Some(AlertLevel::Exceeded)) => summary.exceeded += 1,
                Ok(None) => {}
                Err(e) => error!(
                    target: "scheduler",
                    budget_id = %budget.id,
                    error = %e,
                    "Budget limit check failed"
                ),
            }
        }

        info!(
            target: "scheduler",
            checked = summary.checked,
            warnings = summary.warnings,
            exceeded = summary.exceeded,
            "Budget limits checked"
        );
        Ok(summary)
    }

    async fn check_budget(&self, budget: &Budget) -> AppResult<Option<AlertLevel>> {
        let progress = self.compute_progress(budget).await?;
        let notifications = &self.notification_service;
        let period = budget.start_date;

        let level = match progress.status {
            BudgetStatus::Exceeded => {
                if notifications
                    .already_sent(&budget.id, NotificationKind::BudgetExceeded, period)
                    .await?
                {
                    None
                } else {
                    Some(AlertLevel::Exceeded)
                }
            }
            BudgetStatus::Warning => {
                let warned = notifications
                    .already_sent(&budget.id, NotificationKind::BudgetWarning, period)
                    .await?;
                let exceeded = notifications
                    .already_sent(&budget.id, NotificationKind::BudgetExceeded, period)
                    .await?;
                (!warned && !exceeded).then_some(AlertLevel::Warning)
            }
            BudgetStatus::Ok => None,
        };

        if let Some(level) = level {
            let alert = BudgetAlert {
                level,
                budget_id: budget.id.clone(),
                category_name: self.category_name(&budget.user_id, &budget.category_id).await?,
                percentage: progress.percentage,
                spent: progress.spent,
                amount: budget.amount,
            };
            notifications.deliver(&budget.user_id, &alert, period).await?;
        }
        Ok(level)
    }

    /// Hand every ended recurring budget over to a budget for the period
    /// containing `today`
    pub async fn renew_recurring(&self, today: NaiveDate) -> AppResult<RenewalSummary> {
        let mut summary = RenewalSummary::default();

        for budget in self.budget_repository.list_expired_recurring(today).await? {
            match self.renew_budget(&budget, today).await {
                Ok(true) => summary.renewed += 1,
                Ok(false) => summary.skipped += 1,
                Err(e) => {
                    summary.skipped += 1;
                    error!(target: "scheduler", budget_id = %budget.id, error = %e, "Budget renewal failed");
                }
            }
        }

        info!(
            target: "scheduler",
            renewed = summary.renewed,
            skipped = summary.skipped,
            "Recurring budgets renewed"
        );
        Ok(summary)
    }

    /// Returns false when an existing budget already covers the new period
    async fn renew_budget(&self, budget: &Budget, today: NaiveDate) -> AppResult<bool> {
        let (start_date, end_date) = budget
            .next_period_containing(today)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("No next period for budget {}", budget.id)))?;

        let overlapping = self
            .budget_repository
            .find_overlapping(&budget.user_id, &budget.category_id, start_date, end_date, Some(&budget.id))
            .await?;

        let mut handed_over = budget.clone();
        handed_over.recurring = false;
        handed_over.updated_at = Utc::now();

        if !overlapping.is_empty() {
            // The existing budget takes over the category; stop renewing this one
            self.budget_repository.update_budget(&handed_over).await?;
            self.observer.updated(budget, &handed_over).await;
            info!(
                target: "scheduler",
                budget_id = %budget.id,
                %start_date,
                %end_date,
                "Renewal skipped, period already budgeted"
            );
            return Ok(false);
        }

        let now = Utc::now();
        let renewed = Budget {
            id: Budget::generate_id(),
            start_date,
            end_date,
            recurring: true,
            created_at: now,
            updated_at: now,
            ..budget.clone()
        };
        self.budget_repository.store_budget(&renewed).await?;
        self.observer.created(&renewed).await;

        self.budget_repository.update_budget(&handed_over).await?;
        self.observer.updated(budget, &handed_over).await;

        info!(
            target: "scheduler",
            budget_id = %budget.id,
            renewed_id = %renewed.id,
            %start_date,
            %end_date,
            "Budget renewed"
        );
        Ok(true)
    }

    async fn find_budget(&self, user_id: &str, budget_id: &str) -> AppResult<Budget> {
        self.budget_repository
            .get_budget(user_id, budget_id)
            .await?
            .ok_or_else(|| AppError::not_found("Budget", budget_id))
    }

    async fn compute_progress(&self, budget: &Budget) -> AppResult<BudgetProgress> {
        let spent = self
            .transaction_repository
            .sum_amount(
                &budget.user_id,
                Some(&budget.category_id),
                TransactionType::Expense,
                budget.start_date,
                budget.end_date,
            )
            .await?;
        Ok(budget.progress(round_money(spent)))
    }

    async fn cached_progress(&self, budget: &Budget) -> AppResult<BudgetProgress> {
        self.cache
            .remember(&keys::budget_progress(&budget.id), || self.compute_progress(budget))
            .await
    }

    async fn category_name(&self, user_id: &str, category_id: &str) -> AppResult<String> {
        Ok(self
            .category_repository
            .get_category(user_id, category_id)
            .await?
            .map(|c| c.name)
            .unwrap_or_default())
    }

    async fn ensure_no_overlap(
        &self,
        user_id: &str,
        category_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<&str>,
    ) -> AppResult<()> {
        let overlapping = self
            .budget_repository
            .find_overlapping(user_id, category_id, start, end, exclude_id)
            .await?;
        if !overlapping.is_empty() {
            return Err(AppError::conflict(
                "Another budget for this category overlaps the date range",
            ));
        }
        Ok(())
    }
}

fn validate_amount(amount: f64) -> AppResult<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::validation("Budget amount must be a positive number"));
    }
    Ok(round_money(amount))
}

fn validate_threshold(threshold: f64) -> AppResult<f64> {
    if !threshold.is_finite() || !(1.0..=100.0).contains(&threshold) {
        return Err(AppError::validation("Alert threshold must be between 1 and 100"));
    }
    Ok(threshold)
}
