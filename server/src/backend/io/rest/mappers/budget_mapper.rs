use shared::{Budget, BudgetListResponse, BudgetProgress, CreateBudgetRequest, UpdateBudgetRequest};

use crate::backend::domain::commands::budgets::{CreateBudgetCommand, UpdateBudgetCommand};
use crate::backend::domain::models::budget::{BudgetProgress as DomainBudgetProgress, BudgetWithProgress};
use crate::backend::error::AppResult;

use super::{date_to_dto, parse_optional_date, timestamp_to_dto};

pub struct BudgetMapper;

impl BudgetMapper {
    pub fn to_create_command(request: CreateBudgetRequest) -> AppResult<CreateBudgetCommand> {
        Ok(CreateBudgetCommand {
            category_id: request.category_id,
            amount: request.amount,
            period: request.period,
            start_date: parse_optional_date("start_date", request.start_date.as_deref())?,
            end_date: parse_optional_date("end_date", request.end_date.as_deref())?,
            alert_threshold: request.alert_threshold,
            notifications_enabled: request.notifications_enabled,
            recurring: request.recurring,
        })
    }

    pub fn to_update_command(request: UpdateBudgetRequest) -> AppResult<UpdateBudgetCommand> {
        Ok(UpdateBudgetCommand {
            amount: request.amount,
            end_date: parse_optional_date("end_date", request.end_date.as_deref())?,
            alert_threshold: request.alert_threshold,
            notifications_enabled: request.notifications_enabled,
            recurring: request.recurring,
        })
    }

    pub fn progress_to_dto(progress: DomainBudgetProgress) -> BudgetProgress {
        BudgetProgress {
            spent: progress.spent,
            remaining: progress.remaining,
            percentage: progress.percentage,
            status: progress.status,
        }
    }

    pub fn to_dto(item: BudgetWithProgress) -> Budget {
        let BudgetWithProgress {
            budget,
            category_name,
            progress,
        } = item;

        Budget {
            id: budget.id,
            category_id: budget.category_id,
            category_name,
            amount: budget.amount,
            period: budget.period,
            start_date: date_to_dto(budget.start_date),
            end_date: date_to_dto(budget.end_date),
            alert_threshold: budget.alert_threshold,
            notifications_enabled: budget.notifications_enabled,
            recurring: budget.recurring,
            progress: Self::progress_to_dto(progress),
            created_at: timestamp_to_dto(budget.created_at),
            updated_at: timestamp_to_dto(budget.updated_at),
        }
    }

    pub fn to_list_response(budgets: Vec<BudgetWithProgress>) -> BudgetListResponse {
        BudgetListResponse {
            budgets: budgets.into_iter().map(Self::to_dto).collect(),
        }
    }
}
