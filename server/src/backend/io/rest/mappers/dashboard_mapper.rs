use shared::DashboardSummary;

use crate::backend::domain::dashboard_service::DashboardSummary as DomainDashboardSummary;

use super::date_to_dto;

pub struct DashboardMapper;

impl DashboardMapper {
    pub fn to_dto(summary: DomainDashboardSummary) -> DashboardSummary {
        DashboardSummary {
            period_start: date_to_dto(summary.period_start),
            period_end: date_to_dto(summary.period_end),
            total_income: summary.total_income,
            total_expense: summary.total_expense,
            net: summary.net,
            active_budgets: summary.active_budgets,
            budgets_warning: summary.budgets_warning,
            budgets_exceeded: summary.budgets_exceeded,
        }
    }
}
