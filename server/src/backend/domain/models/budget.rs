//! Domain model for a budget and its progress calculation.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{BudgetPeriod, BudgetStatus};

use super::round_money;

pub const DEFAULT_ALERT_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub amount: f64,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Percentage (1..=100) at which a warning is raised
    pub alert_threshold: f64,
    pub notifications_enabled: bool,
    /// Renewed for the next period once this one ends
    pub recurring: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }

    pub fn progress(&self, spent: f64) -> BudgetProgress {
        BudgetProgress::calculate(self.amount, spent, self.alert_threshold)
    }

    /// The first period after this budget's end that contains `today`
    pub fn next_period_containing(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let mut start = self.end_date.succ_opt()?;
        let mut end = period_end(self.period, start);
        while end < today {
            start = end.succ_opt()?;
            end = period_end(self.period, start);
        }
        Some((start, end))
    }
}

/// First day of the period containing `date`
pub fn period_start(period: BudgetPeriod, date: NaiveDate) -> NaiveDate {
    match period {
        BudgetPeriod::Weekly => {
            let offset = date.weekday().num_days_from_monday() as u64;
            date.checked_sub_days(Days::new(offset)).unwrap_or(date)
        }
        BudgetPeriod::Monthly => date.with_day(1).unwrap_or(date),
        BudgetPeriod::Yearly => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
    }
}

/// Last day of the period that begins on `start`
pub fn period_end(period: BudgetPeriod, start: NaiveDate) -> NaiveDate {
    let next_start = match period {
        BudgetPeriod::Weekly => start.checked_add_days(Days::new(7)),
        BudgetPeriod::Monthly => start.checked_add_months(Months::new(1)),
        BudgetPeriod::Yearly => start.checked_add_months(Months::new(12)),
    };
    next_start
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetProgress {
    pub spent: f64,
    pub remaining: f64,
    pub percentage: f64,
    pub status: BudgetStatus,
}

impl BudgetProgress {
    pub fn calculate(amount: f64, spent: f64, alert_threshold: f64) -> Self {
        let spent = round_money(spent);
        let percentage = if amount > 0.0 {
            round_money(spent / amount * 100.0)
        } else {
            0.0
        };
        let status = if percentage >= 100.0 {
            BudgetStatus::Exceeded
        } else if percentage >= alert_threshold {
            BudgetStatus::Warning
        } else {
            BudgetStatus::Ok
        };

        Self {
            spent,
            remaining: round_money((amount - spent).max(0.0)),
            percentage,
            status,
        }
    }
}

/// A budget as shown to the user: with its category name and progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetWithProgress {
    pub budget: Budget,
    pub category_name: String,
    pub progress: BudgetProgress,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn budget(period: BudgetPeriod, start: NaiveDate, end: NaiveDate) -> Budget {
        Budget {
            id: "b1".to_string(),
            user_id: "u1".to_string(),
            category_id: "c1".to_string(),
            amount: 1000.0,
            period,
            start_date: start,
            end_date: end,
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            notifications_enabled: true,
            recurring: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_progress_below_threshold() {
        let progress = BudgetProgress::calculate(1000.0, 250.0, 80.0);
        assert_eq!(progress.spent, 250.0);
        assert_eq!(progress.remaining, 750.0);
        assert_eq!(progress.percentage, 25.0);
        assert_eq!(progress.status, BudgetStatus::Ok);
    }

    #[test]
    fn test_progress_at_threshold_is_warning() {
        let progress = BudgetProgress::calculate(1000.0, 800.0, 80.0);
        assert_eq!(progress.percentage, 80.0);
        assert_eq!(progress.status, BudgetStatus::Warning);
    }

    #[test]
    fn test_progress_at_limit_is_exceeded() {
        let progress = BudgetProgress::calculate(1000.0, 1000.0, 80.0);
        assert_eq!(progress.status, BudgetStatus::Exceeded);
        assert_eq!(progress.remaining, 0.0);
    }

    #[test]
    fn test_progress_over_limit_clamps_remaining() {
        let progress = BudgetProgress::calculate(200.0, 250.0, 80.0);
        assert_eq!(progress.percentage, 125.0);
        assert_eq!(progress.remaining, 0.0);
        assert_eq!(progress.status, BudgetStatus::Exceeded);
    }

    #[test]
    fn test_progress_rounds_percentage() {
        let progress = BudgetProgress::calculate(300.0, 100.0, 80.0);
        assert_eq!(progress.percentage, 33.33);
    }

    #[test]
    fn test_progress_zero_amount() {
        let progress = BudgetProgress::calculate(0.0, 0.0, 80.0);
        assert_eq!(progress.percentage, 0.0);
        assert_eq!(progress.status, BudgetStatus::Ok);
    }

    #[test]
    fn test_period_start() {
        // 2025-06-18 is a Wednesday
        let wednesday = date(2025, 6, 18);
        assert_eq!(period_start(BudgetPeriod::Weekly, wednesday), date(2025, 6, 16));
        assert_eq!(period_start(BudgetPeriod::Monthly, wednesday), date(2025, 6, 1));
        assert_eq!(period_start(BudgetPeriod::Yearly, wednesday), date(2025, 1, 1));
    }

    #[test]
    fn test_period_end() {
        assert_eq!(period_end(BudgetPeriod::Weekly, date(2025, 6, 16)), date(2025, 6, 22));
        assert_eq!(period_end(BudgetPeriod::Monthly, date(2025, 2, 1)), date(2025, 2, 28));
        assert_eq!(period_end(BudgetPeriod::Monthly, date(2024, 2, 1)), date(2024, 2, 29));
        assert_eq!(period_end(BudgetPeriod::Monthly, date(2025, 1, 15)), date(2025, 2, 14));
        assert_eq!(period_end(BudgetPeriod::Yearly, date(2025, 1, 1)), date(2025, 12, 31));
    }

    #[test]
    fn test_active_and_overlap() {
        let b = budget(BudgetPeriod::Monthly, date(2025, 6, 1), date(2025, 6, 30));
        assert!(b.is_active_on(date(2025, 6, 1)));
        assert!(b.is_active_on(date(2025, 6, 30)));
        assert!(!b.is_active_on(date(2025, 7, 1)));
        assert!(b.overlaps(date(2025, 6, 30), date(2025, 7, 30)));
        assert!(!b.overlaps(date(2025, 7, 1), date(2025, 7, 31)));
    }

    #[test]
    fn test_next_period_immediately_after() {
        let b = budget(BudgetPeriod::Monthly, date(2025, 5, 1), date(2025, 5, 31));
        let next = b.next_period_containing(date(2025, 6, 1)).unwrap();
        assert_eq!(next, (date(2025, 6, 1), date(2025, 6, 30)));
    }

    #[test]
    fn test_next_period_skips_missed_periods() {
        let b = budget(BudgetPeriod::Weekly, date(2025, 6, 2), date(2025, 6, 8));
        let next = b.next_period_containing(date(2025, 6, 25)).unwrap();
        assert_eq!(next, (date(2025, 6, 23), date(2025, 6, 29)));
    }
}
