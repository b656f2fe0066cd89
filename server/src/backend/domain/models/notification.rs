use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{BudgetAlertData, NotificationKind};

/// A notification stored by the database channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub budget_id: String,
    /// Start of the budget period the alert was raised for
    pub period_start: NaiveDate,
    pub data: BudgetAlertData,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}
