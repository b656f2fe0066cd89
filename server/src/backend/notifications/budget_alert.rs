use serde::{Deserialize, Serialize};
use shared::{BudgetAlertData, NotificationKind};

use super::mailer::MailMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Exceeded,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Warning => "warning",
            AlertLevel::Exceeded => "exceeded",
        }
    }

    pub fn kind(&self) -> NotificationKind {
        match self {
            AlertLevel::Warning => NotificationKind::BudgetWarning,
            AlertLevel::Exceeded => NotificationKind::BudgetExceeded,
        }
    }
}

/// A budget crossed its alert threshold or its limit
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetAlert {
    pub level: AlertLevel,
    pub budget_id: String,
    pub category_name: String,
    pub percentage: f64,
    pub spent: f64,
    pub amount: f64,
}

impl BudgetAlert {
    pub fn kind(&self) -> NotificationKind {
        self.level.kind()
    }

    pub fn subject(&self) -> String {
        match self.level {
            AlertLevel::Warning => format!("Попередження про бюджет: {}", self.category_name),
            AlertLevel::Exceeded => format!("Бюджет перевищено: {}", self.category_name),
        }
    }

    pub fn body(&self, user_name: &str, app_url: &str) -> String {
        let headline = match self.level {
            AlertLevel::Warning => format!(
                "Ви використали {:.2}% бюджету категорії «{}».",
                self.percentage, self.category_name
            ),
            AlertLevel::Exceeded => format!(
                "Бюджет категорії «{}» перевищено: використано {:.2}%.",
                self.category_name, self.percentage
            ),
        };

        format!(
            "Вітаємо, {}!\n\n{}\nВитрачено: {:.2} з {:.2}.\n\nПереглянути бюджет: {}/budgets/{}\n\nFinance Tracker",
            user_name,
            headline,
            self.spent,
            self.amount,
            app_url.trim_end_matches('/'),
            self.budget_id
        )
    }

    pub fn to_mail(&self, to: &str, user_name: &str, app_url: &str) -> MailMessage {
        MailMessage {
            to: to.to_string(),
            subject: self.subject(),
            body: self.body(user_name, app_url),
        }
    }

    /// Payload of the database channel
    pub fn to_data(&self) -> BudgetAlertData {
        BudgetAlertData {
            budget_id: self.budget_id.clone(),
            category_name: self.category_name.clone(),
            percentage: self.percentage,
            spent: self.spent,
            amount: self.amount,
            level: self.level.as_str().to_string(),
        }
    }
}
