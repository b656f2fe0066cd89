use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of money flow; also the kind of a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money received
    Income,
    /// Money spent
    Expense,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Income => write!(f, "income"),
            TransactionType::Expense => write!(f, "expense"),
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("Unknown transaction type: {}", other)),
        }
    }
}

/// Length of a budget period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    Monthly,
    Yearly,
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetPeriod::Weekly => write!(f, "weekly"),
            BudgetPeriod::Monthly => write!(f, "monthly"),
            BudgetPeriod::Yearly => write!(f, "yearly"),
        }
    }
}

impl FromStr for BudgetPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(BudgetPeriod::Weekly),
            "monthly" => Ok(BudgetPeriod::Monthly),
            "yearly" => Ok(BudgetPeriod::Yearly),
            other => Err(format!("Unknown budget period: {}", other)),
        }
    }
}

/// How close a budget is to its limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// Below the alert threshold
    Ok,
    /// At or above the alert threshold but below 100%
    Warning,
    /// At or above 100%
    Exceeded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// RFC 3339 timestamp
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterUserResponse {
    pub user: User,
    /// Plain API token; only returned once, the server keeps a digest
    pub api_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub category_type: TransactionType,
    /// Hex color in `#RRGGBB` form
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub category_type: TransactionType,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub category_id: String,
    /// Always the type of the category
    pub transaction_type: TransactionType,
    /// Positive amount, rounded to 2 decimals
    pub amount: f64,
    pub description: Option<String>,
    /// Date in `YYYY-MM-DD` form
    pub date: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub category_id: String,
    pub amount: f64,
    /// Optional description (max 256 characters)
    pub description: Option<String>,
    /// Optional date override (`YYYY-MM-DD`), today if not provided
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UpdateTransactionRequest {
    pub category_id: Option<String>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TransactionListRequest {
    /// Cursor for pagination - transaction ID to start after
    pub after: Option<String>,
    /// Maximum number of transactions to return
    pub limit: Option<u32>,
    /// Inclusive lower date bound (`YYYY-MM-DD`)
    pub start_date: Option<String>,
    /// Inclusive upper date bound (`YYYY-MM-DD`)
    pub end_date: Option<String>,
    pub category_id: Option<String>,
    pub transaction_type: Option<TransactionType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<Transaction>,
    pub pagination: PaginationInfo,
}

/// A budget together with its computed progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub category_id: String,
    pub category_name: String,
    pub amount: f64,
    pub period: BudgetPeriod,
    pub start_date: String,
    pub end_date: String,
    /// Percentage at which a warning is raised
    pub alert_threshold: f64,
    pub notifications_enabled: bool,
    pub recurring: bool,
    pub progress: BudgetProgress,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetProgress {
    pub spent: f64,
    pub remaining: f64,
    pub percentage: f64,
    pub status: BudgetStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBudgetRequest {
    pub category_id: String,
    pub amount: f64,
    pub period: BudgetPeriod,
    /// Defaults to the start of the current period
    pub start_date: Option<String>,
    /// Defaults to the end of the period starting at `start_date`
    pub end_date: Option<String>,
    pub alert_threshold: Option<f64>,
    pub notifications_enabled: Option<bool>,
    pub recurring: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UpdateBudgetRequest {
    pub amount: Option<f64>,
    pub end_date: Option<String>,
    pub alert_threshold: Option<f64>,
    pub notifications_enabled: Option<bool>,
    pub recurring: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetListResponse {
    pub budgets: Vec<Budget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub period_start: String,
    pub period_end: String,
    pub total_income: f64,
    pub total_expense: f64,
    pub net: f64,
    pub active_budgets: usize,
    pub budgets_warning: usize,
    pub budgets_exceeded: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BudgetWarning,
    BudgetExceeded,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::BudgetWarning => "budget_warning",
            NotificationKind::BudgetExceeded => "budget_exceeded",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "budget_warning" => Ok(NotificationKind::BudgetWarning),
            "budget_exceeded" => Ok(NotificationKind::BudgetExceeded),
            other => Err(format!("Unknown notification kind: {}", other)),
        }
    }
}

/// Payload stored by the database notification channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAlertData {
    pub budget_id: String,
    pub category_name: String,
    pub percentage: f64,
    pub spent: f64,
    pub amount: f64,
    /// `warning` or `exceeded`
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub data: BudgetAlertData,
    pub read_at: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<Notification>,
    pub unread_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    pub updated: u32,
}

/// Log levels the browser forwards to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    /// Only errors and warnings leave the browser
    pub fn is_reported(&self) -> bool {
        matches!(self, LogLevel::Error | LogLevel::Warning)
    }
}

/// Browser log entry as POSTed to `/api/log`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    #[serde(default)]
    pub context: serde_json::Value,
    pub url: String,
    /// ISO 8601 timestamp from the browser clock
    pub timestamp: String,
    #[serde(rename = "userAgent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogResponse {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_string_forms_match_serde() {
        for period in [BudgetPeriod::Weekly, BudgetPeriod::Monthly, BudgetPeriod::Yearly] {
            let json = serde_json::to_string(&period).unwrap();
            assert_eq!(json, format!("\"{}\"", period));
            assert_eq!(period.to_string().parse::<BudgetPeriod>().unwrap(), period);
        }
        assert_eq!("expense".parse::<TransactionType>().unwrap(), TransactionType::Expense);
        assert!("refund".parse::<TransactionType>().is_err());
        assert_eq!(
            NotificationKind::BudgetExceeded.as_str().parse::<NotificationKind>().unwrap(),
            NotificationKind::BudgetExceeded
        );
    }

    #[test]
    fn test_log_entry_uses_camel_case_user_agent() {
        let entry = LogEntry {
            level: LogLevel::Warning,
            message: "slow response".to_string(),
            context: serde_json::json!({"ms": 1200}),
            url: "http://localhost:8080/budgets".to_string(),
            timestamp: "2025-06-14T10:00:00.000Z".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["level"], "warning");
        assert_eq!(json["userAgent"], "Mozilla/5.0");
        assert!(json.get("user_agent").is_none());
    }

    #[test]
    fn test_log_entry_context_defaults_to_null() {
        let raw = r#"{"level":"error","message":"boom","url":"/","timestamp":"t","userAgent":"ua"}"#;
        let entry: LogEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.level, LogLevel::Error);
        assert!(entry.context.is_null());
    }

    #[test]
    fn test_only_errors_and_warnings_are_reported() {
        assert!(LogLevel::Error.is_reported());
        assert!(LogLevel::Warning.is_reported());
        assert!(!LogLevel::Info.is_reported());
        assert!(!LogLevel::Debug.is_reported());
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&TransactionType::Expense).unwrap(), "\"expense\"");
        assert_eq!(serde_json::to_string(&BudgetPeriod::Monthly).unwrap(), "\"monthly\"");
        assert_eq!(serde_json::to_string(&BudgetStatus::Exceeded).unwrap(), "\"exceeded\"");
        assert_eq!(
            serde_json::to_string(&NotificationKind::BudgetWarning).unwrap(),
            "\"budget_warning\""
        );
    }
}
