//! Domain-level command and query types.
//! The REST layer maps the `shared` DTOs to these (parsing dates on the way)
//! so services only deal with typed values.

pub mod users {
    use crate::backend::domain::models::user::User;

    #[derive(Debug, Clone)]
    pub struct RegisterUserCommand {
        pub name: String,
        pub email: String,
    }

    /// The plain API token is only available here, right after registration
    #[derive(Debug, Clone)]
    pub struct RegisteredUser {
        pub user: User,
        pub api_token: String,
    }
}

pub mod categories {
    use shared::TransactionType;

    #[derive(Debug, Clone)]
    pub struct CreateCategoryCommand {
        pub name: String,
        pub category_type: TransactionType,
        pub color: Option<String>,
        pub icon: Option<String>,
    }

    /// The category type cannot change once transactions may reference it
    #[derive(Debug, Clone, Default)]
    pub struct UpdateCategoryCommand {
        pub name: Option<String>,
        pub color: Option<String>,
        pub icon: Option<String>,
    }
}

pub mod transactions {
    use chrono::NaiveDate;
    use shared::TransactionType;

    use crate::backend::domain::models::transaction::Transaction;

    #[derive(Debug, Clone)]
    pub struct CreateTransactionCommand {
        pub category_id: String,
        pub amount: f64,
        pub description: Option<String>,
        /// Defaults to today
        pub date: Option<NaiveDate>,
    }

    #[derive(Debug, Clone, Default)]
    pub struct UpdateTransactionCommand {
        pub category_id: Option<String>,
        pub amount: Option<f64>,
        pub description: Option<String>,
        pub date: Option<NaiveDate>,
    }

    #[derive(Debug, Clone, Default)]
    pub struct TransactionListQuery {
        pub after: Option<String>,
        pub limit: Option<u32>,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
        pub category_id: Option<String>,
        pub transaction_type: Option<TransactionType>,
    }

    #[derive(Debug, Clone)]
    pub struct TransactionListResult {
        pub transactions: Vec<Transaction>,
        pub has_more: bool,
        pub next_cursor: Option<String>,
    }
}

pub mod budgets {
    use chrono::NaiveDate;
    use shared::BudgetPeriod;

    #[derive(Debug, Clone)]
    pub struct CreateBudgetCommand {
        pub category_id: String,
        pub amount: f64,
        pub period: BudgetPeriod,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
        pub alert_threshold: Option<f64>,
        pub notifications_enabled: Option<bool>,
        pub recurring: Option<bool>,
    }

    #[derive(Debug, Clone, Default)]
    pub struct UpdateBudgetCommand {
        pub amount: Option<f64>,
        pub end_date: Option<NaiveDate>,
        pub alert_threshold: Option<f64>,
        pub notifications_enabled: Option<bool>,
        pub recurring: Option<bool>,
    }

    /// Outcome of one `budgets:check-limits` run
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct LimitCheckSummary {
        pub checked: usize,
        pub warnings: usize,
        pub exceeded: usize,
    }

    /// Outcome of one `budgets:renew-recurring` run
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct RenewalSummary {
        pub renewed: usize,
        pub skipped: usize,
    }
}

pub mod exports {
    /// A generated spreadsheet ready to be downloaded
    #[derive(Debug, Clone)]
    pub struct ExportFile {
        pub filename: String,
        pub content_type: &'static str,
        pub content: Vec<u8>,
    }
}
