//! Export service domain logic.
//!
//! Spreadsheets are written as CSV with a UTF-8 byte order mark so
//! spreadsheet applications pick up the Ukrainian headings correctly.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use shared::{BudgetPeriod, TransactionType};
use tracing::info;

use crate::backend::domain::budget_service::BudgetService;
use crate::backend::domain::commands::exports::ExportFile;
use crate::backend::domain::models::{budget::BudgetWithProgress, transaction::Transaction};
use crate::backend::error::{AppError, AppResult};
use crate::backend::storage::{CategoryStorage, Connection, TransactionStorage};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
const EXPORT_DATE_FORMAT: &str = "%d.%m.%Y";

/// Column layout of one spreadsheet
pub trait ExportMapping {
    type Row;

    fn headings(&self) -> Vec<&'static str>;

    fn map(&self, row: &Self::Row) -> Vec<String>;
}

pub struct BudgetsExport;

impl ExportMapping for BudgetsExport {
    type Row = BudgetWithProgress;

    fn headings(&self) -> Vec<&'static str> {
        vec![
            "ID",
            "Категорія",
            "Сума бюджету",
            "Витрачено",
            "Залишок",
            "Відсоток",
            "Період",
            "Дата початку",
            "Дата закінчення",
        ]
    }

    fn map(&self, row: &BudgetWithProgress) -> Vec<String> {
        vec![
            row.budget.id.clone(),
            text_cell(&row.category_name),
            format_amount(row.budget.amount),
            format_amount(row.progress.spent),
            format_amount(row.progress.remaining),
            format_amount(row.progress.percentage),
            period_label(row.budget.period).to_string(),
            format_date(row.budget.start_date),
            format_date(row.budget.end_date),
        ]
    }
}

pub struct TransactionsExport {
    /// Category id to name
    pub category_names: HashMap<String, String>,
}

impl ExportMapping for TransactionsExport {
    type Row = Transaction;

    fn headings(&self) -> Vec<&'static str> {
        vec!["ID", "Дата", "Тип", "Категорія", "Опис", "Сума"]
    }

    fn map(&self, row: &Transaction) -> Vec<String> {
        vec![
            row.id.clone(),
            format_date(row.date),
            type_label(row.transaction_type).to_string(),
            self.category_names
                .get(&row.category_id)
                .map(|name| text_cell(name))
                .unwrap_or_default(),
            row.description.as_deref().map(text_cell).unwrap_or_default(),
            format_amount(row.amount),
        ]
    }
}

pub fn type_label(transaction_type: TransactionType) -> &'static str {
    match transaction_type {
        TransactionType::Income => "Дохід",
        TransactionType::Expense => "Витрата",
    }
}

pub fn period_label(period: BudgetPeriod) -> &'static str {
    match period {
        BudgetPeriod::Weekly => "Тиждень",
        BudgetPeriod::Monthly => "Місяць",
        BudgetPeriod::Yearly => "Рік",
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(EXPORT_DATE_FORMAT).to_string()
}

/// User text that a spreadsheet would read as a formula gets a leading quote
pub fn text_cell(value: &str) -> String {
    if value.starts_with(['=', '+', '-', '@', '\t', '\r']) {
        format!("'{}", value)
    } else {
        value.to_string()
    }
}

fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Write the headings and all rows as CSV
pub fn write_spreadsheet<M: ExportMapping>(mapping: &M, rows: &[M::Row]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    writer
        .write_record(mapping.headings())
        .context("Failed to write export headings")?;
    for row in rows {
        writer
            .write_record(mapping.map(row))
            .context("Failed to write export row")?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finish export: {}", e.error()))
}

#[derive(Clone)]
pub struct ExportService<C: Connection> {
    budget_service: BudgetService<C>,
    transaction_repository: C::TransactionRepository,
    category_repository: C::CategoryRepository,
}

impl<C: Connection> ExportService<C> {
    pub fn new(connection: &C, budget_service: BudgetService<C>) -> Self {
        Self {
            budget_service,
            transaction_repository: connection.create_transaction_repository(),
            category_repository: connection.create_category_repository(),
        }
    }

    pub async fn export_budgets(&self, user_id: &str, today: NaiveDate) -> AppResult<ExportFile> {
        let budgets = self.budget_service.list_budgets(user_id).await?;
        let content = write_spreadsheet(&BudgetsExport, &budgets)?;

        info!(target: "app", user_id, rows = budgets.len(), "Budgets exported");
        Ok(ExportFile {
            filename: format!("budgets_{}.csv", today.format("%Y-%m-%d")),
            content_type: CSV_CONTENT_TYPE,
            content,
        })
    }

    /// Transactions in chronological order, optionally within a date range
    pub async fn export_transactions(
        &self,
        user_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> AppResult<ExportFile> {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(AppError::validation("start_date must not be after end_date"));
            }
        }

        let category_names = self
            .category_repository
            .list_categories(user_id)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        let transactions = self
            .transaction_repository
            .list_transactions_chronological(user_id, start_date, end_date)
            .await?;
        let content = write_spreadsheet(&TransactionsExport { category_names }, &transactions)?;

        info!(target: "app", user_id, rows = transactions.len(), "Transactions exported");
        Ok(ExportFile {
            filename: format!("transactions_{}.csv", today.format("%Y-%m-%d")),
            content_type: CSV_CONTENT_TYPE,
            content,
        })
    }
}
