use shared::{
    CreateTransactionRequest, PaginationInfo, Transaction, TransactionListRequest, TransactionListResponse,
    UpdateTransactionRequest,
};

use crate::backend::domain::commands::transactions::{
    CreateTransactionCommand, TransactionListQuery, TransactionListResult, UpdateTransactionCommand,
};
use crate::backend::domain::models::transaction::Transaction as DomainTransaction;
use crate::backend::error::AppResult;

use super::{date_to_dto, parse_optional_date, timestamp_to_dto};

pub struct TransactionMapper;

impl TransactionMapper {
    pub fn to_list_query(request: TransactionListRequest) -> AppResult<TransactionListQuery> {
        Ok(TransactionListQuery {
            after: request.after.filter(|a| !a.is_empty()),
            limit: request.limit,
            start_date: parse_optional_date("start_date", request.start_date.as_deref())?,
            end_date: parse_optional_date("end_date", request.end_date.as_deref())?,
            category_id: request.category_id.filter(|c| !c.is_empty()),
            transaction_type: request.transaction_type,
        })
    }

    pub fn to_create_command(request: CreateTransactionRequest) -> AppResult<CreateTransactionCommand> {
        Ok(CreateTransactionCommand {
            category_id: request.category_id,
            amount: request.amount,
            description: request.description,
            date: parse_optional_date("date", request.date.as_deref())?,
        })
    }

    pub fn to_update_command(request: UpdateTransactionRequest) -> AppResult<UpdateTransactionCommand> {
        Ok(UpdateTransactionCommand {
            category_id: request.category_id,
            amount: request.amount,
            description: request.description,
            date: parse_optional_date("date", request.date.as_deref())?,
        })
    }

    pub fn to_dto(transaction: DomainTransaction) -> Transaction {
        Transaction {
            id: transaction.id,
            category_id: transaction.category_id,
            transaction_type: transaction.transaction_type,
            amount: transaction.amount,
            description: transaction.description,
            date: date_to_dto(transaction.date),
            created_at: timestamp_to_dto(transaction.created_at),
            updated_at: timestamp_to_dto(transaction.updated_at),
        }
    }

    pub fn to_list_response(result: TransactionListResult) -> TransactionListResponse {
        TransactionListResponse {
            transactions: result.transactions.into_iter().map(Self::to_dto).collect(),
            pagination: PaginationInfo {
                has_more: result.has_more,
                next_cursor: result.next_cursor,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::TransactionType;

    #[test]
    fn test_list_query_parses_dates_and_drops_empty_values() {
        let request = TransactionListRequest {
            after: Some(String::new()),
            limit: Some(10),
            start_date: Some("2025-06-01".to_string()),
            end_date: None,
            category_id: Some(String::new()),
            transaction_type: Some(TransactionType::Expense),
        };

        let query = TransactionMapper::to_list_query(request).unwrap();
        assert!(query.after.is_none());
        assert!(query.category_id.is_none());
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.start_date.unwrap().to_string(), "2025-06-01");
        assert_eq!(query.transaction_type, Some(TransactionType::Expense));
    }

    #[test]
    fn test_create_command_rejects_bad_date() {
        let request = CreateTransactionRequest {
            category_id: "c1".to_string(),
            amount: 10.0,
            description: None,
            date: Some("yesterday".to_string()),
        };
        assert!(TransactionMapper::to_create_command(request).is_err());
    }
}
