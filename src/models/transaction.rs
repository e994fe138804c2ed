//! Checkout transaction model, request types and joined views

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{book::Book, enums::TransactionStatus, member::Member};

/// Checkout transaction from the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub book_id: Uuid,
    pub member_id: Uuid,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: TransactionStatus,
    #[schema(value_type = Option<String>)]
    pub fine: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ledger entry to record when a copy has been reserved
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub book_id: Uuid,
    pub member_id: Uuid,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

/// Parse a due date given either as RFC 3339 or as a plain `YYYY-MM-DD`
/// date (midnight UTC).
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| format!("Invalid due date: {}", raw))
}

fn deserialize_due_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_due_date(&raw).map_err(serde::de::Error::custom)
}

/// Digits kept after the decimal point in recorded fines
pub const FINE_SCALE: u32 = 2;

/// Largest fine the ledger can record (`NUMERIC(10, 2)`)
pub fn max_fine() -> Decimal {
    Decimal::new(9_999_999_999, FINE_SCALE)
}

fn validate_fine(fine: &Decimal) -> Result<(), ValidationError> {
    let message = if *fine < Decimal::ZERO {
        "Fine cannot be negative"
    } else if *fine > max_fine() {
        "Fine is too large"
    } else if fine.normalize().scale() > FINE_SCALE {
        "Fine cannot have more than two decimal places"
    } else {
        return Ok(());
    };

    let mut err = ValidationError::new("fine");
    err.message = Some(message.into());
    Err(err)
}

/// Issue (checkout) request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    pub book_id: Uuid,
    pub member_id: Uuid,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    #[serde(deserialize_with = "deserialize_due_date")]
    #[schema(value_type = String, example = "2024-03-01")]
    pub due_date: DateTime<Utc>,
}

/// Return request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    /// Transaction ID
    pub id: Uuid,
    /// Fine collected; assessed from the fine policy when omitted
    #[validate(custom(function = "validate_fine"))]
    #[schema(value_type = Option<String>)]
    pub fine: Option<Decimal>,
}

/// Transaction list filters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TransactionQuery {
    /// Case-insensitive match on book title/author or member name/email
    pub search: Option<String>,
    pub status: Option<TransactionStatus>,
}

impl TransactionQuery {
    pub fn matches(&self, view: &TransactionView) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                [
                    view.book_title.as_deref(),
                    view.book_author.as_deref(),
                    view.member_name.as_deref(),
                    view.member_email.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&term))
            }
        };

        let matches_status = self.status.map_or(true, |status| view.status == status);

        matches_search && matches_status
    }
}

/// Transaction joined with the book and member it references.
/// Reference fields are `None` when the record no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: Uuid,
    pub book_id: Uuid,
    pub member_id: Uuid,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: TransactionStatus,
    #[schema(value_type = Option<String>)]
    pub fine: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub book_title: Option<String>,
    pub book_author: Option<String>,
    pub member_name: Option<String>,
    pub member_email: Option<String>,
}

impl TransactionView {
    pub fn new(transaction: &Transaction, book: Option<&Book>, member: Option<&Member>) -> Self {
        Self {
            id: transaction.id,
            book_id: transaction.book_id,
            member_id: transaction.member_id,
            issue_date: transaction.issue_date,
            due_date: transaction.due_date,
            return_date: transaction.return_date,
            status: transaction.status,
            fine: transaction.fine,
            created_at: transaction.created_at,
            book_title: book.map(|b| b.title.clone()),
            book_author: book.map(|b| b.author.clone()),
            member_name: member.map(|m| m.name.clone()),
            member_email: member.map(|m| m.email.clone()),
        }
    }
}

/// Join transactions with their books and members, keeping ledger order
pub fn join_transactions(
    transactions: &[Transaction],
    books: &[Book],
    members: &[Member],
) -> Vec<TransactionView> {
    let books: HashMap<Uuid, &Book> = books.iter().map(|b| (b.id, b)).collect();
    let members: HashMap<Uuid, &Member> = members.iter().map(|m| (m.id, m)).collect();

    transactions
        .iter()
        .map(|t| {
            TransactionView::new(
                t,
                books.get(&t.book_id).copied(),
                members.get(&t.member_id).copied(),
            )
        })
        .collect()
}

/// Fine assessed for a transaction at a given moment
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FineQuote {
    pub transaction_id: Uuid,
    pub days_overdue: i64,
    #[schema(value_type = String)]
    pub fine: Decimal,
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::models::{book::tests::book, member::tests::member};

    pub(crate) fn transaction(book: &Book, member: &Member, due_in_days: i64) -> Transaction {
        let now = Utc::now();
        Transaction {
            id: Uuid::new_v4(),
            book_id: book.id,
            member_id: member.id,
            issue_date: now,
            due_date: now + Duration::days(due_in_days),
            return_date: None,
            status: TransactionStatus::Issued,
            fine: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn due_date_accepts_plain_dates_and_timestamps() {
        let date = parse_due_date("2024-03-01").unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());

        let timestamp = parse_due_date("2024-03-01T12:30:00+02:00").unwrap();
        assert_eq!(timestamp, Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap());

        assert!(parse_due_date("next tuesday").is_err());
    }

    #[test]
    fn issue_request_uses_camel_case() {
        let request: IssueRequest = serde_json::from_value(serde_json::json!({
            "bookId": Uuid::nil(),
            "memberId": Uuid::nil(),
            "dueDate": "2024-03-01",
        }))
        .unwrap();
        assert_eq!(request.due_date, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn negative_fines_are_rejected() {
        let request = ReturnRequest { id: Uuid::nil(), fine: Some(Decimal::from(-1)) };
        assert!(request.validate().is_err());

        let request = ReturnRequest { id: Uuid::nil(), fine: Some(Decimal::ZERO) };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn fines_must_fit_the_ledger_column() {
        let fine = |raw: &str| ReturnRequest { id: Uuid::nil(), fine: Some(raw.parse().unwrap()) };

        assert!(fine("12.50").validate().is_ok());
        assert!(fine("12.500").validate().is_ok());
        assert!(fine("99999999.99").validate().is_ok());

        assert!(fine("12.505").validate().is_err());
        assert!(fine("100000000").validate().is_err());
    }

    #[test]
    fn join_resolves_references_and_tolerates_missing_ones() {
        let gatsby = book("The Great Gatsby", "F. Scott Fitzgerald", "Fiction", 5);
        let john = member("John Doe", "john.doe@email.com");
        let orphan_book = book("Deleted", "Nobody", "Fiction", 1);

        let ledger = vec![transaction(&gatsby, &john, 14), transaction(&orphan_book, &john, 14)];
        let views = join_transactions(&ledger, &[gatsby.clone()], &[john.clone()]);

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].book_title.as_deref(), Some("The Great Gatsby"));
        assert_eq!(views[0].member_name.as_deref(), Some("John Doe"));
        assert_eq!(views[1].book_title, None);
        assert_eq!(views[1].member_email.as_deref(), Some("john.doe@email.com"));

        let query = TransactionQuery { search: Some("gatsby".to_string()), status: None };
        assert!(query.matches(&views[0]));
        assert!(!query.matches(&views[1]));
    }
}
