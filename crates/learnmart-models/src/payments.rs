//! Coins, the coin ratio and the transaction ledger.

use chrono::{DateTime, Utc};
use learnmart_core::PaginationParams;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "transaction_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "purchase_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PurchaseType {
    Coins,
    Course,
    Gig,
    Refund,
}

/// `type` filter for the transaction history. `all` matches every record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionTypeFilter {
    #[default]
    All,
    Credit,
    Debit,
}

impl TransactionTypeFilter {
    /// `None` means no constraint.
    pub fn as_type(self) -> Option<TransactionType> {
        match self {
            Self::All => None,
            Self::Credit => Some(TransactionType::Credit),
            Self::Debit => Some(TransactionType::Debit),
        }
    }

    pub fn matches(self, value: TransactionType) -> bool {
        self.as_type().is_none_or(|t| t == value)
    }
}

/// `purchaseType` filter for the transaction history. `all` matches every record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseTypeFilter {
    #[default]
    All,
    Coins,
    Course,
    Gig,
    Refund,
}

impl PurchaseTypeFilter {
    pub fn as_type(self) -> Option<PurchaseType> {
        match self {
            Self::All => None,
            Self::Coins => Some(PurchaseType::Coins),
            Self::Course => Some(PurchaseType::Course),
            Self::Gig => Some(PurchaseType::Gig),
            Self::Refund => Some(PurchaseType::Refund),
        }
    }

    pub fn matches(self, value: PurchaseType) -> bool {
        self.as_type().is_none_or(|t| t == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub transaction_type: TransactionType,
    pub purchase_type: PurchaseType,
    /// Coins moved, always positive; direction comes from `type`
    pub coins: i64,
    /// Money paid in currency minor units, zero for internal movements
    pub amount: i64,
    pub reference_id: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        user_id: Uuid,
        transaction_type: TransactionType,
        purchase_type: PurchaseType,
        coins: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            transaction_type,
            purchase_type,
            coins,
            amount: 0,
            reference_id: None,
            description: description.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_amount(mut self, amount: i64) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference_id = Some(reference.into());
        self
    }

    /// Balance delta this row applies to its user.
    pub fn signed_coins(&self) -> i64 {
        match self.transaction_type {
            TransactionType::Credit => self.coins,
            TransactionType::Debit => -self.coins,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoinRatio {
    /// Coins granted per currency unit
    pub coins_per_unit: i64,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl Default for CoinRatio {
    fn default() -> Self {
        Self {
            coins_per_unit: 1,
            updated_by: None,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCoinRatioDto {
    #[validate(range(min = 1, message = "coinsPerUnit must be greater than 0"))]
    pub coins_per_unit: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseCoinsDto {
    /// Currency units paid
    #[validate(range(min = 1, message = "amount must be greater than 0"))]
    pub amount: i64,
    #[validate(length(min = 1, max = 200, message = "paymentReference must be between 1 and 200 characters"))]
    pub payment_reference: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PurchaseCoinsResponse {
    pub transaction: Transaction,
    pub balance: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub coins: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TransactionFilterParams {
    #[serde(default, rename = "type")]
    pub transaction_type: TransactionTypeFilter,
    #[serde(default)]
    pub purchase_type: PurchaseTypeFilter,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_filter_matches_everything() {
        for t in [TransactionType::Credit, TransactionType::Debit] {
            assert!(TransactionTypeFilter::All.matches(t));
        }
        for p in [
            PurchaseType::Coins,
            PurchaseType::Course,
            PurchaseType::Gig,
            PurchaseType::Refund,
        ] {
            assert!(PurchaseTypeFilter::All.matches(p));
        }
    }

    #[test]
    fn test_specific_filter_matches_one() {
        assert!(TransactionTypeFilter::Debit.matches(TransactionType::Debit));
        assert!(!TransactionTypeFilter::Debit.matches(TransactionType::Credit));
        assert!(!PurchaseTypeFilter::Gig.matches(PurchaseType::Course));
    }

    #[test]
    fn test_filter_params_default_to_all() {
        let params: TransactionFilterParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.transaction_type, TransactionTypeFilter::All);
        assert_eq!(params.purchase_type, PurchaseTypeFilter::All);
    }

    #[test]
    fn test_filter_params_parse_query_names() {
        let params: TransactionFilterParams =
            serde_json::from_str(r#"{"type":"credit","purchaseType":"refund"}"#).unwrap();
        assert_eq!(params.transaction_type, TransactionTypeFilter::Credit);
        assert_eq!(params.purchase_type, PurchaseTypeFilter::Refund);
    }

    #[test]
    fn test_unknown_filter_value_is_rejected() {
        let result: Result<TransactionFilterParams, _> =
            serde_json::from_str(r#"{"type":"refund"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_transaction_serializes_type_field() {
        let tx = Transaction::new(Uuid::new_v4(), TransactionType::Debit, PurchaseType::Course, 50, "Enrolled");
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "debit");
        assert_eq!(json["purchaseType"], "course");
        assert_eq!(tx.signed_coins(), -50);
    }
}
