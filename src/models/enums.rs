//! Shared domain enums

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

/// Implements string-backed SQLx conversions for a slug enum
macro_rules! impl_sqlx_slug {
    ($ty:ty) => {
        impl sqlx::Type<Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $ty {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $ty {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// MembershipType
// ---------------------------------------------------------------------------

/// Member category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MembershipType {
    Student,
    Faculty,
    #[default]
    Public,
}

impl MembershipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipType::Student => "student",
            MembershipType::Faculty => "faculty",
            MembershipType::Public => "public",
        }
    }
}

impl std::str::FromStr for MembershipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(MembershipType::Student),
            "faculty" => Ok(MembershipType::Faculty),
            "public" => Ok(MembershipType::Public),
            _ => Err(format!("Invalid membership type: {}", s)),
        }
    }
}

impl_sqlx_slug!(MembershipType);

// ---------------------------------------------------------------------------
// TransactionStatus
// ---------------------------------------------------------------------------

/// Checkout status. Moves issued -> overdue -> returned, or issued -> returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Issued,
    Overdue,
    Returned,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Issued => "issued",
            TransactionStatus::Overdue => "overdue",
            TransactionStatus::Returned => "returned",
        }
    }

    /// Whether the copy is still out (issued or overdue)
    pub fn is_active(&self) -> bool {
        !matches!(self, TransactionStatus::Returned)
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "issued" => Ok(TransactionStatus::Issued),
            "overdue" => Ok(TransactionStatus::Overdue),
            "returned" => Ok(TransactionStatus::Returned),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

impl_sqlx_slug!(TransactionStatus);

// ---------------------------------------------------------------------------
// MemberStatus
// ---------------------------------------------------------------------------

/// Filter on the member active flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Inactive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_parse_case_insensitively() {
        assert_eq!("Faculty".parse::<MembershipType>(), Ok(MembershipType::Faculty));
        assert_eq!("OVERDUE".parse::<TransactionStatus>(), Ok(TransactionStatus::Overdue));
        assert!("staff".parse::<MembershipType>().is_err());
    }

    #[test]
    fn returned_is_the_only_inactive_status() {
        assert!(TransactionStatus::Issued.is_active());
        assert!(TransactionStatus::Overdue.is_active());
        assert!(!TransactionStatus::Returned.is_active());
    }

    #[test]
    fn serializes_as_lowercase_strings() {
        let json = serde_json::to_string(&TransactionStatus::Returned).unwrap();
        assert_eq!(json, "\"returned\"");
        assert_eq!(MembershipType::default(), MembershipType::Public);
    }
}
