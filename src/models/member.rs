//! Library member model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::{MemberStatus, MembershipType};

/// Member record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub membership_type: MembershipType,
    pub join_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create member request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMember {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub membership_type: MembershipType,
    /// Defaults to today
    pub join_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

/// Update member request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMember {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub membership_type: Option<MembershipType>,
    pub join_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

impl UpdateMember {
    /// Apply the present fields onto an existing record
    pub fn apply_to(&self, member: &mut Member) {
        if let Some(ref name) = self.name {
            member.name = name.clone();
        }
        if let Some(ref email) = self.email {
            member.email = email.clone();
        }
        if self.phone.is_some() {
            member.phone = self.phone.clone();
        }
        if self.address.is_some() {
            member.address = self.address.clone();
        }
        if let Some(membership_type) = self.membership_type {
            member.membership_type = membership_type;
        }
        if let Some(join_date) = self.join_date {
            member.join_date = join_date;
        }
        if let Some(is_active) = self.is_active {
            member.is_active = is_active;
        }
    }
}

/// Member list filters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MemberQuery {
    /// Case-insensitive match on name or email, substring match on phone
    pub search: Option<String>,
    pub membership_type: Option<MembershipType>,
    pub status: Option<MemberStatus>,
}

impl MemberQuery {
    pub fn matches(&self, member: &Member) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let lowered = term.to_lowercase();
                member.name.to_lowercase().contains(&lowered)
                    || member.email.to_lowercase().contains(&lowered)
                    || member.phone.as_deref().is_some_and(|phone| phone.contains(term))
            }
        };

        let matches_type = self
            .membership_type
            .map_or(true, |membership_type| member.membership_type == membership_type);

        let matches_status = match self.status {
            None => true,
            Some(MemberStatus::Active) => member.is_active,
            Some(MemberStatus::Inactive) => !member.is_active,
        };

        matches_search && matches_type && matches_status
    }
}
