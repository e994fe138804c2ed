//! Member management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        member::{CreateMember, Member, MemberQuery, UpdateMember},
        TransactionView,
    },
};

use super::ValidatedJson;

/// List members, optionally filtered
#[utoipa::path(
    get,
    path = "/members",
    tag = "members",
    params(MemberQuery),
    responses(
        (status = 200, description = "Members in registration order", body = Vec<Member>)
    )
)]
pub async fn list_members(
    State(state): State<crate::AppState>,
    Query(query): Query<MemberQuery>,
) -> AppResult<Json<Vec<Member>>> {
    let members = state.services.members.list(&query).await?;
    Ok(Json(members))
}

/// Get member by ID
#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = "members",
    params(("id" = Uuid, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member details", body = Member),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_member(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Member>> {
    let member = state.services.members.get_by_id(id).await?;
    Ok(Json(member))
}

/// Register a member
#[utoipa::path(
    post,
    path = "/members",
    tag = "members",
    request_body = CreateMember,
    responses(
        (status = 201, description = "Member created", body = Member),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_member(
    State(state): State<crate::AppState>,
    ValidatedJson(data): ValidatedJson<CreateMember>,
) -> AppResult<(StatusCode, Json<Member>)> {
    let member = state.services.members.create(&data).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// Update a member
#[utoipa::path(
    put,
    path = "/members/{id}",
    tag = "members",
    params(("id" = Uuid, Path, description = "Member ID")),
    request_body = UpdateMember,
    responses(
        (status = 200, description = "Member updated", body = Member),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_member(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(data): ValidatedJson<UpdateMember>,
) -> AppResult<Json<Member>> {
    let member = state.services.members.update(id, &data).await?;
    Ok(Json(member))
}

/// Delete a member
#[utoipa::path(
    delete,
    path = "/members/{id}",
    tag = "members",
    params(("id" = Uuid, Path, description = "Member ID")),
    responses(
        (status = 204, description = "Member deleted"),
        (status = 400, description = "Member still holds books", body = crate::error::ErrorResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_member(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.members.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Transactions of a member
#[utoipa::path(
    get,
    path = "/members/{id}/transactions",
    tag = "members",
    params(("id" = Uuid, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member's transactions", body = Vec<TransactionView>),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_member_transactions(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<TransactionView>>> {
    let transactions = state.services.transactions.list_for_member(id).await?;
    Ok(Json(transactions))
}
