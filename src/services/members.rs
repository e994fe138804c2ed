//! Members service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::member::{CreateMember, Member, MemberQuery, UpdateMember},
    repository::{DeleteOutcome, Repository},
};

#[derive(Clone)]
pub struct MembersService {
    repository: Repository,
}

impl MembersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &MemberQuery) -> AppResult<Vec<Member>> {
        let members = self.repository.members.list().await?;
        Ok(members.into_iter().filter(|m| query.matches(m)).collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Member> {
        self.repository
            .members
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))
    }

    pub async fn create(&self, data: &CreateMember) -> AppResult<Member> {
        let member = self.repository.members.create(data).await?;
        tracing::info!("Registered member {} ({})", member.id, member.membership_type);
        Ok(member)
    }

    pub async fn update(&self, id: Uuid, data: &UpdateMember) -> AppResult<Member> {
        self.repository
            .members
            .update(id, data)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))
    }

    /// Remove a member. Refused while they still hold books.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        match self.repository.members.delete(id).await? {
            DeleteOutcome::Deleted => {
                tracing::info!("Removed member {}", id);
                Ok(())
            }
            DeleteOutcome::NotFound => Err(AppError::NotFound(format!("Member {} not found", id))),
            DeleteOutcome::InUse => Err(AppError::BusinessRule(
                ErrorCode::MemberHasIssuedBooks,
                "Member has issued books".to_string(),
            )),
        }
    }
}
