use crate::domain::error::{DomainError, StoreError};
use crate::domain::member::{CreateMemberRequest, Member};
use crate::domain::pagination::{ListQuery, Page, PageMeta, PageWindow};
use crate::domain::repository::MemberRepository;
use crate::infrastructure::security::hash_password;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

const CONFLICT_MESSAGE: &str = "Member with that email or handphone already exists";

/// How a failing store call should be reported to the caller.
#[derive(Clone, Copy)]
enum StoreFailure {
    Read,
    Write,
}

/// Unique violations become `Conflict`; anything else is an infrastructure
/// fault, reported as `StoreUnavailable` for reads/inserts and `WriteFailed`
/// for mutations of existing rows.
fn classify(err: anyhow::Error, kind: StoreFailure, context: &str) -> anyhow::Error {
    if let Some(StoreError::UniqueViolation { field }) = err.downcast_ref::<StoreError>() {
        warn!(field = *field, "Unique constraint violated");
        return DomainError::Conflict(CONFLICT_MESSAGE.to_string()).into();
    }
    if err.downcast_ref::<DomainError>().is_some() {
        return err;
    }
    error!(error = %err, context, "Store call failed");
    match kind {
        StoreFailure::Read => DomainError::StoreUnavailable(err.to_string()).into(),
        StoreFailure::Write => DomainError::WriteFailed(context.to_string()).into(),
    }
}

pub struct MemberService<R: MemberRepository> {
    repository: Arc<R>,
}

impl<R: MemberRepository> MemberService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Runs Argon2 on the blocking pool.
    async fn hash(&self, password: String) -> Result<String> {
        let hashed = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| {
                error!(error = %e, "Password hashing task failed");
                DomainError::Internal(format!("Failed to hash password: {}", e))
            })?;
        hashed.map_err(|e| {
            error!(error = %e, "Failed to hash password");
            DomainError::Internal(format!("Failed to hash password: {}", e)).into()
        })
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn create_member(&self, req: CreateMemberRequest) -> Result<Member> {
        trace!("Starting member creation");
        let handphone = req.normalized_handphone();
        let password_hash = self.hash(req.password).await?;
        let now = Utc::now();
        let member = Member {
            id: Uuid::new_v4(),
            name: req.name,
            email: req.email,
            handphone,
            password_hash,
            photo: req.photo,
            created_at: now,
            updated_at: now,
        };

        debug!(member_id = %member.id, "Saving member to repository");
        self.repository
            .insert(member.clone())
            .await
            .map_err(|e| classify(e, StoreFailure::Read, "Failed to create member"))?;

        info!(member_id = %member.id, email = %member.email, "Member created");
        Ok(member)
    }

    #[instrument(skip(self))]
    pub async fn get_member(&self, id: Uuid) -> Result<Member> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(|e| classify(e, StoreFailure::Read, "Failed to read member"))?
            .ok_or_else(|| DomainError::NotFound("member not found".to_string()).into())
    }

    /// Overwrites name, email and password; `handphone` and `photo` are only
    /// replaced when supplied. `id` and `created_at` never change.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn update_member(&self, id: Uuid, req: CreateMemberRequest) -> Result<Member> {
        let mut member = self
            .repository
            .find_by_id(id)
            .await
            .map_err(|e| classify(e, StoreFailure::Write, "Failed to update member"))?
            .ok_or_else(|| DomainError::NotFound("No data with that id exists".to_string()))?;

        let handphone = req.normalized_handphone();
        member.password_hash = self.hash(req.password).await?;
        member.name = req.name;
        member.email = req.email;
        if handphone.is_some() {
            member.handphone = handphone;
        }
        if req.photo.is_some() {
            member.photo = req.photo;
        }
        member.updated_at = Utc::now();

        self.repository
            .update(member.clone())
            .await
            .map_err(|e| {
                // Deleted between the lookup and the write.
                if matches!(e.downcast_ref::<StoreError>(), Some(StoreError::Missing)) {
                    DomainError::NotFound("No data with that id exists".to_string()).into()
                } else {
                    classify(e, StoreFailure::Write, "Failed to update member")
                }
            })?;

        info!(member_id = %member.id, "Member updated");
        Ok(member)
    }

    #[instrument(skip(self))]
    pub async fn delete_member(&self, id: Uuid) -> Result<()> {
        let removed = self
            .repository
            .delete(id)
            .await
            .map_err(|e| classify(e, StoreFailure::Write, "Failed to delete member"))?;
        if !removed {
            return Err(DomainError::NotFound("ID not found".to_string()).into());
        }
        info!(member_id = %id, "Member deleted");
        Ok(())
    }

    /// Deletes every listed member that exists. Unknown ids are silently
    /// skipped: the call only fails with `NotFound` when nothing matched.
    /// Returns the number of deleted members.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn delete_members(&self, ids: &[Uuid]) -> Result<u64> {
        let removed = self
            .repository
            .delete_many(ids)
            .await
            .map_err(|e| classify(e, StoreFailure::Write, "Failed to delete members"))?;
        if removed == 0 {
            return Err(
                DomainError::NotFound("No members with the provided IDs found".to_string()).into(),
            );
        }
        info!(removed, "Members deleted");
        Ok(removed)
    }

    #[instrument(skip(self))]
    pub async fn list_members(&self, query: &ListQuery) -> Result<Page<Member>> {
        let window = PageWindow::from_query(query);
        let items = self
            .repository
            .find_page(&window)
            .await
            .map_err(|e| classify(e, StoreFailure::Read, "Failed to read members"))?;
        let total = self
            .repository
            .count(window.search.as_deref())
            .await
            .map_err(|e| classify(e, StoreFailure::Read, "Failed to count members"))?;

        let meta = PageMeta::new(total, &window);
        debug!(returned = items.len(), total, "Listed members");
        Ok(Page { items, meta })
    }
}
