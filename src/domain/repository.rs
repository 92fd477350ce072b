use crate::domain::member::Member;
use crate::domain::pagination::PageWindow;
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Persistent storage for members.
///
/// Uniqueness of `email` and non-empty `handphone` is the store's job:
/// `insert` and `update` fail with [`StoreError::UniqueViolation`] rather than
/// letting a duplicate through. Any other failure is reported as
/// [`StoreError::Unavailable`] or an arbitrary error.
///
/// [`StoreError::UniqueViolation`]: crate::domain::error::StoreError::UniqueViolation
/// [`StoreError::Unavailable`]: crate::domain::error::StoreError::Unavailable
#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn insert(&self, member: Member) -> Result<()>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Member>>;
    async fn update(&self, member: Member) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    /// Removes every listed row in one step and returns how many existed.
    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64>;
    async fn find_page(&self, window: &PageWindow) -> Result<Vec<Member>>;
    async fn count(&self, search: Option<&str>) -> Result<u64>;
}
