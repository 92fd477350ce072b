use crate::domain::error::StoreError;
use crate::domain::member::Member;
use crate::domain::pagination::{PageWindow, name_matches};
use crate::domain::repository::MemberRepository;
use anyhow::Result;
use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace};
use uuid::Uuid;

struct Row {
    // Insertion sequence, breaks ties between equal `created_at` values.
    seq: u64,
    member: Member,
}

#[derive(Default)]
struct Table {
    rows: HashMap<Uuid, Row>,
    next_seq: u64,
}

impl Table {
    fn check_unique(&self, member: &Member) -> Result<(), StoreError> {
        for row in self.rows.values().filter(|r| r.member.id != member.id) {
            if row.member.email == member.email {
                return Err(StoreError::UniqueViolation { field: "email" });
            }
            if let (Some(a), Some(b)) = (&row.member.handphone, &member.handphone) {
                if !a.is_empty() && a == b {
                    return Err(StoreError::UniqueViolation { field: "handphone" });
                }
            }
        }
        Ok(())
    }

    fn ordered(&self, search: Option<&str>) -> Vec<&Row> {
        let mut rows: Vec<&Row> = self
            .rows
            .values()
            .filter(|r| name_matches(search, &r.member.name))
            .collect();
        rows.sort_by_key(|r| Reverse((r.member.created_at, r.seq)));
        rows
    }
}

#[derive(Clone)]
pub struct InMemoryMemberRepository {
    storage: Arc<RwLock<Table>>,
}

impl InMemoryMemberRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(Table::default())),
        }
    }
}

impl Default for InMemoryMemberRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemberRepository for InMemoryMemberRepository {
    #[instrument(skip(self, member), fields(member_id = %member.id))]
    async fn insert(&self, member: Member) -> Result<()> {
        trace!("Acquiring write lock for member storage");
        let mut table = self.storage.write().await;
        if table.rows.contains_key(&member.id) {
            return Err(StoreError::UniqueViolation { field: "id" }.into());
        }
        table.check_unique(&member)?;
        let seq = table.next_seq;
        table.next_seq += 1;
        debug!(member_id = %member.id, email = %member.email, "Member inserted into storage");
        table.rows.insert(member.id, Row { seq, member });
        Ok(())
    }

    #[instrument(skip(self), fields(member_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Member>> {
        let table = self.storage.read().await;
        let member = table.rows.get(&id).map(|r| r.member.clone());
        trace!(found = member.is_some(), "Looked up member by id");
        Ok(member)
    }

    #[instrument(skip(self, member), fields(member_id = %member.id))]
    async fn update(&self, member: Member) -> Result<()> {
        trace!("Acquiring write lock for member storage");
        let mut table = self.storage.write().await;
        if !table.rows.contains_key(&member.id) {
            return Err(StoreError::Missing.into());
        }
        table.check_unique(&member)?;
        if let Some(row) = table.rows.get_mut(&member.id) {
            row.member = member;
        }
        debug!("Member updated in storage");
        Ok(())
    }

    #[instrument(skip(self), fields(member_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut table = self.storage.write().await;
        let removed = table.rows.remove(&id).is_some();
        debug!(removed, "Delete applied to storage");
        Ok(removed)
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64> {
        let mut table = self.storage.write().await;
        let removed = ids
            .iter()
            .filter(|id| table.rows.remove(*id).is_some())
            .count() as u64;
        debug!(removed, "Bulk delete applied to storage");
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn find_page(&self, window: &PageWindow) -> Result<Vec<Member>> {
        let table = self.storage.read().await;
        let page: Vec<Member> = table
            .ordered(window.search.as_deref())
            .into_iter()
            .skip(usize::try_from(window.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(window.limit).unwrap_or(usize::MAX))
            .map(|r| r.member.clone())
            .collect();
        trace!(returned = page.len(), "Read page from storage");
        Ok(page)
    }

    #[instrument(skip(self))]
    async fn count(&self, search: Option<&str>) -> Result<u64> {
        let table = self.storage.read().await;
        let count = table
            .rows
            .values()
            .filter(|r| name_matches(search, &r.member.name))
            .count() as u64;
        Ok(count)
    }
}
