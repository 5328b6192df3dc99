use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::{StorageBackend, StorageConfig};
use crate::error::StoreResult;
use crate::schemas::{
    DepositRecord, EventId, EventRecord, ExpenseRecord, Group, GroupId, GroupLedger, Member,
    Membership, Role, UserId,
};

pub mod memory;
pub mod mongo;

pub use memory::{MemoryData, MemoryStore};
pub use mongo::MongoStore;

/// Read and write access to the persisted tour records.
///
/// Every read returns rows as they are stored; scoping, joining and
/// aggregation happen in the callers.
#[async_trait]
pub trait FinanceStore: Send + Sync {
    async fn find_group(&self, group_id: GroupId) -> StoreResult<Option<Group>>;
    async fn groups(&self, group_ids: &[GroupId]) -> StoreResult<Vec<Group>>;
    /// Groups in which `user_id` holds the admin role, ordered by id.
    async fn admin_groups(&self, user_id: UserId) -> StoreResult<Vec<Group>>;
    async fn role_in_group(&self, user_id: UserId, group_id: GroupId)
        -> StoreResult<Option<Role>>;
    /// Membership rows of the given groups in insertion order.
    async fn memberships(&self, group_ids: &[GroupId]) -> StoreResult<Vec<Membership>>;
    async fn usernames(&self, user_ids: &[UserId]) -> StoreResult<HashMap<UserId, String>>;

    async fn find_event(&self, event_id: EventId) -> StoreResult<Option<EventRecord>>;
    async fn events_for_groups(&self, group_ids: &[GroupId]) -> StoreResult<Vec<EventRecord>>;

    async fn expenses_for_events(&self, event_ids: &[EventId]) -> StoreResult<Vec<ExpenseRecord>>;
    async fn expenses_for_user(&self, user_id: UserId) -> StoreResult<Vec<ExpenseRecord>>;

    async fn deposits_for_groups(&self, group_ids: &[GroupId]) -> StoreResult<Vec<DepositRecord>>;
    async fn deposits_for_user(&self, user_id: UserId) -> StoreResult<Vec<DepositRecord>>;
    async fn find_deposit(&self, deposit_id: &str) -> StoreResult<Option<DepositRecord>>;
    async fn insert_deposit(&self, deposit: &DepositRecord) -> StoreResult<()>;
    /// Returns false when no deposit has that id.
    async fn update_deposit_amount(&self, deposit_id: &str, amount: Decimal) -> StoreResult<bool>;
    /// Returns false when no deposit has that id.
    async fn delete_deposit(&self, deposit_id: &str) -> StoreResult<bool>;
}

pub async fn create_store(config: &StorageConfig) -> StoreResult<Arc<dyn FinanceStore>> {
    match config.backend {
        StorageBackend::Mongodb => {
            info!(database = %config.database, "Using MongoDB storage");
            let store = MongoStore::connect(&config.mongodb_uri, &config.database).await?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage, records are lost on restart");
            Ok(Arc::new(MemoryStore::new(MemoryData::default())))
        }
    }
}

/// Fetches members, expenses and deposits of every given group.
///
/// Expenses are attributed to the group owning their event. Rows of users
/// without a membership in that group are dropped.
pub async fn load_ledgers(
    store: &dyn FinanceStore,
    groups: &[Group],
) -> StoreResult<HashMap<GroupId, GroupLedger>> {
    let group_ids: Vec<GroupId> = groups.iter().map(|g| g.group_id).collect();
    let mut ledgers: HashMap<GroupId, GroupLedger> = group_ids
        .iter()
        .map(|id| (*id, GroupLedger::default()))
        .collect();
    if group_ids.is_empty() {
        return Ok(ledgers);
    }

    let (memberships, events, deposits) = futures::try_join!(
        store.memberships(&group_ids),
        store.events_for_groups(&group_ids),
        store.deposits_for_groups(&group_ids),
    )?;

    let event_groups: HashMap<EventId, GroupId> =
        events.iter().map(|e| (e.event_id, e.group_id)).collect();
    let event_ids: Vec<EventId> = event_groups.keys().copied().collect();
    let mut user_ids: Vec<UserId> = memberships.iter().map(|m| m.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();

    let (expenses, usernames) = futures::try_join!(
        store.expenses_for_events(&event_ids),
        store.usernames(&user_ids),
    )?;

    let members_of: HashSet<(GroupId, UserId)> =
        memberships.iter().map(|m| (m.group_id, m.user_id)).collect();

    for membership in memberships {
        if let Some(ledger) = ledgers.get_mut(&membership.group_id) {
            ledger.members.push(Member {
                user_id: membership.user_id,
                username: usernames
                    .get(&membership.user_id)
                    .cloned()
                    .unwrap_or_default(),
                role: membership.role,
            });
        }
    }

    let mut dropped = 0usize;
    for expense in expenses {
        let Some(&group_id) = event_groups.get(&expense.event_id) else {
            continue;
        };
        match ledgers.get_mut(&group_id) {
            Some(ledger) if members_of.contains(&(group_id, expense.user_id)) => {
                ledger.expenses.push(expense)
            }
            _ => dropped += 1,
        }
    }
    for deposit in deposits {
        match ledgers.get_mut(&deposit.group_id) {
            Some(ledger) if members_of.contains(&(deposit.group_id, deposit.user_id)) => {
                ledger.deposits.push(deposit)
            }
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!(?group_ids, dropped, "Ignoring finance rows of users outside their group");
    }

    Ok(ledgers)
}
