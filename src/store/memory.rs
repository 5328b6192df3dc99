use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::FinanceStore;
use crate::error::StoreResult;
use crate::schemas::{
    DepositRecord, EventId, EventRecord, ExpenseRecord, Group, GroupId, Membership, Role, User,
    UserId,
};

/// Rows held by [`MemoryStore`], in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryData {
    pub users: Vec<User>,
    pub groups: Vec<Group>,
    pub memberships: Vec<Membership>,
    pub events: Vec<EventRecord>,
    pub expenses: Vec<ExpenseRecord>,
    pub deposits: Vec<DepositRecord>,
}

/// Process-local store for development and tests.
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    pub fn new(data: MemoryData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }
}

#[async_trait]
impl FinanceStore for MemoryStore {
    async fn find_group(&self, group_id: GroupId) -> StoreResult<Option<Group>> {
        let data = self.data.read().await;
        Ok(data.groups.iter().find(|g| g.group_id == group_id).cloned())
    }

    async fn groups(&self, group_ids: &[GroupId]) -> StoreResult<Vec<Group>> {
        let data = self.data.read().await;
        let mut groups: Vec<Group> = data
            .groups
            .iter()
            .filter(|g| group_ids.contains(&g.group_id))
            .cloned()
            .collect();
        groups.sort_by_key(|g| g.group_id);
        Ok(groups)
    }

    async fn admin_groups(&self, user_id: UserId) -> StoreResult<Vec<Group>> {
        let group_ids: Vec<GroupId> = {
            let data = self.data.read().await;
            data.memberships
                .iter()
                .filter(|m| m.user_id == user_id && m.role == Role::Admin)
                .map(|m| m.group_id)
                .collect()
        };
        self.groups(&group_ids).await
    }

    async fn role_in_group(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> StoreResult<Option<Role>> {
        let data = self.data.read().await;
        Ok(data
            .memberships
            .iter()
            .find(|m| m.user_id == user_id && m.group_id == group_id)
            .map(|m| m.role))
    }

    async fn memberships(&self, group_ids: &[GroupId]) -> StoreResult<Vec<Membership>> {
        let data = self.data.read().await;
        Ok(data
            .memberships
            .iter()
            .filter(|m| group_ids.contains(&m.group_id))
            .cloned()
            .collect())
    }

    async fn usernames(&self, user_ids: &[UserId]) -> StoreResult<HashMap<UserId, String>> {
        let data = self.data.read().await;
        Ok(data
            .users
            .iter()
            .filter(|u| user_ids.contains(&u.user_id))
            .map(|u| (u.user_id, u.username.clone()))
            .collect())
    }

    async fn find_event(&self, event_id: EventId) -> StoreResult<Option<EventRecord>> {
        let data = self.data.read().await;
        Ok(data.events.iter().find(|e| e.event_id == event_id).cloned())
    }

    async fn events_for_groups(&self, group_ids: &[GroupId]) -> StoreResult<Vec<EventRecord>> {
        let data = self.data.read().await;
        Ok(data
            .events
            .iter()
            .filter(|e| group_ids.contains(&e.group_id))
            .cloned()
            .collect())
    }

    async fn expenses_for_events(&self, event_ids: &[EventId]) -> StoreResult<Vec<ExpenseRecord>> {
        let data = self.data.read().await;
        Ok(data
            .expenses
            .iter()
            .filter(|e| event_ids.contains(&e.event_id))
            .cloned()
            .collect())
    }

    async fn expenses_for_user(&self, user_id: UserId) -> StoreResult<Vec<ExpenseRecord>> {
        let data = self.data.read().await;
        Ok(data
            .expenses
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn deposits_for_groups(&self, group_ids: &[GroupId]) -> StoreResult<Vec<DepositRecord>> {
        let data = self.data.read().await;
        Ok(data
            .deposits
            .iter()
            .filter(|d| group_ids.contains(&d.group_id))
            .cloned()
            .collect())
    }

    async fn deposits_for_user(&self, user_id: UserId) -> StoreResult<Vec<DepositRecord>> {
        let data = self.data.read().await;
        Ok(data
            .deposits
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_deposit(&self, deposit_id: &str) -> StoreResult<Option<DepositRecord>> {
        let data = self.data.read().await;
        Ok(data
            .deposits
            .iter()
            .find(|d| d.deposit_id == deposit_id)
            .cloned())
    }

    async fn insert_deposit(&self, deposit: &DepositRecord) -> StoreResult<()> {
        self.data.write().await.deposits.push(deposit.clone());
        Ok(())
    }

    async fn update_deposit_amount(&self, deposit_id: &str, amount: Decimal) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        match data.deposits.iter_mut().find(|d| d.deposit_id == deposit_id) {
            Some(deposit) => {
                deposit.amount = amount;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_deposit(&self, deposit_id: &str) -> StoreResult<bool> {
        let mut data = self.data.write().await;
        let before = data.deposits.len();
        data.deposits.retain(|d| d.deposit_id != deposit_id);
        Ok(data.deposits.len() < before)
    }
}
