use std::collections::HashMap;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::FindOptions,
    Client, Collection, Database,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::info;

use super::FinanceStore;
use crate::error::StoreResult;
use crate::schemas::{
    DepositRecord, EventId, EventRecord, ExpenseRecord, Group, GroupId, Membership, Role, User,
    UserId,
};

pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> StoreResult<Self> {
        let client = Client::with_uri_str(uri).await?;
        info!("Connected to MongoDB");
        Ok(Self {
            database: client.database(database),
        })
    }

    fn users(&self) -> Collection<User> {
        self.database.collection("Users")
    }

    fn groups_collection(&self) -> Collection<Group> {
        self.database.collection("Groups")
    }

    fn memberships_collection(&self) -> Collection<Membership> {
        self.database.collection("UsersGroups")
    }

    fn events(&self) -> Collection<EventRecord> {
        self.database.collection("Events")
    }

    fn expenses(&self) -> Collection<ExpenseRecord> {
        self.database.collection("Expenses")
    }

    fn deposits(&self) -> Collection<DepositRecord> {
        self.database.collection("Deposits")
    }
}

async fn find_all<T>(
    collection: Collection<T>,
    filter: Document,
    sort: Document,
) -> StoreResult<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let options = FindOptions::builder().sort(sort).build();
    let rows = collection
        .find(filter, options)
        .await?
        .try_collect()
        .await?;
    Ok(rows)
}

#[async_trait]
impl FinanceStore for MongoStore {
    async fn find_group(&self, group_id: GroupId) -> StoreResult<Option<Group>> {
        Ok(self
            .groups_collection()
            .find_one(doc! { "group_id": group_id }, None)
            .await?)
    }

    async fn groups(&self, group_ids: &[GroupId]) -> StoreResult<Vec<Group>> {
        find_all(
            self.groups_collection(),
            doc! { "group_id": { "$in": group_ids.to_vec() } },
            doc! { "group_id": 1 },
        )
        .await
    }

    async fn admin_groups(&self, user_id: UserId) -> StoreResult<Vec<Group>> {
        let memberships = find_all(
            self.memberships_collection(),
            doc! { "user_id": user_id, "role": "admin" },
            doc! { "_id": 1 },
        )
        .await?;
        let group_ids: Vec<GroupId> = memberships.iter().map(|m| m.group_id).collect();
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.groups(&group_ids).await
    }

    async fn role_in_group(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> StoreResult<Option<Role>> {
        let membership = self
            .memberships_collection()
            .find_one(doc! { "user_id": user_id, "group_id": group_id }, None)
            .await?;
        Ok(membership.map(|m| m.role))
    }

    async fn memberships(&self, group_ids: &[GroupId]) -> StoreResult<Vec<Membership>> {
        find_all(
            self.memberships_collection(),
            doc! { "group_id": { "$in": group_ids.to_vec() } },
            doc! { "_id": 1 },
        )
        .await
    }

    async fn usernames(&self, user_ids: &[UserId]) -> StoreResult<HashMap<UserId, String>> {
        let users = find_all(
            self.users(),
            doc! { "user_id": { "$in": user_ids.to_vec() } },
            doc! { "user_id": 1 },
        )
        .await?;
        Ok(users.into_iter().map(|u| (u.user_id, u.username)).collect())
    }

    async fn find_event(&self, event_id: EventId) -> StoreResult<Option<EventRecord>> {
        Ok(self
            .events()
            .find_one(doc! { "event_id": event_id }, None)
            .await?)
    }

    async fn events_for_groups(&self, group_ids: &[GroupId]) -> StoreResult<Vec<EventRecord>> {
        find_all(
            self.events(),
            doc! { "group_id": { "$in": group_ids.to_vec() } },
            doc! { "event_id": 1 },
        )
        .await
    }

    async fn expenses_for_events(&self, event_ids: &[EventId]) -> StoreResult<Vec<ExpenseRecord>> {
        find_all(
            self.expenses(),
            doc! { "event_id": { "$in": event_ids.to_vec() } },
            doc! { "expense_id": 1 },
        )
        .await
    }

    async fn expenses_for_user(&self, user_id: UserId) -> StoreResult<Vec<ExpenseRecord>> {
        find_all(
            self.expenses(),
            doc! { "user_id": user_id },
            doc! { "expense_id": 1 },
        )
        .await
    }

    async fn deposits_for_groups(&self, group_ids: &[GroupId]) -> StoreResult<Vec<DepositRecord>> {
        find_all(
            self.deposits(),
            doc! { "group_id": { "$in": group_ids.to_vec() } },
            doc! { "_id": 1 },
        )
        .await
    }

    async fn deposits_for_user(&self, user_id: UserId) -> StoreResult<Vec<DepositRecord>> {
        find_all(
            self.deposits(),
            doc! { "user_id": user_id },
            doc! { "_id": 1 },
        )
        .await
    }

    async fn find_deposit(&self, deposit_id: &str) -> StoreResult<Option<DepositRecord>> {
        Ok(self
            .deposits()
            .find_one(doc! { "deposit_id": deposit_id }, None)
            .await?)
    }

    async fn insert_deposit(&self, deposit: &DepositRecord) -> StoreResult<()> {
        self.deposits().insert_one(deposit, None).await?;
        Ok(())
    }

    async fn update_deposit_amount(&self, deposit_id: &str, amount: Decimal) -> StoreResult<bool> {
        let result = self
            .deposits()
            .update_one(
                doc! { "deposit_id": deposit_id },
                doc! { "$set": { "amount": amount.to_string() } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_deposit(&self, deposit_id: &str) -> StoreResult<bool> {
        let result = self
            .deposits()
            .delete_one(doc! { "deposit_id": deposit_id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }
}
