use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::Add;

pub type UserId = i64;
pub type GroupId = i64;
pub type EventId = i64;
pub type ExpenseId = i64;
pub type DepositId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Group {
    pub group_id: GroupId,
    pub group_name: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Membership {
    pub user_id: UserId,
    pub group_id: GroupId,
    pub role: Role,
}

/// A group member as the aggregator sees it: identity plus role within the group.
#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct EventRecord {
    pub event_id: EventId,
    pub event_name: String,
    pub location_name: String,
    pub group_id: GroupId,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ExpenseRecord {
    pub expense_id: ExpenseId,
    pub user_id: UserId,
    pub event_id: EventId,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_cost: Decimal,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub expense_timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct DepositRecord {
    pub deposit_id: DepositId,
    pub user_id: UserId,
    pub group_id: GroupId,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub deposit_timestamp: DateTime<Utc>,
}

/// Spent, deposited and the balance between them.
///
/// `balance` is only ever produced by [`Totals::new`] or by summing other
/// `Totals`, so `balance == total_deposited - total_spent` holds for every value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_spent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_deposited: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

impl Totals {
    pub fn new(total_spent: Decimal, total_deposited: Decimal) -> Self {
        Self {
            total_spent,
            total_deposited,
            balance: total_deposited - total_spent,
        }
    }
}

impl Add for Totals {
    type Output = Totals;

    fn add(self, other: Totals) -> Totals {
        Totals {
            total_spent: self.total_spent + other.total_spent,
            total_deposited: self.total_deposited + other.total_deposited,
            balance: self.balance + other.balance,
        }
    }
}

impl Sum for Totals {
    fn sum<I: Iterator<Item = Totals>>(iter: I) -> Self {
        iter.fold(Totals::default(), Add::add)
    }
}

impl<'a> Sum<&'a Totals> for Totals {
    fn sum<I: Iterator<Item = &'a Totals>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserFinanceSummary {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
    #[serde(flatten)]
    pub totals: Totals,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupFinanceSummary {
    pub group_id: GroupId,
    pub group_name: String,
    #[serde(rename = "groupSummary")]
    pub aggregate: Totals,
    #[serde(rename = "userSummaries")]
    pub users: Vec<UserFinanceSummary>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MasterFinanceSummary {
    #[serde(rename = "masterSummary")]
    pub aggregate: Totals,
    #[serde(rename = "groupSummaries")]
    pub groups: Vec<GroupFinanceSummary>,
}

/// Everything needed to summarize one group, as fetched from storage.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupLedger {
    pub members: Vec<Member>,
    pub expenses: Vec<ExpenseRecord>,
    pub deposits: Vec<DepositRecord>,
}
