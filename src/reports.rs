use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::schemas::{
    DepositId, DepositRecord, EventId, EventRecord, ExpenseId, ExpenseRecord, Group, GroupId,
    UserId,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventExpenseSummary {
    pub event_id: EventId,
    pub event_name: String,
    pub location_name: String,
    pub group_name: String,
    pub total_quantity: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_expense: Decimal,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExpenseDetail {
    pub expense_id: ExpenseId,
    pub username: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cost: Decimal,
    pub expense_timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DepositListing {
    pub deposit_id: DepositId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub deposit_timestamp: DateTime<Utc>,
    pub user_id: UserId,
    pub username: String,
    pub group_id: GroupId,
    pub group_name: String,
}

// Most recently updated first; events nobody paid for go last.
fn by_recency(a: &EventExpenseSummary, b: &EventExpenseSummary) -> Ordering {
    match (a.last_updated, b.last_updated) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Per-event quantity and cost totals over the given events.
pub fn summarize_events(
    events: &[EventRecord],
    groups: &[Group],
    expenses: &[ExpenseRecord],
) -> Vec<EventExpenseSummary> {
    let group_names: HashMap<GroupId, &str> = groups
        .iter()
        .map(|g| (g.group_id, g.group_name.as_str()))
        .collect();

    let mut by_event: HashMap<EventId, (u64, Decimal, Option<DateTime<Utc>>)> = HashMap::new();
    for expense in expenses {
        let entry = by_event
            .entry(expense.event_id)
            .or_insert((0, Decimal::ZERO, None));
        entry.0 += u64::from(expense.quantity);
        entry.1 += expense.total_cost;
        entry.2 = entry.2.max(Some(expense.expense_timestamp));
    }

    let mut summaries: Vec<EventExpenseSummary> = events
        .iter()
        .map(|event| {
            let (total_quantity, total_expense, last_updated) = by_event
                .get(&event.event_id)
                .copied()
                .unwrap_or((0, Decimal::ZERO, None));
            EventExpenseSummary {
                event_id: event.event_id,
                event_name: event.event_name.clone(),
                location_name: event.location_name.clone(),
                group_name: group_names
                    .get(&event.group_id)
                    .map(|name| name.to_string())
                    .unwrap_or_default(),
                total_quantity,
                total_expense,
                last_updated,
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        by_recency(a, b)
            .then_with(|| a.group_name.cmp(&b.group_name))
            .then_with(|| a.event_name.cmp(&b.event_name))
    });
    summaries
}

/// Individual expenses of one event, newest first.
pub fn expense_details(
    event_id: EventId,
    expenses: &[ExpenseRecord],
    usernames: &HashMap<UserId, String>,
) -> Vec<ExpenseDetail> {
    let mut details: Vec<ExpenseDetail> = expenses
        .iter()
        .filter(|e| e.event_id == event_id)
        .map(|e| ExpenseDetail {
            expense_id: e.expense_id,
            username: usernames.get(&e.user_id).cloned().unwrap_or_default(),
            quantity: e.quantity,
            total_cost: e.total_cost,
            expense_timestamp: e.expense_timestamp,
        })
        .collect();
    details.sort_by(|a, b| b.expense_timestamp.cmp(&a.expense_timestamp));
    details
}

pub fn list_deposits(
    deposits: &[DepositRecord],
    usernames: &HashMap<UserId, String>,
    groups: &[Group],
) -> Vec<DepositListing> {
    let group_names: HashMap<GroupId, &str> = groups
        .iter()
        .map(|g| (g.group_id, g.group_name.as_str()))
        .collect();

    let mut listings: Vec<DepositListing> = deposits
        .iter()
        .map(|d| DepositListing {
            deposit_id: d.deposit_id.clone(),
            amount: d.amount,
            deposit_timestamp: d.deposit_timestamp,
            user_id: d.user_id,
            username: usernames.get(&d.user_id).cloned().unwrap_or_default(),
            group_id: d.group_id,
            group_name: group_names
                .get(&d.group_id)
                .map(|name| name.to_string())
                .unwrap_or_default(),
        })
        .collect();
    listings.sort_by(|a, b| b.deposit_timestamp.cmp(&a.deposit_timestamp));
    listings
}
