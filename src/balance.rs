use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use tracing::warn;

use crate::schemas::{
    DepositRecord, ExpenseRecord, Group, GroupFinanceSummary, GroupId, GroupLedger,
    MasterFinanceSummary, Member, Role, Totals, UserFinanceSummary, UserId,
};

/// Rows of a single user within some scope.
#[derive(Default)]
struct UserRows<'a> {
    expenses: Vec<&'a ExpenseRecord>,
    deposits: Vec<&'a DepositRecord>,
}

fn sum_rows<'a>(
    user_id: UserId,
    expenses: impl IntoIterator<Item = &'a ExpenseRecord>,
    deposits: impl IntoIterator<Item = &'a DepositRecord>,
) -> Totals {
    let spent = expenses
        .into_iter()
        .inspect(|e| debug_assert_eq!(e.user_id, user_id, "expense row of another user"))
        .fold(Decimal::ZERO, |acc, e| acc + e.total_cost);
    let deposited = deposits
        .into_iter()
        .inspect(|d| debug_assert_eq!(d.user_id, user_id, "deposit row of another user"))
        .fold(Decimal::ZERO, |acc, d| acc + d.amount);
    Totals::new(spent, deposited)
}

pub fn compute_user_summary<'a>(
    member: &Member,
    expenses: impl IntoIterator<Item = &'a ExpenseRecord>,
    deposits: impl IntoIterator<Item = &'a DepositRecord>,
) -> UserFinanceSummary {
    UserFinanceSummary {
        user_id: member.user_id,
        username: member.username.clone(),
        role: member.role,
        totals: sum_rows(member.user_id, expenses, deposits),
    }
}

/// Summarizes one group.
///
/// Rows are partitioned by user in a single pass, then every member is
/// summarized in membership order. Members without rows get zero totals.
/// The group aggregate is the sum of the per-user summaries.
pub fn compute_group_summary(
    group: &Group,
    members: &[Member],
    expenses: &[ExpenseRecord],
    deposits: &[DepositRecord],
) -> GroupFinanceSummary {
    let mut rows: HashMap<UserId, UserRows> = HashMap::with_capacity(members.len());
    for expense in expenses {
        rows.entry(expense.user_id).or_default().expenses.push(expense);
    }
    for deposit in deposits {
        debug_assert_eq!(
            deposit.group_id, group.group_id,
            "deposit row of another group"
        );
        rows.entry(deposit.user_id).or_default().deposits.push(deposit);
    }

    let mut seen = HashSet::with_capacity(members.len());
    let users: Vec<UserFinanceSummary> = members
        .iter()
        .filter(|member| seen.insert(member.user_id))
        .map(|member| {
            let user_rows = rows.remove(&member.user_id).unwrap_or_default();
            compute_user_summary(member, user_rows.expenses, user_rows.deposits)
        })
        .collect();

    if !rows.is_empty() {
        let strangers: Vec<UserId> = rows.keys().copied().collect();
        warn!(
            group_id = group.group_id,
            ?strangers,
            "rows of users without membership left out of group summary"
        );
    }
    debug_assert!(
        rows.is_empty(),
        "rows of non-members passed for group {}",
        group.group_id
    );

    GroupFinanceSummary {
        group_id: group.group_id,
        group_name: group.group_name.clone(),
        aggregate: users.iter().map(|u| &u.totals).sum(),
        users,
    }
}

/// Summarizes every group administered by `principal`.
///
/// A group with no entry in `ledgers` is summarized as empty. No admin
/// groups yields the zero summary.
pub fn compute_master_summary(
    principal: UserId,
    admin_groups: &[Group],
    ledgers: &HashMap<GroupId, GroupLedger>,
) -> MasterFinanceSummary {
    let empty = GroupLedger::default();
    let groups: Vec<GroupFinanceSummary> = admin_groups
        .iter()
        .map(|group| {
            let ledger = ledgers.get(&group.group_id).unwrap_or(&empty);
            let is_admin = ledger
                .members
                .iter()
                .any(|m| m.user_id == principal && m.role == Role::Admin);
            if !ledger.members.is_empty() && !is_admin {
                // Membership can change between the admin lookup and the ledger reads.
                warn!(
                    principal,
                    group_id = group.group_id,
                    "principal no longer admin of a summarized group"
                );
            }
            compute_group_summary(group, &ledger.members, &ledger.expenses, &ledger.deposits)
        })
        .collect();

    MasterFinanceSummary {
        aggregate: groups.iter().map(|g| &g.aggregate).sum(),
        groups,
    }
}

/// A user's totals across every group they belong to.
pub fn compute_personal_summary(
    user_id: UserId,
    expenses: &[ExpenseRecord],
    deposits: &[DepositRecord],
) -> Totals {
    sum_rows(user_id, expenses, deposits)
}
