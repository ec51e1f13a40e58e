use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::currency::{round_money, MAX_AMOUNT};
use crate::schemas::{Expense, Group, MemberId};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Balance {
    pub display_name: String,
    pub total_paid: Decimal,
    pub total_owed: Decimal,
    pub net: Decimal,
}

pub type Balances = HashMap<MemberId, Balance>;

// Largest lcm the totals are scaled by. Above it shares are divided directly.
const MAX_DENOMINATOR: u64 = 1_000_000_000_000;

/// Running totals multiplied by a denominator shared by every expense, which
/// keeps each share an exact multiple instead of a rounded quotient.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Tally {
    paid: Decimal,
    owed: Decimal,
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Least common multiple of every split size, or 1 if it grows too large.
fn common_denominator(expenses: &[Expense]) -> u64 {
    let mut denominator: u64 = 1;
    for expense in expenses {
        let size = expense.split_between.len() as u64;
        if size == 0 {
            continue;
        }
        match (denominator / gcd(denominator, size)).checked_mul(size) {
            Some(lcm) if lcm <= MAX_DENOMINATOR => denominator = lcm,
            _ => return 1,
        }
    }
    denominator
}

/// Whether a stored expense takes part in the balances of `group`. Records
/// that could never have passed validation are left out.
pub(crate) fn counts_towards(group: &Group, expense: &Expense) -> bool {
    expense.group_id == group.id
        && !expense.split_between.is_empty()
        && expense.base_amount >= Decimal::ZERO
        && expense.base_amount <= Decimal::from(MAX_AMOUNT)
}

/// Adds every expense scaled by `denominator`. An expense whose totals would
/// overflow is left out as a whole, and counted in the second value.
fn tally(
    group: &Group,
    expenses: &[Expense],
    denominator: Decimal,
) -> (HashMap<MemberId, Tally>, usize) {
    let mut tallies: HashMap<MemberId, Tally> = group
        .members
        .iter()
        .map(|m| (m.member_id.clone(), Tally::default()))
        .collect();
    let mut skipped = 0;

    for expense in expenses {
        if !counts_towards(group, expense) {
            continue;
        }
        let Some(paid) = expense.base_amount.checked_mul(denominator) else {
            skipped += 1;
            continue;
        };
        let share = paid / Decimal::from(expense.split_between.len());

        // Members who have left the group are not part of the result, so
        // whatever they paid or owe is dropped.
        let mut deltas: HashMap<&str, Tally> = HashMap::new();
        if tallies.contains_key(&expense.paid_by) {
            deltas.entry(expense.paid_by.as_str()).or_default().paid += paid;
        }
        for receiver in &expense.split_between {
            if tallies.contains_key(receiver) {
                deltas.entry(receiver.as_str()).or_default().owed += share;
            }
        }

        let updated: Option<Vec<(&str, Tally)>> = deltas
            .into_iter()
            .map(|(id, delta)| {
                let current = tallies[id];
                Some((
                    id,
                    Tally {
                        paid: current.paid.checked_add(delta.paid)?,
                        owed: current.owed.checked_add(delta.owed)?,
                    },
                ))
            })
            .collect();
        match updated {
            Some(updated) => {
                for (id, tally) in updated {
                    if let Some(entry) = tallies.get_mut(id) {
                        *entry = tally;
                    }
                }
            }
            None => skipped += 1,
        }
    }
    (tallies, skipped)
}

/// Tallies with the common denominator, retrying unscaled if that overflows.
fn exact_tally(group: &Group, expenses: &[Expense]) -> (Decimal, HashMap<MemberId, Tally>) {
    let mut denominator = Decimal::from(common_denominator(expenses));
    let (mut tallies, mut skipped) = tally(group, expenses, denominator);
    if skipped > 0 && denominator != Decimal::ONE {
        denominator = Decimal::ONE;
        (tallies, skipped) = tally(group, expenses, denominator);
    }
    if skipped > 0 {
        tracing::warn!(group_id = %group.id, skipped, "expenses too large to tally were left out");
    }
    (denominator, tallies)
}

/// Net position of every current member of `group` over `expenses`.
pub fn compute_balances(group: &Group, expenses: &[Expense]) -> Balances {
    let (denominator, tallies) = exact_tally(group, expenses);
    group
        .members
        .iter()
        .map(|member| {
            let tally = tallies[&member.member_id];
            let balance = Balance {
                display_name: member.display_name.clone(),
                total_paid: round_money(tally.paid / denominator),
                total_owed: round_money(tally.owed / denominator),
                net: round_money((tally.paid - tally.owed) / denominator),
            };
            (member.member_id.clone(), balance)
        })
        .collect()
}
