use crate::balance::{compute_balances, counts_towards, Balances};
use crate::currency::round_money;
use crate::schemas::{Expense, Group, MemberId};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::mem::swap;

#[derive(Clone, Debug)]
pub struct PersonalBalance {
    pub id: MemberId,
    pub balance: Decimal,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct UserPair {
    pub user1: MemberId,
    pub user2: MemberId,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Exchange {
    pub payer: MemberId,
    pub receiver: MemberId,
    pub amount: Decimal,
}

// The exchanges that will be made if no simplification happens
fn get_naive_exchanges(group: &Group, expenses: &[Expense]) -> Vec<Exchange> {
    let mut balances_between_people: HashMap<UserPair, Decimal> = HashMap::new();

    for expense in expenses {
        if !counts_towards(group, expense) || !group.is_member(&expense.paid_by) {
            continue;
        }
        let num_receivers = Decimal::from(expense.split_between.len());
        for receiver in &expense.split_between {
            if *receiver == expense.paid_by || !group.is_member(receiver) {
                continue;
            }
            let mut pair = UserPair {
                user1: expense.paid_by.clone(),
                user2: receiver.clone(),
            };
            let mut amount = expense.base_amount / num_receivers;

            // We use alphabetical order to ensure all the expenses regarding
            // the same users end up stored in the same direction
            if pair.user1 > pair.user2 {
                swap(&mut pair.user1, &mut pair.user2);
                amount = -amount;
            }

            *balances_between_people.entry(pair).or_default() += amount;
        }
    }

    // Calculate exchanges, now the ones that payed will be the receivers
    let mut exchanges = Vec::new();

    for (people_pair, balance) in balances_between_people {
        let amount = round_money(balance.abs());
        if amount.is_zero() {
            continue;
        }
        let mut payer = people_pair.user2;
        let mut receiver = people_pair.user1;
        // If the balance is smaller than zero we change the direction
        if balance.is_sign_negative() {
            swap(&mut payer, &mut receiver);
        }

        exchanges.push(Exchange {
            payer,
            receiver,
            amount,
        });
    }

    exchanges.sort_by(|a, b| (&a.payer, &a.receiver).cmp(&(&b.payer, &b.receiver)));
    exchanges
}

// Tries to simplify the number of exchanges by always matching the largest
// debt with the largest credit
fn get_simplified_exchanges(
    mut payers: Vec<PersonalBalance>,
    mut receivers: Vec<PersonalBalance>,
) -> Vec<Exchange> {
    let by_balance = |a: &PersonalBalance, b: &PersonalBalance| {
        a.balance.cmp(&b.balance).then_with(|| b.id.cmp(&a.id))
    };
    payers.sort_by(by_balance);
    receivers.sort_by(by_balance);

    let mut exchanges: Vec<Exchange> = Vec::new();

    // Rounded balances may leave a stray cent on one side
    while let (Some(payer), Some(receiver)) = (payers.last_mut(), receivers.last_mut()) {
        let amount = payer.balance.min(receiver.balance);
        exchanges.push(Exchange {
            payer: payer.id.clone(),
            receiver: receiver.id.clone(),
            amount,
        });
        payer.balance -= amount;
        receiver.balance -= amount;
        if payer.balance.is_zero() {
            payers.pop();
        }
        if receiver.balance.is_zero() {
            receivers.pop();
        }
    }
    exchanges
}

fn split_balances(balances: Balances) -> (Vec<PersonalBalance>, Vec<PersonalBalance>) {
    let mut payers = Vec::new();
    let mut receivers = Vec::new();

    for (id, balance) in balances {
        if balance.net.is_zero() {
            continue;
        }
        let person = PersonalBalance {
            id,
            balance: balance.net.abs(),
        };
        if balance.net.is_sign_negative() {
            payers.push(person);
        } else {
            receivers.push(person);
        }
    }
    (payers, receivers)
}

pub fn get_exchanges_from_group(group: &Group, expenses: &[Expense]) -> Vec<Exchange> {
    let (payers, receivers) = split_balances(compute_balances(group, expenses));

    let naive_exchanges = get_naive_exchanges(group, expenses);
    let simplified_exchanges = get_simplified_exchanges(payers, receivers);

    // We ensure the simplification didn't accidentally end up being
    // more complicated than the naive exchanges
    if simplified_exchanges.len() < naive_exchanges.len() {
        simplified_exchanges
    } else {
        naive_exchanges
    }
}
