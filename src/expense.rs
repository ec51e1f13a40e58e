//! Validation and normalization of expenses before they reach the store.
//!
//! Every write goes through [`Draft::validate`], so the stored `base_amount`
//! is always derived from the stored amount and rate.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::currency::{self, Rate};
use crate::error::{LedgerError, LedgerResult, ValidationError};
use crate::group::trimmed;
use crate::schemas::{Expense, ExpenseType, ExpenseUpdate, Group, MemberId, NewExpense};

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 1000;

/// The client controlled part of an expense.
struct Draft {
    title: String,
    amount: Decimal,
    currency: String,
    conversion_rate: Option<Decimal>,
    expense_type: ExpenseType,
    description: Option<String>,
    paid_by: MemberId,
    split_between: Vec<MemberId>,
}

/// A draft that passed validation, with its base amount computed.
struct Valid {
    draft: Draft,
    rate: Rate,
    base_amount: Decimal,
}

impl Draft {
    fn validate(mut self, group: &Group, base_currency: &str) -> Result<Valid, ValidationError> {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::TitleTooLong(MAX_TITLE_LEN));
        }
        self.description = trimmed(self.description);
        if self
            .description
            .as_ref()
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN)
        {
            return Err(ValidationError::DescriptionTooLong(MAX_DESCRIPTION_LEN));
        }
        if self.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount);
        }
        if self.amount > Decimal::from(currency::MAX_AMOUNT) {
            return Err(ValidationError::AmountTooLarge(currency::MAX_AMOUNT));
        }
        self.currency = currency::parse_code(&self.currency)?;
        let rate = currency::resolve_rate(&self.currency, self.conversion_rate, base_currency)?;

        if !group.is_member(&self.paid_by) {
            return Err(ValidationError::PayerNotMember(self.paid_by));
        }
        if self.split_between.is_empty() {
            return Err(ValidationError::EmptySplit);
        }
        let mut seen = HashSet::new();
        for member in &self.split_between {
            if !seen.insert(member) {
                return Err(ValidationError::DuplicateSplitMember(member.clone()));
            }
        }
        if let Some(outsider) = self.split_between.iter().find(|m| !group.is_member(m)) {
            return Err(ValidationError::SplitMemberNotInGroup(outsider.clone()));
        }

        let base_amount = currency::normalize(self.amount, rate)?;
        Ok(Valid {
            draft: self,
            rate,
            base_amount,
        })
    }
}

impl From<&Expense> for Draft {
    fn from(expense: &Expense) -> Self {
        Draft {
            title: expense.title.clone(),
            amount: expense.amount,
            currency: expense.currency.clone(),
            conversion_rate: Some(expense.conversion_rate),
            expense_type: expense.expense_type,
            description: expense.description.clone(),
            paid_by: expense.paid_by.clone(),
            split_between: expense.split_between.clone(),
        }
    }
}

impl Valid {
    fn write_into(self, expense: &mut Expense) {
        let Valid {
            draft,
            rate,
            base_amount,
        } = self;
        expense.title = draft.title;
        expense.amount = draft.amount;
        expense.currency = draft.currency;
        expense.conversion_rate = rate.stored();
        expense.base_amount = base_amount;
        expense.expense_type = draft.expense_type;
        expense.description = draft.description;
        expense.paid_by = draft.paid_by;
        expense.split_between = draft.split_between;
    }
}

/// Builds a new expense in `group` on behalf of `actor`.
pub fn create_expense(
    id: String,
    group: &Group,
    actor: &str,
    input: NewExpense,
    base_currency: &str,
    now: DateTime<Utc>,
) -> LedgerResult<Expense> {
    group.require_member(actor)?;
    let valid = Draft {
        title: input.title,
        amount: input.amount,
        currency: input.currency.unwrap_or_else(|| base_currency.to_string()),
        conversion_rate: input.conversion_rate,
        expense_type: input.expense_type,
        description: input.description,
        paid_by: input.paid_by,
        split_between: input.split_between,
    }
    .validate(group, base_currency)?;

    let mut expense = Expense {
        id,
        title: String::new(),
        amount: Decimal::ZERO,
        currency: String::new(),
        conversion_rate: Decimal::ONE,
        base_amount: Decimal::ZERO,
        expense_type: ExpenseType::Other,
        description: None,
        group_id: group.id.clone(),
        paid_by: String::new(),
        split_between: Vec::new(),
        created_by: actor.to_string(),
        created_at: now,
        updated_at: now,
    };
    valid.write_into(&mut expense);
    Ok(expense)
}

/// Only the creator or the payer of an expense may change it.
pub fn authorize_modification(expense: &Expense, group: &Group, actor: &str) -> LedgerResult<()> {
    group.require_member(actor)?;
    if expense.group_id != group.id {
        return Err(LedgerError::NotFound("Expense".into()));
    }
    if expense.created_by != actor && expense.paid_by != actor {
        return Err(LedgerError::Forbidden(
            "only the creator or the payer can change this expense".into(),
        ));
    }
    Ok(())
}

/// Returns the updated expense; `expense` itself is left untouched.
pub fn update_expense(
    expense: &Expense,
    group: &Group,
    actor: &str,
    patch: ExpenseUpdate,
    base_currency: &str,
    now: DateTime<Utc>,
) -> LedgerResult<Expense> {
    authorize_modification(expense, group, actor)?;

    let mut draft = Draft::from(expense);
    if let Some(title) = patch.title {
        draft.title = title;
    }
    if let Some(amount) = patch.amount {
        draft.amount = amount;
    }
    if let Some(currency) = patch.currency {
        draft.currency = currency;
        // A new currency without a new rate falls back to the neutral rate
        // rather than silently reusing the old currency's rate.
        if patch.conversion_rate.is_none() {
            draft.conversion_rate = None;
        }
    }
    if let Some(rate) = patch.conversion_rate {
        draft.conversion_rate = Some(rate);
    }
    if let Some(expense_type) = patch.expense_type {
        draft.expense_type = expense_type;
    }
    if let Some(description) = patch.description {
        draft.description = Some(description);
    }
    if let Some(paid_by) = patch.paid_by {
        draft.paid_by = paid_by;
    }
    if let Some(split) = patch.split_between {
        draft.split_between = split;
    }

    let valid = draft.validate(group, base_currency)?;
    let mut updated = expense.clone();
    valid.write_into(&mut updated);
    updated.updated_at = now;
    Ok(updated)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::group::tests::group_of;
    use rust_decimal_macros::dec;

    pub fn new_expense(amount: Decimal, paid_by: &str, split: &[&str]) -> NewExpense {
        NewExpense {
            title: "Dinner".into(),
            amount,
            currency: Some("EUR".into()),
            conversion_rate: Some(dec!(0.85)),
            expense_type: ExpenseType::Food,
            description: None,
            group: "g1".into(),
            paid_by: paid_by.into(),
            split_between: split.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn create(group: &Group, input: NewExpense) -> LedgerResult<Expense> {
        create_expense("e1".into(), group, "alice", input, "GBP", Utc::now())
    }

    #[test]
    fn base_amount_is_computed_on_creation() {
        let group = group_of(&["alice", "bob"]);
        let expense = create(&group, new_expense(dec!(100), "alice", &["alice", "bob"])).unwrap();

        assert_eq!(expense.base_amount, dec!(85.00));
        assert_eq!(expense.amount, dec!(100));
        assert_eq!(expense.currency, "EUR");
        assert_eq!(expense.conversion_rate, dec!(0.85));
        assert_eq!(expense.paid_by, "alice");
        assert_eq!(expense.split_between, vec!["alice", "bob"]);
        assert_eq!(expense.created_by, "alice");
        assert_eq!(expense.group_id, "g1");
    }

    #[test]
    fn missing_currency_means_base_currency() {
        let group = group_of(&["alice"]);
        let mut input = new_expense(dec!(12.5), "alice", &["alice"]);
        input.currency = None;
        input.conversion_rate = None;

        let expense = create(&group, input).unwrap();
        assert_eq!(expense.currency, "GBP");
        assert_eq!(expense.conversion_rate, Decimal::ONE);
        assert_eq!(expense.base_amount, dec!(12.50));
    }

    #[test]
    fn first_failing_precondition_is_reported() {
        let group = group_of(&["alice", "bob"]);

        let mut input = new_expense(dec!(0), "carol", &[]);
        input.title = "  ".into();
        assert_eq!(create(&group, input), Err(ValidationError::MissingTitle.into()));

        let input = new_expense(dec!(0), "carol", &[]);
        assert_eq!(
            create(&group, input),
            Err(ValidationError::NonPositiveAmount.into())
        );

        let input = new_expense(dec!(10), "carol", &[]);
        assert_eq!(
            create(&group, input),
            Err(ValidationError::PayerNotMember("carol".into()).into())
        );

        let input = new_expense(dec!(10), "alice", &[]);
        assert_eq!(create(&group, input), Err(ValidationError::EmptySplit.into()));

        let input = new_expense(dec!(10), "alice", &["bob", "bob"]);
        assert_eq!(
            create(&group, input),
            Err(ValidationError::DuplicateSplitMember("bob".into()).into())
        );

        let input = new_expense(dec!(10), "alice", &["bob", "carol"]);
        assert_eq!(
            create(&group, input),
            Err(ValidationError::SplitMemberNotInGroup("carol".into()).into())
        );
    }

    #[test]
    fn rejects_negative_rates_and_oversized_input() {
        let group = group_of(&["alice"]);

        let mut input = new_expense(dec!(10), "alice", &["alice"]);
        input.conversion_rate = Some(dec!(-1));
        assert_eq!(create(&group, input), Err(ValidationError::NegativeRate.into()));

        let mut input = new_expense(dec!(10), "alice", &["alice"]);
        input.title = "t".repeat(201);
        assert_eq!(
            create(&group, input),
            Err(ValidationError::TitleTooLong(200).into())
        );

        let input = new_expense(dec!(1000000001), "alice", &["alice"]);
        assert_eq!(
            create(&group, input),
            Err(ValidationError::AmountTooLarge(1_000_000_000).into())
        );
    }

    #[test]
    fn converted_amounts_stay_in_range() {
        let group = group_of(&["alice"]);

        let mut input = new_expense(dec!(1000000000), "alice", &["alice"]);
        input.conversion_rate = Some(dec!(50000000000000000000));
        assert_eq!(
            create(&group, input),
            Err(ValidationError::RateTooLarge(1_000_000).into())
        );

        let mut input = new_expense(dec!(1000000000), "alice", &["alice"]);
        input.conversion_rate = Some(dec!(999999));
        assert_eq!(
            create(&group, input),
            Err(ValidationError::BaseAmountTooLarge(1_000_000_000).into())
        );

        let mut input = new_expense(dec!(12.34), "alice", &["alice"]);
        input.conversion_rate = Some(dec!(1.1111111111111111111111111111));
        let expense = create(&group, input).unwrap();
        assert_eq!(expense.base_amount, dec!(13.71));
        assert_eq!(expense.conversion_rate, dec!(1.1111111111111111111111111111));
    }

    #[test]
    fn updates_cannot_push_the_rate_out_of_range() {
        let group = group_of(&["alice"]);
        let expense = create(&group, new_expense(dec!(100), "alice", &["alice"])).unwrap();
        let patch = ExpenseUpdate {
            conversion_rate: Some(dec!(5000000)),
            ..Default::default()
        };
        assert_eq!(
            update_expense(&expense, &group, "alice", patch, "GBP", Utc::now()),
            Err(ValidationError::RateTooLarge(1_000_000).into())
        );
    }

    #[test]
    fn outsiders_cannot_create_expenses() {
        let group = group_of(&["alice", "bob"]);
        let result = create_expense(
            "e1".into(),
            &group,
            "mallory",
            new_expense(dec!(10), "alice", &["alice"]),
            "GBP",
            Utc::now(),
        );
        assert!(matches!(result, Err(LedgerError::Forbidden(_))));
    }

    #[test]
    fn updates_recompute_the_base_amount() {
        let group = group_of(&["alice", "bob"]);
        let expense = create(&group, new_expense(dec!(100), "alice", &["alice", "bob"])).unwrap();

        let patch = ExpenseUpdate {
            amount: Some(dec!(40)),
            ..Default::default()
        };
        let updated = update_expense(&expense, &group, "alice", patch, "GBP", Utc::now()).unwrap();
        assert_eq!(updated.base_amount, dec!(34.00));

        let patch = ExpenseUpdate {
            conversion_rate: Some(dec!(1.17)),
            ..Default::default()
        };
        let updated = update_expense(&updated, &group, "alice", patch, "GBP", Utc::now()).unwrap();
        assert_eq!(updated.base_amount, dec!(46.80));
        assert_eq!(updated.created_at, expense.created_at);
    }

    #[test]
    fn switching_to_the_base_currency_drops_the_rate() {
        let group = group_of(&["alice"]);
        let expense = create(&group, new_expense(dec!(100), "alice", &["alice"])).unwrap();

        let patch = ExpenseUpdate {
            currency: Some("gbp".into()),
            ..Default::default()
        };
        let updated = update_expense(&expense, &group, "alice", patch, "GBP", Utc::now()).unwrap();
        assert_eq!(updated.currency, "GBP");
        assert_eq!(updated.conversion_rate, Decimal::ONE);
        assert_eq!(updated.base_amount, dec!(100.00));
    }

    #[test]
    fn invalid_updates_leave_the_expense_alone() {
        let group = group_of(&["alice", "bob"]);
        let expense = create(&group, new_expense(dec!(100), "alice", &["alice", "bob"])).unwrap();
        let before = expense.clone();

        let patch = ExpenseUpdate {
            split_between: Some(vec!["carol".into()]),
            ..Default::default()
        };
        assert_eq!(
            update_expense(&expense, &group, "alice", patch, "GBP", Utc::now()),
            Err(ValidationError::SplitMemberNotInGroup("carol".into()).into())
        );
        assert_eq!(expense, before);
    }

    #[test]
    fn only_creator_or_payer_may_modify() {
        let group = group_of(&["alice", "bob", "carol"]);
        let mut input = new_expense(dec!(30), "bob", &["alice", "bob", "carol"]);
        input.conversion_rate = Some(dec!(2));
        let expense = create(&group, input).unwrap();

        assert!(authorize_modification(&expense, &group, "alice").is_ok());
        assert!(authorize_modification(&expense, &group, "bob").is_ok());
        assert!(matches!(
            authorize_modification(&expense, &group, "carol"),
            Err(LedgerError::Forbidden(_))
        ));
        assert!(matches!(
            update_expense(&expense, &group, "carol", ExpenseUpdate::default(), "GBP", Utc::now()),
            Err(LedgerError::Forbidden(_))
        ));
    }
}
