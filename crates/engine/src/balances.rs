//! Net balance aggregation.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::{EngineError, Expense, Group, Money, ResultEngine, util::ensure_group_currency};

/// Computes each member's net balance: what they paid minus what they owe.
///
/// Every roster member appears in the result, with zero when no expense
/// touches them. Balances sum to zero across the group because every paid
/// amount is matched by the participant shares of the same expense (within
/// the one-minor-unit authoring tolerance).
///
/// The whole expense snapshot is replayed on every call; callers that cache
/// the result must invalidate it on every expense mutation.
///
/// An expense referencing a member outside the roster aborts the whole
/// aggregation with [`EngineError::UnknownMember`]: skipping it would
/// silently break the zero-sum invariant.
pub fn compute_balances(
    group: &Group,
    expenses: &[Expense],
) -> ResultEngine<HashMap<Uuid, Money>> {
    let mut balances: HashMap<Uuid, Money> = group
        .members
        .iter()
        .map(|member| (member.id, Money::ZERO))
        .collect();

    for expense in expenses {
        if expense.group_id != group.id {
            return Err(EngineError::KeyNotFound("expense not exists".to_string()));
        }
        ensure_group_currency(group.currency, expense.currency)?;

        let paid = balances
            .get_mut(&expense.paid_by)
            .ok_or(EngineError::UnknownMember(expense.paid_by))?;
        *paid += expense.amount;

        for participant in &expense.participants {
            let owed = balances
                .get_mut(&participant.member_id)
                .ok_or(EngineError::UnknownMember(participant.member_id))?;
            *owed -= participant.share;
        }
    }

    debug!(
        "aggregated {} balances from {} expenses",
        balances.len(),
        expenses.len()
    );
    Ok(balances)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{Currency, Participant, SplitPolicy};

    fn group_of(names: &[&str]) -> (Group, Vec<Uuid>) {
        let mut group = Group::new("Trip", Some(Currency::Eur)).unwrap();
        let ids = names
            .iter()
            .map(|name| group.add_member(name).unwrap())
            .collect();
        (group, ids)
    }

    fn expense(group: &Group, paid_by: Uuid, amount: i64, shares: &[(Uuid, i64)]) -> Expense {
        let participants = shares
            .iter()
            .map(|&(member_id, minor)| Participant::new(member_id, Money::new(minor)))
            .collect();
        Expense::new(
            group.id.clone(),
            Money::new(amount),
            group.currency,
            paid_by,
            SplitPolicy::Manual,
            participants,
            None,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn untouched_members_balance_at_zero() {
        let (group, ids) = group_of(&["A", "B", "C"]);
        let expenses = vec![expense(
            &group,
            ids[0],
            10_00,
            &[(ids[0], 5_00), (ids[1], 5_00)],
        )];

        let balances = compute_balances(&group, &expenses).unwrap();
        assert_eq!(balances[&ids[2]], Money::ZERO);
        assert_eq!(balances.len(), 3);
    }

    #[test]
    fn paying_credits_and_participating_debits() {
        let (group, ids) = group_of(&["A", "B"]);
        let expenses = vec![expense(
            &group,
            ids[0],
            10_00,
            &[(ids[0], 5_00), (ids[1], 5_00)],
        )];

        let balances = compute_balances(&group, &expenses).unwrap();
        assert_eq!(balances[&ids[0]], Money::new(5_00));
        assert_eq!(balances[&ids[1]], Money::new(-5_00));
    }

    #[test]
    fn unknown_payer_aborts_aggregation() {
        let (group, ids) = group_of(&["A", "B"]);
        let stranger = Uuid::new_v4();
        let expenses = vec![expense(
            &group,
            stranger,
            10_00,
            &[(ids[0], 5_00), (ids[1], 5_00)],
        )];

        assert_eq!(
            compute_balances(&group, &expenses),
            Err(EngineError::UnknownMember(stranger))
        );
    }

    #[test]
    fn unknown_participant_aborts_aggregation() {
        let (group, ids) = group_of(&["A", "B"]);
        let stranger = Uuid::new_v4();
        let expenses = vec![expense(
            &group,
            ids[0],
            10_00,
            &[(ids[0], 5_00), (stranger, 5_00)],
        )];

        assert_eq!(
            compute_balances(&group, &expenses),
            Err(EngineError::UnknownMember(stranger))
        );
    }

    #[test]
    fn foreign_group_expense_is_rejected() {
        let (group, _ids) = group_of(&["A", "B"]);
        let (other, other_ids) = group_of(&["X", "Y"]);
        let foreign = expense(
            &other,
            other_ids[0],
            10_00,
            &[(other_ids[0], 5_00), (other_ids[1], 5_00)],
        );

        assert!(matches!(
            compute_balances(&group, &[foreign]),
            Err(EngineError::KeyNotFound(_))
        ));
    }

    #[test]
    fn mismatched_currency_is_rejected() {
        let (group, ids) = group_of(&["A", "B"]);
        let mut wrong = expense(&group, ids[0], 10_00, &[(ids[0], 5_00), (ids[1], 5_00)]);
        wrong.currency = Currency::Usd;

        assert!(matches!(
            compute_balances(&group, &[wrong]),
            Err(EngineError::CurrencyMismatch(_))
        ));
    }
}
