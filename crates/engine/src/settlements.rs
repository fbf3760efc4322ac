//! Settlement proposals.
//!
//! Turns a balance vector into pairwise reimbursements using a greedy
//! largest-creditor / largest-debtor match. The result is deterministic and
//! uses at most `n - 1` transfers for `n` members off zero; it is not
//! guaranteed to be the globally minimal transaction count (exact
//! minimization is NP-hard), which is acceptable at household group sizes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::Money;

/// Residue at or below this many minor units counts as settled. Without it,
/// rounding residue would generate micro-transfers forever.
const EPSILON_MINOR: i64 = 1;

/// A suggested reimbursement: `from` pays `amount` to `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub from: Uuid,
    pub to: Uuid,
    pub amount: Money,
}

/// Proposes transfers that bring every balance to zero.
///
/// Repeatedly matches the member owed the most against the member owing the
/// most and transfers the smaller of the two outstanding amounts; whoever
/// reaches (near) zero drops out. Members already within epsilon of zero are
/// ignored from the start. Ties on equal balances are broken by member id so
/// the same snapshot always produces the same list.
///
/// Every returned transfer is strictly positive, and applying them in order
/// nets every member to within epsilon of zero.
#[must_use]
pub fn compute_settlements(balances: &HashMap<Uuid, Money>) -> Vec<Settlement> {
    let epsilon = Money::new(EPSILON_MINOR);

    let mut creditors: Vec<(Uuid, Money)> = balances
        .iter()
        .filter(|(_, balance)| **balance > epsilon)
        .map(|(id, balance)| (*id, *balance))
        .collect();
    let mut debtors: Vec<(Uuid, Money)> = balances
        .iter()
        .filter(|(_, balance)| **balance < -epsilon)
        .map(|(id, balance)| (*id, *balance))
        .collect();

    let mut transfers = Vec::new();
    while !creditors.is_empty() && !debtors.is_empty() {
        let creditor = pick_creditor(&creditors);
        let debtor = pick_debtor(&debtors);

        let due = creditors[creditor].1;
        let owed = -debtors[debtor].1;
        let amount = due.min(owed);

        transfers.push(Settlement {
            from: debtors[debtor].0,
            to: creditors[creditor].0,
            amount,
        });

        creditors[creditor].1 -= amount;
        debtors[debtor].1 += amount;
        if creditors[creditor].1 <= epsilon {
            creditors.swap_remove(creditor);
        }
        if debtors[debtor].1 >= -epsilon {
            debtors.swap_remove(debtor);
        }
    }

    debug!("proposed {} settlement transfers", transfers.len());
    transfers
}

/// Index of the largest outstanding creditor; ties go to the smaller id.
fn pick_creditor(creditors: &[(Uuid, Money)]) -> usize {
    let mut best = 0;
    for index in 1..creditors.len() {
        let (best_id, best_due) = creditors[best];
        let (id, due) = creditors[index];
        if due > best_due || (due == best_due && id < best_id) {
            best = index;
        }
    }
    best
}

/// Index of the largest outstanding debtor; ties go to the smaller id.
fn pick_debtor(debtors: &[(Uuid, Money)]) -> usize {
    let mut best = 0;
    for index in 1..debtors.len() {
        let (best_id, best_owed) = debtors[best];
        let (id, owed) = debtors[index];
        if owed < best_owed || (owed == best_owed && id < best_id) {
            best = index;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balances(entries: &[(Uuid, i64)]) -> HashMap<Uuid, Money> {
        entries
            .iter()
            .map(|&(id, minor)| (id, Money::new(minor)))
            .collect()
    }

    fn apply(balances: &mut HashMap<Uuid, Money>, transfers: &[Settlement]) {
        for transfer in transfers {
            *balances.get_mut(&transfer.from).expect("debtor") += transfer.amount;
            *balances.get_mut(&transfer.to).expect("creditor") -= transfer.amount;
        }
    }

    #[test]
    fn empty_and_settled_groups_need_no_transfers() {
        assert!(compute_settlements(&HashMap::new()).is_empty());

        let settled = balances(&[(Uuid::new_v4(), 0), (Uuid::new_v4(), 1), (Uuid::new_v4(), -1)]);
        assert!(compute_settlements(&settled).is_empty());
    }

    #[test]
    fn single_pair_settles_in_one_transfer() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let transfers = compute_settlements(&balances(&[(alice, 5_00), (bob, -5_00)]));

        assert_eq!(
            transfers,
            vec![Settlement {
                from: bob,
                to: alice,
                amount: Money::new(5_00),
            }]
        );
    }

    #[test]
    fn transfers_zero_out_every_member() {
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let mut remaining = balances(&[
            (ids[0], 12_50),
            (ids[1], -2_50),
            (ids[2], -10_00),
            (ids[3], 7_35),
            (ids[4], -7_35),
        ]);

        let transfers = compute_settlements(&remaining);
        assert!(transfers.len() <= 4);
        assert!(transfers.iter().all(|t| t.amount.is_positive()));

        apply(&mut remaining, &transfers);
        for balance in remaining.values() {
            assert!(balance.abs() <= Money::new(EPSILON_MINOR));
        }
    }

    #[test]
    fn total_transferred_equals_outstanding_debt() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let input = balances(&[
            (ids[0], 20_00),
            (ids[1], 5_00),
            (ids[2], -17_00),
            (ids[3], -8_00),
        ]);

        let transfers = compute_settlements(&input);
        let moved: Money = transfers.iter().map(|t| t.amount).sum();
        assert_eq!(moved, Money::new(25_00));
    }

    #[test]
    fn largest_parties_are_matched_first() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let input = balances(&[
            (ids[0], 30_00),
            (ids[1], 1_00),
            (ids[2], -29_00),
            (ids[3], -2_00),
        ]);

        let transfers = compute_settlements(&input);
        assert_eq!(transfers[0].from, ids[2]);
        assert_eq!(transfers[0].to, ids[0]);
        assert_eq!(transfers[0].amount, Money::new(29_00));
    }

    #[test]
    fn identical_snapshots_settle_identically() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let input = balances(&[
            (ids[0], 10_00),
            (ids[1], 10_00),
            (ids[2], -10_00),
            (ids[3], -10_00),
        ]);

        assert_eq!(compute_settlements(&input), compute_settlements(&input));
    }

    #[test]
    fn settlement_serializes_with_flat_fields() {
        let transfer = Settlement {
            from: Uuid::nil(),
            to: Uuid::nil(),
            amount: Money::new(2_50),
        };
        let json = serde_json::to_value(transfer).unwrap();
        assert_eq!(json["amount"], 250);
        assert!(json["from"].is_string());
    }
}
