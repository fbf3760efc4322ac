//! Split computation and inference.
//!
//! [`compute_split`] turns an expense amount into per-participant shares
//! under a policy. [`infer_split`] is the best-effort inverse: given the
//! shares persisted on an expense, it reconstructs the policy and its
//! parameters so an edit form can reopen in the original mode. Inference can
//! fail on rounded data; that is a UX fallback (the caller edits the expense
//! as manual), never an engine error.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, expenses::SplitPolicy};

/// Authoring-time tolerance between the sum of shares and the expense
/// amount, in minor units.
pub(crate) const SHARE_SUM_TOLERANCE_MINOR: i64 = 1;

/// Verification tolerance for [`infer_split`], in minor units. Coarser than
/// the authoring tolerance because persisted shares already carry rounding.
const INFER_TOLERANCE_MINOR: i64 = 50;

/// Relative portion used by the shares policy, counted in **half units**.
///
/// Weights move in steps of 0.5, so they stay exact as integers:
/// [`ShareWeight::ONE`] is 2 half units, `1.5` is 3. A zero weight on a
/// split input means "this member does not take part", never "owes zero".
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ShareWeight(u32);

impl ShareWeight {
    pub const HALF: ShareWeight = ShareWeight(1);
    pub const ONE: ShareWeight = ShareWeight(2);

    #[must_use]
    pub const fn from_half_units(half_units: u32) -> Self {
        Self(half_units)
    }

    #[must_use]
    pub const fn half_units(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Default for ShareWeight {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for ShareWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 2;
        if self.0 % 2 == 0 {
            write!(f, "{whole}")
        } else {
            write!(f, "{whole}.5")
        }
    }
}

/// Split policy plus its parameters, as supplied by the authoring flow.
///
/// `Shares` and `Manual` parameters align by index with the participant list
/// handed to [`compute_split`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SplitSpec {
    Equal,
    Shares { weights: Vec<ShareWeight> },
    /// Caller-supplied shares. Validated against the amount, never adjusted.
    Manual { shares: Vec<Money> },
}

impl SplitSpec {
    /// The persisted policy tag this spec corresponds to.
    #[must_use]
    pub fn policy(&self) -> SplitPolicy {
        match self {
            SplitSpec::Equal => SplitPolicy::Equal,
            SplitSpec::Shares { .. } => SplitPolicy::Shares,
            SplitSpec::Manual { .. } => SplitPolicy::Manual,
        }
    }
}

/// A computed per-participant share.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareAllocation {
    pub member_id: Uuid,
    pub share: Money,
    /// Set when the allocation came from the shares policy.
    pub weight: Option<ShareWeight>,
}

/// Outcome of [`infer_split`]: a policy that reproduces the stored shares.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum InferredSplit {
    Equal,
    Shares { weights: Vec<ShareWeight> },
}

/// Computes per-participant shares for an expense amount.
///
/// Shares always sum to `amount` exactly: equal and weighted splits divide
/// by truncation and let the **last** participant (in input order) absorb
/// the residue instead of distributing rounding silently. Re-running with a
/// changed amount and the same spec is a full re-derivation; nothing is
/// patched incrementally.
///
/// The function is pure; validation failures surface here, at authoring
/// time, so a malformed split can never reach balance aggregation.
pub fn compute_split(
    amount: Money,
    participant_ids: &[Uuid],
    spec: &SplitSpec,
) -> ResultEngine<Vec<ShareAllocation>> {
    if participant_ids.is_empty() {
        return Err(EngineError::InvalidAmount(
            "at least one participant is required".to_string(),
        ));
    }
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(
            "amount must be > 0".to_string(),
        ));
    }

    match spec {
        SplitSpec::Equal => Ok(split_equal(amount, participant_ids)),
        SplitSpec::Shares { weights } => split_weighted(amount, participant_ids, weights),
        SplitSpec::Manual { shares } => split_manual(amount, participant_ids, shares),
    }
}

fn split_equal(amount: Money, participant_ids: &[Uuid]) -> Vec<ShareAllocation> {
    let base = Money::new(amount.minor() / participant_ids.len() as i64);

    let mut allocations = Vec::with_capacity(participant_ids.len());
    let mut allocated = Money::ZERO;
    for (index, &member_id) in participant_ids.iter().enumerate() {
        // Last slot absorbs the truncation residue.
        let share = if index + 1 == participant_ids.len() {
            amount - allocated
        } else {
            base
        };
        allocated += share;
        allocations.push(ShareAllocation {
            member_id,
            share,
            weight: None,
        });
    }
    allocations
}

fn split_weighted(
    amount: Money,
    participant_ids: &[Uuid],
    weights: &[ShareWeight],
) -> ResultEngine<Vec<ShareAllocation>> {
    if weights.len() != participant_ids.len() {
        return Err(EngineError::InvalidWeight(format!(
            "expected {} weights, got {}",
            participant_ids.len(),
            weights.len()
        )));
    }

    // A zero weight removes the participant from the split.
    let active: Vec<(Uuid, ShareWeight)> = participant_ids
        .iter()
        .copied()
        .zip(weights.iter().copied())
        .filter(|(_, weight)| !weight.is_zero())
        .collect();
    if active.is_empty() {
        return Err(EngineError::InvalidWeight("all weights are zero".to_string()));
    }

    let active_weights: Vec<ShareWeight> = active.iter().map(|(_, weight)| *weight).collect();
    let shares = weighted_amounts(amount, &active_weights);

    Ok(active
        .into_iter()
        .zip(shares)
        .map(|((member_id, weight), share)| ShareAllocation {
            member_id,
            share,
            weight: Some(weight),
        })
        .collect())
}

fn split_manual(
    amount: Money,
    participant_ids: &[Uuid],
    shares: &[Money],
) -> ResultEngine<Vec<ShareAllocation>> {
    if shares.len() != participant_ids.len() {
        return Err(EngineError::InvalidAmount(format!(
            "expected {} shares, got {}",
            participant_ids.len(),
            shares.len()
        )));
    }
    if shares.iter().any(|share| share.is_negative()) {
        return Err(EngineError::InvalidAmount(
            "shares must be >= 0".to_string(),
        ));
    }

    let total: Money = shares.iter().copied().sum();
    let delta = total - amount;
    if delta.abs() > Money::new(SHARE_SUM_TOLERANCE_MINOR) {
        return Err(EngineError::SplitMismatch { delta });
    }

    Ok(participant_ids
        .iter()
        .zip(shares)
        .map(|(&member_id, &share)| ShareAllocation {
            member_id,
            share,
            weight: None,
        })
        .collect())
}

/// Divides `amount` across `weights` (non-empty, all non-zero); the last
/// slot absorbs the truncation residue.
fn weighted_amounts(amount: Money, weights: &[ShareWeight]) -> Vec<Money> {
    let total_half_units: i64 = weights
        .iter()
        .map(|weight| i64::from(weight.half_units()))
        .sum();
    let per_half_unit = amount.minor() / total_half_units;

    let mut shares = Vec::with_capacity(weights.len());
    let mut allocated = Money::ZERO;
    for (index, weight) in weights.iter().enumerate() {
        let share = if index + 1 == weights.len() {
            amount - allocated
        } else {
            Money::new(per_half_unit * i64::from(weight.half_units()))
        };
        allocated += share;
        shares.push(share);
    }
    shares
}

/// Reconstructs the split policy from the shares persisted on an expense.
///
/// Order of attempts:
///
/// 1. all shares equal within one minor unit → [`InferredSplit::Equal`];
/// 2. otherwise, express every share as a half-step ratio of the smallest
///    share and verify that the candidate weights regenerate the stored
///    shares within half a currency unit.
///
/// Ratios that land ambiguously between two half steps, a non-positive
/// minimum share, or a failed verification all yield `None`: the caller must
/// fall back to manual editing rather than trust a guess that does not
/// reproduce the stored numbers.
pub fn infer_split(shares: &[Money], amount: Money) -> Option<InferredSplit> {
    let min = shares.iter().min().copied()?;
    let max = shares.iter().max().copied()?;

    if (max - min).minor() <= SHARE_SUM_TOLERANCE_MINOR {
        return Some(InferredSplit::Equal);
    }
    if !min.is_positive() {
        return None;
    }

    let mut weights = Vec::with_capacity(shares.len());
    for &share in shares {
        weights.push(ShareWeight::from_half_units(nearest_half_step(share, min)?));
    }

    // The guess counts only if it reproduces the stored shares.
    let regenerated = weighted_amounts(amount, &weights);
    let tolerance = Money::new(INFER_TOLERANCE_MINOR);
    for (&stored, regen) in shares.iter().zip(regenerated) {
        if (regen - stored).abs() > tolerance {
            return None;
        }
    }

    Some(InferredSplit::Shares { weights })
}

/// Rounds `share / min` to the nearest half step, returned in half units.
///
/// Rejects ratios whose distance from the nearest half step exceeds 0.1,
/// i.e. values sitting ambiguously between two valid increments.
fn nearest_half_step(share: Money, min: Money) -> Option<u32> {
    let s = i128::from(share.minor());
    let m = i128::from(min.minor());

    // Round-half-up of the doubled ratio 2s/m.
    let half_units = (4 * s + m) / (2 * m);
    if 5 * (2 * s - half_units * m).abs() > m {
        return None;
    }
    u32::try_from(half_units).ok()
}
