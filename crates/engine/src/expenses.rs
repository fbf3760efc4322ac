//! Shared expense primitives.
//!
//! An `Expense` is a cost paid by one member of a group and split among a
//! set of participants. Expenses are authored and persisted externally; the
//! engine validates them at write time and consumes them read-only when
//! aggregating balances. Because validation happens here, a malformed
//! expense can never silently corrupt a group's aggregate balances.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, Money, ResultEngine,
    split::{SHARE_SUM_TOLERANCE_MINOR, ShareAllocation, ShareWeight},
};

/// The rule governing how an expense's cost is divided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    Equal,
    Shares,
    Manual,
}

impl SplitPolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Shares => "shares",
            Self::Manual => "manual",
        }
    }
}

impl TryFrom<&str> for SplitPolicy {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "equal" => Ok(Self::Equal),
            "shares" => Ok(Self::Shares),
            "manual" => Ok(Self::Manual),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid split policy: {other}"
            ))),
        }
    }
}

/// One member's part in an expense.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub member_id: Uuid,
    /// What this member owes for the expense. Never negative.
    pub share: Money,
    /// Only meaningful when the expense policy is [`SplitPolicy::Shares`].
    pub weight: Option<ShareWeight>,
}

impl Participant {
    #[must_use]
    pub fn new(member_id: Uuid, share: Money) -> Self {
        Self {
            member_id,
            share,
            weight: None,
        }
    }
}

impl From<ShareAllocation> for Participant {
    fn from(allocation: ShareAllocation) -> Self {
        Self {
            member_id: allocation.member_id,
            share: allocation.share,
            weight: allocation.weight,
        }
    }
}

/// A cost paid by one member and shared with others.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub group_id: String,
    pub amount: Money,
    pub currency: Currency,
    pub paid_by: Uuid,
    pub policy: SplitPolicy,
    /// Participants in authoring order; the split calculator's residue rule
    /// depends on this order.
    pub participants: Vec<Participant>,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl Expense {
    /// Validates and builds an expense.
    ///
    /// Enforced at write time:
    /// - `amount` strictly positive
    /// - at least one participant, none listed twice, no negative share
    /// - participant shares sum to `amount` within one minor unit
    ///   ([`EngineError::SplitMismatch`] with the signed delta otherwise)
    pub fn new(
        group_id: String,
        amount: Money,
        currency: Currency,
        paid_by: Uuid,
        policy: SplitPolicy,
        participants: Vec<Participant>,
        note: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        if participants.is_empty() {
            return Err(EngineError::InvalidAmount(
                "at least one participant is required".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(participants.len());
        for participant in &participants {
            if participant.share.is_negative() {
                return Err(EngineError::InvalidAmount(
                    "participant share must be >= 0".to_string(),
                ));
            }
            if !seen.insert(participant.member_id) {
                return Err(EngineError::ExistingKey(participant.member_id.to_string()));
            }
        }

        let total: Money = participants.iter().map(|p| p.share).sum();
        let delta = total - amount;
        if delta.abs() > Money::new(SHARE_SUM_TOLERANCE_MINOR) {
            return Err(EngineError::SplitMismatch { delta });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            group_id,
            amount,
            currency,
            paid_by,
            policy,
            participants,
            note,
            occurred_at,
        })
    }

    /// The persisted share values, in participant order.
    #[must_use]
    pub fn shares(&self) -> Vec<Money> {
        self.participants.iter().map(|p| p.share).collect()
    }
}
