//! Groups and members.
//!
//! A `Group` is a shared ledger context: one currency and an ordered roster
//! of members. Member and group lifecycle (persistence, invitations,
//! deletion) is managed by the embedding application; the engine only reads
//! member identity when splitting expenses and aggregating balances.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine, util::normalize_required_name};

/// A person taking part in a group's shared expenses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub name: String,
}

/// Holds the member roster and the group currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    /// Fixed once the group carries expenses; the storage layer enforces
    /// immutability, the engine only checks expenses against it.
    pub currency: Currency,
    /// Roster in insertion order.
    pub members: Vec<Member>,
}

impl Group {
    pub fn new(name: &str, currency: Option<Currency>) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: normalize_required_name(name, "group")?,
            currency: currency.unwrap_or_default(),
            members: Vec::new(),
        })
    }

    /// Adds a member to the roster and returns its id.
    ///
    /// Names are trimmed; blank or duplicate names are rejected.
    pub fn add_member(&mut self, name: &str) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "member")?;
        if self.members.iter().any(|member| member.name == name) {
            return Err(EngineError::ExistingKey(name));
        }

        let member = Member {
            id: Uuid::new_v4(),
            name,
        };
        let member_id = member.id;
        self.members.push(member);
        Ok(member_id)
    }

    /// Return a [`Member`] of the roster.
    pub fn member(&self, member_id: Uuid) -> ResultEngine<&Member> {
        self.members
            .iter()
            .find(|member| member.id == member_id)
            .ok_or_else(|| EngineError::KeyNotFound("member not exists".to_string()))
    }

    #[must_use]
    pub fn contains_member(&self, member_id: Uuid) -> bool {
        self.members.iter().any(|member| member.id == member_id)
    }

    pub fn member_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.members.iter().map(|member| member.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_member_returns_lookupable_id() {
        let mut group = Group::new("Trip", None).unwrap();
        let id = group.add_member("Alice").unwrap();

        assert_eq!(group.member(id).unwrap().name, "Alice");
        assert!(group.contains_member(id));
    }

    #[test]
    fn add_member_rejects_duplicates_and_blanks() {
        let mut group = Group::new("Trip", None).unwrap();
        group.add_member("Alice").unwrap();

        assert_eq!(
            group.add_member(" Alice "),
            Err(EngineError::ExistingKey("Alice".to_string()))
        );
        assert!(group.add_member("   ").is_err());
    }

    #[test]
    fn member_lookup_fails_for_strangers() {
        let group = Group::new("Trip", Some(Currency::Usd)).unwrap();
        assert_eq!(
            group.member(Uuid::new_v4()),
            Err(EngineError::KeyNotFound("member not exists".to_string()))
        );
    }
}
