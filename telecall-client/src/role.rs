use telecall_core::{ParticipantIdentity, RoomId};
use thiserror::Error;

pub use crate::negotiation::Role;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    #[error("identity {0:?} has no negotiation role in this room")]
    UnknownIdentity(ParticipantIdentity),
    #[error("identities {local:?} and {remote:?} cannot be ordered")]
    Ambiguous {
        local: ParticipantIdentity,
        remote: ParticipantIdentity,
    },
}

/// Decides which side of a call yields during an offer collision.
///
/// Both participants evaluate the same resolver locally, so the result must be
/// a pure function of its inputs and opposite for the two identities in a room.
pub trait RoleResolver: Send + Sync {
    fn resolve_role(
        &self,
        local: &ParticipantIdentity,
        room: &RoomId,
    ) -> Result<Role, RoleError>;
}

/// Role by participant category: the first category places the call and is
/// impolite, every other listed category is polite.
#[derive(Debug, Clone)]
pub struct CategoryOrder {
    categories: Vec<String>,
}

impl CategoryOrder {
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for CategoryOrder {
    fn default() -> Self {
        Self::new(["doctor", "patient"])
    }
}

impl RoleResolver for CategoryOrder {
    fn resolve_role(
        &self,
        local: &ParticipantIdentity,
        _room: &RoomId,
    ) -> Result<Role, RoleError> {
        match self
            .categories
            .iter()
            .position(|category| category == local.as_str())
        {
            Some(0) => Ok(Role::Impolite),
            Some(_) => Ok(Role::Polite),
            None => Err(RoleError::UnknownIdentity(local.clone())),
        }
    }
}

/// Role by comparing the two identities of an appointment; the smaller one is
/// impolite.
#[derive(Debug, Clone)]
pub struct PairwiseOrder {
    remote: ParticipantIdentity,
}

impl PairwiseOrder {
    pub fn new(remote: impl Into<ParticipantIdentity>) -> Self {
        Self {
            remote: remote.into(),
        }
    }
}

impl RoleResolver for PairwiseOrder {
    fn resolve_role(
        &self,
        local: &ParticipantIdentity,
        _room: &RoomId,
    ) -> Result<Role, RoleError> {
        match local.as_str().cmp(self.remote.as_str()) {
            std::cmp::Ordering::Less => Ok(Role::Impolite),
            std::cmp::Ordering::Greater => Ok(Role::Polite),
            std::cmp::Ordering::Equal => Err(RoleError::Ambiguous {
                local: local.clone(),
                remote: self.remote.clone(),
            }),
        }
    }
}
