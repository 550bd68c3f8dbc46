use serde::{Deserialize, Serialize};
use std::fmt;

/// Application-supplied discriminator such as `"doctor"` or `"patient"`.
///
/// Only used to seed role assignment, it carries no authorization meaning.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct ParticipantIdentity(pub String);

impl ParticipantIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantIdentity {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ParticipantIdentity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ParticipantIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
