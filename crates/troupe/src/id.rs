//! # Identifiers
//!
//! Unique identifiers for actors and proxied callbacks. Both are UUIDv4
//! newtypes so they can be generated on either side of the isolation
//! boundary without coordination.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies one instantiated actor inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(Uuid);

impl ActorId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one caller-side closure proxied into a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallbackId(Uuid);

impl CallbackId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_ids_are_unique() {
        let a = ActorId::generate();
        let b = ActorId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn actor_id_round_trips_through_serde() {
        let id = ActorId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let back: ActorId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
