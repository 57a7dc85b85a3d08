//! Physics faults
//!
//! Ending a frame interpenetrating solid geometry is a bug in the stepping
//! algorithm or a malformed level, never a condition to retry. The
//! integration step surfaces it as a [`PhysicsFault`] for the caller to
//! abort on; the single sanctioned exception is an animation change that
//! immediately collides, which [`FaultPolicy::Lenient`] downgrades to a
//! recoverable rejection so live-editing tools can refuse a bad frame
//! without terminating.

use thiserror::Error;

use crate::registry::ActorId;

/// Result alias for integration-step operations.
pub type Result<T> = std::result::Result<T, PhysicsFault>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhysicsFault {
    #[error("actor {actor:?} interpenetrates solid geometry at ({x}, {y}) on cycle {cycle}")]
    Interpenetration {
        actor: ActorId,
        x: i32,
        y: i32,
        cycle: i32,
    },

    #[error("animation '{animation}' for actor {actor:?} collides with solid geometry")]
    AnimationCollision { actor: ActorId, animation: String },

    #[error("actor {actor:?} has no animation named '{animation}'")]
    UnknownAnimation { actor: ActorId, animation: String },

    #[error("actor {actor:?} is not present in the world")]
    MissingActor { actor: ActorId },
}

/// How invariant violations during an animation change are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultPolicy {
    /// Animation collisions are reported as
    /// [`PhysicsFault::AnimationCollision`] with the offending state
    /// left in place for diagnosis.
    #[default]
    Strict,
    /// Animation collisions revert the actor to its previous frame and
    /// report a catchable [`PhysicsFault::AnimationCollision`].
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn test_fault_messages_carry_context() {
        let mut reg = Registry::new();
        let id = reg.insert(());
        let fault = PhysicsFault::Interpenetration {
            actor: id,
            x: 12,
            y: -7,
            cycle: 400,
        };
        let msg = fault.to_string();
        assert!(msg.contains("(12, -7)"));
        assert!(msg.contains("cycle 400"));
    }
}
