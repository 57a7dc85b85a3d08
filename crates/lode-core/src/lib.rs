//! # Lode Core
//!
//! Shared data types for the Lode tile-platformer physics engine.
//!
//! This crate provides the foundations the physics engine is built on:
//! - **Fixed point**: centipixel and per-mille integer units with the exact
//!   truncation rules the deterministic integrator depends on
//! - **Geometry**: integer points and rectangles
//! - **Registry**: generation-counted actor handles and slot storage
//! - **Events**: the closed gameplay event vocabulary and dispatch trait
//! - **Faults**: collision-invariant error types and the strict/lenient policy
//! - **Saved state**: the physics-relevant persisted actor fields

pub mod event;
pub mod fault;
pub mod fixed;
pub mod geometry;
pub mod registry;
pub mod saved;

pub use event::{CtxValue, Dispatcher, EventCtx, ObjectEvent};
pub use fault::{FaultPolicy, PhysicsFault, Result};
pub use geometry::Rect;
pub use registry::{ActorId, Registry};
pub use saved::SavedActor;
