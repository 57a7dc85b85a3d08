//! Deterministic tile-world physics for 2D platformer actors
//!
//! Fixed-point kinematics and collision resolution against a sparse
//! per-pixel solid map, one actor per call, one frame at a time.
//!
//! # Features
//!
//! - Sparse 32x32 tile solid map with per-pixel bitmaps and per-cell
//!   surface attributes (friction, traction, damage)
//! - Centipixel (1/100 px) integer velocity accumulation; no floats
//!   anywhere in the integration path
//! - Pixel-stepped vertical and horizontal resolution with slope
//!   following, lateral pit escape, and platform riding
//! - Rect, per-pixel image mask, and vehicle collision bodies
//! - Water areas, currents, and ambient air/water resistance
//! - Closed gameplay event vocabulary delivered through a dispatcher
//!   trait, with strict or lenient invariant enforcement
//!
//! # Example
//!
//! ```
//! use lode_core::Rect;
//! use lode_physics::{Actor, ActorType, Frame, Surface, World, integrator};
//! use std::sync::Arc;
//!
//! let mut world = World::new(Rect::new(0, 0, 640, 480));
//! world.solid_map_mut().set_rect(
//!     Rect::new(0, 400, 640, 80),
//!     Surface { friction: 100, traction: 1000, damage: 0 },
//!     true,
//! );
//!
//! let crate_type = Arc::new(ActorType::new("crate", Frame::new(16, 16, 1000)));
//! let mut actor = Actor::new(crate_type, 100, 300, true);
//! actor.velocity_y = 400;
//! let id = world.add_actor(actor);
//!
//! integrator::process(&mut world, id, &mut ()).unwrap();
//! ```

pub mod actor;
pub mod collision;
pub mod frame;
pub mod integrator;
pub mod solid_map;
pub mod world;

pub use actor::{Actor, ActorType, CollisionBody, TypeFlags};
pub use collision::{AllowPlatform, CollisionInfo, MoveDirection};
pub use frame::{AlphaMask, Frame, PlatformRegion};
pub use solid_map::{SolidMap, Surface, TileSolidInfo, TILE_SIZE};
pub use world::{Current, World};

pub use lode_core::{
    ActorId, Dispatcher, EventCtx, FaultPolicy, ObjectEvent, PhysicsFault, Result,
};
