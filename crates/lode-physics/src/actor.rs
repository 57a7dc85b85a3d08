//! Actor kinematic state and archetype constants
//!
//! An [`Actor`] is one mobile (or standable) object: sub-pixel position,
//! velocity, acceleration, animation bookkeeping, and the weak references
//! the integrator maintains (support platform, last attacker, driver).
//! The immutable per-archetype numbers live in [`ActorType`] and are
//! shared between every actor of that archetype.

use std::sync::Arc;

use ahash::AHashMap;
use bitflags::bitflags;
use glam::IVec2;

use lode_core::fixed::{to_centipixels, to_pixels};
use lode_core::{ActorId, Rect, SavedActor};

use crate::frame::Frame;

bitflags! {
    /// Boolean archetype constants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TypeFlags: u32 {
        /// Never collides; integrates by straight centipixel addition.
        const IGNORE_COLLIDE = 1 << 0;
        /// Wants `collide_level` notifications while overlapping level shape.
        const OBJECT_LEVEL_COLLISIONS = 1 << 1;
        /// Water currents and current generators push this actor.
        const AFFECTED_BY_CURRENTS = 1 << 2;
        /// Touching this body hurts.
        const BODY_HARMFUL = 1 << 3;
        /// Other bodies pass through freely.
        const BODY_PASSTHROUGH = 1 << 4;
        /// Counts as friendly for contact checks.
        const ON_PLAYERS_SIDE = 1 << 5;
        /// A player character; its attack area drives `hit_by_player`.
        const IS_PLAYER = 1 << 6;
        /// Can stand on surfaces.
        const HAS_FEET = 1 << 7;
    }
}

/// How an actor's collision footprint is derived. Closed set: there is no
/// way to mix shapes within one actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionBody {
    /// Rectangular body from the current frame.
    Rect,
    /// Per-pixel opacity of the current frame; always static, never
    /// integrated.
    ImageMask,
    /// Rectangular body that can carry a mounted driver at the given
    /// offset from its leading edge.
    Vehicle { passenger: IVec2 },
}

/// Immutable per-archetype physics parameters.
#[derive(Debug, Clone)]
pub struct ActorType {
    pub name: String,
    pub body: CollisionBody,
    pub flags: TypeFlags,
    /// Per-mille scale applied to blended surface/ambient friction.
    pub friction: i32,
    /// Per-mille scale applied to surface traction while standing.
    pub traction: i32,
    /// Per-mille traction available while airborne.
    pub traction_in_air: i32,
    /// Divisor for current forces; zero means unaffected by mass-scaled
    /// currents.
    pub mass: i32,
    /// Nonzero springiness makes the body un-standable.
    pub springiness: i32,
    /// Fire `timer` every this many cycles; zero disables it.
    pub timer_frequency: i32,
    /// Surface attributes other actors feel when standing on this one.
    pub surface_friction: i32,
    pub surface_traction: i32,
    /// Damage dealt by edge contact with this body.
    pub contact_damage: i32,
    /// Half-width of the foot support area.
    pub feet_width: i32,
    pub hitpoints: i32,
    pub zorder: i32,
    frames: AHashMap<String, Frame>,
}

/// Name of the animation every type must provide.
pub const DEFAULT_ANIMATION: &str = "normal";

impl ActorType {
    pub fn new(name: &str, normal: Frame) -> Self {
        let mut frames = AHashMap::new();
        frames.insert(DEFAULT_ANIMATION.to_string(), normal);
        Self {
            name: name.to_string(),
            body: CollisionBody::Rect,
            flags: TypeFlags::HAS_FEET,
            friction: 0,
            traction: 1000,
            traction_in_air: 0,
            mass: 1,
            springiness: 0,
            timer_frequency: 0,
            surface_friction: 100,
            surface_traction: 1000,
            contact_damage: 0,
            feet_width: 5,
            hitpoints: 1,
            zorder: 0,
            frames,
        }
    }

    pub fn add_frame(&mut self, name: &str, frame: Frame) {
        self.frames.insert(name.to_string(), frame);
    }

    pub fn has_frame(&self, name: &str) -> bool {
        self.frames.contains_key(name)
    }

    /// Frame by name, falling back to the default animation.
    pub fn frame(&self, name: &str) -> &Frame {
        self.frames
            .get(name)
            .unwrap_or_else(|| &self.frames[DEFAULT_ANIMATION])
    }

    pub fn use_image_for_collisions(&self) -> bool {
        matches!(self.body, CollisionBody::ImageMask)
    }

    pub fn is_vehicle(&self) -> bool {
        matches!(self.body, CollisionBody::Vehicle { .. })
    }
}

/// Per-actor physics state.
#[derive(Debug, Clone)]
pub struct Actor {
    actor_type: Arc<ActorType>,
    /// Position in centipixels. Realigned to whole pixels before any
    /// collision query; only `ignore_collide` motion leaves a sub-pixel
    /// remainder.
    x_cp: i32,
    y_cp: i32,
    /// Velocity and acceleration in centipixels per frame.
    pub velocity_x: i32,
    pub velocity_y: i32,
    pub accel_x: i32,
    pub accel_y: i32,
    pub face_right: bool,
    pub upside_down: bool,
    pub zorder: i32,
    pub hitpoints: i32,
    pub invincible: i32,
    animation: String,
    pub time_in_frame: i32,
    animation_id: u32,
    pub cycle: i32,
    /// Support back-reference; never extends the platform's lifetime.
    pub standing_on: Option<ActorId>,
    pub(crate) standing_on_prev: Option<IVec2>,
    pub fall_through_platforms: i32,
    pub(crate) last_hit_by: Option<(ActorId, u32)>,
    pub(crate) last_jumped_on_by: Option<ActorId>,
    pub driver: Option<ActorId>,
    pub(crate) was_underwater: bool,
    pub(crate) loaded: bool,
    pub(crate) previous_y: i32,
    pub(crate) last_move: IVec2,
    scheduled: Vec<(i32, String)>,
}

impl Actor {
    pub fn new(actor_type: Arc<ActorType>, x: i32, y: i32, face_right: bool) -> Self {
        let hitpoints = actor_type.hitpoints;
        let zorder = actor_type.zorder;
        Self {
            actor_type,
            x_cp: to_centipixels(x),
            y_cp: to_centipixels(y),
            velocity_x: 0,
            velocity_y: 0,
            accel_x: 0,
            accel_y: 0,
            face_right,
            upside_down: false,
            zorder,
            hitpoints,
            invincible: 0,
            animation: DEFAULT_ANIMATION.to_string(),
            time_in_frame: 0,
            animation_id: 0,
            cycle: 0,
            standing_on: None,
            standing_on_prev: None,
            fall_through_platforms: 0,
            last_hit_by: None,
            last_jumped_on_by: None,
            driver: None,
            was_underwater: false,
            loaded: false,
            previous_y: y,
            last_move: IVec2::ZERO,
            scheduled: Vec::new(),
        }
    }

    pub fn actor_type(&self) -> &ActorType {
        &self.actor_type
    }

    /// Whole-pixel x, truncating toward zero.
    pub fn x(&self) -> i32 {
        to_pixels(self.x_cp)
    }

    pub fn y(&self) -> i32 {
        to_pixels(self.y_cp)
    }

    /// Position in centipixels, as persisted.
    pub fn centipixel_pos(&self) -> IVec2 {
        IVec2::new(self.x_cp, self.y_cp)
    }

    /// Move to a whole-pixel position, discarding any sub-pixel remainder.
    pub fn set_pos(&mut self, x: i32, y: i32) {
        self.x_cp = to_centipixels(x);
        self.y_cp = to_centipixels(y);
    }

    /// Accumulate sub-pixel motion; only `ignore_collide` actors move
    /// this way.
    pub fn move_centipixels(&mut self, dx: i32, dy: i32) {
        self.x_cp += dx;
        self.y_cp += dy;
    }

    pub fn animation(&self) -> &str {
        &self.animation
    }

    /// Monotonic id bumped on every animation change, used to gate
    /// repeat-contact events.
    pub fn animation_id(&self) -> u32 {
        self.animation_id
    }

    pub(crate) fn set_animation_raw(&mut self, name: &str) {
        self.animation = name.to_string();
        self.animation_id += 1;
        self.time_in_frame = 0;
    }

    pub fn current_frame(&self) -> &Frame {
        self.actor_type.frame(&self.animation)
    }

    /// The frame's full image area in world pixels.
    pub fn frame_rect(&self) -> Rect {
        let frame = self.current_frame();
        Rect::new(self.x(), self.y(), frame.width, frame.height)
    }

    /// Solid body in world pixels.
    pub fn body_rect(&self) -> Rect {
        self.current_frame()
            .body
            .translated(IVec2::new(self.x(), self.y()))
    }

    /// Attack area in world pixels, if the current frame declares one.
    pub fn hit_rect(&self) -> Option<Rect> {
        let area = self.current_frame().hit_area?;
        Some(area.translated(IVec2::new(self.x(), self.y())))
    }

    /// Foot point in world pixels, mirrored by facing.
    pub fn feet(&self) -> IVec2 {
        let frame = self.current_frame();
        let fx = if self.face_right {
            frame.feet.x
        } else {
            frame.width - frame.feet.x
        };
        IVec2::new(self.x() + fx, self.y() + frame.feet.y)
    }

    pub fn feet_x(&self) -> i32 {
        self.feet().x
    }

    pub fn feet_y(&self) -> i32 {
        self.feet().y
    }

    /// Whether a world point is inside this actor's solid footprint.
    pub fn point_collides(&self, x: i32, y: i32) -> bool {
        if self.actor_type.use_image_for_collisions() {
            self.current_frame()
                .opaque(x - self.x(), y - self.y(), self.face_right, self.upside_down)
        } else {
            self.body_rect().contains(IVec2::new(x, y))
        }
    }

    /// Whether a world rect overlaps this actor's solid footprint.
    pub fn rect_collides(&self, r: &Rect) -> bool {
        if self.actor_type.use_image_for_collisions() {
            let Some(overlap) = self.frame_rect().intersection(r) else {
                return false;
            };
            for y in overlap.y..overlap.y2() {
                for x in overlap.x..overlap.x2() {
                    if self.point_collides(x, y) {
                        return true;
                    }
                }
            }
            false
        } else {
            self.body_rect().intersects(r)
        }
    }

    /// Whether this body blocks other bodies.
    pub fn blocks(&self) -> bool {
        !self.actor_type.flags.contains(TypeFlags::BODY_PASSTHROUGH)
    }

    pub fn has_feet(&self) -> bool {
        self.actor_type.flags.contains(TypeFlags::HAS_FEET)
    }

    pub fn on_players_side(&self) -> bool {
        self.actor_type
            .flags
            .intersects(TypeFlags::ON_PLAYERS_SIDE | TypeFlags::IS_PLAYER)
    }

    pub fn is_player(&self) -> bool {
        self.actor_type.flags.contains(TypeFlags::IS_PLAYER)
    }

    pub fn destroyed(&self) -> bool {
        self.hitpoints <= 0
    }

    /// Position delta of the previous frame in whole pixels; riders read
    /// this to inherit platform momentum.
    pub fn last_move(&self) -> IVec2 {
        self.last_move
    }

    /// Queue a command to run on the given world cycle.
    pub fn schedule_command(&mut self, cycle: i32, command: impl Into<String>) {
        self.scheduled.push((cycle, command.into()));
    }

    /// Drain every command scheduled for exactly this cycle, preserving
    /// queue order.
    pub(crate) fn take_scheduled(&mut self, cycle: i32) -> Vec<String> {
        let mut due = Vec::new();
        self.scheduled.retain(|(c, command)| {
            if *c == cycle {
                due.push(command.clone());
                false
            } else {
                true
            }
        });
        due
    }

    pub fn to_saved(&self) -> SavedActor {
        SavedActor {
            x: self.x_cp,
            y: self.y_cp,
            velocity_x: self.velocity_x,
            velocity_y: self.velocity_y,
            zorder: self.zorder,
            hitpoints: self.hitpoints,
            cycle: self.cycle,
            animation: self.animation.clone(),
            time_in_frame: self.time_in_frame,
        }
    }

    pub fn from_saved(actor_type: Arc<ActorType>, saved: &SavedActor) -> Self {
        let mut actor = Self::new(actor_type, 0, 0, true);
        actor.x_cp = saved.x;
        actor.y_cp = saved.y;
        actor.velocity_x = saved.velocity_x;
        actor.velocity_y = saved.velocity_y;
        actor.zorder = saved.zorder;
        actor.hitpoints = saved.hitpoints;
        actor.cycle = saved.cycle;
        if actor.actor_type.has_frame(&saved.animation) {
            actor.animation = saved.animation.clone();
        }
        actor.time_in_frame = saved.time_in_frame;
        actor.previous_y = actor.y();
        actor
    }
}
