//! Gameplay event vocabulary and dispatch
//!
//! The physics integrator decides *when* events fire; executing their
//! handlers is the dispatcher's business. The vocabulary is closed: every
//! event the integrator can emit is a variant of [`ObjectEvent`], and
//! `Display` renders the wire name handlers are registered under
//! (`end_walk_anim`, `collide_feet`, ...).

use std::fmt;

use smallvec::SmallVec;

use crate::registry::ActorId;

/// An event emitted by the physics integrator for one actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectEvent {
    /// First frame the actor is ever processed.
    Load,
    /// First active frame.
    Create,
    DoneCreate,
    /// The current animation reached its duration; fired with the
    /// animation's name before the generic [`EndAnim`](Self::EndAnim).
    EndAnimOf(String),
    EndAnim,
    EnterAnim,
    EnterAnimOf(String),
    LeaveAnimOf(String),
    /// Standing on a surface with nonzero damage.
    SurfaceDamage,
    /// Hit something while moving up.
    CollideHead,
    /// Landed while airborne.
    CollideFeet,
    /// Horizontal collision.
    Collide,
    /// The non-solid body overlaps level shape (opt-in per type).
    CollideLevel,
    /// Carries `damage: i32` in its context.
    CollideDamage,
    /// Another actor began standing on this one.
    StoodOn,
    /// Another actor landed on this one's head.
    JumpedOn,
    EnterWater,
    ExitWater,
    /// Touched a harmful body (players-side actors).
    GetHit,
    /// Touched by a player's attack area.
    HitByPlayer,
    /// The vehicle's driver was touched by a player's attack area.
    DriverHitByPlayer,
    Die,
    /// Every frame.
    Process,
    /// Every frame, suffixed with the current animation.
    ProcessOf(String),
    /// Every `timer_frequency` frames.
    Timer,
    /// Switching to an animation that interpenetrates solid geometry.
    ChangeAnimationFailure,
    ChangeAnimationFailureOf(String),
    /// An event bound to a specific animation tick (hit frames, sound cues).
    FrameEvent(String),
}

impl fmt::Display for ObjectEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Create => write!(f, "create"),
            Self::DoneCreate => write!(f, "done_create"),
            Self::EndAnimOf(anim) => write!(f, "end_{anim}_anim"),
            Self::EndAnim => write!(f, "end_anim"),
            Self::EnterAnim => write!(f, "enter_anim"),
            Self::EnterAnimOf(anim) => write!(f, "enter_{anim}_anim"),
            Self::LeaveAnimOf(anim) => write!(f, "leave_{anim}_anim"),
            Self::SurfaceDamage => write!(f, "surface_damage"),
            Self::CollideHead => write!(f, "collide_head"),
            Self::CollideFeet => write!(f, "collide_feet"),
            Self::Collide => write!(f, "collide"),
            Self::CollideLevel => write!(f, "collide_level"),
            Self::CollideDamage => write!(f, "collide_damage"),
            Self::StoodOn => write!(f, "stood_on"),
            Self::JumpedOn => write!(f, "jumped_on"),
            Self::EnterWater => write!(f, "enter_water"),
            Self::ExitWater => write!(f, "exit_water"),
            Self::GetHit => write!(f, "get_hit"),
            Self::HitByPlayer => write!(f, "hit_by_player"),
            Self::DriverHitByPlayer => write!(f, "driver_hit_by_player"),
            Self::Die => write!(f, "die"),
            Self::Process => write!(f, "process"),
            Self::ProcessOf(anim) => write!(f, "process_{anim}"),
            Self::Timer => write!(f, "timer"),
            Self::ChangeAnimationFailure => write!(f, "change_animation_failure"),
            Self::ChangeAnimationFailureOf(anim) => {
                write!(f, "change_animation_failure_{anim}")
            }
            Self::FrameEvent(name) => write!(f, "{name}"),
        }
    }
}

/// A value carried in an event context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CtxValue {
    Int(i32),
    Actor(ActorId),
    Str(String),
}

/// Key-value bag attached to an event (`collide_damage` carries `damage`,
/// `get_hit` carries the attacker, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCtx {
    entries: SmallVec<[(&'static str, CtxValue); 2]>,
}

impl EventCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, value: CtxValue) -> Self {
        self.entries.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CtxValue> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    pub fn int(&self, key: &str) -> Option<i32> {
        match self.get(key)? {
            CtxValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn actor(&self, key: &str) -> Option<ActorId> {
        match self.get(key)? {
            CtxValue::Actor(id) => Some(*id),
            _ => None,
        }
    }
}

/// External event-handler executor.
///
/// The integrator never catches handler failures; anything a handler does
/// wrong propagates to whoever invoked the dispatcher.
pub trait Dispatcher {
    fn handle_event(&mut self, actor: ActorId, event: &ObjectEvent, ctx: Option<&EventCtx>);

    /// Execute a command whose scheduled cycle has arrived.
    fn run_command(&mut self, _actor: ActorId, _command: &str) {}

    /// Consulted when an animation reaches its duration; returning a name
    /// switches the actor to that animation before the end events fire.
    fn next_animation(&mut self, _actor: ActorId) -> Option<String> {
        None
    }
}

/// Dispatcher that drops every event; useful for benchmarks and placement
/// helpers that must not trigger gameplay.
impl Dispatcher for () {
    fn handle_event(&mut self, _actor: ActorId, _event: &ObjectEvent, _ctx: Option<&EventCtx>) {}
}
