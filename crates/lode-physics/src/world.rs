//! World state the integrator runs against
//!
//! Owns the solid and platform tile maps, water areas and currents, the
//! actor registry, and the frame counter. Actors are handed out as
//! generation-checked [`ActorId`]s; a stale handle simply stops
//! resolving, it never dangles.

use glam::IVec2;

use lode_core::{ActorId, FaultPolicy, Rect, Registry};

use crate::actor::Actor;
use crate::solid_map::{SolidMap, Surface};

/// Ambient damping applied per frame out of water, per mille.
pub const DEFAULT_AIR_RESISTANCE: i32 = 20;
/// Ambient damping applied per frame while submerged, per mille.
pub const DEFAULT_WATER_RESISTANCE: i32 = 100;

/// A region that pushes actors, in centipixels per frame before mass
/// scaling.
#[derive(Debug, Clone, Copy)]
pub struct Current {
    pub area: Rect,
    pub delta: IVec2,
}

pub struct World {
    boundaries: Rect,
    solid: SolidMap,
    standable: SolidMap,
    water_areas: Vec<Rect>,
    currents: Vec<Current>,
    pub air_resistance: i32,
    pub water_resistance: i32,
    pub fault_policy: FaultPolicy,
    cycle: i32,
    actors: Registry<Actor>,
    players: Vec<ActorId>,
}

impl World {
    pub fn new(boundaries: Rect) -> Self {
        Self {
            boundaries,
            solid: SolidMap::new(),
            standable: SolidMap::new(),
            water_areas: Vec::new(),
            currents: Vec::new(),
            air_resistance: DEFAULT_AIR_RESISTANCE,
            water_resistance: DEFAULT_WATER_RESISTANCE,
            fault_policy: FaultPolicy::default(),
            cycle: 0,
            actors: Registry::new(),
            players: Vec::new(),
        }
    }

    /// Area outside which actors are destroyed.
    pub fn boundaries(&self) -> Rect {
        self.boundaries
    }

    pub fn cycle(&self) -> i32 {
        self.cycle
    }

    pub fn advance_cycle(&mut self) {
        self.cycle += 1;
    }

    pub fn solid_map(&self) -> &SolidMap {
        &self.solid
    }

    pub fn solid_map_mut(&mut self) -> &mut SolidMap {
        &mut self.solid
    }

    /// Platform tiles: standable from above, never blocking.
    pub fn standable_map(&self) -> &SolidMap {
        &self.standable
    }

    pub fn standable_map_mut(&mut self) -> &mut SolidMap {
        &mut self.standable
    }

    pub fn solid_at(&self, x: i32, y: i32) -> Option<Surface> {
        self.solid.query(x, y)
    }

    pub fn standable_at(&self, x: i32, y: i32) -> Option<Surface> {
        self.standable.query(x, y)
    }

    pub fn add_water(&mut self, area: Rect) {
        self.water_areas.push(area);
    }

    pub fn add_current(&mut self, current: Current) {
        self.currents.push(current);
    }

    /// A body counts as submerged when its midpoint is inside a water
    /// area.
    pub fn is_underwater(&self, body: &Rect) -> bool {
        let mid = body.midpoint();
        self.water_areas.iter().any(|w| w.contains(mid))
    }

    /// Net push on an actor from every current overlapping its body,
    /// scaled down by mass. Massless actors are unaffected.
    pub fn current_force(&self, actor: &Actor) -> IVec2 {
        let mass = actor.actor_type().mass;
        if mass == 0 {
            return IVec2::ZERO;
        }
        let body = actor.body_rect();
        let mut delta = IVec2::ZERO;
        for current in &self.currents {
            if current.area.intersects(&body) {
                delta += current.delta;
            }
        }
        delta / mass
    }

    pub fn add_actor(&mut self, actor: Actor) -> ActorId {
        self.actors.insert(actor)
    }

    /// Register an actor as a player. Players are skipped by hostile
    /// contact queries and drive [`World::hit_by_player`].
    pub fn add_player(&mut self, actor: Actor) -> ActorId {
        let id = self.actors.insert(actor);
        self.players.push(id);
        id
    }

    /// Remove an actor, clearing any support references pointing at it.
    pub fn remove_actor(&mut self, id: ActorId) -> Option<Actor> {
        let removed = self.actors.remove(id)?;
        self.players.retain(|p| *p != id);
        for (_, other) in self.actors.iter_mut() {
            if other.standing_on == Some(id) {
                other.standing_on = None;
                other.standing_on_prev = None;
            }
            if other.driver == Some(id) {
                other.driver = None;
            }
        }
        Some(removed)
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id)
    }

    pub fn contains_actor(&self, id: ActorId) -> bool {
        self.actors.contains(id)
    }

    /// Check an actor out of the registry for its integration step.
    /// While checked out it is invisible to collision queries.
    pub(crate) fn take_actor(&mut self, id: ActorId) -> Option<Actor> {
        self.actors.take(id)
    }

    pub(crate) fn restore_actor(&mut self, id: ActorId, actor: Actor) {
        self.actors.restore(id, actor);
    }

    pub fn actors(&self) -> impl Iterator<Item = (ActorId, &Actor)> {
        self.actors.iter()
    }

    pub fn actors_mut(&mut self) -> impl Iterator<Item = (ActorId, &mut Actor)> {
        self.actors.iter_mut()
    }

    pub fn actor_ids(&self) -> Vec<ActorId> {
        self.actors.ids()
    }

    pub fn players(&self) -> &[ActorId] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// First hostile body or attack area covering a point, from the
    /// point of view of `for_actor`. Friendly bodies are invisible to a
    /// friendly prober, except harmful ones which stay dangerous. A
    /// harmful body is preferred over a merely blocking one covering
    /// the same point.
    pub fn collide_point(&self, x: i32, y: i32, for_actor: &Actor) -> Option<ActorId> {
        let players_side = for_actor.on_players_side();
        let mut harmless = None;
        for (id, c) in self.actors.iter() {
            if c.destroyed() || c.is_player() {
                continue;
            }
            let harmful = c.actor_type().flags.contains(crate::actor::TypeFlags::BODY_HARMFUL);
            if players_side && c.on_players_side() && !harmful {
                continue;
            }
            let touched = ((c.blocks() || (players_side && harmful)) && c.point_collides(x, y))
                || c.hit_rect().is_some_and(|hit| hit.contains(IVec2::new(x, y)));
            if touched {
                if harmful {
                    return Some(id);
                }
                harmless.get_or_insert(id);
            }
        }
        harmless
    }

    /// Rect variant of [`World::collide_point`], with the same
    /// preference for harmful bodies.
    pub fn collide_rect(&self, r: &Rect, for_actor: &Actor) -> Option<ActorId> {
        let players_side = for_actor.on_players_side();
        let mut harmless = None;
        for (id, c) in self.actors.iter() {
            if c.destroyed() || c.is_player() {
                continue;
            }
            let harmful = c.actor_type().flags.contains(crate::actor::TypeFlags::BODY_HARMFUL);
            if players_side && c.on_players_side() && !harmful {
                continue;
            }
            let touched = ((c.blocks() || (players_side && harmful)) && c.rect_collides(r))
                || c.hit_rect().is_some_and(|hit| hit.intersects(r));
            if touched {
                if harmful {
                    return Some(id);
                }
                harmless.get_or_insert(id);
            }
        }
        harmless
    }

    /// The player whose attack area overlaps the rect, if any.
    pub fn hit_by_player(&self, r: &Rect) -> Option<ActorId> {
        for &id in &self.players {
            let Some(player) = self.actors.get(id) else {
                continue;
            };
            if let Some(hit) = player.hit_rect() {
                if hit.intersects(r) {
                    return Some(id);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::actor::{ActorType, TypeFlags};
    use crate::frame::Frame;

    fn simple_type(name: &str, flags: TypeFlags) -> Arc<ActorType> {
        let mut ty = ActorType::new(name, Frame::new(10, 10, 1000));
        ty.flags |= flags;
        Arc::new(ty)
    }

    #[test]
    fn test_underwater_uses_midpoint() {
        let mut world = World::new(Rect::new(0, 0, 1000, 1000));
        world.add_water(Rect::new(0, 500, 1000, 500));
        // Midpoint at y=502 is in, midpoint at y=498 is out.
        assert!(world.is_underwater(&Rect::new(10, 497, 10, 10)));
        assert!(!world.is_underwater(&Rect::new(10, 493, 10, 10)));
    }

    #[test]
    fn test_current_force_scaled_by_mass() {
        let mut world = World::new(Rect::new(0, 0, 1000, 1000));
        world.add_current(Current {
            area: Rect::new(0, 0, 100, 100),
            delta: IVec2::new(40, -10),
        });

        let mut heavy_type = ActorType::new("heavy", Frame::new(10, 10, 1000));
        heavy_type.mass = 4;
        let heavy = Actor::new(Arc::new(heavy_type), 20, 20, true);
        assert_eq!(world.current_force(&heavy), IVec2::new(10, -2));

        let mut massless_type = ActorType::new("anchor", Frame::new(10, 10, 1000));
        massless_type.mass = 0;
        let anchor = Actor::new(Arc::new(massless_type), 20, 20, true);
        assert_eq!(world.current_force(&anchor), IVec2::ZERO);

        let outside = Actor::new(simple_type("out", TypeFlags::empty()), 500, 500, true);
        assert_eq!(world.current_force(&outside), IVec2::ZERO);
    }

    #[test]
    fn test_collide_point_filters_friendlies() {
        let mut world = World::new(Rect::new(0, 0, 1000, 1000));
        world.add_actor(Actor::new(
            simple_type("ally", TypeFlags::ON_PLAYERS_SIDE),
            100,
            100,
            true,
        ));
        let spike = world.add_actor(Actor::new(
            simple_type("spike", TypeFlags::BODY_HARMFUL),
            200,
            100,
            true,
        ));

        let player = Actor::new(simple_type("hero", TypeFlags::IS_PLAYER), 0, 0, true);
        // Friendly body is invisible to a friendly prober.
        assert_eq!(world.collide_point(105, 105, &player), None);
        assert_eq!(world.collide_point(205, 105, &player), Some(spike));

        let neutral = Actor::new(simple_type("rock", TypeFlags::empty()), 0, 0, true);
        assert!(world.collide_point(105, 105, &neutral).is_some());
    }

    #[test]
    fn test_collide_queries_prefer_harmful_bodies() {
        let mut world = World::new(Rect::new(0, 0, 1000, 1000));
        // The harmless blocker occupies the earlier slot.
        let blocker = world.add_actor(Actor::new(
            simple_type("crate", TypeFlags::empty()),
            100,
            100,
            true,
        ));
        let spike = world.add_actor(Actor::new(
            simple_type("spike", TypeFlags::BODY_HARMFUL),
            100,
            100,
            true,
        ));

        let neutral = Actor::new(simple_type("rock", TypeFlags::empty()), 0, 0, true);
        assert_eq!(world.collide_point(105, 105, &neutral), Some(spike));
        assert_eq!(
            world.collide_rect(&Rect::new(104, 104, 2, 2), &neutral),
            Some(spike)
        );

        world.actor_mut(spike).unwrap().set_pos(500, 500);
        assert_eq!(world.collide_point(105, 105, &neutral), Some(blocker));
    }

    #[test]
    fn test_remove_actor_clears_support_references() {
        let mut world = World::new(Rect::new(0, 0, 1000, 1000));
        let platform = world.add_actor(Actor::new(simple_type("lift", TypeFlags::empty()), 0, 50, true));
        let rider_id = world.add_actor(Actor::new(simple_type("rider", TypeFlags::empty()), 0, 40, true));
        world.actor_mut(rider_id).unwrap().standing_on = Some(platform);

        world.remove_actor(platform);
        assert!(world.actor(platform).is_none());
        assert_eq!(world.actor(rider_id).unwrap().standing_on, None);
    }

    #[test]
    fn test_hit_by_player_uses_attack_area() {
        let mut world = World::new(Rect::new(0, 0, 1000, 1000));
        let mut frame = Frame::new(10, 10, 1000);
        frame.hit_area = Some(Rect::new(10, 0, 8, 10));
        let hero_type = {
            let mut ty = ActorType::new("hero", frame);
            ty.flags |= TypeFlags::IS_PLAYER;
            Arc::new(ty)
        };
        let hero = world.add_player(Actor::new(hero_type, 100, 100, true));

        assert_eq!(world.hit_by_player(&Rect::new(112, 102, 4, 4)), Some(hero));
        assert_eq!(world.hit_by_player(&Rect::new(90, 102, 4, 4)), None);
    }
}
