//! Collision queries against the solid maps and actor bodies
//!
//! Everything here is a read-only probe. The integrator moves an actor
//! one pixel at a time and asks these functions whether the new position
//! is legal; nothing in this module mutates the world.
//!
//! The stepped actor is expected to be checked out of the registry while
//! these run, so iterating the registry naturally skips it.

use glam::IVec2;

use lode_core::{ActorId, Rect};

use crate::actor::Actor;
use crate::solid_map::Surface;
use crate::world::World;

/// Direction of travel for an edge probe. `None` means a full-body test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveDirection {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

/// Whether a standing probe accepts platform surfaces or only solid ones.
/// Fall-through requests and downward-moving drops pick `SolidOnly`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowPlatform {
    SolidOnly,
    SolidAndPlatforms,
}

/// Result of a single collision probe. Default-constructed means
/// "no collision": zeroed surface and no colliding actor.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollisionInfo {
    pub surface: Surface,
    /// Pixels the prober must rise to sit exactly on the surface.
    pub adjust_y: i32,
    pub platform: bool,
    pub collide_with: Option<ActorId>,
}

impl CollisionInfo {
    fn from_surface(surface: Surface) -> Self {
        Self {
            surface,
            ..Self::default()
        }
    }
}

/// Whether a foot point rests on something standable.
///
/// Tile cells are consulted first (solid always, platform tiles only
/// when `allow` permits), then other actors' bodies and platform
/// regions.
pub fn point_standable(world: &World, x: i32, y: i32, allow: AllowPlatform) -> Option<CollisionInfo> {
    if let Some(surface) = world.solid_at(x, y) {
        return Some(CollisionInfo::from_surface(surface));
    }

    if allow == AllowPlatform::SolidAndPlatforms {
        if let Some(surface) = world.standable_at(x, y) {
            let mut info = CollisionInfo::from_surface(surface);
            info.platform = true;
            return Some(info);
        }
    }

    for (id, other) in world.actors() {
        if let Some(info) = actor_standable(other, id, x, y, allow) {
            return Some(info);
        }
    }

    None
}

/// One actor's answer to "can a foot rest at this point on you".
///
/// The body path requires a solid, non-springy, harmless body. Image
/// bodies walk upward from the probe to find how far the foot must rise
/// to sit on the surface. The platform-region path accepts any vertical
/// position between the platform's previous and current location so a
/// moving platform cannot out-run a rider within one frame.
fn actor_standable(other: &Actor, id: ActorId, x: i32, y: i32, allow: AllowPlatform) -> Option<CollisionInfo> {
    let ty = other.actor_type();

    if other.blocks()
        && ty.springiness == 0
        && !ty.flags.contains(crate::actor::TypeFlags::BODY_HARMFUL)
        && other.point_collides(x, y)
    {
        let mut info = CollisionInfo::from_surface(Surface {
            friction: ty.surface_friction,
            traction: ty.surface_traction,
            damage: 0,
        });
        if ty.use_image_for_collisions() {
            let mut rise = 0;
            let height = other.current_frame().height;
            while rise < height && other.point_collides(x, y - rise - 1) {
                rise += 1;
            }
            info.adjust_y = rise;
        } else {
            info.adjust_y = y - other.body_rect().y;
        }
        info.collide_with = Some(id);
        return Some(info);
    }

    if allow == AllowPlatform::SolidAndPlatforms {
        if let Some(platform) = other.current_frame().platform {
            let mut y1 = other.y() + platform.y;
            let mut y2 = other.previous_y + platform.y;
            if y1 > y2 {
                std::mem::swap(&mut y1, &mut y2);
            }
            if y < y1 || y > y2 {
                return None;
            }
            let x1 = other.x() + platform.x;
            if x < x1 || x >= x1 + platform.w {
                return None;
            }
            let mut info = CollisionInfo::from_surface(Surface {
                friction: ty.surface_friction,
                traction: ty.surface_traction,
                damage: 0,
            });
            info.adjust_y = y - (other.y() + platform.y);
            info.platform = true;
            info.collide_with = Some(id);
            return Some(info);
        }
    }

    None
}

/// The leading edge of a body rect for a given travel direction, as an
/// inclusive pixel span.
fn leading_edge(body: &Rect, dir: MoveDirection) -> Rect {
    match dir {
        MoveDirection::Up => Rect::new(body.x, body.y, body.w, 1),
        MoveDirection::Down => Rect::new(body.x, body.y2() - 1, body.w, 1),
        MoveDirection::Left => Rect::new(body.x, body.y, 1, body.h),
        MoveDirection::Right => Rect::new(body.x2() - 1, body.y, 1, body.h),
        MoveDirection::None => *body,
    }
}

/// Directional edge test used inside the stepping loop.
///
/// Only the leading edge of the body in the direction of travel is
/// probed; the trailing edge may legitimately still overlap the surface
/// it just left. A full-body test uses [`MoveDirection::None`].
pub fn entity_collides(world: &World, actor: &Actor, dir: MoveDirection) -> Option<CollisionInfo> {
    if actor.actor_type().flags.contains(crate::actor::TypeFlags::IGNORE_COLLIDE) {
        return None;
    }

    if actor.actor_type().use_image_for_collisions() {
        return mask_collides_with_level(world, actor).then(CollisionInfo::default);
    }

    let edge = leading_edge(&actor.body_rect(), dir);

    if world.solid_map().may_contain_solid(&edge) {
        for y in edge.y..edge.y2() {
            for x in edge.x..edge.x2() {
                if let Some(surface) = world.solid_at(x, y) {
                    return Some(CollisionInfo::from_surface(surface));
                }
            }
        }
    }

    for (id, other) in world.actors() {
        if !other.blocks() {
            continue;
        }
        if other.rect_collides(&edge) {
            let mut info = CollisionInfo::from_surface(Surface {
                friction: other.actor_type().surface_friction,
                traction: other.actor_type().surface_traction,
                damage: other.actor_type().contact_damage,
            });
            info.collide_with = Some(id);
            return Some(info);
        }
    }

    None
}

/// Edge test against tiles only, ignoring other actors.
pub fn entity_collides_with_level(world: &World, actor: &Actor, dir: MoveDirection) -> bool {
    if actor.actor_type().flags.contains(crate::actor::TypeFlags::IGNORE_COLLIDE) {
        return false;
    }
    if actor.actor_type().use_image_for_collisions() {
        return mask_collides_with_level(world, actor);
    }

    let edge = leading_edge(&actor.body_rect(), dir);
    if !world.solid_map().may_contain_solid(&edge) {
        return false;
    }
    for y in edge.y..edge.y2() {
        for x in edge.x..edge.x2() {
            if world.solid_at(x, y).is_some() {
                return true;
            }
        }
    }
    false
}

/// Whether any opaque pixel of an actor's frame overlaps the solid map,
/// regardless of its solid body. Used for `collide_level` notifications,
/// which fire even for actors with no solid footprint at all.
pub fn non_solid_entity_collides_with_level(world: &World, actor: &Actor) -> bool {
    let area = actor.frame_rect();
    if !world.solid_map().may_contain_solid(&area) {
        return false;
    }
    let frame = actor.current_frame();
    for y in area.y..area.y2() {
        for x in area.x..area.x2() {
            if world.solid_at(x, y).is_some()
                && frame.opaque(
                    x - actor.x(),
                    y - actor.y(),
                    actor.face_right,
                    actor.upside_down,
                )
            {
                return true;
            }
        }
    }
    false
}

fn mask_collides_with_level(world: &World, actor: &Actor) -> bool {
    non_solid_entity_collides_with_level(world, actor)
}

/// Whether two actors' solid footprints overlap. Rect bodies compare
/// rects; a mask on either side falls back to sampling the overlap.
pub fn entity_collides_with_entity(a: &Actor, b: &Actor) -> bool {
    let a_mask = a.actor_type().use_image_for_collisions();
    let b_mask = b.actor_type().use_image_for_collisions();
    if !a_mask && !b_mask {
        return a.body_rect().intersects(&b.body_rect());
    }

    let a_area = if a_mask { a.frame_rect() } else { a.body_rect() };
    let b_area = if b_mask { b.frame_rect() } else { b.body_rect() };
    let Some(overlap) = a_area.intersection(&b_area) else {
        return false;
    };
    for y in overlap.y..overlap.y2() {
        for x in overlap.x..overlap.x2() {
            if a.point_collides(x, y) && b.point_collides(x, y) {
                return true;
            }
        }
    }
    false
}

/// First y at or around the given point where a foot could rest,
/// searching at most `max_search` pixels in either direction. The
/// surface y is the first solid pixel with clear space above it.
pub fn find_ground_level(world: &World, x: i32, y: i32, max_search: i32) -> Option<i32> {
    if world.solid_at(x, y).is_some() {
        let mut yy = y;
        while yy > y - max_search {
            if world.solid_at(x, yy - 1).is_none() {
                return Some(yy);
            }
            yy -= 1;
        }
        None
    } else {
        let mut yy = y + 1;
        while yy <= y + max_search {
            if world.solid_at(x, yy).is_some() {
                return Some(yy);
            }
            yy += 1;
        }
        None
    }
}

/// Signed slope in degrees under an actor's feet, sampled `range`
/// pixels to either side of the foot point. Positive slopes ascend in
/// the facing direction. Returns zero off the ground or on flat tiles.
pub fn slope_standing_on(world: &World, actor: &Actor, range: i32) -> i32 {
    let forward = if actor.face_right { 1 } else { -1 };
    let x = actor.feet_x();
    let mut y = actor.feet_y();

    let mut n = 0;
    while world.solid_at(x, y).is_none() && n != 10 {
        y += 1;
        n += 1;
    }
    if world.solid_at(x, y).is_none() {
        return 0;
    }

    if range == 1 {
        if world.solid_at(x + forward, y - 1).is_some() && world.solid_at(x - forward, y).is_none() {
            return 45;
        }
        if world.solid_at(x + forward, y).is_none() && world.solid_at(x - forward, y - 1).is_some() {
            return -45;
        }
        return 0;
    }

    let mut range = range;
    let mut samples = None;
    while range > 0 {
        let ahead = find_ground_level(world, x + forward * range, y, range + 1);
        let behind = find_ground_level(world, x - forward * range, y, range + 1);
        if let (Some(y1), Some(y2)) = (ahead, behind) {
            samples = Some((y1, y2, range));
            break;
        }
        range -= 1;
    }
    let Some((y1, y2, range)) = samples else {
        return 0;
    };
    let dy = y2 - y1;
    let dx = range * 2;
    (dy * 45) / dx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::actor::{ActorType, CollisionBody};
    use crate::frame::{AlphaMask, Frame, PlatformRegion};

    fn world_with_floor(floor_y: i32) -> World {
        let mut world = World::new(Rect::new(-1000, -1000, 4000, 4000));
        world.solid_map_mut().set_rect(
            Rect::new(-500, floor_y, 2000, 64),
            Surface { friction: 100, traction: 1000, damage: 0 },
            true,
        );
        world
    }

    fn box_type(w: i32, h: i32) -> Arc<ActorType> {
        Arc::new(ActorType::new("box", Frame::new(w, h, 1000)))
    }

    #[test]
    fn test_point_standable_on_tiles() {
        let world = world_with_floor(100);
        assert!(point_standable(&world, 10, 100, AllowPlatform::SolidAndPlatforms).is_some());
        assert!(point_standable(&world, 10, 99, AllowPlatform::SolidAndPlatforms).is_none());
    }

    #[test]
    fn test_point_standable_skips_platform_tiles_when_solid_only() {
        let mut world = World::new(Rect::new(0, 0, 1000, 1000));
        world.standable_map_mut().set_rect(
            Rect::new(0, 100, 200, 4),
            Surface { friction: 50, traction: 900, damage: 0 },
            true,
        );
        assert!(point_standable(&world, 10, 101, AllowPlatform::SolidAndPlatforms).is_some());
        assert!(point_standable(&world, 10, 101, AllowPlatform::SolidOnly).is_none());

        let info = point_standable(&world, 10, 101, AllowPlatform::SolidAndPlatforms).unwrap();
        assert!(info.platform);
        assert_eq!(info.surface.traction, 900);
    }

    #[test]
    fn test_standing_on_another_body_reports_adjust() {
        let mut world = World::new(Rect::new(0, 0, 1000, 1000));
        let id = world.add_actor(crate::actor::Actor::new(box_type(20, 10), 50, 90, true));

        let info = point_standable(&world, 55, 93, AllowPlatform::SolidAndPlatforms).unwrap();
        assert_eq!(info.collide_with, Some(id));
        assert!(!info.platform);
        assert_eq!(info.adjust_y, 3);
    }

    #[test]
    fn test_platform_region_tolerates_previous_position() {
        let mut world = World::new(Rect::new(0, 0, 1000, 1000));
        let mut frame = Frame::new(40, 8, 1000);
        frame.body = Rect::new(0, 0, 0, 0);
        frame.platform = Some(PlatformRegion { x: 0, y: 0, w: 40 });
        let mut ty = ActorType::new("lift", frame);
        ty.flags |= crate::actor::TypeFlags::BODY_PASSTHROUGH;
        let mut lift = crate::actor::Actor::new(Arc::new(ty), 100, 200, true);
        lift.previous_y = 206;
        let id = world.add_actor(lift);

        // Any y between the previous and current platform line counts.
        for y in 200..=206 {
            let info = point_standable(&world, 120, y, AllowPlatform::SolidAndPlatforms)
                .unwrap_or_else(|| panic!("y={y} should be standable"));
            assert!(info.platform);
            assert_eq!(info.collide_with, Some(id));
        }
        assert!(point_standable(&world, 120, 199, AllowPlatform::SolidAndPlatforms).is_none());
        assert!(point_standable(&world, 120, 207, AllowPlatform::SolidAndPlatforms).is_none());
        assert!(point_standable(&world, 141, 203, AllowPlatform::SolidAndPlatforms).is_none());
        assert!(point_standable(&world, 120, 203, AllowPlatform::SolidOnly).is_none());
    }

    #[test]
    fn test_image_body_walks_up_to_surface() {
        let mut frame = Frame::new(4, 4, 1000);
        frame.mask = Some(AlphaMask::from_rows(&[
            "....", //
            "..##",
            ".###",
            "####",
        ]));
        let mut ty = ActorType::new("hill", frame);
        ty.body = CollisionBody::ImageMask;
        let mut world = World::new(Rect::new(0, 0, 1000, 1000));
        world.add_actor(crate::actor::Actor::new(Arc::new(ty), 0, 0, true));

        let info = point_standable(&world, 2, 3, AllowPlatform::SolidAndPlatforms).unwrap();
        assert_eq!(info.adjust_y, 2);
    }

    #[test]
    fn test_entity_collides_leading_edge_only() {
        let world = world_with_floor(100);
        let mut actor = crate::actor::Actor::new(box_type(10, 20), 50, 81, true);

        // Feet row overlaps the floor, head row is clear.
        assert!(entity_collides(&world, &actor, MoveDirection::Down).is_some());
        assert!(entity_collides(&world, &actor, MoveDirection::Up).is_none());

        actor.set_pos(50, 79);
        assert!(entity_collides(&world, &actor, MoveDirection::Down).is_none());
    }

    #[test]
    fn test_entity_collides_reports_blocking_actor() {
        let mut world = World::new(Rect::new(0, 0, 1000, 1000));
        let mut wall_type = ActorType::new("wall", Frame::new(10, 50, 1000));
        wall_type.contact_damage = 3;
        let wall = world.add_actor(crate::actor::Actor::new(Arc::new(wall_type), 100, 0, true));

        let mover = crate::actor::Actor::new(box_type(10, 20), 91, 10, true);
        let info = entity_collides(&world, &mover, MoveDirection::Right).unwrap();
        assert_eq!(info.collide_with, Some(wall));
        assert_eq!(info.surface.damage, 3);
        assert!(entity_collides(&world, &mover, MoveDirection::Left).is_none());
    }

    #[test]
    fn test_passthrough_bodies_do_not_block() {
        let mut world = World::new(Rect::new(0, 0, 1000, 1000));
        let mut ghost_type = ActorType::new("ghost", Frame::new(10, 50, 1000));
        ghost_type.flags |= crate::actor::TypeFlags::BODY_PASSTHROUGH;
        world.add_actor(crate::actor::Actor::new(Arc::new(ghost_type), 100, 0, true));

        let mover = crate::actor::Actor::new(box_type(10, 20), 95, 10, true);
        assert!(entity_collides(&world, &mover, MoveDirection::Right).is_none());
    }

    #[test]
    fn test_non_solid_overlap_samples_frame_opacity() {
        let world = world_with_floor(100);
        let mut frame = Frame::new(10, 10, 1000);
        frame.body = Rect::new(0, 0, 0, 0);
        let ty = Arc::new(ActorType::new("wisp", frame));
        let wisp = crate::actor::Actor::new(ty, 50, 95, true);

        // No solid body, but the frame image overlaps the floor.
        assert!(non_solid_entity_collides_with_level(&world, &wisp));
        assert!(!entity_collides_with_level(&world, &wisp, MoveDirection::None));
    }

    #[test]
    fn test_find_ground_level_searches_both_ways() {
        let world = world_with_floor(100);
        assert_eq!(find_ground_level(&world, 10, 95, 10), Some(100));
        assert_eq!(find_ground_level(&world, 10, 110, 15), Some(100));
        assert_eq!(find_ground_level(&world, 10, 50, 10), None);
    }

    #[test]
    fn test_slope_standing_on_flat_and_stairs() {
        let surface = Surface { friction: 100, traction: 1000, damage: 0 };
        let mut world = World::new(Rect::new(0, 0, 1000, 1000));
        // Ledge with the foot point on its left edge.
        world.solid_map_mut().set_rect(Rect::new(50, 100, 10, 4), surface, true);
        // Feet land at (50, 100).
        let actor = crate::actor::Actor::new(box_type(10, 20), 45, 80, true);
        assert_eq!(slope_standing_on(&world, &actor, 1), 0);

        // A one-pixel step ahead with air behind reads as ascending.
        world.solid_map_mut().set_rect(Rect::new(51, 99, 9, 1), surface, true);
        assert_eq!(slope_standing_on(&world, &actor, 1), 45);
    }
}
