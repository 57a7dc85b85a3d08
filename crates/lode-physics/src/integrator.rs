//! Per-frame physics integration
//!
//! [`process`] advances one actor by one frame: lifecycle and animation
//! events, acceleration, friction and currents, then pixel-by-pixel
//! vertical and horizontal resolution against the solid map and other
//! actors, then standing, combat and ambient bookkeeping. All arithmetic
//! is integer fixed-point; identical inputs produce bit-identical
//! results.
//!
//! The actor is checked out of the registry for the duration of its
//! step, so every collision query it makes naturally excludes itself.

use glam::IVec2;

use lode_core::fixed::{damp_permille, scale_permille};
use lode_core::{
    ActorId, CtxValue, Dispatcher, EventCtx, FaultPolicy, ObjectEvent, PhysicsFault, Result,
};

use crate::actor::{Actor, CollisionBody, TypeFlags};
use crate::collision::{
    AllowPlatform, CollisionInfo, MoveDirection, entity_collides, entity_collides_with_level,
    non_solid_entity_collides_with_level, point_standable,
};
use crate::world::World;

/// Emit an event for the actor unless it is destroyed; `die` is the one
/// event a destroyed actor still receives.
fn fire(
    dispatcher: &mut dyn Dispatcher,
    actor: &Actor,
    id: ActorId,
    event: ObjectEvent,
    ctx: Option<&EventCtx>,
) {
    if actor.destroyed() && event != ObjectEvent::Die {
        return;
    }
    dispatcher.handle_event(id, &event, ctx);
}

/// Standing probe at the actor's foot point. Platforms stop counting
/// while a fall-through request is pending.
fn is_standing(world: &World, actor: &Actor) -> Option<CollisionInfo> {
    if !actor.has_feet() {
        return None;
    }
    let allow = if actor.fall_through_platforms > 0 {
        AllowPlatform::SolidOnly
    } else {
        AllowPlatform::SolidAndPlatforms
    };
    point_standable(world, actor.feet_x(), actor.feet_y(), allow)
}

fn interpenetration(world: &World, id: ActorId, actor: &Actor) -> PhysicsFault {
    PhysicsFault::Interpenetration {
        actor: id,
        x: actor.x(),
        y: actor.y(),
        cycle: world.cycle(),
    }
}

/// Advance one actor by one frame.
///
/// The actor must not interpenetrate the level on entry; it is
/// guaranteed not to on a successful return. Faults are fatal for the
/// stepped actor except animation-change collisions under
/// [`FaultPolicy::Lenient`], which revert the change and surface as a
/// recoverable error.
pub fn process(world: &mut World, id: ActorId, dispatcher: &mut dyn Dispatcher) -> Result<()> {
    let Some(mut actor) = world.take_actor(id) else {
        return Err(PhysicsFault::MissingActor { actor: id });
    };
    let result = step_actor(world, id, &mut actor, dispatcher);
    world.restore_actor(id, actor);
    result
}

fn step_actor(
    world: &mut World,
    id: ActorId,
    actor: &mut Actor,
    dispatcher: &mut dyn Dispatcher,
) -> Result<()> {
    // Image-bodied actors are static scenery; they never integrate.
    if actor.actor_type().use_image_for_collisions() {
        return Ok(());
    }

    let ignore_collide = actor.actor_type().flags.contains(TypeFlags::IGNORE_COLLIDE);

    if !ignore_collide && entity_collides_with_level(world, actor, MoveDirection::None) {
        log::warn!(
            "actor {:?} ({}) starts cycle {} inside solid geometry at ({}, {})",
            id,
            actor.actor_type().name,
            world.cycle(),
            actor.x(),
            actor.y()
        );
        return Err(interpenetration(world, id, actor));
    }

    let mut stand_info = is_standing(world, actor);
    let started_standing = stand_info.is_some();

    if actor.y() > world.boundaries().y2() {
        actor.hitpoints -= 1;
        if actor.destroyed() {
            fire(dispatcher, actor, id, ObjectEvent::Die, None);
        }
    }

    actor.previous_y = actor.y();
    if (started_standing || actor.standing_on.is_some()) && actor.velocity_y > 0 {
        actor.velocity_y = 0;
    }

    let start_x = actor.x();
    let start_y = actor.y();
    actor.cycle += 1;

    if actor.invincible > 0 {
        actor.invincible -= 1;
    }

    if !actor.loaded {
        fire(dispatcher, actor, id, ObjectEvent::Load, None);
        actor.loaded = true;
    }

    if actor.cycle == 1 {
        fire(dispatcher, actor, id, ObjectEvent::Create, None);
        fire(dispatcher, actor, id, ObjectEvent::DoneCreate, None);
    }

    loop {
        let due = actor.take_scheduled(world.cycle());
        if due.is_empty() {
            break;
        }
        for command in due {
            dispatcher.run_command(id, &command);
        }
    }

    actor.time_in_frame += 1;

    if let Some(info) = &stand_info {
        if info.surface.damage > 0 {
            let ctx = EventCtx::new().with("damage", CtxValue::Int(info.surface.damage));
            fire(dispatcher, actor, id, ObjectEvent::SurfaceDamage, Some(&ctx));
        }
    }

    if actor.time_in_frame == actor.current_frame().duration {
        if let Some(next) = dispatcher.next_animation(id) {
            change_animation(world, id, actor, &next, dispatcher)?;
        }
        // The end events carry the animation that is current *after* any
        // switch above.
        let anim = actor.animation().to_string();
        fire(dispatcher, actor, id, ObjectEvent::EndAnimOf(anim), None);
        fire(dispatcher, actor, id, ObjectEvent::EndAnim, None);
    }

    if let Some(event) = actor.current_frame().event_at(actor.time_in_frame) {
        let event = ObjectEvent::FrameEvent(event.to_string());
        fire(dispatcher, actor, id, event, None);
    }

    let surface_traction = stand_info.as_ref().map_or(0, |i| i.surface.traction);
    let traction_from_surface = scale_permille(surface_traction, actor.actor_type().traction);
    let facing = if actor.face_right { 1 } else { -1 };
    actor.velocity_x +=
        (actor.accel_x * (traction_from_surface + actor.actor_type().traction_in_air) * facing)
            / 1000;
    if actor.standing_on.is_none() || actor.accel_y < 0 {
        // Do not accelerate downward into the thing being stood on.
        actor.velocity_y += actor.accel_y;
    }

    if actor.actor_type().friction != 0 {
        let submerged = world.is_underwater(&actor.body_rect());
        let resistance = if submerged {
            world.water_resistance
        } else {
            world.air_resistance
        };
        let surface_friction = stand_info.as_ref().map_or(0, |i| i.surface.friction);
        let friction = scale_permille(surface_friction + resistance, actor.actor_type().friction);
        let vertical_resistance = scale_permille(resistance, actor.actor_type().friction);
        actor.velocity_x = damp_permille(actor.velocity_x, friction);
        actor.velocity_y = damp_permille(actor.velocity_y, vertical_resistance);
    }

    if actor.actor_type().flags.contains(TypeFlags::AFFECTED_BY_CURRENTS) {
        let push = world.current_force(actor);
        actor.velocity_x += push.x;
        actor.velocity_y += push.y;
    }

    if ignore_collide {
        actor.move_centipixels(actor.velocity_x, actor.velocity_y);
    }

    // Velocity as seen from the ground, folding in the motion of the
    // platform being stood on.
    let mut effective_velocity_x = actor.velocity_x;
    let mut effective_velocity_y = actor.velocity_y;

    if let (Some(platform_id), Some(prev)) = (actor.standing_on, actor.standing_on_prev) {
        if let Some(platform) = world.actor(platform_id) {
            effective_velocity_x += (platform.feet_x() - prev.x) * 100;
            effective_velocity_y += (platform.feet_y() - prev.y) * 100;
        }
    }

    if let Some(info) = &stand_info {
        // Landing on a different support than last frame may require a
        // vertical correction to sit exactly on top of it.
        if info.collide_with != actor.standing_on && info.adjust_y != 0 {
            effective_velocity_y -= info.adjust_y * 100;
        }
    }

    let mut collide_info = CollisionInfo::default();
    let mut jump_on_info = CollisionInfo::default();

    let mut collide = false;
    let object_level_collisions = actor
        .actor_type()
        .flags
        .contains(TypeFlags::OBJECT_LEVEL_COLLISIONS);

    let vertical_steps = (effective_velocity_y / 100).abs();
    let mut n = 0;
    while n <= vertical_steps && !collide && !ignore_collide {
        let dir = if effective_velocity_y / 100 > 0 { 1 } else { -1 };

        if object_level_collisions && non_solid_entity_collides_with_level(world, actor) {
            fire(dispatcher, actor, id, ObjectEvent::CollideLevel, None);
        }

        if effective_velocity_y > 0 {
            if let Some(info) = entity_collides(world, actor, MoveDirection::Down) {
                collide_info = info;
                // The legs but not the feet hit something. Try one pixel
                // right, then two back to the left; a body that fits
                // neither way is wedged in a sub-body-width pit.
                actor.set_pos(actor.x() + 1, actor.y());
                if entity_collides(world, actor, MoveDirection::Down).is_some()
                    || entity_collides(world, actor, MoveDirection::Right).is_some()
                {
                    actor.set_pos(actor.x() - 2, actor.y());
                    if entity_collides(world, actor, MoveDirection::Down).is_some()
                        || entity_collides(world, actor, MoveDirection::Left).is_some()
                    {
                        actor.set_pos(actor.x() + 1, actor.y() - 1);
                        collide = true;
                    }
                }
            }
        } else if let Some(info) = entity_collides(world, actor, MoveDirection::Up) {
            collide_info = info;
            collide = true;
            actor.set_pos(actor.x(), actor.y() + 1);
        }

        if !collide && effective_velocity_y > 0 {
            if let Some(info) = is_standing(world, actor) {
                // Landing on a new support counts as a collision even
                // without an edge hit.
                if info.collide_with.is_none() || info.collide_with != actor.standing_on {
                    collide = true;
                }
                jump_on_info = info;
                break;
            }
        }

        if collide {
            log::debug!(
                "actor {:?} vertical collision at ({}, {}) on cycle {}",
                id,
                actor.x(),
                actor.y(),
                world.cycle()
            );
            break;
        }

        // The last iteration only probes for a collision after the final
        // pixel; it does not move.
        if n < vertical_steps {
            actor.set_pos(actor.x(), actor.y() + dir);
        }
        n += 1;
    }

    if collide {
        if effective_velocity_y < 0 || !started_standing {
            let event = if effective_velocity_y < 0 {
                ObjectEvent::CollideHead
            } else {
                ObjectEvent::CollideFeet
            };
            fire(dispatcher, actor, id, event, None);
        }

        let damage = collide_info.surface.damage.max(jump_on_info.surface.damage);
        if damage > 0 {
            let ctx = EventCtx::new().with("damage", CtxValue::Int(damage));
            fire(dispatcher, actor, id, ObjectEvent::CollideDamage, Some(&ctx));
        }
    }

    collide = false;
    collide_info = CollisionInfo::default();

    let horizontal_steps = (effective_velocity_x / 100).abs();
    let mut n = 0;
    while n < horizontal_steps && !collide && !ignore_collide {
        if object_level_collisions && non_solid_entity_collides_with_level(world, actor) {
            fire(dispatcher, actor, id, ObjectEvent::CollideLevel, None);
        }

        let dir = if effective_velocity_x / 100 > 0 { 1 } else { -1 };
        let original_y = actor.y();

        actor.set_pos(actor.x() + dir, actor.y());

        // Follow slopes: a step that breaks standing may drop a little to
        // find ground again; a step that stays standing may climb a few
        // pixels and settle one above the surface.
        let standing = is_standing(world, actor).is_some();
        if started_standing && !standing {
            let mut max_drop = 2;
            loop {
                max_drop -= 1;
                if max_drop == 0 || is_standing(world, actor).is_some() {
                    break;
                }
                actor.set_pos(actor.x(), actor.y() + 1);
                if entity_collides(world, actor, MoveDirection::None).is_some() {
                    actor.set_pos(actor.x(), actor.y() - 1);
                    break;
                }
            }
        } else if standing {
            let mut max_slope = 5;
            loop {
                max_slope -= 1;
                if max_slope == 0 || is_standing(world, actor).is_none() {
                    break;
                }
                actor.set_pos(actor.x(), actor.y() - 1);
            }

            if max_slope == 0 {
                // Too steep to climb within budget; undo the climb.
                actor.set_pos(actor.x(), original_y);
            } else {
                actor.set_pos(actor.x(), actor.y() + 1);
                if entity_collides(world, actor, MoveDirection::None).is_some() {
                    actor.set_pos(actor.x(), original_y);
                }
            }
        }

        let edge_dir = if dir > 0 {
            MoveDirection::Right
        } else {
            MoveDirection::Left
        };
        if let Some(info) = entity_collides(world, actor, edge_dir) {
            collide_info = info;
            collide = true;
        }

        if collide {
            // Undo the move to cancel out the collision.
            actor.set_pos(actor.x() - dir, original_y);
            break;
        }
        n += 1;
    }

    if collide {
        fire(dispatcher, actor, id, ObjectEvent::Collide, None);
        if collide_info.surface.damage > 0 {
            let ctx = EventCtx::new().with("damage", CtxValue::Int(collide_info.surface.damage));
            fire(dispatcher, actor, id, ObjectEvent::CollideDamage, Some(&ctx));
        }
    }

    stand_info = is_standing(world, actor);
    let new_support = stand_info.as_ref().and_then(|i| i.collide_with);

    if let Some(old_id) = actor.standing_on {
        if new_support != Some(old_id) {
            // Dismounted; inherit the platform's momentum.
            if let Some(platform) = world.actor(old_id) {
                actor.velocity_x += platform.last_move().x * 100;
                actor.velocity_y += platform.last_move().y * 100;
            }
        }
    }

    if let Some(new_id) = new_support {
        if actor.standing_on != Some(new_id) {
            // Newly mounted; cancel drift relative to the platform.
            if let Some(platform) = world.actor(new_id) {
                actor.velocity_x -= platform.last_move().x * 100;
            }
        }
    }

    actor.standing_on = new_support;
    actor.standing_on_prev = actor
        .standing_on
        .and_then(|sid| world.actor(sid))
        .map(|platform| IVec2::new(platform.feet_x(), platform.feet_y()));

    if actor.invincible == 0 {
        if actor.on_players_side() {
            let body = actor.body_rect();
            if let Some(other_id) = world.collide_rect(&body, actor) {
                let harmful = world
                    .actor(other_id)
                    .is_some_and(|o| o.actor_type().flags.contains(TypeFlags::BODY_HARMFUL));
                if harmful {
                    let ctx = EventCtx::new().with("attacker", CtxValue::Actor(other_id));
                    fire(dispatcher, actor, id, ObjectEvent::GetHit, Some(&ctx));
                }
            }
        } else {
            if let Some(player_id) = world.hit_by_player(&actor.body_rect()) {
                let anim = world.actor(player_id).map_or(0, |p| p.animation_id());
                if actor.last_hit_by != Some((player_id, anim)) {
                    actor.last_hit_by = Some((player_id, anim));
                    let ctx = EventCtx::new().with("attacker", CtxValue::Actor(player_id));
                    fire(dispatcher, actor, id, ObjectEvent::HitByPlayer, Some(&ctx));
                }
            }

            if let Some(driver_id) = actor.driver {
                if let Some(driver_body) = world.actor(driver_id).map(|d| d.body_rect()) {
                    if let Some(player_id) = world.hit_by_player(&driver_body) {
                        let anim = world.actor(player_id).map_or(0, |p| p.animation_id());
                        if actor.last_hit_by != Some((player_id, anim)) {
                            actor.last_hit_by = Some((player_id, anim));
                            let ctx =
                                EventCtx::new().with("attacker", CtxValue::Actor(player_id));
                            fire(dispatcher, actor, id, ObjectEvent::DriverHitByPlayer, Some(&ctx));
                        }
                    }
                }
            }
        }
    }

    let submerged = world.is_underwater(&actor.body_rect());
    if submerged && !actor.was_underwater {
        fire(dispatcher, actor, id, ObjectEvent::EnterWater, None);
        actor.was_underwater = true;
    } else if !submerged && actor.was_underwater {
        fire(dispatcher, actor, id, ObjectEvent::ExitWater, None);
        actor.was_underwater = false;
    }

    fire(dispatcher, actor, id, ObjectEvent::Process, None);
    let anim = actor.animation().to_string();
    fire(dispatcher, actor, id, ObjectEvent::ProcessOf(anim), None);

    let timer_frequency = actor.actor_type().timer_frequency;
    if timer_frequency > 0 && actor.cycle % timer_frequency == 0 {
        fire(dispatcher, actor, id, ObjectEvent::Timer, None);
    }

    if actor.fall_through_platforms > 0 {
        actor.fall_through_platforms -= 1;
    }

    if let CollisionBody::Vehicle { passenger } = actor.actor_type().body {
        position_driver(world, actor, passenger);
    }

    actor.last_move = IVec2::new(actor.x() - start_x, actor.y() - start_y);

    if !ignore_collide && entity_collides_with_level(world, actor, MoveDirection::None) {
        log::warn!(
            "actor {:?} ({}) ends cycle {} inside solid geometry at ({}, {})",
            id,
            actor.actor_type().name,
            world.cycle(),
            actor.x(),
            actor.y()
        );
        return Err(interpenetration(world, id, actor));
    }

    Ok(())
}

/// Seat the driver at the vehicle's passenger offset, mirrored by
/// facing.
fn position_driver(world: &mut World, vehicle: &Actor, passenger: IVec2) {
    let Some(driver_id) = vehicle.driver else {
        return;
    };
    let vehicle_width = vehicle.current_frame().width;
    let face_right = vehicle.face_right;
    let (x, y) = (vehicle.x(), vehicle.y());
    if let Some(driver) = world.actor_mut(driver_id) {
        let driver_width = driver.current_frame().width;
        let pos_right = x + passenger.x;
        let pos_left = x + vehicle_width - driver_width - passenger.x;
        driver.face_right = face_right;
        let dx = if face_right { pos_right } else { pos_left };
        driver.set_pos(dx, y + passenger.y);
    }
}

/// Switch an actor to a named animation, firing the leave/enter events
/// and keeping the foot point fixed across differently-sized frames.
///
/// A switch that leaves the body inside solid geometry fires the
/// failure events; if they do not move the actor clear, the change is
/// reverted under [`FaultPolicy::Lenient`] and reported either way.
pub fn set_animation(
    world: &mut World,
    id: ActorId,
    name: &str,
    dispatcher: &mut dyn Dispatcher,
) -> Result<()> {
    let Some(mut actor) = world.take_actor(id) else {
        return Err(PhysicsFault::MissingActor { actor: id });
    };
    let result = change_animation(world, id, &mut actor, name, dispatcher);
    world.restore_actor(id, actor);
    result
}

fn change_animation(
    world: &World,
    id: ActorId,
    actor: &mut Actor,
    name: &str,
    dispatcher: &mut dyn Dispatcher,
) -> Result<()> {
    if !actor.actor_type().has_frame(name) {
        return Err(PhysicsFault::UnknownAnimation {
            actor: id,
            animation: name.to_string(),
        });
    }

    let previous = actor.animation().to_string();
    if name != previous {
        let event = ObjectEvent::LeaveAnimOf(previous.clone());
        fire(dispatcher, actor, id, event, None);
    }

    let start_feet = actor.feet();
    let prev_pos = (actor.x(), actor.y());
    actor.set_animation_raw(name);

    // Keep the feet planted across frames of different sizes.
    let diff = actor.feet() - start_feet;
    actor.set_pos(actor.x() - diff.x, actor.y() - diff.y);

    let facing = if actor.face_right { 1 } else { -1 };
    let frame = actor.current_frame();
    let frame_velocity_x = frame.velocity_x;
    let frame_velocity_y = frame.velocity_y;
    let frame_accel_x = frame.accel_x;
    let frame_accel_y = frame.accel_y;
    if let Some(vx) = frame_velocity_x {
        actor.velocity_x = vx * facing;
    }
    if let Some(vy) = frame_velocity_y {
        actor.velocity_y = vy;
    }
    if let Some(ax) = frame_accel_x {
        actor.accel_x = ax;
    }
    if let Some(ay) = frame_accel_y {
        actor.accel_y = ay;
    }

    if entity_collides_with_level(world, actor, MoveDirection::None) {
        let ctx = EventCtx::new().with("previous_animation", CtxValue::Str(previous.clone()));
        fire(dispatcher, actor, id, ObjectEvent::ChangeAnimationFailure, Some(&ctx));
        let event = ObjectEvent::ChangeAnimationFailureOf(name.to_string());
        fire(dispatcher, actor, id, event, Some(&ctx));

        if entity_collides_with_level(world, actor, MoveDirection::None) {
            log::warn!(
                "actor {:?} switching to animation '{}' interpenetrates at ({}, {})",
                id,
                name,
                actor.x(),
                actor.y()
            );
            if world.fault_policy == FaultPolicy::Lenient {
                actor.set_animation_raw(&previous);
                actor.set_pos(prev_pos.0, prev_pos.1);
            }
            return Err(PhysicsFault::AnimationCollision {
                actor: id,
                animation: name.to_string(),
            });
        }
    }

    fire(dispatcher, actor, id, ObjectEvent::EnterAnim, None);
    let event = ObjectEvent::EnterAnimOf(name.to_string());
    fire(dispatcher, actor, id, event, None);
    Ok(())
}

/// Drop an actor straight down until it stands on something, used when
/// placing actors. Picks the top surface when the start point is
/// already inside standable space.
pub fn move_to_standing(world: &mut World, id: ActorId) -> Result<()> {
    let Some(mut actor) = world.take_actor(id) else {
        return Err(PhysicsFault::MissingActor { actor: id });
    };
    settle_to_standing(world, &mut actor);
    world.restore_actor(id, actor);
    Ok(())
}

const SETTLE_LIMIT: i32 = 10000;

fn settle_to_standing(world: &World, actor: &mut Actor) {
    let start_y = actor.y();
    for n in 0..SETTLE_LIMIT {
        if is_standing(world, actor).is_some() {
            if n == 0 {
                // Already standing at the start point; scan up in case
                // this is open space under an overhang rather than the
                // actual surface.
                for _ in 0..SETTLE_LIMIT {
                    actor.set_pos(actor.x(), actor.y() - 1);
                    if is_standing(world, actor).is_none() {
                        actor.set_pos(actor.x(), actor.y() + 1);

                        if actor.y() < world.boundaries().y {
                            // Above the level; push down under the solid
                            // and settle again from there.
                            for _ in 0..SETTLE_LIMIT {
                                actor.set_pos(actor.x(), actor.y() + 1);
                                if is_standing(world, actor).is_none() {
                                    settle_to_standing(world, actor);
                                    return;
                                }
                            }
                        }

                        return;
                    }
                }
                return;
            }
            return;
        }

        actor.set_pos(actor.x(), actor.y() + 1);
    }

    actor.set_pos(actor.x(), start_y);
    log::warn!(
        "no standable surface below ({}, {}) within {} pixels",
        actor.x(),
        start_y,
        SETTLE_LIMIT
    );
}

/// Record that `rider` began standing on `platform` and notify it.
pub fn stood_on_by(
    world: &mut World,
    platform: ActorId,
    rider: ActorId,
    dispatcher: &mut dyn Dispatcher,
) {
    let Some(platform_actor) = world.actor(platform) else {
        return;
    };
    let ctx = EventCtx::new().with("rider", CtxValue::Actor(rider));
    fire(dispatcher, platform_actor, platform, ObjectEvent::StoodOn, Some(&ctx));
}

/// Record that `jumper` bounced on `target`'s head and notify it.
/// Returns whether the target is springy enough to bounce off at all.
pub fn spring_off_head(
    world: &mut World,
    target: ActorId,
    jumper: ActorId,
    dispatcher: &mut dyn Dispatcher,
) -> bool {
    let Some(target_actor) = world.actor_mut(target) else {
        return false;
    };
    if target_actor.actor_type().springiness == 0 {
        return false;
    }
    target_actor.last_jumped_on_by = Some(jumper);
    let Some(target_actor) = world.actor(target) else {
        return false;
    };
    let ctx = EventCtx::new().with("rider", CtxValue::Actor(jumper));
    fire(dispatcher, target_actor, target, ObjectEvent::JumpedOn, Some(&ctx));
    true
}

/// Kill an actor outright; `die` is the one event that still fires.
pub fn kill(world: &mut World, id: ActorId, dispatcher: &mut dyn Dispatcher) {
    if let Some(actor) = world.actor_mut(id) {
        actor.hitpoints = 0;
        dispatcher.handle_event(id, &ObjectEvent::Die, None);
    }
}
