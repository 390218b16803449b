use std::time::Duration;

use glam::Vec2;
use warden_core::{
    Command, EnemyId, EnemyKind, EnemyLayout, Event, ItemId, ItemKind, LineOfSight, PickupError,
    Point, Segment,
};
use warden_world::{self as world, query, World};

fn spawn_guard(world: &mut World, position: Point) -> EnemyId {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SpawnEnemy {
            kind: EnemyKind::Guard,
            position,
            layout: EnemyLayout::default(),
            equipped: None,
        },
        &mut events,
    );
    match events.as_slice() {
        [Event::EnemySpawned { enemy, .. }] => *enemy,
        other => panic!("unexpected events: {other:?}"),
    }
}

fn spawn_item(world: &mut World, kind: ItemKind, position: Point) -> ItemId {
    let mut events = Vec::new();
    world::apply(world, Command::SpawnItem { kind, position }, &mut events);
    match events.as_slice() {
        [Event::ItemSpawned { item, .. }] => *item,
        other => panic!("unexpected events: {other:?}"),
    }
}

#[test]
fn configured_walls_obstruct_line_of_sight() {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureLevel {
            walls: vec![Segment::new(Point::new(2.0, -5.0), Point::new(2.0, 5.0))],
            global_waypoints: vec![Point::new(4.0, 0.0)],
        },
        &mut events,
    );

    assert_eq!(
        events,
        vec![Event::LevelConfigured {
            wall_count: 1,
            global_waypoint_count: 1
        }]
    );
    let level = query::level(&world);
    assert!(level.is_obstructed(Point::ORIGIN, Point::new(4.0, 0.0)));
    assert!(!level.is_obstructed(Point::ORIGIN, Point::new(1.0, 3.0)));
    assert_eq!(query::global_waypoints(&world).points(), &[Point::new(4.0, 0.0)]);
}

#[test]
fn ticks_accumulate_simulated_time() {
    let mut world = World::new();
    let mut events = Vec::new();
    for _ in 0..3 {
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(250),
            },
            &mut events,
        );
    }

    assert_eq!(query::tick_index(&world), 3);
    assert_eq!(query::elapsed(&world), Duration::from_millis(750));
    assert_eq!(events.len(), 3);
}

#[test]
fn move_enemy_reports_both_positions() {
    let mut world = World::new();
    let enemy = spawn_guard(&mut world, Point::new(1.0, 1.0));
    let mut events = Vec::new();

    world::apply(
        &mut world,
        Command::MoveEnemy {
            enemy,
            displacement: Vec2::new(0.5, -1.0),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::MoveEnemy {
            enemy,
            displacement: Vec2::ZERO,
        },
        &mut events,
    );

    assert_eq!(
        events,
        vec![Event::EnemyMoved {
            enemy,
            from: Point::new(1.0, 1.0),
            to: Point::new(1.5, 0.0),
        }]
    );
    let snapshot = *query::enemy_view(&world).get(enemy).expect("enemy");
    assert_eq!(snapshot.position, Point::new(1.5, 0.0));
}

#[test]
fn awareness_changes_are_reported_once() {
    let mut world = World::new();
    let enemy = spawn_guard(&mut world, Point::ORIGIN);
    let mut events = Vec::new();

    for _ in 0..2 {
        world::apply(
            &mut world,
            Command::SetAwareness {
                enemy,
                aware: true,
                target_hidden: false,
            },
            &mut events,
        );
    }

    assert_eq!(events.len(), 1);
    assert!(query::enemy_view(&world).get(enemy).expect("enemy").aware);
}

#[test]
fn pickup_within_reach_equips_and_removes_item() {
    let mut world = World::new();
    let enemy = spawn_guard(&mut world, Point::ORIGIN);
    let item = spawn_item(&mut world, ItemKind::Shotgun, Point::new(0.5, 0.0));
    let mut events = Vec::new();

    world::apply(&mut world, Command::PickUpItem { enemy, item }, &mut events);

    assert_eq!(
        events,
        vec![
            Event::ItemRemoved { item },
            Event::ItemPickedUp {
                enemy,
                item,
                kind: ItemKind::Shotgun
            },
        ]
    );
    assert!(query::item_view(&world).get(item).is_none());
    assert_eq!(
        query::enemy_view(&world).get(enemy).expect("enemy").equipped,
        Some(ItemKind::Shotgun)
    );
}

#[test]
fn pickup_rejections_name_their_reason() {
    let mut world = World::new();
    let enemy = spawn_guard(&mut world, Point::ORIGIN);
    let far = spawn_item(&mut world, ItemKind::Rifle, Point::new(5.0, 0.0));
    let near = spawn_item(&mut world, ItemKind::Pistol, Point::new(0.2, 0.0));
    let missing = EnemyId::new(99);

    let mut reasons = Vec::new();
    let mut attempt = |world: &mut World, enemy: EnemyId, item: ItemId| {
        let mut events = Vec::new();
        world::apply(world, Command::PickUpItem { enemy, item }, &mut events);
        for event in events {
            if let Event::ItemPickupRejected { reason, .. } = event {
                reasons.push(reason);
            }
        }
    };

    attempt(&mut world, missing, near);
    attempt(&mut world, enemy, far);
    attempt(&mut world, enemy, near);
    attempt(&mut world, enemy, far);
    attempt(&mut world, enemy, near);

    assert_eq!(
        reasons,
        vec![
            PickupError::MissingEnemy,
            PickupError::OutOfReach,
            PickupError::AlreadyEquipped,
            PickupError::MissingItem,
        ]
    );
}

#[test]
fn dropped_item_returns_to_the_ground_index() {
    let mut world = World::new();
    let enemy = spawn_guard(&mut world, Point::new(3.0, 3.0));
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SpawnEnemy {
            kind: EnemyKind::Coward,
            position: Point::ORIGIN,
            layout: EnemyLayout::default(),
            equipped: Some(ItemKind::Rifle),
        },
        &mut events,
    );
    let armed = EnemyId::new(1);
    events.clear();

    world::apply(&mut world, Command::DropItem { enemy: armed }, &mut events);
    world::apply(&mut world, Command::DropItem { enemy }, &mut events);

    assert_eq!(events.len(), 1);
    let items = query::item_view(&world);
    let dropped = items
        .nearest_of_kind(ItemKind::Rifle, Point::new(3.0, 3.0))
        .expect("rifle on the ground");
    assert_eq!(dropped.position, Point::ORIGIN);
    assert!(items.nearest_of_kind(ItemKind::Pistol, Point::ORIGIN).is_none());
}

#[test]
fn despawn_removes_enemy_and_its_layout() {
    let mut world = World::new();
    let enemy = spawn_guard(&mut world, Point::ORIGIN);
    assert!(query::enemy_layout(&world, enemy).is_some());
    let mut events = Vec::new();

    world::apply(&mut world, Command::DespawnEnemy { enemy }, &mut events);
    world::apply(&mut world, Command::DespawnEnemy { enemy }, &mut events);

    assert_eq!(events, vec![Event::EnemyDespawned { enemy }]);
    assert!(query::enemy_layout(&world, enemy).is_none());
    assert_eq!(query::enemy_view(&world).iter().count(), 0);
}
