use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use warden_core::{
    Command, EnemyId, EnemyKind, EnemyLayout, Event, ItemId, ItemKind, Point, Segment,
};
use warden_system_movement::Movement;
use warden_world::{self as world, query, World};

#[test]
fn deterministic_replay_produces_identical_traces() {
    let first = replay(scripted_commands());
    let second = replay(scripted_commands());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert!(
        first
            .events
            .iter()
            .any(|event| matches!(event, EventRecord::EnemyMoved { .. })),
        "scenario should move at least one enemy"
    );
    assert!(
        first
            .events
            .iter()
            .any(|event| matches!(event, EventRecord::ItemPickedUp { .. })),
        "scenario should arm the unarmed guard"
    );
}

fn replay(commands: Vec<Command>) -> ReplayOutcome {
    let mut world = World::new();
    let mut movement = Movement::default();
    let mut log = Vec::new();

    for command in commands {
        let mut events = Vec::new();
        world::apply(&mut world, command, &mut events);
        record_events(&events, &mut log);
        process_movement(&mut world, &mut movement, events, &mut log);
    }

    let enemies = query::enemy_view(&world)
        .into_vec()
        .into_iter()
        .map(EnemyState::from)
        .collect();

    ReplayOutcome {
        enemies,
        events: log,
    }
}

fn process_movement(
    world: &mut World,
    movement: &mut Movement,
    pending_events: Vec<Event>,
    log: &mut Vec<EventRecord>,
) {
    let mut events = pending_events;

    loop {
        if events.is_empty() {
            break;
        }

        let enemy_view = query::enemy_view(world);
        let items = query::item_view(world);
        let mut commands = Vec::new();
        movement.handle(
            &events,
            &enemy_view,
            query::level(world),
            query::player_position(world),
            &items,
            |enemy| query::enemy_layout(world, enemy).cloned(),
            &mut commands,
        );

        if commands.is_empty() {
            break;
        }

        events.clear();
        for command in commands {
            let mut generated_events = Vec::new();
            world::apply(world, command, &mut generated_events);
            record_events(&generated_events, log);
            events.extend(generated_events);
        }
    }
}

fn record_events(events: &[Event], log: &mut Vec<EventRecord>) {
    log.extend(events.iter().filter_map(EventRecord::from_event));
}

fn scripted_commands() -> Vec<Command> {
    let mut commands = vec![
        Command::ConfigureLevel {
            walls: vec![
                Segment::new(Point::new(6.0, -2.0), Point::new(6.0, 4.0)),
                Segment::new(Point::new(6.0, 6.0), Point::new(6.0, 12.0)),
            ],
            global_waypoints: vec![Point::new(6.0, 5.0)],
        },
        Command::SpawnItem {
            kind: ItemKind::Pistol,
            position: Point::new(2.0, 8.0),
        },
        Command::SpawnEnemy {
            kind: EnemyKind::Guard,
            position: Point::new(1.0, 1.0),
            layout: EnemyLayout {
                patrol_route: vec![
                    Point::new(1.0, 1.0),
                    Point::new(4.0, 1.0),
                    Point::new(4.0, 4.0),
                ],
                waypoints: vec![
                    Point::new(1.0, 1.0),
                    Point::new(4.0, 1.0),
                    Point::new(4.0, 9.0),
                ],
                doors: vec![Point::new(6.0, 5.0)],
            },
            equipped: Some(ItemKind::Rifle),
        },
        Command::SpawnEnemy {
            kind: EnemyKind::Coward,
            position: Point::new(9.0, 9.0),
            layout: EnemyLayout {
                patrol_route: Vec::new(),
                waypoints: vec![
                    Point::new(8.0, 8.0),
                    Point::new(11.0, 8.0),
                    Point::new(11.0, 11.0),
                    Point::new(8.0, 11.0),
                ],
                doors: Vec::new(),
            },
            equipped: Some(ItemKind::Shotgun),
        },
        Command::SpawnEnemy {
            kind: EnemyKind::Guard,
            position: Point::new(1.0, 6.0),
            layout: EnemyLayout::default(),
            equipped: None,
        },
        Command::SetPlayerPosition {
            position: Point::new(10.0, 2.0),
        },
    ];

    for step in 0..60 {
        commands.push(Command::Tick {
            dt: Duration::from_millis(100),
        });
        if step == 10 {
            commands.push(Command::SetAwareness {
                enemy: EnemyId::new(0),
                aware: true,
                target_hidden: true,
            });
            commands.push(Command::SetAwareness {
                enemy: EnemyId::new(1),
                aware: true,
                target_hidden: false,
            });
        }
        if step == 40 {
            commands.push(Command::SetAwareness {
                enemy: EnemyId::new(0),
                aware: false,
                target_hidden: false,
            });
        }
    }
    commands
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    enemies: Vec<EnemyState>,
    events: Vec<EventRecord>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct EnemyState {
    id: EnemyId,
    position: (u32, u32),
    aware: bool,
    equipped: Option<ItemKind>,
}

impl From<query::EnemySnapshot> for EnemyState {
    fn from(snapshot: query::EnemySnapshot) -> Self {
        Self {
            id: snapshot.id,
            position: bits(snapshot.position),
            aware: snapshot.aware,
            equipped: snapshot.equipped,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum EventRecord {
    TimeAdvanced {
        dt_micros: u128,
    },
    EnemyMoved {
        enemy: EnemyId,
        from: (u32, u32),
        to: (u32, u32),
    },
    ItemPickedUp {
        enemy: EnemyId,
        item: ItemId,
    },
}

impl EventRecord {
    fn from_event(event: &Event) -> Option<Self> {
        match event {
            Event::TimeAdvanced { dt } => Some(Self::TimeAdvanced {
                dt_micros: dt.as_micros(),
            }),
            Event::EnemyMoved { enemy, from, to } => Some(Self::EnemyMoved {
                enemy: *enemy,
                from: bits(*from),
                to: bits(*to),
            }),
            Event::ItemPickedUp { enemy, item, .. } => Some(Self::ItemPickedUp {
                enemy: *enemy,
                item: *item,
            }),
            _ => None,
        }
    }
}

fn bits(point: Point) -> (u32, u32) {
    (point.x().to_bits(), point.y().to_bits())
}
