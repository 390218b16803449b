//! TOML level description consumed by the headless runner.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use warden_core::{Command, EnemyKind, EnemyLayout, ItemKind, Point, Segment};

const SUPPORTED_LEVEL_VERSION: u32 = 1;

/// Level geometry, population and player script.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LevelDescription {
    pub(crate) walls: Vec<Segment>,
    pub(crate) global_waypoints: Vec<Point>,
    pub(crate) player: PlayerScript,
    pub(crate) sight_range: f32,
    pub(crate) enemies: Vec<EnemySpawn>,
    pub(crate) items: Vec<(ItemKind, Point)>,
}

/// Cyclic track walked by the scripted player.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PlayerScript {
    pub(crate) track: Vec<Point>,
    pub(crate) speed: f32,
}

/// Enemy placed when the level starts.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct EnemySpawn {
    pub(crate) kind: EnemyKind,
    pub(crate) position: Point,
    pub(crate) layout: EnemyLayout,
    pub(crate) equipped: Option<ItemKind>,
}

impl LevelDescription {
    /// Reads and validates the level stored at `path`.
    pub(crate) fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read level file at {}", path.display()))?;
        parse_level(&contents).with_context(|| format!("invalid level file {}", path.display()))
    }

    /// Commands that build the level inside an empty world.
    pub(crate) fn setup_commands(&self) -> Vec<Command> {
        let mut commands = vec![Command::ConfigureLevel {
            walls: self.walls.clone(),
            global_waypoints: self.global_waypoints.clone(),
        }];
        if let Some(&start) = self.player.track.first() {
            commands.push(Command::SetPlayerPosition { position: start });
        }
        commands.extend(
            self.items
                .iter()
                .map(|&(kind, position)| Command::SpawnItem { kind, position }),
        );
        commands.extend(self.enemies.iter().map(|enemy| Command::SpawnEnemy {
            kind: enemy.kind,
            position: enemy.position,
            layout: enemy.layout.clone(),
            equipped: enemy.equipped,
        }));
        commands
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LevelFile {
    version: u32,
    #[serde(default)]
    global_waypoints: Vec<[f32; 2]>,
    #[serde(default = "default_sight_range")]
    sight_range: f32,
    #[serde(default)]
    walls: Vec<WallEntry>,
    #[serde(default)]
    player: Option<PlayerEntry>,
    #[serde(default)]
    enemies: Vec<EnemyEntry>,
    #[serde(default)]
    items: Vec<ItemEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WallEntry {
    from: [f32; 2],
    to: [f32; 2],
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlayerEntry {
    track: Vec<[f32; 2]>,
    #[serde(default = "default_player_speed")]
    speed: f32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnemyEntry {
    kind: EnemyKind,
    spawn: [f32; 2],
    #[serde(default)]
    patrol_route: Vec<[f32; 2]>,
    #[serde(default)]
    waypoints: Vec<[f32; 2]>,
    #[serde(default)]
    doors: Vec<[f32; 2]>,
    #[serde(default)]
    equipped: Option<ItemKind>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ItemEntry {
    kind: ItemKind,
    position: [f32; 2],
}

fn default_sight_range() -> f32 {
    8.0
}

fn default_player_speed() -> f32 {
    1.5
}

fn point([x, y]: [f32; 2]) -> Point {
    Point::new(x, y)
}

fn points(raw: Vec<[f32; 2]>) -> Vec<Point> {
    raw.into_iter().map(point).collect()
}

fn parse_level(contents: &str) -> Result<LevelDescription> {
    let file: LevelFile = toml::from_str(contents).context("failed to parse level toml contents")?;
    if file.version != SUPPORTED_LEVEL_VERSION {
        bail!(
            "unsupported level version {}; expected {}",
            file.version,
            SUPPORTED_LEVEL_VERSION
        );
    }
    if !(file.sight_range.is_finite() && file.sight_range >= 0.0) {
        bail!("sight_range must be a non-negative number");
    }

    let player = match file.player {
        Some(entry) => {
            if !(entry.speed.is_finite() && entry.speed >= 0.0) {
                bail!("player speed must be a non-negative number");
            }
            PlayerScript {
                track: points(entry.track),
                speed: entry.speed,
            }
        }
        None => PlayerScript {
            track: Vec::new(),
            speed: default_player_speed(),
        },
    };

    let mut enemies = Vec::with_capacity(file.enemies.len());
    for (index, entry) in file.enemies.into_iter().enumerate() {
        if entry.patrol_route.is_empty() && entry.waypoints.is_empty() && entry.doors.is_empty() {
            tracing::debug!(index, "enemy has no authored navigation data");
        }
        enemies.push(EnemySpawn {
            kind: entry.kind,
            position: point(entry.spawn),
            layout: EnemyLayout {
                patrol_route: points(entry.patrol_route),
                waypoints: points(entry.waypoints),
                doors: points(entry.doors),
            },
            equipped: entry.equipped,
        });
    }

    Ok(LevelDescription {
        walls: file
            .walls
            .into_iter()
            .map(|wall| Segment::new(point(wall.from), point(wall.to)))
            .collect(),
        global_waypoints: points(file.global_waypoints),
        player,
        sight_range: file.sight_range,
        enemies,
        items: file
            .items
            .into_iter()
            .map(|item| (item.kind, point(item.position)))
            .collect(),
    })
}
