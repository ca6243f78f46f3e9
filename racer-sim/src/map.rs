use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use racer_core::entity_location::EntityLocation;
use racer_core::lap_info::CheckpointOrder;

use crate::physics::shape::point_in_polygon;
use crate::physics::{BodyKind, BodyPurpose, BoundingBox, Shape, World};

// facing straight up the screen, the default for start markers
pub const DEFAULT_START_HEADING_DEGREES: f64 = 270.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Terrain {
    Normal,
    Mud,
    Water,
}

impl Terrain {
    // grip multiplier: how much of the sideways slide the tyres can cancel
    pub fn friction(&self) -> f64 {
        match self {
            Terrain::Normal => 1.0,
            Terrain::Mud => 0.6,
            Terrain::Water => 0.1,
        }
    }

    pub fn acceleration(&self) -> f64 {
        match self {
            Terrain::Normal => 1.0,
            Terrain::Mud => 0.7,
            Terrain::Water => 0.3,
        }
    }

    fn from_kind(kind: &str) -> Option<Terrain> {
        match kind {
            "Mud" => Some(Terrain::Mud),
            "Water" => Some(Terrain::Water),
            "Normal" => Some(Terrain::Normal),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TagValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Integer(value) => write!(f, "{value}"),
            TagValue::Float(value) => write!(f, "{value}"),
            TagValue::Bool(value) => write!(f, "{value}"),
            TagValue::Text(value) => write!(f, "{value}"),
        }
    }
}

impl TagValue {
    fn as_order(&self) -> Option<CheckpointOrder> {
        match self {
            TagValue::Integer(value) => CheckpointOrder::try_from(*value).ok(),
            TagValue::Text(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_degrees(&self) -> Option<f64> {
        match self {
            TagValue::Integer(value) => Some(*value as f64),
            TagValue::Float(value) => Some(*value),
            TagValue::Text(value) => value.trim().parse().ok(),
            TagValue::Bool(_) => None,
        }
    }
}

/// One annotated object as drawn in the level editor: rectangles are
/// anchored at their top-left corner, polygon points are relative to
/// `(x, y)`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MapObject {
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub tags: HashMap<String, TagValue>,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub polygon: Option<Vec<DVec2>>,
    #[serde(default = "closed_by_default")]
    pub closed: bool,
}

fn closed_by_default() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ObjectLayer {
    pub name: String,
    #[serde(default)]
    pub offset: DVec2,
    #[serde(default)]
    pub objects: Vec<MapObject>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TrackMap {
    pub name: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub layers: Vec<ObjectLayer>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ObjectRole {
    Checkpoint(CheckpointOrder),
    StartPosition(String),
    Terrain(Terrain),
    Wall,
    Ignored,
}

/// A map object together with the offset of the layer it sits on.
#[derive(Clone, Copy, Debug)]
pub struct PlacedObject<'a> {
    pub object: &'a MapObject,
    pub layer_offset: DVec2,
}

impl<'a> PlacedObject<'a> {
    pub fn origin(&self) -> DVec2 {
        DVec2::new(self.object.x, self.object.y) + self.layer_offset
    }

    pub fn size(&self) -> DVec2 {
        DVec2::new(self.object.width, self.object.height)
    }

    pub fn center(&self) -> DVec2 {
        self.origin() + self.size() / 2.0
    }

    pub fn world_polygon(&self) -> Option<Vec<DVec2>> {
        self.object
            .polygon
            .as_ref()
            .map(|points| points.iter().map(|p| *p + self.origin()).collect())
    }

    pub fn contains(&self, point: DVec2) -> bool {
        match self.world_polygon() {
            Some(polygon) => point_in_polygon(point, &polygon),
            None => BoundingBox::from_vecs(self.origin(), self.origin() + self.size())
                .contains_point(point),
        }
    }

    pub fn role(&self) -> ObjectRole {
        let object = self.object;
        if let Some(order) = object.tags.get("Order") {
            return match order.as_order() {
                Some(order) => ObjectRole::Checkpoint(order),
                None => {
                    warn!(
                        "object '{}' has an unusable Order tag '{}', skipping it",
                        object.name, order
                    );
                    ObjectRole::Ignored
                }
            };
        }

        if object.name == "Start" || object.kind == "Start" {
            return match object.tags.get("Name") {
                Some(name) => ObjectRole::StartPosition(name.to_string()),
                None => {
                    warn!("start marker at ({}, {}) has no Name tag", object.x, object.y);
                    ObjectRole::Ignored
                }
            };
        }

        if let Some(terrain) = Terrain::from_kind(&object.kind) {
            return ObjectRole::Terrain(terrain);
        }

        if is_logic_marker(&object.name) {
            return ObjectRole::Ignored;
        }

        let has_outline = object
            .polygon
            .as_ref()
            .map_or(false, |points| points.len() >= 2);
        if has_outline || (object.width > 0.0 && object.height > 0.0) {
            ObjectRole::Wall
        } else {
            ObjectRole::Ignored
        }
    }
}

// checkpoint markers that lost their Order tag: "FL", "C1", "C12", ...
fn is_logic_marker(name: &str) -> bool {
    name == "FL"
        || (name.len() > 1
            && name.starts_with('C')
            && name[1..].chars().all(|c| c.is_ascii_digit()))
}

impl TrackMap {
    pub fn load(path: &Path) -> Result<TrackMap> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read track file {}", path.display()))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let map: TrackMap = match extension.as_str() {
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("invalid track json in {}", path.display()))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("invalid track yaml in {}", path.display()))?,
            other => bail!("unsupported track format '{}' for {}", other, path.display()),
        };

        debug!(
            "loaded track '{}' with {} objects",
            map.name,
            map.objects().count()
        );
        Ok(map)
    }

    pub fn objects(&self) -> impl Iterator<Item = PlacedObject<'_>> {
        self.layers.iter().flat_map(|layer| {
            layer.objects.iter().map(move |object| PlacedObject {
                object,
                layer_offset: layer.offset,
            })
        })
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(0.0, self.width, 0.0, self.height)
    }

    pub fn center(&self) -> DVec2 {
        self.bounds().pos()
    }

    /// Creates a static body for every wall object: outlines become chains,
    /// plain rectangles become boxes. Returns how many were made.
    pub fn spawn_walls(&self, world: &mut World) -> usize {
        let mut count = 0;
        for placed in self.objects() {
            if placed.role() != ObjectRole::Wall {
                continue;
            }
            let (shape, position) = match &placed.object.polygon {
                Some(points) if points.len() >= 2 => (
                    Shape::Chain {
                        points: points.clone(),
                        closed: placed.object.closed,
                    },
                    placed.origin(),
                ),
                _ => (
                    Shape::Rectangle {
                        half_extents: placed.size() / 2.0,
                    },
                    placed.center(),
                ),
            };
            world.create_solid_body(shape, position, BodyKind::Static, 0.0, BodyPurpose::Wall);
            count += 1;
        }
        debug!("spawned {} wall bodies", count);
        count
    }

    // first matching zone wins
    pub fn terrain_at(&self, point: DVec2) -> Terrain {
        self.objects()
            .find_map(|placed| match placed.role() {
                ObjectRole::Terrain(terrain) if placed.contains(point) => Some(terrain),
                _ => None,
            })
            .unwrap_or(Terrain::Normal)
    }

    pub fn start_location(&self, name: &str) -> Option<EntityLocation> {
        self.objects().find_map(|placed| match placed.role() {
            ObjectRole::StartPosition(start) if start == name => {
                let degrees = placed
                    .object
                    .tags
                    .get("Rotation")
                    .and_then(TagValue::as_degrees)
                    .unwrap_or(DEFAULT_START_HEADING_DEGREES);
                Some(EntityLocation::new(placed.center(), degrees.to_radians()))
            }
            _ => None,
        })
    }

    pub fn start_names(&self) -> Vec<String> {
        self.objects()
            .filter_map(|placed| match placed.role() {
                ObjectRole::StartPosition(name) => Some(name),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const TRACK: &str = r#"
name: test strip
width: 1000
height: 400
layers:
  - name: checkpoints
    offset: [32, 240]
    objects:
      - { name: FL, x: 0, y: 0, width: 40, height: 100, tags: { Order: 0 } }
      - { name: C1, x: 400, y: 0, width: 40, height: 100, tags: { Order: "1" } }
      - { name: C2, x: 600, y: 0, width: 40, height: 100, tags: { Order: second } }
  - name: positions
    objects:
      - { name: Start, x: 100, y: 50, tags: { Name: Player, Rotation: 0 } }
      - { name: Start, x: 100, y: 90, tags: { Name: NPC1 } }
  - name: terrain
    objects:
      - { name: puddle, kind: Water, x: 500, y: 0, width: 100, height: 100 }
      - name: bog
        kind: Mud
        x: 700
        y: 0
        polygon: [[0, 0], [100, 0], [0, 100]]
  - name: walls
    objects:
      - name: border
        x: 0
        y: 0
        polygon: [[0, 0], [1000, 0], [1000, 400], [0, 400]]
      - { name: pillar, x: 300, y: 150, width: 20, height: 20 }
      - { name: C3, x: 0, y: 0, width: 10, height: 10 }
"#;

    fn write_track(extension: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(extension)
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn classifies_objects_by_tags_and_kind() {
        let file = write_track(".yaml", TRACK);
        let map = TrackMap::load(file.path()).unwrap();

        let roles: Vec<_> = map.objects().map(|placed| placed.role()).collect();
        assert_eq!(
            roles,
            vec![
                ObjectRole::Checkpoint(0),
                ObjectRole::Checkpoint(1),
                ObjectRole::Ignored,
                ObjectRole::StartPosition("Player".to_string()),
                ObjectRole::StartPosition("NPC1".to_string()),
                ObjectRole::Terrain(Terrain::Water),
                ObjectRole::Terrain(Terrain::Mud),
                ObjectRole::Wall,
                ObjectRole::Wall,
                ObjectRole::Ignored,
            ]
        );
    }

    #[test]
    fn layer_offset_moves_objects() {
        let file = write_track(".yml", TRACK);
        let map = TrackMap::load(file.path()).unwrap();
        let finish = map.objects().next().unwrap();
        assert!(finish.center().abs_diff_eq(DVec2::new(52.0, 290.0), 1e-9));
    }

    #[test]
    fn start_heading_defaults_to_facing_up() {
        let file = write_track(".yaml", TRACK);
        let map = TrackMap::load(file.path()).unwrap();

        let player = map.start_location("Player").unwrap();
        assert!(player.position.abs_diff_eq(DVec2::new(100.0, 50.0), 1e-9));
        assert_eq!(player.heading, 0.0);

        let npc = map.start_location("NPC1").unwrap();
        assert!((npc.heading - 270f64.to_radians()).abs() < 1e-9);
        assert!(map.start_location("NPC2").is_none());
        assert_eq!(map.start_names(), vec!["Player", "NPC1"]);
    }

    #[test]
    fn terrain_lookup_uses_rectangles_and_polygons() {
        let file = write_track(".yaml", TRACK);
        let map = TrackMap::load(file.path()).unwrap();

        assert_eq!(map.terrain_at(DVec2::new(550.0, 50.0)), Terrain::Water);
        assert_eq!(map.terrain_at(DVec2::new(710.0, 10.0)), Terrain::Mud);
        // other side of the triangle's hypotenuse
        assert_eq!(map.terrain_at(DVec2::new(790.0, 90.0)), Terrain::Normal);
        assert_eq!(map.terrain_at(DVec2::new(200.0, 200.0)), Terrain::Normal);
    }

    #[test]
    fn walls_become_static_bodies() {
        let file = write_track(".yaml", TRACK);
        let map = TrackMap::load(file.path()).unwrap();
        let mut world = World::new();
        assert_eq!(map.spawn_walls(&mut world), 2);
        assert!(world
            .bodies()
            .all(|info| info.is_static_obstacle() && info.purpose == BodyPurpose::Wall));
    }

    #[test]
    fn loads_json_tracks_too() {
        let file = write_track(
            ".json",
            r#"{"name": "tiny", "width": 10, "height": 10, "layers": []}"#,
        );
        let map = TrackMap::load(file.path()).unwrap();
        assert_eq!(map.name, "tiny");
        assert_eq!(map.terrain_at(DVec2::new(1.0, 1.0)), Terrain::Normal);
    }

    #[test]
    fn rejects_unknown_extensions() {
        let file = write_track(".txt", "name: nope");
        let error = TrackMap::load(file.path()).unwrap_err();
        assert!(error.to_string().contains("unsupported track format"));
    }
}
