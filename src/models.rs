//! Data models for tile-grid map documents (maps, layers, tilesets, chunks)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_true() -> bool {
    true
}

fn default_opacity() -> f64 {
    1.0
}

fn default_orientation() -> String {
    "orthogonal".to_string()
}

/// A custom property attached to a map, layer or object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<String>,
    pub value: Value,
}

/// A tile layer - a flat row-major grid of global tile IDs, 0 meaning empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TileLayer {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u32>,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub properties: Option<Vec<Property>>,
    /// Fields this tool doesn't interpret, preserved for round-tripping.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An object placed on an object group. Coordinates are in pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapObject {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub height: Option<f64>,
    /// Tile objects reference a tile by global ID.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub gid: Option<u32>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub properties: Option<Vec<Property>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A layer holding freestanding objects rather than grid cells.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectGroup {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub objects: Vec<MapObject>,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub properties: Option<Vec<Property>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A layer backed by a single image instead of tiles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageLayer {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image: Option<String>,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A folder layer containing nested layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupLayer {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A map layer - tagged by `type` in the JSON document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Layer {
    #[serde(rename = "tilelayer")]
    Tile(TileLayer),
    #[serde(rename = "objectgroup")]
    Object(ObjectGroup),
    #[serde(rename = "imagelayer")]
    Image(ImageLayer),
    #[serde(rename = "group")]
    Group(GroupLayer),
}

impl Layer {
    /// The layer's id, whatever its variant.
    pub fn id(&self) -> u32 {
        match self {
            Layer::Tile(l) => l.id,
            Layer::Object(l) => l.id,
            Layer::Image(l) => l.id,
            Layer::Group(l) => l.id,
        }
    }

    /// The layer's visibility flag, whatever its variant.
    pub fn visible(&self) -> bool {
        match self {
            Layer::Tile(l) => l.visible,
            Layer::Object(l) => l.visible,
            Layer::Image(l) => l.visible,
            Layer::Group(l) => l.visible,
        }
    }
}

/// A reference to a tileset owning the global IDs `[firstgid, firstgid + tilecount)`.
///
/// Tiles are laid out row-major with `columns` tiles per row inside the
/// raster named by `image`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TilesetRef {
    pub firstgid: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tilewidth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tileheight: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tilecount: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub columns: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub imagewidth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub imageheight: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A complete map document.
///
/// `width`/`height` are in tiles, `tilewidth`/`tileheight` in pixels.
/// `infinite` maps (chunked, unbounded layer data) are valid input to the
/// parser but are rejected by the merge orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapDocument {
    pub width: u32,
    pub height: u32,
    pub tilewidth: u32,
    pub tileheight: u32,
    #[serde(default)]
    pub infinite: bool,
    #[serde(default = "default_orientation")]
    pub orientation: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub renderorder: Option<String>,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub tilesets: Vec<TilesetRef>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub nextlayerid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub nextobjectid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub properties: Option<Vec<Property>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A source map positioned at a tile offset inside a shared coordinate space.
///
/// Offsets may be updated freely (interactive repositioning); the document
/// itself is treated as immutable by every engine in this crate.
#[derive(Debug, Clone)]
pub struct MapChunk {
    pub id: String,
    pub document: MapDocument,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl MapChunk {
    /// Create a chunk positioned at the origin.
    pub fn new(id: impl Into<String>, document: MapDocument) -> Self {
        Self::at(id, document, 0, 0)
    }

    /// Create a chunk positioned at a tile offset.
    pub fn at(id: impl Into<String>, document: MapDocument, offset_x: i32, offset_y: i32) -> Self {
        Self { id: id.into(), document, offset_x, offset_y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_map_json() -> &'static str {
        r#"{
            "width": 4, "height": 4, "tilewidth": 16, "tileheight": 16,
            "orientation": "orthogonal", "renderorder": "right-down",
            "layers": [
                {"type": "tilelayer", "id": 1, "name": "ground",
                 "width": 4, "height": 4,
                 "data": [1,0,0,2, 0,0,0,0, 0,0,0,0, 3,0,0,4]},
                {"type": "objectgroup", "id": 2, "name": "spawns",
                 "objects": [{"id": 1, "name": "start", "x": 8.0, "y": 24.0}]}
            ],
            "tilesets": [
                {"firstgid": 1, "name": "terrain", "image": "terrain.png",
                 "tilewidth": 16, "tileheight": 16, "tilecount": 4, "columns": 2}
            ]
        }"#
    }

    #[test]
    fn test_parse_minimal_map() {
        let doc: MapDocument = serde_json::from_str(minimal_map_json()).unwrap();
        assert_eq!(doc.width, 4);
        assert_eq!(doc.tileheight, 16);
        assert!(!doc.infinite);
        assert_eq!(doc.layers.len(), 2);
        assert_eq!(doc.tilesets.len(), 1);

        match &doc.layers[0] {
            Layer::Tile(layer) => {
                assert_eq!(layer.name, "ground");
                assert_eq!(layer.data.len(), 16);
                assert_eq!(layer.data[0], 1);
                assert!(layer.visible);
            }
            _ => panic!("Expected tile layer"),
        }

        match &doc.layers[1] {
            Layer::Object(group) => {
                assert_eq!(group.objects.len(), 1);
                assert_eq!(group.objects[0].x, 8.0);
                assert!(group.objects[0].gid.is_none());
            }
            _ => panic!("Expected object group"),
        }
    }

    #[test]
    fn test_layer_tag_roundtrip() {
        let doc: MapDocument = serde_json::from_str(minimal_map_json()).unwrap();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains(r#""type":"tilelayer""#));
        assert!(json.contains(r#""type":"objectgroup""#));
        let parsed: MapDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, parsed);
    }

    #[test]
    fn test_unknown_fields_survive_roundtrip() {
        let json = r#"{
            "width": 1, "height": 1, "tilewidth": 8, "tileheight": 8,
            "compressionlevel": -1,
            "layers": [{"type": "tilelayer", "id": 1, "name": "l",
                        "width": 1, "height": 1, "data": [0],
                        "parallaxx": 0.5}],
            "tilesets": []
        }"#;
        let doc: MapDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.extra.get("compressionlevel"), Some(&Value::from(-1)));

        let out = serde_json::to_string(&doc).unwrap();
        assert!(out.contains("compressionlevel"));
        assert!(out.contains("parallaxx"));
    }

    #[test]
    fn test_infinite_default_false() {
        let json = r#"{"width": 1, "height": 1, "tilewidth": 8, "tileheight": 8}"#;
        let doc: MapDocument = serde_json::from_str(json).unwrap();
        assert!(!doc.infinite);
        assert_eq!(doc.orientation, "orthogonal");
        assert!(doc.layers.is_empty());
    }

    #[test]
    fn test_group_layer_nesting() {
        let json = r#"{
            "width": 2, "height": 2, "tilewidth": 8, "tileheight": 8,
            "layers": [
                {"type": "group", "id": 1, "name": "world", "layers": [
                    {"type": "tilelayer", "id": 2, "name": "inner",
                     "width": 2, "height": 2, "data": [1,2,3,4]},
                    {"type": "imagelayer", "id": 3, "name": "bg", "image": "sky.png"}
                ]}
            ]
        }"#;
        let doc: MapDocument = serde_json::from_str(json).unwrap();
        match &doc.layers[0] {
            Layer::Group(group) => {
                assert_eq!(group.layers.len(), 2);
                assert_eq!(group.layers[0].id(), 2);
                assert!(matches!(group.layers[1], Layer::Image(_)));
            }
            _ => panic!("Expected group layer"),
        }
    }

    #[test]
    fn test_property_roundtrip() {
        let prop = Property {
            name: "spawn_rate".to_string(),
            kind: Some("float".to_string()),
            value: Value::from(0.25),
        };
        let json = serde_json::to_string(&prop).unwrap();
        assert!(json.contains(r#""type":"float""#));
        let parsed: Property = serde_json::from_str(&json).unwrap();
        assert_eq!(prop, parsed);
    }
}
