#![warn(missing_docs)]
#![warn(clippy::pedantic, clippy::perf, clippy::cargo)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::too_many_lines,
    clippy::cast_lossless,
    clippy::module_name_repetitions
)]

/*!
Library to load [Tiled](https://www.mapeditor.org/) TMX maps into memory.

Tile data in any of the editor's encodings is decoded, every cell is resolved to
its tileset, and objects are merged with their templates.

```rust
# use tmx_map::{Map, LoadError};
# fn main() -> Result<(), LoadError> {
let map = Map::parse_text(
    /* .. */
    # r#"<map width="2" height="1" tilewidth="16" tileheight="16">
    #     <tileset firstgid="1" name="tiles" tilewidth="16" tileheight="16"/>
    #     <layer name="ground"><data encoding="csv">1,2147483650</data></layer>
    # </map>"#,
    "maps/",
)?;

for layer in map.tile_layers() {
    let cell = layer[(1, 0)];
    assert_eq!(cell.gid(), 2);
    assert_eq!(cell.tileset_index(), Some(0));
    assert!(cell.flipped_horizontally());
}
#
# Ok(())
# }
```
 */

use log::debug;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

mod color;
mod context;
mod element;
mod error;
mod formatting;
mod gid;
mod grid;
mod layer;
mod object;
mod property;
mod template;
mod tileset;

pub use color::Color;
pub use error::{ErrorCode, LoadError};
pub use gid::{
    find_tileset_index, Cell, FLAG_MASK, FLIPPED_DIAGONALLY, FLIPPED_HORIZONTALLY,
    FLIPPED_VERTICALLY,
};
pub use grid::{decode_text, Compression, Encoding};
pub use layer::{GroupLayer, ImageLayer, Layer, LayerData, ObjectGroup, TileLayer};
pub use object::{
    Ellipse, HorizontalAlignment, Object, Point, Polygon, Polyline, Text, VerticalAlignment,
};
pub use property::{Property, PropertySet, PropertyType, PropertyValue};
pub use tileset::{AnimationFrame, Image, Terrain, Tile, TileOffset, Tileset};

use context::ParseContext;
use element::Element;

/// How a map is projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub enum Orientation {
    #[default]
    Orthogonal,
    Isometric,
    Staggered,
    Hexagonal,
}

/// The order tiles are drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub enum RenderOrder {
    #[default]
    RightDown,
    RightUp,
    LeftDown,
    LeftUp,
}

/// Which axis is staggered, for staggered and hexagonal maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum StaggerAxis {
    X,
    Y,
}

/// Whether even or odd indices are shifted, for staggered and hexagonal maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum StaggerIndex {
    Even,
    Odd,
}

/// A representation of a map document.
#[derive(Clone, PartialEq)]
pub struct Map {
    file_path: PathBuf,
    version: String,
    orientation: Orientation,
    render_order: RenderOrder,
    stagger_axis: Option<StaggerAxis>,
    stagger_index: Option<StaggerIndex>,
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
    hex_side_length: u32,
    next_object_id: u32,
    parallax_origin: (f32, f32),
    infinite: bool,
    background_color: Color,
    properties: PropertySet,
    tilesets: Vec<Tileset>,
    first_gids: Vec<u32>,
    layers: Vec<Layer>,
}

impl Map {
    /// Load a map from a file.
    ///
    /// External tilesets and templates are looked up relative to the file's directory.
    ///
    /// # Errors
    /// Errors if the file can't be read, or if the document is malformed.
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::read(BufReader::new(file), base_dir)
    }

    /// Load a map from text held in memory.
    ///
    /// External tilesets and templates are looked up relative to `base_dir`.
    ///
    /// # Errors
    /// Errors if the document is malformed.
    pub fn parse_text(text: &str, base_dir: impl AsRef<Path>) -> Result<Self, LoadError> {
        let root = Element::parse(text)?;
        Self::from_root(&root, base_dir.as_ref())
    }

    /// Attempt to read a map from a readable.
    ///
    /// External tilesets and templates are looked up relative to `base_dir`.
    ///
    /// # Errors
    /// Errors if the document is malformed.
    pub fn read(reader: impl Read, base_dir: impl AsRef<Path>) -> Result<Self, LoadError> {
        let root = Element::read(reader)?;
        Self::from_root(&root, base_dir.as_ref())
    }

    fn from_root(root: &Element, base_dir: &Path) -> Result<Self, LoadError> {
        if root.name() != "map" {
            return Err(LoadError::DocumentMalformed(format!(
                "expected <map>, found <{}>",
                root.name()
            )));
        }
        let mut ctx = ParseContext::new(base_dir);
        let width = root.attr_or("width", 0);
        let height = root.attr_or("height", 0);
        ctx.set_map_size(width, height);

        // Every tileset is known before any cell is resolved
        let tilesets = root
            .children_named("tileset")
            .map(|tileset| Tileset::parse(tileset, &mut ctx))
            .collect::<Result<Vec<_>, _>>()?;
        let first_gids: Vec<u32> = tilesets.iter().map(Tileset::first_gid).collect();
        ctx.set_first_gids(first_gids.clone());

        let layers = Layer::parse_all(root, &mut ctx)?;

        let map = Map {
            file_path: base_dir.to_path_buf(),
            version: root.attr("version").unwrap_or_default().to_owned(),
            orientation: match root.attr("orientation") {
                Some("isometric") => Orientation::Isometric,
                Some("staggered") => Orientation::Staggered,
                Some("hexagonal") => Orientation::Hexagonal,
                _ => Orientation::Orthogonal,
            },
            render_order: match root.attr("renderorder") {
                Some("right-up") => RenderOrder::RightUp,
                Some("left-down") => RenderOrder::LeftDown,
                Some("left-up") => RenderOrder::LeftUp,
                _ => RenderOrder::RightDown,
            },
            stagger_axis: match root.attr("staggeraxis") {
                Some("x") => Some(StaggerAxis::X),
                Some("y") => Some(StaggerAxis::Y),
                _ => None,
            },
            stagger_index: match root.attr("staggerindex") {
                Some("even") => Some(StaggerIndex::Even),
                Some("odd") => Some(StaggerIndex::Odd),
                _ => None,
            },
            width,
            height,
            tile_width: root.attr_or("tilewidth", 0),
            tile_height: root.attr_or("tileheight", 0),
            hex_side_length: root.attr_or("hexsidelength", 0),
            next_object_id: root.attr_or("nextobjectid", 0),
            parallax_origin: (
                root.attr_or("parallaxoriginx", 0.0),
                root.attr_or("parallaxoriginy", 0.0),
            ),
            infinite: root.attr("infinite") == Some("1"),
            background_color: Color::parse_or_default(root.attr("backgroundcolor"))?,
            properties: PropertySet::parse(root.child("properties"), None)?,
            tilesets,
            first_gids,
            layers,
        };
        debug!(
            "parsed map from {}: {} tilesets, {} layers",
            base_dir.display(),
            map.tilesets.len(),
            map.layers.len()
        );
        Ok(map)
    }

    /// Directory relative references in the map were resolved against.
    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Format version of the document.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn render_order(&self) -> RenderOrder {
        self.render_order
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn stagger_axis(&self) -> Option<StaggerAxis> {
        self.stagger_axis
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn stagger_index(&self) -> Option<StaggerIndex> {
        self.stagger_index
    }

    /// Width of the map, in tiles.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the map, in tiles.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width of a tile, in pixels.
    #[must_use]
    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    /// Height of a tile, in pixels.
    #[must_use]
    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Length of the side of a hexagonal tile, in pixels.
    #[must_use]
    pub fn hex_side_length(&self) -> u32 {
        self.hex_side_length
    }

    /// The id the next created object will get.
    #[must_use]
    pub fn next_object_id(&self) -> u32 {
        self.next_object_id
    }

    /// Point parallax scrolling is relative to, in pixels.
    #[must_use]
    pub fn parallax_origin(&self) -> (f32, f32) {
        self.parallax_origin
    }

    /// Whether the map is unbounded.
    #[must_use]
    pub fn is_infinite(&self) -> bool {
        self.infinite
    }

    /// Background color. Transparent if the map doesn't set one.
    #[must_use]
    pub fn background_color(&self) -> Color {
        self.background_color
    }

    /// Custom properties of the map.
    #[must_use]
    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    /// Every tileset, in declaration order.
    #[must_use]
    pub fn tilesets(&self) -> &[Tileset] {
        &self.tilesets
    }

    /// Get a tileset by index.
    #[must_use]
    pub fn tileset(&self, index: usize) -> Option<&Tileset> {
        self.tilesets.get(index)
    }

    /// Index of the tileset owning a cell word. Flags are ignored.
    #[must_use]
    pub fn find_tileset_index(&self, gid: u32) -> Option<usize> {
        find_tileset_index(gid & !FLAG_MASK, &self.first_gids)
    }

    /// The tileset owning a cell word. Flags are ignored.
    #[must_use]
    pub fn find_tileset(&self, gid: u32) -> Option<&Tileset> {
        self.find_tileset_index(gid)
            .and_then(|index| self.tilesets.get(index))
    }

    /// Decode a cell word against this map's tilesets, e.g. the gid of a tile object.
    #[must_use]
    pub fn resolve_gid(&self, raw: u32) -> Cell {
        Cell::resolve(raw, &self.first_gids)
    }

    /// Every layer directly under the map, in document order.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Tile layers directly under the map.
    pub fn tile_layers(&self) -> impl Iterator<Item = &TileLayer> {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Tile(layer) => Some(layer),
            _ => None,
        })
    }

    /// Object groups directly under the map.
    pub fn object_groups(&self) -> impl Iterator<Item = &ObjectGroup> {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Object(layer) => Some(layer),
            _ => None,
        })
    }

    /// Image layers directly under the map.
    pub fn image_layers(&self) -> impl Iterator<Item = &ImageLayer> {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Image(layer) => Some(layer),
            _ => None,
        })
    }

    /// Group layers directly under the map.
    pub fn group_layers(&self) -> impl Iterator<Item = &GroupLayer> {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Group(layer) => Some(layer),
            _ => None,
        })
    }
}
