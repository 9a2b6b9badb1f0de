use crate::context::ParseContext;
use crate::element::Element;
use crate::{Color, LoadError, ObjectGroup, PropertySet};
use log::warn;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// A reference to an image file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Image {
    /// Path of the image, as written in the document.
    pub source: String,
    /// Width of the image, in pixels. 0 if not given.
    pub width: u32,
    /// Height of the image, in pixels. 0 if not given.
    pub height: u32,
    /// Color treated as transparent, if any.
    pub transparent_color: Option<Color>,
}

impl Image {
    pub(crate) fn parse(element: &Element) -> Result<Self, LoadError> {
        Ok(Image {
            source: element.attr("source").unwrap_or_default().to_owned(),
            width: element.attr_or("width", 0),
            height: element.attr_or("height", 0),
            transparent_color: element.attr("trans").map(str::parse).transpose()?,
        })
    }
}

/// Drawing offset applied to every tile of a tileset, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileOffset {
    #[allow(missing_docs)]
    pub x: i32,
    #[allow(missing_docs)]
    pub y: i32,
}

/// A terrain type of a tileset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Terrain {
    /// Name of the terrain.
    pub name: String,
    /// Local id of the tile representing the terrain, if any.
    pub tile: Option<u32>,
    /// Custom properties.
    pub properties: PropertySet,
}

/// One frame of a tile animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AnimationFrame {
    /// Local id of the tile shown.
    pub tile_id: u32,
    /// How long the frame is shown, in milliseconds.
    pub duration: u32,
}

/// Extra data attached to a single tile of a tileset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tile {
    id: u32,
    ty: String,
    properties: PropertySet,
    frames: Vec<AnimationFrame>,
    collision: Option<ObjectGroup>,
    image: Option<Image>,
}

impl Tile {
    fn parse(element: &Element, ctx: &mut ParseContext) -> Result<Self, LoadError> {
        let frames: Vec<AnimationFrame> = element
            .child("animation")
            .map(|animation| {
                animation
                    .children_named("frame")
                    .map(|frame| AnimationFrame {
                        tile_id: frame.attr_or("tileid", 0),
                        duration: frame.attr_or("duration", 0),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(Tile {
            id: element.attr_or("id", 0),
            ty: element
                .attr("type")
                .or_else(|| element.attr("class"))
                .unwrap_or_default()
                .to_owned(),
            properties: PropertySet::parse(element.child("properties"), None)?,
            frames,
            collision: element
                .child("objectgroup")
                .map(|group| ObjectGroup::parse_collision(group, ctx))
                .transpose()?,
            image: element.child("image").map(Image::parse).transpose()?,
        })
    }

    /// Local id of the tile within its tileset.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Type (class) of the tile.
    #[must_use]
    pub fn tile_type(&self) -> &str {
        &self.ty
    }

    /// Custom properties.
    #[must_use]
    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    /// Animation frames, in order. Empty if the tile isn't animated.
    #[must_use]
    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn is_animated(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Length of one loop of the animation, in milliseconds.
    #[must_use]
    pub fn total_duration(&self) -> u32 {
        self.frames.iter().map(|frame| frame.duration).sum()
    }

    /// Collision shapes of the tile.
    #[must_use]
    pub fn collision(&self) -> Option<&ObjectGroup> {
        self.collision.as_ref()
    }

    /// The tile's own image, in image collection tilesets.
    #[must_use]
    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }
}

/// A set of tiles, owning the gids from its first gid up to the next tileset's.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tileset {
    first_gid: u32,
    source: Option<String>,
    file_path: PathBuf,
    name: String,
    tile_width: u32,
    tile_height: u32,
    margin: u32,
    spacing: u32,
    tile_count: u32,
    columns: u32,
    tile_offset: TileOffset,
    image: Option<Image>,
    terrain_types: Vec<Terrain>,
    properties: PropertySet,
    tiles: Vec<Tile>,
}

impl Tileset {
    /// Parse a `<tileset>` element of a map, loading its external file if it has one.
    ///
    /// An external file that can't be loaded leaves everything but the first gid and the
    /// source at their defaults.
    pub(crate) fn parse(element: &Element, ctx: &mut ParseContext) -> Result<Self, LoadError> {
        let first_gid = element.attr_or("firstgid", 0);
        let Some(source) = element.attr("source").filter(|source| !source.is_empty()) else {
            let dir = ctx.base_dir().to_path_buf();
            return Self::parse_body(element, first_gid, dir, ctx);
        };
        match Self::open_external(source, ctx) {
            // Only a file that can't be read is recovered, not a bad value inside it
            Ok((root, dir)) => Ok(Tileset {
                source: Some(source.to_owned()),
                ..Self::parse_body(&root, first_gid, dir, ctx)?
            }),
            Err(err) => {
                warn!("{err}, leaving the tileset empty");
                Ok(Tileset {
                    first_gid,
                    source: Some(source.to_owned()),
                    ..Tileset::default()
                })
            }
        }
    }

    /// Read an external tileset file, returning its root and the directory it lives in.
    fn open_external(source: &str, ctx: &ParseContext) -> Result<(Element, PathBuf), LoadError> {
        let failed = |source_err: LoadError| LoadError::TilesetFileLoadFailed {
            path: source.to_owned(),
            source: Box::new(source_err),
        };
        // Relative to the map first, then as given
        let relative = ctx.base_dir().join(source);
        let (file, path) = match File::open(&relative) {
            Ok(file) => (file, relative),
            Err(_) => (
                File::open(source).map_err(|err| failed(err.into()))?,
                PathBuf::from(source),
            ),
        };
        let root = Element::read(BufReader::new(file)).map_err(failed)?;
        if root.name() != "tileset" {
            return Err(failed(LoadError::DocumentMalformed(format!(
                "expected <tileset>, found <{}>",
                root.name()
            ))));
        }
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok((root, dir))
    }

    fn parse_body(
        element: &Element,
        first_gid: u32,
        file_path: PathBuf,
        ctx: &mut ParseContext,
    ) -> Result<Self, LoadError> {
        let terrain_types = element
            .child("terraintypes")
            .into_iter()
            .flat_map(|types| types.children_named("terrain"))
            .map(|terrain| {
                Ok(Terrain {
                    name: terrain.attr("name").unwrap_or_default().to_owned(),
                    // -1 marks a terrain without a tile
                    tile: terrain.attr("tile").and_then(|tile| tile.trim().parse().ok()),
                    properties: PropertySet::parse(terrain.child("properties"), None)?,
                })
            })
            .collect::<Result<_, LoadError>>()?;
        Ok(Tileset {
            first_gid,
            source: None,
            file_path,
            name: element.attr("name").unwrap_or_default().to_owned(),
            tile_width: element.attr_or("tilewidth", 0),
            tile_height: element.attr_or("tileheight", 0),
            margin: element.attr_or("margin", 0),
            spacing: element.attr_or("spacing", 0),
            tile_count: element.attr_or("tilecount", 0),
            columns: element.attr_or("columns", 0),
            tile_offset: element
                .child("tileoffset")
                .map(|offset| TileOffset {
                    x: offset.attr_or("x", 0),
                    y: offset.attr_or("y", 0),
                })
                .unwrap_or_default(),
            image: element.child("image").map(Image::parse).transpose()?,
            terrain_types,
            properties: PropertySet::parse(element.child("properties"), None)?,
            tiles: element
                .children_named("tile")
                .map(|tile| Tile::parse(tile, ctx))
                .collect::<Result<_, _>>()?,
        })
    }

    /// First gid owned by the tileset.
    #[must_use]
    pub fn first_gid(&self) -> u32 {
        self.first_gid
    }

    /// Path of the external tileset file, as written in the map.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Directory the tileset was read from. Image sources are relative to it.
    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Name of the tileset.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
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

    /// Pixels around the tiles of the image.
    #[must_use]
    pub fn margin(&self) -> u32 {
        self.margin
    }

    /// Pixels between the tiles of the image.
    #[must_use]
    pub fn spacing(&self) -> u32 {
        self.spacing
    }

    /// Number of tiles in the tileset.
    #[must_use]
    pub fn tile_count(&self) -> u32 {
        self.tile_count
    }

    /// Number of tile columns in the image.
    #[must_use]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn tile_offset(&self) -> TileOffset {
        self.tile_offset
    }

    /// The image tiles are cut from.
    #[must_use]
    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn terrain_types(&self) -> &[Terrain] {
        &self.terrain_types
    }

    /// Custom properties.
    #[must_use]
    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    /// Tiles with extra data. Tiles without any aren't listed.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Look up a tile by its local id.
    #[must_use]
    pub fn tile(&self, id: u32) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Tileset {
        let mut ctx = ParseContext::new("");
        Tileset::parse(&Element::parse(xml).unwrap(), &mut ctx).unwrap()
    }

    #[test]
    fn inline_tileset() {
        let tileset = parse(
            r##"<tileset firstgid="5" name="terrain" tilewidth="16" tileheight="24" spacing="1" margin="2" tilecount="8" columns="4">
                <tileoffset x="3" y="-4"/>
                <image source="terrain.png" width="64" height="48" trans="ff00ff"/>
                <terraintypes>
                    <terrain name="grass" tile="0"/>
                    <terrain name="void" tile="-1"/>
                </terraintypes>
                <properties><property name="biome" value="plains"/></properties>
                <tile id="2" type="water">
                    <animation>
                        <frame tileid="2" duration="100"/>
                        <frame tileid="3" duration="150"/>
                    </animation>
                </tile>
                <tile id="3" class="rock">
                    <objectgroup><object id="1" width="16" height="8"/></objectgroup>
                </tile>
            </tileset>"##,
        );
        assert_eq!(tileset.first_gid(), 5);
        assert_eq!(tileset.source(), None);
        assert_eq!(tileset.name(), "terrain");
        assert_eq!((tileset.tile_width(), tileset.tile_height()), (16, 24));
        assert_eq!((tileset.margin(), tileset.spacing()), (2, 1));
        assert_eq!((tileset.tile_count(), tileset.columns()), (8, 4));
        assert_eq!(tileset.tile_offset(), TileOffset { x: 3, y: -4 });
        let image = tileset.image().unwrap();
        assert_eq!(image.source, "terrain.png");
        assert_eq!(image.transparent_color, Some(Color::new(0xFF, 0, 0xFF, 0xFF)));
        assert_eq!(tileset.terrain_types()[0].tile, Some(0));
        assert_eq!(tileset.terrain_types()[1].tile, None);
        assert_eq!(tileset.properties().get_string("biome", ""), "plains");

        let water = tileset.tile(2).unwrap();
        assert_eq!(water.tile_type(), "water");
        assert!(water.is_animated());
        assert_eq!(water.total_duration(), 250);
        assert_eq!(water.frames()[1], AnimationFrame { tile_id: 3, duration: 150 });
        assert!(water.collision().is_none());

        let rock = tileset.tile(3).unwrap();
        assert_eq!(rock.tile_type(), "rock");
        assert!(!rock.is_animated());
        assert_eq!(rock.total_duration(), 0);
        assert_eq!(rock.collision().unwrap().objects[0].width(), 16.0);
        assert!(tileset.tile(4).is_none());
    }

    #[test]
    fn missing_file_keeps_first_gid() {
        let tileset = parse(r#"<tileset firstgid="40" source="does/not/exist.tsx"/>"#);
        assert_eq!(tileset.first_gid(), 40);
        assert_eq!(tileset.source(), Some("does/not/exist.tsx"));
        assert_eq!(tileset.name(), "");
        assert!(tileset.tiles().is_empty());
    }

    #[test]
    fn bad_value_in_file_fails() {
        let mut ctx = ParseContext::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data"));
        let root = Element::parse(r#"<tileset firstgid="1" source="tilesets/bad_value.tsx"/>"#).unwrap();
        assert!(matches!(
            Tileset::parse(&root, &mut ctx),
            Err(LoadError::MalformedValue { kind: "int", .. })
        ));
    }

    #[test]
    fn bad_transparent_color_fails() {
        let mut ctx = ParseContext::new("");
        let root = Element::parse(r#"<tileset><image source="a.png" trans="nope"/></tileset>"#).unwrap();
        assert!(matches!(
            Tileset::parse(&root, &mut ctx),
            Err(LoadError::MalformedValue { kind: "color", .. })
        ));
    }
}
