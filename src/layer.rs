use crate::context::ParseContext;
use crate::element::Element;
use crate::grid::{self, Compression, Encoding};
use crate::{Cell, Color, Image, LoadError, Object, PropertySet};
use log::trace;
use std::ops::Index;

/// Fields every kind of layer has.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerData {
    /// Name of the layer.
    pub name: String,
    /// X position, in tiles.
    pub x: i32,
    /// Y position, in tiles.
    pub y: i32,
    /// Width, in tiles.
    pub width: u32,
    /// Height, in tiles.
    pub height: u32,
    /// Opacity, from 0 to 1.
    pub opacity: f32,
    /// Whether the layer is shown.
    pub visible: bool,
    /// Horizontal parallax factor.
    pub parallax_x: f32,
    /// Vertical parallax factor.
    pub parallax_y: f32,
    /// Horizontal rendering offset, in pixels.
    pub offset_x: f32,
    /// Vertical rendering offset, in pixels.
    pub offset_y: f32,
    /// Position of the layer in the document, counting every layer parsed before it.
    ///
    /// A group is numbered before its children.
    pub z_order: i32,
    /// Custom properties.
    pub properties: PropertySet,
}

impl LayerData {
    fn parse(element: &Element, z_order: i32, size: (u32, u32)) -> Result<Self, LoadError> {
        Ok(LayerData {
            name: element.attr("name").unwrap_or_default().to_owned(),
            x: element.attr_or("x", 0),
            y: element.attr_or("y", 0),
            width: element.attr_or("width", size.0),
            height: element.attr_or("height", size.1),
            opacity: element.attr_or("opacity", 1.0),
            visible: element.bool_attr_or("visible", true),
            parallax_x: element.attr_or("parallaxx", 1.0),
            parallax_y: element.attr_or("parallaxy", 1.0),
            offset_x: element.attr_or("offsetx", 0.0),
            offset_y: element.attr_or("offsety", 0.0),
            z_order,
            properties: PropertySet::parse(element.child("properties"), None)?,
        })
    }
}

/// A layer of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    /// A grid of tiles.
    Tile(TileLayer),
    /// Free-standing objects.
    Object(ObjectGroup),
    /// A single image.
    Image(ImageLayer),
    /// Nested layers.
    Group(GroupLayer),
}

impl Layer {
    /// Parse a layer element, or `None` if the element isn't a layer.
    pub(crate) fn parse(element: &Element, ctx: &mut ParseContext) -> Option<Result<Self, LoadError>> {
        let layer = match element.name() {
            "layer" => TileLayer::parse(element, ctx).map(Layer::Tile),
            "objectgroup" => ObjectGroup::parse(element, ctx).map(Layer::Object),
            "imagelayer" => ImageLayer::parse(element, ctx).map(Layer::Image),
            "group" => GroupLayer::parse(element, ctx).map(Layer::Group),
            _ => return None,
        };
        Some(layer)
    }

    /// Parse every layer among an element's children, in order.
    pub(crate) fn parse_all(parent: &Element, ctx: &mut ParseContext) -> Result<Vec<Self>, LoadError> {
        parent
            .children()
            .iter()
            .filter_map(|child| Layer::parse(child, ctx))
            .collect()
    }

    /// The fields shared by every kind of layer.
    #[must_use]
    pub fn data(&self) -> &LayerData {
        match self {
            Layer::Tile(layer) => &layer.data,
            Layer::Object(layer) => &layer.data,
            Layer::Image(layer) => &layer.data,
            Layer::Group(layer) => &layer.data,
        }
    }

    /// Name of the layer.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.data().name
    }

    /// Stacking order of the layer within its document.
    #[inline]
    #[must_use]
    pub fn z_order(&self) -> i32 {
        self.data().z_order
    }
}

/// A grid of tiles.
#[derive(Clone, PartialEq)]
pub struct TileLayer {
    /// Shared layer fields.
    pub data: LayerData,
    pub(crate) encoding: Encoding,
    pub(crate) compression: Compression,
    pub(crate) cells: Vec<Cell>,
}

impl TileLayer {
    fn parse(element: &Element, ctx: &mut ParseContext) -> Result<Self, LoadError> {
        let data = LayerData::parse(element, ctx.next_z_order(), ctx.map_size())?;
        let payload = element.child("data").ok_or_else(|| {
            LoadError::DocumentMalformed(format!("tile layer \"{}\" has no <data>", data.name))
        })?;
        let (encoding, compression, words) = grid::decode_element(payload, data.width, data.height)?;
        let cells = words
            .into_iter()
            .map(|raw| Cell::resolve(raw, ctx.first_gids()))
            .collect();
        trace!(
            "decoded tile layer \"{}\": {}x{} {encoding:?}/{compression:?}",
            data.name,
            data.width,
            data.height
        );
        Ok(TileLayer {
            data,
            encoding,
            compression,
            cells,
        })
    }

    /// Returns the width of the layer.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.data.width
    }

    /// Returns the height of the layer.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.data.height
    }

    /// How the cells were encoded in the document.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// How the cells were compressed in the document.
    #[must_use]
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Every cell, row by row.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Get a cell by position.
    /// Returns None if out of bounds
    #[must_use]
    pub fn get(&self, (x, y): (usize, usize)) -> Option<&Cell> {
        if x >= self.width() as usize {
            return None;
        }
        let index = y.checked_mul(self.width() as usize)?.checked_add(x)?;
        self.cells.get(index)
    }
}

impl Index<(usize, usize)> for TileLayer {
    type Output = Cell;

    /// Index by position and return a reference.
    ///
    /// # Panics
    /// Panics if index is out of bounds.
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        match self.get((x, y)) {
            Some(cell) => cell,
            None => panic!("position ({x}, {y}) is out of bounds"),
        }
    }
}

/// A collection of objects, drawn in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectGroup {
    /// Shared layer fields.
    pub data: LayerData,
    /// Color objects are drawn with in the editor.
    pub color: Color,
    /// The objects, in document order.
    pub objects: Vec<Object>,
}

impl ObjectGroup {
    fn parse(element: &Element, ctx: &mut ParseContext) -> Result<Self, LoadError> {
        let data = LayerData::parse(element, ctx.next_z_order(), (0, 0))?;
        let group = Self::parse_with(element, ctx, data)?;
        trace!("parsed object group \"{}\": {} objects", group.data.name, group.objects.len());
        Ok(group)
    }

    /// Parse the collision shapes of a tile. These aren't stacked with the map's layers,
    /// so they don't take a z-order.
    pub(crate) fn parse_collision(element: &Element, ctx: &mut ParseContext) -> Result<Self, LoadError> {
        let data = LayerData::parse(element, 0, (0, 0))?;
        Self::parse_with(element, ctx, data)
    }

    fn parse_with(element: &Element, ctx: &mut ParseContext, data: LayerData) -> Result<Self, LoadError> {
        Ok(ObjectGroup {
            data,
            color: Color::parse_or_default(element.attr("color"))?,
            objects: element
                .children_named("object")
                .map(|object| Object::parse(object, ctx))
                .collect::<Result<_, _>>()?,
        })
    }
}

/// A layer showing a single image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLayer {
    /// Shared layer fields.
    pub data: LayerData,
    /// The image, if one is set.
    pub image: Option<Image>,
}

impl ImageLayer {
    fn parse(element: &Element, ctx: &mut ParseContext) -> Result<Self, LoadError> {
        Ok(ImageLayer {
            data: LayerData::parse(element, ctx.next_z_order(), (0, 0))?,
            image: element.child("image").map(Image::parse).transpose()?,
        })
    }
}

/// A layer holding other layers.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupLayer {
    /// Shared layer fields.
    pub data: LayerData,
    /// Child layers, in document order.
    pub layers: Vec<Layer>,
}

impl GroupLayer {
    fn parse(element: &Element, ctx: &mut ParseContext) -> Result<Self, LoadError> {
        let data = LayerData::parse(element, ctx.next_z_order(), (0, 0))?;
        let layers = Layer::parse_all(element, ctx)?;
        trace!("parsed group \"{}\": {} layers", data.name, layers.len());
        Ok(GroupLayer { data, layers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_layers(xml: &str) -> Vec<Layer> {
        let mut ctx = ParseContext::new("");
        ctx.set_map_size(2, 2);
        ctx.set_first_gids(vec![1, 10]);
        Layer::parse_all(&Element::parse(xml).unwrap(), &mut ctx).unwrap()
    }

    #[test]
    fn shared_defaults() {
        let layers = parse_layers(r#"<map><imagelayer name="sky"/></map>"#);
        let data = layers[0].data();
        assert_eq!(data.name, "sky");
        assert_eq!(data.opacity, 1.0);
        assert!(data.visible);
        assert_eq!((data.parallax_x, data.parallax_y), (1.0, 1.0));
        assert_eq!((data.offset_x, data.offset_y), (0.0, 0.0));
        assert_eq!((data.width, data.height), (0, 0));
        assert!(matches!(&layers[0], Layer::Image(ImageLayer { image: None, .. })));
    }

    #[test]
    fn tile_layer_falls_back_to_map_size() {
        let layers = parse_layers(
            r#"<map><layer name="ground" visible="0" opacity="0.5"><data encoding="csv">1,2,10,0</data></layer></map>"#,
        );
        let Layer::Tile(layer) = &layers[0] else {
            panic!("expected a tile layer");
        };
        assert_eq!((layer.width(), layer.height()), (2, 2));
        assert!(!layer.data.visible);
        assert_eq!(layer.data.opacity, 0.5);
        assert_eq!(layer.encoding(), Encoding::Csv);
        assert_eq!(layer[(1, 0)].local_id(), 1);
        assert_eq!(layer[(0, 1)].tileset_index(), Some(1));
        assert!(layer[(1, 1)].is_empty());
        assert!(layer.get((2, 0)).is_none());
        assert!(layer.get((0, 2)).is_none());
        assert!(layer.get((1, usize::MAX)).is_none());
        assert!(layer.get((usize::MAX, 0)).is_none());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn index_past_the_end_panics() {
        let layers = parse_layers(r#"<map><layer><data encoding="csv">1,2,10,0</data></layer></map>"#);
        let Layer::Tile(layer) = &layers[0] else {
            panic!("expected a tile layer");
        };
        let _ = &layer[(0, usize::MAX / 2)];
    }

    #[test]
    fn missing_data_fails() {
        let mut ctx = ParseContext::new("");
        let root = Element::parse(r#"<map><layer width="1" height="1"/></map>"#).unwrap();
        assert!(matches!(
            Layer::parse_all(&root, &mut ctx),
            Err(LoadError::DocumentMalformed(_))
        ));
    }

    #[test]
    fn groups_number_depth_first() {
        let layers = parse_layers(
            r#"<map>
                <objectgroup name="a"/>
                <group name="b" offsetx="4">
                    <imagelayer name="c"/>
                    <group name="d"><objectgroup name="e"/></group>
                </group>
                <properties/>
                <imagelayer name="f"/>
            </map>"#,
        );
        let orders: Vec<_> = layers.iter().map(|l| (l.name(), l.z_order())).collect();
        assert_eq!(orders, [("a", 0), ("b", 1), ("f", 5)]);
        let Layer::Group(b) = &layers[1] else {
            panic!("expected a group");
        };
        assert_eq!(b.data.offset_x, 4.0);
        let nested: Vec<_> = b.layers.iter().map(|l| (l.name(), l.z_order())).collect();
        assert_eq!(nested, [("c", 2), ("d", 3)]);
        let Layer::Group(d) = &b.layers[1] else {
            panic!("expected a group");
        };
        assert_eq!(d.layers[0].z_order(), 4);
    }

    #[test]
    fn object_group_color_and_objects() {
        let layers = parse_layers(
            r##"<map><objectgroup color="#ff00ff"><object id="1"/><object id="2"/></objectgroup></map>"##,
        );
        let Layer::Object(group) = &layers[0] else {
            panic!("expected an object group");
        };
        assert_eq!(group.color, Color::new(0xFF, 0, 0xFF, 0xFF));
        let ids: Vec<_> = group.objects.iter().map(Object::id).collect();
        assert_eq!(ids, [1, 2]);
    }
}
