use crate::context::ParseContext;
use crate::element::Element;
use crate::{template, Color, LoadError, PropertySet};
use std::str::FromStr;

/// An object placed in an object group.
///
/// Attributes an object doesn't declare are taken from its template, if it has one.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    name: String,
    ty: String,
    template: Option<String>,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    rotation: f32,
    gid: u32,
    id: u32,
    visible: bool,
    ellipse: Option<Ellipse>,
    polygon: Option<Polygon>,
    polyline: Option<Polyline>,
    text: Option<Text>,
    properties: PropertySet,
}

impl Default for Object {
    fn default() -> Self {
        Object {
            name: String::new(),
            ty: String::new(),
            template: None,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            gid: 0,
            id: 0,
            visible: true,
            ellipse: None,
            polygon: None,
            polyline: None,
            text: None,
            properties: PropertySet::default(),
        }
    }
}

impl Object {
    /// Parse an `<object>` element, resolving its template through the context.
    pub(crate) fn parse(element: &Element, ctx: &mut ParseContext) -> Result<Self, LoadError> {
        let path = element.attr("template").filter(|path| !path.is_empty());
        let pattern = template::resolve(ctx, path)?;
        let mut object = Self::with_pattern(element, &pattern)?;
        object.template = path.map(str::to_owned);
        Ok(object)
    }

    /// Merge an element's own attributes over a pattern's.
    fn with_pattern(element: &Element, pattern: &Object) -> Result<Self, LoadError> {
        let text_attr = |name: &str, fallback: &String| {
            element.attr(name).map_or_else(|| fallback.clone(), str::to_owned)
        };
        let x = element.attr_or("x", pattern.x);
        let y = element.attr_or("y", pattern.y);
        let width = element.attr_or("width", pattern.width);
        let height = element.attr_or("height", pattern.height);

        let ellipse = match element.child("ellipse") {
            Some(_) => Some(Ellipse::from_bounds(x, y, width, height)),
            None => pattern.ellipse,
        };
        let polygon = match element.child("polygon") {
            Some(e) => Some(e.attr("points").unwrap_or_default().parse()?),
            None => pattern.polygon.clone(),
        };
        let polyline = match element.child("polyline") {
            Some(e) => Some(e.attr("points").unwrap_or_default().parse()?),
            None => pattern.polyline.clone(),
        };
        let text = match element.child("text") {
            Some(e) => Some(Text::parse(e)?),
            None => pattern.text.clone(),
        };

        Ok(Object {
            name: text_attr("name", &pattern.name),
            ty: element
                .attr("type")
                .or_else(|| element.attr("class"))
                .map_or_else(|| pattern.ty.clone(), str::to_owned),
            template: None,
            x,
            y,
            width,
            height,
            rotation: element.attr_or("rotation", pattern.rotation),
            // Identity is never inherited
            gid: element.attr_or("gid", 0),
            id: element.attr_or("id", 0),
            visible: element.bool_attr_or("visible", pattern.visible),
            ellipse,
            polygon,
            polyline,
            text,
            properties: PropertySet::parse(element.child("properties"), Some(&pattern.properties))?,
        })
    }

    /// Name of the object.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type (class) of the object.
    #[must_use]
    pub fn object_type(&self) -> &str {
        &self.ty
    }

    /// Path of the template this object was built from, as written in the document.
    #[must_use]
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// X position, in pixels.
    #[must_use]
    pub fn x(&self) -> f32 {
        self.x
    }

    /// Y position, in pixels.
    #[must_use]
    pub fn y(&self) -> f32 {
        self.y
    }

    /// Width, in pixels.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Height, in pixels.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Rotation, in degrees clockwise.
    #[must_use]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Raw cell word of a tile object, flags included. 0 if this isn't a tile object.
    #[must_use]
    pub fn gid(&self) -> u32 {
        self.gid
    }

    /// Unique id of the object within its map.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Whether the object is shown.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The ellipse shape, if the object is one.
    #[must_use]
    pub fn ellipse(&self) -> Option<&Ellipse> {
        self.ellipse.as_ref()
    }

    /// The polygon shape, if the object is one.
    #[must_use]
    pub fn polygon(&self) -> Option<&Polygon> {
        self.polygon.as_ref()
    }

    /// The polyline shape, if the object is one.
    #[must_use]
    pub fn polyline(&self) -> Option<&Polyline> {
        self.polyline.as_ref()
    }

    /// The text, if the object is a text object.
    #[must_use]
    pub fn text(&self) -> Option<&Text> {
        self.text.as_ref()
    }

    /// Custom properties, including those inherited from the template.
    #[must_use]
    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }
}

/// An ellipse, described by its centre and radii.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ellipse {
    center_x: f32,
    center_y: f32,
    radius_x: f32,
    radius_y: f32,
}

impl Ellipse {
    fn from_bounds(x: f32, y: f32, width: f32, height: f32) -> Self {
        Ellipse {
            center_x: x + width / 2.0,
            center_y: y + height / 2.0,
            radius_x: width / 2.0,
            radius_y: height / 2.0,
        }
    }

    /// X of the centre.
    #[must_use]
    pub fn center_x(&self) -> f32 {
        self.center_x
    }

    /// Y of the centre.
    #[must_use]
    pub fn center_y(&self) -> f32 {
        self.center_y
    }

    /// Horizontal radius.
    #[must_use]
    pub fn radius_x(&self) -> f32 {
        self.radius_x
    }

    /// Vertical radius.
    #[must_use]
    pub fn radius_y(&self) -> f32 {
        self.radius_y
    }
}

/// A point of a polygon or polyline, relative to its object.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// X offset.
    pub x: f32,
    /// Y offset.
    pub y: f32,
}

impl FromStr for Point {
    type Err = LoadError;

    /// Parses `x,y`.
    fn from_str(s: &str) -> Result<Self, LoadError> {
        let malformed = || LoadError::malformed("point", s);
        let (x, y) = s.split_once(',').ok_or_else(malformed)?;
        Ok(Point {
            x: x.trim().parse().map_err(|_| malformed())?,
            y: y.trim().parse().map_err(|_| malformed())?,
        })
    }
}

/// Parse a whitespace separated list of points.
fn parse_points(s: &str) -> Result<Vec<Point>, LoadError> {
    s.split_whitespace().map(str::parse).collect()
}

/// A closed shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    /// The corners, in order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

impl FromStr for Polygon {
    type Err = LoadError;

    /// Parses a `points` attribute like `0,0 3.5,4 5.25,6`. An empty string has no points.
    fn from_str(s: &str) -> Result<Self, LoadError> {
        Ok(Polygon {
            points: parse_points(s)?,
        })
    }
}

/// An open line made of segments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    /// The vertices, in order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

impl FromStr for Polyline {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, LoadError> {
        Ok(Polyline {
            points: parse_points(s)?,
        })
    }
}

/// Horizontal alignment of a text object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Vertical alignment of a text object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub enum VerticalAlignment {
    #[default]
    Top,
    Center,
    Bottom,
}

/// The contents and style of a text object.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    contents: String,
    font_family: String,
    pixel_size: u32,
    color: Color,
    wrap: bool,
    bold: bool,
    italic: bool,
    underline: bool,
    strikeout: bool,
    kerning: bool,
    horizontal_alignment: HorizontalAlignment,
    vertical_alignment: VerticalAlignment,
}

impl Text {
    fn parse(element: &Element) -> Result<Self, LoadError> {
        Ok(Text {
            contents: element.text().unwrap_or_default().to_owned(),
            font_family: element.attr("fontfamily").unwrap_or("sans-serif").to_owned(),
            pixel_size: element.attr_or("pixelsize", 16),
            color: Color::parse_or_default(element.attr("color"))?,
            wrap: element.bool_attr_or("wrap", false),
            bold: element.bool_attr_or("bold", false),
            italic: element.bool_attr_or("italic", false),
            underline: element.bool_attr_or("underline", false),
            strikeout: element.bool_attr_or("strikeout", false),
            kerning: element.bool_attr_or("kerning", true),
            horizontal_alignment: match element.attr("halign") {
                Some("center") => HorizontalAlignment::Center,
                Some("right") => HorizontalAlignment::Right,
                Some("justify") => HorizontalAlignment::Justify,
                _ => HorizontalAlignment::Left,
            },
            vertical_alignment: match element.attr("valign") {
                Some("center") => VerticalAlignment::Center,
                Some("bottom") => VerticalAlignment::Bottom,
                _ => VerticalAlignment::Top,
            },
        })
    }

    /// The text itself.
    #[must_use]
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Font family name.
    #[must_use]
    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    /// Font size, in pixels.
    #[must_use]
    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    /// Text color.
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Whether lines wrap at the object's width.
    #[must_use]
    pub fn wrap(&self) -> bool {
        self.wrap
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn bold(&self) -> bool {
        self.bold
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn italic(&self) -> bool {
        self.italic
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn underline(&self) -> bool {
        self.underline
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn strikeout(&self) -> bool {
        self.strikeout
    }

    /// Whether kerning is applied.
    #[must_use]
    pub fn kerning(&self) -> bool {
        self.kerning
    }

    /// Horizontal alignment.
    #[must_use]
    pub fn horizontal_alignment(&self) -> HorizontalAlignment {
        self.horizontal_alignment
    }

    /// Vertical alignment.
    #[must_use]
    pub fn vertical_alignment(&self) -> VerticalAlignment {
        self.vertical_alignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str, pattern: &Object) -> Object {
        Object::with_pattern(&Element::parse(xml).unwrap(), pattern).unwrap()
    }

    #[test]
    fn polygon_points() {
        assert!("".parse::<Polygon>().unwrap().points().is_empty());
        assert!(Polygon::default().points().is_empty());
        let p: Polygon = "1,2 3.5,4 5.25,6".parse().unwrap();
        assert_eq!(
            p.points(),
            [
                Point { x: 1.0, y: 2.0 },
                Point { x: 3.5, y: 4.0 },
                Point { x: 5.25, y: 6.0 }
            ]
        );
        let p: Polyline = "1.25,2.75".parse().unwrap();
        assert_eq!(p.points(), [Point { x: 1.25, y: 2.75 }]);
        let p: Polyline = "-3,-4.5".parse().unwrap();
        assert_eq!(p.points(), [Point { x: -3.0, y: -4.5 }]);
        assert!("1,2 3".parse::<Polygon>().is_err());
        assert!("a,b".parse::<Polygon>().is_err());
    }

    #[test]
    fn defaults_without_pattern() {
        let o = parse(r#"<object id="4"/>"#, &Object::default());
        assert_eq!(o.id(), 4);
        assert_eq!(o.name(), "");
        assert_eq!(o.x(), 0.0);
        assert_eq!(o.rotation(), 0.0);
        assert!(o.is_visible());
        assert!(o.ellipse().is_none() && o.polygon().is_none());
        assert!(o.polyline().is_none() && o.text().is_none());
        assert!(o.properties().is_empty());
    }

    #[test]
    fn merges_over_pattern() {
        let pattern = parse(
            r#"<object name="chest" type="loot" width="16" height="8" rotation="90" visible="0" gid="7" id="3">
                <ellipse/>
                <properties>
                    <property name="gold" type="int" value="10"/>
                    <property name="locked" type="bool" value="true"/>
                </properties>
            </object>"#,
            &Object::default(),
        );
        let o = parse(
            r#"<object id="12" name="" x="32" y="48">
                <properties><property name="locked" type="bool" value="false"/></properties>
            </object>"#,
            &pattern,
        );
        // An explicit empty name still overrides
        assert_eq!(o.name(), "");
        assert_eq!(o.object_type(), "loot");
        assert_eq!((o.x(), o.y(), o.width(), o.height()), (32.0, 48.0, 16.0, 8.0));
        assert_eq!(o.rotation(), 90.0);
        assert!(!o.is_visible());
        assert_eq!(o.id(), 12);
        assert_eq!(o.gid(), 0);
        // Shapes are copied from the pattern as they were parsed there
        assert_eq!(o.ellipse(), pattern.ellipse());
        assert_eq!(o.ellipse().map(Ellipse::center_x), Some(8.0));
        assert_eq!(o.properties().get_int("gold", 0), 10);
        assert!(!o.properties().get_bool("locked", true));
    }

    #[test]
    fn own_shapes_win() {
        let pattern = parse(
            r#"<object><polygon points="0,0 1,0 1,1"/></object>"#,
            &Object::default(),
        );
        let o = parse(
            r#"<object x="10" y="20" width="4" height="6"><ellipse/><polygon points="0,0 2,2"/></object>"#,
            &pattern,
        );
        assert_eq!(o.polygon().map(|p| p.points().len()), Some(2));
        let ellipse = o.ellipse().unwrap();
        assert_eq!(
            (ellipse.center_x(), ellipse.center_y(), ellipse.radius_x(), ellipse.radius_y()),
            (12.0, 23.0, 2.0, 3.0)
        );
    }

    #[test]
    fn text_object() {
        let o = parse(
            r##"<object><text fontfamily="serif" pixelsize="24" color="#ff0000" bold="1" kerning="0" halign="center" valign="bottom">Hello</text></object>"##,
            &Object::default(),
        );
        let text = o.text().unwrap();
        assert_eq!(text.contents(), "Hello");
        assert_eq!(text.font_family(), "serif");
        assert_eq!(text.pixel_size(), 24);
        assert_eq!(text.color(), Color::new(0xFF, 0, 0, 0xFF));
        assert!(text.bold() && !text.italic() && !text.kerning() && !text.wrap());
        assert_eq!(text.horizontal_alignment(), HorizontalAlignment::Center);
        assert_eq!(text.vertical_alignment(), VerticalAlignment::Bottom);

        let o = parse(r#"<object><text/></object>"#, &Object::default());
        let text = o.text().unwrap();
        assert_eq!(text.font_family(), "sans-serif");
        assert_eq!(text.pixel_size(), 16);
        assert!(text.kerning());
        assert_eq!(text.horizontal_alignment(), HorizontalAlignment::Left);
    }
}
