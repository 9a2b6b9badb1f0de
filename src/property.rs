use crate::element::Element;
use crate::{Color, LoadError};
use std::collections::HashMap;

/// The declared type of a [`Property`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// Free text. Also used for absent or unrecognized `type` attributes.
    String,
    /// Boolean.
    Bool,
    /// Signed integer.
    Int,
    /// Floating point.
    Float,
    /// RGBA color.
    Color,
    /// Path to a file.
    File,
    /// Reference to an object by id.
    Object,
    /// Nested set of properties.
    Class,
}

impl PropertyType {
    fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("bool") => PropertyType::Bool,
            Some("int") => PropertyType::Int,
            Some("float") => PropertyType::Float,
            Some("color") => PropertyType::Color,
            Some("file") => PropertyType::File,
            Some("object") => PropertyType::Object,
            Some("class") => PropertyType::Class,
            _ => PropertyType::String,
        }
    }
}

/// A value of a property.
///
/// The variant always matches the property's declared [`PropertyType`].
#[derive(Clone, PartialEq)]
pub enum PropertyValue {
    /// Free text.
    String(String),
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i32),
    /// Floating point.
    Float(f32),
    /// RGBA color.
    Color(Color),
    /// Path to a file.
    File(String),
    /// Id of a referenced object.
    Object(i32),
    /// Nested set of properties.
    Class(PropertySet),
}

impl PropertyValue {
    /// The type this value was declared as.
    #[must_use]
    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyValue::String(_) => PropertyType::String,
            PropertyValue::Bool(_) => PropertyType::Bool,
            PropertyValue::Int(_) => PropertyType::Int,
            PropertyValue::Float(_) => PropertyType::Float,
            PropertyValue::Color(_) => PropertyType::Color,
            PropertyValue::File(_) => PropertyType::File,
            PropertyValue::Object(_) => PropertyType::Object,
            PropertyValue::Class(_) => PropertyType::Class,
        }
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for PropertyValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<Color> for PropertyValue {
    fn from(value: Color) -> Self {
        Self::Color(value)
    }
}

/// A single named property, as declared in a `<property>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    value: PropertyValue,
    is_empty: bool,
    custom_type: Option<String>,
}

impl Property {
    /// Parse a `<property>` element.
    ///
    /// The literal comes from the `value` attribute, or the inner text for multi-line values.
    pub(crate) fn parse(element: &Element) -> Result<Self, LoadError> {
        let ty = PropertyType::from_attr(element.attr("type"));
        let literal = element.attr("value").or(element.text()).unwrap_or_default();
        let is_empty = literal.is_empty();

        let value = match ty {
            PropertyType::String => PropertyValue::String(literal.to_owned()),
            PropertyType::File => PropertyValue::File(literal.to_owned()),
            PropertyType::Bool => PropertyValue::Bool(literal == "true"),
            PropertyType::Int => PropertyValue::Int(parse_literal(literal, "int")?),
            PropertyType::Object => PropertyValue::Object(parse_literal(literal, "object id")?),
            PropertyType::Float => PropertyValue::Float(parse_literal(literal, "float")?),
            PropertyType::Color => PropertyValue::Color(if is_empty {
                Color::default()
            } else {
                literal.parse()?
            }),
            PropertyType::Class => {
                let members = PropertySet::parse(element.child("properties"), None)?;
                return Ok(Property {
                    is_empty: members.is_empty(),
                    value: PropertyValue::Class(members),
                    custom_type: element.attr("propertytype").map(str::to_owned),
                });
            }
        };
        Ok(Property {
            value,
            is_empty,
            custom_type: None,
        })
    }

    /// Builds a property directly from a value.
    #[must_use]
    pub fn new(value: impl Into<PropertyValue>) -> Self {
        Property {
            value: value.into(),
            is_empty: false,
            custom_type: None,
        }
    }

    /// The declared type.
    #[must_use]
    pub fn property_type(&self) -> PropertyType {
        self.value.property_type()
    }

    /// Whether the property was declared with this type.
    #[must_use]
    pub fn is_of_type(&self, ty: PropertyType) -> bool {
        self.property_type() == ty
    }

    /// The parsed value.
    #[must_use]
    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    /// Whether no literal was supplied, so the value is only a default.
    #[must_use]
    pub fn is_value_empty(&self) -> bool {
        self.is_empty
    }

    /// The custom class name of a class property.
    #[must_use]
    pub fn custom_type(&self) -> Option<&str> {
        self.custom_type.as_deref()
    }
}

/// Empty literals parse to the type's default, so absent values never fail.
fn parse_literal<T>(literal: &str, kind: &'static str) -> Result<T, LoadError>
where
    T: std::str::FromStr + Default,
{
    if literal.is_empty() {
        return Ok(T::default());
    }
    literal
        .trim()
        .parse()
        .map_err(|_| LoadError::malformed(kind, literal))
}

/// A set of uniquely named properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySet {
    properties: HashMap<String, Property>,
}

impl PropertySet {
    /// Parse a `<properties>` container, if there is one.
    ///
    /// Entries of `pattern` whose names are not declared locally are copied in.
    pub(crate) fn parse(
        container: Option<&Element>,
        pattern: Option<&PropertySet>,
    ) -> Result<Self, LoadError> {
        let mut properties = HashMap::new();
        for element in container.into_iter().flat_map(|c| c.children_named("property")) {
            let Some(name) = element.attr("name").filter(|name| !name.is_empty()) else {
                continue;
            };
            // The first declaration of a name wins
            if !properties.contains_key(name) {
                properties.insert(name.to_owned(), Property::parse(element)?);
            }
        }
        let mut set = PropertySet { properties };
        if let Some(pattern) = pattern {
            set.inherit(pattern);
        }
        Ok(set)
    }

    /// Copy every property of `pattern` that this set doesn't already have.
    pub(crate) fn inherit(&mut self, pattern: &PropertySet) {
        for (name, property) in &pattern.properties {
            if !self.properties.contains_key(name) {
                self.properties.insert(name.clone(), property.clone());
            }
        }
    }

    /// Look up a property by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Whether a property with this name exists.
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Get a present, non-empty property, or nothing.
    fn get_filled(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .get(name)
            .filter(|property| !property.is_empty)
            .map(Property::value)
    }

    /// Get a string property, or the default if it's absent, empty or not a string.
    #[must_use]
    pub fn get_string<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        match self.get_filled(name) {
            Some(PropertyValue::String(s)) => s,
            _ => default,
        }
    }

    /// Get a file property, or the default if it's absent, empty or not a file.
    #[must_use]
    pub fn get_file<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        match self.get_filled(name) {
            Some(PropertyValue::File(s)) => s,
            _ => default,
        }
    }

    /// Get an integer property, or the default if it's absent, empty or not an integer.
    ///
    /// Object references count as integers.
    #[must_use]
    pub fn get_int(&self, name: &str, default: i32) -> i32 {
        match self.get_filled(name) {
            Some(PropertyValue::Int(i) | PropertyValue::Object(i)) => *i,
            _ => default,
        }
    }

    /// Get a float property, or the default if it's absent, empty or not a float.
    #[must_use]
    pub fn get_float(&self, name: &str, default: f32) -> f32 {
        match self.get_filled(name) {
            Some(PropertyValue::Float(f)) => *f,
            _ => default,
        }
    }

    /// Get a boolean property, or the default if it's absent, empty or not a boolean.
    #[must_use]
    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        match self.get_filled(name) {
            Some(PropertyValue::Bool(b)) => *b,
            _ => default,
        }
    }

    /// Get a color property, or the default if it's absent, empty or not a color.
    #[must_use]
    pub fn get_color(&self, name: &str, default: Color) -> Color {
        match self.get_filled(name) {
            Some(PropertyValue::Color(c)) => *c,
            _ => default,
        }
    }

    /// Get the nested set of a class property.
    #[must_use]
    pub fn get_class(&self, name: &str) -> Option<&PropertySet> {
        match self.properties.get(name).map(Property::value) {
            Some(PropertyValue::Class(set)) => Some(set),
            _ => None,
        }
    }

    /// Iterate over every property, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties
            .iter()
            .map(|(name, property)| (name.as_str(), property))
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether there are no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl FromIterator<(String, Property)> for PropertySet {
    /// Later entries with a repeated name are ignored.
    fn from_iter<I: IntoIterator<Item = (String, Property)>>(iter: I) -> Self {
        let mut properties = HashMap::new();
        for (name, property) in iter {
            properties.entry(name).or_insert(property);
        }
        PropertySet { properties }
    }
}
