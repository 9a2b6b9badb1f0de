use crate::{Cell, Color, Map, PropertyValue, TileLayer};
use fmt::Debug;
use std::fmt;
use std::fmt::{Display, Formatter, Write};

impl Debug for TileLayer {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "TileLayer {{")?;
            let mut buf = String::new();
            write!(buf, "cells: [")?;
            // Write cells, one row per line
            let w = self.width() as usize;
            if w == 0 || self.cells.is_empty() {
                writeln!(buf, "],")?;
            } else {
                let last = self.cells.len() - 1;
                for (i, cell) in self.cells.iter().enumerate() {
                    if i % w == 0 {
                        write!(buf, "\n    ")?;
                    }
                    write!(buf, "{cell:#?}")?;
                    if i != last {
                        write!(buf, ", ")?;
                    }
                }
                writeln!(buf, "\n],")?;
            }
            writeln!(buf, "data: {:#?},", self.data)?;
            writeln!(buf, "encoding: {:?},", self.encoding)?;
            writeln!(buf, "compression: {:?},", self.compression)?;
            // Pad lines
            for line in buf.lines() {
                writeln!(f, "    {line}")?;
            }
            write!(f, "}}")
        } else {
            write!(f, "TileLayer {{ ")?;
            write!(f, "cells: {:?}, ", self.cells)?;
            write!(f, "data: {:?}, ", self.data)?;
            write!(f, "encoding: {:?}, ", self.encoding)?;
            write!(f, "compression: {:?} }}", self.compression)
        }
    }
}

impl Debug for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            // Only the word in pretty print, so grids line up
            write!(f, "{:08X}", self.raw())
        } else {
            write!(f, "Cell({:08X})", self.raw())
        }
    }
}

impl Debug for PropertyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "{s:?}"),
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Int(i) => write!(f, "{i}"),
            PropertyValue::Float(x) => write!(f, "{x:?}"),
            PropertyValue::Color(color) => write!(f, "{color}"),
            PropertyValue::File(path) => write!(f, "file({path:?})"),
            PropertyValue::Object(id) => write!(f, "object({id})"),
            PropertyValue::Class(set) => {
                if f.alternate() {
                    write!(f, "{set:#?}")
                } else {
                    write!(f, "{set:?}")
                }
            }
        }
    }
}

impl Display for Color {
    /// Writes `#AARRGGBB`, the form the editor saves.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.a, self.r, self.g, self.b)
    }
}

impl Debug for Map {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "Map {{")?;
        let mut buf = String::new();
        writeln!(buf, "version: {:?},", self.version)?;
        writeln!(buf, "orientation: {:?},", self.orientation)?;
        writeln!(buf, "render_order: {:?},", self.render_order)?;
        writeln!(buf, "size: {}x{},", self.width, self.height)?;
        writeln!(buf, "tile_size: {}x{},", self.tile_width, self.tile_height)?;
        writeln!(buf, "background_color: {},", self.background_color)?;
        writeln!(buf, "tilesets: {:#?},", self.tilesets)?;
        writeln!(buf, "layers: {:#?},", self.layers)?;
        writeln!(buf, "properties: {:#?}", self.properties)?;
        // Pad lines
        for line in buf.lines() {
            writeln!(f, "    {line}")?;
        }
        write!(f, "}}")
    }
}
