use crate::template::TemplateCache;
use std::path::{Path, PathBuf};

/// State threaded through the parse of a single document.
///
/// Nothing in here outlives the parse.
pub(crate) struct ParseContext {
    base_dir: PathBuf,
    pub(crate) templates: TemplateCache,
    next_z_order: i32,
    first_gids: Vec<u32>,
    map_size: (u32, u32),
}

impl ParseContext {
    pub(crate) fn new(base_dir: impl Into<PathBuf>) -> Self {
        ParseContext {
            base_dir: base_dir.into(),
            templates: TemplateCache::default(),
            next_z_order: 0,
            first_gids: Vec::new(),
            map_size: (0, 0),
        }
    }

    /// Directory relative paths in the document are resolved against.
    pub(crate) fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Hand out the next stacking order. Every layer takes one, nested layers included.
    pub(crate) fn next_z_order(&mut self) -> i32 {
        let order = self.next_z_order;
        self.next_z_order += 1;
        order
    }

    /// First gids of every tileset, in declaration order.
    pub(crate) fn first_gids(&self) -> &[u32] {
        &self.first_gids
    }

    pub(crate) fn set_first_gids(&mut self, first_gids: Vec<u32>) {
        self.first_gids = first_gids;
    }

    /// Size of the map in tiles, which tile layers fall back to.
    pub(crate) fn map_size(&self) -> (u32, u32) {
        self.map_size
    }

    pub(crate) fn set_map_size(&mut self, width: u32, height: u32) {
        self.map_size = (width, height);
    }
}
