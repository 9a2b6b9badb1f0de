/// Bit set on a cell word when the tile is flipped horizontally.
pub const FLIPPED_HORIZONTALLY: u32 = 0x8000_0000;
/// Bit set on a cell word when the tile is flipped vertically.
pub const FLIPPED_VERTICALLY: u32 = 0x4000_0000;
/// Bit set on a cell word when the tile is flipped diagonally (its axes are swapped).
pub const FLIPPED_DIAGONALLY: u32 = 0x2000_0000;
/// Every bit of a cell word that holds a flag rather than a gid.
pub const FLAG_MASK: u32 = FLIPPED_HORIZONTALLY | FLIPPED_VERTICALLY | FLIPPED_DIAGONALLY;

/// Find which tileset owns a gid, given the first gids of every tileset in declaration order.
///
/// Tilesets are scanned from the last to the first, and the first one starting at or before
/// `gid` wins. Gid 0 is never owned.
#[must_use]
pub fn find_tileset_index(gid: u32, first_gids: &[u32]) -> Option<usize> {
    if gid == 0 {
        return None;
    }
    first_gids.iter().rposition(|&first| first <= gid)
}

/// A single cell of a tile layer, with its flags decoded and its tileset found.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cell {
    gid: u32,
    tileset_index: Option<usize>,
    local_id: u32,
    flipped_horizontally: bool,
    flipped_vertically: bool,
    flipped_diagonally: bool,
}

impl Cell {
    /// Decode a raw cell word against the first gids of a map's tilesets.
    #[must_use]
    pub fn resolve(raw: u32, first_gids: &[u32]) -> Self {
        let gid = raw & !FLAG_MASK;
        let tileset_index = find_tileset_index(gid, first_gids);
        Cell {
            gid,
            tileset_index,
            local_id: tileset_index.map_or(0, |index| gid - first_gids[index]),
            flipped_horizontally: raw & FLIPPED_HORIZONTALLY != 0,
            flipped_vertically: raw & FLIPPED_VERTICALLY != 0,
            flipped_diagonally: raw & FLIPPED_DIAGONALLY != 0,
        }
    }

    /// The global id, without flags. 0 means the cell is empty.
    #[inline]
    #[must_use]
    pub fn gid(&self) -> u32 {
        self.gid
    }

    /// The cell word as written in the document, flags included.
    #[must_use]
    pub fn raw(&self) -> u32 {
        let mut raw = self.gid;
        if self.flipped_horizontally {
            raw |= FLIPPED_HORIZONTALLY;
        }
        if self.flipped_vertically {
            raw |= FLIPPED_VERTICALLY;
        }
        if self.flipped_diagonally {
            raw |= FLIPPED_DIAGONALLY;
        }
        raw
    }

    /// Index of the owning tileset, if any.
    #[inline]
    #[must_use]
    pub fn tileset_index(&self) -> Option<usize> {
        self.tileset_index
    }

    /// Id of the tile within its tileset. 0 when no tileset owns the cell.
    #[inline]
    #[must_use]
    pub fn local_id(&self) -> u32 {
        self.local_id
    }

    /// Whether the cell holds no tile.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tileset_index.is_none()
    }

    /// Whether the tile is flipped horizontally.
    #[inline]
    #[must_use]
    pub fn flipped_horizontally(&self) -> bool {
        self.flipped_horizontally
    }

    /// Whether the tile is flipped vertically.
    #[inline]
    #[must_use]
    pub fn flipped_vertically(&self) -> bool {
        self.flipped_vertically
    }

    /// Whether the tile is flipped diagonally.
    #[inline]
    #[must_use]
    pub fn flipped_diagonally(&self) -> bool {
        self.flipped_diagonally
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIRST_GIDS: [u32; 3] = [1, 50, 100];

    #[test]
    fn ownership() {
        let cell = Cell::resolve(0, &FIRST_GIDS);
        assert_eq!(cell.tileset_index(), None);
        assert_eq!(cell.local_id(), 0);
        assert!(cell.is_empty());

        for (gid, tileset, local) in [(1, 0, 0), (49, 0, 48), (50, 1, 0), (99, 1, 49), (250, 2, 150)] {
            let cell = Cell::resolve(gid, &FIRST_GIDS);
            assert_eq!(cell.gid(), gid);
            assert_eq!(cell.tileset_index(), Some(tileset), "gid {gid}");
            assert_eq!(cell.local_id(), local, "gid {gid}");
        }
    }

    #[test]
    fn flags_do_not_change_ownership() {
        for gid in [1, 49, 50, 250] {
            let plain = Cell::resolve(gid, &FIRST_GIDS);
            let flipped = Cell::resolve(gid | FLIPPED_HORIZONTALLY | FLIPPED_VERTICALLY, &FIRST_GIDS);
            assert_eq!(flipped.gid(), plain.gid());
            assert_eq!(flipped.tileset_index(), plain.tileset_index());
            assert_eq!(flipped.local_id(), plain.local_id());
            assert!(flipped.flipped_horizontally());
            assert!(flipped.flipped_vertically());
            assert!(!flipped.flipped_diagonally());
            assert!(!plain.flipped_horizontally());
        }
        let diagonal = Cell::resolve(7 | FLIPPED_DIAGONALLY, &FIRST_GIDS);
        assert_eq!(diagonal.gid(), 7);
        assert!(diagonal.flipped_diagonally());
        assert!(!diagonal.flipped_horizontally());
    }

    #[test]
    fn flags_alone_are_empty() {
        let cell = Cell::resolve(FLAG_MASK, &FIRST_GIDS);
        assert_eq!(cell.gid(), 0);
        assert!(cell.is_empty());
        assert!(cell.flipped_horizontally() && cell.flipped_vertically() && cell.flipped_diagonally());
        assert_eq!(cell.raw(), FLAG_MASK);
    }

    #[test]
    fn out_of_order_tilesets_still_resolve() {
        // The last declared tileset that starts at or before the gid wins
        assert_eq!(find_tileset_index(60, &[50, 1]), Some(1));
        assert_eq!(find_tileset_index(10, &[50, 1]), Some(1));
        assert_eq!(find_tileset_index(10, &[]), None);
        assert_eq!(find_tileset_index(3, &[5, 10]), None);
    }
}
