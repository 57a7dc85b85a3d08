//! Sparse per-tile collision store
//!
//! The level's solid geometry lives in a sparse map of 32×32-pixel tile
//! cells. A cell is either fully solid or carries a 1024-bit mask with one
//! bit per pixel; a missing cell is empty space. Each cell also records the
//! surface attributes (friction, traction, damage) collision probes report.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use lode_core::Rect;

/// Tile cell edge length in pixels.
pub const TILE_SIZE: i32 = 32;

const BITS: usize = (TILE_SIZE * TILE_SIZE) as usize;
const WORDS: usize = BITS / 32;

/// Surface attributes a collision probe reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Surface {
    /// Per-mille friction applied while touching this surface.
    pub friction: i32,
    /// Per-mille traction for acceleration while standing on it.
    pub traction: i32,
    /// Damage per frame of contact.
    pub damage: i32,
}

impl Surface {
    pub const fn new(friction: i32, traction: i32, damage: i32) -> Self {
        Self {
            friction,
            traction,
            damage,
        }
    }
}

/// 1024-bit per-pixel mask for one tile cell.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileBitmap {
    words: [u32; WORDS],
}

impl TileBitmap {
    pub const fn empty() -> Self {
        Self { words: [0; WORDS] }
    }

    pub const fn full() -> Self {
        Self {
            words: [u32::MAX; WORDS],
        }
    }

    pub fn test(&self, index: usize) -> bool {
        debug_assert!(index < BITS);
        self.words[index / 32] & (1 << (index % 32)) != 0
    }

    pub fn set(&mut self, index: usize) {
        debug_assert!(index < BITS);
        self.words[index / 32] |= 1 << (index % 32);
    }

    pub fn clear(&mut self, index: usize) {
        debug_assert!(index < BITS);
        self.words[index / 32] &= !(1 << (index % 32));
    }

    pub fn any(&self) -> bool {
        self.words.iter().any(|w| *w != 0)
    }
}

impl std::fmt::Debug for TileBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set = self.words.iter().map(|w| w.count_ones()).sum::<u32>();
        write!(f, "TileBitmap({set}/{BITS} set)")
    }
}

/// Collision facts for one tile cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSolidInfo {
    /// When set, every pixel of the cell is solid and the bitmap is ignored.
    pub all_solid: bool,
    pub bitmap: TileBitmap,
    pub surface: Surface,
}

impl Default for TileSolidInfo {
    fn default() -> Self {
        Self {
            all_solid: false,
            bitmap: TileBitmap::empty(),
            surface: Surface::default(),
        }
    }
}

/// Sparse map of tile cells keyed by `(tile_x, tile_y)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolidMap {
    cells: AHashMap<(i32, i32), TileSolidInfo>,
}

impl SolidMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a pixel coordinate to its cell and in-cell bit index.
    fn locate(x: i32, y: i32) -> ((i32, i32), usize) {
        let pos = (x.div_euclid(TILE_SIZE), y.div_euclid(TILE_SIZE));
        let index = (y.rem_euclid(TILE_SIZE) * TILE_SIZE + x.rem_euclid(TILE_SIZE)) as usize;
        (pos, index)
    }

    /// Surface at a pixel, or `None` when the pixel is not solid.
    pub fn query(&self, x: i32, y: i32) -> Option<Surface> {
        let (pos, index) = Self::locate(x, y);
        let info = self.cells.get(&pos)?;
        if info.all_solid || info.bitmap.test(index) {
            Some(info.surface)
        } else {
            None
        }
    }

    pub fn insert_or_find(&mut self, pos: (i32, i32)) -> &mut TileSolidInfo {
        self.cells.entry(pos).or_default()
    }

    pub fn cell(&self, pos: (i32, i32)) -> Option<&TileSolidInfo> {
        self.cells.get(&pos)
    }

    /// Set or clear a single pixel. Clearing a pixel of an `all_solid`
    /// cell first explodes the cell into a full per-pixel bitmap.
    pub fn set_pixel(&mut self, x: i32, y: i32, surface: Surface, solid: bool) {
        let (pos, index) = Self::locate(x, y);
        let info = self.insert_or_find(pos);
        if solid {
            info.surface = surface;
            info.bitmap.set(index);
        } else {
            if info.all_solid {
                info.all_solid = false;
                info.bitmap = TileBitmap::full();
            }
            info.bitmap.clear(index);
        }
    }

    /// Mark a rectangle solid or clear. Tile-aligned solid rectangles take
    /// the whole-cell fast path; everything else goes pixel by pixel.
    pub fn set_rect(&mut self, r: Rect, surface: Surface, solid: bool) {
        let aligned = r.x % TILE_SIZE == 0
            && r.y % TILE_SIZE == 0
            && r.x2() % TILE_SIZE == 0
            && r.y2() % TILE_SIZE == 0;
        if solid && aligned {
            let mut y = r.y;
            while y < r.y2() {
                let mut x = r.x;
                while x < r.x2() {
                    let info = self.insert_or_find((x / TILE_SIZE, y / TILE_SIZE));
                    info.all_solid = true;
                    info.surface = surface;
                    x += TILE_SIZE;
                }
                y += TILE_SIZE;
            }
            return;
        }

        for y in r.y..r.y2() {
            for x in r.x..r.x2() {
                self.set_pixel(x, y, surface, solid);
            }
        }
    }

    /// Exhaustive per-pixel scan of a rectangle.
    pub fn rect_solid(&self, r: &Rect) -> Option<Surface> {
        for y in r.y..r.y2() {
            for x in r.x..r.x2() {
                if let Some(surface) = self.query(x, y) {
                    return Some(surface);
                }
            }
        }
        None
    }

    /// Cell-granular early-out: false means no pixel of the rectangle can
    /// be solid, true means some cell overlapping it exists.
    pub fn may_contain_solid(&self, r: &Rect) -> bool {
        if r.is_empty() {
            return false;
        }
        let x1 = r.x.div_euclid(TILE_SIZE);
        let y1 = r.y.div_euclid(TILE_SIZE);
        let x2 = (r.x2() - 1).div_euclid(TILE_SIZE);
        let y2 = (r.y2() - 1).div_euclid(TILE_SIZE);
        for ty in y1..=y2 {
            for tx in x1..=x2 {
                if self.cells.contains_key(&(tx, ty)) {
                    return true;
                }
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_cell_is_empty_space() {
        let map = SolidMap::new();
        assert_eq!(map.query(0, 0), None);
        assert_eq!(map.query(-1000, 99999), None);
    }

    #[test]
    fn test_pixel_set_and_query() {
        let mut map = SolidMap::new();
        let surface = Surface::new(200, 1000, 0);
        map.set_pixel(33, 40, surface, true);
        assert_eq!(map.query(33, 40), Some(surface));
        assert_eq!(map.query(34, 40), None);
        map.set_pixel(33, 40, surface, false);
        assert_eq!(map.query(33, 40), None);
    }

    #[test]
    fn test_negative_coordinates_resolve_to_their_own_cell() {
        let mut map = SolidMap::new();
        let surface = Surface::default();
        map.set_pixel(-1, -1, surface, true);
        assert_eq!(map.query(-1, -1), Some(surface));
        // (-1, -1) lives in cell (-1, -1), not cell (0, 0).
        assert_eq!(map.query(31, 31), None);
        assert!(map.cell((-1, -1)).is_some());
        assert!(map.cell((0, 0)).is_none());
    }

    #[test]
    fn test_aligned_rect_fast_path() {
        let mut map = SolidMap::new();
        let surface = Surface::new(100, 900, 0);
        map.set_rect(Rect::new(0, 32, 64, 32), surface, true);
        assert_eq!(map.len(), 2);
        assert!(map.cell((0, 1)).unwrap().all_solid);
        assert!(map.cell((1, 1)).unwrap().all_solid);
        assert_eq!(map.query(63, 63), Some(surface));
        assert_eq!(map.query(63, 31), None);
    }

    #[test]
    fn test_clearing_pixel_explodes_all_solid_cell() {
        let mut map = SolidMap::new();
        let surface = Surface::default();
        map.set_rect(Rect::new(0, 0, 32, 32), surface, true);
        assert!(map.cell((0, 0)).unwrap().all_solid);

        map.set_pixel(5, 5, surface, false);
        let info = map.cell((0, 0)).unwrap();
        assert!(!info.all_solid);
        assert_eq!(map.query(5, 5), None);
        assert_eq!(map.query(6, 5), Some(surface));
        assert_eq!(map.query(5, 6), Some(surface));
    }

    #[test]
    fn test_unaligned_rect_goes_per_pixel() {
        let mut map = SolidMap::new();
        let surface = Surface::default();
        map.set_rect(Rect::new(10, 10, 5, 5), surface, true);
        assert!(!map.cell((0, 0)).unwrap().all_solid);
        assert_eq!(map.query(10, 10), Some(surface));
        assert_eq!(map.query(14, 14), Some(surface));
        assert_eq!(map.query(15, 10), None);
    }

    #[test]
    fn test_rect_scan_and_early_out() {
        let mut map = SolidMap::new();
        let surface = Surface::new(0, 0, 3);
        map.set_pixel(100, 100, surface, true);

        let hit = Rect::new(95, 95, 10, 10);
        assert_eq!(map.rect_solid(&hit), Some(surface));
        assert!(map.may_contain_solid(&hit));

        let miss = Rect::new(0, 0, 10, 10);
        assert_eq!(map.rect_solid(&miss), None);
        assert!(!map.may_contain_solid(&miss));

        // Same cell as the solid pixel but different pixels: the cheap
        // test says maybe, the exhaustive scan says no.
        let near = Rect::new(110, 110, 5, 5);
        assert!(map.may_contain_solid(&near));
        assert_eq!(map.rect_solid(&near), None);
    }

    #[test]
    fn test_persisted_map_answers_the_same_queries() {
        let mut map = SolidMap::new();
        map.set_rect(Rect::new(0, 64, 96, 32), Surface::new(100, 1000, 0), true);
        map.set_pixel(40, 40, Surface::new(0, 0, 5), true);

        let json = serde_json::to_string(&map).unwrap();
        let back: SolidMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back.query(12, 70), map.query(12, 70));
        assert_eq!(back.query(40, 40), Some(Surface::new(0, 0, 5)));
        assert_eq!(back.query(41, 40), None);
    }
}
