//! Spatial sector index: the landscape is cut into fixed 32x32 cells so
//! object/landscape queries never have to scan the whole map.

use std::collections::HashSet;

pub const SECTOR_WDT: i32 = 32;
pub const SECTOR_HGT: i32 = 32;

pub type ObjectId = u32;

#[derive(Debug, Default, Clone)]
struct Sector {
    /// Objects whose center point currently falls in this sector.
    by_pos: Vec<ObjectId>,
    /// Objects whose bounding shape currently overlaps this sector (an
    /// object can be listed in several neighboring sectors at once).
    by_shape: Vec<ObjectId>,
}

/// Divides a landscape of `width` x `height` pixels into `SECTOR_WDT` x
/// `SECTOR_HGT` cells and tracks, per cell, which objects sit there. A
/// sentinel sector outside the grid catches anything that has left the
/// landscape bounds, so a moved-off-the-map object is still filed
/// somewhere rather than dropped from the index.
pub struct SectorIndex {
    width: i32,
    height: i32,
    cols: i32,
    rows: i32,
    sectors: Vec<Sector>,
    outside: Sector,
}

impl SectorIndex {
    pub fn new(width: i32, height: i32) -> Self {
        let cols = (width.max(1) + SECTOR_WDT - 1) / SECTOR_WDT;
        let rows = (height.max(1) + SECTOR_HGT - 1) / SECTOR_HGT;
        SectorIndex {
            width,
            height,
            cols,
            rows,
            sectors: vec![Sector::default(); (cols * rows) as usize],
            outside: Sector::default(),
        }
    }

    fn col_row(&self, x: i32, y: i32) -> Option<(i32, i32)> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some((x / SECTOR_WDT, y / SECTOR_HGT))
    }

    /// `None` means the coordinate falls outside the landscape and belongs
    /// in the sentinel sector, not that there is nothing to index.
    fn sector_index_at(&self, x: i32, y: i32) -> Option<usize> {
        self.col_row(x, y).map(|(c, r)| (r * self.cols + c) as usize)
    }

    fn sector_at_mut(&mut self, x: i32, y: i32) -> &mut Sector {
        match self.sector_index_at(x, y) {
            Some(idx) => &mut self.sectors[idx],
            None => &mut self.outside,
        }
    }

    pub fn clear(&mut self) {
        for s in &mut self.sectors {
            s.by_pos.clear();
            s.by_shape.clear();
        }
        self.outside.by_pos.clear();
        self.outside.by_shape.clear();
    }

    pub fn add_by_pos(&mut self, id: ObjectId, x: i32, y: i32) {
        self.sector_at_mut(x, y).by_pos.push(id);
    }

    pub fn remove_by_pos(&mut self, id: ObjectId, x: i32, y: i32) {
        self.sector_at_mut(x, y).by_pos.retain(|&o| o != id);
    }

    /// Re-files an object that moved from `(old_x,old_y)` to `(new_x,new_y)`.
    /// A no-op when both points land in the same sector (including two
    /// out-of-bounds points, which both land in the sentinel).
    pub fn update_pos(&mut self, id: ObjectId, old_x: i32, old_y: i32, new_x: i32, new_y: i32) {
        if self.col_row(old_x, old_y) == self.col_row(new_x, new_y) {
            return;
        }
        self.remove_by_pos(id, old_x, old_y);
        self.add_by_pos(id, new_x, new_y);
    }

    /// Every object whose position currently falls in the out-of-bounds
    /// sentinel sector.
    pub fn objects_outside_bounds(&self) -> &[ObjectId] {
        &self.outside.by_pos
    }

    /// Every object whose tracked shape currently falls entirely outside
    /// the landscape.
    pub fn shapes_outside_bounds(&self) -> &[ObjectId] {
        &self.outside.by_shape
    }

    fn clamp_range(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> (i32, i32, i32, i32) {
        let c1 = (x1.max(0) / SECTOR_WDT).min(self.cols - 1);
        let c2 = (x2.max(0) / SECTOR_WDT).min(self.cols - 1);
        let r1 = (y1.max(0) / SECTOR_HGT).min(self.rows - 1);
        let r2 = (y2.max(0) / SECTOR_HGT).min(self.rows - 1);
        (c1, r1, c2, r2)
    }

    /// A rect entirely clear of the landscape grid has nothing to clamp
    /// into — it belongs in the sentinel sector, not sector (0, 0).
    fn entirely_outside(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> bool {
        x2 < 0 || y2 < 0 || x1 >= self.width || y1 >= self.height
    }

    /// Adds an object's bounding rect to every sector it overlaps, or to
    /// the out-of-bounds sentinel if the rect has left the landscape
    /// entirely (a rect only partially off-grid is clamped to the part
    /// that still overlaps it).
    pub fn add_by_shape(&mut self, id: ObjectId, x1: i32, y1: i32, x2: i32, y2: i32) {
        if self.cols == 0 || self.rows == 0 || self.entirely_outside(x1, y1, x2, y2) {
            self.outside.by_shape.push(id);
            return;
        }
        let (c1, r1, c2, r2) = self.clamp_range(x1, y1, x2, y2);
        for r in r1..=r2 {
            for c in c1..=c2 {
                self.sectors[(r * self.cols + c) as usize].by_shape.push(id);
            }
        }
    }

    pub fn remove_by_shape(&mut self, id: ObjectId, x1: i32, y1: i32, x2: i32, y2: i32) {
        if self.cols == 0 || self.rows == 0 || self.entirely_outside(x1, y1, x2, y2) {
            self.outside.by_shape.retain(|&o| o != id);
            return;
        }
        let (c1, r1, c2, r2) = self.clamp_range(x1, y1, x2, y2);
        for r in r1..=r2 {
            for c in c1..=c2 {
                self.sectors[(r * self.cols + c) as usize]
                    .by_shape
                    .retain(|&o| o != id);
            }
        }
    }

    pub fn update_shape(
        &mut self,
        id: ObjectId,
        old_rect: (i32, i32, i32, i32),
        new_rect: (i32, i32, i32, i32),
    ) {
        if old_rect == new_rect {
            return;
        }
        self.remove_by_shape(id, old_rect.0, old_rect.1, old_rect.2, old_rect.3);
        self.add_by_shape(id, new_rect.0, new_rect.1, new_rect.2, new_rect.3);
    }

    /// Returns every object whose center falls in the given rect, visited
    /// exactly once even though the rect may span several sectors.
    pub fn objects_by_pos_in(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> Vec<ObjectId> {
        self.collect_area(x1, y1, x2, y2, |s| &s.by_pos)
    }

    /// Returns every object whose tracked shape overlaps the given rect.
    pub fn objects_by_shape_in(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> Vec<ObjectId> {
        self.collect_area(x1, y1, x2, y2, |s| &s.by_shape)
    }

    fn collect_area(
        &self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        pick: impl Fn(&Sector) -> &Vec<ObjectId>,
    ) -> Vec<ObjectId> {
        if self.cols == 0 || self.rows == 0 {
            return Vec::new();
        }
        let (c1, r1, c2, r2) = self.clamp_range(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2));
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for r in r1..=r2 {
            for c in c1..=c2 {
                for &id in pick(&self.sectors[(r * self.cols + c) as usize]) {
                    if seen.insert(id) {
                        out.push(id);
                    }
                }
            }
        }
        out
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_queries_are_empty() {
        let idx = SectorIndex::new(640, 480);
        assert!(idx.objects_by_pos_in(-100, -100, -50, -50).is_empty());
    }

    #[test]
    fn pos_add_remove_round_trip() {
        let mut idx = SectorIndex::new(640, 480);
        idx.add_by_pos(1, 10, 10);
        idx.add_by_pos(2, 600, 400);
        let found = idx.objects_by_pos_in(0, 0, 63, 63);
        assert_eq!(found, vec![1]);
        idx.remove_by_pos(1, 10, 10);
        assert!(idx.objects_by_pos_in(0, 0, 63, 63).is_empty());
    }

    #[test]
    fn shape_spanning_sectors_is_deduped() {
        let mut idx = SectorIndex::new(640, 480);
        // Straddles the boundary at x=32, so it lands in two sectors.
        idx.add_by_shape(7, 20, 20, 40, 40);
        let found = idx.objects_by_shape_in(0, 0, 639, 479);
        assert_eq!(found, vec![7]);
    }

    #[test]
    fn update_pos_moves_between_sectors() {
        let mut idx = SectorIndex::new(640, 480);
        idx.add_by_pos(3, 5, 5);
        idx.update_pos(3, 5, 5, 500, 5);
        assert!(idx.objects_by_pos_in(0, 0, 31, 31).is_empty());
        assert_eq!(idx.objects_by_pos_in(480, 0, 639, 31), vec![3]);
    }

    #[test]
    fn object_that_escapes_the_world_is_filed_in_the_sentinel_sector() {
        let mut idx = SectorIndex::new(640, 480);
        idx.add_by_pos(9, 5, 5);
        idx.update_pos(9, 5, 5, -100, -100);
        assert!(idx.objects_by_pos_in(0, 0, 31, 31).is_empty());
        assert_eq!(idx.objects_outside_bounds(), &[9]);
        idx.remove_by_pos(9, -100, -100);
        assert!(idx.objects_outside_bounds().is_empty());
    }

    #[test]
    fn shape_entirely_off_grid_goes_to_the_sentinel_not_sector_zero() {
        let mut idx = SectorIndex::new(640, 480);
        idx.add_by_shape(4, -200, -200, -150, -150);
        assert!(idx.objects_by_shape_in(0, 0, 31, 31).is_empty());
        assert_eq!(idx.shapes_outside_bounds(), &[4]);
        idx.remove_by_shape(4, -200, -200, -150, -150);
        assert!(idx.shapes_outside_bounds().is_empty());
    }
}
