//! Dense pixel grid: the landscape every object collides against.

use crate::material::{MaterialTable, MNONE};

/// Reserved material index for SolidMask pixels temporarily written over the
/// landscape. Never persists past the batch of mask operations that set it.
pub const VEHICLE_MATERIAL: u8 = 0xfe;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    pub material: u8,
    /// In-foreground-texture flag: whether this pixel draws in front of the
    /// background texture layer.
    pub ift: bool,
}

impl Cell {
    pub const EMPTY: Cell = Cell { material: 0, ift: false };
}

pub struct Landscape {
    pub width: i32,
    pub height: i32,
    pub gravity: lc_math::Fixed,
    cells: Vec<Cell>,
}

impl Landscape {
    pub fn new(width: i32, height: i32, gravity: lc_math::Fixed) -> Self {
        Landscape {
            width,
            height,
            gravity,
            cells: vec![Cell::EMPTY; (width.max(0) * height.max(0)) as usize],
        }
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    /// Out-of-range reads return the sentinel empty, non-solid cell.
    pub fn pix(&self, x: i32, y: i32) -> Cell {
        if self.in_bounds(x, y) {
            self.cells[self.index(x, y)]
        } else {
            Cell::EMPTY
        }
    }

    /// Out-of-range writes are silently dropped.
    pub fn set_pix(&mut self, x: i32, y: i32, cell: Cell) {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            self.cells[idx] = cell;
        }
    }

    pub fn set_pix_if_mask(&mut self, x: i32, y: i32, cell: Cell, mask: impl Fn(Cell) -> bool) {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            if mask(self.cells[idx]) {
                self.cells[idx] = cell;
            }
        }
    }

    pub fn get_mat(&self, x: i32, y: i32) -> u8 {
        self.pix(x, y).material
    }

    pub fn get_density(&self, x: i32, y: i32, materials: &MaterialTable) -> i32 {
        let mat = self.get_mat(x, y);
        if mat == VEHICLE_MATERIAL {
            i32::MAX
        } else {
            materials.density(mat)
        }
    }

    /// Bresenham walk from `(x1,y1)` to `(x2,y2)`; stops at the first pixel
    /// whose density is `>= threshold`. Returns `None` if the whole segment
    /// is free, or `Some((stop_x, stop_y))` — the last free pixel before the
    /// blockage — otherwise.
    fn walk_path(
        &self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        threshold: i32,
        materials: &MaterialTable,
        ignore_vehicle: bool,
    ) -> Option<(i32, i32)> {
        let dx = (x2 - x1).abs();
        let dy = -(y2 - y1).abs();
        let sx = if x1 < x2 { 1 } else { -1 };
        let sy = if y1 < y2 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x1, y1);
        let mut last_free = (x1, y1);

        loop {
            let mat = self.get_mat(x, y);
            let density = if ignore_vehicle && mat == VEHICLE_MATERIAL {
                0
            } else if mat == VEHICLE_MATERIAL {
                i32::MAX
            } else {
                materials.density(mat)
            };
            if density >= threshold {
                return Some(last_free);
            }
            last_free = (x, y);
            if x == x2 && y == y2 {
                return None;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Full path-free test: returns `true` if the whole segment is clear,
    /// and writes the last free coordinate into `last_free` on blockage.
    pub fn path_free(
        &self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        materials: &MaterialTable,
        last_free: &mut (i32, i32),
    ) -> bool {
        use crate::material::SOLID_DENSITY;
        match self.walk_path(x1, y1, x2, y2, SOLID_DENSITY, materials, false) {
            None => true,
            Some(stop) => {
                *last_free = stop;
                false
            }
        }
    }

    /// Fast path: no sentinel output, just whether the line is clear.
    pub fn path_free_fast(&self, x1: i32, y1: i32, x2: i32, y2: i32, materials: &MaterialTable) -> bool {
        use crate::material::SOLID_DENSITY;
        self.walk_path(x1, y1, x2, y2, SOLID_DENSITY, materials, false).is_none()
    }

    /// Treats the vehicle sentinel material as passable.
    pub fn path_free_ignore_vehicle(&self, x1: i32, y1: i32, x2: i32, y2: i32, materials: &MaterialTable) -> bool {
        use crate::material::SOLID_DENSITY;
        self.walk_path(x1, y1, x2, y2, SOLID_DENSITY, materials, true).is_none()
    }

    pub fn clear_pix(&mut self, x: i32, y: i32) {
        self.set_pix(x, y, Cell::EMPTY);
    }

    pub fn mnone() -> u8 {
        MNONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{Material, MaterialTable};

    fn test_materials() -> MaterialTable {
        let mut t = MaterialTable::new();
        t.add(Material::new("Sky", 0, 0, 0));
        t.add(Material::new("Earth", 50, 100, 0));
        t
    }

    #[test]
    fn out_of_range_reads_are_sentinel() {
        let land = Landscape::new(10, 10, lc_math::Fixed::ZERO);
        let cell = land.pix(-1, 5);
        assert_eq!(cell, Cell::EMPTY);
    }

    #[test]
    fn out_of_range_writes_are_dropped() {
        let mut land = Landscape::new(10, 10, lc_math::Fixed::ZERO);
        land.set_pix(100, 100, Cell { material: 1, ift: true });
        // No panic, and nothing readable changed within bounds.
        assert_eq!(land.pix(5, 5), Cell::EMPTY);
    }

    #[test]
    fn path_free_scenario_s1_block() {
        let materials = test_materials();
        let mut land = Landscape::new(200, 200, lc_math::Fixed::ZERO);
        for y in 100..110 {
            for x in 95..105 {
                land.set_pix(x, y, Cell { material: 1, ift: false });
            }
        }
        let mut last_free = (0, 0);
        let free = land.path_free(0, 104, 199, 104, &materials, &mut last_free);
        assert!(!free);
        // The stop point must lie on the segment and be solid-adjacent.
        assert_eq!(last_free.1, 104);
        assert!(last_free.0 < 95);
    }

    #[test]
    fn path_free_open_sky() {
        let materials = test_materials();
        let land = Landscape::new(200, 200, lc_math::Fixed::ZERO);
        let mut last_free = (0, 0);
        assert!(land.path_free(0, 0, 199, 199, &materials, &mut last_free));
    }

    #[test]
    fn vehicle_sentinel_counts_as_infinitely_dense() {
        let materials = test_materials();
        let mut land = Landscape::new(20, 20, lc_math::Fixed::ZERO);
        land.set_pix(10, 10, Cell { material: VEHICLE_MATERIAL, ift: false });
        assert_eq!(land.get_density(10, 10, &materials), i32::MAX);
        assert!(land.path_free_ignore_vehicle(0, 10, 19, 10, &materials));
        let mut last_free = (0, 0);
        assert!(!land.path_free(0, 10, 19, 10, &materials, &mut last_free));
    }
}
