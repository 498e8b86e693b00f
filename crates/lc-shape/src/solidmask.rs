//! SolidMask: an object's opaque silhouette, temporarily overwritten into
//! the landscape as a movable piece of solid ground (elevators, drawbridges,
//! vehicles you can stand on).

use lc_landscape::{Landscape, VEHICLE_MATERIAL};
use lc_math::{angle, Fixed};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskRect {
    pub x: i32,
    pub y: i32,
    pub wdt: i32,
    pub hgt: i32,
    /// Offset into the mask bitmap the rect's top-left corner reads from;
    /// nonzero when the rect was clipped against the landscape edge.
    pub tx: i32,
    pub ty: i32,
}

impl MaskRect {
    pub fn overlaps(&self, other: &MaskRect) -> bool {
        self.x < other.x + other.wdt
            && other.x < self.x + self.wdt
            && self.y < other.y + other.hgt
            && other.y < self.y + self.hgt
    }

    /// Intersects in place with `bound`; returns `false` (and leaves self
    /// untouched in meaning) if the result would be empty.
    fn clip_by(&mut self, bound: &MaskRect) -> bool {
        let x1 = self.x.max(bound.x);
        let y1 = self.y.max(bound.y);
        let x2 = (self.x + self.wdt).min(bound.x + bound.wdt);
        let y2 = (self.y + self.hgt).min(bound.y + bound.hgt);
        if x1 >= x2 || y1 >= y2 {
            return false;
        }
        self.tx += x1 - self.x;
        self.ty += y1 - self.y;
        self.x = x1;
        self.y = y1;
        self.wdt = x2 - x1;
        self.hgt = y2 - y1;
        true
    }
}

/// A solid silhouette bitmap positioned relative to its owning object's
/// shape offset (`target_x`/`target_y`, the def's "SolidMask" target rect).
pub struct SolidMask {
    mask: Vec<bool>,
    wdt: i32,
    hgt: i32,
    target_x: i32,
    target_y: i32,

    put: bool,
    put_rect: MaskRect,
    put_rotation: i32,
    /// Object position of the last regular put; needed to recompute a
    /// rotated mask's source pixels when another mask's `remove` forces a
    /// clipped re-put of this one.
    put_obj_x: i32,
    put_obj_y: i32,
    mat_buff: Vec<u8>,
    mat_buff_pitch: i32,
}

impl SolidMask {
    pub fn new(mask: Vec<bool>, wdt: i32, hgt: i32, target_x: i32, target_y: i32) -> Self {
        let pitch = (((wdt * wdt + hgt * hgt) as f64).sqrt() as i32) + 1;
        SolidMask {
            mask,
            wdt,
            hgt,
            target_x,
            target_y,
            put: false,
            put_rect: MaskRect::default(),
            put_rotation: 0,
            put_obj_x: 0,
            put_obj_y: 0,
            mat_buff: vec![VEHICLE_MATERIAL; (pitch * pitch).max(0) as usize],
            mat_buff_pitch: pitch,
        }
    }

    pub fn is_put(&self) -> bool {
        self.put
    }

    pub fn put_rect(&self) -> MaskRect {
        self.put_rect
    }

    fn mask_at(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.wdt || y >= self.hgt {
            false
        } else {
            self.mask[(y * self.wdt + x) as usize]
        }
    }

    fn buff_index(&self, x: i32, y: i32) -> usize {
        (y * self.mat_buff_pitch + x) as usize
    }

    /// Writes the mask into `landscape` at `(obj_x, obj_y)` rotated by
    /// `rotation_deg`. `clip` restricts the write to part of a previous
    /// put-rect (used when `Remove` re-puts overlapping masks); pass
    /// `None` for a regular, full put. `cause_instability` mirrors the
    /// caller's "this put may have disturbed the stack" signal; here it
    /// just gates a debug-only overlap sanity check rather than driving a
    /// full consistency subsystem.
    pub fn put(&mut self, landscape: &mut Landscape, obj_x: i32, obj_y: i32, rotation_deg: i32, clip: Option<MaskRect>, cause_instability: bool) {
        let regular = clip.is_none();
        if regular {
            self.put_rotation = rotation_deg;
            self.put_obj_x = obj_x;
            self.put_obj_y = obj_y;
        }

        let mut rect = match clip {
            Some(r) => r,
            None => self.regular_put_rect(landscape, obj_x, obj_y),
        };
        if let Some(c) = clip {
            if !rect.clip_by(&self.put_rect) {
                return;
            }
            rect = c;
            if !rect.clip_by(&self.put_rect) {
                return;
            }
        }
        if regular {
            self.put_rect = rect;
        }

        if self.put_rotation == 0 {
            self.put_unrotated(landscape, &rect, regular);
        } else {
            self.put_rotated(landscape, obj_x, obj_y, &rect, regular);
        }
        self.put = true;
        if cause_instability {
            debug_assert!(self.put_rect.wdt >= 0 && self.put_rect.hgt >= 0);
        }
    }

    /// Re-reads this mask's background for `clip` and re-puts it there,
    /// without touching `put_rotation`/`put_obj_x`/`put_obj_y`. Used by a
    /// sibling mask's `remove` to restore this mask's vehicle pixels over
    /// the area it just wiped to background.
    fn reput_clipped(&mut self, landscape: &mut Landscape, clip: MaskRect) {
        self.put = false;
        self.put(landscape, self.put_obj_x, self.put_obj_y, self.put_rotation, Some(clip), false);
    }

    fn regular_put_rect(&self, landscape: &Landscape, obj_x: i32, obj_y: i32) -> MaskRect {
        let ox = obj_x + self.target_x;
        let oy = obj_y + self.target_y;
        let (x, tx) = if ox < 0 { (0, -ox) } else { (ox, 0) };
        let (y, ty) = if oy < 0 { (0, -oy) } else { (oy, 0) };
        let wdt = (ox + self.wdt).min(landscape.width) - x;
        let hgt = (oy + self.hgt).min(landscape.height) - y;
        MaskRect { x, y, wdt: wdt.max(0), hgt: hgt.max(0), tx, ty }
    }

    fn put_unrotated(&mut self, landscape: &mut Landscape, rect: &MaskRect, store_background: bool) {
        for ycnt in 0..rect.hgt {
            for xcnt in 0..rect.wdt {
                let mx = rect.tx + xcnt;
                let my = rect.ty + ycnt;
                let (lx, ly) = (rect.x + xcnt, rect.y + ycnt);
                let buff_idx = self.buff_index(mx, my);
                if self.mask_at(mx, my) {
                    if !self.put {
                        let existing = landscape.get_mat(lx, ly);
                        if existing != VEHICLE_MATERIAL || store_background {
                            self.mat_buff[buff_idx] = existing;
                        }
                    }
                    landscape.set_pix(lx, ly, lc_landscape::Cell { material: VEHICLE_MATERIAL, ift: false });
                } else if !self.put {
                    self.mat_buff[buff_idx] = VEHICLE_MATERIAL;
                }
            }
        }
    }

    fn put_rotated(&mut self, landscape: &mut Landscape, obj_x: i32, obj_y: i32, rect: &MaskRect, store_background: bool) {
        let cos = angle::cos_deg(-self.put_rotation);
        let sin = angle::sin_deg(-self.put_rotation);
        let pitch = self.mat_buff_pitch;
        let (w, h) = (self.wdt, self.hgt);

        for ycnt in 0..rect.hgt {
            let my = rect.ty + ycnt;
            for xcnt in 0..rect.wdt {
                let mx = rect.tx + xcnt;
                // Undo the rotation to find which source-mask pixel this
                // landscape-aligned buffer cell corresponds to.
                let dx = Fixed::from_int(mx - pitch / 2);
                let dy = Fixed::from_int(my - pitch / 2);
                let src_x = (cos * dx - sin * dy).round_to_int() + w / 2;
                let src_y = (sin * dx + cos * dy).round_to_int() + h / 2;

                let (lx, ly) = (obj_x + mx - pitch / 2, obj_y + my - pitch / 2);
                let buff_idx = self.buff_index(mx, my);

                if src_x >= 0 && src_y >= 0 && src_x < w && src_y < h && self.mask_at(src_x, src_y) {
                    if !self.put {
                        let existing = landscape.get_mat(lx, ly);
                        if existing != VEHICLE_MATERIAL || store_background {
                            self.mat_buff[buff_idx] = existing;
                        }
                    }
                    landscape.set_pix(lx, ly, lc_landscape::Cell { material: VEHICLE_MATERIAL, ift: false });
                } else if !self.put {
                    self.mat_buff[buff_idx] = VEHICLE_MATERIAL;
                }
            }
        }
    }

    /// Restores every pixel the mask overwrote back to its buffered
    /// background material, then walks `others` (every other currently
    /// live mask) and re-puts whichever ones overlapped this mask's put
    /// rect, clipped to that rect — so a stack of overlapping masks stays
    /// correct: the overlap reads as "vehicle" for as long as any one of
    /// them is still down, matching the stacking invariant.
    ///
    /// When `backup_attachment` is set, returns the landscape coordinates
    /// of every cell in the row directly above the put rect that was still
    /// "vehicle" right before removal — the caller (which knows about
    /// objects, unlike this crate) maps these back to whichever objects'
    /// feet rested there, so it can carry their position through to the
    /// mask's next `put`.
    pub fn remove(&mut self, landscape: &mut Landscape, cause_instability: bool, backup_attachment: bool, others: &mut [&mut SolidMask]) -> Vec<(i32, i32)> {
        if !self.put {
            return Vec::new();
        }
        let rect = self.put_rect;

        let backups = if backup_attachment {
            let mut points = Vec::new();
            let top = rect.y - 1;
            for xcnt in 0..rect.wdt {
                let lx = rect.x + xcnt;
                if landscape.get_mat(lx, top) == VEHICLE_MATERIAL {
                    points.push((lx, top));
                }
            }
            points
        } else {
            Vec::new()
        };

        for ycnt in 0..rect.hgt {
            for xcnt in 0..rect.wdt {
                let buff_idx = self.buff_index(rect.tx + xcnt, rect.ty + ycnt);
                let stored = self.mat_buff[buff_idx];
                if stored != VEHICLE_MATERIAL {
                    let (lx, ly) = (rect.x + xcnt, rect.y + ycnt);
                    landscape.set_pix_if_mask(lx, ly, lc_landscape::Cell { material: stored, ift: false }, |cell| {
                        cell.material == VEHICLE_MATERIAL
                    });
                }
            }
        }
        self.put = false;
        if cause_instability {
            debug_assert!(rect.wdt >= 0 && rect.hgt >= 0);
        }

        for other in others.iter_mut() {
            if other.put && other.put_rect.overlaps(&rect) {
                other.reput_clipped(landscape, rect);
            }
        }

        backups
    }

    /// Restores background pixels in `where_rect` without clearing the
    /// whole mask's put state (used while stacking overlapping masks).
    pub fn remove_temporary(&mut self, landscape: &mut Landscape, mut where_rect: MaskRect) {
        if !self.put || !where_rect.clip_by(&self.put_rect) {
            return;
        }
        for y in where_rect.y..where_rect.y + where_rect.hgt {
            for x in where_rect.x..where_rect.x + where_rect.wdt {
                let mx = x - self.put_rect.x + self.put_rect.tx;
                let my = y - self.put_rect.y + self.put_rect.ty;
                let buff_idx = self.buff_index(mx, my);
                let stored = self.mat_buff[buff_idx];
                if stored != VEHICLE_MATERIAL {
                    landscape.set_pix(x, y, lc_landscape::Cell { material: stored, ift: false });
                }
            }
        }
    }

    pub fn put_temporary(&mut self, landscape: &mut Landscape, mut where_rect: MaskRect) {
        if !self.put || !where_rect.clip_by(&self.put_rect) {
            return;
        }
        for y in where_rect.y..where_rect.y + where_rect.hgt {
            for x in where_rect.x..where_rect.x + where_rect.wdt {
                let mx = x - self.put_rect.x + self.put_rect.tx;
                let my = y - self.put_rect.y + self.put_rect.ty;
                let buff_idx = self.buff_index(mx, my);
                if self.mat_buff[buff_idx] != VEHICLE_MATERIAL {
                    landscape.set_pix(x, y, lc_landscape::Cell { material: VEHICLE_MATERIAL, ift: false });
                }
            }
        }
    }

    /// Re-reads the current landscape into the background buffer for the
    /// given region, then re-puts the mask there (a material change
    /// happened underneath and the buffer needs to track the new state).
    pub fn repair(&mut self, landscape: &mut Landscape, mut where_rect: MaskRect) {
        if !self.put || !where_rect.clip_by(&self.put_rect) {
            return;
        }
        for y in where_rect.y..where_rect.y + where_rect.hgt {
            for x in where_rect.x..where_rect.x + where_rect.wdt {
                let mx = x - self.put_rect.x + self.put_rect.tx;
                let my = y - self.put_rect.y + self.put_rect.ty;
                let buff_idx = self.buff_index(mx, my);
                if self.mat_buff[buff_idx] != VEHICLE_MATERIAL {
                    self.mat_buff[buff_idx] = landscape.get_mat(x, y);
                    landscape.set_pix(x, y, lc_landscape::Cell { material: VEHICLE_MATERIAL, ift: false });
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.put = false;
        self.mat_buff.iter_mut().for_each(|p| *p = VEHICLE_MATERIAL);
    }

    /// Density as seen through this mask alone: `50` (solid) inside the
    /// put rect where the mask bit is set, `0` everywhere else. Used by
    /// [`crate::shape::DensityProvider`] so shape code can collide against
    /// a single mask without touching the landscape it overwrote.
    pub fn mask_density(&self, x: i32, y: i32) -> i32 {
        if !self.put {
            return 0;
        }
        let rx = x - self.put_rect.x;
        let ry = y - self.put_rect.y;
        if rx < 0 || ry < 0 || rx >= self.put_rect.wdt || ry >= self.put_rect.hgt {
            return 0;
        }
        if self.put_rotation == 0 {
            if self.mask_at(self.put_rect.tx + rx, self.put_rect.ty + ry) {
                50
            } else {
                0
            }
        } else {
            let buff_idx = self.buff_index(self.put_rect.tx + rx, self.put_rect.ty + ry);
            if self.mat_buff[buff_idx] == VEHICLE_MATERIAL {
                0
            } else {
                50
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lc_landscape::{Cell, Material, MaterialTable};

    fn test_landscape() -> (Landscape, MaterialTable) {
        let mut materials = MaterialTable::new();
        materials.add(Material::new("Sky", 0, 0, 0));
        let earth = materials.add(Material::new("Earth", 50, 100, 0));
        let mut land = Landscape::new(50, 50, Fixed::ZERO);
        for y in 0..50 {
            for x in 0..50 {
                land.set_pix(x, y, Cell { material: earth, ift: false });
            }
        }
        (land, materials)
    }

    fn solid_block(wdt: i32, hgt: i32) -> SolidMask {
        SolidMask::new(vec![true; (wdt * hgt) as usize], wdt, hgt, 0, 0)
    }

    #[test]
    fn put_then_remove_restores_background() {
        let (mut land, _materials) = test_landscape();
        let mut mask = solid_block(4, 4);
        mask.put(&mut land, 10, 10, 0, None, false);
        assert!(mask.is_put());
        assert_eq!(land.get_mat(11, 11), VEHICLE_MATERIAL);
        mask.remove(&mut land, false, false, &mut []);
        assert!(!mask.is_put());
        assert_ne!(land.get_mat(11, 11), VEHICLE_MATERIAL);
    }

    #[test]
    fn put_clips_against_landscape_bounds() {
        let (mut land, _materials) = test_landscape();
        let mut mask = solid_block(10, 10);
        mask.put(&mut land, 45, 45, 0, None, false);
        assert!(mask.put_rect().wdt <= 5);
        assert!(mask.put_rect().hgt <= 5);
    }

    #[test]
    fn temporary_remove_and_put_round_trip() {
        let (mut land, _materials) = test_landscape();
        let mut mask = solid_block(6, 6);
        mask.put(&mut land, 10, 10, 0, None, false);
        let rect = mask.put_rect();
        mask.remove_temporary(&mut land, rect);
        assert_ne!(land.get_mat(11, 11), VEHICLE_MATERIAL);
        mask.put_temporary(&mut land, rect);
        assert_eq!(land.get_mat(11, 11), VEHICLE_MATERIAL);
    }

    #[test]
    fn mask_density_is_solid_only_inside_put_rect() {
        let (mut land, _materials) = test_landscape();
        let mut mask = solid_block(4, 4);
        mask.put(&mut land, 10, 10, 0, None, false);
        assert_eq!(mask.mask_density(11, 11), 50);
        assert_eq!(mask.mask_density(100, 100), 0);
    }

    /// S2: two overlapping masks. Removing the earlier one must not erase
    /// the overlap pixels the later one still legitimately covers.
    #[test]
    fn removing_one_of_two_overlapping_masks_preserves_the_others_overlap() {
        let (mut land, _materials) = test_landscape();
        let mut a = solid_block(4, 4);
        let mut b = solid_block(4, 4);
        a.put(&mut land, 10, 10, 0, None, false);
        b.put(&mut land, 12, 10, 0, None, false);

        for x in 10..15 {
            for y in 10..13 {
                assert_eq!(land.get_mat(x, y), VEHICLE_MATERIAL, "({x},{y}) should be vehicle before any removal");
            }
        }

        a.remove(&mut land, false, false, &mut [&mut b]);

        for x in 10..12 {
            for y in 10..13 {
                assert_ne!(land.get_mat(x, y), VEHICLE_MATERIAL, "({x},{y}) should revert, only A covered it");
            }
        }
        for x in 12..15 {
            for y in 10..13 {
                assert_eq!(land.get_mat(x, y), VEHICLE_MATERIAL, "({x},{y}) should stay vehicle, B still covers it");
            }
        }
    }

    #[test]
    fn backup_attachment_reports_vehicle_cells_above_the_put_rect() {
        let (mut land, _materials) = test_landscape();
        let mut mask = solid_block(4, 4);
        mask.put(&mut land, 10, 10, 0, None, false);
        // Stand-in for an object's feet resting on this mask's top edge.
        land.set_pix(11, 9, Cell { material: VEHICLE_MATERIAL, ift: false });

        let backups = mask.remove(&mut land, false, true, &mut []);
        assert!(backups.contains(&(11, 9)));
    }
}
