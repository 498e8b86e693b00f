//! Vertex outline: the polygon of contact points an object collides with
//! the landscape through.

use crate::cnat::Cnat;
use lc_landscape::{Landscape, MaterialTable, MNONE};
use lc_math::{angle, Fixed};

/// Upper bound on vertices per shape. Past this, `add_vertex` refuses and
/// the caller's definition data is malformed.
pub const MAX_VERTICES: usize = 10;

pub const SOLID_CONTACT_DENSITY: i32 = 50;

#[derive(Debug, Clone, Copy, Default)]
pub struct Vertex {
    pub x: i32,
    pub y: i32,
    pub cnat: Cnat,
    pub friction: i32,
    pub contact_cnat: Cnat,
    pub contact_mat: u8,
}

/// Something `get_vertex_contact` can query for "how solid is this pixel".
/// Lets callers substitute a section's landscape or a reaction-aware
/// density probe without `Shape` depending on either concretely.
pub trait DensityProvider {
    fn density(&self, x: i32, y: i32) -> i32;
}

pub struct LandscapeDensity<'a> {
    pub landscape: &'a Landscape,
    pub materials: &'a MaterialTable,
}

impl DensityProvider for LandscapeDensity<'_> {
    fn density(&self, x: i32, y: i32) -> i32 {
        self.landscape.get_density(x, y, self.materials)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub wdt: i32,
    pub hgt: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Shape {
    pub bounds: Bounds,
    pub fire_top: i32,
    pub contact_density: i32,
    pub attach_range: i32,
    vertices: Vec<Vertex>,

    pub attach_mat: u8,
    pub attach_x: i32,
    pub attach_y: i32,
    pub attach_vtx: i32,

    pub contact_cnat: Cnat,
    pub contact_count: i32,
}

impl Shape {
    pub fn new() -> Self {
        Shape {
            contact_density: SOLID_CONTACT_DENSITY,
            attach_mat: MNONE,
            attach_range: 1,
            ..Default::default()
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn add_vertex(&mut self, x: i32, y: i32) -> bool {
        if self.vertices.len() >= MAX_VERTICES {
            return false;
        }
        self.vertices.push(Vertex { x, y, ..Default::default() });
        true
    }

    pub fn insert_vertex(&mut self, pos: usize, x: i32, y: i32) -> bool {
        if self.vertices.len() >= MAX_VERTICES || pos > self.vertices.len() {
            return false;
        }
        self.vertices.insert(pos, Vertex { x, y, ..Default::default() });
        true
    }

    pub fn remove_vertex(&mut self, pos: usize) -> bool {
        if pos >= self.vertices.len() {
            return false;
        }
        self.vertices.remove(pos);
        true
    }

    pub fn vertex_x(&self, i: usize) -> i32 {
        self.vertices.get(i).map(|v| v.x).unwrap_or(0)
    }

    pub fn vertex_y(&self, i: usize) -> i32 {
        self.vertices.get(i).map(|v| v.y).unwrap_or(0)
    }

    pub fn set_vertex_cnat(&mut self, i: usize, cnat: Cnat) {
        if let Some(v) = self.vertices.get_mut(i) {
            v.cnat = cnat;
        }
    }

    /// Rotates every vertex `degrees` around the origin and re-derives the
    /// enclosing bounds as a circle wide enough to hold the shape at any
    /// rotation (the origin is the shape's own `(x, y)`).
    pub fn rotate(&mut self, degrees: i32, update_vertices: bool) {
        if update_vertices {
            let cos = angle::cos_deg(degrees);
            let sin = angle::sin_deg(degrees);
            for v in &mut self.vertices {
                let vx = Fixed::from_int(v.x);
                let vy = Fixed::from_int(v.y);
                let nvx = (cos * vx - sin * vy).round_to_int();
                let nvy = (sin * vx + cos * vy).round_to_int();
                v.x = nvx;
                v.y = nvy;
            }
        }
        let radius = lc_math::fixed::distance(0, 0, self.bounds.x, self.bounds.y) + 2;
        self.bounds.x = -radius;
        self.bounds.y = -radius;
        self.bounds.wdt = 2 * radius;
        self.bounds.hgt = 2 * radius;
    }

    pub fn stretch(&mut self, percent: i32, update_vertices: bool) {
        self.bounds.x = self.bounds.x * percent / 100;
        self.bounds.y = self.bounds.y * percent / 100;
        self.bounds.wdt = self.bounds.wdt * percent / 100;
        self.bounds.hgt = self.bounds.hgt * percent / 100;
        self.fire_top = self.fire_top * percent / 100;
        if update_vertices {
            for v in &mut self.vertices {
                v.x = v.x * percent / 100;
                v.y = v.y * percent / 100;
            }
        }
    }

    /// Like `stretch` but vertical-only (used for crouch/jolt animation).
    pub fn jolt(&mut self, percent: i32, update_vertices: bool) {
        self.bounds.y = self.bounds.y * percent / 100;
        self.bounds.hgt = self.bounds.hgt * percent / 100;
        self.fire_top = self.fire_top * percent / 100;
        if update_vertices {
            for v in &mut self.vertices {
                v.y = v.y * percent / 100;
            }
        }
    }

    pub fn vertex_outline(&self) -> Bounds {
        let mut rect = Bounds::default();
        for v in &self.vertices {
            if v.x < rect.x {
                rect.wdt += rect.x - v.x;
                rect.x = v.x;
            } else if v.x > rect.x + rect.wdt {
                rect.wdt = v.x - rect.x;
            }
            if v.y < rect.y {
                rect.hgt += rect.y - v.y;
                rect.y = v.y;
            } else if v.y > rect.y + rect.hgt {
                rect.hgt = v.y - rect.y;
            }
        }
        rect.hgt += rect.y - self.bounds.y;
        rect.y = self.bounds.y;
        rect
    }

    /// Cheap yes/no collision probe: true the instant any non-excluded
    /// vertex sits on solid ground.
    pub fn check_contact(&self, landscape: &Landscape, materials: &MaterialTable, cx: i32, cy: i32) -> bool {
        self.vertices.iter().any(|v| {
            !v.cnat.contains(Cnat::NO_COLLISION)
                && landscape.get_density(cx + v.x, cy + v.y, materials) >= self.contact_density
        })
    }

    /// Full contact scan: fills in each vertex's touched-material and
    /// per-direction contact bits, and returns how many vertices touched
    /// something.
    pub fn contact_check(&mut self, landscape: &Landscape, materials: &MaterialTable, cx: i32, cy: i32) -> i32 {
        self.contact_cnat = Cnat::NONE;
        self.contact_count = 0;

        for v in &mut self.vertices {
            if v.cnat.contains(Cnat::NO_COLLISION) {
                continue;
            }
            v.contact_cnat = Cnat::NONE;
            v.contact_mat = landscape.get_mat(cx + v.x, cy + v.y);

            if landscape.get_density(cx + v.x, cy + v.y, materials) >= self.contact_density {
                self.contact_cnat |= v.cnat;
                v.contact_cnat |= Cnat::CENTER;
                self.contact_count += 1;
                if landscape.get_density(cx + v.x, cy + v.y - 1, materials) >= self.contact_density {
                    v.contact_cnat |= Cnat::TOP;
                }
                if landscape.get_density(cx + v.x, cy + v.y + 1, materials) >= self.contact_density {
                    v.contact_cnat |= Cnat::BOTTOM;
                }
                if landscape.get_density(cx + v.x - 1, cy + v.y, materials) >= self.contact_density {
                    v.contact_cnat |= Cnat::LEFT;
                }
                if landscape.get_density(cx + v.x + 1, cy + v.y, materials) >= self.contact_density {
                    v.contact_cnat |= Cnat::RIGHT;
                }
            }
        }
        self.contact_count
    }

    fn direction_step(cnat_pos: Cnat) -> (i32, i32) {
        match cnat_pos.direction_only() {
            Cnat::TOP => (0, -1),
            Cnat::BOTTOM => (0, 1),
            Cnat::LEFT => (-1, 0),
            Cnat::RIGHT => (1, 0),
            _ => (0, 0),
        }
    }

    /// Nudges `(cx, cy)` by at most `attach_range` pixels toward
    /// `cnat_pos`'s direction until a matching vertex touches solid ground.
    /// `multi` selects the CE-style search that tries every matching
    /// vertex at each offset instead of exhausting one vertex's range
    /// before moving to the next (see [`Cnat::MULTI_ATTACH`]).
    pub fn attach(
        &mut self,
        landscape: &Landscape,
        materials: &MaterialTable,
        cx: &mut i32,
        cy: &mut i32,
        cnat_pos: Cnat,
    ) -> bool {
        self.attach_mat = MNONE;
        let (xcd, ycd) = Self::direction_step(cnat_pos);
        let xcrng = self.attach_range * xcd * -1;
        let ycrng = self.attach_range * ycd * -1;

        let mut attached = false;
        if !cnat_pos.contains(Cnat::MULTI_ATTACH) {
            for vtx in 0..self.vertices.len() {
                if !self.vertices[vtx].cnat.intersects(cnat_pos) {
                    continue;
                }
                let (mut xcnt, mut ycnt) = (xcrng, ycrng);
                loop {
                    let ax = *cx + self.vertices[vtx].x + xcnt + xcd;
                    let ay = *cy + self.vertices[vtx].y + ycnt + ycd;
                    if ax >= 0 && ax < landscape.width && landscape.get_density(ax, ay, materials) >= self.contact_density {
                        self.attach_mat = landscape.get_mat(ax, ay);
                        self.attach_x = ax;
                        self.attach_y = ay;
                        self.attach_vtx = vtx as i32;
                        *cx += xcnt;
                        *cy += ycnt;
                        attached = true;
                        break;
                    }
                    if xcnt == -xcrng && ycnt == -ycrng {
                        break;
                    }
                    xcnt += xcd;
                    ycnt += ycd;
                }
                if attached {
                    break;
                }
            }
        } else {
            let (mut xcnt, mut ycnt) = (xcrng, ycrng);
            'outer: loop {
                for vtx in 0..self.vertices.len() {
                    if !self.vertices[vtx].cnat.intersects(cnat_pos) {
                        continue;
                    }
                    let ax = *cx + self.vertices[vtx].x + xcnt + xcd;
                    let ay = *cy + self.vertices[vtx].y + ycnt + ycd;
                    if ax >= 0 && ax < landscape.width && landscape.get_density(ax, ay, materials) >= self.contact_density {
                        self.attach_mat = landscape.get_mat(ax, ay);
                        self.attach_x = ax;
                        self.attach_y = ay;
                        self.attach_vtx = vtx as i32;
                        *cx += xcnt;
                        *cy += ycnt;
                        attached = true;
                        break 'outer;
                    }
                }
                if xcnt == -xcrng && ycnt == -ycrng {
                    break;
                }
                xcnt += xcd;
                ycnt += ycd;
            }
        }
        attached
    }

    /// Moves a line-segment vertex to `(tx, ty)`, bending through an
    /// inserted vertex when the direct path is blocked. `ld` is `+1`/`-1`
    /// indicating which neighbor (`cvtx + ld`) the segment runs to.
    pub fn line_connect(
        &mut self,
        landscape: &Landscape,
        materials: &MaterialTable,
        tx: i32,
        ty: i32,
        mut cvtx: usize,
        ld: i32,
        old: (i32, i32),
    ) -> bool {
        if self.vertices.len() < 2 {
            return false;
        }
        if self.vertices[cvtx].x == tx && self.vertices[cvtx].y == ty {
            return true;
        }

        let neighbor = (cvtx as i32 + ld) as usize;
        let (nx, ny) = (self.vertices[neighbor].x, self.vertices[neighbor].y);
        let mut last_free = (0, 0);
        if landscape.path_free(tx, ty, nx, ny, materials, &mut last_free) {
            self.vertices[cvtx].x = tx;
            self.vertices[cvtx].y = ty;
            return true;
        }

        let (ix, iy) = last_free;
        let mut found = None;
        'search: for irange in (4..=12).step_by(4) {
            let mut cix = ix - irange / 2;
            while cix <= ix + irange {
                let mut ciy = iy - irange / 2;
                while ciy <= iy + irange {
                    if landscape.path_free_fast(cix, ciy, tx, ty, materials)
                        && landscape.path_free_fast(cix, ciy, nx, ny, materials)
                    {
                        found = Some((cix, ciy));
                        break 'search;
                    }
                    ciy += irange;
                }
                cix += irange;
            }
        }

        let (cix, ciy) = match found {
            Some(p) => p,
            None => {
                let (ox, oy) = old;
                if !landscape.path_free_ignore_vehicle(ox, oy, tx, ty, materials)
                    || !landscape.path_free_ignore_vehicle(ox, oy, nx, ny, materials)
                {
                    return false;
                }
                (ox, oy)
            }
        };

        if ld > 0 {
            if !self.insert_vertex(cvtx + 1, cix, ciy) {
                return false;
            }
        } else {
            if !self.insert_vertex(cvtx, cix, ciy) {
                return false;
            }
            cvtx += 1;
        }
        self.vertices[cvtx].x = tx;
        self.vertices[cvtx].y = ty;
        true
    }

    /// Probes the directions named in `check_mask` (defaulting to the
    /// vertex's own CNAT) around vertex `vtx`, offset by `(tx, ty)`.
    pub fn vertex_contact(
        &self,
        vtx: usize,
        check_mask: Cnat,
        tx: i32,
        ty: i32,
        density: &dyn DensityProvider,
    ) -> Cnat {
        let v = &self.vertices[vtx];
        let mask = if check_mask.is_empty() { v.cnat } else { check_mask };
        let (tx, ty) = (tx + v.x, ty + v.y);
        let mut contact = Cnat::NONE;
        if !v.cnat.contains(Cnat::NO_COLLISION) {
            if mask.contains(Cnat::CENTER) && density.density(tx, ty) >= self.contact_density {
                contact |= Cnat::CENTER;
            }
            if mask.contains(Cnat::LEFT) && density.density(tx - 1, ty) >= self.contact_density {
                contact |= Cnat::LEFT;
            }
            if mask.contains(Cnat::RIGHT) && density.density(tx + 1, ty) >= self.contact_density {
                contact |= Cnat::RIGHT;
            }
            if mask.contains(Cnat::TOP) && density.density(tx, ty - 1) >= self.contact_density {
                contact |= Cnat::TOP;
            }
            if mask.contains(Cnat::BOTTOM) && density.density(tx, ty + 1) >= self.contact_density {
                contact |= Cnat::BOTTOM;
            }
        }
        contact
    }

    /// Lowest vertex flagged `BOTTOM`, used to find where an object's feet
    /// are for stand-on-ground checks.
    pub fn bottom_vertex(&self) -> Option<usize> {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.cnat.contains(Cnat::BOTTOM))
            .min_by_key(|(_, v)| v.y)
            .map(|(i, _)| i)
    }
}
