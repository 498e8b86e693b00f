//! Per-tick Newtonian step for one object: horizontal then vertical
//! integration one pixel at a time, contact-redirect, action-driven
//! attachment, rotation, and SolidMask replacement. Grounded on the same
//! pixel-at-a-time integration
//! approach `original_source/` describes in spec §4.E; the hit-speed
//! threshold callbacks are exposed through the `ContactSink` trait rather
//! than a hard-coded script call.
use lc_landscape::{Landscape, MaterialTable};
use lc_math::Fixed;
use lc_shape::Cnat;

use crate::object::{Object, Ocf};

const ROTATE_STEP: i32 = 5;
const STABLE_RANGE: i32 = 10;

/// Callback surface for movement events a higher layer (script dispatch)
/// wants to react to. Kept separate from `Object` so `lc-sim` never depends
/// on `lc-script`.
pub trait ContactSink {
    fn on_contact(&mut self, obj: &Object, cnat: Cnat);
    fn on_hit(&mut self, obj: &Object, speed: Fixed);
}

pub struct NoopSink;
impl ContactSink for NoopSink {
    fn on_contact(&mut self, _obj: &Object, _cnat: Cnat) {}
    fn on_hit(&mut self, _obj: &Object, _speed: Fixed) {}
}

/// Runs steps 1-6, 8-10 of the per-tick motion algorithm for one
/// uncontained object (step 7, SolidMask replacement, is the caller's
/// responsibility since it needs the full mask registry).
pub fn step_object(
    obj: &mut Object,
    landscape: &Landscape,
    materials: &MaterialTable,
    sink: &mut dyn ContactSink,
) {
    obj.shape.attach_mat = lc_landscape::MNONE;

    let incoming_speed = lc_math::fixed::distance(0, 0, obj.xdir.round_to_int(), obj.ydir.round_to_int());

    step_horizontal(obj, landscape, materials, sink);
    step_vertical(obj, landscape, materials, sink);
    step_attach(obj, landscape, materials);
    step_rotation(obj, landscape, materials);
    reclassify_liquid(obj, landscape, materials);
    emit_hit_callbacks(obj, incoming_speed, sink);
    clamp_or_remove(obj, landscape);
}

/// Pulls the object onto whatever its current action wants it attached to
/// (`Cnat::NONE` means no action has asked for an attachment this tick).
/// Nudges `obj.x`/`obj.y` the way `Shape::attach` nudges its `cx`/`cy`
/// outputs, and records which axis actually moved so callers that read
/// position back out of the object (e.g. the action's own continuation
/// logic) can tell a real attachment from an unattached object that
/// simply didn't move.
fn step_attach(obj: &mut Object, landscape: &Landscape, materials: &MaterialTable) {
    obj.attach_x_override = false;
    obj.attach_y_override = false;
    if obj.attach_request.is_empty() {
        return;
    }
    let (mut cx, mut cy) = (obj.cx(), obj.cy());
    if !obj.shape.attach(landscape, materials, &mut cx, &mut cy, obj.attach_request) {
        return;
    }
    obj.attach_x_override = cx != obj.cx();
    obj.attach_y_override = cy != obj.cy();
    obj.x = Fixed::from_int(cx);
    obj.y = Fixed::from_int(cy);
}

fn step_horizontal(obj: &mut Object, landscape: &Landscape, materials: &MaterialTable, sink: &mut dyn ContactSink) {
    if obj.xdir == Fixed::ZERO {
        return;
    }
    let steps = obj.xdir.abs().round_to_int().max(1);
    let dir = obj.xdir.sign();
    for _ in 0..steps {
        let (nx, ny) = (obj.x + Fixed::from_int(dir), obj.y);
        if obj.shape.check_contact(landscape, materials, nx.to_int(), ny.to_int()) {
            let cnat = if dir > 0 { Cnat::RIGHT } else { Cnat::LEFT };
            sink.on_contact(obj, cnat);
            redirect_force(obj, cnat);
            break;
        }
        obj.x = nx;
    }
}

fn step_vertical(obj: &mut Object, landscape: &Landscape, materials: &MaterialTable, sink: &mut dyn ContactSink) {
    obj.ydir += landscape.gravity;
    if obj.ydir == Fixed::ZERO {
        return;
    }
    let steps = obj.ydir.abs().round_to_int().max(1);
    let dir = obj.ydir.sign();
    for _ in 0..steps {
        let (nx, ny) = (obj.x, obj.y + Fixed::from_int(dir));
        let count = obj.shape.contact_check(landscape, materials, nx.to_int(), ny.to_int());
        if count > 0 {
            let cnat = if dir > 0 { Cnat::BOTTOM } else { Cnat::TOP };
            sink.on_contact(obj, cnat);
            if count as usize == obj.shape.vertex_count() {
                redirect_force(obj, cnat);
                if obj.category.contains(Ocf::ROTATE) {
                    obj.rdir += obj.xdir / 4;
                }
            } else {
                let friction = materials_friction(obj);
                apply_friction(obj, friction);
            }
            break;
        }
        obj.y = ny;
    }
}

fn materials_friction(obj: &Object) -> i32 {
    obj.shape.vertices().iter().find(|v| v.contact_cnat != Cnat::NONE).map(|v| v.friction).unwrap_or(0)
}

/// Converts velocity perpendicular to a contact normal into the other axis,
/// matching the original's `RedirectForce` (horizontal blocked motion
/// becomes downward pressure and vice versa).
fn redirect_force(obj: &mut Object, cnat: Cnat) {
    match cnat.direction_only() {
        Cnat::LEFT | Cnat::RIGHT => {
            obj.ydir += obj.xdir.abs() / 2;
            obj.xdir = Fixed::ZERO;
        }
        Cnat::TOP | Cnat::BOTTOM => {
            obj.xdir += obj.ydir.abs() / 2;
            obj.ydir = Fixed::ZERO;
        }
        _ => {}
    }
}

fn apply_friction(obj: &mut Object, friction: i32) {
    let f = Fixed::from_fraction(friction, 100);
    if obj.xdir > Fixed::ZERO {
        obj.xdir = (obj.xdir - f).max(Fixed::ZERO);
    } else if obj.xdir < Fixed::ZERO {
        obj.xdir = (obj.xdir + f).min(Fixed::ZERO);
    }
}

fn step_rotation(obj: &mut Object, landscape: &Landscape, materials: &MaterialTable) {
    if obj.rdir == Fixed::ZERO || !obj.category.contains(Ocf::ROTATE) {
        return;
    }
    let steps = (obj.rdir.abs().round_to_int() / ROTATE_STEP).max(1);
    let dir = obj.rdir.sign();
    for _ in 0..steps {
        let old_r = obj.r;
        obj.r += dir * ROTATE_STEP;
        obj.shape.rotate(dir * ROTATE_STEP, true);
        if obj.shape.check_contact(landscape, materials, obj.cx(), obj.cy()) {
            obj.r = old_r;
            obj.shape.rotate(-dir * ROTATE_STEP, true);
            obj.xdir += obj.rdir.abs() / 4;
            obj.rdir = Fixed::ZERO;
            break;
        }
    }
}

/// Snaps small residual rotation to zero once it is within `StableRange`
/// and doing so would not put any vertex into contact.
pub fn stabilize(obj: &mut Object, landscape: &Landscape, materials: &MaterialTable) {
    if obj.r == 0 || obj.r.abs() > STABLE_RANGE {
        return;
    }
    let saved = obj.r;
    obj.r = 0;
    obj.shape.rotate(-saved, true);
    if obj.shape.check_contact(landscape, materials, obj.cx(), obj.cy()) {
        obj.r = saved;
        obj.shape.rotate(saved, true);
    }
}

fn reclassify_liquid(obj: &mut Object, landscape: &Landscape, materials: &MaterialTable) {
    let in_liquid = landscape.get_density(obj.cx(), obj.cy(), materials) > 0
        && landscape.get_density(obj.cx(), obj.cy(), materials) < 50;
    obj.category.set(Ocf::IN_LIQUID, in_liquid);
}

fn emit_hit_callbacks(obj: &Object, incoming_speed: i32, sink: &mut dyn ContactSink) {
    if obj.shape.contact_count > 0 && incoming_speed > 0 {
        sink.on_hit(obj, Fixed::from_int(incoming_speed));
    }
}

fn clamp_or_remove(obj: &mut Object, landscape: &Landscape) {
    let out_of_world = obj.cx() < 0 || obj.cx() >= landscape.width || obj.cy() < 0 || obj.cy() >= landscape.height;
    if out_of_world && !obj.is_attached() {
        obj.status = crate::object::Status::Removed;
    }
}

/// Side-effect-free ballistic predictor: applies gravity once per
/// iteration, stops at `iter` steps or when density leaves `[densityMin,
/// densityMax]`, and never mutates the landscape or the caller's object.
pub fn sim_flight(
    mut x: i32,
    mut y: i32,
    xdir: Fixed,
    mut ydir: Fixed,
    landscape: &Landscape,
    materials: &MaterialTable,
    density_min: i32,
    density_max: i32,
    iter: u32,
) -> (i32, i32) {
    for _ in 0..iter {
        let density = landscape.get_density(x, y, materials);
        if density < density_min || density > density_max {
            break;
        }
        x += xdir.round_to_int();
        y += ydir.round_to_int();
        ydir += landscape.gravity;
    }
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lc_landscape::{Cell, Material, MaterialTable};
    use lc_shape::{Shape, Cnat as ShapeCnat};

    fn flat_ground() -> (Landscape, MaterialTable) {
        let mut materials = MaterialTable::new();
        materials.add(Material::new("Sky", 0, 0, 0));
        let earth = materials.add(Material::new("Earth", 50, 100, 0));
        let mut land = Landscape::new(200, 200, Fixed::from_fraction(1, 5));
        for x in 0..200 {
            land.set_pix(x, 150, Cell { material: earth, ift: false });
        }
        (land, materials)
    }

    fn falling_object() -> Object {
        let mut shape = Shape::new();
        shape.add_vertex(0, 4);
        shape.set_vertex_cnat(0, ShapeCnat::BOTTOM);
        Object::new(1, Fixed::from_int(50), Fixed::from_int(100), shape)
    }

    #[test]
    fn object_falls_and_stops_on_ground() {
        let (land, materials) = flat_ground();
        let mut obj = falling_object();
        let mut sink = NoopSink;
        for _ in 0..500 {
            step_object(&mut obj, &land, &materials, &mut sink);
            if obj.ydir == Fixed::ZERO {
                break;
            }
        }
        assert!(obj.cy() <= 146, "object should have come to rest near the ground, got {}", obj.cy());
    }

    #[test]
    fn out_of_world_marks_removed() {
        let (land, materials) = flat_ground();
        let mut obj = falling_object();
        obj.x = Fixed::from_int(-5);
        let mut sink = NoopSink;
        step_object(&mut obj, &land, &materials, &mut sink);
        assert_eq!(obj.status, crate::object::Status::Removed);
    }

    #[test]
    fn attach_request_pulls_object_onto_ground_and_sets_override() {
        let (land, materials) = flat_ground();
        let mut shape = Shape::new();
        shape.attach_range = 5;
        shape.add_vertex(0, 0);
        shape.set_vertex_cnat(0, ShapeCnat::BOTTOM);
        let mut obj = Object::new(1, Fixed::from_int(50), Fixed::from_int(146), shape);
        obj.attach_request = ShapeCnat::BOTTOM;
        let mut sink = NoopSink;
        step_object(&mut obj, &land, &materials, &mut sink);
        assert!(obj.attach_y_override, "vertical attach should have fired");
        assert_eq!(obj.cy(), 149);
    }

    #[test]
    fn no_attach_request_leaves_overrides_clear() {
        let (land, materials) = flat_ground();
        let mut obj = falling_object();
        let mut sink = NoopSink;
        step_object(&mut obj, &land, &materials, &mut sink);
        assert!(!obj.attach_x_override);
        assert!(!obj.attach_y_override);
    }

    #[test]
    fn sim_flight_applies_gravity_without_mutating_landscape() {
        let (land, materials) = flat_ground();
        let (x, y) = sim_flight(50, 50, Fixed::from_int(1), Fixed::ZERO, &land, &materials, 0, 10, 20);
        assert!(y > 50);
        assert_eq!(land.get_mat(50, 50), 0);
    }
}
