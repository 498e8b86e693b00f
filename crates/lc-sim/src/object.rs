//! The per-section object: position, motion state, and the shape it
//! collides through. Mirrors spec's data model §3 "Object" entry, minus the
//! script-visible local variables (those live in `lc-script::Value` storage
//! the section keeps alongside this table, not inside `Object` itself).

use bitflags::bitflags;
use lc_math::Fixed;
use lc_shape::{Cnat, Shape};

pub type ObjectId = u32;

bitflags! {
    /// Object Character Flags: category/capability bits queried by the
    /// find engine's `OCF`/`Category` opcodes and by movement's hit-speed
    /// threshold dispatch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ocf: u32 {
        const NONE = 0x0;
        const ALIVE = 0x01;
        const ROTATE = 0x02;
        const FULL_CON = 0x04;
        const COLLECTIBLE = 0x08;
        const HIT_SPEED1 = 0x10;
        const HIT_SPEED2 = 0x20;
        const HIT_SPEED3 = 0x40;
        const IN_LIQUID = 0x80;
        const IN_SOLID = 0x100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active,
    /// Cleared but still iterated to completion this frame per §5's
    /// "objects whose status flips mid-frame are iterated if the cursor
    /// already passed their link" ordering guarantee.
    Removed,
}

#[derive(Debug, Clone)]
pub struct Object {
    pub id: ObjectId,
    pub x: Fixed,
    pub y: Fixed,
    pub r: i32,
    pub xdir: Fixed,
    pub ydir: Fixed,
    pub rdir: Fixed,
    pub category: Ocf,
    pub owner: i32,
    pub controller: i32,
    pub status: Status,
    pub shape: Shape,
    pub container: Option<ObjectId>,
    pub layer: Option<ObjectId>,
    /// Visit-once marker for sector-spanning traversals (spec §4.D); callers
    /// stamp it with a per-query generation counter instead of allocating a
    /// visited set.
    pub marker: u32,
    /// CNAT the current action wants this object attached to (`Cnat::NONE`
    /// when no attachment is requested this tick). Set by whatever drives
    /// the object's action outside this crate; motion's step 5 consumes
    /// it and clears the override flags below when the request is empty
    /// or fails.
    pub attach_request: Cnat,
    pub attach_x_override: bool,
    pub attach_y_override: bool,
}

impl Object {
    pub fn new(id: ObjectId, x: Fixed, y: Fixed, shape: Shape) -> Self {
        Object {
            id,
            x,
            y,
            r: 0,
            xdir: Fixed::ZERO,
            ydir: Fixed::ZERO,
            rdir: Fixed::ZERO,
            category: Ocf::NONE,
            owner: -1,
            controller: -1,
            status: Status::Active,
            shape,
            container: None,
            layer: None,
            marker: 0,
            attach_request: Cnat::NONE,
            attach_x_override: false,
            attach_y_override: false,
        }
    }

    pub fn cx(&self) -> i32 {
        self.x.to_int()
    }

    pub fn cy(&self) -> i32 {
        self.y.to_int()
    }

    pub fn bounding_rect(&self) -> (i32, i32, i32, i32) {
        let b = self.shape.vertex_outline();
        let (cx, cy) = (self.cx(), self.cy());
        (cx + b.x, cy + b.y, cx + b.x + b.wdt, cy + b.y + b.hgt)
    }

    pub fn is_attached(&self) -> bool {
        self.shape.contact_cnat.intersects(Cnat::DIRECTIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_object_starts_active_and_unattached() {
        let obj = Object::new(7, Fixed::from_int(10), Fixed::from_int(20), Shape::new());
        assert_eq!(obj.id, 7);
        assert_eq!(obj.status, Status::Active);
        assert!(!obj.is_attached());
        assert_eq!(obj.cx(), 10);
        assert_eq!(obj.cy(), 20);
    }

    #[test]
    fn is_attached_reflects_contact_cnat() {
        let mut obj = Object::new(1, Fixed::ZERO, Fixed::ZERO, Shape::new());
        obj.shape.contact_cnat = Cnat::BOTTOM;
        assert!(obj.is_attached());
        obj.shape.contact_cnat = Cnat::CENTER;
        assert!(!obj.is_attached());
    }

    #[test]
    fn bounding_rect_follows_position() {
        let mut shape = Shape::new();
        shape.add_vertex(-3, -3);
        shape.add_vertex(3, 3);
        let obj = Object::new(1, Fixed::from_int(50), Fixed::from_int(50), shape);
        let (x0, _y0, x1, _y1) = obj.bounding_rect();
        assert!(x0 <= 47, "left edge {x0} should cover the leftmost vertex");
        assert!(x1 >= 53, "right edge {x1} should cover the rightmost vertex");
    }
}
