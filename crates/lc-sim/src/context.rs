//! The section's mutable state, bundled into one struct and threaded
//! through every public entry point instead of living behind globals.
//! Grounded on `crate::g_local::GameCtx` in the teacher's `g_phys.rs`,
//! which already threads `edicts`/`level` through its physics functions
//! as an explicit struct rather than through module-level statics.

use std::collections::HashMap;

use lc_landscape::{MaterialTable, SectorIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::message::MessageBoard;
use crate::object::{Object, ObjectId, Status};
use crate::pxs::PxsPool;

type Rect = (i32, i32, i32, i32);

/// What the sector index currently has on file for one object, so a later
/// resync knows what to remove before re-adding.
#[derive(Clone, Copy)]
struct Filed {
    pos: (i32, i32),
    rect: Rect,
}

/// Everything one simulated section owns: the landscape is kept separate
/// (callers hold it alongside `Section` rather than inside it) since most
/// operations need `&Landscape` and `&mut Section` simultaneously and Rust
/// cannot split one struct's borrow that way across a function boundary.
pub struct Section {
    pub materials: MaterialTable,
    pub sectors: SectorIndex,
    pub objects: Vec<Object>,
    pub pxs: PxsPool,
    pub messages: MessageBoard,
    pub rng: StdRng,
    next_object_id: ObjectId,
    frame: u32,
    query_marker: u32,
    filed: HashMap<ObjectId, Filed>,
}

impl Section {
    pub fn new(materials: MaterialTable, width: i32, height: i32, seed: u64) -> Self {
        Section {
            materials,
            sectors: SectorIndex::new(width, height),
            objects: Vec::new(),
            pxs: PxsPool::new(),
            messages: MessageBoard::new(),
            rng: StdRng::seed_from_u64(seed),
            next_object_id: 1,
            frame: 0,
            query_marker: 0,
            filed: HashMap::new(),
        }
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn advance_frame(&mut self) {
        self.frame += 1;
    }

    /// Fresh per-query visited-marker generation, handed to callers that
    /// need to stamp `Object::marker` without colliding with a prior query
    /// (spec's sector-spanning find-engine dedup).
    pub fn next_query_marker(&mut self) -> u32 {
        self.query_marker += 1;
        self.query_marker
    }

    pub fn spawn(&mut self, mut obj: Object) -> ObjectId {
        let id = self.next_object_id;
        self.next_object_id += 1;
        obj.id = id;
        let pos = (obj.cx(), obj.cy());
        let rect = obj.bounding_rect();
        self.sectors.add_by_pos(id, pos.0, pos.1);
        self.sectors.add_by_shape(id, rect.0, rect.1, rect.2, rect.3);
        self.filed.insert(id, Filed { pos, rect });
        self.objects.push(obj);
        id
    }

    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Re-files an object's sector membership after its position or shape
    /// changed; must run once per object per tick that moved it.
    pub fn resync_sector(&mut self, id: ObjectId) {
        let Some(obj) = self.object(id) else { return };
        let new_pos = (obj.cx(), obj.cy());
        let new_rect = obj.bounding_rect();
        let old = self.filed.get(&id).copied();
        if let Some(old) = old {
            if old.pos != new_pos {
                self.sectors.update_pos(id, old.pos.0, old.pos.1, new_pos.0, new_pos.1);
            }
            if old.rect != new_rect {
                self.sectors.update_shape(id, old.rect, new_rect);
            }
        } else {
            self.sectors.add_by_pos(id, new_pos.0, new_pos.1);
            self.sectors.add_by_shape(id, new_rect.0, new_rect.1, new_rect.2, new_rect.3);
        }
        self.filed.insert(id, Filed { pos: new_pos, rect: new_rect });
    }

    /// Drops every object marked `Removed`, clearing dangling
    /// `container`/`layer` references and message pointers first. Runs
    /// once per tick after movement and script dispatch have had their
    /// chance to iterate the removed objects to completion.
    pub fn reap_removed(&mut self) {
        let removed: Vec<ObjectId> = self
            .objects
            .iter()
            .filter(|o| o.status == Status::Removed)
            .map(|o| o.id)
            .collect();
        for id in &removed {
            if let Some(filed) = self.filed.remove(id) {
                self.sectors.remove_by_pos(*id, filed.pos.0, filed.pos.1);
                self.sectors.remove_by_shape(*id, filed.rect.0, filed.rect.1, filed.rect.2, filed.rect.3);
            }
            self.messages.clear_pointers(*id);
        }
        for obj in &mut self.objects {
            if obj.container.map_or(false, |c| removed.contains(&c)) {
                obj.container = None;
            }
            if obj.layer.map_or(false, |l| removed.contains(&l)) {
                obj.layer = None;
            }
        }
        self.objects.retain(|o| o.status != Status::Removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lc_landscape::{Material, MaterialTable};
    use lc_math::Fixed;
    use lc_shape::Shape;

    fn section() -> Section {
        let mut materials = MaterialTable::new();
        materials.add(Material::new("Sky", 0, 0, 0));
        Section::new(materials, 500, 500, 42)
    }

    #[test]
    fn spawn_assigns_increasing_ids() {
        let mut sec = section();
        let a = sec.spawn(Object::new(0, Fixed::ZERO, Fixed::ZERO, Shape::new()));
        let b = sec.spawn(Object::new(0, Fixed::ZERO, Fixed::ZERO, Shape::new()));
        assert_ne!(a, b);
        assert!(sec.object(a).is_some());
        assert!(sec.object(b).is_some());
    }

    #[test]
    fn reap_removed_clears_container_references() {
        let mut sec = section();
        let parent = sec.spawn(Object::new(0, Fixed::ZERO, Fixed::ZERO, Shape::new()));
        let child_id = sec.spawn(Object::new(0, Fixed::ZERO, Fixed::ZERO, Shape::new()));
        sec.object_mut(child_id).unwrap().container = Some(parent);
        sec.object_mut(parent).unwrap().status = Status::Removed;
        sec.reap_removed();
        assert!(sec.object(parent).is_none());
        assert_eq!(sec.object(child_id).unwrap().container, None);
    }

    #[test]
    fn query_marker_increments() {
        let mut sec = section();
        let a = sec.next_query_marker();
        let b = sec.next_query_marker();
        assert!(b > a);
    }
}
