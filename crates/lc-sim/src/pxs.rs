//! PXS: the pooled, chunked particle system for loose material (dust,
//! sparks, splash droplets) that doesn't warrant a full `Object`. Grounded
//! on spec §4.G; the chunked free-list storage mirrors the teacher's
//! `edict_t` array-plus-freelist pattern in `g_local.rs`/`sv_init.rs`
//! rather than a `Vec::remove`-based pool, so deletes never shift indices
//! the renderer or other particles are holding onto.
use lc_landscape::{Landscape, MaterialTable, ReactionEffect};
use lc_math::Fixed;
use rand::Rng;

const CHUNK_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub x: Fixed,
    pub y: Fixed,
    pub xdir: Fixed,
    pub ydir: Fixed,
    pub material: u8,
}

/// Global (chunk, slot) index identifying one particle.
pub type PxsId = (usize, usize);

enum Slot {
    Free(Option<PxsId>),
    Used(Particle),
}

struct Chunk {
    slots: Vec<Slot>,
}

impl Chunk {
    /// Builds a chunk at index `idx` whose slots already chain into one
    /// another, so a freshly grown chunk is immediately a usable free list.
    fn new(idx: usize) -> Self {
        let mut slots = Vec::with_capacity(CHUNK_SIZE);
        for i in 0..CHUNK_SIZE {
            slots.push(Slot::Free(if i + 1 < CHUNK_SIZE { Some((idx, i + 1)) } else { None }));
        }
        Chunk { slots }
    }
}

pub struct PxsPool {
    chunks: Vec<Chunk>,
    free_head: Option<PxsId>,
    count: usize,
}

impl PxsPool {
    pub fn new() -> Self {
        PxsPool {
            chunks: vec![Chunk::new(0)],
            free_head: Some((0, 0)),
            count: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Appends a fresh all-free chunk; only called once the existing free
    /// list is exhausted, so the new chunk's own internal free chain
    /// becomes the pool's entire free list.
    fn grow(&mut self) {
        debug_assert!(self.free_head.is_none());
        let chunk_idx = self.chunks.len();
        self.chunks.push(Chunk::new(chunk_idx));
        self.free_head = Some((chunk_idx, 0));
    }

    pub fn new_particle(&mut self, x: Fixed, y: Fixed, xdir: Fixed, ydir: Fixed, material: u8) -> PxsId {
        if self.free_head.is_none() {
            self.grow();
        }
        let id = self.free_head.unwrap();
        let next = match &self.chunks[id.0].slots[id.1] {
            Slot::Free(next) => *next,
            Slot::Used(_) => unreachable!("free list pointed at a used slot"),
        };
        self.free_head = next;
        self.chunks[id.0].slots[id.1] = Slot::Used(Particle { x, y, xdir, ydir, material });
        self.count += 1;
        id
    }

    pub fn delete(&mut self, id: PxsId) {
        if let Slot::Used(_) = self.chunks[id.0].slots[id.1] {
            self.chunks[id.0].slots[id.1] = Slot::Free(self.free_head);
            self.free_head = Some(id);
            self.count -= 1;
        }
    }

    pub fn get(&self, id: PxsId) -> Option<&Particle> {
        match &self.chunks[id.0].slots[id.1] {
            Slot::Used(p) => Some(p),
            Slot::Free(_) => None,
        }
    }

    pub fn iter_ids(&self) -> impl Iterator<Item = PxsId> + '_ {
        self.chunks.iter().enumerate().flat_map(|(ci, chunk)| {
            chunk.slots.iter().enumerate().filter_map(move |(si, slot)| match slot {
                Slot::Used(_) => Some((ci, si)),
                Slot::Free(_) => None,
            })
        })
    }

    /// One simulation tick: gravity, wind drift, material-reaction lookup
    /// on touching something, and a one-pixel-step move. Particles with no
    /// match in the material table (an invalid or removed material) are
    /// deleted outright.
    pub fn step(&mut self, landscape: &Landscape, materials: &MaterialTable, rng: &mut impl Rng) {
        let ids: Vec<PxsId> = self.iter_ids().collect();
        let mut to_delete = Vec::new();
        for id in ids {
            let Slot::Used(p) = &mut self.chunks[id.0].slots[id.1] else { unreachable!() };
            if materials.get(p.material).is_none() {
                to_delete.push(id);
                continue;
            }
            p.ydir += landscape.gravity;
            let material = materials.get(p.material).expect("checked above");
            if material.wind_drift != 0 {
                let drift = rng.gen_range(-material.wind_drift..=material.wind_drift);
                p.xdir += Fixed::from_fraction(drift, 100);
            }

            let (nx, ny) = (p.x + p.xdir, p.y + p.ydir);
            let touched = landscape.get_mat(nx.to_int(), ny.to_int());
            let density = landscape.get_density(nx.to_int(), ny.to_int(), materials);

            if density >= 50 {
                match materials.reaction(p.material, touched) {
                    Some(ReactionEffect::Destroy { .. }) => {
                        to_delete.push(id);
                        continue;
                    }
                    Some(ReactionEffect::Convert(new_mat)) => {
                        p.material = new_mat;
                        p.xdir = Fixed::ZERO;
                        p.ydir = Fixed::ZERO;
                    }
                    Some(ReactionEffect::VelocityOnly) | None => {
                        p.ydir = Fixed::ZERO;
                        p.xdir = Fixed::ZERO;
                    }
                }
            } else {
                p.x = nx;
                p.y = ny;
            }

            let out_of_world = p.x.to_int() < 0
                || p.x.to_int() >= landscape.width
                || p.y.to_int() < 0
                || p.y.to_int() >= landscape.height;
            if out_of_world {
                to_delete.push(id);
            }
        }
        for id in to_delete {
            self.delete(id);
        }
    }
}

impl Default for PxsPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lc_landscape::{Material, MaterialTable};
    use rand::SeedableRng;

    fn materials_with_splash() -> MaterialTable {
        let mut t = MaterialTable::new();
        t.add(Material::new("Sky", 0, 0, 0));
        t.add(Material::new("Earth", 50, 100, 0));
        t
    }

    #[test]
    fn new_and_delete_reuse_slots() {
        let mut pool = PxsPool::new();
        let a = pool.new_particle(Fixed::ZERO, Fixed::ZERO, Fixed::ZERO, Fixed::ZERO, 0);
        assert_eq!(pool.count(), 1);
        pool.delete(a);
        assert_eq!(pool.count(), 0);
        let b = pool.new_particle(Fixed::ZERO, Fixed::ZERO, Fixed::ZERO, Fixed::ZERO, 0);
        assert_eq!(pool.count(), 1);
        assert!(pool.get(b).is_some());
    }

    #[test]
    fn grows_past_one_chunk() {
        let mut pool = PxsPool::new();
        for _ in 0..(CHUNK_SIZE + 5) {
            pool.new_particle(Fixed::ZERO, Fixed::ZERO, Fixed::ZERO, Fixed::ZERO, 0);
        }
        assert_eq!(pool.count(), CHUNK_SIZE + 5);
    }

    #[test]
    fn invalid_material_is_deleted_on_step() {
        let materials = materials_with_splash();
        let land = Landscape::new(100, 100, Fixed::ZERO);
        let mut pool = PxsPool::new();
        pool.new_particle(Fixed::from_int(10), Fixed::from_int(10), Fixed::ZERO, Fixed::ZERO, 0xaa);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        pool.step(&land, &materials, &mut rng);
        assert_eq!(pool.count(), 0);
    }

    #[test]
    fn particle_falls_under_gravity() {
        let materials = materials_with_splash();
        let land = Landscape::new(100, 100, Fixed::from_fraction(1, 4));
        let mut pool = PxsPool::new();
        let id = pool.new_particle(Fixed::from_int(10), Fixed::from_int(10), Fixed::ZERO, Fixed::ZERO, 0);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        pool.step(&land, &materials, &mut rng);
        assert!(pool.get(id).unwrap().y > Fixed::from_int(10));
    }
}
