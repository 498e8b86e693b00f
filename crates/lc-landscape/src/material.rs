//! Static material table: density/friction/wind-drift plus the source×target
//! reaction rules PXS particles consult when they touch something.

pub const MNONE: u8 = 0xff;
pub const MAX_MATERIALS: usize = 256;

/// What a material reaction does when triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionEffect {
    /// Leaves velocity/identity untouched aside from what the caller already
    /// applied — a "non-destructive reaction" per the glossary.
    VelocityOnly,
    /// Converts the particle into a different material in place.
    Convert(u8),
    /// Removes the particle (and optionally the landscape pixel beneath it,
    /// e.g. acid eating through earth).
    Destroy { landscape_to: Option<u8> },
}

#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub density: i32,
    pub friction: i32,
    pub wind_drift: i32,
    pub pxs_gfx: u8,
    /// Reaction keyed by the material the particle just touched.
    reactions: Vec<Option<ReactionEffect>>,
}

impl Material {
    pub fn new(name: impl Into<String>, density: i32, friction: i32, wind_drift: i32) -> Self {
        Material {
            name: name.into(),
            density,
            friction,
            wind_drift,
            pxs_gfx: 0,
            reactions: vec![None; MAX_MATERIALS],
        }
    }

    pub fn set_reaction(&mut self, target_mat: u8, effect: ReactionEffect) {
        self.reactions[target_mat as usize] = Some(effect);
    }

    pub fn reaction_with(&self, target_mat: u8) -> Option<ReactionEffect> {
        self.reactions.get(target_mat as usize).copied().flatten()
    }
}

/// Threshold density at or above which landscape pixels count as solid for
/// collision/path-free purposes.
pub const SOLID_DENSITY: i32 = 50;

pub struct MaterialTable {
    materials: Vec<Material>,
}

impl MaterialTable {
    pub fn new() -> Self {
        MaterialTable {
            materials: Vec::new(),
        }
    }

    pub fn add(&mut self, material: Material) -> u8 {
        assert!(self.materials.len() < MAX_MATERIALS, "material table full");
        self.materials.push(material);
        (self.materials.len() - 1) as u8
    }

    pub fn get(&self, index: u8) -> Option<&Material> {
        if index == MNONE {
            None
        } else {
            self.materials.get(index as usize)
        }
    }

    pub fn density(&self, index: u8) -> i32 {
        self.get(index).map(|m| m.density).unwrap_or(0)
    }

    pub fn is_solid(&self, index: u8) -> bool {
        self.density(index) >= SOLID_DENSITY
    }

    pub fn reaction(&self, source: u8, target: u8) -> Option<ReactionEffect> {
        self.get(source).and_then(|m| m.reaction_with(target))
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_lookup() {
        let mut table = MaterialTable::new();
        let sky = table.add(Material::new("Sky", 0, 0, 0));
        let earth = table.add(Material::new("Earth", 50, 100, 0));
        assert!(!table.is_solid(sky));
        assert!(table.is_solid(earth));
    }

    #[test]
    fn reaction_lookup() {
        let mut table = MaterialTable::new();
        let water = table.add(Material::new("Water", 25, 0, 10));
        let lava = table.add(Material::new("Lava", 40, 0, 0));
        table.materials[water as usize].set_reaction(lava, ReactionEffect::Destroy { landscape_to: None });
        assert_eq!(
            table.reaction(water, lava),
            Some(ReactionEffect::Destroy { landscape_to: None })
        );
        assert_eq!(table.reaction(lava, water), None);
    }

    #[test]
    fn mnone_has_no_density() {
        let table = MaterialTable::new();
        assert_eq!(table.density(MNONE), 0);
        assert!(!table.is_solid(MNONE));
    }
}
