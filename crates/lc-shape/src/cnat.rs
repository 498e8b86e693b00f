//! Contact-Normal-And-Type bits: which side of a vertex is touching
//! something solid, plus per-vertex attachment behavior flags.

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Cnat: u32 {
        const NONE          = 0x00;
        const TOP           = 0x01;
        const BOTTOM        = 0x02;
        const LEFT          = 0x04;
        const RIGHT         = 0x08;
        const CENTER        = 0x10;
        /// Vertex never participates in collision checks.
        const NO_COLLISION  = 0x20;
        /// Attach search scans every matching vertex instead of stopping at
        /// the first one found per direction.
        const MULTI_ATTACH  = 0x40;
    }
}

impl Cnat {
    /// The four directional bits, with attach/collision modifiers stripped.
    pub const DIRECTIONS: Cnat = Cnat::TOP.union(Cnat::BOTTOM).union(Cnat::LEFT).union(Cnat::RIGHT);

    /// Non-directional modifier bits (everything `Attach` treats as request
    /// flags rather than a direction to search).
    pub const MODIFIERS: Cnat = Cnat::CENTER
        .union(Cnat::NO_COLLISION)
        .union(Cnat::MULTI_ATTACH);

    pub fn direction_only(self) -> Cnat {
        self & Cnat::DIRECTIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_only_strips_modifiers() {
        let requested = Cnat::LEFT | Cnat::MULTI_ATTACH;
        assert_eq!(requested.direction_only(), Cnat::LEFT);
    }
}
