//! Name-keyed function registry: every script and engine function is
//! looked up by name in O(1), with same-named functions from different
//! owners chained so overload resolution and virtual-like dispatch work.

use std::collections::HashMap;

use crate::bytecode::Chunk;
use crate::error::AulError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Access {
    Private,
    Protected,
    Public,
    Global,
}

pub type FuncId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddHint {
    Start,
    End,
}

#[derive(Debug)]
pub enum FuncBody {
    Script(Chunk),
    /// Index into the host's native function table (engine calls like
    /// `ObjectCount`, `Distance`, ...).
    Native(usize),
}

#[derive(Debug)]
pub struct AulFunc {
    pub name: String,
    pub params: Vec<String>,
    pub access: Access,
    /// Owning script/definition; `None` for engine-global functions.
    pub owner: Option<u32>,
    pub body: FuncBody,
    /// Next function sharing this name across the whole tree — the
    /// same-name ring `AfterLink` builds. `None` until linking runs.
    /// `pub(crate)` so the linker can build `AulFunc` literals directly;
    /// outside the crate, `FuncMap::register_native`/`register_script` are
    /// the only constructors.
    pub(crate) next_same_name: Option<FuncId>,
}

/// Hash table of functions keyed by name, chained on collision through
/// each bucket's own `Vec` (the original threads a "next in bucket"
/// pointer through the function struct itself; a `Vec` per bucket gets
/// the same O(1)-amortized behavior without unsafe aliasing).
#[derive(Default)]
pub struct FuncMap {
    funcs: Vec<AulFunc>,
    buckets: HashMap<String, Vec<FuncId>>,
}

impl FuncMap {
    pub fn new() -> Self {
        FuncMap::default()
    }

    pub fn register(&mut self, func: AulFunc, hint: AddHint) -> FuncId {
        let id = self.funcs.len();
        let name = func.name.clone();
        self.funcs.push(func);
        let bucket = self.buckets.entry(name).or_default();
        match hint {
            AddHint::Start => bucket.insert(0, id),
            AddHint::End => bucket.push(id),
        }
        id
    }

    /// Registers an engine-native function (`FuncBody::Native`) without
    /// requiring callers outside this module to build an `AulFunc`
    /// literal themselves — hosts only ever add native entries, never
    /// script-backed ones, so this is the constructor they need.
    pub fn register_native(&mut self, name: &str, access: Access, owner: Option<u32>, native_id: usize, hint: AddHint) -> FuncId {
        self.register(
            AulFunc {
                name: name.to_string(),
                params: Vec::new(),
                access,
                owner,
                body: FuncBody::Native(native_id),
                next_same_name: None,
            },
            hint,
        )
    }

    /// Registers a compiled script function — the counterpart to
    /// `register_native` for the linker and any caller assembling a
    /// `FuncMap` without going through a full [`crate::linker::Linker`]
    /// pass (e.g. a host wiring up a single standalone function).
    pub fn register_script(&mut self, name: &str, params: Vec<String>, access: Access, owner: Option<u32>, chunk: Chunk, hint: AddHint) -> FuncId {
        self.register(
            AulFunc {
                name: name.to_string(),
                params,
                access,
                owner,
                body: FuncBody::Script(chunk),
                next_same_name: None,
            },
            hint,
        )
    }

    pub fn get(&self, id: FuncId) -> &AulFunc {
        &self.funcs[id]
    }

    pub fn get_mut(&mut self, id: FuncId) -> &mut AulFunc {
        &mut self.funcs[id]
    }

    pub fn remove(&mut self, id: FuncId) {
        if let Some(bucket) = self.buckets.get_mut(&self.funcs[id].name) {
            bucket.retain(|&f| f != id);
        }
    }

    pub fn first_func(&self, name: &str) -> Option<FuncId> {
        self.buckets.get(name).and_then(|b| b.first().copied())
    }

    /// First function named `name` visible from `owner_scope` honoring
    /// access level, optionally continuing the search strictly after
    /// `after_func` in bucket order (used to walk overload chains).
    pub fn get_func(&self, name: &str, owner_scope: Option<u32>, after_func: Option<FuncId>) -> Option<FuncId> {
        let bucket = self.buckets.get(name)?;
        let start = match after_func {
            Some(after) => bucket.iter().position(|&f| f == after).map(|p| p + 1).unwrap_or(0),
            None => 0,
        };
        bucket[start..]
            .iter()
            .copied()
            .find(|&id| self.is_visible(id, owner_scope))
    }

    fn is_visible(&self, id: FuncId, owner_scope: Option<u32>) -> bool {
        let f = &self.funcs[id];
        match f.access {
            Access::Global | Access::Public => true,
            Access::Protected | Access::Private => f.owner == owner_scope,
        }
    }

    /// Looks up `name` for a caller scoped to `owner_scope`, distinguishing
    /// "no function by this name anywhere" from "one exists, but `
    /// owner_scope` can't see it" — the latter is spec §7's access
    /// violation (a parse-time warning, execution allowed in non-strict
    /// mode), not a plain unknown-function error.
    pub fn resolve(&self, name: &str, owner_scope: Option<u32>) -> Result<FuncId, AulError> {
        if let Some(id) = self.get_func(name, owner_scope, None) {
            return Ok(id);
        }
        match self.buckets.get(name).and_then(|b| b.first()) {
            Some(&id) => Err(AulError::AccessViolation(name.to_string(), self.funcs[id].access)),
            None => Err(AulError::UnknownFunction(name.to_string())),
        }
    }

    pub fn count(&self) -> usize {
        self.funcs.len()
    }

    pub fn iter_ids(&self) -> impl Iterator<Item = FuncId> {
        0..self.funcs.len()
    }

    /// Threads every same-named function into a closed ring so
    /// `next_same_name_func` walking from any node returns to the start in
    /// at most the bucket's length hops. Called once during `AfterLink`.
    pub fn build_same_name_rings(&mut self) {
        let bucket_ids: Vec<Vec<FuncId>> = self.buckets.values().cloned().collect();
        for bucket in bucket_ids {
            if bucket.is_empty() {
                continue;
            }
            for (i, &id) in bucket.iter().enumerate() {
                let next = bucket[(i + 1) % bucket.len()];
                self.funcs[id].next_same_name = Some(next);
            }
        }
    }

    pub fn next_same_name_func(&self, id: FuncId) -> Option<FuncId> {
        self.funcs[id].next_same_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy(name: &str, owner: Option<u32>, access: Access) -> AulFunc {
        AulFunc {
            name: name.to_string(),
            params: Vec::new(),
            access,
            owner,
            body: FuncBody::Native(0),
            next_same_name: None,
        }
    }

    #[test]
    fn lookup_respects_access_level() {
        let mut map = FuncMap::new();
        let id = map.register(dummy("Attack", Some(1), Access::Private), AddHint::End);
        assert_eq!(map.get_func("Attack", Some(1), None), Some(id));
        assert_eq!(map.get_func("Attack", Some(2), None), None);
    }

    #[test]
    fn public_func_visible_from_any_scope() {
        let mut map = FuncMap::new();
        let id = map.register(dummy("Heal", Some(1), Access::Public), AddHint::End);
        assert_eq!(map.get_func("Heal", Some(99), None), Some(id));
    }

    #[test]
    fn same_name_ring_is_closed() {
        let mut map = FuncMap::new();
        let a = map.register(dummy("Think", Some(1), Access::Public), AddHint::End);
        let b = map.register(dummy("Think", Some(2), Access::Public), AddHint::End);
        let c = map.register(dummy("Think", Some(3), Access::Public), AddHint::End);
        map.build_same_name_rings();

        let mut cur = a;
        let mut hops = 0;
        loop {
            cur = map.next_same_name_func(cur).unwrap();
            hops += 1;
            if cur == a {
                break;
            }
            assert!(hops <= 3, "ring did not close");
        }
        assert_eq!(hops, 3);
        assert!([a, b, c].contains(&map.next_same_name_func(a).unwrap()));
    }

    #[test]
    fn resolve_reports_access_violation_for_an_existing_but_hidden_name() {
        let mut map = FuncMap::new();
        map.register(dummy("Attack", Some(1), Access::Private), AddHint::End);
        let err = map.resolve("Attack", Some(2)).unwrap_err();
        assert!(matches!(err, crate::error::AulError::AccessViolation(name, Access::Private) if name == "Attack"));
    }

    #[test]
    fn resolve_reports_unknown_function_when_no_name_matches_at_all() {
        let mut map = FuncMap::new();
        map.register(dummy("Attack", Some(1), Access::Private), AddHint::End);
        let err = map.resolve("NoSuchThing", None).unwrap_err();
        assert!(matches!(err, crate::error::AulError::UnknownFunction(name) if name == "NoSuchThing"));
    }

    #[test]
    fn add_start_hint_wins_first_match() {
        let mut map = FuncMap::new();
        let first = map.register(dummy("Go", None, Access::Global), AddHint::End);
        let prepended = map.register(dummy("Go", None, Access::Global), AddHint::Start);
        assert_eq!(map.first_func("Go"), Some(prepended));
        assert_ne!(map.first_func("Go"), Some(first));
    }
}
