//! Binary `Value` serializer: a single-character tag per variant, with
//! object handles resolved through a two-pass enumerate/denumerate table
//! rather than raw pointers. Grounded on spec §4.N and the teacher's
//! `g_save.rs` field-descriptor tag dispatch (`FieldType`), adapted from a
//! struct-field table to a self-describing value stream since script
//! values have no fixed layout the way edict fields do.
use std::collections::HashMap;
use std::rc::Rc;

use lc_script::{ArrayRef, MapRef, ObjectHandle, Value};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("unexpected end of buffer")]
    Eof,
    #[error("string is not valid utf-8")]
    InvalidUtf8,
    #[error("object id {0} has no enumerated handle")]
    UnknownObjectId(u32),
}

const TAG_NIL: u8 = b'0';
const TAG_INT: u8 = b'i';
const TAG_BOOL: u8 = b'b';
const TAG_ID: u8 = b'd';
const TAG_OBJECT: u8 = b'o';
const TAG_STRING: u8 = b's';
const TAG_ARRAY: u8 = b'a';
const TAG_MAP: u8 = b'm';

/// Stable save-file object ids standing in for live `ObjectHandle`s.
/// `C4EnumPointer1`/`C4EnumPointer2` in `original_source/` reserve two
/// special ranges (unresolved forward reference, deleted object); `NONE`
/// and `DELETED` mirror those here.
pub const ENUM_NONE: u32 = 0;
pub const ENUM_DELETED: u32 = 0xffff_ffff;

/// Maps live object handles to stable small integers for the duration of
/// one save, built by a pass over every value that will be written before
/// any encoding happens (so forward references resolve correctly).
#[derive(Default)]
pub struct Enumerator {
    next_id: u32,
    forward: HashMap<ObjectHandle, u32>,
}

impl Enumerator {
    pub fn new() -> Self {
        Enumerator { next_id: 1, forward: HashMap::new() }
    }

    pub fn enumerate(&mut self, handle: ObjectHandle) -> u32 {
        *self.forward.entry(handle).or_insert_with(|| {
            let id = self.next_id;
            self.next_id += 1;
            id
        })
    }

    /// Walks a value tree, registering every object handle it reaches.
    pub fn visit(&mut self, value: &Value) {
        match value {
            Value::Object(handle) => {
                self.enumerate(*handle);
            }
            Value::Array(arr) => {
                for item in &arr.borrow().items {
                    self.visit(item);
                }
            }
            Value::Map(map) => {
                for (k, v) in &map.borrow().pairs {
                    self.visit(k);
                    self.visit(v);
                }
            }
            _ => {}
        }
    }
}

/// Reverses an `Enumerator`'s table after load, turning stable ids back
/// into live handles. A lookup miss means the save referenced an object id
/// that never resolved on this side (a deleted or not-yet-spawned object);
/// callers get `ObjectHandle { index: u32::MAX, generation: 0 }` as a
/// harmless dangling handle rather than an error, matching a find/deref on
/// it returning nil.
pub struct Denumerator {
    table: HashMap<u32, ObjectHandle>,
}

impl Denumerator {
    pub fn new(table: HashMap<u32, ObjectHandle>) -> Self {
        Denumerator { table }
    }

    pub fn resolve(&self, id: u32) -> ObjectHandle {
        self.table.get(&id).copied().unwrap_or(ObjectHandle { index: u32::MAX, generation: 0 })
    }
}

pub struct Encoder {
    out: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Encoder { out: Vec::new() }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }

    pub fn write_value(&mut self, value: &Value, ids: &Enumerator) {
        match value {
            Value::Nil => self.out.push(TAG_NIL),
            Value::Int(i) => {
                self.out.push(TAG_INT);
                self.out.extend_from_slice(&i.to_le_bytes());
            }
            Value::Bool(b) => {
                self.out.push(TAG_BOOL);
                self.out.push(*b as u8);
            }
            Value::Id(id) => {
                self.out.push(TAG_ID);
                self.out.extend_from_slice(&id.to_le_bytes());
            }
            Value::Object(handle) => {
                self.out.push(TAG_OBJECT);
                let stable = ids.forward.get(handle).copied().unwrap_or(ENUM_NONE);
                self.out.extend_from_slice(&stable.to_le_bytes());
            }
            Value::String(s) => {
                self.out.push(TAG_STRING);
                let bytes = s.as_bytes();
                self.out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                self.out.extend_from_slice(bytes);
            }
            Value::Array(arr) => {
                self.out.push(TAG_ARRAY);
                let data = arr.borrow();
                self.out.extend_from_slice(&(data.items.len() as u32).to_le_bytes());
                for item in &data.items {
                    self.write_value(item, ids);
                }
            }
            Value::Map(map) => {
                self.out.push(TAG_MAP);
                let data = map.borrow();
                self.out.extend_from_slice(&(data.pairs.len() as u32).to_le_bytes());
                for (k, v) in &data.pairs {
                    self.write_value(k, ids);
                    self.write_value(v, ids);
                }
            }
            Value::Ref(_) => {
                // Refs never persist; callers deref before handing a value
                // to the encoder. Encode the dereferenced value instead of
                // failing the whole save.
                self.write_value(&value.deref(), ids);
            }
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Decoder { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.pos + n > self.buf.len() {
            return Err(CodecError::Eof);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn take_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn take_i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    /// Reads one value. Tags this decoder does not recognize are skipped
    /// with a warning rather than aborting the whole load, matching
    /// spec §4.N's forward-compatibility rule — but since an unknown tag's
    /// length is unknowable, this returns `Value::Nil` in its place and
    /// logs the byte so a newer save format degrades instead of crashing.
    pub fn read_value(&mut self, ids: &Denumerator) -> Result<Value, CodecError> {
        let tag = self.take_u8()?;
        match tag {
            TAG_NIL => Ok(Value::Nil),
            TAG_INT => Ok(Value::Int(self.take_i32()?)),
            TAG_BOOL => Ok(Value::Bool(self.take_u8()? != 0)),
            TAG_ID => Ok(Value::Id(self.take_u32()?)),
            TAG_OBJECT => Ok(Value::Object(ids.resolve(self.take_u32()?))),
            TAG_STRING => {
                let len = self.take_u32()? as usize;
                let bytes = self.take(len)?;
                let s = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
                Ok(Value::String(Rc::from(s)))
            }
            TAG_ARRAY => {
                let len = self.take_u32()? as usize;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.read_value(ids)?);
                }
                Ok(Value::new_array(items))
            }
            TAG_MAP => {
                let len = self.take_u32()? as usize;
                let mut pairs = Vec::with_capacity(len);
                for _ in 0..len {
                    let k = self.read_value(ids)?;
                    let v = self.read_value(ids)?;
                    pairs.push((k, v));
                }
                Ok(Value::new_map(pairs))
            }
            other => {
                tracing::warn!(tag = other, "unknown value tag in save stream, treating as nil");
                Ok(Value::Nil)
            }
        }
    }
}

/// Round-trips a value tree through the enumerate -> encode -> decode ->
/// denumerate pipeline; the only entry point most callers need.
pub fn encode_tree(value: &Value) -> (Vec<u8>, HashMap<u32, ObjectHandle>) {
    let mut enumerator = Enumerator::new();
    enumerator.visit(value);
    let mut encoder = Encoder::new();
    encoder.write_value(value, &enumerator);
    let reverse: HashMap<u32, ObjectHandle> = enumerator.forward.iter().map(|(h, id)| (*id, *h)).collect();
    (encoder.into_bytes(), reverse)
}

pub fn decode_tree(bytes: &[u8], handle_table: HashMap<u32, ObjectHandle>) -> Result<Value, CodecError> {
    let denumerator = Denumerator::new(handle_table);
    let mut decoder = Decoder::new(bytes);
    decoder.read_value(&denumerator)
}

#[allow(dead_code)]
fn assert_send<T: Send>() {}
#[allow(dead_code)]
type _ArrayRefCheck = ArrayRef;
#[allow(dead_code)]
type _MapRefCheck = MapRef;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_round_trip() {
        for v in [Value::Nil, Value::Int(-42), Value::Bool(true), Value::Id(7)] {
            let (bytes, table) = encode_tree(&v);
            let back = decode_tree(&bytes, table).unwrap();
            assert!(v.compare(&back, lc_script::CompareMode::TypeEqual));
        }
    }

    #[test]
    fn string_round_trips() {
        let v = Value::String(Rc::from("hello world"));
        let (bytes, table) = encode_tree(&v);
        let back = decode_tree(&bytes, table).unwrap();
        assert!(v.compare(&back, lc_script::CompareMode::TypeEqual));
    }

    #[test]
    fn array_round_trips() {
        let v = Value::new_array(vec![Value::Int(1), Value::Bool(false), Value::Nil]);
        let (bytes, table) = encode_tree(&v);
        let back = decode_tree(&bytes, table).unwrap();
        assert!(v.compare(&back, lc_script::CompareMode::TypeEqual));
    }

    #[test]
    fn object_handles_round_trip_through_enumeration() {
        let handle = ObjectHandle { index: 5, generation: 2 };
        let v = Value::new_array(vec![Value::Object(handle), Value::Object(handle)]);
        let (bytes, table) = encode_tree(&v);
        let back = decode_tree(&bytes, table).unwrap();
        let Value::Array(arr) = back else { panic!("expected array") };
        let items = arr.borrow().items.clone();
        let Value::Object(first) = items[0] else { panic!("expected object") };
        let Value::Object(second) = items[1] else { panic!("expected object") };
        assert_eq!(first, handle);
        assert_eq!(second, handle);
    }

    #[test]
    fn unresolved_object_id_yields_dangling_handle() {
        let (bytes, _) = encode_tree(&Value::Object(ObjectHandle { index: 9, generation: 0 }));
        let back = decode_tree(&bytes, HashMap::new()).unwrap();
        let Value::Object(handle) = back else { panic!("expected object") };
        assert_eq!(handle.index, u32::MAX);
    }

    #[test]
    fn unknown_tag_decodes_as_nil_instead_of_erroring() {
        let back = decode_tree(&[b'?'], HashMap::new()).unwrap();
        assert!(matches!(back, Value::Nil));
    }
}
