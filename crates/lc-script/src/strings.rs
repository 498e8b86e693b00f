//! Process-wide string interning table. Every `Value::String` holds an
//! `Rc<str>` obtained from here, so two equal script string literals share
//! storage and compare by pointer in the fast path.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Default)]
pub struct StringTable {
    entries: RefCell<HashMap<Rc<str>, ()>>,
}

impl StringTable {
    pub fn new() -> Self {
        StringTable::default()
    }

    /// Returns the interned `Rc<str>` for `text`, reusing an existing
    /// allocation when the string was already seen.
    pub fn intern(&self, text: &str) -> Rc<str> {
        let mut entries = self.entries.borrow_mut();
        if let Some((existing, _)) = entries.get_key_value(text) {
            return existing.clone();
        }
        let rc: Rc<str> = Rc::from(text);
        entries.insert(rc.clone(), ());
        rc
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_shares_allocation() {
        let table = StringTable::new();
        let a = table.intern("hello");
        let b = table.intern("hello");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn distinct_strings_get_distinct_entries() {
        let table = StringTable::new();
        table.intern("a");
        table.intern("b");
        assert_eq!(table.len(), 2);
    }
}
