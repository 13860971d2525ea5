//! Ordered property store.
//!
//! Every pipeline object (frames, producers, transitions) carries one of these.
//! Keys are unique and keep their insertion order, which only matters for
//! introspection. Unknown keys read back as defaults, never as errors.

use std::any::Any;

use indexmap::IndexMap;

use crate::property::{OpaqueData, Position, Property, Timecode};

/// An ordered mapping from string keys to typed property slots.
#[derive(Debug, Default)]
pub struct Properties {
    entries: IndexMap<String, Property>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, key: &str) -> &mut Property {
        if !self.entries.contains_key(key) {
            self.entries.insert(key.to_owned(), Property::new());
        }
        &mut self.entries[key]
    }

    /// Look up a slot without coercion.
    pub fn find(&self, key: &str) -> Option<&Property> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Set a string value.
    pub fn set(&mut self, key: &str, value: &str) {
        self.slot(key).set_string(Some(value));
    }

    /// Set a string value; `None` stores "no value".
    pub fn set_string(&mut self, key: &str, value: Option<&str>) {
        self.slot(key).set_string(value);
    }

    pub fn set_int(&mut self, key: &str, value: i32) {
        self.slot(key).set_int(value);
    }

    pub fn set_double(&mut self, key: &str, value: f64) {
        self.slot(key).set_double(value);
    }

    pub fn set_timecode(&mut self, key: &str, value: Timecode) {
        self.slot(key).set_timecode(value);
    }

    pub fn set_position(&mut self, key: &str, value: Position) {
        self.slot(key).set_double(value);
    }

    /// Store opaque data, taking ownership as described by [`OpaqueData`].
    pub fn set_data(&mut self, key: &str, data: OpaqueData) {
        self.slot(key).set_data(data);
    }

    /// String view of a value, `None` if absent or not representable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Property::get_string)
    }

    pub fn get_int(&self, key: &str) -> i32 {
        self.entries.get(key).map_or(0, Property::get_int)
    }

    pub fn get_double(&self, key: &str) -> f64 {
        self.entries.get(key).map_or(0.0, Property::get_double)
    }

    pub fn get_timecode(&self, key: &str) -> Timecode {
        self.entries.get(key).map_or(0.0, Property::get_timecode)
    }

    pub fn get_position(&self, key: &str) -> Position {
        self.get_double(key)
    }

    /// Borrow opaque data of type `T` and its recorded length.
    pub fn get_data<T: Any>(&self, key: &str) -> Option<(&T, usize)> {
        self.entries.get(key).and_then(Property::get_data::<T>)
    }

    pub fn get_data_mut<T: Any>(&mut self, key: &str) -> Option<(&mut T, usize)> {
        self.entries.get_mut(key).and_then(Property::get_data_mut::<T>)
    }

    /// Remove a key, running any destructor it owns.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.shift_remove(key).is_some()
    }

    /// Copy every scalar entry of `other` into this store.
    ///
    /// Opaque data is skipped; ownership of it can't be shared.
    pub fn inherit(&mut self, other: &Properties) {
        for (key, property) in other.entries.iter() {
            if let Some(copy) = property.duplicate() {
                self.entries.insert(key.clone(), copy);
            }
        }
    }

    /// Clear every slot in order, running destructors, and forget the keys.
    pub fn clear(&mut self) {
        for property in self.entries.values_mut() {
            property.clear();
        }
        self.entries.clear();
    }

    /// Close the store.
    pub fn close(mut self) {
        self.clear();
    }
}
