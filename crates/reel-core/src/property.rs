//! A single typed, lazily coercible property slot.
//!
//! A slot holds one tagged value. Reading it as a different kind coerces
//! deterministically; the string view of a numeric or opaque value is built on
//! first request and cached until the slot is next written.

use std::any::Any;
use std::cell::OnceCell;
use std::fmt;

/// Timecode of a frame, in frames.
pub type Timecode = f64;

/// A producer position, in frames.
pub type Position = f64;

/// Hook run exactly once when an owned opaque value leaves its slot.
pub type Destructor = Box<dyn FnOnce(Box<dyn Any + Send>) + Send>;

/// Derives a string view of an opaque value on demand.
pub type Serialiser = fn(&(dyn Any + Send), usize) -> String;

/// Kind of value currently held by a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Empty,
    Int,
    Double,
    Timecode,
    String,
    Data,
}

/// An untyped payload with an explicit length.
///
/// When a destructor is supplied the slot owns the payload and hands it to the
/// destructor when the slot is cleared. Without one the payload is simply
/// dropped, which for shared handles (an `Arc` clone, say) leaves the caller's
/// copy untouched.
pub struct OpaqueData {
    value: Box<dyn Any + Send>,
    length: usize,
    destructor: Option<Destructor>,
    serialiser: Option<Serialiser>,
}

impl OpaqueData {
    pub fn new<T: Any + Send>(value: T, length: usize) -> Self {
        Self {
            value: Box::new(value),
            length,
            destructor: None,
            serialiser: None,
        }
    }

    pub fn with_destructor(mut self, destructor: Destructor) -> Self {
        self.destructor = Some(destructor);
        self
    }

    pub fn with_serialiser(mut self, serialiser: Serialiser) -> Self {
        self.serialiser = Some(serialiser);
        self
    }

    /// Length recorded when the value was stored.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    fn release(self) {
        if let Some(destructor) = self.destructor {
            destructor(self.value);
        }
    }
}

impl fmt::Debug for OpaqueData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueData")
            .field("length", &self.length)
            .field("owned", &self.destructor.is_some())
            .field("serialisable", &self.serialiser.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
enum Value {
    #[default]
    Empty,
    Int(i32),
    Double(f64),
    Timecode(Timecode),
    String(String),
    Data(OpaqueData),
}

/// One property slot.
#[derive(Debug, Default)]
pub struct Property {
    value: Value,
    string: OnceCell<Option<String>>,
}

impl Property {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kind of the value currently stored.
    pub fn kind(&self) -> PropertyKind {
        match self.value {
            Value::Empty => PropertyKind::Empty,
            Value::Int(_) => PropertyKind::Int,
            Value::Double(_) => PropertyKind::Double,
            Value::Timecode(_) => PropertyKind::Timecode,
            Value::String(_) => PropertyKind::String,
            Value::Data(_) => PropertyKind::Data,
        }
    }

    /// Clear the slot, running the destructor of owned opaque data.
    pub fn clear(&mut self) {
        self.string.take();
        if let Value::Data(data) = std::mem::take(&mut self.value) {
            data.release();
        }
    }

    pub fn set_int(&mut self, value: i32) {
        self.clear();
        self.value = Value::Int(value);
    }

    pub fn set_double(&mut self, value: f64) {
        self.clear();
        self.value = Value::Double(value);
    }

    pub fn set_timecode(&mut self, value: Timecode) {
        self.clear();
        self.value = Value::Timecode(value);
    }

    /// Store a string. `None` stores "no value".
    pub fn set_string(&mut self, value: Option<&str>) {
        self.clear();
        if let Some(value) = value {
            self.value = Value::String(value.to_owned());
        }
    }

    pub fn set_data(&mut self, data: OpaqueData) {
        self.clear();
        self.value = Value::Data(data);
    }

    pub fn get_int(&self) -> i32 {
        match &self.value {
            Value::Int(v) => *v,
            Value::Double(v) | Value::Timecode(v) => *v as i32,
            Value::String(s) => parse_int(s),
            Value::Empty | Value::Data(_) => 0,
        }
    }

    pub fn get_double(&self) -> f64 {
        match &self.value {
            Value::Double(v) | Value::Timecode(v) => *v,
            Value::Int(v) => *v as f64,
            Value::String(s) => parse_double(s),
            Value::Empty | Value::Data(_) => 0.0,
        }
    }

    pub fn get_timecode(&self) -> Timecode {
        self.get_double()
    }

    /// String view of the value, generated on first request and cached.
    ///
    /// Opaque data only has a string view when a serialiser was supplied.
    pub fn get_string(&self) -> Option<&str> {
        if let Value::String(s) = &self.value {
            return Some(s.as_str());
        }
        self.string
            .get_or_init(|| match &self.value {
                Value::Int(v) => Some(v.to_string()),
                Value::Double(v) | Value::Timecode(v) => Some(v.to_string()),
                Value::Data(data) => data
                    .serialiser
                    .map(|serialise| serialise(data.value.as_ref(), data.length)),
                Value::Empty | Value::String(_) => None,
            })
            .as_deref()
    }

    /// Borrow opaque data of type `T` with its recorded length. No coercion.
    pub fn get_data<T: Any>(&self) -> Option<(&T, usize)> {
        match &self.value {
            Value::Data(data) => data.value.downcast_ref::<T>().map(|v| (v, data.length)),
            _ => None,
        }
    }

    pub fn get_data_mut<T: Any>(&mut self) -> Option<(&mut T, usize)> {
        self.string.take();
        match &mut self.value {
            Value::Data(data) => {
                let length = data.length;
                data.value.downcast_mut::<T>().map(|v| (v, length))
            }
            _ => None,
        }
    }

    /// Copy a scalar value. Opaque data is not copied and yields `None`.
    pub fn duplicate(&self) -> Option<Property> {
        let value = match &self.value {
            Value::Empty => Value::Empty,
            Value::Int(v) => Value::Int(*v),
            Value::Double(v) => Value::Double(*v),
            Value::Timecode(v) => Value::Timecode(*v),
            Value::String(s) => Value::String(s.clone()),
            Value::Data(_) => return None,
        };
        Some(Property {
            value,
            string: OnceCell::new(),
        })
    }
}

impl Drop for Property {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Parse the longest integer prefix, `atoi` style. Returns 0 when none.
pub fn parse_int(s: &str) -> i32 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return 0;
    }
    match s[..end].parse::<i64>() {
        Ok(v) => v.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
        Err(_) if s.starts_with('-') => i32::MIN,
        Err(_) => i32::MAX,
    }
}

/// Parse the longest floating point prefix, `atof` style. Returns 0.0 when none.
pub fn parse_double(s: &str) -> f64 {
    let s = s.trim();
    if let Ok(v) = s.parse::<f64>() {
        return v;
    }
    let bytes = s.as_bytes();
    let mut end = 0;
    while end < bytes.len() && matches!(bytes[end], b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E')
    {
        end += 1;
    }
    (1..=end)
        .rev()
        .find_map(|len| s[..len].parse::<f64>().ok())
        .unwrap_or(0.0)
}
