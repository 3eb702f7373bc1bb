//! Typed attribute blocks attached to external resources.
//!
//! Each resource family declares an ordered table of [`AttrDef`]s (name,
//! type, default). The engine reads attributes by index through typed
//! accessors that return `Option<T>`; a missing value or a type mismatch
//! yields `None`, which callers treat as "use the default".

use std::fmt;

/// A single attribute value.
///
/// The variant doubles as the attribute's type tag: [`AttrSet::set`]
/// rejects writes that would change the variant declared by the
/// definition table.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Signed integer attribute (priorities, surface ids).
    Integer(i32),
    /// Unsigned integer attribute.
    Unsigned(u32),
    /// String attribute (appids, area names, roles).
    String(String),
    /// Floating point attribute.
    Floating(f64),
}

impl AttrValue {
    fn same_type(&self, other: &AttrValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Integer(v) => write!(f, "{v}"),
            AttrValue::Unsigned(v) => write!(f, "{v}"),
            AttrValue::String(v) => write!(f, "'{v}'"),
            AttrValue::Floating(v) => write!(f, "{v}"),
        }
    }
}

/// Default value in an attribute definition table.
///
/// Const-constructible mirror of [`AttrValue`] so family tables can live
/// in `static` data.
#[derive(Debug, Clone, Copy)]
pub enum AttrDefault {
    /// Signed integer default.
    Integer(i32),
    /// Unsigned integer default.
    Unsigned(u32),
    /// String default.
    String(&'static str),
    /// Floating point default.
    Floating(f64),
}

impl AttrDefault {
    fn materialize(self) -> AttrValue {
        match self {
            AttrDefault::Integer(v) => AttrValue::Integer(v),
            AttrDefault::Unsigned(v) => AttrValue::Unsigned(v),
            AttrDefault::String(v) => AttrValue::String(v.to_owned()),
            AttrDefault::Floating(v) => AttrValue::Floating(v),
        }
    }
}

/// One entry of a family's attribute definition table.
#[derive(Debug, Clone, Copy)]
pub struct AttrDef {
    /// Attribute name, unique within the table.
    pub name: &'static str,
    /// Default value; its variant fixes the attribute's type.
    pub default: AttrDefault,
}

impl AttrDef {
    /// Creates a definition entry.
    pub const fn new(name: &'static str, default: AttrDefault) -> Self {
        Self { name, default }
    }
}

/// The attribute block of one resource instance.
///
/// Values are stored in definition-table order so the engine can read
/// them by index, the way the external resource framework exposes them.
#[derive(Debug, Clone)]
pub struct AttrSet {
    defs: &'static [AttrDef],
    values: Vec<AttrValue>,
}

impl AttrSet {
    /// Creates a block with every attribute at its declared default.
    pub fn new(defs: &'static [AttrDef]) -> Self {
        let values = defs.iter().map(|d| d.default.materialize()).collect();
        Self { defs, values }
    }

    /// Number of attributes in the block.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the definition table is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reads an integer attribute by index.
    ///
    /// Returns `None` when the index is out of range or the attribute is
    /// not an integer.
    pub fn integer(&self, index: usize) -> Option<i32> {
        match self.values.get(index) {
            Some(AttrValue::Integer(v)) => Some(*v),
            _ => None,
        }
    }

    /// Reads an unsigned attribute by index.
    pub fn unsigned(&self, index: usize) -> Option<u32> {
        match self.values.get(index) {
            Some(AttrValue::Unsigned(v)) => Some(*v),
            _ => None,
        }
    }

    /// Reads a string attribute by index.
    pub fn string(&self, index: usize) -> Option<&str> {
        match self.values.get(index) {
            Some(AttrValue::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Reads a floating point attribute by index.
    pub fn floating(&self, index: usize) -> Option<f64> {
        match self.values.get(index) {
            Some(AttrValue::Floating(v)) => Some(*v),
            _ => None,
        }
    }

    /// Writes an attribute by name.
    ///
    /// Returns `false` if the name is unknown or the value's type does
    /// not match the declared type; the block is left unchanged.
    pub fn set(&mut self, name: &str, value: AttrValue) -> bool {
        let Some(index) = self.defs.iter().position(|d| d.name == name) else {
            return false;
        };
        if !self.values[index].same_type(&value) {
            return false;
        }
        self.values[index] = value;
        true
    }

    /// Convenience writer for integer attributes.
    pub fn set_integer(&mut self, name: &str, value: i32) -> bool {
        self.set(name, AttrValue::Integer(value))
    }

    /// Convenience writer for string attributes.
    pub fn set_string(&mut self, name: &str, value: impl Into<String>) -> bool {
        self.set(name, AttrValue::String(value.into()))
    }

    /// Iterates `(name, value)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &AttrValue)> {
        self.defs
            .iter()
            .map(|d| d.name)
            .zip(self.values.iter())
    }
}
