// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property values carried by node instances, ports and graph variables.

use crate::context::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic kind of a declared property or data port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    /// Boolean
    Bool,
    /// Integer
    Int,
    /// Floating point
    Float,
    /// 3D vector
    Vector3,
    /// String
    String,
    /// Reference to a scene entity
    Object,
    /// Accepts any value
    Any,
}

impl PropertyKind {
    /// Check if a value of this kind can flow into a slot of `other` kind
    pub fn can_convert_to(self, other: PropertyKind) -> bool {
        if self == other || matches!(self, Self::Any) || matches!(other, Self::Any) {
            return true;
        }

        matches!(
            (self, other),
            (Self::Int, Self::Float) | (Self::Float, Self::Int) | (Self::Float, Self::Vector3)
        )
    }

    /// The zero value for this kind
    pub fn zero(self) -> PropertyValue {
        match self {
            Self::Bool => PropertyValue::Bool(false),
            Self::Int => PropertyValue::Int(0),
            Self::Float | Self::Any => PropertyValue::Float(0.0),
            Self::Vector3 => PropertyValue::Vector3([0.0; 3]),
            Self::String => PropertyValue::String(String::new()),
            Self::Object => PropertyValue::Object(None),
        }
    }
}

/// A property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f32),
    /// 3D vector
    Vector3([f32; 3]),
    /// String
    String(String),
    /// Entity reference; `None` means the entity that owns the graph
    Object(Option<EntityId>),
}

impl PropertyValue {
    /// Get the kind of this value
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Bool(_) => PropertyKind::Bool,
            Self::Int(_) => PropertyKind::Int,
            Self::Float(_) => PropertyKind::Float,
            Self::Vector3(_) => PropertyKind::Vector3,
            Self::String(_) => PropertyKind::String,
            Self::Object(_) => PropertyKind::Object,
        }
    }

    /// Read as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Read as a float, widening integers
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f32),
            _ => None,
        }
    }

    /// Read as a vector, splatting scalars
    pub fn as_vector3(&self) -> Option<[f32; 3]> {
        match self {
            Self::Vector3(v) => Some(*v),
            Self::Float(f) => Some([*f; 3]),
            Self::Int(i) => Some([*i as f32; 3]),
            _ => None,
        }
    }

    /// Read as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read as an entity reference
    pub fn as_object(&self) -> Option<Option<EntityId>> {
        match self {
            Self::Object(o) => Some(*o),
            _ => None,
        }
    }

    /// Component-wise sum. Integers stay integers, anything mixed with a
    /// vector becomes a vector.
    pub fn add(&self, other: &PropertyValue) -> Option<PropertyValue> {
        self.combine(other, |a, b| a + b, i64::checked_add)
    }

    /// Component-wise product, same promotion rules as [`PropertyValue::add`].
    pub fn mul(&self, other: &PropertyValue) -> Option<PropertyValue> {
        self.combine(other, |a, b| a * b, i64::checked_mul)
    }

    fn combine(
        &self,
        other: &PropertyValue,
        float_op: impl Fn(f32, f32) -> f32,
        int_op: impl Fn(i64, i64) -> Option<i64>,
    ) -> Option<PropertyValue> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => int_op(*a, *b).map(Self::Int),
            (Self::Vector3(_), _) | (_, Self::Vector3(_)) => {
                let a = self.as_vector3()?;
                let b = other.as_vector3()?;
                Some(Self::Vector3([
                    float_op(a[0], b[0]),
                    float_op(a[1], b[1]),
                    float_op(a[2], b[2]),
                ]))
            }
            _ => Some(Self::Float(float_op(self.as_float()?, other.as_float()?))),
        }
    }
}

impl Default for PropertyValue {
    fn default() -> Self {
        Self::Float(0.0)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Vector3([x, y, z]) => write!(f, "({x}, {y}, {z})"),
            Self::String(s) => f.write_str(s),
            Self::Object(Some(id)) => write!(f, "{id}"),
            Self::Object(None) => f.write_str("self"),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for PropertyValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<[f32; 3]> for PropertyValue {
    fn from(value: [f32; 3]) -> Self {
        Self::Vector3(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<EntityId> for PropertyValue {
    fn from(value: EntityId) -> Self {
        Self::Object(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_addition() {
        let sum = PropertyValue::Float(0.5).add(&PropertyValue::Float(10.0));
        assert_eq!(sum, Some(PropertyValue::Float(10.5)));
    }

    #[test]
    fn test_int_promotion() {
        assert_eq!(
            PropertyValue::Int(2).add(&PropertyValue::Int(3)),
            Some(PropertyValue::Int(5))
        );
        assert_eq!(
            PropertyValue::Int(2).mul(&PropertyValue::Float(1.5)),
            Some(PropertyValue::Float(3.0))
        );
        assert_eq!(PropertyValue::Int(i64::MAX).add(&PropertyValue::Int(1)), None);
    }

    #[test]
    fn test_vector_scaling() {
        let scaled = PropertyValue::Vector3([1.0, 2.0, 3.0]).mul(&PropertyValue::Float(2.0));
        assert_eq!(scaled, Some(PropertyValue::Vector3([2.0, 4.0, 6.0])));
    }

    #[test]
    fn test_incompatible_operands() {
        assert_eq!(PropertyValue::Bool(true).add(&PropertyValue::Float(1.0)), None);
        assert_eq!(PropertyValue::from("a").mul(&PropertyValue::Int(2)), None);
    }

    #[test]
    fn test_kind_conversion() {
        assert!(PropertyKind::Int.can_convert_to(PropertyKind::Float));
        assert!(PropertyKind::Float.can_convert_to(PropertyKind::Vector3));
        assert!(PropertyKind::Bool.can_convert_to(PropertyKind::Any));
        assert!(!PropertyKind::Bool.can_convert_to(PropertyKind::Float));
        assert!(!PropertyKind::Vector3.can_convert_to(PropertyKind::Float));
    }
}
