//! Named, typed values exchanged with the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value carried by a [`PropertyValue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValueKind {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// String value.
    Str(String),
    /// Sequence of strings.
    StrList(Vec<String>),
    /// Nested property sequence (`[]PropertyValue`).
    Properties(Vec<PropertyValue>),
}

impl PropertyValueKind {
    /// String content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Boolean content, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::StrList(items) => write!(f, "[{}]", items.join(", ")),
            Self::Properties(props) => {
                let inner: Vec<String> = props.iter().map(ToString::to_string).collect();
                write!(f, "{{{}}}", inner.join(", "))
            }
        }
    }
}

impl From<bool> for PropertyValueKind {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValueKind {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for PropertyValueKind {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for PropertyValueKind {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<PropertyValue>> for PropertyValueKind {
    fn from(value: Vec<PropertyValue>) -> Self {
        Self::Properties(value)
    }
}

/// A named property, the engine's unit of call configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyValue {
    /// Property name.
    pub name: String,
    /// Property value.
    pub value: PropertyValueKind,
}

impl PropertyValue {
    /// Create a property.
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValueKind>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// First value named `name` in `properties`.
pub fn prop_lookup<'a>(
    properties: &'a [PropertyValue],
    name: &str,
) -> Option<&'a PropertyValueKind> {
    properties.iter().find(|p| p.name == name).map(|p| &p.value)
}
