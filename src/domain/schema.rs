//! Typed column schema for the `servers` table
//!
//! Every dynamic read or write goes through [`Field`]. Column names only ever
//! reach SQL via [`Field::column`], so a name that is not part of the schema
//! cannot be expressed past the API boundary.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::SyncError;
use crate::domain::record::ServerCategory;

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Boolean,
    /// Text restricted to a [`ServerCategory`] label
    Category,
}

/// Who is allowed to change a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Primary key, immutable once set
    Key,
    /// Rewritten by every sync that observes the record
    Sync,
    /// Only changed through direct attribute writes
    Caller,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    IpAddress,
    Name,
    Type,
    Page,
    Admin,
    MinimumProtect,
    Owned,
    Running,
    Files,
    Cpu,
    Memory,
    Bandwidth,
    LastLog,
    LastUpdated,
}

impl Field {
    /// All columns in table order
    pub const ALL: [Self; 14] = [
        Self::IpAddress,
        Self::Name,
        Self::Type,
        Self::Page,
        Self::Admin,
        Self::MinimumProtect,
        Self::Owned,
        Self::Running,
        Self::Files,
        Self::Cpu,
        Self::Memory,
        Self::Bandwidth,
        Self::LastLog,
        Self::LastUpdated,
    ];

    pub const fn column(self) -> &'static str {
        match self {
            Self::IpAddress => "ipAddress",
            Self::Name => "name",
            Self::Type => "type",
            Self::Page => "page",
            Self::Admin => "admin",
            Self::MinimumProtect => "minimum_protect",
            Self::Owned => "owned",
            Self::Running => "running",
            Self::Files => "files",
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Bandwidth => "bandwidth",
            Self::LastLog => "lastlog",
            Self::LastUpdated => "lastupdated",
        }
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Page => FieldKind::Integer,
            Self::Admin | Self::Owned => FieldKind::Boolean,
            Self::Type => FieldKind::Category,
            _ => FieldKind::Text,
        }
    }

    pub const fn ownership(self) -> Ownership {
        match self {
            Self::IpAddress => Ownership::Key,
            Self::Name | Self::Type | Self::Page | Self::Admin | Self::Owned => Ownership::Sync,
            _ => Ownership::Caller,
        }
    }

    /// Parse a list of caller-supplied names, rejecting the whole list on the
    /// first name outside the schema
    pub fn parse_all<S: AsRef<str>>(names: &[S]) -> Result<Vec<Self>, SyncError> {
        names.iter().map(|name| name.as_ref().parse()).collect()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Field {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.column() == s)
            .ok_or_else(|| SyncError::InvalidField(s.to_string()))
    }
}

/// A typed column value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
}

impl FieldValue {
    /// Convert caller text into the column's storage type
    pub fn parse_for(field: Field, raw: &str) -> Result<Self, SyncError> {
        let invalid = || SyncError::InvalidValue {
            field: field.column(),
            value: raw.to_string(),
        };

        match field.kind() {
            FieldKind::Text => Ok(Self::Text(raw.to_string())),
            FieldKind::Integer => raw.trim().parse().map(Self::Integer).map_err(|_| invalid()),
            FieldKind::Boolean => parse_flag(raw).map(Self::Boolean).ok_or_else(invalid),
            FieldKind::Category => raw
                .parse::<ServerCategory>()
                .map(|category| Self::Text(category.label().to_string()))
                .map_err(|_| invalid()),
        }
    }
}

/// Boolean spellings accepted from callers and from older stores
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

/// One `(field, value)` pair as emitted to JSON consumers. A list of these
/// keeps request order and repeated names, which a JSON object would not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldEntry {
    pub field: &'static str,
    pub value: FieldValue,
}

impl From<(Field, FieldValue)> for FieldEntry {
    fn from((field, value): (Field, FieldValue)) -> Self {
        Self {
            field: field.column(),
            value,
        }
    }
}
