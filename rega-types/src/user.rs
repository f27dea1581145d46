//! User accounts, roles and role assignments.

use crate::{Range, TypesError, UserId};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// What a user is allowed to do in the field app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// Manages users, roles and number blocks.
    Administrador,
    /// Read-only account.
    Usuario,
    /// Field agent who registers persons inside an assigned number block.
    Registrador,
    /// No role granted yet.
    #[default]
    Unassigned,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Administrador => "Administrador",
            Self::Usuario => "Usuario",
            Self::Registrador => "Registrador",
            Self::Unassigned => "No asignado",
        }
    }

    /// Lenient decoding used for stored documents: anything unrecognised is
    /// treated as unassigned.
    fn from_wire(s: Option<&str>) -> Self {
        s.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Administrador" | "administrador" => Ok(Self::Administrador),
            "Usuario" | "usuario" => Ok(Self::Usuario),
            "Registrador" | "registrador" => Ok(Self::Registrador),
            "No asignado" | "unassigned" | "" => Ok(Self::Unassigned),
            other => Err(TypesError::UnknownRole(other.to_string())),
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::from_wire(raw.as_deref()))
    }
}

/// A user account as stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub number_init: Option<i64>,
    #[serde(default)]
    pub number_end: Option<i64>,
    #[serde(default)]
    pub current_number: Option<i64>,
}

impl User {
    /// Creates an account with no role and no range.
    #[must_use]
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            lastname: String::new(),
            email: String::new(),
            role: Role::Unassigned,
            number_init: None,
            number_end: None,
            current_number: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>, lastname: impl Into<String>) -> Self {
        self.name = name.into();
        self.lastname = lastname.into();
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    #[must_use]
    pub fn is_registrador(&self) -> bool {
        self.role == Role::Registrador
    }

    /// The block this user may stamp numbers from. Only Registradores with
    /// both bounds set (and `init <= end`) have one.
    #[must_use]
    pub fn assigned_range(&self) -> Option<Range> {
        if !self.is_registrador() {
            return None;
        }
        match (self.number_init, self.number_end) {
            (Some(start), Some(end)) => Range::new(start, end).ok(),
            _ => None,
        }
    }

    /// Applies a role assignment. Role and all three range fields change
    /// together.
    pub fn apply(&mut self, assignment: &RoleAssignment) {
        self.role = assignment.role;
        match assignment.range {
            Some(range) => {
                self.number_init = Some(range.start());
                self.number_end = Some(range.end());
                self.current_number = Some(range.start());
            }
            None => {
                self.number_init = None;
                self.number_end = None;
                self.current_number = None;
            }
        }
    }
}

/// A role change together with the range fields that go with it.
///
/// This is the unit written to a user record: a single patch carrying
/// `role`, `numberInit`, `numberEnd` and `currentNumber`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleAssignment {
    pub role: Role,
    pub range: Option<Range>,
}

impl RoleAssignment {
    /// Grants the Registrador role with `range` as its block.
    #[must_use]
    pub const fn registrador(range: Range) -> Self {
        Self {
            role: Role::Registrador,
            range: Some(range),
        }
    }

    /// Sets `role` and clears every range field. Used both for moving a user
    /// away from Registrador and for granting Registrador without a block.
    #[must_use]
    pub const fn declassify(role: Role) -> Self {
        Self { role, range: None }
    }

    /// The field patch to send to the document store.
    #[must_use]
    pub fn to_patch(&self) -> Map<String, Value> {
        let (init, end, current) = match self.range {
            Some(r) => (
                Value::from(r.start()),
                Value::from(r.end()),
                Value::from(r.start()),
            ),
            None => (Value::Null, Value::Null, Value::Null),
        };
        let mut patch = Map::new();
        patch.insert("role".into(), Value::from(self.role.as_str()));
        patch.insert("numberInit".into(), init);
        patch.insert("numberEnd".into(), end);
        patch.insert("currentNumber".into(), current);
        patch
    }
}
