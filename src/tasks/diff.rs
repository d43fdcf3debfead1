// Powerjet
// Copyright (C) Riff Labs Limited <team@riff.cc>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// long with this program.  If not, see <http://www.gnu.org/licenses/>.

//! The idempotent-modify decision shared by every resource module.
//!
//! Given a resource's current attribute values and the values a playbook
//! asks for, build the minimal PATCH body: omitted parameters are skipped,
//! unchanged values are dropped, and an empty string on a clearable field
//! means "detach whatever is attached". Size fields only ever grow.

use crate::tasks::fields::Field;
use indexmap::IndexMap;
use serde_json::Value;

/// A playbook parameter interpreted for diffing. `Unchanged` is an omitted
/// parameter (no user intent), `Clear` is the empty string on fields where
/// clearing an association is meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Desired<T> {
    Unchanged,
    Set(T),
    Clear,
}

impl Desired<String> {
    pub fn from_param(param: &Option<String>) -> Desired<String> {
        match param {
            None => Desired::Unchanged,
            Some(s) if s.is_empty() => Desired::Clear,
            Some(s) => Desired::Set(s.clone()),
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Desired::Set(_))
    }
}

impl<T> Desired<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Desired::Unchanged)
    }
}

/// The minimal set of fields to submit to a modify call, plus markers for
/// reporting. The body preserves insertion order so payloads are stable.
#[derive(Debug, Default)]
pub struct Patch {
    pub changes: Vec<Field>,
    pub body: IndexMap<String, Value>,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct PatchBuilder {
    patch: Patch,
}

impl PatchBuilder {
    pub fn new() -> Self {
        Self { patch: Patch::default() }
    }

    fn record(&mut self, field: Field, key: &str, value: Value) {
        self.patch.changes.push(field);
        self.patch.body.insert(key.to_string(), value);
    }

    /// Plain string field: submit only when the desired value differs.
    pub fn string(&mut self, field: Field, key: &str, current: Option<&str>, desired: &Option<String>) {
        if let Some(want) = desired {
            if current != Some(want.as_str()) {
                self.record(field, key, Value::String(want.clone()));
            }
        }
    }

    /// Association field (policy ids and the like) where the empty string in
    /// the playbook means "detach". Clearing an already-clear field is a no-op.
    pub fn clearable(&mut self, field: Field, key: &str, current: Option<&str>, desired: &Desired<String>) {
        match desired {
            Desired::Unchanged => {},
            Desired::Set(want) => {
                if current != Some(want.as_str()) {
                    self.record(field, key, Value::String(want.clone()));
                }
            },
            Desired::Clear => {
                if current.is_some() {
                    self.record(field, key, Value::Null);
                }
            },
        }
    }

    pub fn boolean(&mut self, field: Field, key: &str, current: Option<bool>, desired: &Option<bool>) {
        if let Some(want) = desired {
            if current != Some(*want) {
                self.record(field, key, Value::Bool(*want));
            }
        }
    }

    pub fn integer(&mut self, field: Field, key: &str, current: Option<u64>, desired: &Option<u64>) {
        if let Some(want) = desired {
            if current != Some(*want) {
                self.record(field, key, Value::Number((*want).into()));
            }
        }
    }

    /// Capacity field under the monotonic constraint: shrinking is rejected
    /// and the exact current size is dropped from the payload, since the
    /// array errors on no-op size submissions.
    pub fn grow_only(&mut self, field: Field, key: &str, current: u64, desired: &Option<u64>) -> Result<(), String> {
        if let Some(want) = desired {
            if *want < current {
                return Err(format!(
                    "requested size {} is smaller than the current size {}; shrinking is not supported",
                    want, current));
            }
            if *want > current {
                self.record(field, key, Value::Number((*want).into()));
            }
        }
        Ok(())
    }

    /// Escape hatch for an unconditional body entry (write-only fields such
    /// as passwords, where the current value cannot be read back).
    pub fn always(&mut self, field: Field, key: &str, value: Value) {
        self.record(field, key, value);
    }

    pub fn is_empty(&self) -> bool {
        self.patch.is_empty()
    }

    pub fn build(self) -> Patch {
        self.patch
    }
}

/// Capacity units accepted by size parameters. One GB is 1073741824 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapUnit {
    Mb,
    Gb,
    Tb,
}

impl CapUnit {
    pub fn parse(s: &str) -> Option<CapUnit> {
        match s.to_uppercase().as_str() {
            "MB" => Some(CapUnit::Mb),
            "GB" => Some(CapUnit::Gb),
            "TB" => Some(CapUnit::Tb),
            _ => None,
        }
    }

    pub fn bytes(&self, count: u64) -> u64 {
        match self {
            CapUnit::Mb => count * 1024 * 1024,
            CapUnit::Gb => count * 1024 * 1024 * 1024,
            CapUnit::Tb => count * 1024 * 1024 * 1024 * 1024,
        }
    }
}
