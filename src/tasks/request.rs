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

use crate::tasks::fields::Field;
use std::sync::Arc;

/// The lifecycle phases the traversal engine can request from a module.
/// Query decides what (if anything) needs to happen; the mutating phases
/// perform it. Passive is for read-only gather modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRequestType {
    Validate,
    Query,
    Create,
    Remove,
    Modify,
    Execute,
    Passive,
}

#[derive(Debug)]
pub struct TaskRequest {
    pub request_type: TaskRequestType,
    pub changes: Vec<Field>,
}

impl TaskRequest {
    pub fn validate() -> Arc<Self> {
        Arc::new(Self { request_type: TaskRequestType::Validate, changes: Vec::new() })
    }

    pub fn query() -> Arc<Self> {
        Arc::new(Self { request_type: TaskRequestType::Query, changes: Vec::new() })
    }

    pub fn create() -> Arc<Self> {
        Arc::new(Self { request_type: TaskRequestType::Create, changes: Vec::new() })
    }

    pub fn remove() -> Arc<Self> {
        Arc::new(Self { request_type: TaskRequestType::Remove, changes: Vec::new() })
    }

    pub fn modify(changes: Vec<Field>) -> Arc<Self> {
        Arc::new(Self { request_type: TaskRequestType::Modify, changes })
    }

    pub fn execute() -> Arc<Self> {
        Arc::new(Self { request_type: TaskRequestType::Execute, changes: Vec::new() })
    }

    pub fn passive() -> Arc<Self> {
        Arc::new(Self { request_type: TaskRequestType::Passive, changes: Vec::new() })
    }
}
