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

pub mod diff;
pub mod fields;
pub mod logic;
pub mod refs;
pub mod request;
pub mod response;

pub use crate::tasks::diff::{CapUnit, Desired, Patch, PatchBuilder};
pub use crate::tasks::fields::Field;
pub use crate::tasks::logic::{PreLogicInput, PreLogicEvaluated, PostLogicInput, PostLogicEvaluated};
pub use crate::tasks::refs::ResourceRef;
pub use crate::tasks::request::{TaskRequest, TaskRequestType};
pub use crate::tasks::response::{TaskResponse, TaskStatus};

use crate::handle::handle::TaskHandle;
use std::sync::Arc;

/// Whether evaluate() should render `{{ var }}` expressions. Off is used for
/// syntax-only passes where variables may not be bound yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateMode {
    Off,
    On,
}

/// The desired lifecycle state shared by every resource module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesiredState {
    Present,
    Absent,
}

impl DesiredState {
    pub fn parse(value: &Option<String>) -> Result<DesiredState, String> {
        match value.as_deref() {
            None | Some("present") => Ok(DesiredState::Present),
            Some("absent") => Ok(DesiredState::Absent),
            Some(other) => Err(format!("invalid state '{}', expecting 'present' or 'absent'", other)),
        }
    }
}

pub struct EvaluatedTask {
    pub action: Arc<dyn IsAction>,
    pub with: Arc<Option<PreLogicEvaluated>>,
    pub and: Arc<Option<PostLogicEvaluated>>,
}

// the action is a trait object, so the derive is unavailable
impl std::fmt::Debug for EvaluatedTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluatedTask")
            .field("with", &self.with)
            .field("and", &self.and)
            .finish_non_exhaustive()
    }
}

pub trait IsTask: Send + Sync {
    fn get_module(&self) -> String;
    fn get_name(&self) -> Option<String>;
    fn get_with(&self) -> Option<PreLogicInput>;
    fn evaluate(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, tm: TemplateMode)
        -> Result<EvaluatedTask, Arc<TaskResponse>>;
}

pub trait IsAction: Send + Sync {
    fn dispatch(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>)
        -> Result<Arc<TaskResponse>, Arc<TaskResponse>>;
}
