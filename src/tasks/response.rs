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

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    IsCreated,
    IsRemoved,
    IsModified,
    IsExecuted,
    IsPassive,
    IsMatched,
    IsSkipped,
    NeedsCreation,
    NeedsRemoval,
    NeedsModification,
    NeedsExecution,
    NeedsPassive,
    Failed,
}

/// What a module hands back for each request. `details` carries the
/// resource's current representation as returned by the array, so playbook
/// authors can register it into a variable.
#[derive(Debug)]
pub struct TaskResponse {
    pub status: TaskStatus,
    pub changes: Vec<Field>,
    pub msg: Option<String>,
    pub details: Arc<Option<serde_json::Value>>,
}

impl TaskResponse {
    pub fn is_changed(&self) -> bool {
        matches!(
            self.status,
            TaskStatus::IsCreated | TaskStatus::IsRemoved | TaskStatus::IsModified | TaskStatus::IsExecuted
        )
    }

    pub fn is_failed(&self) -> bool {
        self.status == TaskStatus::Failed
    }

    /// Query results that require a follow-up mutating request.
    pub fn needs_changes(&self) -> bool {
        matches!(
            self.status,
            TaskStatus::NeedsCreation
                | TaskStatus::NeedsRemoval
                | TaskStatus::NeedsModification
                | TaskStatus::NeedsExecution
        )
    }
}
