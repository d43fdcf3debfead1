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

//! Response factory. Modules never construct TaskResponse directly; they
//! answer through these constructors so the status transitions stay legal
//! with respect to the request that prompted them.

use crate::client::gateway::ApiError;
use crate::tasks::fields::Field;
use crate::tasks::request::{TaskRequest, TaskRequestType};
use crate::tasks::response::{TaskResponse, TaskStatus};
use serde_json::Value;
use std::sync::Arc;

pub struct Response {}

impl Response {
    pub fn new() -> Self {
        Response {}
    }

    fn make(&self, status: TaskStatus, changes: Vec<Field>, msg: Option<String>, details: Option<Value>) -> Arc<TaskResponse> {
        Arc::new(TaskResponse {
            status,
            changes,
            msg,
            details: Arc::new(details),
        })
    }

    // answers to Query (or Validate, which can also short-circuit to "fine")

    pub fn is_matched(&self, request: &Arc<TaskRequest>) -> Arc<TaskResponse> {
        assert!(request.request_type == TaskRequestType::Query || request.request_type == TaskRequestType::Validate,
            "is_matched is only an answer to query");
        self.make(TaskStatus::IsMatched, Vec::new(), None, None)
    }

    pub fn is_matched_with_details(&self, request: &Arc<TaskRequest>, details: Value) -> Arc<TaskResponse> {
        assert!(request.request_type == TaskRequestType::Query, "is_matched is only an answer to query");
        self.make(TaskStatus::IsMatched, Vec::new(), None, Some(details))
    }

    pub fn needs_creation(&self, request: &Arc<TaskRequest>) -> Arc<TaskResponse> {
        assert_eq!(request.request_type, TaskRequestType::Query, "needs_creation is only an answer to query");
        self.make(TaskStatus::NeedsCreation, Vec::new(), None, None)
    }

    pub fn needs_removal(&self, request: &Arc<TaskRequest>) -> Arc<TaskResponse> {
        assert_eq!(request.request_type, TaskRequestType::Query, "needs_removal is only an answer to query");
        self.make(TaskStatus::NeedsRemoval, Vec::new(), None, None)
    }

    pub fn needs_modification(&self, request: &Arc<TaskRequest>, changes: &Vec<Field>) -> Arc<TaskResponse> {
        assert_eq!(request.request_type, TaskRequestType::Query, "needs_modification is only an answer to query");
        assert!(!changes.is_empty(), "needs_modification requires at least one changed field");
        self.make(TaskStatus::NeedsModification, changes.clone(), None, None)
    }

    pub fn needs_execution(&self, request: &Arc<TaskRequest>) -> Arc<TaskResponse> {
        assert_eq!(request.request_type, TaskRequestType::Query, "needs_execution is only an answer to query");
        self.make(TaskStatus::NeedsExecution, Vec::new(), None, None)
    }

    pub fn needs_passive(&self, request: &Arc<TaskRequest>) -> Arc<TaskResponse> {
        assert_eq!(request.request_type, TaskRequestType::Query, "needs_passive is only an answer to query");
        self.make(TaskStatus::NeedsPassive, Vec::new(), None, None)
    }

    // answers to the mutating requests

    pub fn is_created(&self, request: &Arc<TaskRequest>) -> Arc<TaskResponse> {
        assert_eq!(request.request_type, TaskRequestType::Create, "is_created is only an answer to create");
        self.make(TaskStatus::IsCreated, Vec::new(), None, None)
    }

    pub fn is_created_with_details(&self, request: &Arc<TaskRequest>, details: Value) -> Arc<TaskResponse> {
        assert_eq!(request.request_type, TaskRequestType::Create, "is_created is only an answer to create");
        self.make(TaskStatus::IsCreated, Vec::new(), None, Some(details))
    }

    pub fn is_removed(&self, request: &Arc<TaskRequest>) -> Arc<TaskResponse> {
        assert_eq!(request.request_type, TaskRequestType::Remove, "is_removed is only an answer to remove");
        self.make(TaskStatus::IsRemoved, Vec::new(), None, None)
    }

    pub fn is_modified(&self, request: &Arc<TaskRequest>, changes: Vec<Field>) -> Arc<TaskResponse> {
        assert_eq!(request.request_type, TaskRequestType::Modify, "is_modified is only an answer to modify");
        self.make(TaskStatus::IsModified, changes, None, None)
    }

    pub fn is_modified_with_details(&self, request: &Arc<TaskRequest>, changes: Vec<Field>, details: Value) -> Arc<TaskResponse> {
        assert_eq!(request.request_type, TaskRequestType::Modify, "is_modified is only an answer to modify");
        self.make(TaskStatus::IsModified, changes, None, Some(details))
    }

    pub fn is_executed(&self, request: &Arc<TaskRequest>) -> Arc<TaskResponse> {
        assert_eq!(request.request_type, TaskRequestType::Execute, "is_executed is only an answer to execute");
        self.make(TaskStatus::IsExecuted, Vec::new(), None, None)
    }

    pub fn is_executed_with_details(&self, request: &Arc<TaskRequest>, details: Value) -> Arc<TaskResponse> {
        assert_eq!(request.request_type, TaskRequestType::Execute, "is_executed is only an answer to execute");
        self.make(TaskStatus::IsExecuted, Vec::new(), None, Some(details))
    }

    pub fn is_passive(&self, request: &Arc<TaskRequest>) -> Arc<TaskResponse> {
        assert!(request.request_type == TaskRequestType::Passive || request.request_type == TaskRequestType::Query,
            "is_passive is only an answer to passive or query");
        self.make(TaskStatus::IsPassive, Vec::new(), None, None)
    }

    pub fn is_passive_with_details(&self, request: &Arc<TaskRequest>, details: Value) -> Arc<TaskResponse> {
        assert_eq!(request.request_type, TaskRequestType::Passive, "is_passive is only an answer to passive");
        self.make(TaskStatus::IsPassive, Vec::new(), None, Some(details))
    }

    pub fn is_skipped(&self, _request: &Arc<TaskRequest>) -> Arc<TaskResponse> {
        self.make(TaskStatus::IsSkipped, Vec::new(), None, None)
    }

    // failures can answer anything

    pub fn is_failed(&self, _request: &Arc<TaskRequest>, msg: &str) -> Arc<TaskResponse> {
        self.make(TaskStatus::Failed, Vec::new(), Some(msg.to_string()), None)
    }

    /// Failure sourced from an API error, prefixed with what we were doing.
    pub fn api_failed(&self, request: &Arc<TaskRequest>, context: &str, error: &ApiError) -> Arc<TaskResponse> {
        self.is_failed(request, &format!("{}: {}", context, error))
    }

    pub fn not_supported(&self, request: &Arc<TaskRequest>) -> Arc<TaskResponse> {
        self.is_failed(request, "not supported with this request type")
    }
}
