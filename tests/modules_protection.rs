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

mod common;

use common::*;
use powerjet::modules::protection::replication_session::ReplicationSessionTask;
use powerjet::tasks::{IsTask, TaskRequest, TaskStatus, TemplateMode};

fn session_params() -> ReplicationSessionTask {
    ReplicationSessionTask {
        name: None,
        session_id: None,
        volume: None,
        volume_group: None,
        filesystem: None,
        nas_server: None,
        session_state: None,
        with: None,
        and: None,
    }
}

#[test]
fn test_paused_session_resumes() {
    let api = MockArray::new();
    api.sessions.write().unwrap().push(session("ses-1", "paused", "vol-1"));
    let handle = test_handle(&api);
    let task = ReplicationSessionTask {
        session_id: Some(String::from("ses-1")),
        session_state: Some(String::from("synchronizing")),
        ..session_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::NeedsExecution);

    let execute = TaskRequest::execute();
    let response = evaluated.action.dispatch(&handle, &execute).expect("execute");
    assert_eq!(response.status, TaskStatus::IsExecuted);
    assert!(api.called("resume_replication_session ses-1"));
}

#[test]
fn test_synchronizing_session_is_matched() {
    let api = MockArray::new();
    api.sessions.write().unwrap().push(session("ses-1", "synchronizing", "vol-1"));
    let handle = test_handle(&api);
    let task = ReplicationSessionTask {
        session_id: Some(String::from("ses-1")),
        session_state: Some(String::from("synchronizing")),
        ..session_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::IsMatched);
    assert_eq!(api.call_count(), 0);
}

#[test]
fn test_session_found_through_its_volume() {
    let api = MockArray::new();
    api.volumes.write().unwrap().push(volume("vol-1", "data1", 1_073_741_824));
    api.sessions.write().unwrap().push(session("ses-1", "ok", "vol-1"));
    let handle = test_handle(&api);
    let task = ReplicationSessionTask {
        volume: Some(String::from("data1")),
        session_state: Some(String::from("paused")),
        ..session_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::NeedsExecution);

    let execute = TaskRequest::execute();
    evaluated.action.dispatch(&handle, &execute).expect("execute");
    assert!(api.called("pause_replication_session ses-1"));
}

#[test]
fn test_session_found_through_its_filesystem() {
    let api = MockArray::new();
    api.nas_servers.write().unwrap().push(nas_server("nas-1", "nas1"));
    api.filesystems.write().unwrap().push(filesystem("fs-1", "projects", "nas-1", 1_073_741_824));
    api.sessions.write().unwrap().push(session("ses-2", "ok", "fs-1"));
    let handle = test_handle(&api);
    let task = ReplicationSessionTask {
        filesystem: Some(String::from("projects")),
        nas_server: Some(String::from("nas1")),
        session_state: Some(String::from("paused")),
        ..session_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::NeedsExecution);

    let execute = TaskRequest::execute();
    evaluated.action.dispatch(&handle, &execute).expect("execute");
    assert!(api.called("pause_replication_session ses-2"));
}

#[test]
fn test_session_filesystem_by_name_requires_nas_server() {
    let api = MockArray::new();
    let handle = test_handle(&api);
    let task = ReplicationSessionTask {
        filesystem: Some(String::from("projects")),
        session_state: Some(String::from("paused")),
        ..session_params()
    };

    let query = TaskRequest::query();
    let failure = task.evaluate(&handle, &query, TemplateMode::On).unwrap_err();
    assert!(failure.msg.as_deref().unwrap()
        .contains("nas_server is required when addressing a filesystem by name"));
}

#[test]
fn test_failed_over_session_cannot_be_paused() {
    let api = MockArray::new();
    api.sessions.write().unwrap().push(session("ses-1", "failed_over", "vol-1"));
    let handle = test_handle(&api);
    let task = ReplicationSessionTask {
        session_id: Some(String::from("ses-1")),
        session_state: Some(String::from("paused")),
        ..session_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let failure = evaluated.action.dispatch(&handle, &query).unwrap_err();
    assert!(failure.msg.as_deref().unwrap().contains("cannot be paused"));
}

#[test]
fn test_session_selectors_are_mutually_exclusive() {
    let api = MockArray::new();
    let handle = test_handle(&api);
    let task = ReplicationSessionTask {
        session_id: Some(String::from("ses-1")),
        volume: Some(String::from("data1")),
        session_state: Some(String::from("paused")),
        ..session_params()
    };

    let query = TaskRequest::query();
    let failure = task.evaluate(&handle, &query, TemplateMode::On).unwrap_err();
    assert!(failure.msg.as_deref().unwrap().contains("mutually exclusive"));
}

#[test]
fn test_session_state_is_required() {
    let api = MockArray::new();
    let handle = test_handle(&api);
    let task = ReplicationSessionTask {
        session_id: Some(String::from("ses-1")),
        ..session_params()
    };

    let query = TaskRequest::query();
    let failure = task.evaluate(&handle, &query, TemplateMode::On).unwrap_err();
    assert!(failure.msg.as_deref().unwrap().contains("session_state is required"));
}

#[test]
fn test_failover_from_synchronizing() {
    let api = MockArray::new();
    api.sessions.write().unwrap().push(session("ses-1", "synchronizing", "vol-1"));
    let handle = test_handle(&api);
    let task = ReplicationSessionTask {
        session_id: Some(String::from("ses-1")),
        session_state: Some(String::from("failed_over")),
        ..session_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::NeedsExecution);

    let execute = TaskRequest::execute();
    evaluated.action.dispatch(&handle, &execute).expect("execute");
    assert!(api.called("failover_replication_session ses-1"));
}
