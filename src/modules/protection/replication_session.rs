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

//! Replication session state transitions. The session itself is created by
//! attaching a replication-enabled protection policy to a resource; this
//! module only drives an existing session between states, refusing
//! transitions the array would reject.

use crate::client::{expect_unique, optional};
use crate::client::types::ReplicationSessionDetail;
use crate::handle::handle::TaskHandle;
use crate::modules::file::resolve_nas_server;
use crate::tasks::*;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const MODULE: &str = "replication_session";

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct ReplicationSessionTask {
    pub name: Option<String>,
    pub session_id: Option<String>,
    pub volume: Option<String>,
    pub volume_group: Option<String>,
    pub filesystem: Option<String>,
    pub nas_server: Option<String>,
    pub session_state: Option<String>,
    pub with: Option<PreLogicInput>,
    pub and: Option<PostLogicInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Synchronizing,
    Paused,
    FailedOver,
}

impl SessionState {
    fn parse(s: &str) -> Option<SessionState> {
        match s {
            "synchronizing" => Some(SessionState::Synchronizing),
            "paused" => Some(SessionState::Paused),
            "failed_over" => Some(SessionState::FailedOver),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOp {
    Sync,
    Pause,
    Resume,
    Failover,
    Reprotect,
}

/// Decide which call (if any) moves a session from its current state to the
/// requested one. Err means the combination is not reachable and the task
/// must fail rather than guess.
pub fn plan_transition(current: &str, desired: SessionState) -> Result<Option<SessionOp>, String> {
    match desired {
        SessionState::Synchronizing => match current {
            "ok" => Ok(Some(SessionOp::Sync)),
            "synchronizing" | "resuming" | "initializing" => Ok(None),
            "paused" => Ok(Some(SessionOp::Resume)),
            "failed_over" => Ok(Some(SessionOp::Reprotect)),
            "failing_over" => Err(String::from("session is failing over; it cannot return to synchronizing")),
            other => Err(format!("cannot synchronize a session in state '{}'", other)),
        },
        SessionState::Paused => match current {
            "ok" | "synchronizing" => Ok(Some(SessionOp::Pause)),
            "paused" => Ok(None),
            "failed_over" | "failing_over" => Err(String::from("a failed-over session cannot be paused")),
            "system_paused" => Err(String::from("session is paused by the system and cannot be managed here")),
            other => Err(format!("cannot pause a session in state '{}'", other)),
        },
        SessionState::FailedOver => match current {
            "ok" | "synchronizing" | "paused" => Ok(Some(SessionOp::Failover)),
            "failed_over" => Ok(None),
            "failing_over" => Ok(None),
            other => Err(format!("cannot fail over a session in state '{}'", other)),
        },
    }
}

struct ReplicationSessionAction {
    session_id: Option<String>,
    volume: Option<String>,
    volume_group: Option<String>,
    filesystem: Option<String>,
    nas_server: Option<String>,
    desired: SessionState,
}

impl IsTask for ReplicationSessionTask {
    fn get_module(&self) -> String { String::from(MODULE) }
    fn get_name(&self) -> Option<String> { self.name.clone() }
    fn get_with(&self) -> Option<PreLogicInput> { self.with.clone() }

    fn evaluate(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, tm: TemplateMode) -> Result<EvaluatedTask, Arc<TaskResponse>> {
        let session_id = handle.template.string_option(request, tm, "session_id", &self.session_id)?;
        let volume = handle.template.string_option(request, tm, "volume", &self.volume)?;
        let volume_group = handle.template.string_option(request, tm, "volume_group", &self.volume_group)?;
        let filesystem = handle.template.string_option(request, tm, "filesystem", &self.filesystem)?;
        let nas_server = handle.template.string_option(request, tm, "nas_server", &self.nas_server)?;
        let provided = [session_id.is_some(), volume.is_some(), volume_group.is_some(), filesystem.is_some()]
            .iter().filter(|p| **p).count();
        if provided > 1 {
            return Err(handle.response.is_failed(request, "session_id, volume, volume_group and filesystem are mutually exclusive"));
        }
        if tm == TemplateMode::On && provided == 0 {
            return Err(handle.response.is_failed(request, "one of session_id, volume, volume_group or filesystem is required"));
        }
        if tm == TemplateMode::On && nas_server.is_none() {
            if let Some(filesystem) = &filesystem {
                if matches!(ResourceRef::parse(filesystem), ResourceRef::Name(_)) {
                    return Err(handle.response.is_failed(request, "nas_server is required when addressing a filesystem by name"));
                }
            }
        }

        let desired = match handle.template.string_option(request, tm, "session_state", &self.session_state)? {
            Some(state) => SessionState::parse(&state)
                .ok_or_else(|| handle.response.is_failed(request,
                    &format!("invalid session_state '{}', expecting 'synchronizing', 'paused' or 'failed_over'", state)))?,
            None => {
                if tm == TemplateMode::On {
                    return Err(handle.response.is_failed(request, "session_state is required"));
                }
                SessionState::Synchronizing
            },
        };

        Ok(EvaluatedTask {
            action: Arc::new(ReplicationSessionAction { session_id, volume, volume_group, filesystem, nas_server, desired }),
            with: Arc::new(PreLogicInput::template(handle, request, tm, &self.with)?),
            and: Arc::new(PostLogicInput::template(handle, request, tm, &self.and)?),
        })
    }
}

impl IsAction for ReplicationSessionAction {
    fn dispatch(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Arc<TaskResponse>, Arc<TaskResponse>> {
        match request.request_type {
            TaskRequestType::Query => {
                let session = self.find_session(handle, request)?;
                let current = session.state.as_deref().unwrap_or("unknown");
                match plan_transition(current, self.desired) {
                    Err(msg) => Err(handle.response.is_failed(request, &msg)),
                    Ok(None) => Ok(handle.response.is_matched_with_details(request, details(&session))),
                    Ok(Some(_)) => Ok(handle.response.needs_execution(request)),
                }
            },

            TaskRequestType::Execute => {
                let session = self.find_session(handle, request)?;
                let current = session.state.as_deref().unwrap_or("unknown");
                let op = plan_transition(current, self.desired)
                    .map_err(|msg| handle.response.is_failed(request, &msg))?;
                if let Some(op) = op {
                    self.apply(handle, request, &session.id, op)?;
                }
                let updated = handle.api.protection.get_replication_session(&session.id)
                    .map_err(|e| handle.response.api_failed(request, "reading back replication session", &e))?;
                Ok(handle.response.is_executed_with_details(request, details(&updated)))
            },

            _ => Err(handle.response.not_supported(request)),
        }
    }
}

impl ReplicationSessionAction {
    fn find_session(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<ReplicationSessionDetail, Arc<TaskResponse>> {
        if let Some(id) = &self.session_id {
            return optional(handle.api.protection.get_replication_session(id))
                .map_err(|e| handle.response.api_failed(request, "looking up replication session", &e))?
                .ok_or_else(|| handle.response.is_failed(request, &format!("replication session '{}' not found", id)));
        }

        let resource_id = self.resolve_resource(handle, request)?;
        let sessions = handle.api.protection.get_replication_sessions_by_resource(&resource_id)
            .map_err(|e| handle.response.api_failed(request, "looking up replication session", &e))?;
        expect_unique("replication session", &resource_id, sessions)
            .map_err(|e| handle.response.api_failed(request, "looking up replication session", &e))?
            .ok_or_else(|| handle.response.is_failed(request,
                &format!("no replication session found for resource '{}'", resource_id)))
    }

    fn resolve_resource(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<String, Arc<TaskResponse>> {
        if let Some(volume) = &self.volume {
            return match ResourceRef::parse(volume) {
                ResourceRef::Id(id) => Ok(id),
                ResourceRef::Name(name) => {
                    let matches = handle.api.provisioning.get_volumes_by_name(&name)
                        .map_err(|e| handle.response.api_failed(request, "looking up volume", &e))?;
                    expect_unique("volume", &name, matches)
                        .map_err(|e| handle.response.api_failed(request, "looking up volume", &e))?
                        .map(|v| v.id)
                        .ok_or_else(|| handle.response.is_failed(request, &format!("volume '{}' not found", name)))
                },
            };
        }
        if let Some(group) = &self.volume_group {
            return match ResourceRef::parse(group) {
                ResourceRef::Id(id) => Ok(id),
                ResourceRef::Name(name) => {
                    let matches = handle.api.provisioning.get_volume_groups_by_name(&name)
                        .map_err(|e| handle.response.api_failed(request, "looking up volume group", &e))?;
                    expect_unique("volume group", &name, matches)
                        .map_err(|e| handle.response.api_failed(request, "looking up volume group", &e))?
                        .map(|g| g.id)
                        .ok_or_else(|| handle.response.is_failed(request, &format!("volume group '{}' not found", name)))
                },
            };
        }
        if let Some(filesystem) = &self.filesystem {
            return match ResourceRef::parse(filesystem) {
                ResourceRef::Id(id) => Ok(id),
                ResourceRef::Name(name) => {
                    let nas_server = self.nas_server.as_ref()
                        .ok_or_else(|| handle.response.is_failed(request, "nas_server is required when addressing a filesystem by name"))?;
                    let nas_server_id = resolve_nas_server(handle.api.provisioning.as_ref(), nas_server)
                        .map_err(|e| handle.response.api_failed(request, "looking up nas server", &e))?
                        .ok_or_else(|| handle.response.is_failed(request, &format!("nas server '{}' not found", nas_server)))?;
                    let matches = handle.api.provisioning.get_filesystems_by_name(&name, &nas_server_id)
                        .map_err(|e| handle.response.api_failed(request, "looking up filesystem", &e))?;
                    expect_unique("filesystem", &name, matches)
                        .map_err(|e| handle.response.api_failed(request, "looking up filesystem", &e))?
                        .map(|f| f.id)
                        .ok_or_else(|| handle.response.is_failed(request, &format!("filesystem '{}' not found", name)))
                },
            };
        }
        Err(handle.response.is_failed(request, "one of session_id, volume, volume_group or filesystem is required"))
    }

    fn apply(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, session_id: &str, op: SessionOp) -> Result<(), Arc<TaskResponse>> {
        let result = match op {
            SessionOp::Sync => handle.api.protection.sync_replication_session(session_id),
            SessionOp::Pause => handle.api.protection.pause_replication_session(session_id),
            SessionOp::Resume => handle.api.protection.resume_replication_session(session_id),
            SessionOp::Failover => handle.api.protection.failover_replication_session(session_id),
            SessionOp::Reprotect => handle.api.protection.reprotect_replication_session(session_id),
        };
        result.map_err(|e| handle.response.api_failed(request, "changing replication session state", &e))
    }
}

fn details(session: &ReplicationSessionDetail) -> Value {
    serde_json::to_value(session).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synchronizing_transitions() {
        assert_eq!(plan_transition("ok", SessionState::Synchronizing).unwrap(), Some(SessionOp::Sync));
        assert_eq!(plan_transition("synchronizing", SessionState::Synchronizing).unwrap(), None);
        assert_eq!(plan_transition("paused", SessionState::Synchronizing).unwrap(), Some(SessionOp::Resume));
        assert_eq!(plan_transition("failed_over", SessionState::Synchronizing).unwrap(), Some(SessionOp::Reprotect));
        assert!(plan_transition("failing_over", SessionState::Synchronizing).is_err());
    }

    #[test]
    fn test_paused_transitions() {
        assert_eq!(plan_transition("ok", SessionState::Paused).unwrap(), Some(SessionOp::Pause));
        assert_eq!(plan_transition("synchronizing", SessionState::Paused).unwrap(), Some(SessionOp::Pause));
        assert_eq!(plan_transition("paused", SessionState::Paused).unwrap(), None);
        assert!(plan_transition("failed_over", SessionState::Paused).is_err());
        assert!(plan_transition("system_paused", SessionState::Paused).is_err());
    }

    #[test]
    fn test_failover_transitions() {
        assert_eq!(plan_transition("ok", SessionState::FailedOver).unwrap(), Some(SessionOp::Failover));
        assert_eq!(plan_transition("paused", SessionState::FailedOver).unwrap(), Some(SessionOp::Failover));
        assert_eq!(plan_transition("failed_over", SessionState::FailedOver).unwrap(), None);
        assert_eq!(plan_transition("failing_over", SessionState::FailedOver).unwrap(), None);
    }

    #[test]
    fn test_unknown_state_is_an_error() {
        assert!(plan_transition("error", SessionState::Synchronizing).is_err());
        assert!(plan_transition("error", SessionState::FailedOver).is_err());
    }
}
