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

//! NFS export lifecycle. The five host access lists are edited
//! incrementally: host_state decides whether the listed hosts are merged
//! into or removed from each list, hosts not mentioned stay untouched.

use crate::client::{expect_unique, optional, Body};
use crate::client::types::NfsExportDetail;
use crate::handle::handle::TaskHandle;
use crate::modules::file::resolve_nas_server;
use crate::tasks::*;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const MODULE: &str = "nfs_export";

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct NfsExportTask {
    pub name: Option<String>,
    pub export_name: Option<String>,
    pub export_id: Option<String>,
    pub filesystem: Option<String>,
    pub nas_server: Option<String>,
    pub path: Option<String>,
    pub description: Option<String>,
    pub default_access: Option<String>,
    pub anonymous_uid: Option<String>,
    pub anonymous_gid: Option<String>,
    pub is_no_suid: Option<String>,
    pub no_access_hosts: Option<Vec<String>>,
    pub read_only_hosts: Option<Vec<String>>,
    pub read_only_root_hosts: Option<Vec<String>>,
    pub read_write_hosts: Option<Vec<String>>,
    pub read_write_root_hosts: Option<Vec<String>>,
    pub host_state: Option<String>,
    pub state: Option<String>,
    pub with: Option<PreLogicInput>,
    pub and: Option<PostLogicInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostState {
    PresentInExport,
    AbsentInExport,
}

struct NfsExportAction {
    export: Option<ResourceRef>,
    filesystem: Option<String>,
    nas_server: Option<String>,
    path: Option<String>,
    description: Desired<String>,
    default_access: Option<String>,
    anonymous_uid: Option<i64>,
    anonymous_gid: Option<i64>,
    no_suid: Option<bool>,
    no_access_hosts: Option<Vec<String>>,
    read_only_hosts: Option<Vec<String>>,
    read_only_root_hosts: Option<Vec<String>>,
    read_write_hosts: Option<Vec<String>>,
    read_write_root_hosts: Option<Vec<String>>,
    host_state: Option<HostState>,
    state: DesiredState,
}

/// Merge or subtract hosts from an access list. None means the list is
/// already in the requested shape.
fn edit_hosts(current: &[String], requested: &[String], host_state: HostState) -> Option<Vec<String>> {
    match host_state {
        HostState::PresentInExport => {
            let missing: Vec<String> = requested.iter()
                .filter(|h| !current.contains(h))
                .cloned()
                .collect();
            if missing.is_empty() {
                None
            } else {
                let mut merged = current.to_vec();
                merged.extend(missing);
                Some(merged)
            }
        },
        HostState::AbsentInExport => {
            if requested.iter().any(|h| current.contains(h)) {
                Some(current.iter().filter(|h| !requested.contains(h)).cloned().collect())
            } else {
                None
            }
        },
    }
}

impl IsTask for NfsExportTask {
    fn get_module(&self) -> String { String::from(MODULE) }
    fn get_name(&self) -> Option<String> { self.name.clone() }
    fn get_with(&self) -> Option<PreLogicInput> { self.with.clone() }

    fn evaluate(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, tm: TemplateMode) -> Result<EvaluatedTask, Arc<TaskResponse>> {
        let export_name = handle.template.string_option(request, tm, "export_name", &self.export_name)?;
        let export_id = handle.template.string_option(request, tm, "export_id", &self.export_id)?;
        let export = ResourceRef::from_params(&export_id, &export_name);
        if tm == TemplateMode::On && export.is_none() {
            return Err(handle.response.is_failed(request, "one of export_name or export_id is required"));
        }

        let render_hosts = |list: &Option<Vec<String>>, field: &str| -> Result<Option<Vec<String>>, Arc<TaskResponse>> {
            match list {
                None => Ok(None),
                Some(items) => {
                    let mut rendered = Vec::with_capacity(items.len());
                    for item in items.iter() {
                        rendered.push(handle.template.string(request, tm, field, item)?);
                    }
                    Ok(Some(rendered))
                },
            }
        };

        let no_access_hosts = render_hosts(&self.no_access_hosts, "no_access_hosts")?;
        let read_only_hosts = render_hosts(&self.read_only_hosts, "read_only_hosts")?;
        let read_only_root_hosts = render_hosts(&self.read_only_root_hosts, "read_only_root_hosts")?;
        let read_write_hosts = render_hosts(&self.read_write_hosts, "read_write_hosts")?;
        let read_write_root_hosts = render_hosts(&self.read_write_root_hosts, "read_write_root_hosts")?;
        let any_hosts = no_access_hosts.is_some() || read_only_hosts.is_some() || read_only_root_hosts.is_some()
            || read_write_hosts.is_some() || read_write_root_hosts.is_some();

        let host_state = match handle.template.string_option(request, tm, "host_state", &self.host_state)?.as_deref() {
            None => None,
            Some("present-in-export") => Some(HostState::PresentInExport),
            Some("absent-in-export") => Some(HostState::AbsentInExport),
            Some(other) => {
                return Err(handle.response.is_failed(request,
                    &format!("invalid host_state '{}', expecting 'present-in-export' or 'absent-in-export'", other)));
            },
        };
        if tm == TemplateMode::On && any_hosts != host_state.is_some() {
            return Err(handle.response.is_failed(request, "host lists and host_state must be supplied together"));
        }

        let state = DesiredState::parse(&handle.template.string_option(request, tm, "state", &self.state)?)
            .map_err(|msg| handle.response.is_failed(request, &msg))?;

        Ok(EvaluatedTask {
            action: Arc::new(NfsExportAction {
                export,
                filesystem: handle.template.string_option(request, tm, "filesystem", &self.filesystem)?,
                nas_server: handle.template.string_option(request, tm, "nas_server", &self.nas_server)?,
                path: handle.template.string_option(request, tm, "path", &self.path)?,
                description: Desired::from_param(&handle.template.string_option(request, tm, "description", &self.description)?),
                default_access: handle.template.string_option(request, tm, "default_access", &self.default_access)?,
                anonymous_uid: handle.template.integer_option(request, tm, "anonymous_uid", &self.anonymous_uid)?,
                anonymous_gid: handle.template.integer_option(request, tm, "anonymous_gid", &self.anonymous_gid)?,
                no_suid: handle.template.boolean_option(request, tm, "is_no_suid", &self.is_no_suid)?,
                no_access_hosts,
                read_only_hosts,
                read_only_root_hosts,
                read_write_hosts,
                read_write_root_hosts,
                host_state,
                state,
            }),
            with: Arc::new(PreLogicInput::template(handle, request, tm, &self.with)?),
            and: Arc::new(PostLogicInput::template(handle, request, tm, &self.and)?),
        })
    }
}

impl IsAction for NfsExportAction {
    fn dispatch(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Arc<TaskResponse>, Arc<TaskResponse>> {
        match request.request_type {
            TaskRequestType::Query => {
                let existing = self.find_export(handle, request)?;
                match (self.state, existing) {
                    (DesiredState::Absent, Some(_)) => Ok(handle.response.needs_removal(request)),
                    (DesiredState::Absent, None) => Ok(handle.response.is_matched(request)),
                    (DesiredState::Present, None) => {
                        if self.filesystem.is_none() || self.path.is_none() {
                            return Err(handle.response.is_failed(request, "filesystem and path are required to create an NFS export"));
                        }
                        Ok(handle.response.needs_creation(request))
                    },
                    (DesiredState::Present, Some(existing)) => {
                        let patch = self.build_patch(&existing);
                        if patch.is_empty() {
                            Ok(handle.response.is_matched_with_details(request, details(&existing)))
                        } else {
                            Ok(handle.response.needs_modification(request, &patch.changes))
                        }
                    },
                }
            },

            TaskRequestType::Create => {
                let id = self.create_export(handle, request)?;
                let created = handle.api.provisioning.get_nfs_export(&id)
                    .map_err(|e| handle.response.api_failed(request, "reading back created NFS export", &e))?;
                Ok(handle.response.is_created_with_details(request, details(&created)))
            },

            TaskRequestType::Remove => {
                let existing = self.find_export(handle, request)?
                    .ok_or_else(|| handle.response.is_failed(request, "NFS export disappeared before removal"))?;
                handle.api.provisioning.delete_nfs_export(&existing.id)
                    .map_err(|e| handle.response.api_failed(request, "deleting NFS export", &e))?;
                Ok(handle.response.is_removed(request))
            },

            TaskRequestType::Modify => {
                let existing = self.find_export(handle, request)?
                    .ok_or_else(|| handle.response.is_failed(request, "NFS export disappeared before modification"))?;
                let patch = self.build_patch(&existing);
                if !patch.is_empty() {
                    handle.api.provisioning.modify_nfs_export(&existing.id, &patch.body)
                        .map_err(|e| handle.response.api_failed(request, "modifying NFS export", &e))?;
                }
                let updated = handle.api.provisioning.get_nfs_export(&existing.id)
                    .map_err(|e| handle.response.api_failed(request, "reading back modified NFS export", &e))?;
                Ok(handle.response.is_modified_with_details(request, request.changes.clone(), details(&updated)))
            },

            _ => Err(handle.response.not_supported(request)),
        }
    }
}

impl NfsExportAction {
    fn find_export(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Option<NfsExportDetail>, Arc<TaskResponse>> {
        let export = self.export.as_ref()
            .ok_or_else(|| handle.response.is_failed(request, "one of export_name or export_id is required"))?;
        match export {
            ResourceRef::Id(id) => optional(handle.api.provisioning.get_nfs_export(id))
                .map_err(|e| handle.response.api_failed(request, "looking up NFS export", &e)),
            ResourceRef::Name(name) => {
                let matches = handle.api.provisioning.get_nfs_exports_by_name(name)
                    .map_err(|e| handle.response.api_failed(request, "looking up NFS export", &e))?;
                expect_unique("NFS export", name, matches)
                    .map_err(|e| handle.response.api_failed(request, "looking up NFS export", &e))
            },
        }
    }

    fn resolve_filesystem(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<String, Arc<TaskResponse>> {
        let filesystem = self.filesystem.as_ref()
            .ok_or_else(|| handle.response.is_failed(request, "filesystem is required"))?;
        match ResourceRef::parse(filesystem) {
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
        }
    }

    fn build_patch(&self, existing: &NfsExportDetail) -> Patch {
        let mut builder = PatchBuilder::new();
        let current_description = existing.description.as_deref().filter(|d| !d.is_empty());
        builder.clearable(Field::Description, "description", current_description, &self.description);
        builder.string(Field::DefaultAccess, "default_access", existing.default_access.as_deref(), &self.default_access);
        if let Some(uid) = self.anonymous_uid {
            if existing.anonymous_uid != Some(uid) {
                builder.always(Field::AnonymousAccess, "anonymous_UID", Value::Number(uid.into()));
            }
        }
        if let Some(gid) = self.anonymous_gid {
            if existing.anonymous_gid != Some(gid) {
                builder.always(Field::AnonymousAccess, "anonymous_GID", Value::Number(gid.into()));
            }
        }
        builder.boolean(Field::NoSuid, "is_no_SUID", existing.is_no_suid, &self.no_suid);

        if let Some(host_state) = self.host_state {
            let lists: [(&str, &Option<Vec<String>>, &Vec<String>); 5] = [
                ("no_access_hosts", &self.no_access_hosts, &existing.no_access_hosts),
                ("read_only_hosts", &self.read_only_hosts, &existing.read_only_hosts),
                ("read_only_root_hosts", &self.read_only_root_hosts, &existing.read_only_root_hosts),
                ("read_write_hosts", &self.read_write_hosts, &existing.read_write_hosts),
                ("read_write_root_hosts", &self.read_write_root_hosts, &existing.read_write_root_hosts),
            ];
            for (key, requested, current) in lists {
                if let Some(requested) = requested {
                    if let Some(edited) = edit_hosts(current, requested, host_state) {
                        let value = Value::Array(edited.into_iter().map(Value::String).collect());
                        builder.always(Field::Hosts, key, value);
                    }
                }
            }
        }

        builder.build()
    }

    fn create_export(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<String, Arc<TaskResponse>> {
        let name = match &self.export {
            Some(ResourceRef::Name(name)) => name.clone(),
            _ => return Err(handle.response.is_failed(request, "export_name is required to create an NFS export")),
        };
        if self.host_state == Some(HostState::AbsentInExport) {
            return Err(handle.response.is_failed(request, "host_state 'absent-in-export' makes no sense when creating an export"));
        }
        let filesystem_id = self.resolve_filesystem(handle, request)?;
        let path = self.path.as_ref()
            .ok_or_else(|| handle.response.is_failed(request, "path is required to create an NFS export"))?;

        let mut body = Body::new();
        body.insert("name".to_string(), Value::String(name));
        body.insert("file_system_id".to_string(), Value::String(filesystem_id));
        body.insert("path".to_string(), Value::String(path.clone()));
        if let Desired::Set(description) = &self.description {
            body.insert("description".to_string(), Value::String(description.clone()));
        }
        if let Some(access) = &self.default_access {
            body.insert("default_access".to_string(), Value::String(access.clone()));
        }
        if let Some(uid) = self.anonymous_uid {
            body.insert("anonymous_UID".to_string(), Value::Number(uid.into()));
        }
        if let Some(gid) = self.anonymous_gid {
            body.insert("anonymous_GID".to_string(), Value::Number(gid.into()));
        }
        if let Some(flag) = self.no_suid {
            body.insert("is_no_SUID".to_string(), Value::Bool(flag));
        }
        let lists: [(&str, &Option<Vec<String>>); 5] = [
            ("no_access_hosts", &self.no_access_hosts),
            ("read_only_hosts", &self.read_only_hosts),
            ("read_only_root_hosts", &self.read_only_root_hosts),
            ("read_write_hosts", &self.read_write_hosts),
            ("read_write_root_hosts", &self.read_write_root_hosts),
        ];
        for (key, hosts) in lists {
            if let Some(hosts) = hosts {
                let value = Value::Array(hosts.iter().cloned().map(Value::String).collect());
                body.insert(key.to_string(), value);
            }
        }
        handle.api.provisioning.create_nfs_export(&body)
            .map_err(|e| handle.response.api_failed(request, "creating NFS export", &e))
    }
}

fn details(export: &NfsExportDetail) -> Value {
    serde_json::to_value(export).unwrap_or(Value::Null)
}
