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

//! Tree and user quotas on filesystems. Tree quotas have a real lifecycle;
//! user quotas exist implicitly on the array, so 'absent' zeroes their
//! limits instead of deleting anything.

use crate::client::{expect_unique, optional, Body};
use crate::client::types::{TreeQuotaDetail, UserQuotaDetail};
use crate::handle::handle::TaskHandle;
use crate::modules::file::resolve_nas_server;
use crate::tasks::*;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const MODULE: &str = "quota";

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct QuotaTask {
    pub name: Option<String>,
    pub quota_type: Option<String>,
    pub quota_id: Option<String>,
    pub filesystem: Option<String>,
    pub nas_server: Option<String>,
    pub path: Option<String>,
    pub description: Option<String>,
    pub uid: Option<String>,
    pub unix_name: Option<String>,
    pub windows_name: Option<String>,
    pub windows_sid: Option<String>,
    pub hard_limit: Option<String>,
    pub soft_limit: Option<String>,
    pub cap_unit: Option<String>,
    pub state: Option<String>,
    pub with: Option<PreLogicInput>,
    pub and: Option<PostLogicInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuotaType {
    Tree,
    User,
}

// the identity key that selects one user quota on a filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
enum UserKey {
    Uid(u64),
    UnixName(String),
    WindowsName(String),
    WindowsSid(String),
}

impl UserKey {
    fn query(&self) -> (&'static str, String) {
        match self {
            UserKey::Uid(uid) => ("uid", uid.to_string()),
            UserKey::UnixName(name) => ("unix_name", name.clone()),
            UserKey::WindowsName(name) => ("windows_name", name.clone()),
            UserKey::WindowsSid(sid) => ("windows_sid", sid.clone()),
        }
    }

    fn body_entry(&self) -> (&'static str, Value) {
        match self {
            UserKey::Uid(uid) => ("uid", Value::Number((*uid).into())),
            UserKey::UnixName(name) => ("unix_name", Value::String(name.clone())),
            UserKey::WindowsName(name) => ("windows_name", Value::String(name.clone())),
            UserKey::WindowsSid(sid) => ("windows_sid", Value::String(sid.clone())),
        }
    }
}

struct QuotaAction {
    quota_type: QuotaType,
    quota_id: Option<String>,
    filesystem: Option<String>,
    nas_server: Option<String>,
    path: Option<String>,
    description: Desired<String>,
    user_key: Option<UserKey>,
    hard_limit: Option<u64>,
    soft_limit: Option<u64>,
    state: DesiredState,
}

impl IsTask for QuotaTask {
    fn get_module(&self) -> String { String::from(MODULE) }
    fn get_name(&self) -> Option<String> { self.name.clone() }
    fn get_with(&self) -> Option<PreLogicInput> { self.with.clone() }

    fn evaluate(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, tm: TemplateMode) -> Result<EvaluatedTask, Arc<TaskResponse>> {
        let quota_type = match handle.template.string_option(request, tm, "quota_type", &self.quota_type)?.as_deref() {
            Some("tree") => QuotaType::Tree,
            Some("user") => QuotaType::User,
            Some(other) => {
                return Err(handle.response.is_failed(request, &format!("invalid quota_type '{}', expecting 'tree' or 'user'", other)));
            },
            None => {
                if tm == TemplateMode::On {
                    return Err(handle.response.is_failed(request, "quota_type is required"));
                }
                QuotaType::Tree
            },
        };

        let quota_id = handle.template.string_option(request, tm, "quota_id", &self.quota_id)?;
        let filesystem = handle.template.string_option(request, tm, "filesystem", &self.filesystem)?;
        if tm == TemplateMode::On && quota_id.is_none() && filesystem.is_none() {
            return Err(handle.response.is_failed(request, "one of quota_id or filesystem is required"));
        }

        let path = handle.template.string_option(request, tm, "path", &self.path)?;
        if tm == TemplateMode::On && quota_type == QuotaType::Tree && quota_id.is_none() && path.is_none() {
            return Err(handle.response.is_failed(request, "path is required for tree quotas"));
        }

        let uid = handle.template.unsigned_option(request, tm, "uid", &self.uid)?;
        let unix_name = handle.template.string_option(request, tm, "unix_name", &self.unix_name)?;
        let windows_name = handle.template.string_option(request, tm, "windows_name", &self.windows_name)?;
        let windows_sid = handle.template.string_option(request, tm, "windows_sid", &self.windows_sid)?;
        let mut keys: Vec<UserKey> = Vec::new();
        if let Some(uid) = uid { keys.push(UserKey::Uid(uid)); }
        if let Some(name) = unix_name { keys.push(UserKey::UnixName(name)); }
        if let Some(name) = windows_name { keys.push(UserKey::WindowsName(name)); }
        if let Some(sid) = windows_sid { keys.push(UserKey::WindowsSid(sid)); }
        if keys.len() > 1 {
            return Err(handle.response.is_failed(request, "uid, unix_name, windows_name and windows_sid are mutually exclusive"));
        }
        let user_key = keys.pop();
        if tm == TemplateMode::On {
            if quota_type == QuotaType::User && quota_id.is_none() && user_key.is_none() {
                return Err(handle.response.is_failed(request, "one of uid, unix_name, windows_name or windows_sid is required for user quotas"));
            }
            if quota_type == QuotaType::Tree && user_key.is_some() {
                return Err(handle.response.is_failed(request, "user identity parameters are not valid for tree quotas"));
            }
        }

        let cap_unit = handle.template.string_option_default(request, tm, "cap_unit", &self.cap_unit, "GB")?;
        let unit = CapUnit::parse(&cap_unit)
            .ok_or_else(|| handle.response.is_failed(request, &format!("invalid cap_unit '{}', expecting MB, GB or TB", cap_unit)))?;
        let hard_limit = handle.template.unsigned_option(request, tm, "hard_limit", &self.hard_limit)?
            .map(|count| unit.bytes(count));
        let soft_limit = handle.template.unsigned_option(request, tm, "soft_limit", &self.soft_limit)?
            .map(|count| unit.bytes(count));

        let state = DesiredState::parse(&handle.template.string_option(request, tm, "state", &self.state)?)
            .map_err(|msg| handle.response.is_failed(request, &msg))?;

        Ok(EvaluatedTask {
            action: Arc::new(QuotaAction {
                quota_type,
                quota_id,
                filesystem,
                nas_server: handle.template.string_option(request, tm, "nas_server", &self.nas_server)?,
                path,
                description: Desired::from_param(&handle.template.string_option(request, tm, "description", &self.description)?),
                user_key,
                hard_limit,
                soft_limit,
                state,
            }),
            with: Arc::new(PreLogicInput::template(handle, request, tm, &self.with)?),
            and: Arc::new(PostLogicInput::template(handle, request, tm, &self.and)?),
        })
    }
}

impl IsAction for QuotaAction {
    fn dispatch(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Arc<TaskResponse>, Arc<TaskResponse>> {
        match self.quota_type {
            QuotaType::Tree => self.dispatch_tree(handle, request),
            QuotaType::User => self.dispatch_user(handle, request),
        }
    }
}

impl QuotaAction {
    fn filesystem_id(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<String, Arc<TaskResponse>> {
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

    // tree quotas

    fn find_tree_quota(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Option<TreeQuotaDetail>, Arc<TaskResponse>> {
        if let Some(id) = &self.quota_id {
            return optional(handle.api.provisioning.get_tree_quota(id))
                .map_err(|e| handle.response.api_failed(request, "looking up tree quota", &e));
        }
        let filesystem_id = self.filesystem_id(handle, request)?;
        let path = self.path.as_ref()
            .ok_or_else(|| handle.response.is_failed(request, "path is required for tree quotas"))?;
        let matches = handle.api.provisioning.find_tree_quotas(&filesystem_id, path)
            .map_err(|e| handle.response.api_failed(request, "looking up tree quota", &e))?;
        expect_unique("tree quota", path, matches)
            .map_err(|e| handle.response.api_failed(request, "looking up tree quota", &e))
    }

    fn dispatch_tree(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Arc<TaskResponse>, Arc<TaskResponse>> {
        match request.request_type {
            TaskRequestType::Query => {
                let existing = self.find_tree_quota(handle, request)?;
                match (self.state, existing) {
                    (DesiredState::Absent, Some(_)) => Ok(handle.response.needs_removal(request)),
                    (DesiredState::Absent, None) => Ok(handle.response.is_matched(request)),
                    (DesiredState::Present, None) => Ok(handle.response.needs_creation(request)),
                    (DesiredState::Present, Some(existing)) => {
                        let patch = self.tree_patch(&existing);
                        if patch.is_empty() {
                            Ok(handle.response.is_matched_with_details(request, tree_details(&existing)))
                        } else {
                            Ok(handle.response.needs_modification(request, &patch.changes))
                        }
                    },
                }
            },
            TaskRequestType::Create => {
                let filesystem_id = self.filesystem_id(handle, request)?;
                let path = self.path.as_ref()
                    .ok_or_else(|| handle.response.is_failed(request, "path is required to create a tree quota"))?;
                let mut body = Body::new();
                body.insert("file_system_id".to_string(), Value::String(filesystem_id));
                body.insert("path".to_string(), Value::String(path.clone()));
                if let Desired::Set(description) = &self.description {
                    body.insert("description".to_string(), Value::String(description.clone()));
                }
                if let Some(limit) = self.hard_limit {
                    body.insert("hard_limit".to_string(), Value::Number(limit.into()));
                }
                if let Some(limit) = self.soft_limit {
                    body.insert("soft_limit".to_string(), Value::Number(limit.into()));
                }
                let id = handle.api.provisioning.create_tree_quota(&body)
                    .map_err(|e| handle.response.api_failed(request, "creating tree quota", &e))?;
                let created = handle.api.provisioning.get_tree_quota(&id)
                    .map_err(|e| handle.response.api_failed(request, "reading back created tree quota", &e))?;
                Ok(handle.response.is_created_with_details(request, tree_details(&created)))
            },
            TaskRequestType::Remove => {
                let existing = self.find_tree_quota(handle, request)?
                    .ok_or_else(|| handle.response.is_failed(request, "tree quota disappeared before removal"))?;
                handle.api.provisioning.delete_tree_quota(&existing.id)
                    .map_err(|e| handle.response.api_failed(request, "deleting tree quota", &e))?;
                Ok(handle.response.is_removed(request))
            },
            TaskRequestType::Modify => {
                let existing = self.find_tree_quota(handle, request)?
                    .ok_or_else(|| handle.response.is_failed(request, "tree quota disappeared before modification"))?;
                let patch = self.tree_patch(&existing);
                if !patch.is_empty() {
                    handle.api.provisioning.modify_tree_quota(&existing.id, &patch.body)
                        .map_err(|e| handle.response.api_failed(request, "modifying tree quota", &e))?;
                }
                let updated = handle.api.provisioning.get_tree_quota(&existing.id)
                    .map_err(|e| handle.response.api_failed(request, "reading back modified tree quota", &e))?;
                Ok(handle.response.is_modified_with_details(request, request.changes.clone(), tree_details(&updated)))
            },
            _ => Err(handle.response.not_supported(request)),
        }
    }

    fn tree_patch(&self, existing: &TreeQuotaDetail) -> Patch {
        let mut builder = PatchBuilder::new();
        let current_description = existing.description.as_deref().filter(|d| !d.is_empty());
        builder.clearable(Field::Description, "description", current_description, &self.description);
        builder.integer(Field::HardLimit, "hard_limit", existing.hard_limit, &self.hard_limit);
        builder.integer(Field::SoftLimit, "soft_limit", existing.soft_limit, &self.soft_limit);
        builder.build()
    }

    // user quotas

    fn find_user_quota(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Option<UserQuotaDetail>, Arc<TaskResponse>> {
        if let Some(id) = &self.quota_id {
            return optional(handle.api.provisioning.get_user_quota(id))
                .map_err(|e| handle.response.api_failed(request, "looking up user quota", &e));
        }
        let filesystem_id = self.filesystem_id(handle, request)?;
        let key = self.user_key.as_ref()
            .ok_or_else(|| handle.response.is_failed(request, "a user identity parameter is required"))?;
        let (field, value) = key.query();
        let matches = handle.api.provisioning.find_user_quotas(&filesystem_id, field, &value)
            .map_err(|e| handle.response.api_failed(request, "looking up user quota", &e))?;
        expect_unique("user quota", &value, matches)
            .map_err(|e| handle.response.api_failed(request, "looking up user quota", &e))
    }

    fn dispatch_user(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Arc<TaskResponse>, Arc<TaskResponse>> {
        match request.request_type {
            TaskRequestType::Query => {
                let existing = self.find_user_quota(handle, request)?;
                match (self.state, existing) {
                    (DesiredState::Absent, None) => Ok(handle.response.is_matched(request)),
                    (DesiredState::Absent, Some(existing)) => {
                        // absent means "no limits", not deletion
                        if existing.hard_limit.unwrap_or(0) == 0 && existing.soft_limit.unwrap_or(0) == 0 {
                            Ok(handle.response.is_matched_with_details(request, user_details(&existing)))
                        } else {
                            Ok(handle.response.needs_modification(request, &vec![Field::HardLimit, Field::SoftLimit]))
                        }
                    },
                    (DesiredState::Present, None) => {
                        if self.hard_limit.is_none() && self.soft_limit.is_none() {
                            return Err(handle.response.is_failed(request, "hard_limit or soft_limit is required to create a user quota"));
                        }
                        Ok(handle.response.needs_creation(request))
                    },
                    (DesiredState::Present, Some(existing)) => {
                        let patch = self.user_patch(&existing);
                        if patch.is_empty() {
                            Ok(handle.response.is_matched_with_details(request, user_details(&existing)))
                        } else {
                            Ok(handle.response.needs_modification(request, &patch.changes))
                        }
                    },
                }
            },
            TaskRequestType::Create => {
                let filesystem_id = self.filesystem_id(handle, request)?;
                let key = self.user_key.as_ref()
                    .ok_or_else(|| handle.response.is_failed(request, "a user identity parameter is required"))?;
                let mut body = Body::new();
                body.insert("file_system_id".to_string(), Value::String(filesystem_id));
                let (field, value) = key.body_entry();
                body.insert(field.to_string(), value);
                if let Some(limit) = self.hard_limit {
                    body.insert("hard_limit".to_string(), Value::Number(limit.into()));
                }
                if let Some(limit) = self.soft_limit {
                    body.insert("soft_limit".to_string(), Value::Number(limit.into()));
                }
                let id = handle.api.provisioning.create_user_quota(&body)
                    .map_err(|e| handle.response.api_failed(request, "creating user quota", &e))?;
                let created = handle.api.provisioning.get_user_quota(&id)
                    .map_err(|e| handle.response.api_failed(request, "reading back created user quota", &e))?;
                Ok(handle.response.is_created_with_details(request, user_details(&created)))
            },
            TaskRequestType::Modify => {
                let existing = self.find_user_quota(handle, request)?
                    .ok_or_else(|| handle.response.is_failed(request, "user quota disappeared before modification"))?;
                let patch = match self.state {
                    DesiredState::Absent => {
                        let mut builder = PatchBuilder::new();
                        builder.always(Field::HardLimit, "hard_limit", Value::Number(0.into()));
                        builder.always(Field::SoftLimit, "soft_limit", Value::Number(0.into()));
                        builder.build()
                    },
                    DesiredState::Present => self.user_patch(&existing),
                };
                if !patch.is_empty() {
                    handle.api.provisioning.modify_user_quota(&existing.id, &patch.body)
                        .map_err(|e| handle.response.api_failed(request, "modifying user quota", &e))?;
                }
                let updated = handle.api.provisioning.get_user_quota(&existing.id)
                    .map_err(|e| handle.response.api_failed(request, "reading back modified user quota", &e))?;
                Ok(handle.response.is_modified_with_details(request, request.changes.clone(), user_details(&updated)))
            },
            _ => Err(handle.response.not_supported(request)),
        }
    }

    fn user_patch(&self, existing: &UserQuotaDetail) -> Patch {
        let mut builder = PatchBuilder::new();
        builder.integer(Field::HardLimit, "hard_limit", existing.hard_limit, &self.hard_limit);
        builder.integer(Field::SoftLimit, "soft_limit", existing.soft_limit, &self.soft_limit);
        builder.build()
    }
}

fn tree_details(quota: &TreeQuotaDetail) -> Value {
    serde_json::to_value(quota).unwrap_or(Value::Null)
}

fn user_details(quota: &UserQuotaDetail) -> Value {
    serde_json::to_value(quota).unwrap_or(Value::Null)
}
