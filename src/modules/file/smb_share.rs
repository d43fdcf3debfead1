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

//! SMB share lifecycle on top of an existing filesystem.

use crate::client::{expect_unique, optional, Body};
use crate::client::types::SmbShareDetail;
use crate::handle::handle::TaskHandle;
use crate::modules::file::resolve_nas_server;
use crate::tasks::*;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const MODULE: &str = "smb_share";

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct SmbShareTask {
    pub name: Option<String>,
    pub share_name: Option<String>,
    pub share_id: Option<String>,
    pub filesystem: Option<String>,
    pub nas_server: Option<String>,
    pub path: Option<String>,
    pub description: Option<String>,
    pub is_abe_enabled: Option<String>,
    pub is_branch_cache_enabled: Option<String>,
    pub is_continuous_availability_enabled: Option<String>,
    pub is_encryption_enabled: Option<String>,
    pub offline_availability: Option<String>,
    pub umask: Option<String>,
    pub state: Option<String>,
    pub with: Option<PreLogicInput>,
    pub and: Option<PostLogicInput>,
}

struct SmbShareAction {
    share: Option<ResourceRef>,
    filesystem: Option<String>,
    nas_server: Option<String>,
    path: Option<String>,
    description: Desired<String>,
    abe: Option<bool>,
    branch_cache: Option<bool>,
    continuous_availability: Option<bool>,
    encryption: Option<bool>,
    offline_availability: Option<String>,
    umask: Option<String>,
    state: DesiredState,
}

impl IsTask for SmbShareTask {
    fn get_module(&self) -> String { String::from(MODULE) }
    fn get_name(&self) -> Option<String> { self.name.clone() }
    fn get_with(&self) -> Option<PreLogicInput> { self.with.clone() }

    fn evaluate(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, tm: TemplateMode) -> Result<EvaluatedTask, Arc<TaskResponse>> {
        let share_name = handle.template.string_option(request, tm, "share_name", &self.share_name)?;
        let share_id = handle.template.string_option(request, tm, "share_id", &self.share_id)?;
        let share = ResourceRef::from_params(&share_id, &share_name);
        if tm == TemplateMode::On && share.is_none() {
            return Err(handle.response.is_failed(request, "one of share_name or share_id is required"));
        }

        let state = DesiredState::parse(&handle.template.string_option(request, tm, "state", &self.state)?)
            .map_err(|msg| handle.response.is_failed(request, &msg))?;

        Ok(EvaluatedTask {
            action: Arc::new(SmbShareAction {
                share,
                filesystem: handle.template.string_option(request, tm, "filesystem", &self.filesystem)?,
                nas_server: handle.template.string_option(request, tm, "nas_server", &self.nas_server)?,
                path: handle.template.string_option(request, tm, "path", &self.path)?,
                description: Desired::from_param(&handle.template.string_option(request, tm, "description", &self.description)?),
                abe: handle.template.boolean_option(request, tm, "is_abe_enabled", &self.is_abe_enabled)?,
                branch_cache: handle.template.boolean_option(request, tm, "is_branch_cache_enabled", &self.is_branch_cache_enabled)?,
                continuous_availability: handle.template.boolean_option(request, tm, "is_continuous_availability_enabled", &self.is_continuous_availability_enabled)?,
                encryption: handle.template.boolean_option(request, tm, "is_encryption_enabled", &self.is_encryption_enabled)?,
                offline_availability: handle.template.string_option(request, tm, "offline_availability", &self.offline_availability)?,
                umask: handle.template.string_option(request, tm, "umask", &self.umask)?,
                state,
            }),
            with: Arc::new(PreLogicInput::template(handle, request, tm, &self.with)?),
            and: Arc::new(PostLogicInput::template(handle, request, tm, &self.and)?),
        })
    }
}

impl IsAction for SmbShareAction {
    fn dispatch(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Arc<TaskResponse>, Arc<TaskResponse>> {
        match request.request_type {
            TaskRequestType::Query => {
                let existing = self.find_share(handle, request)?;
                match (self.state, existing) {
                    (DesiredState::Absent, Some(_)) => Ok(handle.response.needs_removal(request)),
                    (DesiredState::Absent, None) => Ok(handle.response.is_matched(request)),
                    (DesiredState::Present, None) => {
                        if self.filesystem.is_none() || self.path.is_none() {
                            return Err(handle.response.is_failed(request, "filesystem and path are required to create an SMB share"));
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
                let id = self.create_share(handle, request)?;
                let created = handle.api.provisioning.get_smb_share(&id)
                    .map_err(|e| handle.response.api_failed(request, "reading back created SMB share", &e))?;
                Ok(handle.response.is_created_with_details(request, details(&created)))
            },

            TaskRequestType::Remove => {
                let existing = self.find_share(handle, request)?
                    .ok_or_else(|| handle.response.is_failed(request, "SMB share disappeared before removal"))?;
                handle.api.provisioning.delete_smb_share(&existing.id)
                    .map_err(|e| handle.response.api_failed(request, "deleting SMB share", &e))?;
                Ok(handle.response.is_removed(request))
            },

            TaskRequestType::Modify => {
                let existing = self.find_share(handle, request)?
                    .ok_or_else(|| handle.response.is_failed(request, "SMB share disappeared before modification"))?;
                let patch = self.build_patch(&existing);
                if !patch.is_empty() {
                    handle.api.provisioning.modify_smb_share(&existing.id, &patch.body)
                        .map_err(|e| handle.response.api_failed(request, "modifying SMB share", &e))?;
                }
                let updated = handle.api.provisioning.get_smb_share(&existing.id)
                    .map_err(|e| handle.response.api_failed(request, "reading back modified SMB share", &e))?;
                Ok(handle.response.is_modified_with_details(request, request.changes.clone(), details(&updated)))
            },

            _ => Err(handle.response.not_supported(request)),
        }
    }
}

impl SmbShareAction {
    fn find_share(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Option<SmbShareDetail>, Arc<TaskResponse>> {
        let share = self.share.as_ref()
            .ok_or_else(|| handle.response.is_failed(request, "one of share_name or share_id is required"))?;
        match share {
            ResourceRef::Id(id) => optional(handle.api.provisioning.get_smb_share(id))
                .map_err(|e| handle.response.api_failed(request, "looking up SMB share", &e)),
            ResourceRef::Name(name) => {
                let matches = handle.api.provisioning.get_smb_shares_by_name(name)
                    .map_err(|e| handle.response.api_failed(request, "looking up SMB share", &e))?;
                expect_unique("SMB share", name, matches)
                    .map_err(|e| handle.response.api_failed(request, "looking up SMB share", &e))
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

    fn build_patch(&self, existing: &SmbShareDetail) -> Patch {
        let mut builder = PatchBuilder::new();
        let current_description = existing.description.as_deref().filter(|d| !d.is_empty());
        builder.clearable(Field::Description, "description", current_description, &self.description);
        builder.boolean(Field::Abe, "is_ABE_enabled", existing.is_abe_enabled, &self.abe);
        builder.boolean(Field::BranchCache, "is_branch_cache_enabled", existing.is_branch_cache_enabled, &self.branch_cache);
        builder.boolean(Field::ContinuousAvailability, "is_continuous_availability_enabled",
            existing.is_continuous_availability_enabled, &self.continuous_availability);
        builder.boolean(Field::Encryption, "is_encryption_enabled", existing.is_encryption_enabled, &self.encryption);
        builder.string(Field::OfflineAvailability, "offline_availability",
            existing.offline_availability.as_deref(), &self.offline_availability);
        builder.string(Field::Umask, "umask", existing.umask.as_deref(), &self.umask);
        builder.build()
    }

    fn create_share(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<String, Arc<TaskResponse>> {
        let name = match &self.share {
            Some(ResourceRef::Name(name)) => name.clone(),
            _ => return Err(handle.response.is_failed(request, "share_name is required to create an SMB share")),
        };
        let filesystem_id = self.resolve_filesystem(handle, request)?;
        let path = self.path.as_ref()
            .ok_or_else(|| handle.response.is_failed(request, "path is required to create an SMB share"))?;

        let mut body = Body::new();
        body.insert("name".to_string(), Value::String(name));
        body.insert("file_system_id".to_string(), Value::String(filesystem_id));
        body.insert("path".to_string(), Value::String(path.clone()));
        if let Desired::Set(description) = &self.description {
            body.insert("description".to_string(), Value::String(description.clone()));
        }
        if let Some(flag) = self.abe {
            body.insert("is_ABE_enabled".to_string(), Value::Bool(flag));
        }
        if let Some(flag) = self.branch_cache {
            body.insert("is_branch_cache_enabled".to_string(), Value::Bool(flag));
        }
        if let Some(flag) = self.continuous_availability {
            body.insert("is_continuous_availability_enabled".to_string(), Value::Bool(flag));
        }
        if let Some(flag) = self.encryption {
            body.insert("is_encryption_enabled".to_string(), Value::Bool(flag));
        }
        if let Some(avail) = &self.offline_availability {
            body.insert("offline_availability".to_string(), Value::String(avail.clone()));
        }
        if let Some(umask) = &self.umask {
            body.insert("umask".to_string(), Value::String(umask.clone()));
        }
        handle.api.provisioning.create_smb_share(&body)
            .map_err(|e| handle.response.api_failed(request, "creating SMB share", &e))
    }
}

fn details(share: &SmbShareDetail) -> Value {
    serde_json::to_value(share).unwrap_or(Value::Null)
}
