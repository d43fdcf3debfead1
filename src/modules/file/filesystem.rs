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

//! NAS filesystem lifecycle. Filesystems are scoped to a NAS server, carry
//! SMB tuning flags and per-filesystem quota defaults, and like volumes may
//! only ever grow.

use crate::client::{expect_unique, optional, Body};
use crate::client::types::FilesystemDetail;
use crate::handle::handle::TaskHandle;
use crate::modules::file::resolve_nas_server;
use crate::tasks::*;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const MODULE: &str = "filesystem";

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct SmbPropertiesInput {
    pub is_smb_sync_writes_enabled: Option<String>,
    pub is_smb_no_notify_enabled: Option<String>,
    pub is_smb_notify_on_access_enabled: Option<String>,
    pub is_smb_notify_on_write_enabled: Option<String>,
    pub is_smb_op_locks_enabled: Option<String>,
    pub smb_notify_on_change_dir_depth: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct QuotaDefaultsInput {
    pub default_hard_limit: Option<String>,
    pub default_soft_limit: Option<String>,
    pub grace_period: Option<String>,
    pub grace_period_unit: Option<String>,
    pub cap_unit: Option<String>,
}

// grace periods arrive in calendar units and the array wants seconds
fn grace_period_seconds(count: i64, unit: &str) -> Option<i64> {
    let per_unit = match unit.to_lowercase().as_str() {
        "days" => 86_400,
        "weeks" => 604_800,
        "months" => 2_592_000,
        _ => return None,
    };
    Some(count * per_unit)
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct FilesystemTask {
    pub name: Option<String>,
    pub filesystem_name: Option<String>,
    pub filesystem_id: Option<String>,
    pub nas_server: Option<String>,
    pub size: Option<String>,
    pub cap_unit: Option<String>,
    pub description: Option<String>,
    pub access_policy: Option<String>,
    pub locking_policy: Option<String>,
    pub folder_rename_policy: Option<String>,
    pub smb_properties: Option<SmbPropertiesInput>,
    pub quota_defaults: Option<QuotaDefaultsInput>,
    pub protection_policy: Option<String>,
    pub state: Option<String>,
    pub with: Option<PreLogicInput>,
    pub and: Option<PostLogicInput>,
}

#[derive(Debug, Default)]
struct SmbProperties {
    sync_writes: Option<bool>,
    no_notify: Option<bool>,
    notify_on_access: Option<bool>,
    notify_on_write: Option<bool>,
    op_locks: Option<bool>,
    notify_dir_depth: Option<u64>,
}

#[derive(Debug, Default)]
struct QuotaDefaults {
    hard_limit: Option<u64>,
    soft_limit: Option<u64>,
    grace_period: Option<i64>,
}

struct FilesystemAction {
    filesystem: Option<ResourceRef>,
    nas_server: Option<String>,
    size_bytes: Option<u64>,
    description: Desired<String>,
    access_policy: Option<String>,
    locking_policy: Option<String>,
    folder_rename_policy: Option<String>,
    smb: SmbProperties,
    quota: QuotaDefaults,
    protection_policy: Desired<String>,
    state: DesiredState,
}

impl IsTask for FilesystemTask {
    fn get_module(&self) -> String { String::from(MODULE) }
    fn get_name(&self) -> Option<String> { self.name.clone() }
    fn get_with(&self) -> Option<PreLogicInput> { self.with.clone() }

    fn evaluate(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, tm: TemplateMode) -> Result<EvaluatedTask, Arc<TaskResponse>> {
        let fs_name = handle.template.string_option(request, tm, "filesystem_name", &self.filesystem_name)?;
        let fs_id = handle.template.string_option(request, tm, "filesystem_id", &self.filesystem_id)?;
        let filesystem = ResourceRef::from_params(&fs_id, &fs_name);
        if tm == TemplateMode::On && filesystem.is_none() {
            return Err(handle.response.is_failed(request, "one of filesystem_name or filesystem_id is required"));
        }

        let nas_server = handle.template.string_option(request, tm, "nas_server", &self.nas_server)?;
        if tm == TemplateMode::On && nas_server.is_none() && matches!(filesystem, Some(ResourceRef::Name(_))) {
            return Err(handle.response.is_failed(request, "nas_server is required when addressing a filesystem by name"));
        }

        let size_count = handle.template.unsigned_option(request, tm, "size", &self.size)?;
        let cap_unit = handle.template.string_option_default(request, tm, "cap_unit", &self.cap_unit, "GB")?;
        let size_bytes = match size_count {
            None => None,
            Some(count) => {
                let unit = CapUnit::parse(&cap_unit)
                    .ok_or_else(|| handle.response.is_failed(request, &format!("invalid cap_unit '{}', expecting MB, GB or TB", cap_unit)))?;
                Some(unit.bytes(count))
            },
        };

        let smb = match &self.smb_properties {
            None => SmbProperties::default(),
            Some(input) => SmbProperties {
                sync_writes: handle.template.boolean_option(request, tm, "is_smb_sync_writes_enabled", &input.is_smb_sync_writes_enabled)?,
                no_notify: handle.template.boolean_option(request, tm, "is_smb_no_notify_enabled", &input.is_smb_no_notify_enabled)?,
                notify_on_access: handle.template.boolean_option(request, tm, "is_smb_notify_on_access_enabled", &input.is_smb_notify_on_access_enabled)?,
                notify_on_write: handle.template.boolean_option(request, tm, "is_smb_notify_on_write_enabled", &input.is_smb_notify_on_write_enabled)?,
                op_locks: handle.template.boolean_option(request, tm, "is_smb_op_locks_enabled", &input.is_smb_op_locks_enabled)?,
                notify_dir_depth: handle.template.unsigned_option(request, tm, "smb_notify_on_change_dir_depth", &input.smb_notify_on_change_dir_depth)?,
            },
        };

        let quota = match &self.quota_defaults {
            None => QuotaDefaults::default(),
            Some(input) => {
                let quota_unit = handle.template.string_option_default(request, tm, "cap_unit", &input.cap_unit, "GB")?;
                let unit = CapUnit::parse(&quota_unit)
                    .ok_or_else(|| handle.response.is_failed(request, &format!("invalid cap_unit '{}', expecting MB, GB or TB", quota_unit)))?;
                let grace_unit = handle.template.string_option_default(request, tm, "grace_period_unit", &input.grace_period_unit, "days")?;
                let grace_period = match handle.template.integer_option(request, tm, "grace_period", &input.grace_period)? {
                    None => None,
                    Some(count) => Some(grace_period_seconds(count, &grace_unit)
                        .ok_or_else(|| handle.response.is_failed(request,
                            &format!("invalid grace_period_unit '{}', expecting days, weeks or months", grace_unit)))?),
                };
                QuotaDefaults {
                    hard_limit: handle.template.unsigned_option(request, tm, "default_hard_limit", &input.default_hard_limit)?
                        .map(|count| unit.bytes(count)),
                    soft_limit: handle.template.unsigned_option(request, tm, "default_soft_limit", &input.default_soft_limit)?
                        .map(|count| unit.bytes(count)),
                    grace_period,
                }
            },
        };

        let state = DesiredState::parse(&handle.template.string_option(request, tm, "state", &self.state)?)
            .map_err(|msg| handle.response.is_failed(request, &msg))?;

        Ok(EvaluatedTask {
            action: Arc::new(FilesystemAction {
                filesystem,
                nas_server,
                size_bytes,
                description: Desired::from_param(&handle.template.string_option(request, tm, "description", &self.description)?),
                access_policy: handle.template.string_option(request, tm, "access_policy", &self.access_policy)?,
                locking_policy: handle.template.string_option(request, tm, "locking_policy", &self.locking_policy)?,
                folder_rename_policy: handle.template.string_option(request, tm, "folder_rename_policy", &self.folder_rename_policy)?,
                smb,
                quota,
                protection_policy: Desired::from_param(&handle.template.string_option(request, tm, "protection_policy", &self.protection_policy)?),
                state,
            }),
            with: Arc::new(PreLogicInput::template(handle, request, tm, &self.with)?),
            and: Arc::new(PostLogicInput::template(handle, request, tm, &self.and)?),
        })
    }
}

impl IsAction for FilesystemAction {
    fn dispatch(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Arc<TaskResponse>, Arc<TaskResponse>> {
        match request.request_type {
            TaskRequestType::Query => {
                let existing = self.find_filesystem(handle, request)?;
                match (self.state, existing) {
                    (DesiredState::Absent, Some(_)) => Ok(handle.response.needs_removal(request)),
                    (DesiredState::Absent, None) => Ok(handle.response.is_matched(request)),
                    (DesiredState::Present, None) => {
                        if self.size_bytes.is_none() {
                            return Err(handle.response.is_failed(request, "size is required to create a filesystem"));
                        }
                        Ok(handle.response.needs_creation(request))
                    },
                    (DesiredState::Present, Some(existing)) => {
                        let patch = self.build_patch(handle, request, &existing)?;
                        if patch.is_empty() {
                            Ok(handle.response.is_matched_with_details(request, details(&existing)))
                        } else {
                            Ok(handle.response.needs_modification(request, &patch.changes))
                        }
                    },
                }
            },

            TaskRequestType::Create => {
                let id = self.create_filesystem(handle, request)?;
                let created = handle.api.provisioning.get_filesystem(&id)
                    .map_err(|e| handle.response.api_failed(request, "reading back created filesystem", &e))?;
                Ok(handle.response.is_created_with_details(request, details(&created)))
            },

            TaskRequestType::Remove => {
                let existing = self.find_filesystem(handle, request)?
                    .ok_or_else(|| handle.response.is_failed(request, "filesystem disappeared before removal"))?;
                handle.api.provisioning.delete_filesystem(&existing.id)
                    .map_err(|e| handle.response.api_failed(request, "deleting filesystem", &e))?;
                Ok(handle.response.is_removed(request))
            },

            TaskRequestType::Modify => {
                let existing = self.find_filesystem(handle, request)?
                    .ok_or_else(|| handle.response.is_failed(request, "filesystem disappeared before modification"))?;
                let patch = self.build_patch(handle, request, &existing)?;
                if !patch.is_empty() {
                    handle.api.provisioning.modify_filesystem(&existing.id, &patch.body)
                        .map_err(|e| handle.response.api_failed(request, "modifying filesystem", &e))?;
                }
                let updated = handle.api.provisioning.get_filesystem(&existing.id)
                    .map_err(|e| handle.response.api_failed(request, "reading back modified filesystem", &e))?;
                Ok(handle.response.is_modified_with_details(request, request.changes.clone(), details(&updated)))
            },

            _ => Err(handle.response.not_supported(request)),
        }
    }
}

impl FilesystemAction {
    fn nas_server_id(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<String, Arc<TaskResponse>> {
        let nas_server = self.nas_server.as_ref()
            .ok_or_else(|| handle.response.is_failed(request, "nas_server is required"))?;
        resolve_nas_server(handle.api.provisioning.as_ref(), nas_server)
            .map_err(|e| handle.response.api_failed(request, "looking up nas server", &e))?
            .ok_or_else(|| handle.response.is_failed(request, &format!("nas server '{}' not found", nas_server)))
    }

    fn find_filesystem(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Option<FilesystemDetail>, Arc<TaskResponse>> {
        let filesystem = self.filesystem.as_ref()
            .ok_or_else(|| handle.response.is_failed(request, "one of filesystem_name or filesystem_id is required"))?;
        match filesystem {
            ResourceRef::Id(id) => optional(handle.api.provisioning.get_filesystem(id))
                .map_err(|e| handle.response.api_failed(request, "looking up filesystem", &e)),
            ResourceRef::Name(name) => {
                let nas_server_id = self.nas_server_id(handle, request)?;
                let matches = handle.api.provisioning.get_filesystems_by_name(name, &nas_server_id)
                    .map_err(|e| handle.response.api_failed(request, "looking up filesystem", &e))?;
                expect_unique("filesystem", name, matches)
                    .map_err(|e| handle.response.api_failed(request, "looking up filesystem", &e))
            },
        }
    }

    fn resolve_protection_policy(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, policy: &str) -> Result<String, Arc<TaskResponse>> {
        match ResourceRef::parse(policy) {
            ResourceRef::Id(id) => Ok(id),
            ResourceRef::Name(name) => {
                let matches = handle.api.protection.get_protection_policies_by_name(&name)
                    .map_err(|e| handle.response.api_failed(request, "looking up protection policy", &e))?;
                expect_unique("protection policy", &name, matches)
                    .map_err(|e| handle.response.api_failed(request, "looking up protection policy", &e))?
                    .map(|p| p.id)
                    .ok_or_else(|| handle.response.is_failed(request, &format!("protection policy '{}' not found", name)))
            },
        }
    }

    fn build_patch(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, existing: &FilesystemDetail) -> Result<Patch, Arc<TaskResponse>> {
        let mut builder = PatchBuilder::new();
        builder.grow_only(Field::Size, "size_total", existing.size_total.unwrap_or(0), &self.size_bytes)
            .map_err(|msg| handle.response.is_failed(request, &msg))?;

        let current_description = existing.description.as_deref().filter(|d| !d.is_empty());
        builder.clearable(Field::Description, "description", current_description, &self.description);

        builder.string(Field::AccessPolicy, "access_policy", existing.access_policy.as_deref(), &self.access_policy);
        builder.string(Field::LockingPolicy, "locking_policy", existing.locking_policy.as_deref(), &self.locking_policy);
        builder.string(Field::FolderRenamePolicy, "folder_rename_policy", existing.folder_rename_policy.as_deref(), &self.folder_rename_policy);

        builder.boolean(Field::SmbProperties, "is_smb_sync_writes_enabled", existing.is_smb_sync_writes_enabled, &self.smb.sync_writes);
        builder.boolean(Field::SmbProperties, "is_smb_no_notify_enabled", existing.is_smb_no_notify_enabled, &self.smb.no_notify);
        builder.boolean(Field::SmbProperties, "is_smb_notify_on_access_enabled", existing.is_smb_notify_on_access_enabled, &self.smb.notify_on_access);
        builder.boolean(Field::SmbProperties, "is_smb_notify_on_write_enabled", existing.is_smb_notify_on_write_enabled, &self.smb.notify_on_write);
        builder.boolean(Field::SmbProperties, "is_smb_op_locks_enabled", existing.is_smb_op_locks_enabled, &self.smb.op_locks);
        builder.integer(Field::SmbProperties, "smb_notify_on_change_dir_depth", existing.smb_notify_on_change_dir_depth, &self.smb.notify_dir_depth);

        builder.integer(Field::QuotaDefaults, "default_hard_limit", existing.default_hard_limit, &self.quota.hard_limit);
        builder.integer(Field::QuotaDefaults, "default_soft_limit", existing.default_soft_limit, &self.quota.soft_limit);
        if let Some(grace) = self.quota.grace_period {
            if existing.grace_period != Some(grace) {
                builder.always(Field::QuotaDefaults, "grace_period", Value::Number(grace.into()));
            }
        }

        let protection = match &self.protection_policy {
            Desired::Unchanged => Desired::Unchanged,
            Desired::Clear => Desired::Clear,
            Desired::Set(policy) => Desired::Set(self.resolve_protection_policy(handle, request, policy)?),
        };
        builder.clearable(Field::ProtectionPolicy, "protection_policy_id",
            existing.protection_policy.as_ref().map(|p| p.id.as_str()), &protection);

        Ok(builder.build())
    }

    fn create_filesystem(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<String, Arc<TaskResponse>> {
        let name = match &self.filesystem {
            Some(ResourceRef::Name(name)) => name.clone(),
            _ => return Err(handle.response.is_failed(request, "filesystem_name is required to create a filesystem")),
        };
        let nas_server_id = self.nas_server_id(handle, request)?;
        let mut body = Body::new();
        body.insert("name".to_string(), Value::String(name));
        body.insert("nas_server_id".to_string(), Value::String(nas_server_id));
        body.insert("size_total".to_string(), Value::Number(self.size_bytes.unwrap_or(0).into()));
        if let Desired::Set(description) = &self.description {
            body.insert("description".to_string(), Value::String(description.clone()));
        }
        if let Some(policy) = &self.access_policy {
            body.insert("access_policy".to_string(), Value::String(policy.clone()));
        }
        if let Some(policy) = &self.locking_policy {
            body.insert("locking_policy".to_string(), Value::String(policy.clone()));
        }
        if let Some(policy) = &self.folder_rename_policy {
            body.insert("folder_rename_policy".to_string(), Value::String(policy.clone()));
        }
        if let Some(flag) = self.smb.sync_writes {
            body.insert("is_smb_sync_writes_enabled".to_string(), Value::Bool(flag));
        }
        if let Some(flag) = self.smb.no_notify {
            body.insert("is_smb_no_notify_enabled".to_string(), Value::Bool(flag));
        }
        if let Some(flag) = self.smb.notify_on_access {
            body.insert("is_smb_notify_on_access_enabled".to_string(), Value::Bool(flag));
        }
        if let Some(flag) = self.smb.notify_on_write {
            body.insert("is_smb_notify_on_write_enabled".to_string(), Value::Bool(flag));
        }
        if let Some(flag) = self.smb.op_locks {
            body.insert("is_smb_op_locks_enabled".to_string(), Value::Bool(flag));
        }
        if let Some(depth) = self.smb.notify_dir_depth {
            body.insert("smb_notify_on_change_dir_depth".to_string(), Value::Number(depth.into()));
        }
        if let Some(limit) = self.quota.hard_limit {
            body.insert("default_hard_limit".to_string(), Value::Number(limit.into()));
        }
        if let Some(limit) = self.quota.soft_limit {
            body.insert("default_soft_limit".to_string(), Value::Number(limit.into()));
        }
        if let Some(grace) = self.quota.grace_period {
            body.insert("grace_period".to_string(), Value::Number(grace.into()));
        }
        if let Desired::Set(policy) = &self.protection_policy {
            let policy_id = self.resolve_protection_policy(handle, request, policy)?;
            body.insert("protection_policy_id".to_string(), Value::String(policy_id));
        }
        handle.api.provisioning.create_filesystem(&body)
            .map_err(|e| handle.response.api_failed(request, "creating filesystem", &e))
    }
}

fn details(filesystem: &FilesystemDetail) -> Value {
    serde_json::to_value(filesystem).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grace_period_unit_conversion() {
        assert_eq!(grace_period_seconds(1, "days"), Some(86_400));
        assert_eq!(grace_period_seconds(2, "weeks"), Some(1_209_600));
        assert_eq!(grace_period_seconds(1, "Months"), Some(2_592_000));
        assert_eq!(grace_period_seconds(1, "fortnights"), None);
    }
}
