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

//! NAS server settings. The management path only supports modifying servers
//! that already exist; provisioning and decommissioning happen elsewhere, so
//! state accepts only 'present' and a missing server is an error.

use crate::client::{expect_unique, optional};
use crate::client::types::NasServerDetail;
use crate::handle::handle::TaskHandle;
use crate::tasks::*;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const MODULE: &str = "nas_server";

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct NasServerTask {
    pub name: Option<String>,
    pub nas_server_name: Option<String>,
    pub nas_server_id: Option<String>,
    pub new_name: Option<String>,
    pub description: Option<String>,
    pub current_unix_directory_service: Option<String>,
    pub default_unix_user: Option<String>,
    pub default_windows_user: Option<String>,
    pub protection_policy: Option<String>,
    pub state: Option<String>,
    pub with: Option<PreLogicInput>,
    pub and: Option<PostLogicInput>,
}

struct NasServerAction {
    server: Option<ResourceRef>,
    new_name: Option<String>,
    description: Desired<String>,
    directory_service: Option<String>,
    default_unix_user: Desired<String>,
    default_windows_user: Desired<String>,
    protection_policy: Desired<String>,
}

const DIRECTORY_SERVICES: &[&str] = &["NONE", "NIS", "LDAP", "LOCAL_FILES", "LOCAL_THEN_NIS", "LOCAL_THEN_LDAP"];

impl IsTask for NasServerTask {
    fn get_module(&self) -> String { String::from(MODULE) }
    fn get_name(&self) -> Option<String> { self.name.clone() }
    fn get_with(&self) -> Option<PreLogicInput> { self.with.clone() }

    fn evaluate(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, tm: TemplateMode) -> Result<EvaluatedTask, Arc<TaskResponse>> {
        let server_name = handle.template.string_option(request, tm, "nas_server_name", &self.nas_server_name)?;
        let server_id = handle.template.string_option(request, tm, "nas_server_id", &self.nas_server_id)?;
        let server = ResourceRef::from_params(&server_id, &server_name);
        if tm == TemplateMode::On && server.is_none() {
            return Err(handle.response.is_failed(request, "one of nas_server_name or nas_server_id is required"));
        }

        match handle.template.string_option(request, tm, "state", &self.state)?.as_deref() {
            None | Some("present") => {},
            Some(other) => {
                return Err(handle.response.is_failed(request,
                    &format!("state '{}' is not supported; NAS servers cannot be created or deleted through this module", other)));
            },
        }

        let directory_service = handle.template.string_option(request, tm, "current_unix_directory_service", &self.current_unix_directory_service)?;
        if let Some(service) = &directory_service {
            if !DIRECTORY_SERVICES.contains(&service.as_str()) {
                return Err(handle.response.is_failed(request,
                    &format!("invalid current_unix_directory_service '{}', expecting one of {}", service, DIRECTORY_SERVICES.join(", "))));
            }
        }

        Ok(EvaluatedTask {
            action: Arc::new(NasServerAction {
                server,
                new_name: handle.template.string_option(request, tm, "new_name", &self.new_name)?,
                description: Desired::from_param(&handle.template.string_option(request, tm, "description", &self.description)?),
                directory_service,
                default_unix_user: Desired::from_param(&handle.template.string_option(request, tm, "default_unix_user", &self.default_unix_user)?),
                default_windows_user: Desired::from_param(&handle.template.string_option(request, tm, "default_windows_user", &self.default_windows_user)?),
                protection_policy: Desired::from_param(&handle.template.string_option(request, tm, "protection_policy", &self.protection_policy)?),
            }),
            with: Arc::new(PreLogicInput::template(handle, request, tm, &self.with)?),
            and: Arc::new(PostLogicInput::template(handle, request, tm, &self.and)?),
        })
    }
}

impl IsAction for NasServerAction {
    fn dispatch(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Arc<TaskResponse>, Arc<TaskResponse>> {
        match request.request_type {
            TaskRequestType::Query => {
                let existing = self.find_server(handle, request)?
                    .ok_or_else(|| {
                        let server = self.server.as_ref().map(|s| s.describe()).unwrap_or_default();
                        handle.response.is_failed(request, &format!("nas server with {} not found", server))
                    })?;
                let patch = self.build_patch(handle, request, &existing)?;
                if patch.is_empty() {
                    Ok(handle.response.is_matched_with_details(request, details(&existing)))
                } else {
                    Ok(handle.response.needs_modification(request, &patch.changes))
                }
            },

            TaskRequestType::Modify => {
                let existing = self.find_server(handle, request)?
                    .ok_or_else(|| handle.response.is_failed(request, "nas server disappeared before modification"))?;
                let patch = self.build_patch(handle, request, &existing)?;
                if !patch.is_empty() {
                    handle.api.provisioning.modify_nas_server(&existing.id, &patch.body)
                        .map_err(|e| handle.response.api_failed(request, "modifying nas server", &e))?;
                }
                let updated = handle.api.provisioning.get_nas_server(&existing.id)
                    .map_err(|e| handle.response.api_failed(request, "reading back modified nas server", &e))?;
                Ok(handle.response.is_modified_with_details(request, request.changes.clone(), details(&updated)))
            },

            _ => Err(handle.response.not_supported(request)),
        }
    }
}

impl NasServerAction {
    fn find_server(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Option<NasServerDetail>, Arc<TaskResponse>> {
        let server = self.server.as_ref()
            .ok_or_else(|| handle.response.is_failed(request, "one of nas_server_name or nas_server_id is required"))?;
        match server {
            ResourceRef::Id(id) => optional(handle.api.provisioning.get_nas_server(id))
                .map_err(|e| handle.response.api_failed(request, "looking up nas server", &e)),
            ResourceRef::Name(name) => {
                let matches = handle.api.provisioning.get_nas_servers_by_name(name)
                    .map_err(|e| handle.response.api_failed(request, "looking up nas server", &e))?;
                expect_unique("nas server", name, matches)
                    .map_err(|e| handle.response.api_failed(request, "looking up nas server", &e))
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

    fn build_patch(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, existing: &NasServerDetail) -> Result<Patch, Arc<TaskResponse>> {
        let mut builder = PatchBuilder::new();
        builder.string(Field::Name, "name", existing.name.as_deref(), &self.new_name);

        let current_description = existing.description.as_deref().filter(|d| !d.is_empty());
        builder.clearable(Field::Description, "description", current_description, &self.description);

        builder.string(Field::DirectoryService, "current_unix_directory_service",
            existing.current_unix_directory_service.as_deref(), &self.directory_service);
        builder.clearable(Field::UnixUser, "default_unix_user",
            existing.default_unix_user.as_deref().filter(|u| !u.is_empty()), &self.default_unix_user);
        builder.clearable(Field::WindowsUser, "default_windows_user",
            existing.default_windows_user.as_deref().filter(|u| !u.is_empty()), &self.default_windows_user);

        let protection = match &self.protection_policy {
            Desired::Unchanged => Desired::Unchanged,
            Desired::Clear => Desired::Clear,
            Desired::Set(policy) => Desired::Set(self.resolve_protection_policy(handle, request, policy)?),
        };
        builder.clearable(Field::ProtectionPolicy, "protection_policy_id",
            existing.protection_policy.as_ref().map(|p| p.id.as_str()), &protection);

        Ok(builder.build())
    }
}

fn details(server: &NasServerDetail) -> Value {
    serde_json::to_value(server).unwrap_or(Value::Null)
}
