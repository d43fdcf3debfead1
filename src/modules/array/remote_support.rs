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

//! Remote support (SupportAssist) configuration. The array has exactly one
//! remote support record; this module reshapes it, and can exercise the
//! connection with verify and test-alert calls, which are read-only from
//! the configuration's point of view and therefore report OK, not changed.

use crate::client::optional;
use crate::client::types::RemoteSupportDetail;
use crate::handle::handle::TaskHandle;
use crate::tasks::*;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const MODULE: &str = "remote_support";

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct RemoteSupportTask {
    pub name: Option<String>,
    pub remote_support_id: Option<String>,
    pub support_type: Option<String>,
    pub proxy_address: Option<String>,
    pub proxy_port: Option<String>,
    pub proxy_username: Option<String>,
    pub proxy_password: Option<String>,
    pub is_cloudiq_enabled: Option<String>,
    pub is_rsc_enabled: Option<String>,
    pub verify_connection: Option<String>,
    pub send_test_alert: Option<String>,
    pub wait_for_completion: Option<String>,
    pub with: Option<PreLogicInput>,
    pub and: Option<PostLogicInput>,
}

struct RemoteSupportAction {
    remote_support_id: Option<String>,
    support_type: Option<String>,
    proxy_address: Desired<String>,
    proxy_port: Option<u64>,
    proxy_username: Desired<String>,
    proxy_password: Option<String>,
    cloudiq: Option<bool>,
    rsc: Option<bool>,
    verify_connection: bool,
    send_test_alert: bool,
    wait_for_completion: bool,
}

impl IsTask for RemoteSupportTask {
    fn get_module(&self) -> String { String::from(MODULE) }
    fn get_name(&self) -> Option<String> { self.name.clone() }
    fn get_with(&self) -> Option<PreLogicInput> { self.with.clone() }

    fn evaluate(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, tm: TemplateMode) -> Result<EvaluatedTask, Arc<TaskResponse>> {
        Ok(EvaluatedTask {
            action: Arc::new(RemoteSupportAction {
                remote_support_id: handle.template.string_option(request, tm, "remote_support_id", &self.remote_support_id)?,
                support_type: handle.template.string_option(request, tm, "support_type", &self.support_type)?,
                proxy_address: Desired::from_param(&handle.template.string_option(request, tm, "proxy_address", &self.proxy_address)?),
                proxy_port: handle.template.unsigned_option(request, tm, "proxy_port", &self.proxy_port)?,
                proxy_username: Desired::from_param(&handle.template.string_option(request, tm, "proxy_username", &self.proxy_username)?),
                proxy_password: handle.template.string_option(request, tm, "proxy_password", &self.proxy_password)?,
                cloudiq: handle.template.boolean_option(request, tm, "is_cloudiq_enabled", &self.is_cloudiq_enabled)?,
                rsc: handle.template.boolean_option(request, tm, "is_rsc_enabled", &self.is_rsc_enabled)?,
                verify_connection: handle.template.boolean_option_default_false(request, tm, "verify_connection", &self.verify_connection)?,
                send_test_alert: handle.template.boolean_option_default_false(request, tm, "send_test_alert", &self.send_test_alert)?,
                wait_for_completion: handle.template.boolean_option_default_true(request, tm, "wait_for_completion", &self.wait_for_completion)?,
            }),
            with: Arc::new(PreLogicInput::template(handle, request, tm, &self.with)?),
            and: Arc::new(PostLogicInput::template(handle, request, tm, &self.and)?),
        })
    }
}

impl IsAction for RemoteSupportAction {
    fn dispatch(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Arc<TaskResponse>, Arc<TaskResponse>> {
        match request.request_type {
            TaskRequestType::Query => {
                let existing = self.find_config(handle, request)?;
                let patch = self.build_patch(&existing);
                if !patch.is_empty() {
                    Ok(handle.response.needs_modification(request, &patch.changes))
                } else if self.verify_connection || self.send_test_alert {
                    Ok(handle.response.needs_passive(request))
                } else {
                    Ok(handle.response.is_matched_with_details(request, details(&existing)))
                }
            },

            TaskRequestType::Modify => {
                let existing = self.find_config(handle, request)?;
                let patch = self.build_patch(&existing);
                if !patch.is_empty() {
                    let job = handle.api.configuration.modify_remote_support(&existing.id, &patch.body)
                        .map_err(|e| handle.response.api_failed(request, "modifying remote support configuration", &e))?;
                    if let Some(job_id) = job {
                        if self.wait_for_completion {
                            handle.api.configuration.wait_for_job(&job_id)
                                .map_err(|e| handle.response.api_failed(request, "waiting for remote support change", &e))?;
                        }
                    }
                }
                self.run_checks(handle, request, &existing.id)?;
                let updated = handle.api.configuration.get_remote_support(&existing.id)
                    .map_err(|e| handle.response.api_failed(request, "reading back remote support configuration", &e))?;
                Ok(handle.response.is_modified_with_details(request, request.changes.clone(), details(&updated)))
            },

            TaskRequestType::Passive => {
                let existing = self.find_config(handle, request)?;
                self.run_checks(handle, request, &existing.id)?;
                Ok(handle.response.is_passive_with_details(request, details(&existing)))
            },

            _ => Err(handle.response.not_supported(request)),
        }
    }
}

impl RemoteSupportAction {
    /// Resolve the configuration record, defaulting to the array's single
    /// record when no id was given.
    fn find_config(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<RemoteSupportDetail, Arc<TaskResponse>> {
        if let Some(id) = &self.remote_support_id {
            return optional(handle.api.configuration.get_remote_support(id))
                .map_err(|e| handle.response.api_failed(request, "looking up remote support configuration", &e))?
                .ok_or_else(|| handle.response.is_failed(request, &format!("remote support configuration '{}' not found", id)));
        }
        let mut configs = handle.api.configuration.list_remote_support()
            .map_err(|e| handle.response.api_failed(request, "looking up remote support configuration", &e))?;
        if configs.is_empty() {
            return Err(handle.response.is_failed(request, "no remote support configuration found on the array"));
        }
        Ok(configs.remove(0))
    }

    fn build_patch(&self, existing: &RemoteSupportDetail) -> Patch {
        let mut builder = PatchBuilder::new();
        builder.string(Field::SupportType, "type", existing.support_type.as_deref(), &self.support_type);
        builder.clearable(Field::Proxy, "proxy_address",
            existing.proxy_address.as_deref().filter(|a| !a.is_empty()), &self.proxy_address);
        builder.integer(Field::Proxy, "proxy_port", existing.proxy_port, &self.proxy_port);
        builder.clearable(Field::Proxy, "proxy_username",
            existing.proxy_username.as_deref().filter(|u| !u.is_empty()), &self.proxy_username);
        if let Some(password) = &self.proxy_password {
            // write-only, cannot be diffed
            builder.always(Field::Proxy, "proxy_password", Value::String(password.clone()));
        }
        builder.boolean(Field::CloudIq, "is_cloudiq_enabled", existing.is_cloudiq_enabled, &self.cloudiq);
        builder.boolean(Field::Rsc, "is_rsc_enabled", existing.is_rsc_enabled, &self.rsc);
        builder.build()
    }

    fn run_checks(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, id: &str) -> Result<(), Arc<TaskResponse>> {
        if self.verify_connection {
            handle.api.configuration.verify_remote_support(id)
                .map_err(|e| handle.response.api_failed(request, "verifying remote support connection", &e))?;
        }
        if self.send_test_alert {
            handle.api.configuration.send_test_alert(id)
                .map_err(|e| handle.response.api_failed(request, "sending remote support test alert", &e))?;
        }
        Ok(())
    }
}

fn details(config: &RemoteSupportDetail) -> Value {
    serde_json::to_value(config).unwrap_or(Value::Null)
}
