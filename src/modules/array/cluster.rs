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

//! Cluster identity and initial configuration. A freshly racked appliance
//! has no cluster yet, so 'present' can run the initial cluster create,
//! which is an array-side job. Clusters cannot be deleted.

use crate::client::{expect_unique, Body};
use crate::client::types::ClusterDetail;
use crate::handle::handle::TaskHandle;
use crate::tasks::*;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const MODULE: &str = "cluster";

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct ClusterTask {
    pub name: Option<String>,
    pub cluster_name: Option<String>,
    pub cluster_id: Option<String>,
    pub new_name: Option<String>,
    pub physical_mtu: Option<String>,
    pub service_password: Option<String>,
    pub management_address: Option<String>,
    pub storage_discovery_address: Option<String>,
    pub appliances: Option<Vec<String>>,
    pub ignore_network_warnings: Option<String>,
    pub wait_for_completion: Option<String>,
    pub state: Option<String>,
    pub with: Option<PreLogicInput>,
    pub and: Option<PostLogicInput>,
}

struct ClusterAction {
    cluster: Option<ResourceRef>,
    new_name: Option<String>,
    physical_mtu: Option<u64>,
    service_password: Option<String>,
    management_address: Option<String>,
    storage_discovery_address: Option<String>,
    appliances: Option<Vec<String>>,
    ignore_network_warnings: Option<bool>,
    wait_for_completion: bool,
}

impl IsTask for ClusterTask {
    fn get_module(&self) -> String { String::from(MODULE) }
    fn get_name(&self) -> Option<String> { self.name.clone() }
    fn get_with(&self) -> Option<PreLogicInput> { self.with.clone() }

    fn evaluate(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, tm: TemplateMode) -> Result<EvaluatedTask, Arc<TaskResponse>> {
        let cluster_name = handle.template.string_option(request, tm, "cluster_name", &self.cluster_name)?;
        let cluster_id = handle.template.string_option(request, tm, "cluster_id", &self.cluster_id)?;
        let cluster = ResourceRef::from_params(&cluster_id, &cluster_name);
        if tm == TemplateMode::On && cluster.is_none() {
            return Err(handle.response.is_failed(request, "one of cluster_name or cluster_id is required"));
        }

        let state = DesiredState::parse(&handle.template.string_option(request, tm, "state", &self.state)?)
            .map_err(|msg| handle.response.is_failed(request, &msg))?;
        if state == DesiredState::Absent {
            return Err(handle.response.is_failed(request, "clusters cannot be deleted; state 'absent' is not supported"));
        }

        let appliances = match &self.appliances {
            None => None,
            Some(items) => {
                let mut rendered = Vec::with_capacity(items.len());
                for item in items.iter() {
                    rendered.push(handle.template.string(request, tm, "appliances", item)?);
                }
                Some(rendered)
            },
        };

        Ok(EvaluatedTask {
            action: Arc::new(ClusterAction {
                cluster,
                new_name: handle.template.string_option(request, tm, "new_name", &self.new_name)?,
                physical_mtu: handle.template.unsigned_option(request, tm, "physical_mtu", &self.physical_mtu)?,
                service_password: handle.template.string_option(request, tm, "service_password", &self.service_password)?,
                management_address: handle.template.string_option(request, tm, "management_address", &self.management_address)?,
                storage_discovery_address: handle.template.string_option(request, tm, "storage_discovery_address", &self.storage_discovery_address)?,
                appliances,
                ignore_network_warnings: handle.template.boolean_option(request, tm, "ignore_network_warnings", &self.ignore_network_warnings)?,
                wait_for_completion: handle.template.boolean_option_default_true(request, tm, "wait_for_completion", &self.wait_for_completion)?,
            }),
            with: Arc::new(PreLogicInput::template(handle, request, tm, &self.with)?),
            and: Arc::new(PostLogicInput::template(handle, request, tm, &self.and)?),
        })
    }
}

impl IsAction for ClusterAction {
    fn dispatch(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Arc<TaskResponse>, Arc<TaskResponse>> {
        match request.request_type {
            TaskRequestType::Query => {
                let existing = self.find_cluster(handle, request)?;
                match existing {
                    None => {
                        if self.management_address.is_none() || self.appliances.is_none() {
                            return Err(handle.response.is_failed(request,
                                "management_address and appliances are required to configure a new cluster"));
                        }
                        Ok(handle.response.needs_creation(request))
                    },
                    Some(existing) => {
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
                self.create_cluster(handle, request)?;
                let created = self.find_cluster(handle, request)?
                    .ok_or_else(|| handle.response.is_failed(request, "cluster create finished but the cluster is not visible yet"))?;
                Ok(handle.response.is_created_with_details(request, details(&created)))
            },

            TaskRequestType::Modify => {
                let existing = self.find_cluster(handle, request)?
                    .ok_or_else(|| handle.response.is_failed(request, "cluster disappeared before modification"))?;
                let patch = self.build_patch(&existing);
                if !patch.is_empty() {
                    handle.api.configuration.modify_cluster(&existing.id, &patch.body)
                        .map_err(|e| handle.response.api_failed(request, "modifying cluster", &e))?;
                }
                let updated = self.find_cluster(handle, request)?
                    .ok_or_else(|| handle.response.is_failed(request, "cluster disappeared after modification"))?;
                Ok(handle.response.is_modified_with_details(request, request.changes.clone(), details(&updated)))
            },

            _ => Err(handle.response.not_supported(request)),
        }
    }
}

impl ClusterAction {
    fn find_cluster(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Option<ClusterDetail>, Arc<TaskResponse>> {
        let cluster = self.cluster.as_ref()
            .ok_or_else(|| handle.response.is_failed(request, "one of cluster_name or cluster_id is required"))?;
        let clusters = handle.api.configuration.get_clusters()
            .map_err(|e| handle.response.api_failed(request, "looking up cluster", &e))?;
        Ok(clusters.into_iter().find(|c| match cluster {
            ResourceRef::Id(id) => &c.id == id,
            ResourceRef::Name(name) => c.name.as_deref() == Some(name.as_str()),
        }))
    }

    fn build_patch(&self, existing: &ClusterDetail) -> Patch {
        let mut builder = PatchBuilder::new();
        builder.string(Field::Name, "name", existing.name.as_deref(), &self.new_name);
        builder.integer(Field::Mtu, "physical_mtu", existing.physical_mtu, &self.physical_mtu);
        if let Some(password) = &self.service_password {
            // write-only on the array, so it always counts as a change
            builder.always(Field::ServicePassword, "service_password", Value::String(password.clone()));
        }
        builder.build()
    }

    fn create_cluster(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<(), Arc<TaskResponse>> {
        let name = match &self.cluster {
            Some(ResourceRef::Name(name)) => name.clone(),
            _ => return Err(handle.response.is_failed(request, "cluster_name is required to configure a cluster")),
        };
        let appliances = self.appliances.as_ref()
            .ok_or_else(|| handle.response.is_failed(request, "appliances are required to configure a cluster"))?;
        let mut appliance_ids = Vec::with_capacity(appliances.len());
        for appliance in appliances.iter() {
            let id = match ResourceRef::parse(appliance) {
                ResourceRef::Id(id) => id,
                ResourceRef::Name(name) => {
                    let matches = handle.api.configuration.get_appliances_by_name(&name)
                        .map_err(|e| handle.response.api_failed(request, "looking up appliance", &e))?;
                    expect_unique("appliance", &name, matches)
                        .map_err(|e| handle.response.api_failed(request, "looking up appliance", &e))?
                        .map(|a| a.id)
                        .ok_or_else(|| handle.response.is_failed(request, &format!("appliance '{}' not found", name)))?
                },
            };
            appliance_ids.push(serde_json::json!({"id": id}));
        }
        let management_address = self.management_address.as_ref()
            .ok_or_else(|| handle.response.is_failed(request, "management_address is required to configure a cluster"))?;

        let mut body = Body::new();
        body.insert("name".to_string(), Value::String(name));
        body.insert("management_address".to_string(), Value::String(management_address.clone()));
        if let Some(address) = &self.storage_discovery_address {
            body.insert("storage_discovery_address".to_string(), Value::String(address.clone()));
        }
        body.insert("appliances".to_string(), Value::Array(appliance_ids));
        if let Some(mtu) = self.physical_mtu {
            body.insert("physical_mtu".to_string(), Value::Number(mtu.into()));
        }
        if let Some(password) = &self.service_password {
            body.insert("service_password".to_string(), Value::String(password.clone()));
        }
        if let Some(flag) = self.ignore_network_warnings {
            body.insert("ignore_network_warnings".to_string(), Value::Bool(flag));
        }

        let job = handle.api.configuration.create_cluster(&body)
            .map_err(|e| handle.response.api_failed(request, "configuring cluster", &e))?;
        if let Some(job_id) = job {
            if self.wait_for_completion {
                handle.api.configuration.wait_for_job(&job_id)
                    .map_err(|e| handle.response.api_failed(request, "waiting for cluster configuration", &e))?;
            }
        }
        Ok(())
    }
}

fn details(cluster: &ClusterDetail) -> Value {
    serde_json::to_value(cluster).unwrap_or(Value::Null)
}
