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

//! Array network settings. Networks are fixed infrastructure on the array;
//! this module reshapes them (VLAN, MTU, addressing) but never creates or
//! deletes one. Management network changes run as an array-side job.

use crate::client::{expect_unique, optional};
use crate::client::types::NetworkDetail;
use crate::handle::handle::TaskHandle;
use crate::tasks::*;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const MODULE: &str = "network";

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct NetworkTask {
    pub name: Option<String>,
    pub network_name: Option<String>,
    pub network_id: Option<String>,
    pub vlan_id: Option<String>,
    pub mtu: Option<String>,
    pub gateway: Option<String>,
    pub prefix_length: Option<String>,
    pub new_cluster_mgmt_address: Option<String>,
    pub storage_discovery_address: Option<String>,
    pub ports: Option<Vec<String>>,
    pub port_state: Option<String>,
    pub wait_for_completion: Option<String>,
    pub state: Option<String>,
    pub with: Option<PreLogicInput>,
    pub and: Option<PostLogicInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PortState {
    PresentInNetwork,
    AbsentInNetwork,
}

struct NetworkAction {
    network: Option<ResourceRef>,
    vlan_id: Option<u64>,
    mtu: Option<u64>,
    gateway: Desired<String>,
    prefix_length: Option<u64>,
    cluster_mgmt_address: Option<String>,
    storage_discovery_address: Option<String>,
    ports: Option<Vec<String>>,
    port_state: Option<PortState>,
    wait_for_completion: bool,
}

impl IsTask for NetworkTask {
    fn get_module(&self) -> String { String::from(MODULE) }
    fn get_name(&self) -> Option<String> { self.name.clone() }
    fn get_with(&self) -> Option<PreLogicInput> { self.with.clone() }

    fn evaluate(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, tm: TemplateMode) -> Result<EvaluatedTask, Arc<TaskResponse>> {
        let network_name = handle.template.string_option(request, tm, "network_name", &self.network_name)?;
        let network_id = handle.template.string_option(request, tm, "network_id", &self.network_id)?;
        let network = ResourceRef::from_params(&network_id, &network_name);
        if tm == TemplateMode::On && network.is_none() {
            return Err(handle.response.is_failed(request, "one of network_name or network_id is required"));
        }

        match handle.template.string_option(request, tm, "state", &self.state)?.as_deref() {
            None | Some("present") => {},
            Some(other) => {
                return Err(handle.response.is_failed(request,
                    &format!("state '{}' is not supported; networks cannot be created or deleted", other)));
            },
        }

        let ports = match &self.ports {
            None => None,
            Some(items) => {
                let mut rendered = Vec::with_capacity(items.len());
                for item in items.iter() {
                    rendered.push(handle.template.string(request, tm, "ports", item)?);
                }
                Some(rendered)
            },
        };
        let port_state = match handle.template.string_option(request, tm, "port_state", &self.port_state)?.as_deref() {
            None => None,
            Some("present-in-network") => Some(PortState::PresentInNetwork),
            Some("absent-in-network") => Some(PortState::AbsentInNetwork),
            Some(other) => {
                return Err(handle.response.is_failed(request,
                    &format!("invalid port_state '{}', expecting 'present-in-network' or 'absent-in-network'", other)));
            },
        };
        if tm == TemplateMode::On && ports.is_some() != port_state.is_some() {
            return Err(handle.response.is_failed(request, "ports and port_state must be supplied together"));
        }

        Ok(EvaluatedTask {
            action: Arc::new(NetworkAction {
                network,
                vlan_id: handle.template.unsigned_option(request, tm, "vlan_id", &self.vlan_id)?,
                mtu: handle.template.unsigned_option(request, tm, "mtu", &self.mtu)?,
                gateway: Desired::from_param(&handle.template.string_option(request, tm, "gateway", &self.gateway)?),
                prefix_length: handle.template.unsigned_option(request, tm, "prefix_length", &self.prefix_length)?,
                cluster_mgmt_address: handle.template.string_option(request, tm, "new_cluster_mgmt_address", &self.new_cluster_mgmt_address)?,
                storage_discovery_address: handle.template.string_option(request, tm, "storage_discovery_address", &self.storage_discovery_address)?,
                ports,
                port_state,
                wait_for_completion: handle.template.boolean_option_default_true(request, tm, "wait_for_completion", &self.wait_for_completion)?,
            }),
            with: Arc::new(PreLogicInput::template(handle, request, tm, &self.with)?),
            and: Arc::new(PostLogicInput::template(handle, request, tm, &self.and)?),
        })
    }
}

impl IsAction for NetworkAction {
    fn dispatch(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Arc<TaskResponse>, Arc<TaskResponse>> {
        match request.request_type {
            TaskRequestType::Query => {
                let existing = self.find_network(handle, request)?
                    .ok_or_else(|| {
                        let network = self.network.as_ref().map(|n| n.describe()).unwrap_or_default();
                        handle.response.is_failed(request, &format!("network with {} not found", network))
                    })?;
                let patch = self.plan(handle, request, &existing)?;
                if patch.is_empty() {
                    Ok(handle.response.is_matched_with_details(request, details(&existing)))
                } else {
                    Ok(handle.response.needs_modification(request, &patch.changes))
                }
            },

            TaskRequestType::Modify => {
                let existing = self.find_network(handle, request)?
                    .ok_or_else(|| handle.response.is_failed(request, "network disappeared before modification"))?;
                let patch = self.plan(handle, request, &existing)?;
                if !patch.is_empty() {
                    let job = handle.api.configuration.modify_network(&existing.id, &patch.body)
                        .map_err(|e| handle.response.api_failed(request, "modifying network", &e))?;
                    if let Some(job_id) = job {
                        if self.wait_for_completion {
                            handle.api.configuration.wait_for_job(&job_id)
                                .map_err(|e| handle.response.api_failed(request, "waiting for network change", &e))?;
                        }
                    }
                }
                let updated = handle.api.configuration.get_network(&existing.id)
                    .map_err(|e| handle.response.api_failed(request, "reading back modified network", &e))?;
                Ok(handle.response.is_modified_with_details(request, request.changes.clone(), details(&updated)))
            },

            _ => Err(handle.response.not_supported(request)),
        }
    }
}

impl NetworkAction {
    fn find_network(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Option<NetworkDetail>, Arc<TaskResponse>> {
        let network = self.network.as_ref()
            .ok_or_else(|| handle.response.is_failed(request, "one of network_name or network_id is required"))?;
        match network {
            ResourceRef::Id(id) => optional(handle.api.configuration.get_network(id))
                .map_err(|e| handle.response.api_failed(request, "looking up network", &e)),
            ResourceRef::Name(name) => {
                let matches = handle.api.configuration.get_networks_by_name(name)
                    .map_err(|e| handle.response.api_failed(request, "looking up network", &e))?;
                expect_unique("network", name, matches)
                    .map_err(|e| handle.response.api_failed(request, "looking up network", &e))
            },
        }
    }

    fn plan(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, existing: &NetworkDetail) -> Result<Patch, Arc<TaskResponse>> {
        let mut builder = PatchBuilder::new();
        builder.integer(Field::Vlan, "vlan_id", existing.vlan_id, &self.vlan_id);
        builder.integer(Field::Mtu, "mtu", existing.mtu, &self.mtu);
        builder.clearable(Field::Gateway, "gateway",
            existing.gateway.as_deref().filter(|g| !g.is_empty()), &self.gateway);
        builder.integer(Field::PrefixLength, "prefix_length", existing.prefix_length, &self.prefix_length);
        builder.string(Field::ClusterMgmtAddress, "cluster_mgmt_address",
            existing.cluster_mgmt_address.as_deref(), &self.cluster_mgmt_address);
        builder.string(Field::StorageDiscoveryAddress, "storage_discovery_address",
            existing.storage_discovery_address.as_deref(), &self.storage_discovery_address);
        if let Some((key, ids)) = self.port_edits(handle, request, &existing.id)? {
            builder.always(Field::Ports, key, Value::Array(ids.into_iter().map(Value::String).collect()));
        }
        Ok(builder.build())
    }

    /// IP-port membership is edited incrementally: ports already where the
    /// playbook wants them are left alone and only the delta is submitted.
    fn port_edits(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, network_id: &str)
        -> Result<Option<(&'static str, Vec<String>)>, Arc<TaskResponse>> {
        let (ports, port_state) = match (&self.ports, self.port_state) {
            (Some(ports), Some(port_state)) => (ports, port_state),
            _ => return Ok(None),
        };
        let current: Vec<String> = handle.api.configuration.get_ip_ports_by_network(network_id)
            .map_err(|e| handle.response.api_failed(request, "listing network ports", &e))?
            .into_iter().map(|p| p.id).collect();
        let edit = match port_state {
            PortState::PresentInNetwork => {
                let add: Vec<String> = ports.iter().filter(|p| !current.contains(*p)).cloned().collect();
                if add.is_empty() { None } else { Some(("add_port_ids", add)) }
            },
            PortState::AbsentInNetwork => {
                let remove: Vec<String> = ports.iter().filter(|p| current.contains(*p)).cloned().collect();
                if remove.is_empty() { None } else { Some(("remove_port_ids", remove)) }
            },
        };
        Ok(edit)
    }
}

fn details(network: &NetworkDetail) -> Value {
    serde_json::to_value(network).unwrap_or(Value::Null)
}
