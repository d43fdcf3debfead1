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

//! Block volume lifecycle: create, resize, rename, policy attach/detach,
//! host mapping, volume group membership and deletion.

use crate::client::{expect_unique, optional, Body};
use crate::client::types::{HostVolumeMapping, VolumeDetail};
use crate::handle::handle::TaskHandle;
use crate::tasks::*;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const MODULE: &str = "volume";

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct VolumeTask {
    pub name: Option<String>,
    pub vol_name: Option<String>,
    pub vol_id: Option<String>,
    pub new_name: Option<String>,
    pub size: Option<String>,
    pub cap_unit: Option<String>,
    pub description: Option<String>,
    pub protection_policy: Option<String>,
    pub performance_policy: Option<String>,
    pub volume_group: Option<String>,
    pub host: Option<String>,
    pub hostgroup: Option<String>,
    pub hlu: Option<String>,
    pub mapping_state: Option<String>,
    pub state: Option<String>,
    pub with: Option<PreLogicInput>,
    pub and: Option<PostLogicInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MappingState {
    Mapped,
    Unmapped,
}

struct VolumeAction {
    volume: Option<ResourceRef>,
    new_name: Option<String>,
    size_bytes: Option<u64>,
    description: Desired<String>,
    protection_policy: Desired<String>,
    performance_policy: Option<String>,
    volume_group: Option<String>,
    host: Option<String>,
    hostgroup: Option<String>,
    hlu: Option<u64>,
    mapping_state: Option<MappingState>,
    state: DesiredState,
}

// what query decided needs to happen to the host mapping
enum MappingOp {
    Attach { host_id: Option<String>, host_group_id: Option<String>, hlu: Option<u64> },
    Detach { host_id: Option<String>, host_group_id: Option<String> },
}

impl IsTask for VolumeTask {
    fn get_module(&self) -> String { String::from(MODULE) }
    fn get_name(&self) -> Option<String> { self.name.clone() }
    fn get_with(&self) -> Option<PreLogicInput> { self.with.clone() }

    fn evaluate(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, tm: TemplateMode) -> Result<EvaluatedTask, Arc<TaskResponse>> {
        let vol_name = handle.template.string_option(request, tm, "vol_name", &self.vol_name)?;
        let vol_id = handle.template.string_option(request, tm, "vol_id", &self.vol_id)?;
        let volume = ResourceRef::from_params(&vol_id, &vol_name);
        if tm == TemplateMode::On && volume.is_none() {
            return Err(handle.response.is_failed(request, "one of vol_name or vol_id is required"));
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

        let host = handle.template.string_option(request, tm, "host", &self.host)?;
        let hostgroup = handle.template.string_option(request, tm, "hostgroup", &self.hostgroup)?;
        if host.is_some() && hostgroup.is_some() {
            return Err(handle.response.is_failed(request, "host and hostgroup are mutually exclusive"));
        }

        let mapping_state = match handle.template.string_option(request, tm, "mapping_state", &self.mapping_state)?.as_deref() {
            None => None,
            Some("mapped") => Some(MappingState::Mapped),
            Some("unmapped") => Some(MappingState::Unmapped),
            Some(other) => {
                return Err(handle.response.is_failed(request, &format!("invalid mapping_state '{}', expecting 'mapped' or 'unmapped'", other)));
            },
        };
        if mapping_state.is_some() && host.is_none() && hostgroup.is_none() && tm == TemplateMode::On {
            return Err(handle.response.is_failed(request, "mapping_state requires host or hostgroup"));
        }

        let hlu = handle.template.unsigned_option(request, tm, "hlu", &self.hlu)?;
        if hlu.is_some() && mapping_state != Some(MappingState::Mapped) && tm == TemplateMode::On {
            return Err(handle.response.is_failed(request, "hlu is only valid with mapping_state: mapped"));
        }

        let state = DesiredState::parse(&handle.template.string_option(request, tm, "state", &self.state)?)
            .map_err(|msg| handle.response.is_failed(request, &msg))?;

        Ok(EvaluatedTask {
            action: Arc::new(VolumeAction {
                volume,
                new_name: handle.template.string_option(request, tm, "new_name", &self.new_name)?,
                size_bytes,
                description: Desired::from_param(&handle.template.string_option(request, tm, "description", &self.description)?),
                protection_policy: Desired::from_param(&handle.template.string_option(request, tm, "protection_policy", &self.protection_policy)?),
                performance_policy: handle.template.string_option(request, tm, "performance_policy", &self.performance_policy)?,
                volume_group: handle.template.string_option(request, tm, "volume_group", &self.volume_group)?,
                host,
                hostgroup,
                hlu,
                mapping_state,
                state,
            }),
            with: Arc::new(PreLogicInput::template(handle, request, tm, &self.with)?),
            and: Arc::new(PostLogicInput::template(handle, request, tm, &self.and)?),
        })
    }
}

impl IsAction for VolumeAction {
    fn dispatch(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Arc<TaskResponse>, Arc<TaskResponse>> {
        match request.request_type {
            TaskRequestType::Query => {
                let existing = self.find_volume(handle, request)?;
                match (self.state, existing) {
                    (DesiredState::Absent, Some(_)) => Ok(handle.response.needs_removal(request)),
                    (DesiredState::Absent, None) => Ok(handle.response.is_matched(request)),
                    (DesiredState::Present, None) => {
                        if self.size_bytes.is_none() {
                            return Err(handle.response.is_failed(request, "size is required to create a volume"));
                        }
                        Ok(handle.response.needs_creation(request))
                    },
                    (DesiredState::Present, Some(existing)) => {
                        let patch = self.build_patch(handle, request, &existing)?;
                        let mapping = self.plan_mapping(handle, request, &existing)?;
                        let joins_group = self.plan_membership(handle, request, &existing)?.is_some();

                        let mut changes = patch.changes.clone();
                        if mapping.is_some() {
                            if !patch.is_empty() || joins_group {
                                return Err(handle.response.is_failed(request,
                                    "cannot modify volume properties and change host mappings in the same task"));
                            }
                            changes.push(Field::Mapping);
                        }
                        if joins_group {
                            changes.push(Field::Members);
                        }
                        if changes.is_empty() {
                            Ok(handle.response.is_matched_with_details(request, details(&existing)))
                        } else {
                            Ok(handle.response.needs_modification(request, &changes))
                        }
                    },
                }
            },

            TaskRequestType::Create => {
                let id = self.create_volume(handle, request)?;
                if self.mapping_state == Some(MappingState::Mapped) {
                    let (host_id, host_group_id) = self.resolve_mapping_target(handle, request)?;
                    self.attach(handle, request, &id, host_id, host_group_id, self.hlu)?;
                }
                if let Some(group) = &self.volume_group {
                    let group_id = self.resolve_volume_group(handle, request, group)?;
                    handle.api.provisioning.add_volume_group_members(&group_id, &[id.clone()])
                        .map_err(|e| handle.response.api_failed(request, "adding volume to group", &e))?;
                }
                let created = handle.api.provisioning.get_volume(&id)
                    .map_err(|e| handle.response.api_failed(request, "reading back created volume", &e))?;
                Ok(handle.response.is_created_with_details(request, details(&created)))
            },

            TaskRequestType::Remove => {
                let existing = self.find_volume(handle, request)?
                    .ok_or_else(|| handle.response.is_failed(request, "volume disappeared before removal"))?;
                handle.api.provisioning.delete_volume(&existing.id)
                    .map_err(|e| handle.response.api_failed(request, "deleting volume", &e))?;
                Ok(handle.response.is_removed(request))
            },

            TaskRequestType::Modify => {
                let existing = self.find_volume(handle, request)?
                    .ok_or_else(|| handle.response.is_failed(request, "volume disappeared before modification"))?;

                let patch = self.build_patch(handle, request, &existing)?;
                if !patch.is_empty() {
                    handle.api.provisioning.modify_volume(&existing.id, &patch.body)
                        .map_err(|e| handle.response.api_failed(request, "modifying volume", &e))?;
                }
                if let Some(op) = self.plan_mapping(handle, request, &existing)? {
                    self.apply_mapping(handle, request, &existing.id, op)?;
                }
                if let Some(group_id) = self.plan_membership(handle, request, &existing)? {
                    handle.api.provisioning.add_volume_group_members(&group_id, &[existing.id.clone()])
                        .map_err(|e| handle.response.api_failed(request, "adding volume to group", &e))?;
                }

                let updated = handle.api.provisioning.get_volume(&existing.id)
                    .map_err(|e| handle.response.api_failed(request, "reading back modified volume", &e))?;
                Ok(handle.response.is_modified_with_details(request, request.changes.clone(), details(&updated)))
            },

            _ => Err(handle.response.not_supported(request)),
        }
    }
}

impl VolumeAction {
    fn find_volume(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Option<VolumeDetail>, Arc<TaskResponse>> {
        let volume = self.volume.as_ref()
            .ok_or_else(|| handle.response.is_failed(request, "one of vol_name or vol_id is required"))?;
        match volume {
            ResourceRef::Id(id) => optional(handle.api.provisioning.get_volume(id))
                .map_err(|e| handle.response.api_failed(request, "looking up volume", &e)),
            ResourceRef::Name(name) => {
                let matches = handle.api.provisioning.get_volumes_by_name(name)
                    .map_err(|e| handle.response.api_failed(request, "looking up volume", &e))?;
                expect_unique("volume", name, matches)
                    .map_err(|e| handle.response.api_failed(request, "looking up volume", &e))
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

    fn resolve_performance_policy(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, policy: &str) -> Result<String, Arc<TaskResponse>> {
        match ResourceRef::parse(policy) {
            ResourceRef::Id(id) => Ok(id),
            ResourceRef::Name(name) => {
                let matches = handle.api.provisioning.get_performance_policies_by_name(&name)
                    .map_err(|e| handle.response.api_failed(request, "looking up performance policy", &e))?;
                expect_unique("performance policy", &name, matches)
                    .map_err(|e| handle.response.api_failed(request, "looking up performance policy", &e))?
                    .map(|p| p.id)
                    .ok_or_else(|| handle.response.is_failed(request, &format!("performance policy '{}' not found", name)))
            },
        }
    }

    fn resolve_volume_group(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, group: &str) -> Result<String, Arc<TaskResponse>> {
        match ResourceRef::parse(group) {
            ResourceRef::Id(id) => Ok(id),
            ResourceRef::Name(name) => {
                let matches = handle.api.provisioning.get_volume_groups_by_name(&name)
                    .map_err(|e| handle.response.api_failed(request, "looking up volume group", &e))?;
                expect_unique("volume group", &name, matches)
                    .map_err(|e| handle.response.api_failed(request, "looking up volume group", &e))?
                    .map(|g| g.id)
                    .ok_or_else(|| handle.response.is_failed(request, &format!("volume group '{}' not found", name)))
            },
        }
    }

    fn resolve_mapping_target(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<(Option<String>, Option<String>), Arc<TaskResponse>> {
        if let Some(host) = &self.host {
            let id = match ResourceRef::parse(host) {
                ResourceRef::Id(id) => id,
                ResourceRef::Name(name) => {
                    let matches = handle.api.provisioning.get_hosts_by_name(&name)
                        .map_err(|e| handle.response.api_failed(request, "looking up host", &e))?;
                    expect_unique("host", &name, matches)
                        .map_err(|e| handle.response.api_failed(request, "looking up host", &e))?
                        .map(|h| h.id)
                        .ok_or_else(|| handle.response.is_failed(request, &format!("host '{}' not found", name)))?
                },
            };
            return Ok((Some(id), None));
        }
        if let Some(group) = &self.hostgroup {
            let id = match ResourceRef::parse(group) {
                ResourceRef::Id(id) => id,
                ResourceRef::Name(name) => {
                    let matches = handle.api.provisioning.get_host_groups_by_name(&name)
                        .map_err(|e| handle.response.api_failed(request, "looking up host group", &e))?;
                    expect_unique("host group", &name, matches)
                        .map_err(|e| handle.response.api_failed(request, "looking up host group", &e))?
                        .map(|g| g.id)
                        .ok_or_else(|| handle.response.is_failed(request, &format!("host group '{}' not found", name)))?
                },
            };
            return Ok((None, Some(id)));
        }
        Err(handle.response.is_failed(request, "mapping_state requires host or hostgroup"))
    }

    fn build_patch(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, existing: &VolumeDetail) -> Result<Patch, Arc<TaskResponse>> {
        let mut builder = PatchBuilder::new();
        builder.string(Field::Name, "name", existing.name.as_deref(), &self.new_name);
        builder.grow_only(Field::Size, "size", existing.size.unwrap_or(0), &self.size_bytes)
            .map_err(|msg| handle.response.is_failed(request, &msg))?;

        // empty description reads back as absent, so normalize before diffing
        let current_description = existing.description.as_deref().filter(|d| !d.is_empty());
        let description = match &self.description {
            Desired::Set(d) => Desired::Set(d.clone()),
            Desired::Clear => Desired::Clear,
            Desired::Unchanged => Desired::Unchanged,
        };
        builder.clearable(Field::Description, "description", current_description, &description);

        let protection = match &self.protection_policy {
            Desired::Unchanged => Desired::Unchanged,
            Desired::Clear => Desired::Clear,
            Desired::Set(policy) => Desired::Set(self.resolve_protection_policy(handle, request, policy)?),
        };
        builder.clearable(Field::ProtectionPolicy, "protection_policy_id",
            existing.protection_policy.as_ref().map(|p| p.id.as_str()), &protection);

        if let Some(policy) = &self.performance_policy {
            let policy_id = self.resolve_performance_policy(handle, request, policy)?;
            builder.string(Field::PerformancePolicy, "performance_policy_id",
                existing.performance_policy.as_ref().map(|p| p.id.as_str()), &Some(policy_id));
        }

        Ok(builder.build())
    }

    /// Compare the desired mapping against what the array has. Re-asking for
    /// an identical mapping is a no-op; asking for the same host at a
    /// different logical unit number is an error rather than a silent remap.
    fn plan_mapping(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, existing: &VolumeDetail) -> Result<Option<MappingOp>, Arc<TaskResponse>> {
        let mapping_state = match self.mapping_state {
            Some(state) => state,
            None => return Ok(None),
        };
        let (host_id, host_group_id) = self.resolve_mapping_target(handle, request)?;
        let mappings = handle.api.provisioning.get_volume_mappings(&existing.id)
            .map_err(|e| handle.response.api_failed(request, "looking up volume mappings", &e))?;
        let current = mappings.iter().find(|m| {
            (host_id.is_some() && m.host_id == host_id) ||
            (host_group_id.is_some() && m.host_group_id == host_group_id)
        });

        match (mapping_state, current) {
            (MappingState::Mapped, Some(mapping)) => {
                if self.hlu.is_some() && self.hlu != mapping.logical_unit_number {
                    return Err(handle.response.is_failed(request, &format!(
                        "volume is already mapped at logical unit number {}; remapping at {} requires unmapping first",
                        display_hlu(mapping), self.hlu.unwrap_or(0))));
                }
                Ok(None)
            },
            (MappingState::Mapped, None) => Ok(Some(MappingOp::Attach { host_id, host_group_id, hlu: self.hlu })),
            (MappingState::Unmapped, Some(_)) => Ok(Some(MappingOp::Detach { host_id, host_group_id })),
            (MappingState::Unmapped, None) => Ok(None),
        }
    }

    fn plan_membership(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, existing: &VolumeDetail) -> Result<Option<String>, Arc<TaskResponse>> {
        let group = match &self.volume_group {
            Some(group) => group,
            None => return Ok(None),
        };
        let group_id = self.resolve_volume_group(handle, request, group)?;
        if existing.volume_groups.iter().any(|g| g.id == group_id) {
            Ok(None)
        } else {
            Ok(Some(group_id))
        }
    }

    fn create_volume(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<String, Arc<TaskResponse>> {
        let name = match &self.volume {
            Some(ResourceRef::Name(name)) => name.clone(),
            _ => return Err(handle.response.is_failed(request, "vol_name is required to create a volume")),
        };
        let mut body = Body::new();
        body.insert("name".to_string(), Value::String(name));
        body.insert("size".to_string(), Value::Number(self.size_bytes.unwrap_or(0).into()));
        if let Desired::Set(description) = &self.description {
            body.insert("description".to_string(), Value::String(description.clone()));
        }
        if let Desired::Set(policy) = &self.protection_policy {
            let policy_id = self.resolve_protection_policy(handle, request, policy)?;
            body.insert("protection_policy_id".to_string(), Value::String(policy_id));
        }
        if let Some(policy) = &self.performance_policy {
            let policy_id = self.resolve_performance_policy(handle, request, policy)?;
            body.insert("performance_policy_id".to_string(), Value::String(policy_id));
        }
        handle.api.provisioning.create_volume(&body)
            .map_err(|e| handle.response.api_failed(request, "creating volume", &e))
    }

    fn attach(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, volume_id: &str,
              host_id: Option<String>, host_group_id: Option<String>, hlu: Option<u64>) -> Result<(), Arc<TaskResponse>> {
        let mut body = Body::new();
        if let Some(host_id) = host_id {
            body.insert("host_id".to_string(), Value::String(host_id));
        }
        if let Some(host_group_id) = host_group_id {
            body.insert("host_group_id".to_string(), Value::String(host_group_id));
        }
        if let Some(hlu) = hlu {
            body.insert("logical_unit_number".to_string(), Value::Number(hlu.into()));
        }
        handle.api.provisioning.attach_volume(volume_id, &body)
            .map_err(|e| handle.response.api_failed(request, "attaching volume", &e))
    }

    fn apply_mapping(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, volume_id: &str, op: MappingOp) -> Result<(), Arc<TaskResponse>> {
        match op {
            MappingOp::Attach { host_id, host_group_id, hlu } => {
                self.attach(handle, request, volume_id, host_id, host_group_id, hlu)
            },
            MappingOp::Detach { host_id, host_group_id } => {
                let mut body = Body::new();
                if let Some(host_id) = host_id {
                    body.insert("host_id".to_string(), Value::String(host_id));
                }
                if let Some(host_group_id) = host_group_id {
                    body.insert("host_group_id".to_string(), Value::String(host_group_id));
                }
                handle.api.provisioning.detach_volume(volume_id, &body)
                    .map_err(|e| handle.response.api_failed(request, "detaching volume", &e))
            },
        }
    }
}

fn display_hlu(mapping: &HostVolumeMapping) -> String {
    mapping.logical_unit_number.map(|n| n.to_string()).unwrap_or_else(|| String::from("unknown"))
}

fn details(volume: &VolumeDetail) -> Value {
    serde_json::to_value(volume).unwrap_or(Value::Null)
}
