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

//! Volume group lifecycle and membership. Volumes listed in the task are
//! added or removed according to vol_state; members not listed are left
//! alone.

use crate::client::{expect_unique, optional, Body};
use crate::client::types::VolumeGroupDetail;
use crate::handle::handle::TaskHandle;
use crate::tasks::*;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const MODULE: &str = "volume_group";

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct VolumeGroupTask {
    pub name: Option<String>,
    pub vg_name: Option<String>,
    pub vg_id: Option<String>,
    pub new_name: Option<String>,
    pub description: Option<String>,
    pub protection_policy: Option<String>,
    pub is_write_order_consistent: Option<String>,
    pub volumes: Option<Vec<String>>,
    pub vol_state: Option<String>,
    pub state: Option<String>,
    pub with: Option<PreLogicInput>,
    pub and: Option<PostLogicInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VolState {
    PresentInGroup,
    AbsentInGroup,
}

struct VolumeGroupAction {
    group: Option<ResourceRef>,
    new_name: Option<String>,
    description: Desired<String>,
    protection_policy: Desired<String>,
    write_order_consistent: Option<bool>,
    volumes: Option<Vec<String>>,
    vol_state: Option<VolState>,
    state: DesiredState,
}

struct MembershipPlan {
    add: Vec<String>,
    remove: Vec<String>,
}

impl MembershipPlan {
    fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

impl IsTask for VolumeGroupTask {
    fn get_module(&self) -> String { String::from(MODULE) }
    fn get_name(&self) -> Option<String> { self.name.clone() }
    fn get_with(&self) -> Option<PreLogicInput> { self.with.clone() }

    fn evaluate(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, tm: TemplateMode) -> Result<EvaluatedTask, Arc<TaskResponse>> {
        let vg_name = handle.template.string_option(request, tm, "vg_name", &self.vg_name)?;
        let vg_id = handle.template.string_option(request, tm, "vg_id", &self.vg_id)?;
        let group = ResourceRef::from_params(&vg_id, &vg_name);
        if tm == TemplateMode::On && group.is_none() {
            return Err(handle.response.is_failed(request, "one of vg_name or vg_id is required"));
        }

        let volumes = match &self.volumes {
            None => None,
            Some(list) => {
                let mut rendered = Vec::with_capacity(list.len());
                for item in list.iter() {
                    rendered.push(handle.template.string(request, tm, "volumes", item)?);
                }
                Some(rendered)
            },
        };

        let vol_state = match handle.template.string_option(request, tm, "vol_state", &self.vol_state)?.as_deref() {
            None => None,
            Some("present-in-group") => Some(VolState::PresentInGroup),
            Some("absent-in-group") => Some(VolState::AbsentInGroup),
            Some(other) => {
                return Err(handle.response.is_failed(request,
                    &format!("invalid vol_state '{}', expecting 'present-in-group' or 'absent-in-group'", other)));
            },
        };
        if tm == TemplateMode::On && volumes.is_some() != vol_state.is_some() {
            return Err(handle.response.is_failed(request, "volumes and vol_state must be supplied together"));
        }

        let state = DesiredState::parse(&handle.template.string_option(request, tm, "state", &self.state)?)
            .map_err(|msg| handle.response.is_failed(request, &msg))?;

        Ok(EvaluatedTask {
            action: Arc::new(VolumeGroupAction {
                group,
                new_name: handle.template.string_option(request, tm, "new_name", &self.new_name)?,
                description: Desired::from_param(&handle.template.string_option(request, tm, "description", &self.description)?),
                protection_policy: Desired::from_param(&handle.template.string_option(request, tm, "protection_policy", &self.protection_policy)?),
                write_order_consistent: handle.template.boolean_option(request, tm, "is_write_order_consistent", &self.is_write_order_consistent)?,
                volumes,
                vol_state,
                state,
            }),
            with: Arc::new(PreLogicInput::template(handle, request, tm, &self.with)?),
            and: Arc::new(PostLogicInput::template(handle, request, tm, &self.and)?),
        })
    }
}

impl IsAction for VolumeGroupAction {
    fn dispatch(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Arc<TaskResponse>, Arc<TaskResponse>> {
        match request.request_type {
            TaskRequestType::Query => {
                let existing = self.find_group(handle, request)?;
                match (self.state, existing) {
                    (DesiredState::Absent, Some(_)) => Ok(handle.response.needs_removal(request)),
                    (DesiredState::Absent, None) => Ok(handle.response.is_matched(request)),
                    (DesiredState::Present, None) => Ok(handle.response.needs_creation(request)),
                    (DesiredState::Present, Some(existing)) => {
                        let patch = self.build_patch(handle, request, &existing)?;
                        let membership = self.plan_membership(handle, request, &existing)?;
                        let mut changes = patch.changes.clone();
                        if !membership.is_empty() {
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
                let id = self.create_group(handle, request)?;
                let created = handle.api.provisioning.get_volume_group(&id)
                    .map_err(|e| handle.response.api_failed(request, "reading back created volume group", &e))?;
                Ok(handle.response.is_created_with_details(request, details(&created)))
            },

            TaskRequestType::Remove => {
                let existing = self.find_group(handle, request)?
                    .ok_or_else(|| handle.response.is_failed(request, "volume group disappeared before removal"))?;
                handle.api.provisioning.delete_volume_group(&existing.id)
                    .map_err(|e| handle.response.api_failed(request, "deleting volume group", &e))?;
                Ok(handle.response.is_removed(request))
            },

            TaskRequestType::Modify => {
                let existing = self.find_group(handle, request)?
                    .ok_or_else(|| handle.response.is_failed(request, "volume group disappeared before modification"))?;

                let patch = self.build_patch(handle, request, &existing)?;
                if !patch.is_empty() {
                    handle.api.provisioning.modify_volume_group(&existing.id, &patch.body)
                        .map_err(|e| handle.response.api_failed(request, "modifying volume group", &e))?;
                }
                let membership = self.plan_membership(handle, request, &existing)?;
                if !membership.add.is_empty() {
                    handle.api.provisioning.add_volume_group_members(&existing.id, &membership.add)
                        .map_err(|e| handle.response.api_failed(request, "adding volume group members", &e))?;
                }
                if !membership.remove.is_empty() {
                    handle.api.provisioning.remove_volume_group_members(&existing.id, &membership.remove)
                        .map_err(|e| handle.response.api_failed(request, "removing volume group members", &e))?;
                }

                let updated = handle.api.provisioning.get_volume_group(&existing.id)
                    .map_err(|e| handle.response.api_failed(request, "reading back modified volume group", &e))?;
                Ok(handle.response.is_modified_with_details(request, request.changes.clone(), details(&updated)))
            },

            _ => Err(handle.response.not_supported(request)),
        }
    }
}

impl VolumeGroupAction {
    fn find_group(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Option<VolumeGroupDetail>, Arc<TaskResponse>> {
        let group = self.group.as_ref()
            .ok_or_else(|| handle.response.is_failed(request, "one of vg_name or vg_id is required"))?;
        match group {
            ResourceRef::Id(id) => optional(handle.api.provisioning.get_volume_group(id))
                .map_err(|e| handle.response.api_failed(request, "looking up volume group", &e)),
            ResourceRef::Name(name) => {
                let matches = handle.api.provisioning.get_volume_groups_by_name(name)
                    .map_err(|e| handle.response.api_failed(request, "looking up volume group", &e))?;
                expect_unique("volume group", name, matches)
                    .map_err(|e| handle.response.api_failed(request, "looking up volume group", &e))
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

    fn resolve_volume(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, volume: &str) -> Result<String, Arc<TaskResponse>> {
        match ResourceRef::parse(volume) {
            ResourceRef::Id(id) => Ok(id),
            ResourceRef::Name(name) => {
                let matches = handle.api.provisioning.get_volumes_by_name(&name)
                    .map_err(|e| handle.response.api_failed(request, "looking up volume", &e))?;
                expect_unique("volume", &name, matches)
                    .map_err(|e| handle.response.api_failed(request, "looking up volume", &e))?
                    .map(|v| v.id)
                    .ok_or_else(|| handle.response.is_failed(request, &format!("volume '{}' not found", name)))
            },
        }
    }

    fn build_patch(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, existing: &VolumeGroupDetail) -> Result<Patch, Arc<TaskResponse>> {
        let mut builder = PatchBuilder::new();
        builder.string(Field::Name, "name", existing.name.as_deref(), &self.new_name);

        let current_description = existing.description.as_deref().filter(|d| !d.is_empty());
        builder.clearable(Field::Description, "description", current_description, &self.description);

        let protection = match &self.protection_policy {
            Desired::Unchanged => Desired::Unchanged,
            Desired::Clear => Desired::Clear,
            Desired::Set(policy) => Desired::Set(self.resolve_protection_policy(handle, request, policy)?),
        };
        builder.clearable(Field::ProtectionPolicy, "protection_policy_id",
            existing.protection_policy.as_ref().map(|p| p.id.as_str()), &protection);

        builder.boolean(Field::WriteOrderConsistency, "is_write_order_consistent",
            existing.is_write_order_consistent, &self.write_order_consistent);

        Ok(builder.build())
    }

    fn plan_membership(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, existing: &VolumeGroupDetail) -> Result<MembershipPlan, Arc<TaskResponse>> {
        let mut plan = MembershipPlan { add: Vec::new(), remove: Vec::new() };
        let (volumes, vol_state) = match (&self.volumes, self.vol_state) {
            (Some(volumes), Some(vol_state)) => (volumes, vol_state),
            _ => return Ok(plan),
        };
        for volume in volumes.iter() {
            let volume_id = self.resolve_volume(handle, request, volume)?;
            let is_member = existing.volumes.iter().any(|v| v.id == volume_id);
            match vol_state {
                VolState::PresentInGroup if !is_member => plan.add.push(volume_id),
                VolState::AbsentInGroup if is_member => plan.remove.push(volume_id),
                _ => {},
            }
        }
        Ok(plan)
    }

    fn create_group(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<String, Arc<TaskResponse>> {
        let name = match &self.group {
            Some(ResourceRef::Name(name)) => name.clone(),
            _ => return Err(handle.response.is_failed(request, "vg_name is required to create a volume group")),
        };
        if self.vol_state == Some(VolState::AbsentInGroup) {
            return Err(handle.response.is_failed(request, "vol_state 'absent-in-group' makes no sense when creating a group"));
        }
        let mut body = Body::new();
        body.insert("name".to_string(), Value::String(name));
        if let Desired::Set(description) = &self.description {
            body.insert("description".to_string(), Value::String(description.clone()));
        }
        if let Desired::Set(policy) = &self.protection_policy {
            let policy_id = self.resolve_protection_policy(handle, request, policy)?;
            body.insert("protection_policy_id".to_string(), Value::String(policy_id));
        }
        if let Some(woc) = self.write_order_consistent {
            body.insert("is_write_order_consistent".to_string(), Value::Bool(woc));
        }
        if let Some(volumes) = &self.volumes {
            let mut ids = Vec::with_capacity(volumes.len());
            for volume in volumes.iter() {
                ids.push(Value::String(self.resolve_volume(handle, request, volume)?));
            }
            body.insert("volume_ids".to_string(), Value::Array(ids));
        }
        handle.api.provisioning.create_volume_group(&body)
            .map_err(|e| handle.response.api_failed(request, "creating volume group", &e))
    }
}

fn details(group: &VolumeGroupDetail) -> Value {
    serde_json::to_value(group).unwrap_or(Value::Null)
}
