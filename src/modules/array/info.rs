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

//! Read-only inventory gathering. Results land in the task details, so a
//! playbook can register them and feed later tasks.

use crate::handle::handle::TaskHandle;
use crate::tasks::*;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const MODULE: &str = "info";

const SUBSETS: &[&str] = &[
    "cluster", "network", "volume", "volume_group", "filesystem",
    "nas_server", "replication_session", "remote_support",
];

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct InfoTask {
    pub name: Option<String>,
    pub gather_subset: Option<Vec<String>>,
    pub with: Option<PreLogicInput>,
    pub and: Option<PostLogicInput>,
}

struct InfoAction {
    subsets: Vec<String>,
}

impl IsTask for InfoTask {
    fn get_module(&self) -> String { String::from(MODULE) }
    fn get_name(&self) -> Option<String> { self.name.clone() }
    fn get_with(&self) -> Option<PreLogicInput> { self.with.clone() }

    fn evaluate(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, tm: TemplateMode) -> Result<EvaluatedTask, Arc<TaskResponse>> {
        let subsets = match &self.gather_subset {
            None => vec![String::from("cluster")],
            Some(list) => {
                let mut rendered = Vec::with_capacity(list.len());
                for item in list.iter() {
                    rendered.push(handle.template.string(request, tm, "gather_subset", item)?);
                }
                rendered
            },
        };
        if tm == TemplateMode::On {
            for subset in subsets.iter() {
                if !SUBSETS.contains(&subset.as_str()) {
                    return Err(handle.response.is_failed(request,
                        &format!("invalid gather_subset '{}', expecting one of {}", subset, SUBSETS.join(", "))));
                }
            }
        }

        Ok(EvaluatedTask {
            action: Arc::new(InfoAction { subsets }),
            with: Arc::new(PreLogicInput::template(handle, request, tm, &self.with)?),
            and: Arc::new(PostLogicInput::template(handle, request, tm, &self.and)?),
        })
    }
}

impl IsAction for InfoAction {
    fn dispatch(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>) -> Result<Arc<TaskResponse>, Arc<TaskResponse>> {
        match request.request_type {
            TaskRequestType::Query => Ok(handle.response.needs_passive(request)),

            TaskRequestType::Passive => {
                let mut gathered = serde_json::Map::new();
                for subset in self.subsets.iter() {
                    let value = self.gather(handle, request, subset)?;
                    gathered.insert(subset.clone(), value);
                }
                Ok(handle.response.is_passive_with_details(request, Value::Object(gathered)))
            },

            _ => Err(handle.response.not_supported(request)),
        }
    }
}

impl InfoAction {
    fn gather(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, subset: &str) -> Result<Value, Arc<TaskResponse>> {
        let context = format!("gathering {} info", subset);
        let fail = |e| handle.response.api_failed(request, &context, &e);
        let value = match subset {
            "cluster" => to_value(handle.api.configuration.get_clusters().map_err(fail)?),
            "network" => to_value(handle.api.configuration.list_networks().map_err(fail)?),
            "volume" => to_value(handle.api.provisioning.list_volumes().map_err(fail)?),
            "volume_group" => to_value(handle.api.provisioning.list_volume_groups().map_err(fail)?),
            "filesystem" => to_value(handle.api.provisioning.list_filesystems().map_err(fail)?),
            "nas_server" => to_value(handle.api.provisioning.list_nas_servers().map_err(fail)?),
            "replication_session" => to_value(handle.api.protection.list_replication_sessions().map_err(fail)?),
            "remote_support" => to_value(handle.api.configuration.list_remote_support().map_err(fail)?),
            other => return Err(handle.response.is_failed(request, &format!("invalid gather_subset '{}'", other))),
        };
        Ok(value)
    }
}

fn to_value<T: serde::Serialize>(items: Vec<T>) -> Value {
    serde_json::to_value(items).unwrap_or(Value::Null)
}
