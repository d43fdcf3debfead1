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

use crate::client::ArrayConnection;
use crate::handle::handle::TaskHandle;
use crate::modules::array::cluster::ClusterTask;
use crate::modules::array::info::InfoTask;
use crate::modules::array::network::NetworkTask;
use crate::modules::array::remote_support::RemoteSupportTask;
use crate::modules::block::volume::VolumeTask;
use crate::modules::block::volume_group::VolumeGroupTask;
use crate::modules::file::filesystem::FilesystemTask;
use crate::modules::file::nas_server::NasServerTask;
use crate::modules::file::nfs_export::NfsExportTask;
use crate::modules::file::quota::QuotaTask;
use crate::modules::file::smb_share::SmbShareTask;
use crate::modules::protection::replication_session::ReplicationSessionTask;
use crate::tasks::{EvaluatedTask, IsTask, PreLogicInput, TaskRequest, TaskResponse, TemplateMode};
use serde::Deserialize;
use std::sync::Arc;

// all the playbook language YAML structures!

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Play {
    pub name: String,
    pub array: Option<ArrayConnection>,
    pub vars: Option<serde_yaml::Mapping>,
    pub vars_files: Option<Vec<String>>,
    pub tasks: Option<Vec<Task>>,
}

/// One task entry, selected by YAML tag (`- !volume`, `- !nfs_export`, ...).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Volume(VolumeTask),
    VolumeGroup(VolumeGroupTask),
    Filesystem(FilesystemTask),
    NasServer(NasServerTask),
    SmbShare(SmbShareTask),
    NfsExport(NfsExportTask),
    Quota(QuotaTask),
    Network(NetworkTask),
    Cluster(ClusterTask),
    RemoteSupport(RemoteSupportTask),
    ReplicationSession(ReplicationSessionTask),
    Info(InfoTask),
}

impl Task {
    fn as_task(&self) -> &dyn IsTask {
        match self {
            Task::Volume(t) => t,
            Task::VolumeGroup(t) => t,
            Task::Filesystem(t) => t,
            Task::NasServer(t) => t,
            Task::SmbShare(t) => t,
            Task::NfsExport(t) => t,
            Task::Quota(t) => t,
            Task::Network(t) => t,
            Task::Cluster(t) => t,
            Task::RemoteSupport(t) => t,
            Task::ReplicationSession(t) => t,
            Task::Info(t) => t,
        }
    }

    pub fn get_module(&self) -> String {
        self.as_task().get_module()
    }

    pub fn get_name(&self) -> Option<String> {
        self.as_task().get_name()
    }

    pub fn get_with(&self) -> Option<PreLogicInput> {
        self.as_task().get_with()
    }

    /// Display name for task banners: the explicit name if given, otherwise
    /// the module name.
    pub fn get_display_name(&self) -> String {
        self.get_name().unwrap_or_else(|| self.get_module())
    }

    pub fn evaluate(&self, handle: &Arc<TaskHandle>, request: &Arc<TaskRequest>, tm: TemplateMode)
        -> Result<EvaluatedTask, Arc<TaskResponse>> {
        self.as_task().evaluate(handle, request, tm)
    }
}
