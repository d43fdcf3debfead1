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

//! Resource representations as returned by the array's REST API. Fields we
//! never diff against stay out; modules that need the raw payload serialize
//! these back to JSON for the task details.

use serde::{Deserialize, Serialize};

/// Nested id/name pair used wherever the array embeds a related resource.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NamedRef {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VolumeDetail {
    pub id: String,
    pub name: Option<String>,
    pub size: Option<u64>,
    pub description: Option<String>,
    pub state: Option<String>,
    pub protection_policy: Option<NamedRef>,
    pub performance_policy: Option<NamedRef>,
    #[serde(default)]
    pub volume_groups: Vec<NamedRef>,
}

/// Row of the host_volume_mapping resource; exactly one of host_id or
/// host_group_id is set per row.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HostVolumeMapping {
    pub id: String,
    pub volume_id: Option<String>,
    pub host_id: Option<String>,
    pub host_group_id: Option<String>,
    pub logical_unit_number: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HostDetail {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HostGroupDetail {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VolumeGroupDetail {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_write_order_consistent: Option<bool>,
    pub protection_policy: Option<NamedRef>,
    #[serde(default)]
    pub volumes: Vec<NamedRef>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FilesystemDetail {
    pub id: String,
    pub name: Option<String>,
    pub nas_server_id: Option<String>,
    pub size_total: Option<u64>,
    pub description: Option<String>,
    pub access_policy: Option<String>,
    pub locking_policy: Option<String>,
    pub folder_rename_policy: Option<String>,
    pub is_smb_sync_writes_enabled: Option<bool>,
    pub is_smb_no_notify_enabled: Option<bool>,
    pub is_smb_notify_on_access_enabled: Option<bool>,
    pub is_smb_notify_on_write_enabled: Option<bool>,
    pub is_smb_op_locks_enabled: Option<bool>,
    pub smb_notify_on_change_dir_depth: Option<u64>,
    pub default_hard_limit: Option<u64>,
    pub default_soft_limit: Option<u64>,
    pub grace_period: Option<i64>,
    pub protection_policy: Option<NamedRef>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NasServerDetail {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub current_unix_directory_service: Option<String>,
    pub default_unix_user: Option<String>,
    pub default_windows_user: Option<String>,
    pub protection_policy: Option<NamedRef>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SmbShareDetail {
    pub id: String,
    pub name: Option<String>,
    pub file_system_id: Option<String>,
    pub path: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "is_ABE_enabled")]
    pub is_abe_enabled: Option<bool>,
    pub is_branch_cache_enabled: Option<bool>,
    pub is_continuous_availability_enabled: Option<bool>,
    pub is_encryption_enabled: Option<bool>,
    pub offline_availability: Option<String>,
    pub umask: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NfsExportDetail {
    pub id: String,
    pub name: Option<String>,
    pub file_system_id: Option<String>,
    pub path: Option<String>,
    pub description: Option<String>,
    pub default_access: Option<String>,
    #[serde(rename = "anonymous_UID")]
    pub anonymous_uid: Option<i64>,
    #[serde(rename = "anonymous_GID")]
    pub anonymous_gid: Option<i64>,
    #[serde(rename = "is_no_SUID")]
    pub is_no_suid: Option<bool>,
    #[serde(default)]
    pub no_access_hosts: Vec<String>,
    #[serde(default)]
    pub read_only_hosts: Vec<String>,
    #[serde(default)]
    pub read_only_root_hosts: Vec<String>,
    #[serde(default)]
    pub read_write_hosts: Vec<String>,
    #[serde(default)]
    pub read_write_root_hosts: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TreeQuotaDetail {
    pub id: String,
    pub file_system_id: Option<String>,
    pub path: Option<String>,
    pub description: Option<String>,
    pub hard_limit: Option<u64>,
    pub soft_limit: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserQuotaDetail {
    pub id: String,
    pub file_system_id: Option<String>,
    pub tree_quota_id: Option<String>,
    pub uid: Option<u64>,
    pub unix_name: Option<String>,
    pub windows_name: Option<String>,
    pub windows_sid: Option<String>,
    pub hard_limit: Option<u64>,
    pub soft_limit: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NetworkDetail {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub network_type: Option<String>,
    pub vlan_id: Option<u64>,
    pub mtu: Option<u64>,
    pub gateway: Option<String>,
    pub prefix_length: Option<u64>,
    pub cluster_mgmt_address: Option<String>,
    pub storage_discovery_address: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IpPortDetail {
    pub id: String,
    pub current_usages: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClusterDetail {
    pub id: String,
    pub name: Option<String>,
    pub physical_mtu: Option<u64>,
    pub management_address: Option<String>,
    pub state: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApplianceDetail {
    pub id: String,
    pub name: Option<String>,
    pub service_tag: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RemoteSupportDetail {
    pub id: String,
    #[serde(rename = "type")]
    pub support_type: Option<String>,
    pub proxy_address: Option<String>,
    pub proxy_port: Option<u64>,
    pub proxy_username: Option<String>,
    pub is_cloudiq_enabled: Option<bool>,
    pub is_rsc_enabled: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReplicationSessionDetail {
    pub id: String,
    pub state: Option<String>,
    pub role: Option<String>,
    pub resource_type: Option<String>,
    pub local_resource_id: Option<String>,
    pub remote_resource_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct JobDetail {
    pub id: String,
    pub state: Option<String>,
    pub progress_percentage: Option<u64>,
    pub response_body: Option<serde_json::Value>,
}
