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

//! An in-memory array standing in for the REST gateway, plus fixture
//! builders and a TaskHandle wired to it. Not every test binary uses every
//! fixture, hence the allow.
#![allow(dead_code)]

use powerjet::client::configuration::Configuration;
use powerjet::client::protection::Protection;
use powerjet::client::provisioning::Provisioning;
use powerjet::client::types::*;
use powerjet::client::{ApiError, ApiResult, ArrayHandles, Body};
use powerjet::handle::handle::TaskHandle;
use powerjet::output::NullOutputHandler;
use std::sync::{Arc, RwLock};

#[derive(Default)]
pub struct MockArray {
    pub volumes: RwLock<Vec<VolumeDetail>>,
    pub mappings: RwLock<Vec<HostVolumeMapping>>,
    pub hosts: RwLock<Vec<HostDetail>>,
    pub host_groups: RwLock<Vec<HostGroupDetail>>,
    pub volume_groups: RwLock<Vec<VolumeGroupDetail>>,
    pub performance_policies: RwLock<Vec<NamedRef>>,
    pub protection_policies: RwLock<Vec<NamedRef>>,
    pub filesystems: RwLock<Vec<FilesystemDetail>>,
    pub nas_servers: RwLock<Vec<NasServerDetail>>,
    pub smb_shares: RwLock<Vec<SmbShareDetail>>,
    pub nfs_exports: RwLock<Vec<NfsExportDetail>>,
    pub tree_quotas: RwLock<Vec<TreeQuotaDetail>>,
    pub user_quotas: RwLock<Vec<UserQuotaDetail>>,
    pub networks: RwLock<Vec<NetworkDetail>>,
    /// (network_id, port_id) pairs answering the ip_port lookup.
    pub network_ports: RwLock<Vec<(String, String)>>,
    pub clusters: RwLock<Vec<ClusterDetail>>,
    pub appliances: RwLock<Vec<ApplianceDetail>>,
    pub remote_support: RwLock<Vec<RemoteSupportDetail>>,
    pub sessions: RwLock<Vec<ReplicationSessionDetail>>,
    /// Job id the next modify_network/create_cluster/modify_remote_support
    /// call should pretend to start.
    pub job_to_return: RwLock<Option<String>>,
    /// Every mutating call, recorded as "method target serialized-body".
    pub calls: RwLock<Vec<String>>,
}

impl MockArray {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, method: &str, target: &str, body: Option<&Body>) {
        let serialized = body
            .map(|b| serde_json::to_string(b).unwrap())
            .unwrap_or_default();
        self.calls.write().unwrap().push(format!("{} {} {}", method, target, serialized).trim().to_string());
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls.read().unwrap().iter().any(|c| c.starts_with(prefix))
    }

    pub fn find_call(&self, prefix: &str) -> Option<String> {
        self.calls.read().unwrap().iter().find(|c| c.starts_with(prefix)).cloned()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

pub fn test_handle(api: &Arc<MockArray>) -> Arc<TaskHandle> {
    let handles = Arc::new(ArrayHandles {
        provisioning: api.clone(),
        protection: api.clone(),
        configuration: api.clone(),
    });
    Arc::new(TaskHandle::new(handles, Arc::new(NullOutputHandler)))
}

// fixture builders

pub fn named(id: &str, name: &str) -> NamedRef {
    NamedRef { id: id.to_string(), name: Some(name.to_string()) }
}

pub fn volume(id: &str, name: &str, size: u64) -> VolumeDetail {
    VolumeDetail {
        id: id.to_string(),
        name: Some(name.to_string()),
        size: Some(size),
        description: None,
        state: Some("Ready".to_string()),
        protection_policy: None,
        performance_policy: None,
        volume_groups: Vec::new(),
    }
}

pub fn mapping(volume_id: &str, host_id: &str, hlu: u64) -> HostVolumeMapping {
    HostVolumeMapping {
        id: format!("map-{}-{}", volume_id, host_id),
        volume_id: Some(volume_id.to_string()),
        host_id: Some(host_id.to_string()),
        host_group_id: None,
        logical_unit_number: Some(hlu),
    }
}

pub fn volume_group(id: &str, name: &str) -> VolumeGroupDetail {
    VolumeGroupDetail {
        id: id.to_string(),
        name: Some(name.to_string()),
        description: None,
        is_write_order_consistent: Some(false),
        protection_policy: None,
        volumes: Vec::new(),
    }
}

pub fn nas_server(id: &str, name: &str) -> NasServerDetail {
    NasServerDetail {
        id: id.to_string(),
        name: Some(name.to_string()),
        description: None,
        current_unix_directory_service: None,
        default_unix_user: None,
        default_windows_user: None,
        protection_policy: None,
    }
}

pub fn filesystem(id: &str, name: &str, nas_server_id: &str, size: u64) -> FilesystemDetail {
    FilesystemDetail {
        id: id.to_string(),
        name: Some(name.to_string()),
        nas_server_id: Some(nas_server_id.to_string()),
        size_total: Some(size),
        description: None,
        access_policy: None,
        locking_policy: None,
        folder_rename_policy: None,
        is_smb_sync_writes_enabled: None,
        is_smb_no_notify_enabled: None,
        is_smb_notify_on_access_enabled: None,
        is_smb_notify_on_write_enabled: None,
        is_smb_op_locks_enabled: None,
        smb_notify_on_change_dir_depth: None,
        default_hard_limit: None,
        default_soft_limit: None,
        grace_period: None,
        protection_policy: None,
    }
}

pub fn user_quota(id: &str, file_system_id: &str, uid: u64, hard: u64, soft: u64) -> UserQuotaDetail {
    UserQuotaDetail {
        id: id.to_string(),
        file_system_id: Some(file_system_id.to_string()),
        tree_quota_id: None,
        uid: Some(uid),
        unix_name: None,
        windows_name: None,
        windows_sid: None,
        hard_limit: Some(hard),
        soft_limit: Some(soft),
    }
}

pub fn session(id: &str, state: &str, local_resource_id: &str) -> ReplicationSessionDetail {
    ReplicationSessionDetail {
        id: id.to_string(),
        state: Some(state.to_string()),
        role: Some("Source".to_string()),
        resource_type: Some("volume".to_string()),
        local_resource_id: Some(local_resource_id.to_string()),
        remote_resource_id: None,
    }
}

pub fn network(id: &str, name: &str, mtu: u64) -> NetworkDetail {
    NetworkDetail {
        id: id.to_string(),
        name: Some(name.to_string()),
        network_type: Some("Management".to_string()),
        vlan_id: Some(0),
        mtu: Some(mtu),
        gateway: None,
        prefix_length: Some(24),
        cluster_mgmt_address: None,
        storage_discovery_address: None,
    }
}

pub fn appliance(id: &str, name: &str) -> ApplianceDetail {
    ApplianceDetail {
        id: id.to_string(),
        name: Some(name.to_string()),
        service_tag: None,
    }
}

pub fn cluster(id: &str, name: &str) -> ClusterDetail {
    ClusterDetail {
        id: id.to_string(),
        name: Some(name.to_string()),
        physical_mtu: Some(1500),
        management_address: Some("10.0.0.10".to_string()),
        state: Some("Configured".to_string()),
    }
}

pub fn remote_support(id: &str, support_type: &str) -> RemoteSupportDetail {
    RemoteSupportDetail {
        id: id.to_string(),
        support_type: Some(support_type.to_string()),
        proxy_address: None,
        proxy_port: None,
        proxy_username: None,
        is_cloudiq_enabled: Some(false),
        is_rsc_enabled: Some(false),
    }
}

fn by_id<T: Clone>(items: &RwLock<Vec<T>>, id: &str, get_id: fn(&T) -> &str) -> ApiResult<T> {
    items.read().unwrap().iter()
        .find(|item| get_id(item) == id)
        .cloned()
        .ok_or(ApiError::NotFound)
}

impl Provisioning for MockArray {
    fn get_volume(&self, id: &str) -> ApiResult<VolumeDetail> {
        by_id(&self.volumes, id, |v| &v.id)
    }

    fn get_volumes_by_name(&self, name: &str) -> ApiResult<Vec<VolumeDetail>> {
        Ok(self.volumes.read().unwrap().iter()
            .filter(|v| v.name.as_deref() == Some(name)).cloned().collect())
    }

    fn list_volumes(&self) -> ApiResult<Vec<VolumeDetail>> {
        Ok(self.volumes.read().unwrap().clone())
    }

    fn create_volume(&self, body: &Body) -> ApiResult<String> {
        self.record("create_volume", "", Some(body));
        let name = body.get("name").and_then(|v| v.as_str()).unwrap_or("unnamed");
        let size = body.get("size").and_then(|v| v.as_u64()).unwrap_or(0);
        self.volumes.write().unwrap().push(volume("vol-new", name, size));
        Ok("vol-new".to_string())
    }

    fn modify_volume(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.record("modify_volume", id, Some(body));
        Ok(())
    }

    fn delete_volume(&self, id: &str) -> ApiResult<()> {
        self.record("delete_volume", id, None);
        self.volumes.write().unwrap().retain(|v| v.id != id);
        Ok(())
    }

    fn attach_volume(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.record("attach_volume", id, Some(body));
        Ok(())
    }

    fn detach_volume(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.record("detach_volume", id, Some(body));
        Ok(())
    }

    fn get_volume_mappings(&self, volume_id: &str) -> ApiResult<Vec<HostVolumeMapping>> {
        Ok(self.mappings.read().unwrap().iter()
            .filter(|m| m.volume_id.as_deref() == Some(volume_id)).cloned().collect())
    }

    fn get_host(&self, id: &str) -> ApiResult<HostDetail> {
        by_id(&self.hosts, id, |h| &h.id)
    }

    fn get_hosts_by_name(&self, name: &str) -> ApiResult<Vec<HostDetail>> {
        Ok(self.hosts.read().unwrap().iter()
            .filter(|h| h.name.as_deref() == Some(name)).cloned().collect())
    }

    fn get_host_group(&self, id: &str) -> ApiResult<HostGroupDetail> {
        by_id(&self.host_groups, id, |g| &g.id)
    }

    fn get_host_groups_by_name(&self, name: &str) -> ApiResult<Vec<HostGroupDetail>> {
        Ok(self.host_groups.read().unwrap().iter()
            .filter(|g| g.name.as_deref() == Some(name)).cloned().collect())
    }

    fn get_volume_group(&self, id: &str) -> ApiResult<VolumeGroupDetail> {
        by_id(&self.volume_groups, id, |g| &g.id)
    }

    fn get_volume_groups_by_name(&self, name: &str) -> ApiResult<Vec<VolumeGroupDetail>> {
        Ok(self.volume_groups.read().unwrap().iter()
            .filter(|g| g.name.as_deref() == Some(name)).cloned().collect())
    }

    fn list_volume_groups(&self) -> ApiResult<Vec<VolumeGroupDetail>> {
        Ok(self.volume_groups.read().unwrap().clone())
    }

    fn create_volume_group(&self, body: &Body) -> ApiResult<String> {
        self.record("create_volume_group", "", Some(body));
        let name = body.get("name").and_then(|v| v.as_str()).unwrap_or("unnamed");
        self.volume_groups.write().unwrap().push(volume_group("vg-new", name));
        Ok("vg-new".to_string())
    }

    fn modify_volume_group(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.record("modify_volume_group", id, Some(body));
        Ok(())
    }

    fn delete_volume_group(&self, id: &str) -> ApiResult<()> {
        self.record("delete_volume_group", id, None);
        self.volume_groups.write().unwrap().retain(|g| g.id != id);
        Ok(())
    }

    fn add_volume_group_members(&self, id: &str, volume_ids: &[String]) -> ApiResult<()> {
        self.calls.write().unwrap().push(format!("add_volume_group_members {} {}", id, volume_ids.join(",")));
        Ok(())
    }

    fn remove_volume_group_members(&self, id: &str, volume_ids: &[String]) -> ApiResult<()> {
        self.calls.write().unwrap().push(format!("remove_volume_group_members {} {}", id, volume_ids.join(",")));
        Ok(())
    }

    fn get_performance_policies_by_name(&self, name: &str) -> ApiResult<Vec<NamedRef>> {
        Ok(self.performance_policies.read().unwrap().iter()
            .filter(|p| p.name.as_deref() == Some(name)).cloned().collect())
    }

    fn get_filesystem(&self, id: &str) -> ApiResult<FilesystemDetail> {
        by_id(&self.filesystems, id, |f| &f.id)
    }

    fn get_filesystems_by_name(&self, name: &str, nas_server_id: &str) -> ApiResult<Vec<FilesystemDetail>> {
        Ok(self.filesystems.read().unwrap().iter()
            .filter(|f| f.name.as_deref() == Some(name) && f.nas_server_id.as_deref() == Some(nas_server_id))
            .cloned().collect())
    }

    fn list_filesystems(&self) -> ApiResult<Vec<FilesystemDetail>> {
        Ok(self.filesystems.read().unwrap().clone())
    }

    fn create_filesystem(&self, body: &Body) -> ApiResult<String> {
        self.record("create_filesystem", "", Some(body));
        let name = body.get("name").and_then(|v| v.as_str()).unwrap_or("unnamed");
        let nas = body.get("nas_server_id").and_then(|v| v.as_str()).unwrap_or("nas-?");
        let size = body.get("size_total").and_then(|v| v.as_u64()).unwrap_or(0);
        self.filesystems.write().unwrap().push(filesystem("fs-new", name, nas, size));
        Ok("fs-new".to_string())
    }

    fn modify_filesystem(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.record("modify_filesystem", id, Some(body));
        Ok(())
    }

    fn delete_filesystem(&self, id: &str) -> ApiResult<()> {
        self.record("delete_filesystem", id, None);
        self.filesystems.write().unwrap().retain(|f| f.id != id);
        Ok(())
    }

    fn get_nas_server(&self, id: &str) -> ApiResult<NasServerDetail> {
        by_id(&self.nas_servers, id, |n| &n.id)
    }

    fn get_nas_servers_by_name(&self, name: &str) -> ApiResult<Vec<NasServerDetail>> {
        Ok(self.nas_servers.read().unwrap().iter()
            .filter(|n| n.name.as_deref() == Some(name)).cloned().collect())
    }

    fn list_nas_servers(&self) -> ApiResult<Vec<NasServerDetail>> {
        Ok(self.nas_servers.read().unwrap().clone())
    }

    fn modify_nas_server(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.record("modify_nas_server", id, Some(body));
        Ok(())
    }

    fn get_smb_share(&self, id: &str) -> ApiResult<SmbShareDetail> {
        by_id(&self.smb_shares, id, |s| &s.id)
    }

    fn get_smb_shares_by_name(&self, name: &str) -> ApiResult<Vec<SmbShareDetail>> {
        Ok(self.smb_shares.read().unwrap().iter()
            .filter(|s| s.name.as_deref() == Some(name)).cloned().collect())
    }

    fn create_smb_share(&self, body: &Body) -> ApiResult<String> {
        self.record("create_smb_share", "", Some(body));
        self.smb_shares.write().unwrap().push(SmbShareDetail {
            id: "smb-new".to_string(),
            name: body.get("name").and_then(|v| v.as_str()).map(|s| s.to_string()),
            file_system_id: body.get("file_system_id").and_then(|v| v.as_str()).map(|s| s.to_string()),
            path: body.get("path").and_then(|v| v.as_str()).map(|s| s.to_string()),
            description: None,
            is_abe_enabled: None,
            is_branch_cache_enabled: None,
            is_continuous_availability_enabled: None,
            is_encryption_enabled: None,
            offline_availability: None,
            umask: None,
        });
        Ok("smb-new".to_string())
    }

    fn modify_smb_share(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.record("modify_smb_share", id, Some(body));
        Ok(())
    }

    fn delete_smb_share(&self, id: &str) -> ApiResult<()> {
        self.record("delete_smb_share", id, None);
        self.smb_shares.write().unwrap().retain(|s| s.id != id);
        Ok(())
    }

    fn get_nfs_export(&self, id: &str) -> ApiResult<NfsExportDetail> {
        by_id(&self.nfs_exports, id, |e| &e.id)
    }

    fn get_nfs_exports_by_name(&self, name: &str) -> ApiResult<Vec<NfsExportDetail>> {
        Ok(self.nfs_exports.read().unwrap().iter()
            .filter(|e| e.name.as_deref() == Some(name)).cloned().collect())
    }

    fn create_nfs_export(&self, body: &Body) -> ApiResult<String> {
        self.record("create_nfs_export", "", Some(body));
        self.nfs_exports.write().unwrap().push(NfsExportDetail {
            id: "nfs-new".to_string(),
            name: body.get("name").and_then(|v| v.as_str()).map(|s| s.to_string()),
            file_system_id: body.get("file_system_id").and_then(|v| v.as_str()).map(|s| s.to_string()),
            path: body.get("path").and_then(|v| v.as_str()).map(|s| s.to_string()),
            description: None,
            default_access: None,
            anonymous_uid: None,
            anonymous_gid: None,
            is_no_suid: None,
            no_access_hosts: Vec::new(),
            read_only_hosts: Vec::new(),
            read_only_root_hosts: Vec::new(),
            read_write_hosts: Vec::new(),
            read_write_root_hosts: Vec::new(),
        });
        Ok("nfs-new".to_string())
    }

    fn modify_nfs_export(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.record("modify_nfs_export", id, Some(body));
        Ok(())
    }

    fn delete_nfs_export(&self, id: &str) -> ApiResult<()> {
        self.record("delete_nfs_export", id, None);
        self.nfs_exports.write().unwrap().retain(|e| e.id != id);
        Ok(())
    }

    fn get_tree_quota(&self, id: &str) -> ApiResult<TreeQuotaDetail> {
        by_id(&self.tree_quotas, id, |q| &q.id)
    }

    fn find_tree_quotas(&self, file_system_id: &str, path: &str) -> ApiResult<Vec<TreeQuotaDetail>> {
        Ok(self.tree_quotas.read().unwrap().iter()
            .filter(|q| q.file_system_id.as_deref() == Some(file_system_id) && q.path.as_deref() == Some(path))
            .cloned().collect())
    }

    fn create_tree_quota(&self, body: &Body) -> ApiResult<String> {
        self.record("create_tree_quota", "", Some(body));
        self.tree_quotas.write().unwrap().push(TreeQuotaDetail {
            id: "tq-new".to_string(),
            file_system_id: body.get("file_system_id").and_then(|v| v.as_str()).map(|s| s.to_string()),
            path: body.get("path").and_then(|v| v.as_str()).map(|s| s.to_string()),
            description: None,
            hard_limit: body.get("hard_limit").and_then(|v| v.as_u64()),
            soft_limit: body.get("soft_limit").and_then(|v| v.as_u64()),
        });
        Ok("tq-new".to_string())
    }

    fn modify_tree_quota(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.record("modify_tree_quota", id, Some(body));
        Ok(())
    }

    fn delete_tree_quota(&self, id: &str) -> ApiResult<()> {
        self.record("delete_tree_quota", id, None);
        self.tree_quotas.write().unwrap().retain(|q| q.id != id);
        Ok(())
    }

    fn get_user_quota(&self, id: &str) -> ApiResult<UserQuotaDetail> {
        by_id(&self.user_quotas, id, |q| &q.id)
    }

    fn find_user_quotas(&self, file_system_id: &str, key: &str, value: &str) -> ApiResult<Vec<UserQuotaDetail>> {
        Ok(self.user_quotas.read().unwrap().iter()
            .filter(|q| q.file_system_id.as_deref() == Some(file_system_id))
            .filter(|q| match key {
                "uid" => q.uid.map(|u| u.to_string()).as_deref() == Some(value),
                "unix_name" => q.unix_name.as_deref() == Some(value),
                "windows_name" => q.windows_name.as_deref() == Some(value),
                "windows_sid" => q.windows_sid.as_deref() == Some(value),
                _ => false,
            })
            .cloned().collect())
    }

    fn create_user_quota(&self, body: &Body) -> ApiResult<String> {
        self.record("create_user_quota", "", Some(body));
        self.user_quotas.write().unwrap().push(UserQuotaDetail {
            id: "uq-new".to_string(),
            file_system_id: body.get("file_system_id").and_then(|v| v.as_str()).map(|s| s.to_string()),
            tree_quota_id: None,
            uid: body.get("uid").and_then(|v| v.as_u64()),
            unix_name: body.get("unix_name").and_then(|v| v.as_str()).map(|s| s.to_string()),
            windows_name: body.get("windows_name").and_then(|v| v.as_str()).map(|s| s.to_string()),
            windows_sid: body.get("windows_sid").and_then(|v| v.as_str()).map(|s| s.to_string()),
            hard_limit: body.get("hard_limit").and_then(|v| v.as_u64()),
            soft_limit: body.get("soft_limit").and_then(|v| v.as_u64()),
        });
        Ok("uq-new".to_string())
    }

    fn modify_user_quota(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.record("modify_user_quota", id, Some(body));
        Ok(())
    }
}

impl Protection for MockArray {
    fn get_protection_policy(&self, id: &str) -> ApiResult<NamedRef> {
        by_id(&self.protection_policies, id, |p| &p.id)
    }

    fn get_protection_policies_by_name(&self, name: &str) -> ApiResult<Vec<NamedRef>> {
        Ok(self.protection_policies.read().unwrap().iter()
            .filter(|p| p.name.as_deref() == Some(name)).cloned().collect())
    }

    fn get_replication_session(&self, id: &str) -> ApiResult<ReplicationSessionDetail> {
        by_id(&self.sessions, id, |s| &s.id)
    }

    fn get_replication_sessions_by_resource(&self, local_resource_id: &str) -> ApiResult<Vec<ReplicationSessionDetail>> {
        Ok(self.sessions.read().unwrap().iter()
            .filter(|s| s.local_resource_id.as_deref() == Some(local_resource_id)).cloned().collect())
    }

    fn list_replication_sessions(&self) -> ApiResult<Vec<ReplicationSessionDetail>> {
        Ok(self.sessions.read().unwrap().clone())
    }

    fn sync_replication_session(&self, id: &str) -> ApiResult<()> {
        self.record("sync_replication_session", id, None);
        Ok(())
    }

    fn pause_replication_session(&self, id: &str) -> ApiResult<()> {
        self.record("pause_replication_session", id, None);
        Ok(())
    }

    fn resume_replication_session(&self, id: &str) -> ApiResult<()> {
        self.record("resume_replication_session", id, None);
        Ok(())
    }

    fn failover_replication_session(&self, id: &str) -> ApiResult<()> {
        self.record("failover_replication_session", id, None);
        Ok(())
    }

    fn reprotect_replication_session(&self, id: &str) -> ApiResult<()> {
        self.record("reprotect_replication_session", id, None);
        Ok(())
    }
}

impl Configuration for MockArray {
    fn get_network(&self, id: &str) -> ApiResult<NetworkDetail> {
        by_id(&self.networks, id, |n| &n.id)
    }

    fn get_networks_by_name(&self, name: &str) -> ApiResult<Vec<NetworkDetail>> {
        Ok(self.networks.read().unwrap().iter()
            .filter(|n| n.name.as_deref() == Some(name)).cloned().collect())
    }

    fn list_networks(&self) -> ApiResult<Vec<NetworkDetail>> {
        Ok(self.networks.read().unwrap().clone())
    }

    fn modify_network(&self, id: &str, body: &Body) -> ApiResult<Option<String>> {
        self.record("modify_network", id, Some(body));
        Ok(self.job_to_return.read().unwrap().clone())
    }

    fn get_ip_ports_by_network(&self, network_id: &str) -> ApiResult<Vec<IpPortDetail>> {
        Ok(self.network_ports.read().unwrap().iter()
            .filter(|(network, _)| network == network_id)
            .map(|(_, port)| IpPortDetail { id: port.clone(), current_usages: None })
            .collect())
    }

    fn get_clusters(&self) -> ApiResult<Vec<ClusterDetail>> {
        Ok(self.clusters.read().unwrap().clone())
    }

    fn create_cluster(&self, body: &Body) -> ApiResult<Option<String>> {
        self.record("create_cluster", "", Some(body));
        let name = body.get("name").and_then(|v| v.as_str()).unwrap_or("unnamed");
        self.clusters.write().unwrap().push(cluster("cl-new", name));
        Ok(self.job_to_return.read().unwrap().clone())
    }

    fn modify_cluster(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.record("modify_cluster", id, Some(body));
        Ok(())
    }

    fn get_appliances_by_name(&self, name: &str) -> ApiResult<Vec<ApplianceDetail>> {
        Ok(self.appliances.read().unwrap().iter()
            .filter(|a| a.name.as_deref() == Some(name)).cloned().collect())
    }

    fn get_remote_support(&self, id: &str) -> ApiResult<RemoteSupportDetail> {
        by_id(&self.remote_support, id, |r| &r.id)
    }

    fn list_remote_support(&self) -> ApiResult<Vec<RemoteSupportDetail>> {
        Ok(self.remote_support.read().unwrap().clone())
    }

    fn modify_remote_support(&self, id: &str, body: &Body) -> ApiResult<Option<String>> {
        self.record("modify_remote_support", id, Some(body));
        Ok(self.job_to_return.read().unwrap().clone())
    }

    fn verify_remote_support(&self, id: &str) -> ApiResult<()> {
        self.record("verify_remote_support", id, None);
        Ok(())
    }

    fn send_test_alert(&self, id: &str) -> ApiResult<()> {
        self.record("send_test_alert", id, None);
        Ok(())
    }

    fn get_job(&self, id: &str) -> ApiResult<JobDetail> {
        Ok(JobDetail {
            id: id.to_string(),
            state: Some("COMPLETED".to_string()),
            progress_percentage: Some(100),
            response_body: None,
        })
    }

    fn wait_for_job(&self, id: &str) -> ApiResult<JobDetail> {
        self.record("wait_for_job", id, None);
        self.get_job(id)
    }
}
