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

//! Provisioning sub-client: block and file resources.
//!
//! Expressed as a trait so module tests can substitute a recording mock for
//! the HTTP implementation.

use crate::client::Body;
use crate::client::gateway::{created_id, ApiResult, Gateway};
use crate::client::types::*;
use serde_json::Value;
use std::sync::Arc;

const VOLUME_SELECT: &str = "id,name,size,description,state,protection_policy(id,name),performance_policy(id,name),volume_groups(id,name)";
const VOLUME_GROUP_SELECT: &str = "id,name,description,is_write_order_consistent,protection_policy(id,name),volumes(id,name)";
const FILESYSTEM_SELECT: &str = "id,name,nas_server_id,size_total,description,access_policy,locking_policy,folder_rename_policy,is_smb_sync_writes_enabled,is_smb_no_notify_enabled,is_smb_notify_on_access_enabled,is_smb_notify_on_write_enabled,is_smb_op_locks_enabled,smb_notify_on_change_dir_depth,default_hard_limit,default_soft_limit,grace_period,protection_policy(id,name)";
const NAS_SERVER_SELECT: &str = "id,name,description,current_unix_directory_service,default_unix_user,default_windows_user,protection_policy(id,name)";

pub trait Provisioning: Send + Sync {
    // volumes
    fn get_volume(&self, id: &str) -> ApiResult<VolumeDetail>;
    fn get_volumes_by_name(&self, name: &str) -> ApiResult<Vec<VolumeDetail>>;
    fn list_volumes(&self) -> ApiResult<Vec<VolumeDetail>>;
    fn create_volume(&self, body: &Body) -> ApiResult<String>;
    fn modify_volume(&self, id: &str, body: &Body) -> ApiResult<()>;
    fn delete_volume(&self, id: &str) -> ApiResult<()>;
    fn attach_volume(&self, id: &str, body: &Body) -> ApiResult<()>;
    fn detach_volume(&self, id: &str, body: &Body) -> ApiResult<()>;
    fn get_volume_mappings(&self, volume_id: &str) -> ApiResult<Vec<HostVolumeMapping>>;

    // hosts and host groups (lookup only; host lifecycle is out of scope)
    fn get_host(&self, id: &str) -> ApiResult<HostDetail>;
    fn get_hosts_by_name(&self, name: &str) -> ApiResult<Vec<HostDetail>>;
    fn get_host_group(&self, id: &str) -> ApiResult<HostGroupDetail>;
    fn get_host_groups_by_name(&self, name: &str) -> ApiResult<Vec<HostGroupDetail>>;

    // volume groups
    fn get_volume_group(&self, id: &str) -> ApiResult<VolumeGroupDetail>;
    fn get_volume_groups_by_name(&self, name: &str) -> ApiResult<Vec<VolumeGroupDetail>>;
    fn list_volume_groups(&self) -> ApiResult<Vec<VolumeGroupDetail>>;
    fn create_volume_group(&self, body: &Body) -> ApiResult<String>;
    fn modify_volume_group(&self, id: &str, body: &Body) -> ApiResult<()>;
    fn delete_volume_group(&self, id: &str) -> ApiResult<()>;
    fn add_volume_group_members(&self, id: &str, volume_ids: &[String]) -> ApiResult<()>;
    fn remove_volume_group_members(&self, id: &str, volume_ids: &[String]) -> ApiResult<()>;

    // performance policies
    fn get_performance_policies_by_name(&self, name: &str) -> ApiResult<Vec<NamedRef>>;

    // filesystems
    fn get_filesystem(&self, id: &str) -> ApiResult<FilesystemDetail>;
    fn get_filesystems_by_name(&self, name: &str, nas_server_id: &str) -> ApiResult<Vec<FilesystemDetail>>;
    fn list_filesystems(&self) -> ApiResult<Vec<FilesystemDetail>>;
    fn create_filesystem(&self, body: &Body) -> ApiResult<String>;
    fn modify_filesystem(&self, id: &str, body: &Body) -> ApiResult<()>;
    fn delete_filesystem(&self, id: &str) -> ApiResult<()>;

    // nas servers (modify only; create/delete is not exposed by the array
    // management path this tool drives)
    fn get_nas_server(&self, id: &str) -> ApiResult<NasServerDetail>;
    fn get_nas_servers_by_name(&self, name: &str) -> ApiResult<Vec<NasServerDetail>>;
    fn list_nas_servers(&self) -> ApiResult<Vec<NasServerDetail>>;
    fn modify_nas_server(&self, id: &str, body: &Body) -> ApiResult<()>;

    // smb shares
    fn get_smb_share(&self, id: &str) -> ApiResult<SmbShareDetail>;
    fn get_smb_shares_by_name(&self, name: &str) -> ApiResult<Vec<SmbShareDetail>>;
    fn create_smb_share(&self, body: &Body) -> ApiResult<String>;
    fn modify_smb_share(&self, id: &str, body: &Body) -> ApiResult<()>;
    fn delete_smb_share(&self, id: &str) -> ApiResult<()>;

    // nfs exports
    fn get_nfs_export(&self, id: &str) -> ApiResult<NfsExportDetail>;
    fn get_nfs_exports_by_name(&self, name: &str) -> ApiResult<Vec<NfsExportDetail>>;
    fn create_nfs_export(&self, body: &Body) -> ApiResult<String>;
    fn modify_nfs_export(&self, id: &str, body: &Body) -> ApiResult<()>;
    fn delete_nfs_export(&self, id: &str) -> ApiResult<()>;

    // quotas
    fn get_tree_quota(&self, id: &str) -> ApiResult<TreeQuotaDetail>;
    fn find_tree_quotas(&self, file_system_id: &str, path: &str) -> ApiResult<Vec<TreeQuotaDetail>>;
    fn create_tree_quota(&self, body: &Body) -> ApiResult<String>;
    fn modify_tree_quota(&self, id: &str, body: &Body) -> ApiResult<()>;
    fn delete_tree_quota(&self, id: &str) -> ApiResult<()>;
    fn get_user_quota(&self, id: &str) -> ApiResult<UserQuotaDetail>;
    fn find_user_quotas(&self, file_system_id: &str, key: &str, value: &str) -> ApiResult<Vec<UserQuotaDetail>>;
    fn create_user_quota(&self, body: &Body) -> ApiResult<String>;
    fn modify_user_quota(&self, id: &str, body: &Body) -> ApiResult<()>;
}

pub struct HttpProvisioning {
    gateway: Arc<Gateway>,
}

impl HttpProvisioning {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    fn to_value(body: &Body) -> Value {
        serde_json::to_value(body).unwrap_or(Value::Null)
    }
}

impl Provisioning for HttpProvisioning {
    fn get_volume(&self, id: &str) -> ApiResult<VolumeDetail> {
        self.gateway.get(&format!("/volume/{}?select={}", id, VOLUME_SELECT))
    }

    fn get_volumes_by_name(&self, name: &str) -> ApiResult<Vec<VolumeDetail>> {
        self.gateway.get_list("/volume", &[
            ("select", VOLUME_SELECT.to_string()),
            ("name", format!("eq.{}", name)),
        ])
    }

    fn list_volumes(&self) -> ApiResult<Vec<VolumeDetail>> {
        self.gateway.get_list("/volume", &[("select", VOLUME_SELECT.to_string())])
    }

    fn create_volume(&self, body: &Body) -> ApiResult<String> {
        let response = self.gateway.post("/volume", &Self::to_value(body))?;
        created_id(&response)
    }

    fn modify_volume(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.gateway.patch(&format!("/volume/{}", id), &Self::to_value(body))?;
        Ok(())
    }

    fn delete_volume(&self, id: &str) -> ApiResult<()> {
        self.gateway.delete(&format!("/volume/{}", id), None)
    }

    fn attach_volume(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.gateway.post(&format!("/volume/{}/attach", id), &Self::to_value(body))?;
        Ok(())
    }

    fn detach_volume(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.gateway.post(&format!("/volume/{}/detach", id), &Self::to_value(body))?;
        Ok(())
    }

    fn get_volume_mappings(&self, volume_id: &str) -> ApiResult<Vec<HostVolumeMapping>> {
        self.gateway.get_list("/host_volume_mapping", &[
            ("select", String::from("id,volume_id,host_id,host_group_id,logical_unit_number")),
            ("volume_id", format!("eq.{}", volume_id)),
        ])
    }

    fn get_host(&self, id: &str) -> ApiResult<HostDetail> {
        self.gateway.get(&format!("/host/{}", id))
    }

    fn get_hosts_by_name(&self, name: &str) -> ApiResult<Vec<HostDetail>> {
        self.gateway.get_list("/host", &[("name", format!("eq.{}", name))])
    }

    fn get_host_group(&self, id: &str) -> ApiResult<HostGroupDetail> {
        self.gateway.get(&format!("/host_group/{}", id))
    }

    fn get_host_groups_by_name(&self, name: &str) -> ApiResult<Vec<HostGroupDetail>> {
        self.gateway.get_list("/host_group", &[("name", format!("eq.{}", name))])
    }

    fn get_volume_group(&self, id: &str) -> ApiResult<VolumeGroupDetail> {
        self.gateway.get(&format!("/volume_group/{}?select={}", id, VOLUME_GROUP_SELECT))
    }

    fn get_volume_groups_by_name(&self, name: &str) -> ApiResult<Vec<VolumeGroupDetail>> {
        self.gateway.get_list("/volume_group", &[
            ("select", VOLUME_GROUP_SELECT.to_string()),
            ("name", format!("eq.{}", name)),
        ])
    }

    fn list_volume_groups(&self) -> ApiResult<Vec<VolumeGroupDetail>> {
        self.gateway.get_list("/volume_group", &[("select", VOLUME_GROUP_SELECT.to_string())])
    }

    fn create_volume_group(&self, body: &Body) -> ApiResult<String> {
        let response = self.gateway.post("/volume_group", &Self::to_value(body))?;
        created_id(&response)
    }

    fn modify_volume_group(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.gateway.patch(&format!("/volume_group/{}", id), &Self::to_value(body))?;
        Ok(())
    }

    fn delete_volume_group(&self, id: &str) -> ApiResult<()> {
        self.gateway.delete(&format!("/volume_group/{}", id), None)
    }

    fn add_volume_group_members(&self, id: &str, volume_ids: &[String]) -> ApiResult<()> {
        let body = serde_json::json!({ "volume_ids": volume_ids });
        self.gateway.post(&format!("/volume_group/{}/add_members", id), &body)?;
        Ok(())
    }

    fn remove_volume_group_members(&self, id: &str, volume_ids: &[String]) -> ApiResult<()> {
        let body = serde_json::json!({ "volume_ids": volume_ids });
        self.gateway.post(&format!("/volume_group/{}/remove_members", id), &body)?;
        Ok(())
    }

    fn get_performance_policies_by_name(&self, name: &str) -> ApiResult<Vec<NamedRef>> {
        self.gateway.get_list("/performance_policy", &[("name", format!("eq.{}", name))])
    }

    fn get_filesystem(&self, id: &str) -> ApiResult<FilesystemDetail> {
        self.gateway.get(&format!("/file_system/{}?select={}", id, FILESYSTEM_SELECT))
    }

    fn get_filesystems_by_name(&self, name: &str, nas_server_id: &str) -> ApiResult<Vec<FilesystemDetail>> {
        self.gateway.get_list("/file_system", &[
            ("select", FILESYSTEM_SELECT.to_string()),
            ("name", format!("eq.{}", name)),
            ("nas_server_id", format!("eq.{}", nas_server_id)),
        ])
    }

    fn list_filesystems(&self) -> ApiResult<Vec<FilesystemDetail>> {
        self.gateway.get_list("/file_system", &[("select", FILESYSTEM_SELECT.to_string())])
    }

    fn create_filesystem(&self, body: &Body) -> ApiResult<String> {
        let response = self.gateway.post("/file_system", &Self::to_value(body))?;
        created_id(&response)
    }

    fn modify_filesystem(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.gateway.patch(&format!("/file_system/{}", id), &Self::to_value(body))?;
        Ok(())
    }

    fn delete_filesystem(&self, id: &str) -> ApiResult<()> {
        self.gateway.delete(&format!("/file_system/{}", id), None)
    }

    fn get_nas_server(&self, id: &str) -> ApiResult<NasServerDetail> {
        self.gateway.get(&format!("/nas_server/{}?select={}", id, NAS_SERVER_SELECT))
    }

    fn get_nas_servers_by_name(&self, name: &str) -> ApiResult<Vec<NasServerDetail>> {
        self.gateway.get_list("/nas_server", &[
            ("select", NAS_SERVER_SELECT.to_string()),
            ("name", format!("eq.{}", name)),
        ])
    }

    fn list_nas_servers(&self) -> ApiResult<Vec<NasServerDetail>> {
        self.gateway.get_list("/nas_server", &[("select", NAS_SERVER_SELECT.to_string())])
    }

    fn modify_nas_server(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.gateway.patch(&format!("/nas_server/{}", id), &Self::to_value(body))?;
        Ok(())
    }

    fn get_smb_share(&self, id: &str) -> ApiResult<SmbShareDetail> {
        self.gateway.get(&format!("/smb_share/{}?select=*", id))
    }

    fn get_smb_shares_by_name(&self, name: &str) -> ApiResult<Vec<SmbShareDetail>> {
        self.gateway.get_list("/smb_share", &[
            ("select", String::from("*")),
            ("name", format!("eq.{}", name)),
        ])
    }

    fn create_smb_share(&self, body: &Body) -> ApiResult<String> {
        let response = self.gateway.post("/smb_share", &Self::to_value(body))?;
        created_id(&response)
    }

    fn modify_smb_share(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.gateway.patch(&format!("/smb_share/{}", id), &Self::to_value(body))?;
        Ok(())
    }

    fn delete_smb_share(&self, id: &str) -> ApiResult<()> {
        self.gateway.delete(&format!("/smb_share/{}", id), None)
    }

    fn get_nfs_export(&self, id: &str) -> ApiResult<NfsExportDetail> {
        self.gateway.get(&format!("/nfs_export/{}?select=*", id))
    }

    fn get_nfs_exports_by_name(&self, name: &str) -> ApiResult<Vec<NfsExportDetail>> {
        self.gateway.get_list("/nfs_export", &[
            ("select", String::from("*")),
            ("name", format!("eq.{}", name)),
        ])
    }

    fn create_nfs_export(&self, body: &Body) -> ApiResult<String> {
        let response = self.gateway.post("/nfs_export", &Self::to_value(body))?;
        created_id(&response)
    }

    fn modify_nfs_export(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.gateway.patch(&format!("/nfs_export/{}", id), &Self::to_value(body))?;
        Ok(())
    }

    fn delete_nfs_export(&self, id: &str) -> ApiResult<()> {
        self.gateway.delete(&format!("/nfs_export/{}", id), None)
    }

    fn get_tree_quota(&self, id: &str) -> ApiResult<TreeQuotaDetail> {
        self.gateway.get(&format!("/file_tree_quota/{}?select=*", id))
    }

    fn find_tree_quotas(&self, file_system_id: &str, path: &str) -> ApiResult<Vec<TreeQuotaDetail>> {
        self.gateway.get_list("/file_tree_quota", &[
            ("select", String::from("*")),
            ("file_system_id", format!("eq.{}", file_system_id)),
            ("path", format!("eq.{}", path)),
        ])
    }

    fn create_tree_quota(&self, body: &Body) -> ApiResult<String> {
        let response = self.gateway.post("/file_tree_quota", &Self::to_value(body))?;
        created_id(&response)
    }

    fn modify_tree_quota(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.gateway.patch(&format!("/file_tree_quota/{}", id), &Self::to_value(body))?;
        Ok(())
    }

    fn delete_tree_quota(&self, id: &str) -> ApiResult<()> {
        self.gateway.delete(&format!("/file_tree_quota/{}", id), None)
    }

    fn get_user_quota(&self, id: &str) -> ApiResult<UserQuotaDetail> {
        self.gateway.get(&format!("/file_user_quota/{}?select=*", id))
    }

    fn find_user_quotas(&self, file_system_id: &str, key: &str, value: &str) -> ApiResult<Vec<UserQuotaDetail>> {
        self.gateway.get_list("/file_user_quota", &[
            ("select", String::from("*")),
            ("file_system_id", format!("eq.{}", file_system_id)),
            (key, format!("eq.{}", value)),
        ])
    }

    fn create_user_quota(&self, body: &Body) -> ApiResult<String> {
        let response = self.gateway.post("/file_user_quota", &Self::to_value(body))?;
        created_id(&response)
    }

    fn modify_user_quota(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.gateway.patch(&format!("/file_user_quota/{}", id), &Self::to_value(body))?;
        Ok(())
    }
}
