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

//! Configuration sub-client: cluster, networks, appliances, remote support
//! and the job resource that backs long-running configuration calls.

use crate::client::Body;
use crate::client::gateway::{job_id, ApiResult, Gateway};
use crate::client::types::{ApplianceDetail, ClusterDetail, IpPortDetail, JobDetail, NetworkDetail, RemoteSupportDetail};
use serde_json::Value;
use std::sync::Arc;

pub trait Configuration: Send + Sync {
    fn get_network(&self, id: &str) -> ApiResult<NetworkDetail>;
    fn get_networks_by_name(&self, name: &str) -> ApiResult<Vec<NetworkDetail>>;
    fn list_networks(&self) -> ApiResult<Vec<NetworkDetail>>;
    /// Management network changes run as an array-side job; the returned
    /// id, when present, must be waited on before the change is visible.
    fn modify_network(&self, id: &str, body: &Body) -> ApiResult<Option<String>>;
    fn get_ip_ports_by_network(&self, network_id: &str) -> ApiResult<Vec<IpPortDetail>>;

    fn get_clusters(&self) -> ApiResult<Vec<ClusterDetail>>;
    fn create_cluster(&self, body: &Body) -> ApiResult<Option<String>>;
    fn modify_cluster(&self, id: &str, body: &Body) -> ApiResult<()>;
    fn get_appliances_by_name(&self, name: &str) -> ApiResult<Vec<ApplianceDetail>>;

    fn get_remote_support(&self, id: &str) -> ApiResult<RemoteSupportDetail>;
    fn list_remote_support(&self) -> ApiResult<Vec<RemoteSupportDetail>>;
    fn modify_remote_support(&self, id: &str, body: &Body) -> ApiResult<Option<String>>;
    fn verify_remote_support(&self, id: &str) -> ApiResult<()>;
    fn send_test_alert(&self, id: &str) -> ApiResult<()>;

    fn get_job(&self, id: &str) -> ApiResult<JobDetail>;
    fn wait_for_job(&self, id: &str) -> ApiResult<JobDetail>;
}

pub struct HttpConfiguration {
    gateway: Arc<Gateway>,
}

impl HttpConfiguration {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    fn to_value(body: &Body) -> Value {
        serde_json::to_value(body).unwrap_or(Value::Null)
    }
}

impl Configuration for HttpConfiguration {
    fn get_network(&self, id: &str) -> ApiResult<NetworkDetail> {
        self.gateway.get(&format!("/network/{}?select=*", id))
    }

    fn get_networks_by_name(&self, name: &str) -> ApiResult<Vec<NetworkDetail>> {
        self.gateway.get_list("/network", &[
            ("select", String::from("*")),
            ("name", format!("eq.{}", name)),
        ])
    }

    fn list_networks(&self) -> ApiResult<Vec<NetworkDetail>> {
        self.gateway.get_list("/network", &[("select", String::from("*"))])
    }

    fn modify_network(&self, id: &str, body: &Body) -> ApiResult<Option<String>> {
        let response = self.gateway.patch(&format!("/network/{}", id), &Self::to_value(body))?;
        Ok(job_id(&response))
    }

    fn get_ip_ports_by_network(&self, network_id: &str) -> ApiResult<Vec<IpPortDetail>> {
        self.gateway.get_list("/ip_port", &[
            ("select", String::from("*")),
            ("network_id", format!("eq.{}", network_id)),
        ])
    }

    fn get_clusters(&self) -> ApiResult<Vec<ClusterDetail>> {
        self.gateway.get_list("/cluster", &[("select", String::from("*"))])
    }

    fn create_cluster(&self, body: &Body) -> ApiResult<Option<String>> {
        let response = self.gateway.post("/cluster", &Self::to_value(body))?;
        Ok(job_id(&response))
    }

    fn modify_cluster(&self, id: &str, body: &Body) -> ApiResult<()> {
        self.gateway.patch(&format!("/cluster/{}", id), &Self::to_value(body))?;
        Ok(())
    }

    fn get_appliances_by_name(&self, name: &str) -> ApiResult<Vec<ApplianceDetail>> {
        self.gateway.get_list("/appliance", &[("name", format!("eq.{}", name))])
    }

    fn get_remote_support(&self, id: &str) -> ApiResult<RemoteSupportDetail> {
        self.gateway.get(&format!("/remote_support/{}?select=*", id))
    }

    fn list_remote_support(&self) -> ApiResult<Vec<RemoteSupportDetail>> {
        self.gateway.get_list("/remote_support", &[("select", String::from("*"))])
    }

    fn modify_remote_support(&self, id: &str, body: &Body) -> ApiResult<Option<String>> {
        let response = self.gateway.patch(&format!("/remote_support/{}", id), &Self::to_value(body))?;
        Ok(job_id(&response))
    }

    fn verify_remote_support(&self, id: &str) -> ApiResult<()> {
        self.gateway.post(&format!("/remote_support/{}/verify", id), &serde_json::json!({}))?;
        Ok(())
    }

    fn send_test_alert(&self, id: &str) -> ApiResult<()> {
        self.gateway.post(&format!("/remote_support/{}/send_test_alert", id), &serde_json::json!({}))?;
        Ok(())
    }

    fn get_job(&self, id: &str) -> ApiResult<JobDetail> {
        self.gateway.get(&format!("/job/{}", id))
    }

    fn wait_for_job(&self, id: &str) -> ApiResult<JobDetail> {
        self.gateway.wait_for_job(id)
    }
}
