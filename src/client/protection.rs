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

//! Protection sub-client: protection policies and replication sessions.

use crate::client::gateway::{ApiResult, Gateway};
use crate::client::types::{NamedRef, ReplicationSessionDetail};
use std::sync::Arc;

const SESSION_SELECT: &str = "id,state,role,resource_type,local_resource_id,remote_resource_id";

pub trait Protection: Send + Sync {
    fn get_protection_policy(&self, id: &str) -> ApiResult<NamedRef>;
    fn get_protection_policies_by_name(&self, name: &str) -> ApiResult<Vec<NamedRef>>;

    fn get_replication_session(&self, id: &str) -> ApiResult<ReplicationSessionDetail>;
    fn get_replication_sessions_by_resource(&self, local_resource_id: &str) -> ApiResult<Vec<ReplicationSessionDetail>>;
    fn list_replication_sessions(&self) -> ApiResult<Vec<ReplicationSessionDetail>>;

    // state transitions; the array treats these as synchronous calls that
    // kick off background work, so none of them returns a body we care about
    fn sync_replication_session(&self, id: &str) -> ApiResult<()>;
    fn pause_replication_session(&self, id: &str) -> ApiResult<()>;
    fn resume_replication_session(&self, id: &str) -> ApiResult<()>;
    fn failover_replication_session(&self, id: &str) -> ApiResult<()>;
    fn reprotect_replication_session(&self, id: &str) -> ApiResult<()>;
}

pub struct HttpProtection {
    gateway: Arc<Gateway>,
}

impl HttpProtection {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    fn action(&self, id: &str, verb: &str) -> ApiResult<()> {
        self.gateway.post(&format!("/replication_session/{}/{}", id, verb), &serde_json::json!({}))?;
        Ok(())
    }
}

impl Protection for HttpProtection {
    fn get_protection_policy(&self, id: &str) -> ApiResult<NamedRef> {
        self.gateway.get(&format!("/policy/{}", id))
    }

    fn get_protection_policies_by_name(&self, name: &str) -> ApiResult<Vec<NamedRef>> {
        self.gateway.get_list("/policy", &[
            ("name", format!("eq.{}", name)),
            ("type", String::from("eq.Protection")),
        ])
    }

    fn get_replication_session(&self, id: &str) -> ApiResult<ReplicationSessionDetail> {
        self.gateway.get(&format!("/replication_session/{}?select={}", id, SESSION_SELECT))
    }

    fn get_replication_sessions_by_resource(&self, local_resource_id: &str) -> ApiResult<Vec<ReplicationSessionDetail>> {
        self.gateway.get_list("/replication_session", &[
            ("select", SESSION_SELECT.to_string()),
            ("local_resource_id", format!("eq.{}", local_resource_id)),
        ])
    }

    fn list_replication_sessions(&self) -> ApiResult<Vec<ReplicationSessionDetail>> {
        self.gateway.get_list("/replication_session", &[("select", SESSION_SELECT.to_string())])
    }

    fn sync_replication_session(&self, id: &str) -> ApiResult<()> {
        self.action(id, "sync")
    }

    fn pause_replication_session(&self, id: &str) -> ApiResult<()> {
        self.action(id, "pause")
    }

    fn resume_replication_session(&self, id: &str) -> ApiResult<()> {
        self.action(id, "resume")
    }

    fn failover_replication_session(&self, id: &str) -> ApiResult<()> {
        self.action(id, "failover")
    }

    fn reprotect_replication_session(&self, id: &str) -> ApiResult<()> {
        self.action(id, "reprotect")
    }
}
