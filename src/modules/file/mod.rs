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

pub mod filesystem;
pub mod nas_server;
pub mod nfs_export;
pub mod quota;
pub mod smb_share;

use crate::client::{expect_unique, ApiResult};
use crate::client::provisioning::Provisioning;
use crate::tasks::refs::ResourceRef;

/// NAS server resolution shared by the file modules: every file resource is
/// scoped to a NAS server, referenced by name or id.
pub fn resolve_nas_server(provisioning: &dyn Provisioning, nas_server: &str) -> ApiResult<Option<String>> {
    match ResourceRef::parse(nas_server) {
        ResourceRef::Id(id) => Ok(Some(id)),
        ResourceRef::Name(name) => {
            let matches = provisioning.get_nas_servers_by_name(&name)?;
            Ok(expect_unique("nas server", &name, matches)?.map(|n| n.id))
        },
    }
}
