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

pub mod configuration;
pub mod gateway;
pub mod protection;
pub mod provisioning;
pub mod types;

pub use crate::client::gateway::{optional, ApiError, ApiResult, ArrayConnection, Gateway};

use crate::client::configuration::{Configuration, HttpConfiguration};
use crate::client::protection::{HttpProtection, Protection};
use crate::client::provisioning::{HttpProvisioning, Provisioning};
use indexmap::IndexMap;
use std::sync::Arc;

/// Request body for create/modify calls. IndexMap keeps key order stable so
/// tests can assert on serialized bodies.
pub type Body = IndexMap<String, serde_json::Value>;

/// The per-play bundle of sub-clients modules work through. Held behind
/// trait objects so tests can wire in mock implementations.
pub struct ArrayHandles {
    pub provisioning: Arc<dyn Provisioning>,
    pub protection: Arc<dyn Protection>,
    pub configuration: Arc<dyn Configuration>,
}

impl ArrayHandles {
    pub fn connect(conn: &ArrayConnection) -> ApiResult<ArrayHandles> {
        let gateway = Arc::new(Gateway::connect(conn)?);
        Ok(ArrayHandles {
            provisioning: Arc::new(HttpProvisioning::new(Arc::clone(&gateway))),
            protection: Arc::new(HttpProtection::new(Arc::clone(&gateway))),
            configuration: Arc::new(HttpConfiguration::new(gateway)),
        })
    }
}

/// Name lookups must resolve to exactly one resource. Zero hits is a normal
/// "does not exist" answer; more than one is an ambiguity the user has to
/// resolve by switching to an id.
pub fn expect_unique<T>(kind: &str, name: &str, mut matches: Vec<T>) -> ApiResult<Option<T>> {
    match matches.len() {
        0 => Ok(None),
        1 => Ok(Some(matches.remove(0))),
        n => Err(ApiError::failed(format!(
            "{} name '{}' matches {} resources, use an id instead", kind, name, n))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_unique() {
        assert_eq!(expect_unique::<u32>("volume", "v1", vec![]).unwrap(), None);
        assert_eq!(expect_unique("volume", "v1", vec![9]).unwrap(), Some(9));
        let err = expect_unique("volume", "v1", vec![1, 2]).unwrap_err();
        match err {
            ApiError::Failed { message, .. } => {
                assert!(message.contains("matches 2 resources"));
            },
            other => panic!("unexpected: {:?}", other),
        }
    }
}
