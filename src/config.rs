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
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Configuration for running Powerjet playbooks programmatically
#[derive(Clone, Debug)]
pub struct PowerjetConfig {
    pub playbook_paths: Arc<RwLock<Vec<PathBuf>>>,
    /// Connection used by plays that do not carry their own `array:` block.
    pub default_array: Option<ArrayConnection>,
    pub extra_vars: serde_yaml::Value,
    pub verbosity: u32,
    pub check_mode: bool,
}

impl Default for PowerjetConfig {
    fn default() -> Self {
        Self {
            playbook_paths: Arc::new(RwLock::new(Vec::new())),
            default_array: None,
            extra_vars: serde_yaml::Value::Mapping(Default::default()),
            verbosity: 0,
            check_mode: false,
        }
    }
}

impl PowerjetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playbook<P: Into<PathBuf>>(self, path: P) -> Self {
        self.playbook_paths.write().unwrap().push(path.into());
        self
    }

    pub fn array(mut self, connection: ArrayConnection) -> Self {
        self.default_array = Some(connection);
        self
    }

    pub fn extra_vars(mut self, vars: serde_yaml::Value) -> Self {
        self.extra_vars = vars;
        self
    }

    pub fn verbosity(mut self, verbosity: u32) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn verbose(mut self) -> Self {
        self.verbosity = 1;
        self
    }

    pub fn check_mode(mut self, check: bool) -> Self {
        self.check_mode = check;
        self
    }
}
