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
use crate::config::PowerjetConfig;
use crate::error::{PowerjetError, Result};
use crate::output::{NullOutputHandler, OutputHandler, OutputHandlerRef};
use crate::playbooks::context::PlaybookContext;
use crate::playbooks::traversal::{playbook_traversal, CheckMode, RunState};
use std::sync::{Arc, RwLock};

/// Main API for running Powerjet playbooks
pub struct PlaybookRunner {
    config: PowerjetConfig,
    output_handler: OutputHandlerRef,
}

impl PlaybookRunner {
    /// Create a new PlaybookRunner with the given configuration
    pub fn new(config: PowerjetConfig) -> Self {
        Self {
            config,
            output_handler: Arc::new(NullOutputHandler),
        }
    }

    /// Set a custom output handler
    pub fn with_output_handler(mut self, handler: Arc<dyn OutputHandler>) -> Self {
        self.output_handler = handler;
        self
    }

    /// Run the configured playbooks
    pub fn run(&self) -> Result<PlaybookResult> {
        let playbook_paths = self.config.playbook_paths.read().unwrap().clone();
        if playbook_paths.is_empty() {
            return Err(PowerjetError::Config("No playbook paths specified".into()));
        }

        let check_mode = if self.config.check_mode {
            CheckMode::Yes
        } else {
            CheckMode::No
        };

        let run_state = Arc::new(RunState {
            playbook_paths,
            default_array: self.config.default_array.clone(),
            extra_vars: self.config.extra_vars.clone(),
            check_mode,
            output: self.output_handler.clone(),
            context: RwLock::new(PlaybookContext::new()),
        });

        match playbook_traversal(&run_state) {
            Ok(_) => {
                let context = run_state.context.read().unwrap();
                Ok(PlaybookResult {
                    success: true,
                    ok: context.ok_count,
                    changed: context.changed_count,
                    failed: context.failed_count,
                    skipped: context.skipped_count,
                })
            }
            Err(e) => Err(PowerjetError::TaskExecution(e)),
        }
    }
}

/// Result of a playbook run. The counters cover the last play, matching the
/// recap shown on the terminal.
#[derive(Debug, Clone)]
pub struct PlaybookResult {
    pub success: bool,
    pub ok: usize,
    pub changed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Builder-style API for simpler use cases
pub fn run_playbook(playbook_path: &str) -> PlaybookRunnerBuilder {
    PlaybookRunnerBuilder::new(playbook_path)
}

pub struct PlaybookRunnerBuilder {
    config: PowerjetConfig,
}

impl PlaybookRunnerBuilder {
    fn new(playbook_path: &str) -> Self {
        let config = PowerjetConfig::new()
            .playbook(playbook_path);
        Self { config }
    }

    pub fn array(mut self, endpoint: &str, user: &str, password: &str) -> Self {
        self.config = self.config.array(ArrayConnection {
            endpoint: endpoint.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            verify_certs: None,
            timeout: None,
        });
        self
    }

    pub fn connection(mut self, connection: ArrayConnection) -> Self {
        self.config = self.config.array(connection);
        self
    }

    pub fn extra_vars(mut self, vars: serde_yaml::Value) -> Self {
        self.config = self.config.extra_vars(vars);
        self
    }

    pub fn verbosity(mut self, verbosity: u32) -> Self {
        self.config = self.config.verbosity(verbosity);
        self
    }

    pub fn check_mode(mut self) -> Self {
        self.config = self.config.check_mode(true);
        self
    }

    pub fn run(self) -> Result<PlaybookResult> {
        let runner = PlaybookRunner::new(self.config);
        runner.run()
    }

    pub fn run_with_output(self, handler: Arc<dyn OutputHandler>) -> Result<PlaybookResult> {
        let runner = PlaybookRunner::new(self.config)
            .with_output_handler(handler);
        runner.run()
    }
}
