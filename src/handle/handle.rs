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

use crate::client::ArrayHandles;
use crate::handle::response::Response;
use crate::handle::template::Template;
use crate::output::OutputHandlerRef;
use std::sync::Arc;

/// Everything a module needs while evaluating or executing one task:
/// templating, the response factory, and the array sub-clients.
pub struct TaskHandle {
    pub template: Arc<Template>,
    pub response: Arc<Response>,
    pub api: Arc<ArrayHandles>,
    pub output: OutputHandlerRef,
}

impl TaskHandle {
    pub fn new(api: Arc<ArrayHandles>, output: OutputHandlerRef) -> Self {
        let response = Arc::new(Response::new());
        let template = Arc::new(Template::new(Arc::clone(&response)));
        Self { template, response, api, output }
    }

    pub fn debug(&self, message: &str) {
        self.output.debug(message);
    }
}
