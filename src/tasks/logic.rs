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

use crate::handle::handle::TaskHandle;
use crate::tasks::request::TaskRequest;
use crate::tasks::response::TaskResponse;
use crate::tasks::TemplateMode;
use serde::Deserialize;
use std::sync::Arc;

/// Keywords accepted under a task's `with:` block.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct PreLogicInput {
    pub condition: Option<String>,
}

/// Keywords accepted under a task's `and:` block.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct PostLogicInput {
    pub ignore_errors: Option<String>,
    pub register: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PreLogicEvaluated {
    pub condition: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PostLogicEvaluated {
    pub ignore_errors: bool,
    pub register: Option<String>,
}

impl PreLogicInput {
    pub fn template(
        _handle: &Arc<TaskHandle>,
        _request: &Arc<TaskRequest>,
        _tm: TemplateMode,
        input: &Option<PreLogicInput>,
    ) -> Result<Option<PreLogicEvaluated>, Arc<TaskResponse>> {
        match input {
            None => Ok(None),
            // the condition stays raw here; the traversal engine evaluates it
            // right before each request so registered variables are visible
            Some(input) => Ok(Some(PreLogicEvaluated {
                condition: input.condition.clone(),
            })),
        }
    }
}

impl PostLogicInput {
    pub fn template(
        handle: &Arc<TaskHandle>,
        request: &Arc<TaskRequest>,
        tm: TemplateMode,
        input: &Option<PostLogicInput>,
    ) -> Result<Option<PostLogicEvaluated>, Arc<TaskResponse>> {
        match input {
            None => Ok(None),
            Some(input) => Ok(Some(PostLogicEvaluated {
                ignore_errors: handle.template.boolean_option_default_false(
                    request, tm, &String::from("ignore_errors"), &input.ignore_errors)?,
                register: input.register.clone(),
            })),
        }
    }
}
