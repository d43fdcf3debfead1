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

//! Templating of task parameters. All module parameters arrive as YAML
//! strings and pass through here exactly once during evaluate(), picking up
//! `{{ variable }}` substitutions from play vars and registered results,
//! then parsing into the type the module actually wants.

use crate::handle::response::Response;
use crate::tasks::request::TaskRequest;
use crate::tasks::response::TaskResponse;
use crate::tasks::TemplateMode;
use crate::util::yaml::blend_variables;
use handlebars::Handlebars;
use std::sync::{Arc, RwLock};

pub struct Template {
    response: Arc<Response>,
    vars: RwLock<serde_yaml::Value>,
}

impl Template {
    pub fn new(response: Arc<Response>) -> Self {
        Self {
            response,
            vars: RwLock::new(serde_yaml::Value::Mapping(serde_yaml::Mapping::new())),
        }
    }

    /// Blend additional variables in, later writers winning. Used for play
    /// vars at play start and for `and.register` results after each task.
    pub fn update_vars(&self, vars: serde_yaml::Value) {
        let mut guard = self.vars.write().expect("vars lock poisoned");
        blend_variables(&mut guard, vars);
    }

    pub fn register(&self, name: &str, value: serde_json::Value) {
        let mut mapping = serde_yaml::Mapping::new();
        let yaml: serde_yaml::Value = serde_yaml::to_value(&value).unwrap_or(serde_yaml::Value::Null);
        mapping.insert(serde_yaml::Value::String(name.to_string()), yaml);
        self.update_vars(serde_yaml::Value::Mapping(mapping));
    }

    fn render(&self, request: &Arc<TaskRequest>, field: &str, template: &str) -> Result<String, Arc<TaskResponse>> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        let guard = self.vars.read().expect("vars lock poisoned");
        registry.render_template(template, &*guard)
            .map_err(|e| self.response.is_failed(request, &format!("template error in '{}': {}", field, e)))
    }

    pub fn string(&self, request: &Arc<TaskRequest>, tm: TemplateMode, field: &str, template: &String) -> Result<String, Arc<TaskResponse>> {
        if tm == TemplateMode::Off {
            return Ok(template.clone());
        }
        self.render(request, field, template)
    }

    pub fn string_option(&self, request: &Arc<TaskRequest>, tm: TemplateMode, field: &str, template: &Option<String>) -> Result<Option<String>, Arc<TaskResponse>> {
        match template {
            None => Ok(None),
            Some(t) => Ok(Some(self.string(request, tm, field, t)?)),
        }
    }

    pub fn string_option_default(&self, request: &Arc<TaskRequest>, tm: TemplateMode, field: &str, template: &Option<String>, default: &str) -> Result<String, Arc<TaskResponse>> {
        match self.string_option(request, tm, field, template)? {
            Some(value) => Ok(value),
            None => Ok(default.to_string()),
        }
    }

    /// Signed integer parameter, absent stays absent. In TemplateMode::Off
    /// values are not parsed since templates may not resolve yet.
    pub fn integer_option(&self, request: &Arc<TaskRequest>, tm: TemplateMode, field: &str, template: &Option<String>) -> Result<Option<i64>, Arc<TaskResponse>> {
        if tm == TemplateMode::Off {
            return Ok(None);
        }
        match self.string_option(request, tm, field, template)? {
            None => Ok(None),
            Some(value) => value.trim().parse::<i64>()
                .map(Some)
                .map_err(|_| self.response.is_failed(request, &format!("field '{}' is not an integer: {}", field, value))),
        }
    }

    pub fn unsigned_option(&self, request: &Arc<TaskRequest>, tm: TemplateMode, field: &str, template: &Option<String>) -> Result<Option<u64>, Arc<TaskResponse>> {
        if tm == TemplateMode::Off {
            return Ok(None);
        }
        match self.string_option(request, tm, field, template)? {
            None => Ok(None),
            Some(value) => value.trim().parse::<u64>()
                .map(Some)
                .map_err(|_| self.response.is_failed(request, &format!("field '{}' is not an unsigned integer: {}", field, value))),
        }
    }

    fn boolean(&self, request: &Arc<TaskRequest>, field: &str, value: &str) -> Result<bool, Arc<TaskResponse>> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" => Ok(true),
            "false" | "no" => Ok(false),
            _ => Err(self.response.is_failed(request, &format!("field '{}' is not a boolean: {}", field, value))),
        }
    }

    pub fn boolean_option(&self, request: &Arc<TaskRequest>, tm: TemplateMode, field: &str, template: &Option<String>) -> Result<Option<bool>, Arc<TaskResponse>> {
        if tm == TemplateMode::Off {
            return Ok(None);
        }
        match self.string_option(request, tm, field, template)? {
            None => Ok(None),
            Some(value) => Ok(Some(self.boolean(request, field, &value)?)),
        }
    }

    pub fn boolean_option_default_true(&self, request: &Arc<TaskRequest>, tm: TemplateMode, field: &str, template: &Option<String>) -> Result<bool, Arc<TaskResponse>> {
        if tm == TemplateMode::Off {
            return Ok(true);
        }
        Ok(self.boolean_option(request, tm, field, template)?.unwrap_or(true))
    }

    pub fn boolean_option_default_false(&self, request: &Arc<TaskRequest>, tm: TemplateMode, field: &str, template: &Option<String>) -> Result<bool, Arc<TaskResponse>> {
        if tm == TemplateMode::Off {
            return Ok(false);
        }
        Ok(self.boolean_option(request, tm, field, template)?.unwrap_or(false))
    }

    /// Evaluate a `with.condition` expression against the current vars.
    pub fn test_condition(&self, request: &Arc<TaskRequest>, expression: &str) -> Result<bool, Arc<TaskResponse>> {
        let wrapped = format!("{{{{#if {}}}}}true{{{{else}}}}false{{{{/if}}}}", expression.trim());
        let rendered = self.render(request, "condition", &wrapped)?;
        match rendered.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(self.response.is_failed(request, &format!("condition did not evaluate to a boolean: {}", other))),
        }
    }
}
