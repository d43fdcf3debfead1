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

//! The playbook walker. Parses each playbook, runs a syntax pass over every
//! play, then drives each task through the query/mutate state machine
//! against the play's array.

use crate::client::{ArrayConnection, ArrayHandles};
use crate::handle::handle::TaskHandle;
use crate::output::OutputHandlerRef;
use crate::playbooks::context::PlaybookContext;
use crate::playbooks::language::{Play, Task};
use crate::tasks::{TaskRequest, TaskResponse, TaskStatus, TemplateMode};
use crate::util::io::{jet_file_open, path_as_string};
use crate::util::yaml::show_yaml_error_in_context;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    Yes,
    No,
}

/// Everything a run needs, assembled by the CLI or the embedding API.
pub struct RunState {
    pub playbook_paths: Vec<PathBuf>,
    pub default_array: Option<ArrayConnection>,
    pub extra_vars: serde_yaml::Value,
    pub check_mode: CheckMode,
    pub output: OutputHandlerRef,
    pub context: RwLock<PlaybookContext>,
}

pub fn playbook_traversal(run_state: &Arc<RunState>) -> Result<(), String> {
    for playbook_path in run_state.playbook_paths.iter() {
        run_state.output.on_playbook_start(&path_as_string(playbook_path));
        run_state.context.write().expect("context lock poisoned").set_playbook_path(playbook_path);

        let file = jet_file_open(playbook_path)?;
        let plays: Vec<Play> = match serde_yaml::from_reader(file) {
            Ok(plays) => plays,
            Err(e) => {
                show_yaml_error_in_context(&e, playbook_path);
                return Err(String::from("edit the file and try again?"));
            }
        };

        for play in plays.iter() {
            if let Err(msg) = handle_play(run_state, playbook_path, play) {
                run_state.output.on_playbook_end(&path_as_string(playbook_path), false);
                return Err(msg);
            }
        }
        run_state.output.on_playbook_end(&path_as_string(playbook_path), true);
    }
    Ok(())
}

fn handle_play(run_state: &Arc<RunState>, playbook_path: &Path, play: &Play) -> Result<(), String> {
    let connection = match (&play.array, &run_state.default_array) {
        (Some(conn), _) => conn.clone(),
        (None, Some(conn)) => conn.clone(),
        (None, None) => {
            return Err(format!("play '{}' has no array block and no connection was supplied on the command line", play.name));
        }
    };

    run_state.context.write().expect("context lock poisoned")
        .set_play(&play.name, &connection.endpoint);
    run_state.output.on_play_start(&play.name, &connection.endpoint);

    let api = Arc::new(ArrayHandles::connect(&connection)
        .map_err(|e| format!("unable to connect to array {}: {}", connection.endpoint, e))?);
    let handle = Arc::new(TaskHandle::new(api, Arc::clone(&run_state.output)));

    load_vars(run_state, playbook_path, play, &handle)?;

    let tasks = match &play.tasks {
        Some(tasks) => tasks,
        None => {
            finish_play(run_state, play);
            return Ok(());
        }
    };

    // syntax pass first so a typo in task 9 is caught before task 1 runs
    for task in tasks.iter() {
        let request = TaskRequest::validate();
        if let Err(response) = task.evaluate(&handle, &request, TemplateMode::Off) {
            let msg = response.msg.clone().unwrap_or_else(|| String::from("validation failed"));
            return Err(format!("task '{}' failed validation: {}", task.get_display_name(), msg));
        }
    }

    for task in tasks.iter() {
        run_task(run_state, &connection.endpoint, &handle, task)?;
    }

    finish_play(run_state, play);
    Ok(())
}

fn finish_play(run_state: &Arc<RunState>, play: &Play) {
    let context = run_state.context.read().expect("context lock poisoned");
    run_state.output.on_recap(context.recap_data());
    drop(context);
    run_state.output.on_play_end(&play.name);
}

/// Blend play vars, then vars_files, then command-line extra vars, so the
/// command line always wins.
fn load_vars(run_state: &Arc<RunState>, playbook_path: &Path, play: &Play, handle: &Arc<TaskHandle>) -> Result<(), String> {
    if let Some(vars) = &play.vars {
        handle.template.update_vars(serde_yaml::Value::Mapping(vars.clone()));
    }
    if let Some(vars_files) = &play.vars_files {
        for entry in vars_files.iter() {
            let path = resolve_vars_file(playbook_path, entry);
            let file = jet_file_open(&path)?;
            let parsed: serde_yaml::Value = serde_yaml::from_reader(file).map_err(|e| {
                show_yaml_error_in_context(&e, &path);
                String::from("edit the file and try again?")
            })?;
            handle.template.update_vars(parsed);
        }
    }
    handle.template.update_vars(run_state.extra_vars.clone());
    Ok(())
}

// relative vars_files paths are relative to the playbook, not the cwd
fn resolve_vars_file(playbook_path: &Path, entry: &str) -> PathBuf {
    let path = PathBuf::from(entry);
    if path.is_absolute() {
        return path;
    }
    match playbook_path.parent() {
        Some(dir) => dir.join(path),
        None => path,
    }
}

fn run_task(run_state: &Arc<RunState>, array: &str, handle: &Arc<TaskHandle>, task: &Task) -> Result<(), String> {
    let name = task.get_display_name();
    run_state.output.on_task_start(&name);

    let request = TaskRequest::query();
    let evaluated = match task.evaluate(handle, &request, TemplateMode::On) {
        Ok(evaluated) => evaluated,
        Err(response) => {
            // parameter errors are never ignorable
            record_result(run_state, array, &request, &response);
            run_state.output.on_task_end(&name);
            return Err(failure_message(&name, &response));
        }
    };

    let ignore_errors = match evaluated.and.as_ref() {
        Some(and) => and.ignore_errors,
        None => false,
    };

    let result = run_action(run_state, handle, &evaluated, &request);
    match result {
        Ok(response) => {
            if let Some(and) = evaluated.and.as_ref() {
                if let Some(variable) = &and.register {
                    register_result(handle, variable, &response);
                }
            }
            record_result(run_state, array, &request, &response);
            run_state.output.on_task_end(&name);
            Ok(())
        },
        Err(response) => {
            record_result(run_state, array, &request, &response);
            run_state.output.on_task_end(&name);
            if ignore_errors {
                run_state.output.warning(&format!("task '{}' failed, continuing (ignore_errors)", name));
                Ok(())
            } else {
                Err(failure_message(&name, &response))
            }
        }
    }
}

/// One full pass of the task state machine: query first, then whatever
/// follow-up the query asked for. Check mode stops after the query so the
/// "needs" answer is reported instead of acted on.
fn run_action(
    run_state: &Arc<RunState>,
    handle: &Arc<TaskHandle>,
    evaluated: &crate::tasks::EvaluatedTask,
    query: &Arc<TaskRequest>,
) -> Result<Arc<TaskResponse>, Arc<TaskResponse>> {
    if let Some(with) = evaluated.with.as_ref() {
        if let Some(condition) = &with.condition {
            if !handle.template.test_condition(query, condition)? {
                return Ok(handle.response.is_skipped(query));
            }
        }
    }

    let query_response = evaluated.action.dispatch(handle, query)?;
    let check_mode = run_state.check_mode == CheckMode::Yes;

    match query_response.status {
        TaskStatus::IsMatched | TaskStatus::IsPassive => Ok(query_response),

        TaskStatus::NeedsCreation => {
            if check_mode { return Ok(query_response); }
            evaluated.action.dispatch(handle, &TaskRequest::create())
        },
        TaskStatus::NeedsRemoval => {
            if check_mode { return Ok(query_response); }
            evaluated.action.dispatch(handle, &TaskRequest::remove())
        },
        TaskStatus::NeedsModification => {
            if check_mode { return Ok(query_response); }
            evaluated.action.dispatch(handle, &TaskRequest::modify(query_response.changes.clone()))
        },
        TaskStatus::NeedsExecution => {
            if check_mode { return Ok(query_response); }
            evaluated.action.dispatch(handle, &TaskRequest::execute())
        },

        // passive tasks only read the array, so they run in check mode too
        TaskStatus::NeedsPassive => evaluated.action.dispatch(handle, &TaskRequest::passive()),

        _ => Err(handle.response.is_failed(query, "module returned an unexpected status from query")),
    }
}

/// Shape of a registered result: `{{ myvar.changed }}` and
/// `{{ myvar.details.<field> }}` become available to later tasks.
fn register_result(handle: &Arc<TaskHandle>, variable: &str, response: &Arc<TaskResponse>) {
    let mut object = serde_json::Map::new();
    object.insert(String::from("changed"), serde_json::Value::Bool(response.is_changed()));
    if let Some(details) = response.details.as_ref() {
        object.insert(String::from("details"), details.clone());
    }
    handle.template.register(variable, serde_json::Value::Object(object));
}

fn record_result(run_state: &Arc<RunState>, array: &str, request: &Arc<TaskRequest>, response: &Arc<TaskResponse>) {
    let mut context = run_state.context.write().expect("context lock poisoned");
    if response.is_failed() {
        context.increment_failed();
    } else if response.status == TaskStatus::IsSkipped {
        context.increment_skipped();
    } else if response.is_changed() || response.needs_changes() {
        // needs_changes only reaches here in check mode
        context.increment_changed();
    } else {
        context.increment_ok();
    }
    drop(context);
    run_state.output.on_task_result(array, request, response);
}

fn failure_message(task_name: &str, response: &Arc<TaskResponse>) -> String {
    match &response.msg {
        Some(msg) => format!("task '{}' failed: {}", task_name, msg),
        None => format!("task '{}' failed", task_name),
    }
}
