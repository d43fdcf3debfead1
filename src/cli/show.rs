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

//! `powerjet show`: summarize a playbook without contacting any array.

use crate::playbooks::language::Play;
use crate::util::io::{jet_file_open, path_as_string};
use crate::util::terminal::{banner, two_column_table};
use crate::util::yaml::show_yaml_error_in_context;
use std::path::Path;

pub fn show_playbook(playbook_path: &Path) -> Result<(), String> {
    let file = jet_file_open(playbook_path)?;
    let plays: Vec<Play> = match serde_yaml::from_reader(file) {
        Ok(plays) => plays,
        Err(e) => {
            show_yaml_error_in_context(&e, playbook_path);
            return Err(String::from("edit the file and try again?"));
        }
    };

    banner(&format!("PLAYBOOK: {}", path_as_string(playbook_path)));

    for play in plays.iter() {
        println!();
        let array = match &play.array {
            Some(connection) => connection.endpoint.clone(),
            None => String::from("(from command line)"),
        };
        banner(&format!("PLAY: {} => {}", play.name, array));

        let tasks = match &play.tasks {
            Some(tasks) => tasks,
            None => {
                println!("  (no tasks)");
                continue;
            }
        };
        let mut rows: Vec<(String, String)> = Vec::with_capacity(tasks.len());
        for task in tasks.iter() {
            rows.push((task.get_display_name(), task.get_module()));
        }
        two_column_table(&String::from("*Task*"), &String::from("*Module*"), &rows);
    }
    println!();
    Ok(())
}
