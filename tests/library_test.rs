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

//! Tests for the Powerjet library API.

use powerjet::{PlaybookRunner, PowerjetConfig};
use std::fs;
use std::io::Write;

#[test]
fn test_config_defaults() {
    let config = PowerjetConfig::new();
    assert!(config.playbook_paths.read().unwrap().is_empty());
    assert!(config.default_array.is_none());
    assert_eq!(config.verbosity, 0);
    assert!(!config.check_mode);
}

#[test]
fn test_config_builder() {
    let config = PowerjetConfig::new()
        .playbook("site.yml")
        .playbook("extra.yml")
        .verbose()
        .check_mode(true);

    assert_eq!(config.playbook_paths.read().unwrap().len(), 2);
    assert_eq!(config.verbosity, 1);
    assert!(config.check_mode);
}

#[test]
fn test_runner_requires_playbook_paths() {
    let runner = PlaybookRunner::new(PowerjetConfig::new());
    let error = runner.run().unwrap_err();
    assert!(error.to_string().contains("No playbook paths specified"));
}

#[test]
fn test_runner_reports_missing_playbook() {
    let config = PowerjetConfig::new().playbook("/nonexistent/site.yml");
    let runner = PlaybookRunner::new(config);
    assert!(runner.run().is_err());
}

#[test]
fn test_play_without_a_connection_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("site.yml");
    let mut file = fs::File::create(&path).unwrap();
    write!(file, r#"
- name: no connection anywhere
  tasks:
    - !volume
      vol_name: data1
      size: "1"
"#).unwrap();

    let config = PowerjetConfig::new().playbook(path);
    let runner = PlaybookRunner::new(config);
    let error = runner.run().unwrap_err();
    assert!(error.to_string().contains("no array block"));
}

#[test]
fn test_invalid_playbook_yaml_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yml");
    let mut file = fs::File::create(&path).unwrap();
    write!(file, "this is not a playbook").unwrap();

    let config = PowerjetConfig::new().playbook(path);
    let runner = PlaybookRunner::new(config);
    assert!(runner.run().is_err());
}
