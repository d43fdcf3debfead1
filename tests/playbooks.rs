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

use powerjet::playbooks::language::Play;

#[test]
fn test_playbook_parses_tagged_tasks() {
    let source = r#"
- name: provision block storage
  array:
    endpoint: 10.1.1.10
    user: admin
    password: secret
  vars:
    volume_size: "10"
  tasks:
    - !volume
      name: create the data volume
      vol_name: data1
      size: "{{ volume_size }}"
    - !info
      gather_subset:
        - cluster
        - volume
"#;
    let plays: Vec<Play> = serde_yaml::from_str(source).expect("playbook parses");
    assert_eq!(plays.len(), 1);

    let play = &plays[0];
    assert_eq!(play.name, "provision block storage");
    let array = play.array.as_ref().expect("array block");
    assert_eq!(array.endpoint, "10.1.1.10");
    assert_eq!(array.user, "admin");
    assert!(play.vars.is_some());

    let tasks = play.tasks.as_ref().expect("tasks");
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].get_module(), "volume");
    assert_eq!(tasks[0].get_display_name(), "create the data volume");
    assert_eq!(tasks[1].get_module(), "info");
    // unnamed tasks fall back to the module name
    assert_eq!(tasks[1].get_display_name(), "info");
}

#[test]
fn test_playbook_without_array_block() {
    let source = r#"
- name: file resources
  tasks:
    - !nfs_export
      export_name: proj-export
      filesystem: projects
      nas_server: nas1
      path: /projects
"#;
    let plays: Vec<Play> = serde_yaml::from_str(source).expect("playbook parses");
    assert!(plays[0].array.is_none());
    let tasks = plays[0].tasks.as_ref().unwrap();
    assert_eq!(tasks[0].get_module(), "nfs_export");
}

#[test]
fn test_all_module_tags_parse() {
    let source = r#"
- name: one of everything
  tasks:
    - !volume
      vol_name: v1
    - !volume_group
      vg_name: g1
    - !filesystem
      filesystem_name: f1
    - !nas_server
      nas_server_name: n1
    - !smb_share
      share_name: s1
    - !nfs_export
      export_name: e1
    - !quota
      quota_type: tree
      filesystem: f1
      path: /q
    - !network
      network_name: mgmt
    - !cluster
      cluster_name: c1
    - !remote_support
      verify_connection: "true"
    - !replication_session
      session_id: r1
      session_state: paused
    - !info
      gather_subset:
        - cluster
"#;
    let plays: Vec<Play> = serde_yaml::from_str(source).expect("playbook parses");
    let modules: Vec<String> = plays[0].tasks.as_ref().unwrap()
        .iter().map(|t| t.get_module()).collect();
    assert_eq!(modules, vec![
        "volume", "volume_group", "filesystem", "nas_server", "smb_share",
        "nfs_export", "quota", "network", "cluster", "remote_support",
        "replication_session", "info",
    ]);
}

#[test]
fn test_unknown_task_parameter_is_rejected() {
    let source = r#"
- name: typo
  tasks:
    - !volume
      vol_namez: data1
"#;
    let result: Result<Vec<Play>, _> = serde_yaml::from_str(source);
    assert!(result.is_err());
}

#[test]
fn test_unknown_play_key_is_rejected() {
    let source = r#"
- name: typo
  taskz: []
"#;
    let result: Result<Vec<Play>, _> = serde_yaml::from_str(source);
    assert!(result.is_err());
}
