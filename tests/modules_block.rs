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

mod common;

use common::*;
use powerjet::modules::block::volume::VolumeTask;
use powerjet::modules::block::volume_group::VolumeGroupTask;
use powerjet::tasks::{Field, IsTask, TaskRequest, TaskStatus, TemplateMode};

const GB: u64 = 1_073_741_824;

fn volume_params() -> VolumeTask {
    VolumeTask {
        name: None,
        vol_name: None,
        vol_id: None,
        new_name: None,
        size: None,
        cap_unit: None,
        description: None,
        protection_policy: None,
        performance_policy: None,
        volume_group: None,
        host: None,
        hostgroup: None,
        hlu: None,
        mapping_state: None,
        state: None,
        with: None,
        and: None,
    }
}

fn volume_group_params() -> VolumeGroupTask {
    VolumeGroupTask {
        name: None,
        vg_name: None,
        vg_id: None,
        new_name: None,
        description: None,
        protection_policy: None,
        is_write_order_consistent: None,
        volumes: None,
        vol_state: None,
        state: None,
        with: None,
        and: None,
    }
}

#[test]
fn test_create_converts_capacity_units_to_bytes() {
    let api = MockArray::new();
    let handle = test_handle(&api);
    let task = VolumeTask {
        vol_name: Some(String::from("data1")),
        size: Some(String::from("1")),
        cap_unit: Some(String::from("GB")),
        ..volume_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::NeedsCreation);

    let create = TaskRequest::create();
    let response = evaluated.action.dispatch(&handle, &create).expect("create");
    assert_eq!(response.status, TaskStatus::IsCreated);

    let call = api.find_call("create_volume").expect("create_volume was called");
    assert!(call.contains("\"name\":\"data1\""));
    assert!(call.contains(&format!("\"size\":{}", GB)));
}

#[test]
fn test_absent_missing_volume_is_matched() {
    let api = MockArray::new();
    let handle = test_handle(&api);
    let task = VolumeTask {
        vol_name: Some(String::from("ghost")),
        state: Some(String::from("absent")),
        ..volume_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::IsMatched);
    assert_eq!(api.call_count(), 0);
}

#[test]
fn test_create_without_size_fails() {
    let api = MockArray::new();
    let handle = test_handle(&api);
    let task = VolumeTask {
        vol_name: Some(String::from("data1")),
        ..volume_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let failure = evaluated.action.dispatch(&handle, &query).unwrap_err();
    assert!(failure.msg.as_deref().unwrap().contains("size is required"));
}

#[test]
fn test_shrinking_is_rejected() {
    let api = MockArray::new();
    api.volumes.write().unwrap().push(volume("vol-1", "data1", 2 * GB));
    let handle = test_handle(&api);
    let task = VolumeTask {
        vol_name: Some(String::from("data1")),
        size: Some(String::from("1")),
        ..volume_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let failure = evaluated.action.dispatch(&handle, &query).unwrap_err();
    assert!(failure.msg.as_deref().unwrap().contains("shrinking is not supported"));
}

#[test]
fn test_identical_mapping_is_a_noop() {
    let api = MockArray::new();
    api.volumes.write().unwrap().push(volume("vol-1", "data1", GB));
    api.hosts.write().unwrap().push(powerjet::client::types::HostDetail {
        id: String::from("h-1"),
        name: Some(String::from("esx1")),
    });
    api.mappings.write().unwrap().push(mapping("vol-1", "h-1", 5));
    let handle = test_handle(&api);
    let task = VolumeTask {
        vol_name: Some(String::from("data1")),
        host: Some(String::from("esx1")),
        mapping_state: Some(String::from("mapped")),
        hlu: Some(String::from("5")),
        ..volume_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::IsMatched);
}

#[test]
fn test_remapping_at_a_new_hlu_requires_unmapping() {
    let api = MockArray::new();
    api.volumes.write().unwrap().push(volume("vol-1", "data1", GB));
    api.hosts.write().unwrap().push(powerjet::client::types::HostDetail {
        id: String::from("h-1"),
        name: Some(String::from("esx1")),
    });
    api.mappings.write().unwrap().push(mapping("vol-1", "h-1", 5));
    let handle = test_handle(&api);
    let task = VolumeTask {
        vol_name: Some(String::from("data1")),
        host: Some(String::from("esx1")),
        mapping_state: Some(String::from("mapped")),
        hlu: Some(String::from("7")),
        ..volume_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let failure = evaluated.action.dispatch(&handle, &query).unwrap_err();
    assert!(failure.msg.as_deref().unwrap().contains("requires unmapping first"));
}

#[test]
fn test_host_and_hostgroup_are_mutually_exclusive() {
    let api = MockArray::new();
    let handle = test_handle(&api);
    let task = VolumeTask {
        vol_name: Some(String::from("data1")),
        host: Some(String::from("esx1")),
        hostgroup: Some(String::from("cluster1")),
        mapping_state: Some(String::from("mapped")),
        ..volume_params()
    };

    let query = TaskRequest::query();
    let failure = task.evaluate(&handle, &query, TemplateMode::On).unwrap_err();
    assert!(failure.msg.as_deref().unwrap().contains("mutually exclusive"));
}

#[test]
fn test_property_and_mapping_changes_cannot_mix() {
    let api = MockArray::new();
    api.volumes.write().unwrap().push(volume("vol-1", "data1", GB));
    api.hosts.write().unwrap().push(powerjet::client::types::HostDetail {
        id: String::from("h-1"),
        name: Some(String::from("esx1")),
    });
    let handle = test_handle(&api);
    let task = VolumeTask {
        vol_name: Some(String::from("data1")),
        description: Some(String::from("payroll data")),
        host: Some(String::from("esx1")),
        mapping_state: Some(String::from("mapped")),
        ..volume_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let failure = evaluated.action.dispatch(&handle, &query).unwrap_err();
    assert!(failure.msg.as_deref().unwrap()
        .contains("cannot modify volume properties and change host mappings"));
}

#[test]
fn test_volume_joins_volume_group() {
    let api = MockArray::new();
    api.volumes.write().unwrap().push(volume("vol-1", "data1", GB));
    api.volume_groups.write().unwrap().push(volume_group("vg-1", "apps"));
    let handle = test_handle(&api);
    let task = VolumeTask {
        vol_name: Some(String::from("data1")),
        volume_group: Some(String::from("apps")),
        ..volume_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::NeedsModification);
    assert!(response.changes.contains(&Field::Members));

    let modify = TaskRequest::modify(response.changes.clone());
    let response = evaluated.action.dispatch(&handle, &modify).expect("modify");
    assert_eq!(response.status, TaskStatus::IsModified);
    assert!(api.called("add_volume_group_members vg-1 vol-1"));
}

#[test]
fn test_volume_removal() {
    let api = MockArray::new();
    api.volumes.write().unwrap().push(volume("vol-1", "data1", GB));
    let handle = test_handle(&api);
    let task = VolumeTask {
        vol_name: Some(String::from("data1")),
        state: Some(String::from("absent")),
        ..volume_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::NeedsRemoval);

    let remove = TaskRequest::remove();
    let response = evaluated.action.dispatch(&handle, &remove).expect("remove");
    assert_eq!(response.status, TaskStatus::IsRemoved);
    assert!(api.called("delete_volume vol-1"));
    assert!(api.volumes.read().unwrap().is_empty());
}

#[test]
fn test_volume_group_create() {
    let api = MockArray::new();
    let handle = test_handle(&api);
    let task = VolumeGroupTask {
        vg_name: Some(String::from("apps")),
        ..volume_group_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::NeedsCreation);

    let create = TaskRequest::create();
    let response = evaluated.action.dispatch(&handle, &create).expect("create");
    assert_eq!(response.status, TaskStatus::IsCreated);
    let call = api.find_call("create_volume_group").expect("create_volume_group was called");
    assert!(call.contains("\"name\":\"apps\""));
}

#[test]
fn test_volume_group_membership_by_list() {
    let api = MockArray::new();
    let mut group = volume_group("vg-1", "apps");
    group.volumes.push(named("vol-1", "data1"));
    api.volume_groups.write().unwrap().push(group);
    api.volumes.write().unwrap().push(volume("vol-1", "data1", GB));
    api.volumes.write().unwrap().push(volume("vol-2", "data2", GB));
    let handle = test_handle(&api);

    // data1 is already a member, so only data2 needs adding
    let task = VolumeGroupTask {
        vg_name: Some(String::from("apps")),
        volumes: Some(vec![String::from("data1"), String::from("data2")]),
        vol_state: Some(String::from("present-in-group")),
        ..volume_group_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::NeedsModification);
    assert!(response.changes.contains(&Field::Members));

    let modify = TaskRequest::modify(response.changes.clone());
    evaluated.action.dispatch(&handle, &modify).expect("modify");
    assert!(api.called("add_volume_group_members vg-1 vol-2"));
}
