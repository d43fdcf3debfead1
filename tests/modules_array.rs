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
use powerjet::modules::array::cluster::ClusterTask;
use powerjet::modules::array::info::InfoTask;
use powerjet::modules::array::network::NetworkTask;
use powerjet::modules::array::remote_support::RemoteSupportTask;
use powerjet::tasks::{Field, IsTask, TaskRequest, TaskStatus, TemplateMode};

fn info_params() -> InfoTask {
    InfoTask {
        name: None,
        gather_subset: None,
        with: None,
        and: None,
    }
}

fn cluster_params() -> ClusterTask {
    ClusterTask {
        name: None,
        cluster_name: None,
        cluster_id: None,
        new_name: None,
        physical_mtu: None,
        service_password: None,
        management_address: None,
        storage_discovery_address: None,
        appliances: None,
        ignore_network_warnings: None,
        wait_for_completion: None,
        state: None,
        with: None,
        and: None,
    }
}

fn network_params() -> NetworkTask {
    NetworkTask {
        name: None,
        network_name: None,
        network_id: None,
        vlan_id: None,
        mtu: None,
        gateway: None,
        prefix_length: None,
        new_cluster_mgmt_address: None,
        storage_discovery_address: None,
        ports: None,
        port_state: None,
        wait_for_completion: None,
        state: None,
        with: None,
        and: None,
    }
}

fn remote_support_params() -> RemoteSupportTask {
    RemoteSupportTask {
        name: None,
        remote_support_id: None,
        support_type: None,
        proxy_address: None,
        proxy_port: None,
        proxy_username: None,
        proxy_password: None,
        is_cloudiq_enabled: None,
        is_rsc_enabled: None,
        verify_connection: None,
        send_test_alert: None,
        wait_for_completion: None,
        with: None,
        and: None,
    }
}

#[test]
fn test_info_defaults_to_the_cluster_subset() {
    let api = MockArray::new();
    api.clusters.write().unwrap().push(cluster("cl-1", "array01"));
    let handle = test_handle(&api);
    let task = info_params();

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::NeedsPassive);

    let passive = TaskRequest::passive();
    let response = evaluated.action.dispatch(&handle, &passive).expect("passive");
    assert_eq!(response.status, TaskStatus::IsPassive);

    let details = (*response.details).as_ref().expect("details");
    let clusters = details.get("cluster").expect("cluster subset gathered");
    assert_eq!(clusters.as_array().unwrap().len(), 1);
    assert_eq!(clusters[0]["name"], "array01");
}

#[test]
fn test_info_gathers_requested_subsets() {
    let api = MockArray::new();
    api.networks.write().unwrap().push(network("net-1", "mgmt", 1500));
    api.nas_servers.write().unwrap().push(nas_server("nas-1", "nas1"));
    let handle = test_handle(&api);
    let task = InfoTask {
        gather_subset: Some(vec![String::from("network"), String::from("nas_server")]),
        ..info_params()
    };

    let passive = TaskRequest::passive();
    let evaluated = task.evaluate(&handle, &passive, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &passive).expect("passive");

    let details = (*response.details).as_ref().expect("details");
    assert!(details.get("network").is_some());
    assert!(details.get("nas_server").is_some());
    assert!(details.get("cluster").is_none());
}

#[test]
fn test_info_rejects_unknown_subsets() {
    let api = MockArray::new();
    let handle = test_handle(&api);
    let task = InfoTask {
        gather_subset: Some(vec![String::from("flux_capacitor")]),
        ..info_params()
    };

    let query = TaskRequest::query();
    let failure = task.evaluate(&handle, &query, TemplateMode::On).unwrap_err();
    assert!(failure.msg.as_deref().unwrap().contains("invalid gather_subset"));
}

#[test]
fn test_clusters_cannot_be_deleted() {
    let api = MockArray::new();
    let handle = test_handle(&api);
    let task = ClusterTask {
        cluster_name: Some(String::from("array01")),
        state: Some(String::from("absent")),
        ..cluster_params()
    };

    let query = TaskRequest::query();
    let failure = task.evaluate(&handle, &query, TemplateMode::On).unwrap_err();
    assert!(failure.msg.as_deref().unwrap().contains("clusters cannot be deleted"));
}

#[test]
fn test_cluster_rename_is_a_modification() {
    let api = MockArray::new();
    api.clusters.write().unwrap().push(cluster("cl-1", "array01"));
    let handle = test_handle(&api);
    let task = ClusterTask {
        cluster_name: Some(String::from("array01")),
        new_name: Some(String::from("array-east")),
        ..cluster_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::NeedsModification);
    assert!(response.changes.contains(&Field::Name));

    let modify = TaskRequest::modify(response.changes.clone());
    let response = evaluated.action.dispatch(&handle, &modify).expect("modify");
    assert_eq!(response.status, TaskStatus::IsModified);
    let call = api.find_call("modify_cluster cl-1").expect("modify_cluster was called");
    assert!(call.contains("\"name\":\"array-east\""));
}

#[test]
fn test_network_mtu_change_waits_for_the_job() {
    let api = MockArray::new();
    api.networks.write().unwrap().push(network("net-1", "mgmt", 1500));
    *api.job_to_return.write().unwrap() = Some(String::from("job-7"));
    let handle = test_handle(&api);
    let task = NetworkTask {
        network_name: Some(String::from("mgmt")),
        mtu: Some(String::from("1400")),
        ..network_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::NeedsModification);
    assert!(response.changes.contains(&Field::Mtu));

    let modify = TaskRequest::modify(response.changes.clone());
    let response = evaluated.action.dispatch(&handle, &modify).expect("modify");
    assert_eq!(response.status, TaskStatus::IsModified);

    let call = api.find_call("modify_network net-1").expect("modify_network was called");
    assert!(call.contains("\"mtu\":1400"));
    assert!(api.called("wait_for_job job-7"));
}

#[test]
fn test_matching_network_is_a_noop() {
    let api = MockArray::new();
    api.networks.write().unwrap().push(network("net-1", "mgmt", 1500));
    let handle = test_handle(&api);
    let task = NetworkTask {
        network_name: Some(String::from("mgmt")),
        mtu: Some(String::from("1500")),
        ..network_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::IsMatched);
}

#[test]
fn test_initial_cluster_create_from_appliances() {
    let api = MockArray::new();
    api.appliances.write().unwrap().push(appliance("app-1", "rack-a"));
    let handle = test_handle(&api);
    let task = ClusterTask {
        cluster_name: Some(String::from("array01")),
        management_address: Some(String::from("10.0.0.10")),
        appliances: Some(vec![String::from("rack-a")]),
        ignore_network_warnings: Some(String::from("true")),
        ..cluster_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::NeedsCreation);

    let create = TaskRequest::create();
    let response = evaluated.action.dispatch(&handle, &create).expect("create");
    assert_eq!(response.status, TaskStatus::IsCreated);

    let call = api.find_call("create_cluster").expect("create_cluster was called");
    assert!(call.contains("\"appliances\":[{\"id\":\"app-1\"}]"));
    assert!(call.contains("\"ignore_network_warnings\":true"));
}

#[test]
fn test_port_joins_network() {
    let api = MockArray::new();
    api.networks.write().unwrap().push(network("net-1", "mgmt", 1500));
    api.network_ports.write().unwrap().push((String::from("net-1"), String::from("p-0")));
    let handle = test_handle(&api);
    let task = NetworkTask {
        network_name: Some(String::from("mgmt")),
        ports: Some(vec![String::from("p-1")]),
        port_state: Some(String::from("present-in-network")),
        ..network_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::NeedsModification);
    assert!(response.changes.contains(&Field::Ports));

    let modify = TaskRequest::modify(response.changes.clone());
    let response = evaluated.action.dispatch(&handle, &modify).expect("modify");
    assert_eq!(response.status, TaskStatus::IsModified);
    let call = api.find_call("modify_network net-1").expect("modify_network was called");
    assert!(call.contains("\"add_port_ids\":[\"p-1\"]"));
}

#[test]
fn test_port_already_in_network_is_a_noop() {
    let api = MockArray::new();
    api.networks.write().unwrap().push(network("net-1", "mgmt", 1500));
    api.network_ports.write().unwrap().push((String::from("net-1"), String::from("p-0")));
    let handle = test_handle(&api);
    let task = NetworkTask {
        network_name: Some(String::from("mgmt")),
        ports: Some(vec![String::from("p-0")]),
        port_state: Some(String::from("present-in-network")),
        ..network_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::IsMatched);
    assert!(!api.called("modify_network"));
}

#[test]
fn test_port_removal_submits_only_members() {
    let api = MockArray::new();
    api.networks.write().unwrap().push(network("net-1", "mgmt", 1500));
    api.network_ports.write().unwrap().push((String::from("net-1"), String::from("p-0")));
    let handle = test_handle(&api);
    let task = NetworkTask {
        network_name: Some(String::from("mgmt")),
        ports: Some(vec![String::from("p-0"), String::from("p-9")]),
        port_state: Some(String::from("absent-in-network")),
        ..network_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::NeedsModification);

    let modify = TaskRequest::modify(response.changes.clone());
    evaluated.action.dispatch(&handle, &modify).expect("modify");
    let call = api.find_call("modify_network net-1").expect("modify_network was called");
    assert!(call.contains("\"remove_port_ids\":[\"p-0\"]"));
    assert!(!call.contains("p-9"));
}

#[test]
fn test_ports_require_a_port_state() {
    let api = MockArray::new();
    let handle = test_handle(&api);
    let task = NetworkTask {
        network_name: Some(String::from("mgmt")),
        ports: Some(vec![String::from("p-0")]),
        ..network_params()
    };

    let query = TaskRequest::query();
    let failure = task.evaluate(&handle, &query, TemplateMode::On).unwrap_err();
    assert!(failure.msg.as_deref().unwrap().contains("ports and port_state must be supplied together"));
}

#[test]
fn test_remote_support_verify_runs_as_passive() {
    let api = MockArray::new();
    api.remote_support.write().unwrap().push(remote_support("rs-1", "SRS_Gateway"));
    let handle = test_handle(&api);
    let task = RemoteSupportTask {
        verify_connection: Some(String::from("true")),
        ..remote_support_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::NeedsPassive);

    let passive = TaskRequest::passive();
    let response = evaluated.action.dispatch(&handle, &passive).expect("passive");
    assert_eq!(response.status, TaskStatus::IsPassive);
    assert!(api.called("verify_remote_support rs-1"));
    assert!(!api.called("send_test_alert"));
}

#[test]
fn test_remote_support_settings_change() {
    let api = MockArray::new();
    api.remote_support.write().unwrap().push(remote_support("rs-1", "SRS_Gateway"));
    let handle = test_handle(&api);
    let task = RemoteSupportTask {
        is_cloudiq_enabled: Some(String::from("true")),
        ..remote_support_params()
    };

    let query = TaskRequest::query();
    let evaluated = task.evaluate(&handle, &query, TemplateMode::On).expect("evaluate");
    let response = evaluated.action.dispatch(&handle, &query).expect("query");
    assert_eq!(response.status, TaskStatus::NeedsModification);
    assert!(response.changes.contains(&Field::CloudIq));

    let modify = TaskRequest::modify(response.changes.clone());
    let response = evaluated.action.dispatch(&handle, &modify).expect("modify");
    assert_eq!(response.status, TaskStatus::IsModified);
    let call = api.find_call("modify_remote_support rs-1").expect("modify_remote_support was called");
    assert!(call.contains("\"is_cloudiq_enabled\":true"));
}
