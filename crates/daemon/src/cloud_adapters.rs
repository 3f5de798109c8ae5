// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds one [`ProviderConfig`] per enabled `cloud.<name>` section,
//! picking the concrete [`CloudAdapter`] the section's `kind` names.

use std::sync::Arc;
use yascheduler_cloud::{CloudAdapter, OpenStackAdapter, OpenStackParams, ScriptAdapter, ScriptParams};
use yascheduler_config::{CloudConfig, CloudKind};
use yascheduler_engine::coordinator::ProviderConfig;

pub fn build_providers(clouds: &[&CloudConfig]) -> Vec<ProviderConfig> {
    clouds
        .iter()
        .map(|cloud| ProviderConfig {
            name: cloud.name.clone(),
            adapter: build_adapter(cloud),
            max_nodes: cloud.max_nodes,
            priority: cloud.priority,
            idle_tolerance: cloud.idle_tolerance,
            ssh_user: cloud.ssh_user.clone(),
        })
        .collect()
}

fn build_adapter(cloud: &CloudConfig) -> Arc<dyn CloudAdapter> {
    match &cloud.kind {
        CloudKind::OpenStack { auth_url, user, password, project, image, flavor, network } => {
            Arc::new(OpenStackAdapter::new(OpenStackParams {
                name: cloud.name.clone(),
                auth_url: auth_url.clone(),
                user: user.clone(),
                password: password.clone(),
                project: project.clone(),
                image: image.clone(),
                flavor: flavor.clone(),
                network: network.clone(),
                creation_timeout: std::time::Duration::from_secs(600),
                poll_interval: std::time::Duration::from_secs(5),
            }))
        }
        CloudKind::Script { create_cmd, delete_cmd, list_cmd } => Arc::new(ScriptAdapter::new(ScriptParams {
            name: cloud.name.clone(),
            create_cmd: create_cmd.clone(),
            delete_cmd: delete_cmd.clone(),
            list_cmd: list_cmd.clone(),
            creation_timeout: std::time::Duration::from_secs(600),
            poll_interval: std::time::Duration::from_secs(5),
        })),
    }
}
