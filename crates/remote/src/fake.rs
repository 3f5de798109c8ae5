// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`FakeMachine`]: an in-memory [`Machine`] for exercising
//! `yascheduler-engine`'s reconciler and `deploy_engine` without a real
//! network, mirroring `yascheduler-storage`'s `FakeRepository`.

use crate::error::RemoteError;
use crate::machine::{ExecOutput, FileTransfer, Machine, TransferOutcome};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use yascheduler_core::LivenessCheck;

pub struct FakeMachine {
    pub platform: String,
    pub cpus: u16,
    paths: Mutex<HashSet<String>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    execs: Mutex<Vec<String>>,
    pub exec_response: Mutex<HashMap<String, ExecOutput>>,
    pub alive: Mutex<bool>,
    pub fail_upload: Mutex<bool>,
}

impl FakeMachine {
    pub fn new(platform: impl Into<String>, cpus: u16) -> Self {
        Self {
            platform: platform.into(),
            cpus,
            paths: Mutex::new(HashSet::new()),
            files: Mutex::new(HashMap::new()),
            execs: Mutex::new(Vec::new()),
            exec_response: Mutex::new(HashMap::new()),
            alive: Mutex::new(true),
            fail_upload: Mutex::new(false),
        }
    }

    pub fn with_path(self, path: impl Into<String>) -> Self {
        self.paths.lock().insert(path.into());
        self
    }

    pub fn local_file(&self, path: &str, contents: impl Into<Vec<u8>>) {
        self.files.lock().insert(path.to_string(), contents.into());
    }

    pub fn commands_run(&self) -> Vec<String> {
        self.execs.lock().clone()
    }
}

#[async_trait]
impl Machine for FakeMachine {
    async fn probe_platform(&self) -> Result<String, RemoteError> {
        Ok(self.platform.clone())
    }

    async fn probe_cpus(&self) -> Result<u16, RemoteError> {
        Ok(self.cpus)
    }

    async fn path_exists(&self, path: &str) -> Result<bool, RemoteError> {
        Ok(self.paths.lock().contains(path))
    }

    async fn install_packages(&self, _packages: &[String], _platform: &str) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn upload(&self, files: &[FileTransfer]) -> Result<TransferOutcome, RemoteError> {
        let mut outcome = TransferOutcome::default();
        for file in files {
            if *self.fail_upload.lock() {
                outcome.failed.push((file.remote.clone(), "simulated upload failure".into()));
                continue;
            }
            let data = self.files.lock().get(&file.local).cloned().unwrap_or_default();
            self.files.lock().insert(file.remote.clone(), data);
            self.paths.lock().insert(file.remote.clone());
            outcome.succeeded.push(file.remote.clone());
        }
        Ok(outcome)
    }

    async fn download(&self, files: &[FileTransfer]) -> Result<TransferOutcome, RemoteError> {
        let mut outcome = TransferOutcome::default();
        for file in files {
            match self.files.lock().get(&file.remote).cloned() {
                Some(data) => {
                    self.files.lock().insert(file.local.clone(), data);
                    outcome.succeeded.push(file.remote.clone());
                }
                None => outcome.failed.push((file.remote.clone(), "no such remote file".into())),
            }
        }
        Ok(outcome)
    }

    async fn exec(&self, command: &str) -> Result<ExecOutput, RemoteError> {
        self.execs.lock().push(command.to_string());
        if let Some(path) = command.strip_prefix("mkdir -p '").and_then(|s| s.strip_suffix('\'')) {
            self.paths.lock().insert(path.to_string());
        }
        if let Some(response) = self.exec_response.lock().get(command) {
            return Ok(response.clone());
        }
        Ok(ExecOutput { exit_code: 0, stdout: String::new(), stderr: String::new() })
    }

    async fn spawn_detached(&self, command: &str, _cwd: &str) -> Result<(), RemoteError> {
        self.execs.lock().push(command.to_string());
        Ok(())
    }

    async fn process_alive(&self, _check: &LivenessCheck) -> Result<bool, RemoteError> {
        Ok(*self.alive.lock())
    }
}
