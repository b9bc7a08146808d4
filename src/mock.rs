// Copyright (C) 2025 Kevin Exton
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! In-memory driver for tests. Every cluster, session and statement it hands
//! out carries a fresh id, and every construction call is recorded.

use crate::consistency::ConsistencyLevel;
use crate::driver::{ClusterHandle, Driver, PlainTextAuthProvider, SessionHandle};
use crate::error::{ClusterError, Result};
use async_trait::async_trait;
use scylla::value::CqlValue;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Pauses one driver call until the test releases it.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl Gate {
    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[derive(Default)]
pub struct Calls {
    next_id: AtomicUsize,
    pub clusters: Mutex<Vec<(Vec<String>, u16)>>,
    pub auth: Mutex<Vec<(String, String)>>,
    pub connects: Mutex<Vec<(String, Option<ConsistencyLevel>)>>,
    pub prepares: Mutex<Vec<String>>,
    pub shutdowns: AtomicUsize,
    connect_gate: Mutex<Option<Arc<Gate>>>,
    prepare_gate: Mutex<Option<Arc<Gate>>>,
}

impl Calls {
    fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// The next `connect` call waits on the returned gate.
    pub fn arm_connect_gate(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.connect_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// The next `prepare` call waits on the returned gate.
    pub fn arm_prepare_gate(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.prepare_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.lock().unwrap().len()
    }

    pub fn connect_count(&self) -> usize {
        self.connects.lock().unwrap().len()
    }

    pub fn prepare_count(&self) -> usize {
        self.prepares.lock().unwrap().len()
    }

    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Default)]
pub struct MockDriver {
    pub calls: Arc<Calls>,
}

impl Driver for MockDriver {
    type Cluster = MockCluster;

    fn cluster(
        &self,
        nodes: &[String],
        port: u16,
        auth: Option<PlainTextAuthProvider>,
    ) -> MockCluster {
        self.calls.clusters.lock().unwrap().push((nodes.to_vec(), port));
        if let Some(auth) = &auth {
            self.calls
                .auth
                .lock()
                .unwrap()
                .push((auth.username.clone(), auth.password.clone()));
        }
        MockCluster {
            id: self.calls.next_id(),
            calls: Arc::clone(&self.calls),
            shut_down: AtomicBool::new(false),
        }
    }
}

pub struct MockCluster {
    pub id: usize,
    calls: Arc<Calls>,
    shut_down: AtomicBool,
}

impl MockCluster {
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClusterHandle for MockCluster {
    type Session = MockSession;

    async fn connect(
        &self,
        keyspace: &str,
        consistency: Option<ConsistencyLevel>,
    ) -> Result<MockSession> {
        let gate = self.calls.connect_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        if self.is_shut_down() {
            return Err(ClusterError::ClusterShutDown);
        }
        self.calls
            .connects
            .lock()
            .unwrap()
            .push((keyspace.to_string(), consistency));
        Ok(MockSession {
            id: self.calls.next_id(),
            keyspace: keyspace.to_string(),
            consistency,
            calls: Arc::clone(&self.calls),
        })
    }

    async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
        self.calls.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MockSession {
    pub id: usize,
    pub keyspace: String,
    pub consistency: Option<ConsistencyLevel>,
    calls: Arc<Calls>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MockStatement {
    pub id: usize,
    pub query: String,
}

#[derive(Debug, PartialEq)]
pub struct MockRows {
    pub keyspace: String,
    pub statement: MockStatement,
    pub params: Vec<CqlValue>,
}

#[async_trait]
impl SessionHandle for MockSession {
    type Statement = MockStatement;
    type Rows = MockRows;

    async fn prepare(&self, query: &str) -> Result<MockStatement> {
        let gate = self.calls.prepare_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        self.calls.prepares.lock().unwrap().push(query.to_string());
        Ok(MockStatement {
            id: self.calls.next_id(),
            query: query.to_string(),
        })
    }

    async fn execute(
        &self,
        statement: &MockStatement,
        params: Vec<CqlValue>,
    ) -> Result<MockRows> {
        Ok(MockRows {
            keyspace: self.keyspace.clone(),
            statement: statement.clone(),
            params,
        })
    }
}
