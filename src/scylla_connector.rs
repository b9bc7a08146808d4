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
use crate::consistency::ConsistencyLevel;
use crate::driver::{ClusterHandle, Driver, PlainTextAuthProvider, SessionHandle};
use crate::error::{ClusterError, Result};
use async_trait::async_trait;
use scylla::client::execution_profile::ExecutionProfile;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::response::query_result::QueryResult;
use scylla::statement::prepared::PreparedStatement;
use scylla::value::CqlValue;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Production driver backed by the `scylla` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScyllaDriver;

impl Driver for ScyllaDriver {
    type Cluster = ScyllaCluster;

    fn cluster(
        &self,
        nodes: &[String],
        port: u16,
        auth: Option<PlainTextAuthProvider>,
    ) -> ScyllaCluster {
        ScyllaCluster {
            known_nodes: nodes.iter().map(|node| format!("{}:{}", node, port)).collect(),
            auth,
            closed: AtomicBool::new(false),
        }
    }
}

/// The driver has no standalone cluster object, so this keeps what every
/// keyspace session needs to connect and builds one `Session` per keyspace.
#[derive(Debug)]
pub struct ScyllaCluster {
    known_nodes: Vec<String>,
    auth: Option<PlainTextAuthProvider>,
    closed: AtomicBool,
}

impl ScyllaCluster {
    /// Contact points as `host:port`.
    pub fn known_nodes(&self) -> &[String] {
        &self.known_nodes
    }

    pub fn auth(&self) -> Option<&PlainTextAuthProvider> {
        self.auth.as_ref()
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl ClusterHandle for ScyllaCluster {
    type Session = ScyllaSession;

    async fn connect(
        &self,
        keyspace: &str,
        consistency: Option<ConsistencyLevel>,
    ) -> Result<ScyllaSession> {
        if self.is_shut_down() {
            return Err(ClusterError::ClusterShutDown);
        }

        let mut builder = SessionBuilder::new()
            .known_nodes(&self.known_nodes)
            .use_keyspace(keyspace, true);

        if let Some(auth) = &self.auth {
            builder = builder.user(&auth.username, &auth.password);
        }

        if let Some(level) = consistency {
            let profile = ExecutionProfile::builder().consistency(level.into()).build();
            builder = builder.default_execution_profile_handle(profile.into_handle());
        }

        let session = builder.build().await?;
        info!(nodes = ?self.known_nodes, keyspace, "Connected to ScyllaDB");
        Ok(ScyllaSession {
            session: Arc::new(session),
        })
    }

    async fn shutdown(&self) {
        // Sessions close once their last handle is dropped; this only stops new ones.
        self.closed.store(true, Ordering::Release);
        debug!(nodes = ?self.known_nodes, "Cluster handle shut down");
    }
}

#[derive(Clone)]
pub struct ScyllaSession {
    session: Arc<Session>,
}

impl ScyllaSession {
    /// The underlying driver session, for anything beyond prepare/execute.
    pub fn inner(&self) -> &Session {
        &self.session
    }
}

#[async_trait]
impl SessionHandle for ScyllaSession {
    type Statement = PreparedStatement;
    type Rows = QueryResult;

    async fn prepare(&self, query: &str) -> Result<PreparedStatement> {
        Ok(self.session.prepare(query).await?)
    }

    async fn execute(
        &self,
        statement: &PreparedStatement,
        params: Vec<CqlValue>,
    ) -> Result<QueryResult> {
        Ok(self.session.execute_unpaged(statement, params).await?)
    }
}
