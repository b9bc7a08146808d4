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

//! The seam between [`CassandraCluster`](crate::CassandraCluster) and the
//! database driver. Production code uses [`ScyllaDriver`](crate::ScyllaDriver);
//! tests plug in a mock that hands out distinct instances per call.

use crate::consistency::ConsistencyLevel;
use crate::error::Result;
use async_trait::async_trait;
use scylla::value::CqlValue;
use std::fmt;

/// Username/password pair sent to the cluster on connect.
#[derive(Clone, PartialEq, Eq)]
pub struct PlainTextAuthProvider {
    pub username: String,
    pub password: String,
}

impl PlainTextAuthProvider {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for PlainTextAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainTextAuthProvider")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Builds cluster handles. Construction does not touch the network.
pub trait Driver: Send + Sync + 'static {
    type Cluster: ClusterHandle;

    fn cluster(
        &self,
        nodes: &[String],
        port: u16,
        auth: Option<PlainTextAuthProvider>,
    ) -> Self::Cluster;
}

/// Reachability to a set of nodes; the owner of keyspace sessions.
#[async_trait]
pub trait ClusterHandle: Send + Sync + 'static {
    type Session: SessionHandle;

    /// Open a session bound to `keyspace`, with `consistency` as its default if given.
    async fn connect(
        &self,
        keyspace: &str,
        consistency: Option<ConsistencyLevel>,
    ) -> Result<Self::Session>;

    async fn shutdown(&self);
}

/// A keyspace-bound session that prepares and executes statements.
#[async_trait]
pub trait SessionHandle: Send + Sync + 'static {
    type Statement: Clone + Send + Sync + 'static;
    type Rows: Send + 'static;

    async fn prepare(&self, query: &str) -> Result<Self::Statement>;

    async fn execute(
        &self,
        statement: &Self::Statement,
        params: Vec<CqlValue>,
    ) -> Result<Self::Rows>;
}
