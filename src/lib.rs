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

//! Application-level access to an Apache Cassandra / ScyllaDB cluster for axum
//! services: one lazily built cluster handle, one session per keyspace, named
//! prepared statements, and teardown at the end of a request or application
//! context.

pub mod cluster;
pub mod config;
pub mod consistency;
pub mod context;
pub mod driver;
pub mod error;
pub mod http_server;
pub mod scylla_connector;

#[cfg(test)]
mod mock;

pub use cluster::CassandraCluster;
pub use config::{CassandraConfig, ConfigError, Nodes};
pub use consistency::ConsistencyLevel;
pub use context::AppContext;
pub use driver::{ClusterHandle, Driver, PlainTextAuthProvider, SessionHandle};
pub use error::{ClusterError, Result};
pub use scylla_connector::{ScyllaCluster, ScyllaDriver, ScyllaSession};
