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
use scylla::errors::{ExecutionError, NewSessionError, PrepareError};

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("No query prepared with name \"{0}\" and query is not specified")]
    InvalidArgument(String),
    #[error("No keyspace given and no default keyspace configured")]
    NoKeyspace,
    #[error("Cassandra cluster is not bound to a configuration")]
    Unbound,
    #[error("Cassandra cluster handle has been shut down")]
    ClusterShutDown,
    // Driver errors pass through untouched.
    #[error(transparent)]
    NewSession(#[from] NewSessionError),
    #[error(transparent)]
    Prepare(#[from] PrepareError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

pub type Result<T, E = ClusterError> = std::result::Result<T, E>;
