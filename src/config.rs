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
use serde::{Deserialize, Deserializer};
use std::fmt;

pub const DEFAULT_NODE: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9042;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Contact nodes as given by the application: either a single address or a list.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Nodes {
    One(String),
    Many(Vec<String>),
}

impl Nodes {
    /// Normalizes into a non-empty list; an empty list falls back to `localhost`.
    pub fn into_vec(self) -> Vec<String> {
        let nodes = match self {
            Nodes::One(node) => vec![node],
            Nodes::Many(nodes) => nodes,
        };
        if nodes.is_empty() {
            vec![DEFAULT_NODE.to_string()]
        } else {
            nodes
        }
    }
}

impl From<&str> for Nodes {
    fn from(node: &str) -> Self {
        Nodes::One(node.to_string())
    }
}

impl From<String> for Nodes {
    fn from(node: String) -> Self {
        Nodes::One(node)
    }
}

impl From<Vec<String>> for Nodes {
    fn from(nodes: Vec<String>) -> Self {
        Nodes::Many(nodes)
    }
}

impl From<Vec<&str>> for Nodes {
    fn from(nodes: Vec<&str>) -> Self {
        Nodes::Many(nodes.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Nodes {
    fn from(nodes: &[&str]) -> Self {
        Nodes::Many(nodes.iter().map(|s| s.to_string()).collect())
    }
}

fn default_nodes() -> Vec<String> {
    vec![DEFAULT_NODE.to_string()]
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn deserialize_nodes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Nodes::deserialize(deserializer).map(Nodes::into_vec)
}

/// Connection settings for a [`CassandraCluster`](crate::CassandraCluster).
///
/// Can be built by hand, deserialized as part of a larger application config,
/// or loaded from `CASSANDRA_*` environment variables with [`CassandraConfig::from_env`].
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CassandraConfig {
    /// Contact addresses, without port.
    #[serde(default = "default_nodes", deserialize_with = "deserialize_nodes")]
    pub nodes: Vec<String>,

    /// Port used for every contact address.
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Keyspace used when none is given explicitly.
    #[serde(default)]
    pub keyspace: Option<String>,

    /// Applied to sessions created after binding, never to existing ones.
    #[serde(default)]
    pub consistency_level: Option<ConsistencyLevel>,
}

impl CassandraConfig {
    pub fn new(nodes: impl Into<Nodes>) -> Self {
        Self::default().with_nodes(nodes)
    }

    pub fn with_nodes(mut self, nodes: impl Into<Nodes>) -> Self {
        self.nodes = nodes.into().into_vec();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_credentials(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    pub fn with_consistency_level(mut self, level: ConsistencyLevel) -> Self {
        self.consistency_level = Some(level);
        self
    }

    /// The user/password pair, only when both are set and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.user.as_deref(), self.password.as_deref()) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some((user, password))
            }
            _ => None,
        }
    }

    /// Default keyspace, treating an empty name as unset.
    pub fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref().filter(|ks| !ks.is_empty())
    }

    /// Load configuration from environment variables.
    ///
    /// - `CASSANDRA_NODES` - one address, or a comma-separated list (default: `localhost`)
    /// - `CASSANDRA_PORT` (default: 9042)
    /// - `CASSANDRA_USER` / `CASSANDRA_PASSWORD` - plaintext auth, both required to activate
    /// - `CASSANDRA_KEYSPACE` - default keyspace
    /// - `CASSANDRA_CONSISTENCY_LEVEL` - e.g. `LOCAL_QUORUM`
    ///
    /// Empty values are treated as unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(nodes) = env_var("CASSANDRA_NODES") {
            let nodes: Vec<String> = nodes
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            config = config.with_nodes(nodes);
        }

        if let Some(port) = env_var("CASSANDRA_PORT") {
            config.port = port.parse().map_err(|e| ConfigError::ParseError {
                key: "CASSANDRA_PORT".to_string(),
                details: format!("{}", e),
            })?;
        }

        config.user = env_var("CASSANDRA_USER");
        config.password = env_var("CASSANDRA_PASSWORD");
        config.keyspace = env_var("CASSANDRA_KEYSPACE");

        if let Some(level) = env_var("CASSANDRA_CONSISTENCY_LEVEL") {
            config.consistency_level = Some(level.parse().map_err(|e| ConfigError::ParseError {
                key: "CASSANDRA_CONSISTENCY_LEVEL".to_string(),
                details: format!("{}", e),
            })?);
        }

        Ok(config)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Default for CassandraConfig {
    fn default() -> Self {
        Self {
            nodes: default_nodes(),
            port: DEFAULT_PORT,
            user: None,
            password: None,
            keyspace: None,
            consistency_level: None,
        }
    }
}

// Connection string form, e.g. `cql://app@[10.0.0.1, 10.0.0.2]:9042/shop`.
impl fmt::Display for CassandraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("cql://")?;
        if let Some(user) = self.user.as_deref().filter(|u| !u.is_empty()) {
            f.write_str(user)?;
            if self.password.is_some() {
                f.write_str(":***")?;
            }
            f.write_str("@")?;
        }
        let hosts = self.nodes.join(", ");
        if self.nodes.len() == 1 {
            write!(f, "{}", hosts)?;
        } else {
            write!(f, "[{}]", hosts)?;
        }
        write!(f, ":{}", self.port)?;
        if let Some(keyspace) = self.keyspace() {
            write!(f, "/{}", keyspace)?;
        }
        Ok(())
    }
}

// Keep passwords out of logs.
impl fmt::Debug for CassandraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CassandraConfig")
            .field("nodes", &self.nodes)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("keyspace", &self.keyspace)
            .field("consistency_level", &self.consistency_level)
            .finish()
    }
}
