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
use crate::config::CassandraConfig;
use crate::consistency::ConsistencyLevel;
use crate::context::AppContext;
use crate::driver::{ClusterHandle, Driver, PlainTextAuthProvider, SessionHandle};
use crate::error::{ClusterError, Result};
use crate::scylla_connector::ScyllaDriver;
use scylla::value::CqlValue;
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub type ClusterOf<D> = <D as Driver>::Cluster;
pub type SessionOf<D> = <ClusterOf<D> as ClusterHandle>::Session;
pub type StatementOf<D> = <SessionOf<D> as SessionHandle>::Statement;
pub type RowsOf<D> = <SessionOf<D> as SessionHandle>::Rows;

struct ClusterState<D: Driver> {
    config: Option<CassandraConfig>,
    // Bumped whenever the caches are dropped, so work started before a reset
    // does not repopulate them afterwards.
    generation: u64,
    cluster: Option<Arc<ClusterOf<D>>>,
    sessions: HashMap<String, Arc<SessionOf<D>>>,
    queries: HashMap<String, HashMap<String, StatementOf<D>>>,
}

impl<D: Driver> ClusterState<D> {
    fn unbound() -> Self {
        Self {
            config: None,
            generation: 0,
            cluster: None,
            sessions: HashMap::new(),
            queries: HashMap::new(),
        }
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.cluster = None;
        self.sessions.clear();
        self.queries.clear();
    }
}

/// What a caller needs from the locked state to go and talk to the driver.
struct Binding<C> {
    cluster: Arc<C>,
    nodes: Vec<String>,
    keyspace: Option<String>,
    consistency: Option<ConsistencyLevel>,
    generation: u64,
}

/// Application-level access to one Cassandra cluster.
///
/// Lazily builds a single cluster handle, one session per keyspace, and one
/// prepared statement per (keyspace, name). Share it behind an `Arc`.
///
/// Lazy initialization is not serialized: two tasks hitting an uncached
/// keyspace at the same time may both open a session, and the later one
/// replaces the earlier in the cache. Each caller still gets a working session.
pub struct CassandraCluster<D: Driver = ScyllaDriver> {
    driver: D,
    state: Mutex<ClusterState<D>>,
}

impl<D: Driver> CassandraCluster<D> {
    /// A manager with no configuration; call [`init_app`](Self::init_app) before use.
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            state: Mutex::new(ClusterState::unbound()),
        }
    }

    pub fn with_config(driver: D, config: CassandraConfig) -> Self {
        let mut state = ClusterState::unbound();
        state.config = Some(config);
        Self {
            driver,
            state: Mutex::new(state),
        }
    }

    /// Bind (or re-bind) to `config`.
    ///
    /// Drops every cached session and prepared statement along with the
    /// cluster handle. If `active` still holds a handle from an earlier
    /// binding, that handle is shut down first.
    pub async fn init_app(
        &self,
        config: CassandraConfig,
        active: Option<&AppContext<ClusterOf<D>>>,
    ) {
        if let Some(ctx) = active {
            if let Some(previous) = ctx.take().await {
                previous.shutdown().await;
            }
        }

        let mut state = self.state.lock().await;
        state.reset();
        state.config = Some(config);
    }

    /// The bound configuration, if any.
    pub async fn config(&self) -> Option<CassandraConfig> {
        self.state.lock().await.config.clone()
    }

    async fn bind_cluster(&self) -> Result<Binding<ClusterOf<D>>> {
        let mut state = self.state.lock().await;
        let config = state.config.clone().ok_or(ClusterError::Unbound)?;

        let cluster = match state.cluster.clone() {
            Some(cluster) => cluster,
            None => {
                let auth = config
                    .credentials()
                    .map(|(user, password)| PlainTextAuthProvider::new(user, password));
                let cluster = Arc::new(self.driver.cluster(&config.nodes, config.port, auth));
                state.cluster = Some(Arc::clone(&cluster));
                cluster
            }
        };

        Ok(Binding {
            cluster,
            keyspace: config.keyspace().map(str::to_string),
            consistency: config.consistency_level,
            nodes: config.nodes,
            generation: state.generation,
        })
    }

    async fn connect_keyspace(
        &self,
        keyspace: Option<&str>,
        level: Option<ConsistencyLevel>,
    ) -> Result<Option<(String, Arc<SessionOf<D>>, u64)>> {
        let mut binding = self.bind_cluster().await?;

        let keyspace = match keyspace.filter(|ks| !ks.is_empty()) {
            Some(keyspace) => keyspace.to_string(),
            None => match binding.keyspace.clone() {
                Some(keyspace) => keyspace,
                None => return Ok(None),
            },
        };

        let mut retried = false;
        loop {
            let cached = self.state.lock().await.sessions.get(&keyspace).cloned();
            if let Some(session) = cached {
                return Ok(Some((keyspace, session, binding.generation)));
            }

            debug!(
                nodes = ?binding.nodes,
                keyspace = %keyspace,
                "Connecting to Cassandra cluster"
            );
            let session = match binding
                .cluster
                .connect(&keyspace, level.or(binding.consistency))
                .await
            {
                Ok(session) => Arc::new(session),
                Err(err) => {
                    // The handle may have been torn down by another context
                    // while we were connecting; try once more on a fresh one.
                    let stale = self.state.lock().await.generation != binding.generation;
                    if retried || !stale {
                        return Err(err);
                    }
                    retried = true;
                    binding = self.bind_cluster().await?;
                    continue;
                }
            };

            let mut state = self.state.lock().await;
            if state.generation == binding.generation {
                state.sessions.insert(keyspace.clone(), Arc::clone(&session));
            }
            return Ok(Some((keyspace, session, binding.generation)));
        }
    }

    /// Session for `keyspace`, or for the default keyspace when `None`.
    ///
    /// Returns `Ok(None)` when neither names a keyspace. `level` only takes
    /// effect when a new session is opened; a cached session is returned as is.
    pub async fn connect(
        &self,
        keyspace: Option<&str>,
        level: Option<ConsistencyLevel>,
    ) -> Result<Option<Arc<SessionOf<D>>>> {
        Ok(self
            .connect_keyspace(keyspace, level)
            .await?
            .map(|(_, session, _)| session))
    }

    /// The session for the default keyspace.
    pub async fn session(&self) -> Result<Option<Arc<SessionOf<D>>>> {
        self.connect(None, None).await
    }

    pub async fn get_session(&self, keyspace: &str) -> Result<Option<Arc<SessionOf<D>>>> {
        self.connect(Some(keyspace), None).await
    }

    async fn keyspace_session(
        &self,
        keyspace: Option<&str>,
    ) -> Result<(String, Arc<SessionOf<D>>, u64)> {
        self.connect_keyspace(keyspace, None)
            .await?
            .ok_or(ClusterError::NoKeyspace)
    }

    async fn cached_statement(&self, keyspace: &str, name: &str) -> Option<StatementOf<D>> {
        self.state
            .lock()
            .await
            .queries
            .get(keyspace)
            .and_then(|queries| queries.get(name))
            .cloned()
    }

    async fn prepare_in(
        &self,
        keyspace: &str,
        session: &SessionOf<D>,
        generation: u64,
        name: &str,
        query: &str,
        force: bool,
    ) -> Result<StatementOf<D>> {
        if !force {
            if let Some(statement) = self.cached_statement(keyspace, name).await {
                return Ok(statement);
            }
        }

        let statement = session.prepare(query).await?;

        let mut state = self.state.lock().await;
        if state.generation == generation {
            state
                .queries
                .entry(keyspace.to_string())
                .or_default()
                .insert(name.to_string(), statement.clone());
        }
        Ok(statement)
    }

    /// Prepare `query` under `name` in `keyspace` (default keyspace when `None`).
    ///
    /// An already prepared statement with that name is returned unless `force`
    /// is set, in which case `query` is compiled again and replaces it.
    pub async fn prepare_query(
        &self,
        name: &str,
        query: &str,
        keyspace: Option<&str>,
        force: bool,
    ) -> Result<StatementOf<D>> {
        let (keyspace, session, generation) = self.keyspace_session(keyspace).await?;
        self.prepare_in(&keyspace, &session, generation, name, query, force)
            .await
    }

    /// Execute the statement prepared under `name`.
    ///
    /// When nothing is prepared under that name yet, `query` is prepared first;
    /// without a `query` this fails with [`ClusterError::InvalidArgument`].
    /// The driver's result is returned unchanged.
    pub async fn execute_prepared(
        &self,
        name: &str,
        keyspace: Option<&str>,
        query: Option<&str>,
        params: Vec<CqlValue>,
    ) -> Result<RowsOf<D>> {
        let (keyspace, session, generation) = self.keyspace_session(keyspace).await?;

        let statement = match self.cached_statement(&keyspace, name).await {
            Some(statement) => statement,
            None => {
                let query = query.ok_or_else(|| ClusterError::InvalidArgument(name.to_string()))?;
                self.prepare_in(&keyspace, &session, generation, name, query, false)
                    .await?
            }
        };

        session.execute(&statement, params).await
    }

    /// Release the cluster handle and everything cached, and unbind.
    pub async fn shutdown(&self) {
        let cluster = {
            let mut state = self.state.lock().await;
            let cluster = state.cluster.take();
            state.reset();
            state.config = None;
            cluster
        };

        if let Some(cluster) = cluster {
            cluster.shutdown().await;
        }
    }

    /// End-of-context hook: shuts down the handle held by `ctx`, if any.
    ///
    /// When that handle is the one this manager is caching, the manager forgets
    /// it along with its sessions and statements; the next access rebuilds them.
    /// `_error` is whatever ended the context and is never inspected.
    pub async fn teardown(
        &self,
        ctx: &AppContext<ClusterOf<D>>,
        _error: Option<&(dyn Error + Send + Sync)>,
    ) {
        let Some(cluster) = ctx.take().await else {
            return;
        };

        {
            let mut state = self.state.lock().await;
            if state
                .cluster
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, &cluster))
            {
                state.reset();
            }
        }

        cluster.shutdown().await;
    }

    /// The cluster handle for `ctx`, created on first access within that context.
    pub async fn connection(&self, ctx: &AppContext<ClusterOf<D>>) -> Result<Arc<ClusterOf<D>>> {
        let mut slot = ctx.slot().lock().await;
        if let Some(cluster) = slot.as_ref() {
            return Ok(Arc::clone(cluster));
        }

        self.connect(None, None).await?;
        let cluster = self.bind_cluster().await?.cluster;
        *slot = Some(Arc::clone(&cluster));
        Ok(cluster)
    }
}
