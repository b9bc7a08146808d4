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
use anyhow::{Context, Result};
use cassandra_cluster::{AppContext, CassandraCluster, CassandraConfig, ScyllaDriver, http_server};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = CassandraConfig::from_env().context("Invalid Cassandra configuration")?;
    info!("Binding Cassandra cluster {}", config);
    let cluster = Arc::new(CassandraCluster::with_config(ScyllaDriver, config));

    // Application-wide context; torn down once the server stops.
    let app_ctx = AppContext::new();
    cluster
        .connection(&app_ctx)
        .await
        .context("Failed to connect to Cassandra")?;

    let addr: SocketAddr = std::env::var("CASSANDRA_HTTP_ADDR")
        .unwrap_or_else(|_| DEFAULT_HTTP_ADDR.to_string())
        .parse()
        .context("Failed to parse CASSANDRA_HTTP_ADDR")?;

    info!("Starting HTTP server...");
    let served = http_server::run_server(addr, Arc::clone(&cluster)).await;

    cluster.teardown(&app_ctx, served.as_ref().err().map(|e| &**e)).await;
    cluster.shutdown().await;
    served
}
