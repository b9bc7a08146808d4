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
use crate::cluster::{CassandraCluster, ClusterOf};
use crate::context::AppContext;
use crate::driver::Driver;
use crate::error::ClusterError;
use crate::scylla_connector::ScyllaDriver;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

pub type SharedCluster<D = ScyllaDriver> = Arc<CassandraCluster<D>>;

const RELEASE_VERSION_QUERY: &str = "SELECT release_version FROM system.local";

/// Give every request its own [`AppContext`] and tear it down once the
/// response is produced. Handlers reach the context through
/// `Extension<AppContext<_>>`.
pub async fn cassandra_context<D: Driver>(
    State(cluster): State<SharedCluster<D>>,
    mut request: Request,
    next: Next,
) -> Response {
    let ctx: AppContext<ClusterOf<D>> = AppContext::new();
    request.extensions_mut().insert(ctx.clone());
    let response = next.run(request).await;
    cluster.teardown(&ctx, None).await;
    response
}

/// Register the per-request teardown hook on `router`.
pub fn with_cassandra<S, D>(router: Router<S>, cluster: SharedCluster<D>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    D: Driver,
{
    router.layer(middleware::from_fn_with_state(cluster, cassandra_context::<D>))
}

pub enum HttpError {
    Cluster(ClusterError),
    Rows(String),
}

impl From<ClusterError> for HttpError {
    fn from(err: ClusterError) -> Self {
        HttpError::Cluster(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match &self {
            HttpError::Cluster(ClusterError::InvalidArgument(_) | ClusterError::NoKeyspace) => {
                StatusCode::BAD_REQUEST
            }
            HttpError::Cluster(ClusterError::Unbound | ClusterError::ClusterShutDown) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            HttpError::Cluster(_) | HttpError::Rows(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match self {
            HttpError::Cluster(err) => err.to_string(),
            HttpError::Rows(msg) => msg,
        };
        error!(%status, "{}", message);
        (status, message).into_response()
    }
}

// Shared application state
#[derive(Clone)]
struct AppState {
    cluster: SharedCluster,
}

pub fn router(cluster: SharedCluster) -> Router {
    let routes = Router::new()
        .route("/", get(root_handler))
        .route("/release_version", get(release_version_handler))
        .with_state(AppState {
            cluster: Arc::clone(&cluster),
        });
    with_cassandra(routes, cluster)
}

pub async fn run_server(addr: SocketAddr, cluster: SharedCluster) -> anyhow::Result<()> {
    let app = router(cluster);

    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn root_handler() -> Html<&'static str> {
    Html("<h1>Cassandra cluster</h1><p><a href='/release_version'>Server release version</a></p>\n")
}

async fn release_version_handler(State(state): State<AppState>) -> Result<String, HttpError> {
    let result = state
        .cluster
        .execute_prepared(
            "release_version",
            Some("system"),
            Some(RELEASE_VERSION_QUERY),
            Vec::new(),
        )
        .await?;
    let (version,) = result
        .into_rows_result()
        .map_err(|e| HttpError::Rows(e.to_string()))?
        .first_row::<(String,)>()
        .map_err(|e| HttpError::Rows(e.to_string()))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CassandraConfig;
    use crate::mock::{MockCluster, MockDriver};
    use axum::body::Body;
    use axum::Extension;
    use tower::ServiceExt;

    fn get_request(uri: &str) -> Request {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn app(cluster: SharedCluster<MockDriver>) -> Router {
        let handler_cluster = Arc::clone(&cluster);
        let routes = Router::new()
            .route(
                "/connect",
                get(move |Extension(ctx): Extension<AppContext<MockCluster>>| {
                    let cluster = Arc::clone(&handler_cluster);
                    async move {
                        let first = cluster.connection(&ctx).await?;
                        let second = cluster.connection(&ctx).await?;
                        assert!(Arc::ptr_eq(&first, &second));
                        Ok::<_, HttpError>(first.id.to_string())
                    }
                }),
            )
            .route("/", get(root_handler));
        with_cassandra(routes, cluster)
    }

    #[tokio::test]
    async fn test_request_context_is_torn_down_after_response() {
        let driver = MockDriver::default();
        let calls = Arc::clone(&driver.calls);
        let cluster = Arc::new(CassandraCluster::with_config(driver, CassandraConfig::default()));
        let app = app(Arc::clone(&cluster));

        let response = app.clone().oneshot(get_request("/connect")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.cluster_count(), 1);
        assert_eq!(calls.shutdown_count(), 1);

        let response = app.oneshot(get_request("/connect")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.cluster_count(), 2);
        assert_eq!(calls.shutdown_count(), 2);
    }

    #[tokio::test]
    async fn test_request_without_connection_leaves_cluster_alone() {
        let driver = MockDriver::default();
        let calls = Arc::clone(&driver.calls);
        let cluster = Arc::new(CassandraCluster::with_config(driver, CassandraConfig::default()));

        let response = app(cluster).oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.cluster_count(), 0);
        assert_eq!(calls.shutdown_count(), 0);
    }

    #[tokio::test]
    async fn test_unbound_cluster_maps_to_service_unavailable() {
        let cluster = Arc::new(CassandraCluster::new(MockDriver::default()));

        let response = app(cluster).oneshot(get_request("/connect")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_invalid_argument_maps_to_bad_request() {
        let err = ClusterError::InvalidArgument("q".to_string());
        let response = HttpError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
