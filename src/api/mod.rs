//! HTTP query API
//!
//! Thin axum layer over [`QueryService`]. Parameter validation happens
//! here; queries run on the blocking pool.

mod error;
mod routes;

pub use error::ApiError;
pub use routes::{router, ApiState};

use crate::query::QueryService;
use tokio::net::TcpListener;

/// Bind `addr` and serve the query API until the process exits
pub async fn serve(addr: &str, service: QueryService, default_per_page: u64) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Query API listening");

    axum::serve(listener, router(ApiState::new(service, default_per_page))).await?;

    Ok(())
}
