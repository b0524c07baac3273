//! API Routes
//!
//! Configures the Axum router with all block cache endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, get_block_handler, has_handler, health_handler, put_batch_handler,
    put_block_handler, size_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /blocks` - Store the request body as a block
/// - `POST /blocks/batch` - Store a batch of blocks
/// - `GET /blocks/:cid` - Fetch a block's bytes
/// - `DELETE /blocks/:cid` - Delete a block
/// - `GET /blocks/:cid/has` - Check presence
/// - `GET /blocks/:cid/size` - Fetch a block's size
/// - `GET /stats` - Cache layer statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/blocks", put(put_block_handler))
        .route("/blocks/batch", post(put_batch_handler))
        .route("/blocks/:cid", get(get_block_handler).delete(delete_handler))
        .route("/blocks/:cid/has", get(has_handler))
        .route("/blocks/:cid/size", get(size_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::cached_blockstore;
    use crate::config::CacheOpts;
    use crate::store::MemoryBlockstore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let store = cached_blockstore(Arc::new(MemoryBlockstore::new()), &CacheOpts::default())
            .unwrap();
        create_router(AppState::new(store))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_put_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/blocks")
                    .body(Body::from("hello"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_bad_cid() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/blocks/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
