//! API Module
//!
//! HTTP handlers and routing for the block cache REST API.
//!
//! # Endpoints
//! - `PUT /blocks` - Store a block
//! - `POST /blocks/batch` - Store a batch of blocks
//! - `GET /blocks/:cid` - Fetch a block
//! - `GET /blocks/:cid/has` - Check presence
//! - `GET /blocks/:cid/size` - Fetch a block's size
//! - `DELETE /blocks/:cid` - Delete a block
//! - `GET /stats` - Cache layer statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
