//! ZXY Multi-Source Proxy HTTP server
//!
//! Exposes [`zxy_core::ZxyProxy`] to the browser client:
//!
//! | Route | Answer |
//! |---|---|
//! | `GET /api/search-source-original?query=` | search results HTML |
//! | `GET /api/search-source-fsyuyou?query=` | search results HTML |
//! | `GET /api/get-play-data?source=&path=` | play page HTML |
//! | `GET\|POST /api/get-stream-url` (`source`, `path`, `title`) | `{ "streamUrl": ... }` |
//! | `GET /health` | `{ "status": "ok" }` |
//!
//! Failures are answered with `{ "error": ... }` and a non-2xx status.

pub mod config;
pub mod routes;

pub use config::ServerConfig;
pub use routes::{AppState, router};
