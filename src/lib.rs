/*
 * Zephyr client - HTTP wrappers for the Zephyr Scale and Zephyr Squad REST APIs
 */

// Internal modules
mod apis;
mod auth;
mod client;
mod config;
mod error;
pub mod models;
mod observer;
mod pagination;
mod session;
mod utils;


// Re-export public types and interfaces
pub use apis::*;
pub use auth::{cookies_from_str, Credentials};
pub use client::{
    ApiVersion, CloudApi, ServerApi, ZephyrScale, ZephyrSquad, SCALE_CLOUD_BASE_URL,
    SQUAD_DEFAULT_BASE_URL,
};
pub use config::{SessionConfig, TransportOptions};
pub use error::{ZephyrError, ZephyrResult};
pub use observer::{LogObserver, NoopObserver, RequestObserver};
pub use pagination::{PaginationMode, Paginator, DEFAULT_MAX_PAGES, NO_LABEL_SENTINEL};
pub use session::{accept_zip, QueryParams, Reply, ZephyrRequest, ZephyrSession};
pub use utils::merge_json;

// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ApiVersion, Credentials, PaginationMode, Paginator, QueryParams, SessionConfig,
        TransportOptions, ZephyrError, ZephyrResult, ZephyrScale, ZephyrSession, ZephyrSquad,
    };
}
