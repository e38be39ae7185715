//! HTTP surface: the `/api/images` JSON routes.

mod error;
mod routes;

pub use error::ApiError;
pub use routes::{make_app, run_server};
