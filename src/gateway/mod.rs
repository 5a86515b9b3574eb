pub mod routes;
mod server;

pub use routes::{build_routes, CaptionRequest, HealthResponse};
pub use server::*;
