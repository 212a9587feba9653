pub mod routes;

// Re-export public types and functions
pub use routes::proxy_request;
