pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod tasks;
pub mod upload;
pub mod ws;

pub use handlers::ErrorResponse;
pub use routes::create_router;
