pub mod lifecycle;
pub mod pricing;
pub mod repository;
pub mod routes;
pub mod service;

pub use routes::get_router;
