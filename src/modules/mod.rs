pub mod auth;
pub mod favorite;
pub mod menu;
pub mod order;
pub mod restaurant;
pub mod review;
pub mod user;

mod router;
pub use router::get_router;
