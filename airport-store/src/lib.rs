pub mod app_config;
pub mod constraints;
pub mod database;
pub mod memory;

mod rows;
mod airplane_repo;
mod crew_repo;
mod airport_repo;
mod route_repo;
mod flight_repo;
mod order_repo;
mod user_repo;

pub use database::PgStore;
pub use memory::MemoryStore;
