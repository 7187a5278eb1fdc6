pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;

pub use db::sqlite::Storage;
pub use error::PivotError;
pub use router::{pivot_router, PivotState};
