pub mod api;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod fees;
pub mod models;
pub mod records;
pub mod state;

pub use api::build_router;
pub use state::AppState;
