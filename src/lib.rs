pub mod client;
pub mod config;
pub mod dto;
pub mod error;
pub mod language;
pub mod routes;
pub mod state;
pub mod tts;
pub mod vision;

pub use routes::build_router;
pub use state::AppState;
