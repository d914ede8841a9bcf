pub mod auth;
pub mod handlers;
pub mod routes;
pub mod runtime;
pub mod state;

pub use runtime::run;
pub use state::AppState;
