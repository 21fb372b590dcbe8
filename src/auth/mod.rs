use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::TokenError;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
