mod auth_service;
mod lookup_service;
mod registration_service;

pub use auth_service::*;
pub use lookup_service::*;
pub use registration_service::*;
