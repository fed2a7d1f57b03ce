mod auth;
mod credentials;

pub use auth::TokenManager;
pub use auth::TokenStatus;
pub use credentials::load_credentials;
