// Authentication module
// Decision: Password and OAuth sign-in both end in the same JWT session cookie
// Decision: The session guard reads the session through RequestSession

pub mod config;
pub mod jwt;
pub mod middleware;
pub mod oauth;
pub mod routes;

pub use config::AuthConfig;
pub use middleware::{AuthError, AuthState, AuthUser, FromRef};
pub use routes::routes;
