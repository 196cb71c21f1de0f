pub mod middleware;

pub use middleware::{basic_auth_middleware, BasicAuthState};
