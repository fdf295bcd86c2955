pub mod rate_limiting;
pub mod validation;

pub use rate_limiting::{client_identity, rate_limit_middleware};
pub use validation::validate_payload;
