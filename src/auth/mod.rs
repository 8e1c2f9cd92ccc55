mod helpers;
mod middleware;
mod provision;
mod token;

pub use helpers::{TokenValidationError, ValidatedToken, extract_token_from_header, validate_token};
pub use middleware::{AuthError, RequireAdmin, RequireUser};
pub use provision::{issue_token, provision_user};
pub use token::{TokenGenerator, parse_token};
