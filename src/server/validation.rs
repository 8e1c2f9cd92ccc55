use crate::server::response::ApiError;
use crate::types::Role;

/// Roles an admin may provision through the API.
pub fn parse_role(role: &str) -> Result<Role, ApiError> {
    role.trim().parse::<Role>().map_err(ApiError::bad_request)
}
