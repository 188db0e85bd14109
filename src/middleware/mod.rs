pub mod auth;
pub mod authz;
pub mod rate_limit;
pub mod team;

pub use auth::{auth_middleware, AuthUser};
pub use authz::{permission_guard, role_guard, PermissionRequirement, RoleRequirement};
pub use rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter};
pub use team::team_guard;
