//! Business logic: token issuance/rotation and role/permission resolution.

mod hasher;
mod jwt;
mod rbac;
mod token;

pub use hasher::{SecretHasher, Sha256Hasher};
pub use jwt::{AccessTokenClaims, JwtService};
pub use rbac::{RbacCache, RbacService, ResolvedGrants};
pub use token::{IssuedTokens, TokenService};
