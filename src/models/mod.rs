pub mod ids;
pub mod refresh_token;
pub mod role;
pub mod user;

pub use ids::{FamilyId, TokenId};
pub use refresh_token::RefreshTokenRow;
pub use role::RoleGrant;
pub use user::{User, UserSummary};
