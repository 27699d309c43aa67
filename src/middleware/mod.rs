pub mod auth;
pub mod policy;
pub mod response;

pub use auth::{auth_gate, AuthUser};
pub use policy::Access;
pub use response::{ApiResponse, ApiResult};
