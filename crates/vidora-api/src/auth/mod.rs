//! Authentication: token issuance and rotation, cookie transport, password
//! hashing, and the request extractors handlers use to identify callers.

pub mod cookies;
pub mod extract;
pub mod password;
pub mod tokens;

pub use extract::{AuthUser, CurrentUser, MaybeUser};
pub use tokens::TokenService;
