pub mod handlers;
pub mod identity;
pub mod middleware;

pub use identity::{
    current_identity, require_admin, require_authenticated, AccessError, Identity,
};
