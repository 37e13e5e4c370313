//! Render-time authorization: who is calling, and may they see this page.

pub mod caller;
pub mod role_gate;

pub use caller::CurrentCaller;
pub use role_gate::{authorize, check_role, GateRejection, UNAUTHORIZED_PATH};
