pub use insight_core::prelude::*;
pub use insight_core::permission::PermissionInfo;

// vim: ts=4
