pub use crate::error::{ClResult, Error};
pub use crate::types::{OrgName, Timestamp, TnId, UserId};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
