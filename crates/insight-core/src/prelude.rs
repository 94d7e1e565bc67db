pub use crate::app::{App, AppState};
pub use insight_types::error::{ClResult, Error};
pub use insight_types::types::{OrgName, Timestamp, TnId, UserId};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
