//! Numeric codes reported in structured results and exclusion lists.

pub const USER_NOT_FOUND: u32 = 1001;
pub const USER_IS_NOT_ACTIVE: u32 = 1002;
pub const USER_KEY_CONFLICT: u32 = 1003;

pub const INVALID_INPUT: u32 = 4001;

pub const TENANT_NOT_FOUND: u32 = 10001;
pub const TENANT_HAS_NO_SITE: u32 = 10002;
pub const TENANT_HAS_MORE_THAN_ONE_SITE: u32 = 10003;
pub const TENANT_HAS_NO_LMS_BASE: u32 = 10004;
pub const TENANT_LMS_BASE_SITE_MISMATCH: u32 = 10005;
pub const TENANT_DASHBOARD_NOT_ENABLED: u32 = 10006;
pub const TENANT_COURSE_ORG_FILTER_NOT_VALID: u32 = 10007;

// vim: ts=4
