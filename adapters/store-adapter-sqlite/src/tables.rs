//! Table names per platform release

use insight_types::release::PlatformRelease;

/// Physical table names. Chosen once when the adapter is opened.
#[derive(Debug, Clone)]
pub(crate) struct TableMap {
	pub tenants: &'static str,
	pub routes: &'static str,
	pub users: &'static str,
	pub signup_sources: &'static str,
	pub course_access_roles: &'static str,
	pub courses: &'static str,
	pub enrollments: &'static str,
	pub certificates: &'static str,
	pub course_feedback: &'static str,
}

const BASE: TableMap = TableMap {
	tenants: "eox_tenant_tenantconfig",
	routes: "eox_tenant_route",
	users: "auth_user",
	signup_sources: "student_usersignupsource",
	course_access_roles: "student_courseaccessrole",
	courses: "course_overviews_courseoverview",
	enrollments: "student_courseenrollment",
	certificates: "certificates_generatedcertificate",
	course_feedback: "eox_nelp_feedbackcourse",
};

impl TableMap {
	pub fn for_release(release: PlatformRelease) -> TableMap {
		// Redwood through Teak share one layout
		match release {
			PlatformRelease::Redwood | PlatformRelease::Sumac | PlatformRelease::Teak => BASE,
		}
	}
}

// vim: ts=4
