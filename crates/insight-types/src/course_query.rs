//! Immutable course query descriptor.
//!
//! Statistics code never builds SQL. It describes the course set it wants with a
//! `CourseQuery` and hands it to a [`LearningAdapter`](crate::learning_adapter::LearningAdapter).
//! Every builder method consumes the descriptor and returns a new one, so a base
//! query can be cloned and refined without affecting other users of it.
//!
//! Annotations ask the adapter to attach computed counts to each course. Removable
//! annotations are helpers for an intermediate step; `strip_removable` drops them
//! before the query is reused for plain counting.

use std::collections::BTreeSet;

use crate::learning_adapter::Course;
use crate::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Annotation {
	/// Downloadable certificates of active users
	CertificatesCount,
	/// Active enrollments of active users
	EnrollmentsCount,
}

/// Which courses under the query orgs are reachable
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CourseScope {
	#[default]
	All,
	/// Whole orgs in `full_orgs`, plus the individual `courses`
	Restricted { full_orgs: BTreeSet<OrgName>, courses: BTreeSet<Box<str>> },
}

impl CourseScope {
	pub fn allows(&self, org: &OrgName, course_id: &str) -> bool {
		match self {
			CourseScope::All => true,
			CourseScope::Restricted { full_orgs, courses } => {
				full_orgs.contains(org) || courses.contains(course_id)
			}
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseQuery {
	orgs: Vec<OrgName>,
	scope: CourseScope,
	visible: Option<bool>,
	active: Option<bool>,
	now: Timestamp,
	annotations: BTreeSet<Annotation>,
	removable: BTreeSet<Annotation>,
}

impl CourseQuery {
	/// Courses of `orgs`, visible only, any date window
	pub fn new(orgs: impl IntoIterator<Item = OrgName>) -> Self {
		let mut orgs: Vec<OrgName> = orgs.into_iter().collect();
		orgs.sort();
		orgs.dedup();
		CourseQuery {
			orgs,
			scope: CourseScope::All,
			visible: Some(true),
			active: None,
			now: Timestamp::now(),
			annotations: BTreeSet::new(),
			removable: BTreeSet::new(),
		}
	}

	/// `Some(true)` visible courses only, `Some(false)` hidden only, `None` both
	pub fn visible(mut self, visible: Option<bool>) -> Self {
		self.visible = visible;
		self
	}

	/// `Some(true)` courses within their date window, `Some(false)` outside it
	pub fn active(mut self, active: Option<bool>) -> Self {
		self.active = active;
		self
	}

	/// Reference time for the active filter
	pub fn at(mut self, now: Timestamp) -> Self {
		self.now = now;
		self
	}

	pub fn restrict_to(mut self, scope: CourseScope) -> Self {
		self.scope = scope;
		self
	}

	pub fn annotate(mut self, annotation: Annotation) -> Self {
		self.annotations.insert(annotation);
		self
	}

	pub fn annotate_removable(mut self, annotation: Annotation) -> Self {
		if self.annotations.insert(annotation) {
			self.removable.insert(annotation);
		}
		self
	}

	pub fn strip_removable(mut self) -> Self {
		let removable = std::mem::take(&mut self.removable);
		self.annotations.retain(|a| !removable.contains(a));
		self
	}

	pub fn orgs(&self) -> &[OrgName] {
		&self.orgs
	}

	pub fn scope(&self) -> &CourseScope {
		&self.scope
	}

	pub fn visible_filter(&self) -> Option<bool> {
		self.visible
	}

	pub fn active_filter(&self) -> Option<bool> {
		self.active
	}

	pub fn now(&self) -> Timestamp {
		self.now
	}

	pub fn has_annotation(&self, annotation: Annotation) -> bool {
		self.annotations.contains(&annotation)
	}

	pub fn removable_annotations(&self) -> impl Iterator<Item = &Annotation> {
		self.removable.iter()
	}

	/// No org in scope, nothing can match
	pub fn is_empty(&self) -> bool {
		self.orgs.is_empty()
	}

	/// In-memory evaluation, for adapters that filter after loading
	pub fn matches(&self, course: &Course) -> bool {
		let Some(org) = course.org_name() else {
			return false;
		};
		self.orgs.contains(&org)
			&& self.scope.allows(&org, &course.course_id)
			&& self.visible.is_none_or(|v| course.is_visible() == v)
			&& self.active.is_none_or(|a| course.is_active_at(self.now) == a)
	}
}


// vim: ts=4
