//! Learner metrics resolution.
//!
//! Pipeline per call:
//! 1. authorize the caller for the site
//! 2. validate every course filter against the site's courses (fail closed)
//! 3. pick the population: all site users, or those enrolled in a filtered course
//! 4. project each user with their (filtered) site enrollments, ordered by user id

use std::collections::HashSet;
use std::sync::Arc;

use crate::access::AuthorizationChecker;
use crate::course_key::CourseKey;
use crate::error::{FiguresError, Result};
use crate::model::{EnrollmentMetrics, LearnerMetricRecord, Site, User, UserId};
use crate::repo::MetricsRepository;

/// `+` in a query string decodes to a space; course keys never contain one.
fn normalize_filter(raw: &str) -> String {
    raw.replace(' ', "+")
}

#[derive(Clone)]
pub struct LearnerMetricsResolver {
    repo: Arc<dyn MetricsRepository>,
    authz: Arc<dyn AuthorizationChecker>,
}

impl LearnerMetricsResolver {
    pub fn new(repo: Arc<dyn MetricsRepository>, authz: Arc<dyn AuthorizationChecker>) -> Self {
        Self { repo, authz }
    }

    /// Parse and check raw filter values against the courses of `site`.
    ///
    /// Returns the distinct keys on success. Any malformed value, or any key
    /// not on the site, rejects the whole set; the error lists each offender.
    pub fn validate_filters(&self, site: &Site, course_filters: &[String]) -> Result<HashSet<CourseKey>> {
        if course_filters.is_empty() {
            return Ok(HashSet::new());
        }
        let site_courses: HashSet<CourseKey> = self.repo.courses_of_site(site)?.into_iter().collect();

        let mut keys = HashSet::new();
        let mut rejected = Vec::new();
        for raw in course_filters {
            match normalize_filter(raw).parse::<CourseKey>() {
                Ok(key) if site_courses.contains(&key) => {
                    keys.insert(key);
                }
                _ => {
                    if !rejected.contains(raw) {
                        rejected.push(raw.clone());
                    }
                }
            }
        }

        if !rejected.is_empty() {
            tracing::debug!(site = %site.domain, rejected = ?rejected, "course filters rejected");
            return Err(FiguresError::InvalidFilter { rejected });
        }
        Ok(keys)
    }

    /// Learner metric records for `site`, optionally narrowed to courses.
    ///
    /// With filters, only users holding an enrollment in a filtered course are
    /// returned, and each record's enrollments are limited to those courses.
    pub fn resolve(
        &self,
        site: &Site,
        caller: &User,
        course_filters: &[String],
    ) -> Result<Vec<LearnerMetricRecord>> {
        self.authz.authorize(caller, site)?;
        let filter = self.validate_filters(site, course_filters)?;

        let mut users = self.repo.users_of_site(site)?;
        users.sort_by_key(|u| u.id);
        users.dedup_by_key(|u| u.id);

        let mut out = Vec::with_capacity(users.len());
        for user in &users {
            let enrollments: Vec<EnrollmentMetrics> = self
                .repo
                .enrollments_of_user(user.id, site)?
                .iter()
                .filter(|e| filter.is_empty() || filter.contains(&e.course_id))
                .map(EnrollmentMetrics::from)
                .collect();

            if !filter.is_empty() && enrollments.is_empty() {
                continue;
            }
            out.push(LearnerMetricRecord::new(user, enrollments));
        }

        tracing::debug!(
            site = %site.domain,
            caller = caller.id,
            filters = filter.len(),
            results = out.len(),
            "learner metrics resolved"
        );
        Ok(out)
    }

    /// Record for a single user of `site`, unfiltered.
    pub fn resolve_one(&self, site: &Site, caller: &User, user_id: UserId) -> Result<LearnerMetricRecord> {
        self.authz.authorize(caller, site)?;

        let user = self
            .repo
            .users_of_site(site)?
            .into_iter()
            .find(|u| u.id == user_id)
            .ok_or_else(|| FiguresError::NotFound(format!("no learner {user_id} on this site")))?;

        let enrollments = self
            .repo
            .enrollments_of_user(user.id, site)?
            .iter()
            .map(EnrollmentMetrics::from)
            .collect();
        Ok(LearnerMetricRecord::new(&user, enrollments))
    }
}
