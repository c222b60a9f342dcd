//! Read-side domain model.
//!
//! Entities mirror the host platform's records; they are loaded once and
//! never mutated. `LearnerMetricRecord` is the computed projection served by
//! the learner-metrics endpoint.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::course_key::CourseKey;
use crate::error::{FiguresError, Result};

pub type SiteId = u64;
pub type UserId = u64;
pub type EnrollmentId = u64;

/// Tenant boundary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Site {
    pub id: SiteId,
    pub domain: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Course {
    pub id: CourseKey,
    /// Owning site (via its organisation).
    pub site: SiteId,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    /// Organisation memberships.
    #[serde(default)]
    pub sites: Vec<SiteId>,
    /// Sites whose organisation this user administers.
    #[serde(default)]
    pub admin_of: Vec<SiteId>,
}

fn default_true() -> bool {
    true
}

impl User {
    pub fn is_member_of(&self, site: SiteId) -> bool {
        self.sites.contains(&site)
    }

    pub fn is_admin_of(&self, site: SiteId) -> bool {
        self.admin_of.contains(&site)
    }
}

/// Grade progress snapshot for one enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Progress {
    pub progress_percent: f64,
    pub sections_worked: u32,
    pub sections_possible: u32,
    pub points_earned: f64,
    pub points_possible: f64,
}

impl Progress {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(0.0..=1.0).contains(&self.progress_percent) {
            return Err(format!("progress_percent out of range: {}", self.progress_percent));
        }
        if !(self.points_earned >= 0.0 && self.points_possible >= 0.0) {
            return Err("points must be non-negative".into());
        }
        if self.points_earned > self.points_possible {
            return Err("points_earned exceeds points_possible".into());
        }
        if self.sections_worked > self.sections_possible {
            return Err("sections_worked exceeds sections_possible".into());
        }
        Ok(())
    }

    pub fn details(&self) -> ProgressDetails {
        ProgressDetails {
            sections_worked: self.sections_worked,
            points_possible: self.points_possible,
            sections_possible: self.sections_possible,
            points_earned: self.points_earned,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user: UserId,
    pub course_id: CourseKey,
    pub date_enrolled: NaiveDate,
    #[serde(default = "default_true")]
    pub is_enrolled: bool,
    #[serde(default)]
    pub progress: Option<Progress>,
}

/// API token (`Authorization: Token <key>`).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiToken {
    pub key: String,
    pub user: UserId,
}

/// Everything the service reads, as loaded from the dataset file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dataset {
    #[serde(default)]
    pub sites: Vec<Site>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
    #[serde(default)]
    pub tokens: Vec<ApiToken>,
}

fn invalid(msg: String) -> FiguresError {
    FiguresError::BadRequest(format!("invalid dataset: {msg}"))
}

impl Dataset {
    /// Check uniqueness, referential integrity and progress bounds.
    pub fn validate(&self) -> Result<()> {
        let mut site_ids = HashSet::new();
        let mut domains = HashSet::new();
        for s in &self.sites {
            if !site_ids.insert(s.id) {
                return Err(invalid(format!("duplicate site id {}", s.id)));
            }
            if s.domain.trim().is_empty() {
                return Err(invalid(format!("site {} has an empty domain", s.id)));
            }
            if !domains.insert(s.domain.to_ascii_lowercase()) {
                return Err(invalid(format!("duplicate site domain {}", s.domain)));
            }
        }

        let mut course_ids = HashSet::new();
        for c in &self.courses {
            if !course_ids.insert(&c.id) {
                return Err(invalid(format!("duplicate course {}", c.id)));
            }
            if !site_ids.contains(&c.site) {
                return Err(invalid(format!("course {} references unknown site {}", c.id, c.site)));
            }
        }

        let mut user_ids = HashSet::new();
        for u in &self.users {
            if !user_ids.insert(u.id) {
                return Err(invalid(format!("duplicate user id {}", u.id)));
            }
            if let Some(s) = u.sites.iter().chain(&u.admin_of).find(|s| !site_ids.contains(*s)) {
                return Err(invalid(format!("user {} references unknown site {s}", u.id)));
            }
        }

        let mut enrollment_ids = HashSet::new();
        for e in &self.enrollments {
            if !enrollment_ids.insert(e.id) {
                return Err(invalid(format!("duplicate enrollment id {}", e.id)));
            }
            if !user_ids.contains(&e.user) {
                return Err(invalid(format!("enrollment {} references unknown user {}", e.id, e.user)));
            }
            if !course_ids.contains(&e.course_id) {
                return Err(invalid(format!(
                    "enrollment {} references unknown course {}",
                    e.id, e.course_id
                )));
            }
            if let Some(p) = &e.progress {
                p.validate()
                    .map_err(|m| invalid(format!("enrollment {}: {m}", e.id)))?;
            }
        }

        let mut keys = HashSet::new();
        for t in &self.tokens {
            if t.key.is_empty() {
                return Err(invalid("empty token key".into()));
            }
            if !keys.insert(t.key.as_str()) {
                return Err(invalid("duplicate token key".into()));
            }
            if !user_ids.contains(&t.user) {
                return Err(invalid(format!("token references unknown user {}", t.user)));
            }
        }
        Ok(())
    }
}

// --------------------
// Projection (serialized)
// --------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressDetails {
    pub sections_worked: u32,
    pub points_possible: f64,
    pub sections_possible: u32,
    pub points_earned: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentMetrics {
    pub id: EnrollmentId,
    pub course_id: CourseKey,
    pub date_enrolled: NaiveDate,
    pub is_enrolled: bool,
    pub progress_percent: f64,
    pub progress_details: Option<ProgressDetails>,
}

impl From<&Enrollment> for EnrollmentMetrics {
    fn from(e: &Enrollment) -> Self {
        Self {
            id: e.id,
            course_id: e.course_id.clone(),
            date_enrolled: e.date_enrolled,
            is_enrolled: e.is_enrolled,
            progress_percent: e.progress.map(|p| p.progress_percent).unwrap_or(0.0),
            progress_details: e.progress.as_ref().map(Progress::details),
        }
    }
}

/// One learner's profile plus enrollment progress on a site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearnerMetricRecord {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub enrollments: Vec<EnrollmentMetrics>,
}

impl LearnerMetricRecord {
    pub fn new(user: &User, enrollments: Vec<EnrollmentMetrics>) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            fullname: user.fullname.clone(),
            is_active: user.is_active,
            date_joined: user.date_joined,
            enrollments,
        }
    }
}
