//! Read-repository seam.
//!
//! The resolver only sees this trait; storage (in-memory fixture, database)
//! lives behind it.

use crate::course_key::CourseKey;
use crate::error::Result;
use crate::model::{Enrollment, Site, SiteId, User, UserId};

pub trait MetricsRepository: Send + Sync {
    /// Site whose domain matches, ignoring ASCII case.
    fn site_by_domain(&self, domain: &str) -> Result<Option<Site>>;

    fn site_by_id(&self, id: SiteId) -> Result<Option<Site>>;

    /// Users with a membership in `site`'s organisation or an enrollment in
    /// one of its courses, each exactly once.
    fn users_of_site(&self, site: &Site) -> Result<Vec<User>>;

    /// Ids of the courses belonging to `site`.
    fn courses_of_site(&self, site: &Site) -> Result<Vec<CourseKey>>;

    /// `user`'s enrollments in courses of `site`, ordered by enrollment id.
    fn enrollments_of_user(&self, user: UserId, site: &Site) -> Result<Vec<Enrollment>>;

    fn user_by_token(&self, key: &str) -> Result<Option<User>>;
}
