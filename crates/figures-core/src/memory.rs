//! In-memory `MetricsRepository` over a validated `Dataset`.
//!
//! In multisite mode every lookup is scoped to the site's organisation: a
//! site's users are its members plus anyone enrolled in one of its courses. In
//! single-site mode all users, courses and enrollments are visible on every
//! site.

use std::collections::{BTreeMap, HashMap};

use crate::course_key::CourseKey;
use crate::error::Result;
use crate::model::{Course, Dataset, Enrollment, Site, SiteId, User, UserId};
use crate::repo::MetricsRepository;

#[derive(Debug)]
pub struct MemoryStore {
    multisite: bool,
    sites: Vec<Site>,
    courses: Vec<Course>,
    users: BTreeMap<UserId, User>,
    enrollments_by_user: HashMap<UserId, Vec<Enrollment>>,
    course_site: HashMap<CourseKey, SiteId>,
    tokens: HashMap<String, UserId>,
}

impl MemoryStore {
    /// Validate and index `dataset`.
    pub fn new(dataset: Dataset, multisite: bool) -> Result<Self> {
        dataset.validate()?;

        let course_site = dataset
            .courses
            .iter()
            .map(|c| (c.id.clone(), c.site))
            .collect();

        let mut enrollments_by_user: HashMap<UserId, Vec<Enrollment>> = HashMap::new();
        for e in dataset.enrollments {
            enrollments_by_user.entry(e.user).or_default().push(e);
        }
        for list in enrollments_by_user.values_mut() {
            list.sort_by_key(|e| e.id);
        }

        Ok(Self {
            multisite,
            sites: dataset.sites,
            courses: dataset.courses,
            users: dataset.users.into_iter().map(|u| (u.id, u)).collect(),
            enrollments_by_user,
            course_site,
            tokens: dataset.tokens.into_iter().map(|t| (t.key, t.user)).collect(),
        })
    }

    pub fn is_multisite(&self) -> bool {
        self.multisite
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    fn course_on_site(&self, course: &CourseKey, site: &Site) -> bool {
        !self.multisite || self.course_site.get(course) == Some(&site.id)
    }

    fn enrolled_on_site(&self, user: UserId, site: &Site) -> bool {
        self.enrollments_by_user
            .get(&user)
            .is_some_and(|list| list.iter().any(|e| self.course_on_site(&e.course_id, site)))
    }
}

impl MetricsRepository for MemoryStore {
    fn site_by_domain(&self, domain: &str) -> Result<Option<Site>> {
        Ok(self
            .sites
            .iter()
            .find(|s| s.domain.eq_ignore_ascii_case(domain))
            .cloned())
    }

    fn site_by_id(&self, id: SiteId) -> Result<Option<Site>> {
        Ok(self.sites.iter().find(|s| s.id == id).cloned())
    }

    /// Organisation members plus anyone enrolled in one of the site's courses.
    fn users_of_site(&self, site: &Site) -> Result<Vec<User>> {
        Ok(self
            .users
            .values()
            .filter(|u| !self.multisite || u.is_member_of(site.id) || self.enrolled_on_site(u.id, site))
            .cloned()
            .collect())
    }

    fn courses_of_site(&self, site: &Site) -> Result<Vec<CourseKey>> {
        Ok(self
            .courses
            .iter()
            .filter(|c| !self.multisite || c.site == site.id)
            .map(|c| c.id.clone())
            .collect())
    }

    fn enrollments_of_user(&self, user: UserId, site: &Site) -> Result<Vec<Enrollment>> {
        Ok(self
            .enrollments_by_user
            .get(&user)
            .map(|list| {
                list.iter()
                    .filter(|e| self.course_on_site(&e.course_id, site))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn user_by_token(&self, key: &str) -> Result<Option<User>> {
        Ok(self
            .tokens
            .get(key)
            .and_then(|id| self.users.get(id))
            .cloned())
    }
}
