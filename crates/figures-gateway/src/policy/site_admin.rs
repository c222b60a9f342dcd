use figures_core::access::AuthorizationChecker;
use figures_core::error::{FiguresError, Result};
use figures_core::model::{Site, User};

/// "Site admin" rule.
///
/// - inactive callers are always denied
/// - superusers are always allowed
/// - multisite: caller must administer the site's organisation
/// - single-site: caller must be staff
#[derive(Debug, Clone, Copy)]
pub struct SiteAdminPolicy {
    multisite: bool,
}

impl SiteAdminPolicy {
    pub fn new(multisite: bool) -> Self {
        Self { multisite }
    }
}

impl AuthorizationChecker for SiteAdminPolicy {
    fn authorize(&self, caller: &User, site: &Site) -> Result<()> {
        if !caller.is_active {
            return Err(FiguresError::Forbidden("inactive user".into()));
        }
        if caller.is_superuser {
            return Ok(());
        }
        let allowed = if self.multisite {
            caller.is_admin_of(site.id)
        } else {
            caller.is_staff
        };
        if allowed {
            Ok(())
        } else {
            Err(FiguresError::Forbidden(format!(
                "user {} is not an admin of {}",
                caller.id, site.domain
            )))
        }
    }
}
