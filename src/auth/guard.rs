//! Route guards for the storefront pages

/// Where anonymous visitors are sent when a page needs a login
pub const LOGIN_PATH: &str = "/login";

/// Where visitors are sent when a page is not for them
pub const HOME_PATH: &str = "/";

/// Access level of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone
    Public,
    /// Only visitors who are not logged in (login, register)
    PublicOnly,
    /// Logged-in users
    Protected,
    /// Logged-in administrators
    AdminOnly,
}

/// Outcome of a guard check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(&'static str),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

/// The storefront's page table
pub const ROUTES: &[(&str, Access)] = &[
    ("/", Access::Public),
    ("/login", Access::PublicOnly),
    ("/register", Access::PublicOnly),
    ("/cart", Access::Protected),
    ("/orders", Access::Protected),
    ("/products", Access::Protected),
    ("/admin", Access::AdminOnly),
    ("/admin/products", Access::AdminOnly),
    ("/admin/users", Access::AdminOnly),
    ("/admin/orders", Access::AdminOnly),
];

/// Look up the access level of a page
pub fn route_access(path: &str) -> Option<Access> {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let normalized = match path.trim_end_matches('/') {
        "" => "/",
        p => p,
    };
    ROUTES
        .iter()
        .find(|(route, _)| *route == normalized)
        .map(|(_, access)| *access)
}

/// Guard for pages only anonymous visitors should see
pub fn public_only(is_authenticated: bool) -> GuardDecision {
    if is_authenticated {
        GuardDecision::Redirect(HOME_PATH)
    } else {
        GuardDecision::Allow
    }
}

/// Guard for pages that need a login, and optionally the admin flag
pub fn protected(is_authenticated: bool, is_admin: bool, admin_only: bool) -> GuardDecision {
    if !is_authenticated {
        GuardDecision::Redirect(LOGIN_PATH)
    } else if admin_only && !is_admin {
        GuardDecision::Redirect(HOME_PATH)
    } else {
        GuardDecision::Allow
    }
}

/// Apply the guard matching `access`
pub fn check(access: Access, is_authenticated: bool, is_admin: bool) -> GuardDecision {
    match access {
        Access::Public => GuardDecision::Allow,
        Access::PublicOnly => public_only(is_authenticated),
        Access::Protected => protected(is_authenticated, is_admin, false),
        Access::AdminOnly => protected(is_authenticated, is_admin, true),
    }
}
