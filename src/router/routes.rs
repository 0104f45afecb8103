//! The application's route table.

use super::{Redirect, RouteDescriptor, RouteTable};

pub const ROOT_ROUTE: &str = "Root";
pub const LOGIN_ROUTE: &str = "Login";
pub const SIGNUP_ROUTE: &str = "SignUp";
pub const HOME_ROUTE: &str = "HomePage";
pub const ADMIN_ROUTE: &str = "Admin";
pub const ADMIN_DASHBOARD_ROUTE: &str = "AdminDashboard";

/// Build the route table used by the bookkeeping client.
///
/// Unmatched paths fall back to the login route.
#[must_use]
pub fn app_routes() -> RouteTable {
    let routes = vec![
        RouteDescriptor::redirect(
            ROOT_ROUTE,
            "/",
            Redirect::BySession { authenticated: HOME_ROUTE, anonymous: LOGIN_ROUTE },
        ),
        RouteDescriptor::view(LOGIN_ROUTE, "/login", "LoginPage"),
        RouteDescriptor::view(SIGNUP_ROUTE, "/signup", "SignUpPage"),
        RouteDescriptor::view(HOME_ROUTE, "/home", "HomePage").requires_auth(),
        RouteDescriptor::view("AddRecord", "/add", "AddRecord").requires_auth(),
        RouteDescriptor::view("StatisticsPage", "/statistics", "Statistics").requires_auth(),
        RouteDescriptor::view("Dashboard", "/dashboard", "Dashboard").requires_auth(),
        RouteDescriptor::view("Issues", "/issues", "Issues").requires_admin(),
        RouteDescriptor::view("FormHistory", "/form-history", "FormHistory").requires_auth(),
        // Query: `id` selects the form, `mode` is `view` (default) or `edit`.
        RouteDescriptor::view("ViewForm", "/view-form", "AddRecord").requires_auth(),
        RouteDescriptor::view("NotificationHistory", "/notifications", "NotificationHistory").requires_auth(),
        RouteDescriptor::redirect(ADMIN_ROUTE, "/admin", Redirect::To(ADMIN_DASHBOARD_ROUTE))
            .requires_admin()
            .child(RouteDescriptor::view(ADMIN_DASHBOARD_ROUTE, "dashboard", "AdminDashboard"))
            .child(RouteDescriptor::view("AdminUsers", "users", "AdminUsers"))
            .child(RouteDescriptor::view("AdminSettings", "settings", "AdminSettings")),
    ];
    RouteTable::new(routes, LOGIN_ROUTE)
}
