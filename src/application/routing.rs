use super::session::SessionSnapshot;

/// Top-level views of the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Render(Route),
    /// Anonymous visitor asked for a protected view.
    RedirectToLogin,
    /// Signed in, but without the admin flag.
    Forbidden,
}

/// Decides what to show for `route` given the current session.
///
/// Must be evaluated against a fresh snapshot on every render; decisions are
/// never cached across session changes.
pub fn gate(route: Route, session: &SessionSnapshot) -> RouteDecision {
    match route {
        Route::Home | Route::Login => RouteDecision::Render(route),
        Route::Admin if session.is_admin() => RouteDecision::Render(Route::Admin),
        Route::Admin if session.is_authenticated() => RouteDecision::Forbidden,
        Route::Admin => RouteDecision::RedirectToLogin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identity, Session};

    fn signed_in(is_admin: bool) -> SessionSnapshot {
        SessionSnapshot {
            session: Session::Authenticated(Identity {
                id: "2".to_string(),
                email: "john.doe@dealspot.com".to_string(),
                name: "John Doe".to_string(),
                is_admin,
                email_verified: true,
            }),
            is_loading: false,
            generation: 1,
        }
    }

    #[test]
    fn test_public_routes_always_render() {
        let anonymous = SessionSnapshot::default();
        assert_eq!(gate(Route::Home, &anonymous), RouteDecision::Render(Route::Home));
        assert_eq!(gate(Route::Login, &anonymous), RouteDecision::Render(Route::Login));
        assert_eq!(gate(Route::Home, &signed_in(false)), RouteDecision::Render(Route::Home));
    }

    #[test]
    fn test_admin_route_gate() {
        assert_eq!(gate(Route::Admin, &SessionSnapshot::default()), RouteDecision::RedirectToLogin);
        assert_eq!(gate(Route::Admin, &signed_in(false)), RouteDecision::Forbidden);
        assert_eq!(gate(Route::Admin, &signed_in(true)), RouteDecision::Render(Route::Admin));
    }
}
