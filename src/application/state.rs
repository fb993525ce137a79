//! Application state management for the terminal storefront.
//!
//! This module holds everything the presentation layer reads and writes: the
//! filter criteria and their memoized result, the requested route, dialog
//! state, and the session handle. Session transitions run on the tokio
//! runtime and report back through an event channel drained every tick.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

use super::routing::{gate, Route, RouteDecision};
use super::session::{ResendOutcome, SessionContext, SessionSnapshot};
use crate::domain::{
    parse_draft, validate_login, validate_signup, AuthField, Catalog, CatalogView, Category,
    CategoryFilter, Deal, DealField, DealFormFields, DomainError, FilterCriteria,
    NotificationError, ValidationErrors,
};

/// Represents the current mode of the application.
///
/// The mode decides how key presses are interpreted and which overlay is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Browsing the catalog - arrows move the selection, shortcuts available
    Browse,
    /// Typing into the search box
    Search,
    /// Login or signup dialog is open
    Auth,
    /// Admin dashboard deal table
    Admin,
    /// Admin deal form is open
    DealForm,
    /// Help screen is displayed
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    Login,
    Signup,
}

/// Contents of the login/signup dialog.
#[derive(Debug, Clone)]
pub struct AuthForm {
    pub kind: AuthKind,
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub focus: AuthField,
    /// Per-field problems found before contacting the identity provider
    pub errors: Option<ValidationErrors<AuthField>>,
    /// Failure reported by the identity provider
    pub error: Option<String>,
    /// Route to open once the user has signed in.
    pub return_to: Option<Route>,
}

impl AuthForm {
    pub fn new(kind: AuthKind, return_to: Option<Route>) -> Self {
        let mut form = Self {
            kind,
            name: String::new(),
            email: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            focus: AuthField::Email,
            errors: None,
            error: None,
            return_to,
        };
        form.focus = form.fields()[0];
        form
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            AuthKind::Login => "Sign In",
            AuthKind::Signup => "Create Account",
        }
    }

    pub fn fields(&self) -> &'static [AuthField] {
        match self.kind {
            AuthKind::Login => &[AuthField::Email, AuthField::Password],
            AuthKind::Signup => &[
                AuthField::Name,
                AuthField::Email,
                AuthField::Password,
                AuthField::ConfirmPassword,
            ],
        }
    }

    pub fn value(&self, field: AuthField) -> &str {
        match field {
            AuthField::Name => &self.name,
            AuthField::Email => &self.email,
            AuthField::Password => &self.password,
            AuthField::ConfirmPassword => &self.confirm_password,
        }
    }

    fn value_mut(&mut self, field: AuthField) -> &mut String {
        match field {
            AuthField::Name => &mut self.name,
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
            AuthField::ConfirmPassword => &mut self.confirm_password,
        }
    }

    pub fn focus_next(&mut self) {
        let fields = self.fields();
        let index = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(index + 1) % fields.len()];
    }

    pub fn focus_previous(&mut self) {
        let fields = self.fields();
        let index = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(index + fields.len() - 1) % fields.len()];
    }

    pub fn insert_char(&mut self, c: char) {
        self.value_mut(self.focus).push(c);
    }

    pub fn backspace(&mut self) {
        self.value_mut(self.focus).pop();
    }

    /// Switches between login and signup, keeping the typed email.
    pub fn toggle_kind(&mut self) {
        let kind = match self.kind {
            AuthKind::Login => AuthKind::Signup,
            AuthKind::Signup => AuthKind::Login,
        };
        let email = std::mem::take(&mut self.email);
        *self = AuthForm::new(kind, self.return_to);
        self.email = email;
    }

    pub fn validate(&self) -> Result<(), ValidationErrors<AuthField>> {
        match self.kind {
            AuthKind::Login => validate_login(&self.email, &self.password),
            AuthKind::Signup => {
                validate_signup(&self.name, &self.email, &self.password, &self.confirm_password)
            }
        }
    }
}

/// Contents of the admin create/edit dialog.
#[derive(Debug, Clone, Default)]
pub struct DealForm {
    /// Id of the deal being edited; `None` when creating.
    pub editing: Option<String>,
    pub fields: DealFormFields,
    pub focus: usize,
    pub errors: Option<ValidationErrors>,
}

impl DealForm {
    pub fn for_deal(deal: &Deal) -> Self {
        Self {
            editing: Some(deal.id.clone()),
            fields: DealFormFields::from(deal),
            ..Self::default()
        }
    }

    pub fn title(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Deal"
        } else {
            "Create New Deal"
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.editing.is_some() {
            "Update Deal"
        } else {
            "Create Deal"
        }
    }

    pub fn focused_field(&self) -> DealField {
        DealField::ALL[self.focus % DealField::ALL.len()]
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % DealField::ALL.len();
    }

    pub fn focus_previous(&mut self) {
        self.focus = (self.focus + DealField::ALL.len() - 1) % DealField::ALL.len();
    }

    pub fn insert_char(&mut self, c: char) {
        let field = self.focused_field();
        self.fields.get_mut(field).push(c);
    }

    pub fn backspace(&mut self) {
        let field = self.focused_field();
        self.fields.get_mut(field).pop();
    }

    /// Steps the category field through the closed category list.
    pub fn cycle_category(&mut self, forward: bool) {
        let current = self.fields.category.parse::<Category>().ok();
        let len = Category::ALL.len();
        let next = match current.and_then(|c| Category::ALL.iter().position(|x| *x == c)) {
            Some(index) if forward => (index + 1) % len,
            Some(index) => (index + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        self.fields.category = Category::ALL[next].label().to_string();
    }
}

/// Completion of a session transition running on the runtime.
#[derive(Debug)]
pub enum AppEvent {
    LoginFinished { success: bool },
    SignupFinished { success: bool },
    VerificationResent(Result<ResendOutcome, NotificationError>),
}

/// Main application state of the storefront.
pub struct App {
    pub catalog: Catalog,
    pub criteria: FilterCriteria,
    /// Deals visible under the current criteria.
    pub visible: Arc<[Deal]>,
    view: CatalogView,
    /// Selected row in the visible deal list
    pub selected: usize,
    /// Selected row in the admin deal table
    pub admin_selected: usize,
    /// Requested route; always checked against the session before drawing
    pub route: Route,
    pub mode: AppMode,
    pub session: SessionContext,
    pub auth_form: Option<AuthForm>,
    pub deal_form: Option<DealForm>,
    /// Cursor position within the search query, in characters
    pub cursor_position: usize,
    pub help_scroll: usize,
    /// Temporary status message to display
    pub status_message: Option<String>,
    /// Date used to flag expired deals
    pub today: NaiveDate,
    runtime: Handle,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(catalog: Catalog, session: SessionContext, runtime: Handle) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut app = Self {
            catalog,
            criteria: FilterCriteria::default(),
            visible: Arc::from(Vec::new()),
            view: CatalogView::new(),
            selected: 0,
            admin_selected: 0,
            route: Route::Home,
            mode: AppMode::Browse,
            session,
            auth_form: None,
            deal_form: None,
            cursor_position: 0,
            help_scroll: 0,
            status_message: None,
            today: Local::now().date_naive(),
            runtime,
            events_tx,
            events_rx,
        };
        app.refresh_visible();
        app
    }

    /// Current session, read fresh from the session context.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// What the requested route resolves to right now.
    pub fn current_view(&self) -> RouteDecision {
        gate(self.route, &self.snapshot())
    }

    /// Applies finished transitions, re-checks the route gate and refreshes
    /// the visible deals. Called once per UI loop iteration.
    pub fn tick(&mut self) {
        self.drain_events();
        self.enforce_route_gate();
        self.refresh_visible();
    }

    /// Recomputes the visible deals. A no-op rescan-wise when neither the
    /// catalog nor the criteria changed.
    pub fn refresh_visible(&mut self) {
        self.visible = self.view.visible(self.catalog.deals(), &self.criteria);
        self.clamp_selection();
    }

    pub fn recomputations(&self) -> usize {
        self.view.recomputations()
    }

    // ── Catalog browsing ──

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.criteria.selected_category = category;
        self.selected = 0;
        self.refresh_visible();
    }

    pub fn next_category(&mut self) {
        self.set_category(self.criteria.selected_category.next());
    }

    pub fn previous_category(&mut self) {
        self.set_category(self.criteria.selected_category.previous());
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.visible.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_deal(&self) -> Option<&Deal> {
        self.visible.get(self.selected)
    }

    fn clamp_selection(&mut self) {
        if self.selected >= self.visible.len() {
            self.selected = self.visible.len().saturating_sub(1);
        }
        if self.admin_selected >= self.catalog.len() {
            self.admin_selected = self.catalog.len().saturating_sub(1);
        }
    }

    // ── Search ──

    pub fn start_search(&mut self) {
        self.mode = AppMode::Search;
        self.cursor_position = self.criteria.search_query.chars().count();
        self.status_message = None;
    }

    /// Leaves search mode keeping the query.
    pub fn finish_search(&mut self) {
        self.mode = AppMode::Browse;
    }

    /// Leaves search mode and clears the query.
    pub fn cancel_search(&mut self) {
        self.set_search_query(String::new());
        self.mode = AppMode::Browse;
    }

    pub fn set_search_query(&mut self, query: String) {
        self.cursor_position = query.chars().count();
        self.criteria.search_query = query;
        self.selected = 0;
        self.refresh_visible();
    }

    pub fn search_insert(&mut self, c: char) {
        let index = byte_index(&self.criteria.search_query, self.cursor_position);
        self.criteria.search_query.insert(index, c);
        self.cursor_position += 1;
        self.selected = 0;
        self.refresh_visible();
    }

    pub fn search_backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let index = byte_index(&self.criteria.search_query, self.cursor_position);
            self.criteria.search_query.remove(index);
            self.selected = 0;
            self.refresh_visible();
        }
    }

    pub fn search_delete(&mut self) {
        if self.cursor_position < self.criteria.search_query.chars().count() {
            let index = byte_index(&self.criteria.search_query, self.cursor_position);
            self.criteria.search_query.remove(index);
            self.selected = 0;
            self.refresh_visible();
        }
    }

    pub fn search_cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn search_cursor_right(&mut self) {
        if self.cursor_position < self.criteria.search_query.chars().count() {
            self.cursor_position += 1;
        }
    }

    pub fn search_cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn search_cursor_end(&mut self) {
        self.cursor_position = self.criteria.search_query.chars().count();
    }

    // ── Routing ──

    /// Requests a route, applying the admin gate.
    pub fn navigate(&mut self, route: Route) {
        match gate(route, &self.snapshot()) {
            RouteDecision::Render(Route::Admin) => {
                self.route = Route::Admin;
                self.mode = AppMode::Admin;
                self.status_message = None;
            }
            RouteDecision::Render(Route::Login) => self.open_auth(AuthKind::Login, None),
            RouteDecision::Render(Route::Home) => {
                self.route = Route::Home;
                self.mode = AppMode::Browse;
                self.deal_form = None;
            }
            RouteDecision::RedirectToLogin => {
                self.open_auth(AuthKind::Login, Some(route));
                self.status_message = Some("Please sign in to continue".to_string());
            }
            RouteDecision::Forbidden => {
                self.status_message =
                    Some("Administrator access is required for the dashboard".to_string());
            }
        }
    }

    fn enforce_route_gate(&mut self) {
        if self.route != Route::Admin {
            return;
        }
        if let RouteDecision::Render(_) = self.current_view() {
            return;
        }
        debug!("admin route revoked by session change");
        self.route = Route::Home;
        self.deal_form = None;
        if matches!(self.mode, AppMode::Admin | AppMode::DealForm) {
            self.mode = AppMode::Browse;
        }
    }

    // ── Session ──

    pub fn open_auth(&mut self, kind: AuthKind, return_to: Option<Route>) {
        self.route = Route::Login;
        self.mode = AppMode::Auth;
        self.auth_form = Some(AuthForm::new(kind, return_to));
    }

    pub fn close_auth(&mut self) {
        self.auth_form = None;
        self.route = Route::Home;
        self.mode = AppMode::Browse;
    }

    /// Starts the login or signup for the open dialog. Ignored while another
    /// transition is in flight.
    pub fn submit_auth(&mut self) {
        if self.snapshot().is_loading {
            return;
        }
        let Some(form) = self.auth_form.as_mut() else {
            return;
        };
        if let Err(errors) = form.validate() {
            form.errors = Some(errors);
            return;
        }
        form.errors = None;
        form.error = None;

        let session = self.session.clone();
        let events = self.events_tx.clone();
        let email = form.email.trim().to_string();
        let password = form.password.clone();
        match form.kind {
            AuthKind::Login => {
                self.runtime.spawn(async move {
                    let success = session.login(&email, &password).await;
                    let _ = events.send(AppEvent::LoginFinished { success });
                });
            }
            AuthKind::Signup => {
                let name = form.name.trim().to_string();
                self.runtime.spawn(async move {
                    let success = session.signup(&email, &password, &name).await;
                    let _ = events.send(AppEvent::SignupFinished { success });
                });
            }
        }
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.route = Route::Home;
        self.mode = AppMode::Browse;
        self.deal_form = None;
        self.auth_form = None;
        self.status_message = Some("You have been signed out".to_string());
    }

    pub fn resend_verification(&mut self) {
        if !self.snapshot().needs_email_verification() {
            return;
        }
        let session = self.session.clone();
        let events = self.events_tx.clone();
        self.runtime.spawn(async move {
            let result = session.resend_verification_email().await;
            let _ = events.send(AppEvent::VerificationResent(result));
        });
        self.status_message = Some("Sending verification email...".to_string());
    }

    /// Applies every completed transition. Returns how many were handled.
    pub fn drain_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::LoginFinished { success: true } => {
                let name = self.snapshot().identity().map(|identity| identity.name.clone());
                self.status_message = name.map(|name| format!("Welcome back, {name}!"));
                // A dialog dismissed while the login was in flight leaves the
                // current mode alone.
                if let Some(form) = self.auth_form.take() {
                    self.close_auth();
                    if let Some(route) = form.return_to {
                        self.navigate(route);
                    }
                }
            }
            AppEvent::SignupFinished { success: true } => {
                if self.auth_form.take().is_some() {
                    self.close_auth();
                }
                self.status_message = Some(
                    "Account created! Please check your email to verify your account.".to_string(),
                );
            }
            AppEvent::LoginFinished { success: false } => {
                if let Some(form) = self.auth_form.as_mut() {
                    form.error = Some("Invalid email or password".to_string());
                }
            }
            AppEvent::SignupFinished { success: false } => {
                if let Some(form) = self.auth_form.as_mut() {
                    form.error = Some("Could not create account. Please try again.".to_string());
                }
            }
            AppEvent::VerificationResent(result) => {
                self.status_message = Some(match result {
                    Ok(ResendOutcome::Sent { email }) => {
                        format!("Verification email sent to {email}")
                    }
                    Ok(ResendOutcome::NotSignedIn) => "Sign in to verify your email".to_string(),
                    Err(err) => err.to_string(),
                });
            }
        }
    }

    // ── Admin dashboard ──

    pub fn admin_select_next(&mut self) {
        if self.admin_selected + 1 < self.catalog.len() {
            self.admin_selected += 1;
        }
    }

    pub fn admin_select_previous(&mut self) {
        self.admin_selected = self.admin_selected.saturating_sub(1);
    }

    pub fn start_new_deal(&mut self) {
        self.deal_form = Some(DealForm::default());
        self.mode = AppMode::DealForm;
    }

    pub fn start_edit_deal(&mut self) {
        if let Some(deal) = self.catalog.deals().get(self.admin_selected) {
            self.deal_form = Some(DealForm::for_deal(deal));
            self.mode = AppMode::DealForm;
        }
    }

    pub fn cancel_deal_form(&mut self) {
        self.deal_form = None;
        self.mode = AppMode::Admin;
    }

    /// Validates the form and creates or updates the deal.
    pub fn submit_deal_form(&mut self) {
        let Some(form) = self.deal_form.as_mut() else {
            return;
        };
        let draft = match parse_draft(&form.fields) {
            Ok(draft) => draft,
            Err(errors) => {
                form.errors = Some(errors);
                return;
            }
        };

        let session = self.session.snapshot().session;
        let result = match form.editing.as_deref() {
            Some(id) => self.catalog.update(&session, id, draft),
            None => self.catalog.create(&session, draft),
        };
        match result {
            Ok(deal) => {
                self.deal_form = None;
                self.mode = AppMode::Admin;
                self.status_message = Some(format!("Saved \"{}\"", deal.title));
                self.refresh_visible();
            }
            Err(DomainError::Validation(errors)) => form.errors = Some(errors),
            Err(err) => self.status_message = Some(err.to_string()),
        }
    }

    pub fn delete_selected_deal(&mut self) {
        let Some(id) = self
            .catalog
            .deals()
            .get(self.admin_selected)
            .map(|deal| deal.id.clone())
        else {
            return;
        };
        let session = self.snapshot().session;
        match self.catalog.delete(&session, &id) {
            Ok(deal) => {
                self.status_message = Some(format!("Deleted \"{}\"", deal.title));
                self.refresh_visible();
            }
            Err(err) => self.status_message = Some(err.to_string()),
        }
    }

    // ── Help ──

    pub fn open_help(&mut self) {
        self.mode = AppMode::Help;
        self.help_scroll = 0;
    }

    pub fn close_help(&mut self) {
        self.mode = match self.route {
            Route::Admin => AppMode::Admin,
            Route::Home | Route::Login => AppMode::Browse,
        };
    }
}

fn byte_index(s: &str, char_position: usize) -> usize {
    s.char_indices()
        .nth(char_position)
        .map_or(s.len(), |(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{sample_deals, LogNotifier, StubIdentityProvider};
    use std::time::Duration;

    fn app() -> App {
        let session = SessionContext::new(
            Arc::new(StubIdentityProvider::with_demo_accounts()),
            Arc::new(LogNotifier::default()),
        );
        App::new(Catalog::new(sample_deals()), session, Handle::current())
    }

    async fn settle(app: &mut App) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while app.drain_events() == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        app.tick();
    }

    async fn sign_in(app: &mut App, email: &str, password: &str) {
        app.open_auth(AuthKind::Login, None);
        let form = app.auth_form.as_mut().unwrap();
        form.email = email.to_string();
        form.password = password.to_string();
        app.submit_auth();
        settle(app).await;
    }

    #[tokio::test]
    async fn test_app_starts_on_full_catalog() {
        let app = app();
        assert_eq!(app.mode, AppMode::Browse);
        assert_eq!(app.route, Route::Home);
        assert_eq!(app.visible.len(), 6);
        assert_eq!(app.recomputations(), 1);
    }

    #[tokio::test]
    async fn test_tick_without_changes_reuses_result() {
        let mut app = app();
        let before = Arc::clone(&app.visible);
        app.tick();
        app.tick();
        assert!(Arc::ptr_eq(&before, &app.visible));
        assert_eq!(app.recomputations(), 1);
    }

    #[tokio::test]
    async fn test_category_and_search_filtering() {
        let mut app = app();
        app.set_category(CategoryFilter::Only(Category::Restaurants));
        assert_eq!(app.visible.len(), 1);
        assert_eq!(app.visible[0].category, Category::Restaurants);

        app.set_category(CategoryFilter::All);
        app.start_search();
        for c in "SPA".chars() {
            app.search_insert(c);
        }
        assert_eq!(app.criteria.search_query, "SPA");
        // Spa package by title, resort by "spa credit" in its description.
        let ids: Vec<_> = app.visible.iter().map(|deal| deal.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "5"]);

        app.cancel_search();
        assert_eq!(app.mode, AppMode::Browse);
        assert_eq!(app.visible.len(), 6);
    }

    #[tokio::test]
    async fn test_search_editing_with_cursor() {
        let mut app = app();
        app.start_search();
        for c in "caé".chars() {
            app.search_insert(c);
        }
        app.search_cursor_left();
        app.search_backspace();
        assert_eq!(app.criteria.search_query, "cé");
        app.search_cursor_home();
        app.search_delete();
        assert_eq!(app.criteria.search_query, "é");
        app.search_cursor_end();
        app.search_insert('!');
        assert_eq!(app.criteria.search_query, "é!");
        app.finish_search();
        assert_eq!(app.criteria.search_query, "é!");
        assert!(app.visible.is_empty());
        assert!(app.selected_deal().is_none());
    }

    #[tokio::test]
    async fn test_selection_is_clamped_to_results() {
        let mut app = app();
        for _ in 0..10 {
            app.select_next();
        }
        assert_eq!(app.selected, 5);
        app.set_search_query("photo".to_string());
        assert_eq!(app.selected, 0);
        assert_eq!(app.selected_deal().unwrap().id, "6");
        app.select_previous();
        assert_eq!(app.selected, 0);
    }

    #[tokio::test]
    async fn test_anonymous_admin_request_redirects_to_login() {
        let mut app = app();
        app.navigate(Route::Admin);
        assert_eq!(app.mode, AppMode::Auth);
        assert_eq!(app.route, Route::Login);
        assert_eq!(app.auth_form.as_ref().unwrap().return_to, Some(Route::Admin));
    }

    #[tokio::test]
    async fn test_admin_login_returns_to_dashboard() {
        let mut app = app();
        app.navigate(Route::Admin);
        let form = app.auth_form.as_mut().unwrap();
        form.email = "admin@dealspot.com".to_string();
        form.password = "admin123".to_string();
        app.submit_auth();
        settle(&mut app).await;

        assert_eq!(app.route, Route::Admin);
        assert_eq!(app.mode, AppMode::Admin);
        assert_eq!(app.current_view(), RouteDecision::Render(Route::Admin));
    }

    #[tokio::test]
    async fn test_failed_login_keeps_dialog_open() {
        let mut app = app();
        sign_in(&mut app, "x@y.com", "wrong-password").await;

        assert_eq!(app.mode, AppMode::Auth);
        assert_eq!(
            app.auth_form.as_ref().unwrap().error.as_deref(),
            Some("Invalid email or password")
        );
        assert!(!app.snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn test_invalid_signup_is_not_submitted() {
        let mut app = app();
        app.open_auth(AuthKind::Signup, None);
        let form = app.auth_form.as_mut().unwrap();
        form.name = "J".to_string();
        form.email = "not-an-email".to_string();
        form.password = "a".to_string();
        app.submit_auth();

        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(app.drain_events(), 0);
        assert!(!app.snapshot().is_authenticated());

        let form = app.auth_form.as_ref().unwrap();
        let errors = form.errors.as_ref().unwrap();
        assert_eq!(errors.for_field(AuthField::Name), Some("Name must be at least 2 characters"));
        assert_eq!(errors.for_field(AuthField::Email), Some("Invalid email address"));
        assert_eq!(
            errors.for_field(AuthField::Password),
            Some("Password must be at least 6 characters")
        );
        assert_eq!(errors.for_field(AuthField::ConfirmPassword), Some("Passwords don't match"));
    }

    #[tokio::test]
    async fn test_invalid_login_is_not_submitted() {
        let mut app = app();
        app.open_auth(AuthKind::Login, None);
        let form = app.auth_form.as_mut().unwrap();
        form.email = "admin@dealspot.com".to_string();
        form.password = "admin".to_string();
        app.submit_auth();

        tokio::task::yield_now().await;
        assert_eq!(app.drain_events(), 0);
        let errors = app.auth_form.as_ref().unwrap().errors.clone().unwrap();
        assert_eq!(errors.0.len(), 1);
        assert!(errors.for_field(AuthField::Email).is_none());

        // Fixing the field clears the errors and submits.
        app.auth_form.as_mut().unwrap().password = "admin123".to_string();
        app.submit_auth();
        settle(&mut app).await;
        assert!(app.snapshot().is_admin());
        assert!(app.auth_form.is_none());
    }

    #[tokio::test]
    async fn test_login_finishing_after_dialog_closed_keeps_mode() {
        let mut app = app();
        app.open_auth(AuthKind::Login, None);
        let form = app.auth_form.as_mut().unwrap();
        form.email = "john.doe@dealspot.com".to_string();
        form.password = "john123".to_string();
        app.submit_auth();

        app.close_auth();
        app.start_search();
        settle(&mut app).await;

        assert_eq!(app.mode, AppMode::Search);
        assert_eq!(app.route, Route::Home);
        assert!(app.snapshot().is_authenticated());
        assert_eq!(app.status_message.as_deref(), Some("Welcome back, John Doe!"));
    }

    #[tokio::test]
    async fn test_shopper_is_forbidden_from_admin() {
        let mut app = app();
        sign_in(&mut app, "john.doe@dealspot.com", "john123").await;
        assert_eq!(app.status_message.as_deref(), Some("Welcome back, John Doe!"));

        app.navigate(Route::Admin);
        assert_eq!(app.route, Route::Home);
        assert_eq!(app.mode, AppMode::Browse);
        assert_eq!(
            app.status_message.as_deref(),
            Some("Administrator access is required for the dashboard")
        );
    }

    #[tokio::test]
    async fn test_logout_revokes_admin_route() {
        let mut app = app();
        sign_in(&mut app, "admin@dealspot.com", "admin123").await;
        app.navigate(Route::Admin);
        assert_eq!(app.mode, AppMode::Admin);

        // Session cleared behind the app's back; the next tick must notice.
        app.session.logout();
        app.tick();
        assert_eq!(app.route, Route::Home);
        assert_eq!(app.mode, AppMode::Browse);
    }

    #[tokio::test]
    async fn test_signup_shows_banner_and_resend() {
        let mut app = app();
        app.open_auth(AuthKind::Signup, None);
        let form = app.auth_form.as_mut().unwrap();
        form.name = "Jane".to_string();
        form.email = "jane@example.com".to_string();
        form.password = "hunter22".to_string();
        form.confirm_password = "hunter22".to_string();
        app.submit_auth();
        settle(&mut app).await;

        assert!(app.auth_form.is_none());
        assert!(app.snapshot().needs_email_verification());

        app.resend_verification();
        settle(&mut app).await;
        assert_eq!(
            app.status_message.as_deref(),
            Some("Verification email sent to jane@example.com")
        );
    }

    #[tokio::test]
    async fn test_resend_ignored_when_verified() {
        let mut app = app();
        app.resend_verification();
        assert!(app.status_message.is_none());
        tokio::task::yield_now().await;
        assert_eq!(app.drain_events(), 0);
    }

    #[tokio::test]
    async fn test_admin_creates_edits_and_deletes_deals() {
        let mut app = app();
        sign_in(&mut app, "admin@dealspot.com", "admin123").await;
        app.navigate(Route::Admin);

        app.start_new_deal();
        let form = app.deal_form.as_mut().unwrap();
        form.fields = DealFormFields {
            title: "Sunset Kayak Tour".to_string(),
            category: "Activities".to_string(),
            original_price: "60".to_string(),
            discounted_price: "30".to_string(),
            location: "Harbor Pier".to_string(),
            end_date: "2024-06-01".to_string(),
            image_url: "https://images.example.com/kayak.jpg".to_string(),
            description: "Guided paddle at dusk".to_string(),
        };
        app.submit_deal_form();
        assert_eq!(app.mode, AppMode::Admin);
        assert_eq!(app.catalog.len(), 7);
        assert_eq!(app.visible.len(), 7);
        assert_eq!(app.visible[6].discount_percentage, 50);

        app.admin_selected = 6;
        app.start_edit_deal();
        let form = app.deal_form.as_mut().unwrap();
        assert_eq!(form.title(), "Edit Deal");
        form.fields.title = "Sunrise Kayak Tour".to_string();
        app.submit_deal_form();
        assert_eq!(app.catalog.deals()[6].title, "Sunrise Kayak Tour");

        app.delete_selected_deal();
        assert_eq!(app.catalog.len(), 6);
        assert_eq!(app.admin_selected, 5);
        assert!(app.visible.iter().all(|deal| deal.title != "Sunrise Kayak Tour"));
    }

    #[tokio::test]
    async fn test_invalid_deal_form_keeps_errors() {
        let mut app = app();
        sign_in(&mut app, "admin@dealspot.com", "admin123").await;
        app.navigate(Route::Admin);
        app.start_new_deal();
        app.submit_deal_form();

        let form = app.deal_form.as_ref().unwrap();
        let errors = form.errors.as_ref().unwrap();
        assert_eq!(errors.for_field(DealField::Title), Some("Title is required"));
        assert_eq!(app.mode, AppMode::DealForm);
        assert_eq!(app.catalog.len(), 6);
    }

    #[tokio::test]
    async fn test_deal_form_editing_helpers() {
        let mut form = DealForm::default();
        assert_eq!(form.focused_field(), DealField::Title);
        form.insert_char('S');
        form.insert_char('p');
        form.backspace();
        assert_eq!(form.fields.title, "S");

        form.focus_next();
        assert_eq!(form.focused_field(), DealField::Category);
        form.cycle_category(true);
        assert_eq!(form.fields.category, "Restaurants");
        form.cycle_category(false);
        assert_eq!(form.fields.category, "Services");

        form.focus_previous();
        form.focus_previous();
        assert_eq!(form.focused_field(), DealField::Description);
    }

    #[tokio::test]
    async fn test_auth_form_toggle_keeps_email() {
        let mut form = AuthForm::new(AuthKind::Login, Some(Route::Admin));
        assert_eq!(form.focus, AuthField::Email);
        form.insert_char('a');
        form.toggle_kind();
        assert_eq!(form.kind, AuthKind::Signup);
        assert_eq!(form.email, "a");
        assert_eq!(form.focus, AuthField::Name);
        assert_eq!(form.return_to, Some(Route::Admin));
        form.focus_previous();
        assert_eq!(form.focus, AuthField::ConfirmPassword);
        form.insert_char('x');
        assert_eq!(form.value(AuthField::ConfirmPassword), "x");
    }
}
