//! Session state machine.
//!
//! A [`SessionContext`] owns the single session slot. Only its four
//! transitions (`login`, `signup`, `logout`, `resend_verification_email`)
//! can change it, and every change is published as a [`SessionSnapshot`] on a
//! watch channel for the presentation layer.
//!
//! Each transition takes a ticket from a generation counter. An asynchronous
//! login or signup only lands if no newer transition started while it was
//! awaiting the identity provider, so a logout issued mid-login always wins.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::{AuthError, Identity, NotificationError, Session};

/// Resolves credentials into identities.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn register(&self, email: &str, password: &str, name: &str)
        -> Result<Identity, AuthError>;
}

/// Delivers verification emails.
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send_verification(&self, email: &str) -> Result<(), NotificationError>;
}

/// Published view of the session slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub session: Session,
    /// True while at least one login or signup awaits the identity provider.
    pub is_loading: bool,
    pub generation: u64,
}

impl SessionSnapshot {
    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.session.is_admin()
    }

    pub fn needs_email_verification(&self) -> bool {
        self.session.needs_email_verification()
    }
}

/// Result of a resend request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResendOutcome {
    Sent { email: String },
    /// Nobody is signed in; the notification service was not contacted.
    NotSignedIn,
}

#[derive(Debug, Default)]
struct Slot {
    session: Session,
    generation: u64,
    pending: usize,
}

impl Slot {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.session.clone(),
            is_loading: self.pending > 0,
            generation: self.generation,
        }
    }
}

struct Inner {
    slot: Mutex<Slot>,
    updates: watch::Sender<SessionSnapshot>,
    identity: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn NotificationService>,
}

/// Cloneable handle to the session slot.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        let (updates, _) = watch::channel(SessionSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(Slot::default()),
                updates,
                identity,
                notifier,
            }),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.updates.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.updates.subscribe()
    }

    /// Returns whether the login landed. Provider failures and stale results
    /// are reported as `false`, never as errors.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        let ticket = self.begin();
        let outcome = self.inner.identity.authenticate(email, password).await;
        self.settle(ticket, outcome, "login")
    }

    /// Returns whether the signup landed. A new account always starts with an
    /// unverified email.
    pub async fn signup(&self, email: &str, password: &str, name: &str) -> bool {
        let ticket = self.begin();
        let outcome = self
            .inner
            .identity
            .register(email, password, name)
            .await
            .map(|identity| Identity {
                email_verified: false,
                ..identity
            });
        self.settle(ticket, outcome, "signup")
    }

    pub fn logout(&self) {
        let mut slot = self.lock();
        slot.generation += 1;
        let was_authenticated = slot.session.is_authenticated();
        slot.session = Session::Anonymous;
        self.publish(&slot);
        if was_authenticated {
            info!(generation = slot.generation, "logged out");
        }
    }

    /// Asks the notification service to resend the verification email for
    /// the signed-in identity. Does not change the session.
    pub async fn resend_verification_email(&self) -> Result<ResendOutcome, NotificationError> {
        let Some(email) = self.snapshot().identity().map(|identity| identity.email.clone()) else {
            debug!("verification resend skipped, nobody signed in");
            return Ok(ResendOutcome::NotSignedIn);
        };

        match self.inner.notifier.send_verification(&email).await {
            Ok(()) => {
                info!(%email, "verification email resent");
                Ok(ResendOutcome::Sent { email })
            }
            Err(err) => {
                warn!(%email, error = %err, "verification email failed");
                Err(err)
            }
        }
    }

    fn begin(&self) -> Ticket<'_> {
        let mut slot = self.lock();
        slot.generation += 1;
        slot.pending += 1;
        self.publish(&slot);
        Ticket {
            context: self,
            generation: slot.generation,
            settled: false,
        }
    }

    fn settle(
        &self,
        mut ticket: Ticket<'_>,
        outcome: Result<Identity, AuthError>,
        transition: &'static str,
    ) -> bool {
        let mut slot = self.lock();
        slot.pending = slot.pending.saturating_sub(1);
        ticket.settled = true;

        let applied = match outcome {
            Ok(identity) if slot.generation == ticket.generation => {
                info!(
                    transition,
                    user_id = %identity.id,
                    admin = identity.is_admin,
                    generation = ticket.generation,
                    "authenticated"
                );
                slot.session = Session::Authenticated(identity);
                true
            }
            Ok(_) => {
                debug!(
                    transition,
                    ticket = ticket.generation,
                    current = slot.generation,
                    "discarded stale authentication result"
                );
                false
            }
            Err(err) => {
                warn!(transition, error = %err, "authentication failed");
                false
            }
        };

        self.publish(&slot);
        applied
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.inner
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, slot: &Slot) {
        self.inner.updates.send_replace(slot.snapshot());
    }
}

/// An in-flight login or signup. Clears its pending mark if dropped before
/// settling, so an abandoned transition cannot leave `is_loading` stuck.
struct Ticket<'a> {
    context: &'a SessionContext,
    generation: u64,
    settled: bool,
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let mut slot = self.context.lock();
            slot.pending = slot.pending.saturating_sub(1);
            self.context.publish(&slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{LogNotifier, StubIdentityProvider};
    use std::time::Duration;
    use tokio::sync::{Mutex as AsyncMutex, Notify};

    fn context() -> (SessionContext, Arc<LogNotifier>) {
        let notifier = Arc::new(LogNotifier::default());
        let context = SessionContext::new(
            Arc::new(StubIdentityProvider::with_demo_accounts()),
            Arc::clone(&notifier) as Arc<dyn NotificationService>,
        );
        (context, notifier)
    }

    /// Provider that blocks both calls until released.
    struct GatedProvider {
        gate: Arc<Notify>,
        inner: StubIdentityProvider,
    }

    #[async_trait]
    impl IdentityProvider for GatedProvider {
        async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
            self.gate.notified().await;
            self.inner.authenticate(email, password).await
        }

        async fn register(
            &self,
            email: &str,
            password: &str,
            name: &str,
        ) -> Result<Identity, AuthError> {
            self.gate.notified().await;
            self.inner.register(email, password, name).await
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl IdentityProvider for FailingProvider {
        async fn authenticate(&self, _: &str, _: &str) -> Result<Identity, AuthError> {
            Err(AuthError::Unavailable("timeout".to_string()))
        }

        async fn register(&self, _: &str, _: &str, _: &str) -> Result<Identity, AuthError> {
            Err(AuthError::Unavailable("timeout".to_string()))
        }
    }

    #[derive(Default)]
    struct FailingNotifier {
        attempts: AsyncMutex<usize>,
    }

    #[async_trait]
    impl NotificationService for FailingNotifier {
        async fn send_verification(&self, email: &str) -> Result<(), NotificationError> {
            *self.attempts.lock().await += 1;
            Err(NotificationError::Delivery {
                email: email.to_string(),
                reason: "mailbox unavailable".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_admin_login() {
        let (session, _) = context();
        assert!(session.login("admin@dealspot.com", "admin123").await);

        let snapshot = session.snapshot();
        assert!(snapshot.is_authenticated());
        assert!(snapshot.is_admin());
        assert!(!snapshot.needs_email_verification());
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.identity().unwrap().name, "Admin User");
    }

    #[tokio::test]
    async fn test_bad_credentials_stay_anonymous() {
        let (session, _) = context();
        assert!(!session.login("x@y.com", "wrong").await);
        assert_eq!(session.snapshot().session, Session::Anonymous);
        assert!(!session.snapshot().is_loading);
    }

    #[tokio::test]
    async fn test_provider_failure_returns_false() {
        let session =
            SessionContext::new(Arc::new(FailingProvider), Arc::new(LogNotifier::default()));
        assert!(!session.login("admin@dealspot.com", "admin123").await);
        assert!(!session.signup("new@example.com", "secret", "New").await);
        assert!(!session.snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn test_signup_is_unverified() {
        let (session, _) = context();
        assert!(session.signup("jane@example.com", "hunter22", "Jane").await);

        let snapshot = session.snapshot();
        let identity = snapshot.identity().unwrap();
        assert_eq!(identity.name, "Jane");
        assert!(!identity.email_verified);
        assert!(!identity.is_admin);
        assert!(snapshot.needs_email_verification());
    }

    #[tokio::test]
    async fn test_logout_from_any_state() {
        let (session, _) = context();
        session.logout();
        assert!(!session.snapshot().is_authenticated());

        assert!(session.login("admin@dealspot.com", "admin123").await);
        session.logout();
        assert!(!session.snapshot().is_authenticated());
        session.logout();
        assert_eq!(session.snapshot().session, Session::Anonymous);
    }

    #[tokio::test]
    async fn test_resend_while_anonymous_skips_notifier() {
        let (session, notifier) = context();
        assert_eq!(
            session.resend_verification_email().await,
            Ok(ResendOutcome::NotSignedIn)
        );
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_resend_after_signup() {
        let (session, notifier) = context();
        assert!(session.signup("jane@example.com", "hunter22", "Jane").await);
        let before = session.snapshot();

        assert_eq!(
            session.resend_verification_email().await,
            Ok(ResendOutcome::Sent {
                email: "jane@example.com".to_string()
            })
        );
        assert_eq!(notifier.sent(), vec!["jane@example.com".to_string()]);
        assert_eq!(session.snapshot(), before);
    }

    #[tokio::test]
    async fn test_resend_failure_is_observable() {
        let notifier = Arc::new(FailingNotifier::default());
        let session = SessionContext::new(
            Arc::new(StubIdentityProvider::with_demo_accounts()),
            Arc::clone(&notifier) as Arc<dyn NotificationService>,
        );
        assert!(session.signup("jane@example.com", "hunter22", "Jane").await);

        let result = session.resend_verification_email().await;
        assert!(matches!(result, Err(NotificationError::Delivery { .. })));
        assert_eq!(*notifier.attempts.lock().await, 1);
        assert!(session.snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_beats_in_flight_login() {
        let gate = Arc::new(Notify::new());
        let session = SessionContext::new(
            Arc::new(GatedProvider {
                gate: Arc::clone(&gate),
                inner: StubIdentityProvider::with_demo_accounts(),
            }),
            Arc::new(LogNotifier::default()),
        );

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.login("admin@dealspot.com", "admin123").await }
        });

        let mut updates = session.subscribe();
        tokio::time::timeout(Duration::from_secs(1), updates.wait_for(|s| s.is_loading))
            .await
            .unwrap()
            .unwrap();

        session.logout();
        gate.notify_one();

        assert!(!pending.await.unwrap());
        let snapshot = session.snapshot();
        assert_eq!(snapshot.session, Session::Anonymous);
        assert!(!snapshot.is_loading);
    }

    #[tokio::test]
    async fn test_logout_beats_in_flight_signup() {
        let gate = Arc::new(Notify::new());
        let session = SessionContext::new(
            Arc::new(GatedProvider {
                gate: Arc::clone(&gate),
                inner: StubIdentityProvider::with_demo_accounts(),
            }),
            Arc::new(LogNotifier::default()),
        );

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.signup("jane@example.com", "hunter22", "Jane").await }
        });

        let mut updates = session.subscribe();
        tokio::time::timeout(Duration::from_secs(1), updates.wait_for(|s| s.is_loading))
            .await
            .unwrap()
            .unwrap();

        session.logout();
        gate.notify_one();

        assert!(!pending.await.unwrap());
        let snapshot = session.snapshot();
        assert_eq!(snapshot.session, Session::Anonymous);
        assert!(!snapshot.needs_email_verification());
        assert!(!snapshot.is_loading);
    }

    #[tokio::test]
    async fn test_newest_login_wins() {
        let gate = Arc::new(Notify::new());
        let session = SessionContext::new(
            Arc::new(GatedProvider {
                gate: Arc::clone(&gate),
                inner: StubIdentityProvider::with_demo_accounts(),
            }),
            Arc::new(LogNotifier::default()),
        );

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.login("admin@dealspot.com", "admin123").await }
        });
        let mut updates = session.subscribe();
        tokio::time::timeout(Duration::from_secs(1), updates.wait_for(|s| s.generation == 1))
            .await
            .unwrap()
            .unwrap();

        let second = tokio::spawn({
            let session = session.clone();
            async move { session.login("john.doe@dealspot.com", "john123").await }
        });
        tokio::time::timeout(Duration::from_secs(1), updates.wait_for(|s| s.generation == 2))
            .await
            .unwrap()
            .unwrap();

        gate.notify_one();
        gate.notify_one();
        let results = (first.await.unwrap(), second.await.unwrap());

        assert_eq!(results, (false, true));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.identity().unwrap().email, "john.doe@dealspot.com");
        assert!(!snapshot.is_loading);
    }

    #[tokio::test]
    async fn test_dropped_login_clears_loading() {
        let gate = Arc::new(Notify::new());
        let session = SessionContext::new(
            Arc::new(GatedProvider {
                gate,
                inner: StubIdentityProvider::with_demo_accounts(),
            }),
            Arc::new(LogNotifier::default()),
        );

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.login("admin@dealspot.com", "admin123").await }
        });
        let mut updates = session.subscribe();
        tokio::time::timeout(Duration::from_secs(1), updates.wait_for(|s| s.is_loading))
            .await
            .unwrap()
            .unwrap();

        pending.abort();
        let _ = pending.await;
        assert!(!session.snapshot().is_loading);
    }
}
