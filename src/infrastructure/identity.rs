use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::application::IdentityProvider;
use crate::domain::{AuthError, Identity};

struct Account {
    password: String,
    identity: Identity,
}

/// In-memory identity provider standing in for a real account service.
///
/// Passwords are compared verbatim. Emails are matched case-insensitively.
pub struct StubIdentityProvider {
    state: Mutex<Accounts>,
}

struct Accounts {
    by_email: HashMap<String, Account>,
    next_id: u64,
}

impl Default for StubIdentityProvider {
    fn default() -> Self {
        Self {
            state: Mutex::new(Accounts {
                by_email: HashMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl StubIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider seeded with the storefront's demo accounts: the administrator
    /// (`admin@dealspot.com` / `admin123`) and a regular shopper
    /// (`john.doe@dealspot.com` / `john123`).
    pub fn with_demo_accounts() -> Self {
        let provider = Self::new();
        provider.add_account("admin@dealspot.com", "admin123", "Admin User", true);
        provider.add_account("john.doe@dealspot.com", "john123", "John Doe", false);
        provider
    }

    /// Registers a verified account and returns its identity.
    pub fn add_account(&self, email: &str, password: &str, name: &str, is_admin: bool) -> Identity {
        self.lock().insert(email, password, name, is_admin, true)
    }

    fn lock(&self) -> MutexGuard<'_, Accounts> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Accounts {
    fn insert(
        &mut self,
        email: &str,
        password: &str,
        name: &str,
        is_admin: bool,
        email_verified: bool,
    ) -> Identity {
        let identity = Identity {
            id: self.next_id.to_string(),
            email: email.trim().to_string(),
            name: name.trim().to_string(),
            is_admin,
            email_verified,
        };
        self.next_id += 1;
        self.by_email.insert(
            normalize(email),
            Account {
                password: password.to_string(),
                identity: identity.clone(),
            },
        );
        identity
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let accounts = self.lock();
        match accounts.by_email.get(&normalize(email)) {
            Some(account) if account.password == password => Ok(account.identity.clone()),
            _ => {
                debug!(email, "rejected credentials");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Identity, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        let mut accounts = self.lock();
        if accounts.by_email.contains_key(&normalize(email)) {
            return Err(AuthError::EmailTaken(email.trim().to_string()));
        }
        Ok(accounts.insert(email, password, name, false, false))
    }
}
