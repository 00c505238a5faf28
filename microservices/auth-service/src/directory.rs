//! Fixed user directory, loaded once at startup

use metrica_core::{Credentials, MetricaError, Result};
use std::collections::HashMap;
use std::fmt;

const DEMO_USERS: [(&str, &str); 4] = [
    ("alice", "alice123"),
    ("bob", "bob123"),
    ("luis", "luis123"),
    ("nick", "nick123"),
];

#[derive(Clone)]
pub struct CredentialDirectory {
    users: HashMap<String, String>,
}

impl CredentialDirectory {
    pub fn new<I, U, P>(users: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            users: users
                .into_iter()
                .map(|(user, password)| (user.into(), password.into()))
                .collect(),
        }
    }

    /// Parse `alice:alice123,bob:bob123`. Passwords may contain `:`.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut users = HashMap::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (user, password) = entry
                .split_once(':')
                .map(|(u, p)| (u.trim(), p.trim()))
                .filter(|(u, p)| !u.is_empty() && !p.is_empty())
                .ok_or_else(|| {
                    MetricaError::Config(format!("AUTH_USERS entry {:?} is not user:password", entry))
                })?;
            users.insert(user.to_string(), password.to_string());
        }

        if users.is_empty() {
            return Err(MetricaError::Config("AUTH_USERS holds no users".into()));
        }
        Ok(Self { users })
    }

    /// Exact match on the trimmed pair. Empty input never matches.
    pub fn verify(&self, credentials: &Credentials) -> bool {
        let credentials = Credentials::new(&credentials.username, &credentials.password);
        if credentials.username.is_empty() {
            return false;
        }
        self.users
            .get(&credentials.username)
            .is_some_and(|password| *password == credentials.password)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }
}

impl Default for CredentialDirectory {
    fn default() -> Self {
        Self::new(DEMO_USERS)
    }
}

// Passwords stay out of logs
impl fmt::Debug for CredentialDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut users: Vec<&str> = self.users.keys().map(String::as_str).collect();
        users.sort_unstable();
        f.debug_struct("CredentialDirectory").field("users", &users).finish()
    }
}
