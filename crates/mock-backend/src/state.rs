//! In-memory directory of users, groups and credentials.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use usergroup_models::{Group, NewGroup, NewUser, User};

use crate::error::MockError;

struct Account {
    user: User,
    password_hash: String,
}

#[derive(Default)]
struct Directory {
    accounts: Vec<Account>,
    groups: Vec<Group>,
    next_user_id: i64,
    next_group_id: i64,
}

/// State shared across all Axum handlers.
pub struct MockState {
    secret: String,
    ttl: Duration,
    directory: Mutex<Directory>,
    logout_headers: Mutex<Vec<Option<String>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn sha256_hex(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

impl MockState {
    /// Empty directory signing with `secret`; tokens live for `ttl`.
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
            directory: Mutex::new(Directory {
                next_user_id: 1,
                next_group_id: 1,
                ..Directory::default()
            }),
            logout_headers: Mutex::new(Vec::new()),
        }
    }

    /// Directory with two groups and two accounts:
    ///
    /// | login   | password | admin | groups |
    /// |---------|----------|-------|--------|
    /// | `admin` | `admin`  | yes   | 1      |
    /// | `zoe`   | `zoe`    | no    | 1, 2   |
    pub fn seeded(secret: impl Into<String>, ttl: Duration) -> Self {
        let state = Self::new(secret, ttl);
        state.insert_group("administrators", None);
        state.insert_group("operations", None);
        state.insert_user(
            NewUser {
                name: "Administrator".into(),
                email: "admin@example.com".into(),
                username: "admin".into(),
                password_hash: sha256_hex("admin"),
                external_id: Some("ADM-0001".into()),
                is_admin: true,
            },
            vec![1],
        );
        state.insert_user(
            NewUser {
                name: "Zoë Müller-Ñúñez".into(),
                email: "zoe@example.com".into(),
                username: "zoe".into(),
                password_hash: sha256_hex("zoe"),
                external_id: None,
                is_admin: false,
            },
            vec![1, 2],
        );
        state
    }

    /// HMAC signing secret.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Lifetime of issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// `Authorization` header of every logout request received, in order.
    pub fn logout_requests(&self) -> Vec<Option<String>> {
        lock(&self.logout_headers).clone()
    }

    pub(crate) fn record_logout(&self, header: Option<String>) {
        lock(&self.logout_headers).push(header);
    }

    /// Account matching `username` and `password_hash`.
    pub(crate) fn authenticate(&self, username: &str, password_hash: &str) -> Result<User, MockError> {
        let dir = lock(&self.directory);
        let account = dir
            .accounts
            .iter()
            .find(|a| a.user.username == username && a.password_hash == password_hash)
            .ok_or(MockError::InvalidCredentials)?;
        if account.user.is_locked || !account.user.is_active {
            return Err(MockError::Locked(username.to_string()));
        }
        Ok(account.user.clone())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub(crate) fn users(&self) -> Vec<User> {
        lock(&self.directory)
            .accounts
            .iter()
            .map(|a| a.user.clone())
            .collect()
    }

    pub(crate) fn user(&self, id: i64) -> Result<User, MockError> {
        lock(&self.directory)
            .accounts
            .iter()
            .find(|a| a.user.id == id)
            .map(|a| a.user.clone())
            .ok_or_else(|| MockError::NotFound(format!("user {id}")))
    }

    pub(crate) fn create_user(&self, new: NewUser) -> Result<User, MockError> {
        if lock(&self.directory)
            .accounts
            .iter()
            .any(|a| a.user.username == new.username)
        {
            return Err(MockError::Conflict(format!("username {}", new.username)));
        }
        Ok(self.insert_user(new, Vec::new()))
    }

    fn insert_user(&self, new: NewUser, groups: Vec<i64>) -> User {
        let mut dir = lock(&self.directory);
        let user = User {
            id: dir.next_user_id,
            name: new.name,
            email: new.email,
            username: new.username,
            external_id: new.external_id,
            groups_id: (!groups.is_empty()).then_some(groups),
            is_admin: new.is_admin,
            is_locked: false,
            is_active: true,
            create_time: Some(Utc::now()),
            comment: None,
        };
        dir.next_user_id += 1;
        dir.accounts.push(Account {
            user: user.clone(),
            password_hash: new.password_hash,
        });
        user
    }

    pub(crate) fn update_user(&self, id: i64, mut user: User) -> Result<User, MockError> {
        let mut dir = lock(&self.directory);
        let account = dir
            .accounts
            .iter_mut()
            .find(|a| a.user.id == id)
            .ok_or_else(|| MockError::NotFound(format!("user {id}")))?;
        user.id = id;
        user.create_time = account.user.create_time;
        account.user = user.clone();
        Ok(user)
    }

    pub(crate) fn delete_user(&self, id: i64) -> Result<(), MockError> {
        let mut dir = lock(&self.directory);
        let before = dir.accounts.len();
        dir.accounts.retain(|a| a.user.id != id);
        if dir.accounts.len() == before {
            return Err(MockError::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    pub(crate) fn groups(&self) -> Vec<Group> {
        lock(&self.directory).groups.clone()
    }

    pub(crate) fn group(&self, id: i64) -> Result<Group, MockError> {
        lock(&self.directory)
            .groups
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .ok_or_else(|| MockError::NotFound(format!("group {id}")))
    }

    pub(crate) fn create_group(&self, new: NewGroup, creator: i64) -> Result<Group, MockError> {
        if lock(&self.directory).groups.iter().any(|g| g.name == new.name) {
            return Err(MockError::Conflict(format!("group {}", new.name)));
        }
        let mut group = self.insert_group(&new.name, Some(creator));
        group.comment = new.comment;
        self.update_group(group.id, group)
    }

    fn insert_group(&self, name: &str, creator: Option<i64>) -> Group {
        let mut dir = lock(&self.directory);
        let group = Group {
            id: dir.next_group_id,
            name: name.to_string(),
            is_active: true,
            create_time: Some(Utc::now()),
            creator,
            inactivation_reason: None,
            comment: None,
        };
        dir.next_group_id += 1;
        dir.groups.push(group.clone());
        group
    }

    pub(crate) fn update_group(&self, id: i64, mut group: Group) -> Result<Group, MockError> {
        let mut dir = lock(&self.directory);
        let slot = dir
            .groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| MockError::NotFound(format!("group {id}")))?;
        group.id = id;
        *slot = group.clone();
        Ok(group)
    }

    pub(crate) fn delete_group(&self, id: i64) -> Result<(), MockError> {
        let mut dir = lock(&self.directory);
        let before = dir.groups.len();
        dir.groups.retain(|g| g.id != id);
        if dir.groups.len() == before {
            return Err(MockError::NotFound(format!("group {id}")));
        }
        Ok(())
    }
}
