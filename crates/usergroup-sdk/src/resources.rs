//! User and group CRUD wrappers.
//!
//! Stateless request/response plumbing over the restricted resource
//! endpoints. Every call reads the bearer credential afresh through
//! [`SessionManager::authorization_header_value`] and attaches it to that
//! request only; nothing is set on a shared client.

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, trace};
use usergroup_models::{Group, NewGroup, NewUser, User};

use crate::error::{server_message, SdkError};
use crate::routes::ApiRoutes;
use crate::session::SessionManager;
use crate::store::SessionStore;

// ---------------------------------------------------------------------------
// Shared plumbing
// ---------------------------------------------------------------------------

struct ResourceClient<'a, S> {
    session: &'a SessionManager<S>,
}

impl<S: SessionStore> ResourceClient<'_, S> {
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.session
            .authorized(self.session.http().request(method, url))
    }

    async fn execute(
        &self,
        name: &'static str,
        url: &str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, SdkError> {
        trace!(method = name, url = %url, "resource request");
        let response = request.send().await.map_err(|e| {
            error!(method = name, url = %url, error = %e, "request got no response");
            e
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!(method = name, url = %url, status = status.as_u16(), "request rejected");
        Err(SdkError::Rejected {
            method: name,
            url: url.to_string(),
            status: status.as_u16(),
            message: server_message(&body),
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        name: &'static str,
        url: &str,
    ) -> Result<T, SdkError> {
        let response = self
            .execute(name, url, self.request(Method::GET, url))
            .await?;
        Ok(response.json().await?)
    }

    async fn send<B, T>(
        &self,
        name: &'static str,
        method: Method,
        url: &str,
        body: &B,
    ) -> Result<T, SdkError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(method, url).json(body);
        let response = self.execute(name, url, request).await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, name: &'static str, url: &str) -> Result<(), SdkError> {
        self.execute(name, url, self.request(Method::DELETE, url))
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// UserApi
// ---------------------------------------------------------------------------

/// CRUD operations on `/{prefix}/users`.
///
/// ```rust,no_run
/// use usergroup_sdk::{MemorySessionStore, SessionManager, UserApi};
///
/// # async fn run() -> Result<(), usergroup_sdk::SdkError> {
/// let session = SessionManager::new(MemorySessionStore::new("MyApp"));
/// let users = UserApi::new(&session, "http://localhost:8080");
/// for user in users.list().await? {
///     println!("{} {}", user.id, user.username);
/// }
/// # Ok(())
/// # }
/// ```
pub struct UserApi<'a, S> {
    client: ResourceClient<'a, S>,
    routes: ApiRoutes,
}

impl<'a, S: SessionStore> UserApi<'a, S> {
    /// User endpoints of the backend at `base_url`.
    pub fn new(session: &'a SessionManager<S>, base_url: &str) -> Self {
        Self {
            routes: session.routes(base_url),
            client: ResourceClient { session },
        }
    }

    /// All users.
    pub async fn list(&self) -> Result<Vec<User>, SdkError> {
        self.client.fetch("getList", &self.routes.users()).await
    }

    /// One user by id.
    pub async fn get(&self, id: i64) -> Result<User, SdkError> {
        self.client.fetch("getUser", &self.routes.user(id)).await
    }

    /// Create a user; returns the stored record.
    pub async fn create(&self, user: &NewUser) -> Result<User, SdkError> {
        self.client
            .send("newUser", Method::POST, &self.routes.users(), user)
            .await
    }

    /// Replace the user with `user.id`; returns the stored record.
    pub async fn update(&self, user: &User) -> Result<User, SdkError> {
        self.client
            .send("modifyUser", Method::PUT, &self.routes.user(user.id), user)
            .await
    }

    /// Delete a user by id.
    pub async fn delete(&self, id: i64) -> Result<(), SdkError> {
        self.client.delete("deleteUser", &self.routes.user(id)).await
    }
}

// ---------------------------------------------------------------------------
// GroupApi
// ---------------------------------------------------------------------------

/// CRUD operations on `/{prefix}/groups`.
pub struct GroupApi<'a, S> {
    client: ResourceClient<'a, S>,
    routes: ApiRoutes,
}

impl<'a, S: SessionStore> GroupApi<'a, S> {
    /// Group endpoints of the backend at `base_url`.
    pub fn new(session: &'a SessionManager<S>, base_url: &str) -> Self {
        Self {
            routes: session.routes(base_url),
            client: ResourceClient { session },
        }
    }

    /// All groups.
    pub async fn list(&self) -> Result<Vec<Group>, SdkError> {
        self.client.fetch("getList", &self.routes.groups()).await
    }

    /// One group by id.
    pub async fn get(&self, id: i64) -> Result<Group, SdkError> {
        self.client.fetch("getGroup", &self.routes.group(id)).await
    }

    /// Create a group; returns the stored record.
    pub async fn create(&self, group: &NewGroup) -> Result<Group, SdkError> {
        self.client
            .send("newGroup", Method::POST, &self.routes.groups(), group)
            .await
    }

    /// Replace the group with `group.id`; returns the stored record.
    pub async fn update(&self, group: &Group) -> Result<Group, SdkError> {
        self.client
            .send("modifyGroup", Method::PUT, &self.routes.group(group.id), group)
            .await
    }

    /// Delete a group by id.
    pub async fn delete(&self, id: i64) -> Result<(), SdkError> {
        self.client.delete("deleteGroup", &self.routes.group(id)).await
    }
}
