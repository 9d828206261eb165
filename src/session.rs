//! Authenticated user context.

use crate::accounts::Accounts;
use crate::error::BankinError;
use crate::items::Items;
use crate::models::{Session, User};
use crate::users::Users;
use crate::pagination::{ListOptions, Page};
use crate::stocks::Stocks;
use crate::transactions::Transactions;
use crate::transport::{Query, RequestDescriptor, Transport};
use chrono::{DateTime, Utc};
use log::info;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Transport plus the bearer token of one user. Every request sent through it
/// carries `Authorization: Bearer <token>`, and every page it returns keeps the token.
#[derive(Clone)]
pub struct AuthContext {
    transport: Transport,
    bearer_token: String,
}

impl AuthContext {
    pub fn new(transport: Transport, bearer_token: impl Into<String>) -> Self {
        Self {
            transport,
            bearer_token: bearer_token.into(),
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn bearer_token(&self) -> &str {
        &self.bearer_token
    }

    pub async fn send(&self, request: RequestDescriptor) -> Result<Value, BankinError> {
        self.transport
            .send(request.bearer(&self.bearer_token))
            .await
    }

    pub(crate) async fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<T, BankinError> {
        let body = self.send(RequestDescriptor::get(path)).await?;
        Ok(serde_json::from_value(body)?)
    }

    pub(crate) async fn list(
        &self,
        path: &str,
        options: &ListOptions,
        extra: Query,
    ) -> Result<Page, BankinError> {
        let mut query = options.to_query()?;
        for (key, value) in extra.defined() {
            query.set(key, Some(value.to_string()));
        }
        let body = self
            .send(RequestDescriptor::get(path).with_query(query))
            .await?;
        Page::new(
            self.transport.clone(),
            body,
            Some(self.bearer_token.clone()),
        )
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("transport", &self.transport)
            .field("bearer_token", &"<redacted>")
            .finish()
    }
}

/// A user signed in through [`Users::auth`](crate::Users::auth).
#[derive(Debug, Clone)]
pub struct UserSession {
    user: User,
    expires_at: Option<DateTime<Utc>>,
    auth: AuthContext,
}

impl UserSession {
    pub fn new(transport: Transport, session: Session) -> Self {
        Self {
            user: session.user,
            expires_at: session.expires_at,
            auth: AuthContext::new(transport, session.access_token),
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn access_token(&self) -> &str {
        self.auth.bearer_token()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the token has expired at `now`. Sessions without an expiry never expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// Revoke the access token.
    pub async fn logout(&self) -> Result<(), BankinError> {
        info!("Logging out user {}", self.user.uuid);
        self.auth.send(RequestDescriptor::post("/logout")).await?;
        Ok(())
    }

    /// Change this user's password.
    pub async fn edit(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<User, BankinError> {
        Users::new(self.auth.transport())
            .edit(&self.user.uuid, current_password, new_password)
            .await
    }

    /// Delete this user. The session is unusable afterwards.
    pub async fn delete(&self, password: &str) -> Result<Value, BankinError> {
        Users::new(self.auth.transport())
            .delete(&self.user.uuid, password)
            .await
    }

    pub fn items(&self) -> Items<'_> {
        Items::new(&self.auth)
    }

    pub fn accounts(&self) -> Accounts<'_> {
        Accounts::new(&self.auth)
    }

    pub fn transactions(&self) -> Transactions<'_> {
        Transactions::new(&self.auth)
    }

    pub fn stocks(&self) -> Stocks<'_> {
        Stocks::new(&self.auth)
    }
}
