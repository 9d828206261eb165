use crate::error::BankinError;
use crate::models::{Session, User};
use crate::pagination::{ListOptions, Page};
use crate::session::UserSession;
use crate::transport::{Headers, Query, Transport, path_segment};
use log::{debug, info, warn};
use serde_json::Value;

/// User management with client credentials.
#[derive(Debug, Clone, Copy)]
pub struct Users<'a> {
    transport: &'a Transport,
}

impl<'a> Users<'a> {
    pub(crate) fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    /// Create a user. The API requires a password of 6 to 255 characters.
    pub async fn create(&self, email: &str, password: &str) -> Result<User, BankinError> {
        require(email, "email must not be empty")?;
        require(password, "password must not be empty")?;
        info!("Creating user {}", email);
        let body = self
            .transport
            .post("/users", credentials(email, password), Headers::new())
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Sign a user in and return a session bound to their access token.
    pub async fn auth(&self, email: &str, password: &str) -> Result<UserSession, BankinError> {
        require(email, "email must not be empty")?;
        require(password, "password must not be empty")?;
        debug!("Authenticating user {}", email);
        let body = self
            .transport
            .post("/authenticate", credentials(email, password), Headers::new())
            .await?;
        let session: Session = serde_json::from_value(body)?;
        Ok(UserSession::new(self.transport.clone(), session))
    }

    pub async fn list(&self, options: &ListOptions) -> Result<Page, BankinError> {
        let body = self
            .transport
            .get("/users", options.to_query()?, Headers::new())
            .await?;
        Page::new(self.transport.clone(), body, None)
    }

    /// Change a user's password.
    pub async fn edit(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<User, BankinError> {
        require(user_id, "user_id must not be empty")?;
        require(new_password, "new_password must not be empty")?;
        let path = format!("/users/{}/password", path_segment(user_id)?);
        let query = Query::new()
            .param("current_password", current_password)
            .param("new_password", new_password);
        let body = self
            .transport
            .put(&path, query, Headers::new())
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn delete(&self, user_id: &str, password: &str) -> Result<Value, BankinError> {
        require(user_id, "user_id must not be empty")?;
        let path = format!("/users/{}", path_segment(user_id)?);
        info!("Deleting user {}", user_id);
        self.transport
            .delete(
                &path,
                Query::new().param("password", password),
                Headers::new(),
            )
            .await
    }

    /// Delete every user of the application. Only honoured by the sandbox.
    pub async fn delete_all(&self) -> Result<Value, BankinError> {
        warn!("Deleting all users");
        self.transport
            .delete("/users", Query::new(), Headers::new())
            .await
    }
}

fn credentials(email: &str, password: &str) -> Query {
    Query::new()
        .param("email", email)
        .param("password", password)
}

fn require(value: &str, message: &'static str) -> Result<(), BankinError> {
    if value.is_empty() {
        return Err(BankinError::InvalidParameter(message));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Credentials;

    #[tokio::test]
    async fn rejects_empty_arguments_before_sending() {
        let transport = Transport::new(Credentials::new("id", "secret"))
            .unwrap()
            .with_base_url("http://127.0.0.1:1/v2")
            .unwrap();
        let users = Users::new(&transport);

        let err = users.create("", "abcdef").await.unwrap_err();
        assert!(matches!(err, BankinError::InvalidParameter("email must not be empty")));
        let err = users.auth("a@b.com", "").await.unwrap_err();
        assert!(matches!(err, BankinError::InvalidParameter("password must not be empty")));
        let err = users.delete("", "pw").await.unwrap_err();
        assert!(matches!(err, BankinError::InvalidParameter("user_id must not be empty")));
    }

    #[tokio::test]
    async fn rejects_dot_segment_user_ids() {
        let transport = Transport::new(Credentials::new("id", "secret"))
            .unwrap()
            .with_base_url("http://127.0.0.1:1/v2")
            .unwrap();
        let users = Users::new(&transport);

        for id in [".", ".."] {
            let err = users.delete(id, "pw").await.unwrap_err();
            assert!(matches!(err, BankinError::InvalidParameter(_)), "{id}: {err:?}");
            let err = users.edit(id, "old", "newpass").await.unwrap_err();
            assert!(matches!(err, BankinError::InvalidParameter(_)), "{id}: {err:?}");
        }
    }
}
