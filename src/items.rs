use crate::error::BankinError;
use crate::models::{Item, RefreshStatus};
use crate::pagination::{ListOptions, Page};
use crate::session::AuthContext;
use crate::transport::{Query, RequestDescriptor};
use log::info;
use serde_json::Value;
use url::Url;

/// Bank connections ("items") of the signed-in user.
#[derive(Debug, Clone, Copy)]
pub struct Items<'a> {
    auth: &'a AuthContext,
}

impl<'a> Items<'a> {
    pub(crate) fn new(auth: &'a AuthContext) -> Self {
        Self { auth }
    }

    pub async fn list(&self, options: &ListOptions) -> Result<Page, BankinError> {
        self.auth.list("/items", options, Query::new()).await
    }

    pub async fn get(&self, item_id: u64) -> Result<Item, BankinError> {
        self.auth.get_as(&format!("/items/{item_id}")).await
    }

    pub async fn delete(&self, item_id: u64) -> Result<(), BankinError> {
        info!("Deleting item {}", item_id);
        self.auth
            .send(RequestDescriptor::delete(format!("/items/{item_id}")))
            .await?;
        Ok(())
    }

    /// Ask the API to resynchronise an item with its bank.
    pub async fn refresh(&self, item_id: u64) -> Result<Value, BankinError> {
        info!("Refreshing item {}", item_id);
        self.auth
            .send(RequestDescriptor::post(format!("/items/{item_id}/refresh")))
            .await
    }

    pub async fn refresh_status(&self, item_id: u64) -> Result<RefreshStatus, BankinError> {
        self.auth
            .get_as(&format!("/items/{item_id}/refresh"))
            .await
    }

    /// URL of the hosted page where the user connects a bank. Carries the client
    /// id and the user's access token, never the client secret.
    pub fn connect_url(&self, bank_id: u64, redirect_url: Option<&str>) -> Result<Url, BankinError> {
        let query = Query::new()
            .param("access_token", self.auth.bearer_token())
            .param("bank_id", bank_id)
            .opt("redirect_url", redirect_url);
        self.auth
            .transport()
            .url_with_query("/items/connect", &query)
    }
}
