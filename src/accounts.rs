use crate::error::BankinError;
use crate::models::Account;
use crate::pagination::{ListOptions, Page};
use crate::session::AuthContext;
use crate::transport::Query;

#[derive(Debug, Clone, Copy)]
pub struct Accounts<'a> {
    auth: &'a AuthContext,
}

impl<'a> Accounts<'a> {
    pub(crate) fn new(auth: &'a AuthContext) -> Self {
        Self { auth }
    }

    pub async fn list(&self, options: &ListOptions) -> Result<Page, BankinError> {
        self.auth.list("/accounts", options, Query::new()).await
    }

    pub async fn get(&self, account_id: u64) -> Result<Account, BankinError> {
        self.auth.get_as(&format!("/accounts/{account_id}")).await
    }
}
