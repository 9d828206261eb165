use crate::error::BankinError;
use crate::models::Stock;
use crate::pagination::{ListOptions, Page};
use crate::session::AuthContext;
use crate::transport::Query;

/// Securities held in the user's investment accounts.
#[derive(Debug, Clone, Copy)]
pub struct Stocks<'a> {
    auth: &'a AuthContext,
}

impl<'a> Stocks<'a> {
    pub(crate) fn new(auth: &'a AuthContext) -> Self {
        Self { auth }
    }

    pub async fn list(&self, options: &ListOptions) -> Result<Page, BankinError> {
        self.auth.list("/stocks", options, Query::new()).await
    }

    pub async fn get(&self, stock_id: u64) -> Result<Stock, BankinError> {
        self.auth.get_as(&format!("/stocks/{stock_id}")).await
    }
}
