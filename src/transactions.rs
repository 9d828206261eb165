use crate::error::BankinError;
use crate::models::Transaction;
use crate::pagination::{ListOptions, Page};
use crate::session::AuthContext;
use crate::transport::Query;
use chrono::{DateTime, SecondsFormat, Utc};

#[derive(Debug, Clone, Copy)]
pub struct Transactions<'a> {
    auth: &'a AuthContext,
}

impl<'a> Transactions<'a> {
    pub(crate) fn new(auth: &'a AuthContext) -> Self {
        Self { auth }
    }

    pub async fn list(&self, options: &ListOptions) -> Result<Page, BankinError> {
        self.auth.list("/transactions", options, Query::new()).await
    }

    /// Transactions created, modified or deleted since `since`. Deleted ones
    /// come back with `is_deleted` set.
    pub async fn list_updated(
        &self,
        since: DateTime<Utc>,
        options: &ListOptions,
    ) -> Result<Page, BankinError> {
        let query = Query::new().param("since", since.to_rfc3339_opts(SecondsFormat::Millis, true));
        self.auth
            .list("/transactions/updated", options, query)
            .await
    }

    pub async fn list_for_account(
        &self,
        account_id: u64,
        options: &ListOptions,
    ) -> Result<Page, BankinError> {
        self.auth
            .list(&format!("/accounts/{account_id}/transactions"), options, Query::new())
            .await
    }

    pub async fn get(&self, transaction_id: u64) -> Result<Transaction, BankinError> {
        self.auth
            .get_as(&format!("/transactions/{transaction_id}"))
            .await
    }
}
