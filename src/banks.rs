use crate::error::BankinError;
use crate::models::Bank;
use crate::pagination::{ListOptions, Page};
use crate::transport::{Headers, Query, Transport};
use log::debug;

/// Banks supported by the aggregation service.
#[derive(Debug, Clone, Copy)]
pub struct Banks<'a> {
    transport: &'a Transport,
}

impl<'a> Banks<'a> {
    pub(crate) fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    pub async fn list(&self, options: &ListOptions) -> Result<Page, BankinError> {
        debug!("Listing banks");
        let body = self
            .transport
            .get("/banks", options.to_query()?, Headers::new())
            .await?;
        Page::new(self.transport.clone(), body, None)
    }

    pub async fn get(&self, bank_id: u64) -> Result<Bank, BankinError> {
        let body = self
            .transport
            .get(&format!("/banks/{bank_id}"), Query::new(), Headers::new())
            .await?;
        Ok(serde_json::from_value(body)?)
    }
}
