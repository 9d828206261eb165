use crate::error::BankinError;
use crate::models::Category;
use crate::pagination::{ListOptions, Page};
use crate::transport::{Headers, Query, Transport};
use std::fmt;

/// Language of category names, sent as `Accept-Language`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lang {
    #[default]
    En,
    Fr,
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = match self {
            Lang::En => "en",
            Lang::Fr => "fr",
        };
        f.write_str(v)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Categories<'a> {
    transport: &'a Transport,
}

impl<'a> Categories<'a> {
    pub(crate) fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    pub async fn list(&self, options: &ListOptions, lang: Lang) -> Result<Page, BankinError> {
        let body = self
            .transport
            .get("/categories", options.to_query()?, language(lang))
            .await?;
        Page::new(self.transport.clone(), body, None)
    }

    pub async fn get(&self, category_id: u64, lang: Lang) -> Result<Category, BankinError> {
        let body = self
            .transport
            .get(
                &format!("/categories/{category_id}"),
                Query::new(),
                language(lang),
            )
            .await?;
        Ok(serde_json::from_value(body)?)
    }
}

fn language(lang: Lang) -> Headers {
    Headers::from([("Accept-Language".to_string(), lang.to_string())])
}
