use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Link to another resource, as embedded in most payloads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceRef {
    pub id: Option<u64>,
    pub uuid: Option<String>,
    pub resource_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub uuid: String,
    pub email: String,
    pub resource_uri: Option<String>,
    pub resource_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `POST /authenticate`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Bank {
    pub id: u64,
    pub name: String,
    pub country_code: Option<String>,
    pub automatic_refresh: Option<bool>,
    pub logo_url: Option<String>,
    pub resource_uri: Option<String>,
    pub resource_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub parent: Option<ResourceRef>,
    pub resource_uri: Option<String>,
    pub resource_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Item {
    pub id: u64,
    pub status: Option<i64>,
    pub status_code_info: Option<String>,
    pub bank: Option<ResourceRef>,
    pub resource_uri: Option<String>,
    pub resource_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Progress of an item refresh, from `GET /items/{id}/refresh`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RefreshStatus {
    pub status: String,
    pub refreshed_accounts_count: Option<u64>,
    pub total_accounts_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Account {
    pub id: u64,
    pub name: Option<String>,
    pub balance: Option<Decimal>,
    pub currency_code: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<i64>,
    pub bank: Option<ResourceRef>,
    pub item: Option<ResourceRef>,
    pub last_refresh_date: Option<DateTime<Utc>>,
    pub resource_uri: Option<String>,
    pub resource_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub description: Option<String>,
    pub raw_description: Option<String>,
    pub amount: Decimal,
    pub currency_code: Option<String>,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_deleted: bool,
    pub category: Option<ResourceRef>,
    pub account: Option<ResourceRef>,
    pub resource_uri: Option<String>,
    pub resource_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Stock {
    pub id: u64,
    pub label: Option<String>,
    pub ticker: Option<String>,
    pub isin: Option<String>,
    pub quantity: Option<Decimal>,
    pub current_price: Option<Decimal>,
    pub average_purchase_price: Option<Decimal>,
    pub total_value: Option<Decimal>,
    pub currency_code: Option<String>,
    pub account: Option<ResourceRef>,
    pub resource_uri: Option<String>,
    pub resource_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| D::Error::custom("invalid date value"))
}

/// Accepts `YYYY-MM-DD` optionally followed by a time part.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let prefix = raw.get(0..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}
