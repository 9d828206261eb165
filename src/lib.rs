//! Rust client for the Bankin sync REST API.
//! Provides signed requests, cursor pagination over list endpoints and thin
//! resource façades for users, banks, categories, items, accounts,
//! transactions and stocks.

pub mod accounts;
pub mod banks;
pub mod categories;
pub mod client;
pub mod error;
pub mod items;
pub mod models;
pub mod pagination;
pub mod session;
pub mod stocks;
pub mod transactions;
pub mod transport;
pub mod users;

pub use categories::Lang;
pub use client::Client;
pub use error::{ApiError, BankinError, TransportError};
pub use models::{
    Account, Bank, Category, Item, RefreshStatus, ResourceRef, Session, Stock, Transaction, User,
};
pub use pagination::{ListOptions, Page, Pagination};
pub use session::{AuthContext, UserSession};
pub use transport::{
    Credentials, Headers, Query, RequestDescriptor, Transport, TransportEvent,
};
pub use users::Users;
