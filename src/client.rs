use crate::banks::Banks;
use crate::categories::Categories;
use crate::error::BankinError;
use crate::transport::{Credentials, Transport, TransportEvent};
use crate::users::Users;

/// Entry point: owns the [`Transport`] and hands out resource façades.
#[derive(Debug, Clone)]
pub struct Client {
    transport: Transport,
}

impl Client {
    /// Create a client against the production endpoint with the default API version.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, BankinError> {
        Self::with_credentials(Credentials::new(client_id, client_secret))
    }

    pub fn with_credentials(credentials: Credentials) -> Result<Self, BankinError> {
        let transport = Transport::new(credentials)?;
        Ok(Self { transport })
    }

    /// Build from `BANKIN_CLIENT_ID`, `BANKIN_CLIENT_SECRET` and `BANKIN_VERSION`.
    pub fn from_env() -> Result<Self, BankinError> {
        Self::with_credentials(Credentials::from_env()?)
    }

    /// Pin the `Bankin-Version` sent with every request (`YYYY-MM-DD`).
    pub fn with_version(self, version: impl Into<String>) -> Result<Self, BankinError> {
        Ok(Self {
            transport: self.transport.with_version(version)?,
        })
    }

    /// Override the base endpoint (useful for tests or proxies).
    pub fn with_base_url(self, base_url: &str) -> Result<Self, BankinError> {
        Ok(Self {
            transport: self.transport.with_base_url(base_url)?,
        })
    }

    /// Observe every request issued through this client and its pages.
    pub fn with_observer<F>(self, observer: F) -> Self
    where
        F: Fn(&TransportEvent<'_>) + Send + Sync + 'static,
    {
        Self {
            transport: self.transport.with_observer(observer),
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(&self.transport)
    }

    pub fn banks(&self) -> Banks<'_> {
        Banks::new(&self.transport)
    }

    pub fn categories(&self) -> Categories<'_> {
        Categories::new(&self.transport)
    }
}
