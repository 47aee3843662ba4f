use std::time::Duration;

use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{PriceKey, PriceSource};

#[derive(Debug, Deserialize)]
struct PriceResponse {
    price: Option<Decimal>,
}

/// HTTP price-oracle client. Every request carries a short timeout so one
/// unresponsive upstream cannot stall a whole refresh batch; a timeout is
/// treated the same as a failed lookup.
#[derive(Debug, Clone)]
pub struct PriceClient {
    http: Client,
    base_url: String,
}

impl PriceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

impl PriceSource for PriceClient {
    async fn get_price(&self, key: &PriceKey) -> anyhow::Result<Option<Decimal>> {
        let (param, value) = match key {
            PriceKey::Symbol(s) => ("symbol", s.as_str()),
            PriceKey::Address(a) => ("address", a.as_str()),
        };

        let url = format!("{}/price", self.base_url);
        let resp = self.http.get(&url).query(&[(param, value)]).send().await?;

        // An unknown token is a missing price, not an error.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body: PriceResponse = resp.error_for_status()?.json().await?;
        Ok(body.price.filter(|p| *p > Decimal::ZERO))
    }
}
