//! Address lookup by postcode and house number

use crate::address::RawAddress;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
	#[error("{0}")]
	InvalidQuery(&'static str),
	#[error("lookup request failed: {0}")]
	Request(#[from] reqwest::Error),
	#[error("lookup service returned status {0}")]
	Status(reqwest::StatusCode),
	#[error("invalid response format from lookup service")]
	InvalidResponse,
}

/// Validate a lookup query before it goes over the wire.
pub fn validate_query(postcode: &str, house_number: &str) -> Result<(), LookupError> {
	if postcode.trim().is_empty() || house_number.trim().is_empty() {
		return Err(LookupError::InvalidQuery(
			"postcode and house number are required",
		));
	}

	if postcode.trim().len() < 4 {
		return Err(LookupError::InvalidQuery(
			"postcode must be at least 4 characters",
		));
	}

	Ok(())
}

/// Supplies raw address candidates for a postcode + house number query.
/// Results are untrusted and go through [`crate::Address::normalize`]
/// before use.
#[async_trait]
pub trait AddressLookup: Send + Sync {
	async fn find(
		&self,
		postcode: &str,
		house_number: &str,
	) -> Result<Vec<RawAddress>, LookupError>;
}

/// [`AddressLookup`] against the `GET /api/getAddresses` endpoint.
pub struct HttpAddressLookup {
	base_url: String,
	client: reqwest::Client,
}

impl HttpAddressLookup {
	pub fn new(base_url: impl Into<String>) -> Self {
		let mut base_url = base_url.into();
		while base_url.ends_with('/') {
			base_url.pop();
		}

		Self {
			base_url,
			client: reqwest::Client::new(),
		}
	}
}

/// The reply must be an object carrying a `details` array. The queried house
/// number is substituted into every candidate, since the service echoes the
/// street-level match without it.
fn candidates_from_reply(body: &Value, house_number: &str) -> Result<Vec<RawAddress>, LookupError> {
	let details = body
		.get("details")
		.and_then(Value::as_array)
		.ok_or(LookupError::InvalidResponse)?;

	Ok(details
		.iter()
		.map(|item| {
			let mut raw = RawAddress::from_json(item);
			raw.house_number = Some(house_number.to_string());
			raw
		})
		.collect())
}

#[async_trait]
impl AddressLookup for HttpAddressLookup {
	async fn find(
		&self,
		postcode: &str,
		house_number: &str,
	) -> Result<Vec<RawAddress>, LookupError> {
		validate_query(postcode, house_number)?;
		let postcode = postcode.trim();
		let house_number = house_number.trim();

		let response = self
			.client
			.get(format!("{}/api/getAddresses", self.base_url))
			.query(&[("postcode", postcode), ("streetnumber", house_number)])
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(LookupError::Status(response.status()));
		}

		let body: Value = response.json().await?;
		candidates_from_reply(&body, house_number)
	}
}
