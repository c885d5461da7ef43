//! Canonical address records and normalization of untrusted input

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved address book entry.
///
/// Every field is always a defined string; the empty string is the canonical
/// absence value. `id` is unique within a collection and stable for the life
/// of the record. Field names follow the persisted wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
	pub id: String,
	pub first_name: String,
	pub last_name: String,
	pub street: String,
	pub house_number: String,
	pub postcode: String,
	pub city: String,
	pub lat: String,
	pub lon: String,
}

/// An address record as received from an untrusted boundary (the lookup
/// service or the durable store). Any field may be missing and unknown
/// fields are ignored; [`RawAddress::from_json`] is the fully lenient
/// decode path for values that may not even be objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAddress {
	pub id: Option<String>,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub street: Option<String>,
	pub house_number: Option<String>,
	pub postcode: Option<String>,
	pub city: Option<String>,
	pub lat: Option<String>,
	pub lon: Option<String>,
}

impl RawAddress {
	/// Lenient per-field decode of an arbitrary JSON value.
	///
	/// A field is picked up only when it is a non-empty string; wrong types,
	/// missing fields and non-object values all degrade to `None` instead of
	/// failing, so a malformed stored record or lookup reply can never error.
	pub fn from_json(value: &serde_json::Value) -> Self {
		let field = |key: &str| {
			value
				.get(key)
				.and_then(serde_json::Value::as_str)
				.filter(|s| !s.is_empty())
				.map(String::from)
		};

		Self {
			id: field("id"),
			first_name: field("firstName"),
			last_name: field("lastName"),
			street: field("street"),
			house_number: field("houseNumber"),
			postcode: field("postcode"),
			city: field("city"),
			lat: field("lat"),
			lon: field("lon"),
		}
	}
}

fn field(value: Option<String>) -> String {
	value.unwrap_or_default()
}

impl Address {
	/// Normalize a raw record into the canonical shape.
	///
	/// Total and infallible: missing fields degrade to the empty string, and
	/// a missing or empty `id` is replaced with a freshly generated UUID.
	pub fn normalize(raw: RawAddress) -> Self {
		let id = match raw.id {
			Some(id) if !id.is_empty() => id,
			_ => Uuid::new_v4().to_string(),
		};

		Self {
			id,
			first_name: field(raw.first_name),
			last_name: field(raw.last_name),
			street: field(raw.street),
			house_number: field(raw.house_number),
			postcode: field(raw.postcode),
			city: field(raw.city),
			lat: field(raw.lat),
			lon: field(raw.lon),
		}
	}

	/// Attach a person's name to an address candidate, yielding the entry
	/// that actually gets saved.
	pub fn with_person(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
		self.first_name = first_name.into();
		self.last_name = last_name.into();
		self
	}
}

impl From<Address> for RawAddress {
	fn from(address: Address) -> Self {
		Self {
			id: Some(address.id),
			first_name: Some(address.first_name),
			last_name: Some(address.last_name),
			street: Some(address.street),
			house_number: Some(address.house_number),
			postcode: Some(address.postcode),
			city: Some(address.city),
			lat: Some(address.lat),
			lon: Some(address.lon),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalize_fills_missing_fields_with_empty_strings() {
		let address = Address::normalize(RawAddress {
			street: Some("Keizersgracht".into()),
			..Default::default()
		});

		assert_eq!(address.street, "Keizersgracht");
		assert_eq!(address.first_name, "");
		assert_eq!(address.last_name, "");
		assert_eq!(address.postcode, "");
		assert_eq!(address.city, "");
		assert_eq!(address.lat, "");
		assert_eq!(address.lon, "");
		assert!(!address.id.is_empty());
	}

	#[test]
	fn normalize_keeps_existing_id() {
		let address = Address::normalize(RawAddress {
			id: Some("abc".into()),
			..Default::default()
		});

		assert_eq!(address.id, "abc");
	}

	#[test]
	fn normalize_replaces_empty_id() {
		let a = Address::normalize(RawAddress {
			id: Some(String::new()),
			..Default::default()
		});
		let b = Address::normalize(RawAddress::default());

		assert!(!a.id.is_empty());
		assert!(!b.id.is_empty());
		assert_ne!(a.id, b.id);
	}

	#[test]
	fn raw_address_tolerates_arbitrary_objects() {
		let raw: RawAddress =
			serde_json::from_value(serde_json::json!({ "unexpected": 42, "city": "Utrecht" }))
				.unwrap();

		assert_eq!(raw.city.as_deref(), Some("Utrecht"));
		assert!(raw.street.is_none());
	}

	#[test]
	fn from_json_takes_only_non_empty_strings() {
		let raw = RawAddress::from_json(&serde_json::json!({
			"id": 42,
			"firstName": "",
			"lastName": "Lovelace",
			"street": null,
			"city": "Amsterdam"
		}));

		assert_eq!(raw.id, None);
		assert_eq!(raw.first_name, None);
		assert_eq!(raw.last_name.as_deref(), Some("Lovelace"));
		assert_eq!(raw.street, None);
		assert_eq!(raw.city.as_deref(), Some("Amsterdam"));
	}

	#[test]
	fn from_json_of_non_object_is_all_empty() {
		let raw = RawAddress::from_json(&serde_json::json!("garbage"));
		assert_eq!(raw, RawAddress::default());
	}

	#[test]
	fn round_trips_through_raw_form() {
		let address = Address::normalize(RawAddress {
			id: Some("1".into()),
			first_name: Some("Ada".into()),
			last_name: Some("Lovelace".into()),
			street: Some("Herengracht".into()),
			house_number: Some("12".into()),
			postcode: Some("1015BT".into()),
			city: Some("Amsterdam".into()),
			lat: Some("52.37".into()),
			lon: Some("4.89".into()),
		});

		assert_eq!(Address::normalize(address.clone().into()), address);
	}
}
