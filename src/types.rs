use serde::{Deserialize, Serialize};

/// Country reported when none can be determined.
pub const DEFAULT_COUNTRY: &str = "USA";

/// The six canonical address keys, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    Address1,
    Address2,
    City,
    State,
    Zip,
    Country,
}

impl AddressField {
    /// Every field, in the order they are serialized.
    pub const ALL: [AddressField; 6] = [
        AddressField::Address1,
        AddressField::Address2,
        AddressField::City,
        AddressField::State,
        AddressField::Zip,
        AddressField::Country,
    ];

    /// Wire name of the field.
    pub fn key(self) -> &'static str {
        match self {
            AddressField::Address1 => "Address1",
            AddressField::Address2 => "Address2",
            AddressField::City => "City",
            AddressField::State => "State",
            AddressField::Zip => "ZIP",
            AddressField::Country => "Country",
        }
    }

    /// Value used when the field is absent or empty.
    pub fn default_value(self) -> &'static str {
        match self {
            AddressField::Country => DEFAULT_COUNTRY,
            _ => "",
        }
    }
}

/// A decomposed postal address.
///
/// All six fields are always present. Unknown parts are empty strings, never
/// missing, and `country` falls back to [`DEFAULT_COUNTRY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedAddress {
    /// Street number and name.
    #[serde(rename = "Address1")]
    pub address1: String,

    /// Secondary unit: apartment, suite, unit, building, floor, room.
    #[serde(rename = "Address2")]
    pub address2: String,

    #[serde(rename = "City")]
    pub city: String,

    /// Two-letter state code.
    #[serde(rename = "State")]
    pub state: String,

    /// Five-digit ZIP or ZIP+4.
    #[serde(rename = "ZIP")]
    pub zip: String,

    #[serde(rename = "Country")]
    pub country: String,
}

impl Default for ParsedAddress {
    fn default() -> Self {
        Self {
            address1: String::new(),
            address2: String::new(),
            city: String::new(),
            state: String::new(),
            zip: String::new(),
            country: DEFAULT_COUNTRY.to_string(),
        }
    }
}

impl ParsedAddress {
    pub fn get(&self, field: AddressField) -> &str {
        match field {
            AddressField::Address1 => &self.address1,
            AddressField::Address2 => &self.address2,
            AddressField::City => &self.city,
            AddressField::State => &self.state,
            AddressField::Zip => &self.zip,
            AddressField::Country => &self.country,
        }
    }

    pub fn set(&mut self, field: AddressField, value: impl Into<String>) {
        let value = value.into();
        match field {
            AddressField::Address1 => self.address1 = value,
            AddressField::Address2 => self.address2 = value,
            AddressField::City => self.city = value,
            AddressField::State => self.state = value,
            AddressField::Zip => self.zip = value,
            AddressField::Country => self.country = value,
        }
    }

    /// Iterate `(key, value)` pairs in canonical order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        AddressField::ALL.iter().map(move |f| (f.key(), self.get(*f)))
    }
}

/// Result of one parse call: the address plus which strategy produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOutcome {
    #[serde(flatten)]
    pub address: ParsedAddress,

    /// `true` when the model-assisted parser produced the address,
    /// `false` when the deterministic fallback did.
    #[serde(rename = "usedModel")]
    pub used_model: bool,
}

impl ParseOutcome {
    pub fn from_model(address: ParsedAddress) -> Self {
        Self {
            address,
            used_model: true,
        }
    }

    pub fn from_fallback(address: ParsedAddress) -> Self {
        Self {
            address,
            used_model: false,
        }
    }
}
