use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::address::{self, AddressError, SubnetView};

/// A row returned by `rest/ip_address_list`: one IP address object, usually a host.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HostRecord {
    #[serde(with = "primitive_as_string")]
    pub name: String,
    /// Hex-encoded address.
    #[serde(with = "primitive_as_string")]
    pub ip_addr: String,
    #[serde(with = "primitive_as_string")]
    pub ip_alias: String,
    #[serde(with = "primitive_as_string")]
    pub subnet_start_ip_addr: String,
    #[serde(with = "primitive_as_string")]
    pub subnet_end_ip_addr: String,
    /// URL-encoded class parameters, e.g. `hostname=web01&ucb_buildings=Main`.
    #[serde(with = "primitive_as_string")]
    pub ip_class_parameters: String,
}

impl HostRecord {
    pub fn from_json(row: &JsonValue) -> serde_json::Result<Self> {
        Self::deserialize(row)
    }

    pub fn class_parameters(&self) -> BTreeMap<String, Vec<String>> {
        address::parse_query_string(&self.ip_class_parameters)
    }

    pub fn subnet_view(&self) -> Result<SubnetView, AddressError> {
        SubnetView::derive(&self.ip_addr, &self.subnet_start_ip_addr, &self.subnet_end_ip_addr)
    }
}

/// A row returned by `rest/ip_block_subnet_list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubnetRecord {
    #[serde(with = "primitive_as_string")]
    pub subnet_id: String,
    #[serde(with = "primitive_as_string")]
    pub subnet_name: String,
    #[serde(with = "primitive_as_string")]
    pub start_ip_addr: String,
    #[serde(with = "primitive_as_string")]
    pub end_ip_addr: String,
    #[serde(with = "primitive_as_string")]
    pub site_name: String,
}

impl SubnetRecord {
    pub fn from_json(row: &JsonValue) -> serde_json::Result<Self> {
        Self::deserialize(row)
    }
}

/// A row returned by `rpc/ip_find_free_address`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FreeAddress {
    /// Dotted quad.
    #[serde(with = "primitive_as_string")]
    pub hostaddr: String,
}

impl FreeAddress {
    pub fn from_json(row: &JsonValue) -> serde_json::Result<Self> {
        Self::deserialize(row)
    }
}

/// Pulls a string-ish identifier field (like `ip_id` or `subnet_id`) out of a raw result row.
///
/// The API is inconsistent about whether ids are numbers or strings, so both are accepted.
pub fn id_field<'a>(row: &'a JsonValue, key: &str) -> Option<std::borrow::Cow<'a, str>> {
    match row.get(key)? {
        JsonValue::String(s) if !s.is_empty() => Some(s.as_str().into()),
        JsonValue::Number(n) => Some(n.to_string().into()),
        _ => None,
    }
}

/// A `serde(with)` module that supports deserializing any primitive type into a string. Nulls become empty strings.
mod primitive_as_string {
    use serde::{Deserializer, de};

    #[derive(Debug)]
    struct Visitor;

    #[rustfmt::skip]
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = String;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a primitive value, a string, or null")
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> { Ok(v) }
        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> { Ok(v.to_string()) }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> { Ok(v.to_string()) }
        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> { Ok(v.to_string()) }
        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> { Ok(v.to_string()) }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> { Ok(v.to_string()) }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> { Ok(String::new()) }
        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> { Ok(String::new()) }
    }

    pub fn deserialize<'de, D>(d: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        d.deserialize_any(Visitor)
    }
}
