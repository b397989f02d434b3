//! Conversions between the different ways the DDI API represents IPv4 addresses and subnets.
//!
//! The API stores addresses as 8-digit hex strings (`7f000001`), while humans type and read dotted quads
//! (`127.0.0.1`). Subnets come back as a start/end pair which gets turned into CIDR notation for display.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::net::Ipv4Addr;

use ipnet::{Ipv4Net, Ipv4Subnets};

/// Everything that can go wrong while converting addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The user gave something that isn't a dotted-quad IPv4 address.
    InvalidDottedQuad(String),
    /// The API gave something that isn't an 8-digit hex address.
    InvalidHex(String),
    /// A subnet's start address is after its end address.
    InvertedRange { start: Ipv4Addr, end: Ipv4Addr },
}

impl Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDottedQuad(s) => write!(f, "'{s}' is not a valid IPv4 address"),
            Self::InvalidHex(s) => write!(f, "'{s}' is not a valid hex-encoded IPv4 address"),
            Self::InvertedRange { start, end } => write!(f, "subnet start {start} is after subnet end {end}"),
        }
    }
}

impl std::error::Error for AddressError {}

/// Parses a dotted-quad IPv4 address given on the command line.
pub fn parse_dotted_quad(text: &str) -> Result<Ipv4Addr, AddressError> {
    text.trim()
        .parse::<Ipv4Addr>()
        .map_err(|_| AddressError::InvalidDottedQuad(text.to_string()))
}

/// Converts an address into the lowercase hex form the API uses in `WHERE` clauses.
pub fn hexlify(addr: Ipv4Addr) -> String {
    format!("{:08x}", u32::from(addr))
}

/// Converts the API's hex form back into an address.
pub fn unhexlify(hex: &str) -> Result<Ipv4Addr, AddressError> {
    let hex = hex.trim();
    if hex.len() != 8 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AddressError::InvalidHex(hex.to_string()));
    }

    u32::from_str_radix(hex, 16)
        .map(Ipv4Addr::from)
        .map_err(|_| AddressError::InvalidHex(hex.to_string()))
}

/// Finds the first (lowest) CIDR block covering the range `start..=end`.
///
/// DDI subnets are almost always aligned, in which case this is the exact subnet. For unaligned ranges only the
/// leading block is returned.
pub fn range_to_cidr(start: Ipv4Addr, end: Ipv4Addr) -> Result<Ipv4Net, AddressError> {
    if start > end {
        return Err(AddressError::InvertedRange { start, end });
    }

    // `Ipv4Subnets` always yields at least one network for a non-empty range.
    Ipv4Subnets::new(start, end, 0)
        .next()
        .ok_or(AddressError::InvertedRange { start, end })
}

/// Display-ready view of where an address sits, derived from the API's raw hex fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetView {
    pub ip_addr: Ipv4Addr,
    /// Empty for external hosts, which don't belong to a managed subnet.
    pub start: Option<Ipv4Addr>,
    pub end: Option<Ipv4Addr>,
    pub cidr: Ipv4Net,
    pub netmask: Ipv4Addr,
}

impl SubnetView {
    /// Builds the view from an address row's `ip_addr`, `subnet_start_ip_addr`, and `subnet_end_ip_addr`.
    ///
    /// The API reports a bound of `"0"` for hosts outside any managed subnet; those get a `/32` of their own.
    pub fn derive(ip_hex: &str, start_hex: &str, end_hex: &str) -> Result<Self, AddressError> {
        let ip_addr = unhexlify(ip_hex)?;

        if start_hex.trim() == "0" || end_hex.trim() == "0" {
            let cidr = Ipv4Net::new(ip_addr, 32).map_err(|_| AddressError::InvalidHex(ip_hex.to_string()))?;
            return Ok(Self {
                ip_addr,
                start: None,
                end: None,
                cidr,
                netmask: Ipv4Addr::BROADCAST,
            });
        }

        let start = unhexlify(start_hex)?;
        let end = unhexlify(end_hex)?;
        let cidr = range_to_cidr(start, end)?;

        Ok(Self {
            ip_addr,
            start: Some(start),
            end: Some(end),
            netmask: cidr.netmask(),
            cidr,
        })
    }
}

/// Decodes an `application/x-www-form-urlencoded` string into a multimap.
///
/// Keys with blank values are left out, and repeated keys collect every value in order.
pub fn parse_query_string(text: &str) -> BTreeMap<String, Vec<String>> {
    let mut map = BTreeMap::<String, Vec<String>>::new();
    for (key, value) in url::form_urlencoded::parse(text.as_bytes()) {
        if value.is_empty() {
            continue;
        }
        map.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    map
}

/// Encodes key/value pairs the same way [`parse_query_string`] decodes them.
pub fn encode_query_string<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    url::form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish()
}
