use super::Validator;
use std::{
	fmt::Display,
	net::{AddrParseError, IpAddr},
};
use thiserror::Error;

/// Longest domain RFC 5321 section 4.5.3.1.2 allows, in octets.
pub const MAX_DOMAIN_LENGTH: usize = 255;

/// A Domain as defined by RFC. This can either be a fully-qualified domain name or an IP literal.
#[derive(Clone, Hash, PartialEq, Eq, Debug)]
pub enum Domain {
	Fqdn(String),
	Literal(IpAddr),
}

impl Display for Domain {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Fqdn(domain) => write!(f, "{}", domain),
			Self::Literal(IpAddr::V4(ip)) => write!(f, "[{}]", ip),
			Self::Literal(IpAddr::V6(ip)) => write!(f, "[IPv6:{}]", ip),
		}
	}
}

impl std::str::FromStr for Domain {
	type Err = ParseDomainError;

	/// Parses a correctly formed Domain into this struct
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			Err(ParseDomainError::Empty)
		} else if s.len() > MAX_DOMAIN_LENGTH {
			Err(ParseDomainError::TooLong {
				max: MAX_DOMAIN_LENGTH,
			})
		} else if Validator::validate_domain(s) {
			Ok(Self::Fqdn(s.into()))
		} else if let Some(stripped) = s.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
			let ip = if let Some(ipv6_literal) = stripped.strip_prefix("IPv6:") {
				// Only parse ipv6 if it claims to be one
				IpAddr::V6(ipv6_literal.parse()?)
			} else {
				IpAddr::V4(stripped.parse()?)
			};
			Ok(Self::Literal(ip))
		} else {
			Err(ParseDomainError::InvalidDomain)
		}
	}
}

#[derive(Error, Debug)]
pub enum ParseDomainError {
	#[error("failed to parse address")]
	AddrParseError(#[from] AddrParseError),
	#[error("no domain given")]
	Empty,
	#[error("domain longer than {max} octets")]
	TooLong { max: usize },
	#[error("invalid domain or address")]
	InvalidDomain,
}

#[cfg(test)]
mod test {
	use std::str::FromStr;

	use super::*;

	fn valid_address_literals() -> Vec<String> {
		vec![
			String::from("[10.0.0.0]"),
			String::from("[192.168.1.1]"),
			String::from("[IPv6:a0:40:29:bf:de:28:8c:ea]"), //full
			String::from("[IPv6:a0:40::de:28:8c:ea]"),      //compressed
		]
	}

	fn invalid_address_literals() -> Vec<String> {
		vec![
			String::from("[10.0.0.0"),                 // unclosed brackets
			String::from("10.0.0.1]"),                 // unopened
			String::from("[192.168.1.256]"),           // invalid IPv4
			String::from("[a0:40:29:bf:de:28:8c:ea]"), //no IPv6 tag
			String::from("[IPv6:192.168.1.1]"),        //IPv6 but it's v4
			String::from("[IPv6:a0:40:::de:28:8c:ea]"), //compressed, but too many colons
		]
	}

	#[test]
	fn domain_pass() {
		for domain in ["example.com", "mx1.example.com", "localhost"] {
			assert_eq!(
				Domain::from_str(domain).unwrap(),
				Domain::Fqdn(domain.to_string())
			)
		}

		for domain in valid_address_literals() {
			assert!(Domain::from_str(&domain).is_ok(), "failed on {}", domain)
		}
	}

	#[test]
	fn domain_fail() {
		for domain in invalid_address_literals() {
			assert!(Domain::from_str(&domain).is_err(), "passed on {}", domain)
		}
	}

	#[test]
	fn domain_empty_and_long() {
		assert!(matches!(Domain::from_str(""), Err(ParseDomainError::Empty)));

		let long = vec!["a"; 129].join(".");
		assert!(long.len() > MAX_DOMAIN_LENGTH);
		assert!(matches!(
			Domain::from_str(&long),
			Err(ParseDomainError::TooLong { .. })
		));
	}

	#[test]
	fn literal_display_roundtrips() {
		let v4: Domain = "[192.168.1.1]".parse().unwrap();
		assert_eq!(v4.to_string(), "[192.168.1.1]");

		let v6: Domain = "[IPv6:a0:40::de:28:8c:ea]".parse().unwrap();
		assert_eq!(v6.to_string(), "[IPv6:a0:40::de:28:8c:ea]");
	}
}
