//! Network validators: `url`, `ipv4`, `ipv6`, `ip`.

use std::net::Ipv6Addr;

use confval_core::{BoxError, ValidationError, Value};
use serde::Deserialize;

use crate::validator::{from_params, InitContext, Params, Plugin, Validator};

// ─── url ─────────────────────────────────────────────────────────────

/// Well-known ports by scheme. Schemes listed without a port have none.
const SCHEME_PORTS: &[(&str, Option<u16>)] = &[
    ("file", None),
    ("ftp", Some(21)),
    ("gopher", Some(70)),
    ("hdl", None),
    ("http", Some(80)),
    ("https", Some(443)),
    ("imap", Some(143)),
    ("mailto", None),
    ("mms", Some(654)),
    ("news", None),
    ("nntp", Some(119)),
    ("prospero", None),
    ("rsync", Some(873)),
    ("rtsp", Some(554)),
    ("rtspu", None),
    ("sftp", Some(22)),
    ("shttp", Some(80)),
    ("sip", Some(5060)),
    ("sips", Some(5061)),
    ("snews", None),
    ("svn", Some(3690)),
    ("svn+ssh", Some(22)),
    ("telnet", Some(23)),
    ("wais", None),
];

fn default_port(scheme: &str) -> Option<u16> {
    SCHEME_PORTS
        .iter()
        .find(|(name, _)| *name == scheme)
        .and_then(|(_, port)| *port)
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UrlConfig {
    #[serde(default)]
    scheme: Option<Vec<String>>,
    #[serde(default)]
    hostname: Option<Vec<String>>,
    #[serde(default)]
    port: Option<Vec<u16>>,
    #[serde(default)]
    add_default_port: bool,
}

/// `url`: an absolute URL, optionally restricted by scheme, host and port.
///
/// With `add_default_port`, the scheme's well-known port is allowed in
/// addition to `port`. A URL without an explicit port is checked with its
/// scheme's well-known port.
#[derive(Debug)]
pub struct Url {
    schemes: Option<Vec<String>>,
    hostnames: Option<Vec<String>>,
    ports: Option<Vec<u16>>,
    add_default_port: bool,
}

fn lowercase_all(items: Option<Vec<String>>) -> Option<Vec<String>> {
    items.map(|items| items.iter().map(|item| item.to_lowercase()).collect())
}

impl Plugin for Url {
    const NAME: &'static str = "url";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let config: UrlConfig = from_params(params)?;
        Ok(Url {
            schemes: lowercase_all(config.scheme),
            hostnames: lowercase_all(config.hostname),
            ports: config.port,
            add_default_port: config.add_default_port,
        })
    }
}

impl Validator for Url {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        let url = url::Url::parse(raw.trim())
            .map_err(|err| ValidationError::caused_by("invalid url", err))?;
        let scheme = url.scheme();
        let known_port = default_port(scheme);

        let mut messages = Vec::new();
        if let Some(hostnames) = &self.hostnames {
            let host = url.host_str().unwrap_or_default().to_lowercase();
            if !hostnames.contains(&host) {
                messages.push("host not allowed".to_string());
            }
        }
        if let Some(schemes) = &self.schemes {
            if !schemes.iter().any(|s| s == scheme) {
                messages.push("scheme not allowed".to_string());
            }
        }

        let mut allowed_ports = self.ports.clone();
        if self.add_default_port {
            if let Some(port) = known_port {
                allowed_ports.get_or_insert_with(Vec::new).push(port);
            }
        }
        if let Some(allowed) = allowed_ports {
            let port = url.port().or(known_port);
            if !port.is_some_and(|port| allowed.contains(&port)) {
                messages.push("port not allowed".to_string());
            }
        }

        if messages.is_empty() {
            Ok(Value::from(raw))
        } else {
            Err(ValidationError::from_messages(messages))
        }
    }
}

// ─── address ranges ──────────────────────────────────────────────────

/// A network prefix over addresses of `width` bits.
#[derive(Debug, Clone, Copy)]
struct Cidr {
    network: u128,
    prefix: u32,
    width: u32,
}

impl Cidr {
    fn contains(&self, address: u128) -> bool {
        self.prefix == 0 || (address ^ self.network) >> (self.width - self.prefix) == 0
    }

    /// Parse `IP/N` or `/N` (network defaults to all-zero).
    fn parse(
        text: &str,
        width: u32,
        parse_address: impl Fn(&str) -> Result<u128, ValidationError>,
    ) -> Result<Self, BoxError> {
        let (address, prefix) = text
            .split_once('/')
            .ok_or("cidr format error | IP/CIDR or /CIDR")?;
        let network = if address.is_empty() {
            0
        } else {
            parse_address(address).map_err(|err| err.to_string())?
        };
        let prefix: u32 = prefix
            .trim()
            .parse()
            .ok()
            .filter(|prefix| *prefix <= width)
            .ok_or_else(|| format!("subnet mask must be in [0-{width}]"))?;
        Ok(Cidr {
            network,
            prefix,
            width,
        })
    }
}

/// Shared range checks of the address validators.
#[derive(Debug)]
struct AddressRules {
    network: Cidr,
    private: Option<Vec<Cidr>>,
}

impl AddressRules {
    fn check(&self, address: u128) -> Result<(), ValidationError> {
        if !self.network.contains(address) {
            return Err(ValidationError::new("IP outside of subnet mask"));
        }
        if let Some(private) = &self.private {
            if !private.iter().any(|range| range.contains(address)) {
                return Err(ValidationError::new("IP is not in a private network"));
            }
        }
        Ok(())
    }
}

// ─── ipv4 ────────────────────────────────────────────────────────────

/// Dotted quad with decimal octets and no leading zeros.
fn parse_ipv4(text: &str) -> Result<u128, ValidationError> {
    let octets: Vec<&str> = text.split('.').collect();
    if octets.len() != 4 {
        return Err(ValidationError::new(
            "IP format: [0-255].[0-255].[0-255].[0-255]",
        ));
    }
    let mut address: u128 = 0;
    for octet in octets {
        let value = octet
            .parse::<u8>()
            .ok()
            .filter(|value| value.to_string() == octet)
            .ok_or_else(|| {
                ValidationError::new("invalid ipv4 format: [0-255] | no leading zeros")
            })?;
        address = (address << 8) | u128::from(value);
    }
    Ok(address)
}

const IPV4_PRIVATE: [(u128, u32); 3] = [
    (0x0A00_0000, 8),  // 10.0.0.0/8
    (0xAC10_0000, 12), // 172.16.0.0/12
    (0xC0A8_0000, 16), // 192.168.0.0/16
];

fn private_ranges(ranges: &[(u128, u32)], width: u32) -> Vec<Cidr> {
    ranges
        .iter()
        .map(|&(network, prefix)| Cidr {
            network,
            prefix,
            width,
        })
        .collect()
}

fn default_ipv4_cidr() -> String {
    "0.0.0.0/0".to_string()
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Ipv4Config {
    #[serde(default)]
    private: bool,
    #[serde(default = "default_ipv4_cidr")]
    cidr: String,
}

/// `ipv4`: a dotted-quad address, optionally inside `cidr` and/or a
/// private range (10/8, 172.16/12, 192.168/16).
#[derive(Debug)]
pub struct Ipv4 {
    rules: AddressRules,
}

impl Ipv4 {
    fn new(private: bool, cidr: &str) -> Result<Self, BoxError> {
        Ok(Ipv4 {
            rules: AddressRules {
                network: Cidr::parse(cidr, 32, parse_ipv4)?,
                private: private.then(|| private_ranges(&IPV4_PRIVATE, 32)),
            },
        })
    }
}

impl Plugin for Ipv4 {
    const NAME: &'static str = "ipv4";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let config: Ipv4Config = from_params(params)?;
        Ipv4::new(config.private, &config.cidr)
    }
}

impl Validator for Ipv4 {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        self.rules.check(parse_ipv4(raw)?)?;
        Ok(Value::from(raw))
    }
}

// ─── ipv6 ────────────────────────────────────────────────────────────

fn parse_ipv6(text: &str) -> Result<u128, ValidationError> {
    text.parse::<Ipv6Addr>()
        .map(u128::from)
        .map_err(|err| ValidationError::caused_by("invalid ipv6 format", err))
}

const IPV6_PRIVATE: [(u128, u32); 3] = [
    (0xfc00 << 112, 7),  // fc00::/7
    (1, 128),            // ::1/128
    (0xfe80 << 112, 10), // fe80::/10
];

fn default_ipv6_cidr() -> String {
    "::/0".to_string()
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Ipv6Config {
    #[serde(default)]
    private: bool,
    #[serde(default = "default_ipv6_cidr")]
    cidr: String,
    #[serde(default)]
    host_subnet_mask: bool,
}

/// `ipv6`: an IPv6 address, optionally inside `cidr` and/or a private
/// range (fc00::/7, ::1, fe80::/10). With `host_subnet_mask` a trailing
/// `/128` is accepted.
#[derive(Debug)]
pub struct Ipv6 {
    rules: AddressRules,
    host_subnet_mask: bool,
}

impl Ipv6 {
    fn new(private: bool, cidr: &str, host_subnet_mask: bool) -> Result<Self, BoxError> {
        Ok(Ipv6 {
            rules: AddressRules {
                network: Cidr::parse(cidr, 128, parse_ipv6)?,
                private: private.then(|| private_ranges(&IPV6_PRIVATE, 128)),
            },
            host_subnet_mask,
        })
    }
}

impl Plugin for Ipv6 {
    const NAME: &'static str = "ipv6";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let config: Ipv6Config = from_params(params)?;
        Ipv6::new(config.private, &config.cidr, config.host_subnet_mask)
    }
}

impl Validator for Ipv6 {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        let address = match raw.split_once('/') {
            None => raw,
            Some((address, "128")) if self.host_subnet_mask => address,
            Some(_) if self.host_subnet_mask => {
                return Err(ValidationError::new(
                    "if subnet mask is given it must be 128!",
                ))
            }
            Some(_) => {
                return Err(ValidationError::new(
                    "error: host subnet mask not allowed",
                ))
            }
        };
        self.rules.check(parse_ipv6(address)?)?;
        Ok(Value::from(raw))
    }
}

// ─── ip ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct IpConfig {
    #[serde(default)]
    private: bool,
    #[serde(default = "default_ipv4_cidr")]
    ipv4_cidr: String,
    #[serde(default = "default_ipv6_cidr")]
    ipv6_cidr: String,
    #[serde(default)]
    host_subnet_mask: bool,
}

/// `ip`: either an `ipv4` or an `ipv6` address. A rejected value reports
/// the messages of both.
#[derive(Debug)]
pub struct Ip {
    v4: Ipv4,
    v6: Ipv6,
}

impl Plugin for Ip {
    const NAME: &'static str = "ip";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let config: IpConfig = from_params(params)?;
        Ok(Ip {
            v4: Ipv4::new(config.private, &config.ipv4_cidr)?,
            v6: Ipv6::new(config.private, &config.ipv6_cidr, config.host_subnet_mask)?,
        })
    }
}

impl Validator for Ip {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        let mut v4_error = match self.v4.validate(raw) {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        match self.v6.validate(raw) {
            Ok(value) => Ok(value),
            Err(err) => {
                v4_error.merge(err);
                Err(v4_error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::validators::testing::{plain, rejected, run};
    use serde_json::json;

    #[test]
    fn test_url_any() {
        assert!(plain("url", "https://example.org/path?q=1").is_ok());
        assert_eq!(rejected("url", json!({}), "not a url"), ["invalid url"]);
    }

    #[test]
    fn test_url_scheme_and_host() {
        let params = json!({"scheme": ["HTTPS"], "hostname": ["example.org"]});
        assert!(run("url", params.clone(), "https://Example.org/").is_ok());
        assert_eq!(
            rejected("url", params, "http://other.org/"),
            ["host not allowed", "scheme not allowed"]
        );
    }

    #[test]
    fn test_url_ports() {
        let params = json!({"port": [8443]});
        assert!(run("url", params.clone(), "https://example.org:8443/").is_ok());
        assert_eq!(
            rejected("url", params.clone(), "https://example.org/"),
            ["port not allowed"]
        );
        let params = json!({"port": [8443], "add_default_port": true});
        assert!(run("url", params.clone(), "https://example.org/").is_ok());
        assert!(run("url", params, "https://example.org:443/").is_ok());
        let params = json!({"add_default_port": true});
        assert!(run("url", params.clone(), "ftp://example.org/").is_ok());
        assert_eq!(
            rejected("url", params, "ftp://example.org:2121/"),
            ["port not allowed"]
        );
    }

    #[test]
    fn test_ipv4_format() {
        assert_eq!(plain("ipv4", "192.168.1.10").unwrap(), "192.168.1.10");
        assert_eq!(
            rejected("ipv4", json!({}), "1.2.3"),
            ["IP format: [0-255].[0-255].[0-255].[0-255]"]
        );
        for bad in ["1.2.3.256", "01.2.3.4", "1.2.3.x", "1.2.3.+4"] {
            assert_eq!(
                rejected("ipv4", json!({}), bad),
                ["invalid ipv4 format: [0-255] | no leading zeros"],
                "{bad}"
            );
        }
    }

    #[test]
    fn test_ipv4_ranges() {
        let subnet = json!({"cidr": "10.1.0.0/16"});
        assert!(run("ipv4", subnet.clone(), "10.1.200.3").is_ok());
        assert_eq!(
            rejected("ipv4", subnet, "10.2.0.1"),
            ["IP outside of subnet mask"]
        );
        let private = json!({"private": true});
        assert!(run("ipv4", private.clone(), "172.20.0.1").is_ok());
        assert_eq!(
            rejected("ipv4", private, "8.8.8.8"),
            ["IP is not in a private network"]
        );
        assert!(run("ipv4", json!({"cidr": "/8"}), "0.1.2.3").is_ok());
        assert!(run("ipv4", json!({"cidr": "10.0.0.0"}), "10.0.0.1").is_err());
        assert!(run("ipv4", json!({"cidr": "10.0.0.0/33"}), "10.0.0.1").is_err());
    }

    #[test]
    fn test_ipv6() {
        assert!(plain("ipv6", "2001:db8::1").is_ok());
        assert!(plain("ipv6", "::ffff:192.0.2.1").is_ok());
        assert_eq!(rejected("ipv6", json!({}), "2001:db8::1::2"), ["invalid ipv6 format"]);
        assert_eq!(
            rejected("ipv6", json!({}), "2001:db8::1/128"),
            ["error: host subnet mask not allowed"]
        );
        let host = json!({"host_subnet_mask": true});
        assert!(run("ipv6", host.clone(), "2001:db8::1/128").is_ok());
        assert_eq!(
            rejected("ipv6", host, "2001:db8::1/64"),
            ["if subnet mask is given it must be 128!"]
        );
    }

    #[test]
    fn test_ipv6_ranges() {
        let private = json!({"private": true});
        assert!(run("ipv6", private.clone(), "fd12:3456::1").is_ok());
        assert!(run("ipv6", private.clone(), "::1").is_ok());
        assert!(run("ipv6", private.clone(), "fe80::1").is_ok());
        assert_eq!(
            rejected("ipv6", private, "2001:db8::1"),
            ["IP is not in a private network"]
        );
        let subnet = json!({"cidr": "2001:db8::/32"});
        assert!(run("ipv6", subnet.clone(), "2001:db8:ffff::1").is_ok());
        assert_eq!(
            rejected("ipv6", subnet, "2001:db9::1"),
            ["IP outside of subnet mask"]
        );
    }

    #[test]
    fn test_ip_either_family() {
        assert!(plain("ip", "10.0.0.1").is_ok());
        assert!(plain("ip", "::1").is_ok());
        assert_eq!(
            rejected("ip", json!({}), "nope"),
            [
                "IP format: [0-255].[0-255].[0-255].[0-255]",
                "invalid ipv6 format"
            ]
        );
        let private = json!({"private": true});
        assert!(run("ip", private.clone(), "192.168.0.1").is_ok());
        assert!(run("ip", private, "1.1.1.1").is_err());
    }
}
