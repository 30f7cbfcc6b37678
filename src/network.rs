//! Network device configuration.
//!
//! The guest gets a single virtio network interface attached to the host
//! through NAT. Its hardware address comes from the defaults table.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 48-bit hardware address of a network interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Create an address from its six octets.
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Group (multicast/broadcast) bit is set.
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// Locally administered bit is set (not vendor assigned).
    pub fn is_locally_administered(&self) -> bool {
        self.0[0] & 0x02 != 0
    }

    /// Reject addresses that cannot be assigned to an interface.
    pub fn ensure_unicast(&self) -> Result<()> {
        if self.is_multicast() {
            return Err(Error::invalid_mac(
                self.to_string(),
                "multicast address cannot be assigned to an interface",
            ));
        }
        Ok(())
    }
}

impl FromStr for MacAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split([':', '-']).collect();
        if parts.len() != 6 {
            return Err(Error::invalid_mac(s, "expected six octets"));
        }

        let mut octets = [0u8; 6];
        for (octet, part) in octets.iter_mut().zip(&parts) {
            if part.len() != 2 {
                return Err(Error::invalid_mac(s, format!("bad octet '{}'", part)));
            }
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| Error::invalid_mac(s, format!("bad octet '{}'", part)))?;
        }

        Ok(Self(octets))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        )
    }
}

/// How the guest interface reaches the outside world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NetworkAttachment {
    /// Outbound access through the host's NAT.
    #[default]
    Nat,
}

/// Virtio network device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDevice {
    /// Hardware address presented to the guest.
    pub mac_address: MacAddress,
    /// Host-side attachment.
    pub attachment: NetworkAttachment,
}

/// Create the NAT-attached network device.
pub fn create_network_device(mac_address: MacAddress) -> NetworkDevice {
    NetworkDevice {
        mac_address,
        attachment: NetworkAttachment::Nat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAC_ADDRESS;

    #[test]
    fn test_parse_and_display() {
        let mac: MacAddress = "D6:A7:58:8E:78:D4".parse().unwrap();
        assert_eq!(mac, DEFAULT_MAC_ADDRESS);
        assert_eq!(mac.to_string(), "d6:a7:58:8e:78:d4");

        let dashed: MacAddress = "d6-a7-58-8e-78-d4".parse().unwrap();
        assert_eq!(dashed, mac);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let inputs = [
            "",
            "d6:a7:58:8e:78",
            "d6:a7:58:8e:78:d4:00",
            "d6:a7:58:8e:78:zz",
            "d:a7:58:8e:78:d4",
        ];
        for input in inputs {
            assert!(
                input.parse::<MacAddress>().is_err(),
                "{:?} should not parse",
                input
            );
        }
    }

    #[test]
    fn test_address_bits() {
        assert!(DEFAULT_MAC_ADDRESS.is_locally_administered());
        assert!(!DEFAULT_MAC_ADDRESS.is_multicast());
        assert!(DEFAULT_MAC_ADDRESS.ensure_unicast().is_ok());

        let multicast = MacAddress::new([0x01, 0x00, 0x5e, 0x00, 0x00, 0x01]);
        assert!(multicast.ensure_unicast().is_err());

        let vendor: MacAddress = "00:1c:42:00:00:08".parse().unwrap();
        assert!(!vendor.is_locally_administered());
        assert!(vendor.ensure_unicast().is_ok());
    }

    #[test]
    fn test_network_device_is_nat() {
        let device = create_network_device(DEFAULT_MAC_ADDRESS);
        assert_eq!(device.attachment, NetworkAttachment::Nat);
        assert_eq!(device.mac_address, DEFAULT_MAC_ADDRESS);
        // Repeated construction is structurally identical
        assert_eq!(device, create_network_device(DEFAULT_MAC_ADDRESS));
    }

    #[test]
    fn test_network_device_serialization() {
        let json = serde_json::to_string(&create_network_device(DEFAULT_MAC_ADDRESS)).unwrap();
        assert!(json.contains("d6:a7:58:8e:78:d4"));
        assert!(json.contains("nat"));
    }
}
