//! Remote memory address wrapper with hex parsing and plausibility checks

use super::error::DumpError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

/// Lowest address the default configuration treats as a plausible remote
/// pointer. Anything below this is garbage left in a metadata slot.
pub const DEFAULT_ADDRESS_FLOOR: u64 = 0x1000_0000;

/// A 64-bit address inside the inspected process.
///
/// Carries no validity guarantee; every dereference goes through the
/// [`RemoteReader`](crate::memory::RemoteReader) which is allowed to fail.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Address(pub u64);

impl Address {
    /// Creates a new address from a raw value
    pub const fn new(value: u64) -> Self {
        Address(value)
    }

    /// Creates a null address (0x0)
    pub const fn null() -> Self {
        Address(0)
    }

    /// Checks if the address is null
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Checks the address against a plausibility floor.
    ///
    /// Remote metadata regularly contains small integers where a pointer is
    /// expected; treating them as addresses would touch unrelated memory.
    pub const fn is_plausible(&self, floor: u64) -> bool {
        self.0 >= floor
    }

    /// Adds a byte offset to the address
    pub const fn offset(&self, offset: i64) -> Self {
        Address((self.0 as i64).wrapping_add(offset) as u64)
    }

    /// Returns the raw value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl FromStr for Address {
    type Err = DumpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            u64::from_str_radix(hex, 16)
        } else if s.chars().any(|c| c.is_ascii_alphabetic()) {
            // Assume hex if it contains letters
            u64::from_str_radix(s, 16)
        } else {
            s.parse::<u64>().or_else(|_| u64::from_str_radix(s, 16))
        };

        value
            .map(Address::new)
            .map_err(|_| DumpError::InvalidAddress(s.to_string()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address::new(value)
    }
}

impl Add<u64> for Address {
    type Output = Address;

    fn add(self, rhs: u64) -> Address {
        Address(self.0.wrapping_add(rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parsing() {
        assert_eq!(Address::from_str("0x1000").unwrap(), Address::new(0x1000));
        assert_eq!(Address::from_str("0X1000").unwrap(), Address::new(0x1000));
        assert_eq!(
            Address::from_str("DEADBEEF").unwrap(),
            Address::new(0xDEAD_BEEF)
        );
        assert_eq!(Address::from_str("4096").unwrap(), Address::new(4096));
        assert!(Address::from_str("not an address!").is_err());
    }

    #[test]
    fn test_plausibility_floor() {
        assert!(!Address::new(0x1000).is_plausible(DEFAULT_ADDRESS_FLOOR));
        assert!(!Address::new(0x0FFF_FFFF).is_plausible(DEFAULT_ADDRESS_FLOOR));
        assert!(Address::new(0x1000_0000).is_plausible(DEFAULT_ADDRESS_FLOOR));
        assert!(Address::new(0x7FF6_1234_0000).is_plausible(DEFAULT_ADDRESS_FLOOR));
    }

    #[test]
    fn test_address_offset() {
        let addr = Address::new(0x1000);
        assert_eq!(addr.offset(0x10), Address::new(0x1010));
        assert_eq!(addr.offset(-0x10), Address::new(0x0FF0));
        assert_eq!(addr + 8, Address::new(0x1008));
    }

    #[test]
    fn test_default_is_null() {
        assert_eq!(Address::default(), Address::null());
        assert!(Address::default().is_null());
    }

    #[test]
    fn test_address_display() {
        let addr = Address::new(0xDEAD_BEEF);
        assert_eq!(format!("{}", addr), "0x00000000DEADBEEF");
        assert_eq!(format!("{:x}", addr), "0x00000000deadbeef");
    }

    proptest::proptest! {
        #[test]
        fn prop_hex_parse_round_trips(value: u64) {
            let parsed = Address::from_str(&format!("0x{:X}", value)).unwrap();
            proptest::prop_assert_eq!(parsed, Address::new(value));
        }

        #[test]
        fn prop_offset_then_negate_is_identity(value: u64, delta in 0i64..=i64::MAX) {
            let addr = Address::new(value);
            proptest::prop_assert_eq!(addr.offset(delta).offset(-delta), addr);
        }
    }
}
