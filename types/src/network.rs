//! Logical chain identifier.
//!
//! Blocks from different networks are never comparable; every block carries
//! its network and stores reject blocks from a foreign one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies which weft network a validator participates in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    /// The production network.
    Main,
    /// The public test network.
    Test,
    /// Local development network.
    Local,
}

impl Network {
    /// Single-byte discriminant mixed into content-derived identifiers.
    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Main => 0x00,
            Self::Test => 0x01,
            Self::Local => 0x02,
        }
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Test => "test",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
