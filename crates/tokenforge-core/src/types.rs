//! Core type definitions for TokenForge
//!
//! Principals identify accounts, roles name the privileged capabilities a
//! principal can hold, and amounts are integers in the token's base unit.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Amount in base units (18 fractional digits for the default token)
pub type Amount = u128;

/// Length of a principal address in bytes
pub const PRINCIPAL_LENGTH: usize = 20;

/// Principal - opaque account identifier
///
/// Rendered as a `0x`-prefixed lowercase hex address. The all-zero address is
/// the null principal: it never holds a balance and never receives tokens.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Principal {
    address: [u8; PRINCIPAL_LENGTH],
}

impl Principal {
    /// The null principal
    pub const ZERO: Self = Self {
        address: [0u8; PRINCIPAL_LENGTH],
    };

    pub fn new(address: [u8; PRINCIPAL_LENGTH]) -> Self {
        Self { address }
    }

    /// Derive a principal from a public key (first 20 bytes of its BLAKE3 hash)
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let hash = blake3::hash(public_key);
        let mut address = [0u8; PRINCIPAL_LENGTH];
        address.copy_from_slice(&hash.as_bytes()[..PRINCIPAL_LENGTH]);
        Self { address }
    }

    /// Parse from hex, with or without the `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self, PrincipalParseError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes =
            hex::decode(digits).map_err(|e| PrincipalParseError::InvalidHex(e.to_string()))?;
        if bytes.len() != PRINCIPAL_LENGTH {
            return Err(PrincipalParseError::InvalidLength(bytes.len()));
        }
        let mut address = [0u8; PRINCIPAL_LENGTH];
        address.copy_from_slice(&bytes);
        Ok(Self { address })
    }

    pub fn as_bytes(&self) -> &[u8; PRINCIPAL_LENGTH] {
        &self.address
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.address))
    }

    /// True for the null principal
    pub fn is_zero(&self) -> bool {
        self.address == [0u8; PRINCIPAL_LENGTH]
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Principal {
    type Err = PrincipalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Error parsing a principal from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrincipalParseError {
    #[error("invalid hex address: {0}")]
    InvalidHex(String),

    #[error("address must be 20 bytes, got {0}")]
    InvalidLength(usize),
}

/// Role - a named capability grantable to principals
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Administers every role, including itself
    Admin,
    /// May mint new supply up to the ceiling
    Minter,
    /// May burn tokens from any account
    Burner,
    /// May toggle the pause gate
    Pauser,
}

impl Role {
    /// All roles, in the order they are granted at deployment
    pub const ALL: [Role; 4] = [Role::Admin, Role::Pauser, Role::Minter, Role::Burner];

    /// Canonical role name
    pub fn name(&self) -> &'static str {
        match self {
            Role::Admin => "DEFAULT_ADMIN_ROLE",
            Role::Minter => "MINTER_ROLE",
            Role::Burner => "BURNER_ROLE",
            Role::Pauser => "PAUSER_ROLE",
        }
    }

    /// Stable 32-byte role identifier
    ///
    /// The admin role is all-zero; every other role is the BLAKE3 hash of its
    /// canonical name.
    pub fn id(&self) -> [u8; 32] {
        match self {
            Role::Admin => [0u8; 32],
            other => *blake3::hash(other.name().as_bytes()).as_bytes(),
        }
    }

    /// Look a role up by its identifier
    pub fn from_id(id: &[u8; 32]) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.id() == *id)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" | "DEFAULT_ADMIN_ROLE" => Ok(Role::Admin),
            "MINTER" | "MINTER_ROLE" => Ok(Role::Minter),
            "BURNER" | "BURNER_ROLE" => Ok(Role::Burner),
            "PAUSER" | "PAUSER_ROLE" => Ok(Role::Pauser),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}
