use std::fmt::{Display, Formatter};
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use permbit_core::{AppError, AppResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Arbitrary-precision permission bitfield.
///
/// A single permission owns exactly one bit. Aggregates (role grants, effective
/// person permissions) are the union of those bits. Values cross process
/// boundaries as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PermissionBitfield(BigUint);

impl PermissionBitfield {
    /// The empty bitfield.
    #[must_use]
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    /// Bitfield assigned to the first permission ever registered.
    #[must_use]
    pub fn first() -> Self {
        Self(BigUint::one())
    }

    /// Single-bit value at the given zero-based position.
    #[must_use]
    pub fn from_bit_position(position: u64) -> Self {
        Self(BigUint::one() << position)
    }

    /// Returns the bitfield the next new permission receives, given the
    /// highest bitfield ever assigned.
    #[must_use]
    pub fn next_after(highest: Option<&Self>) -> Self {
        match highest {
            Some(highest) if !highest.is_zero() => highest.doubled(),
            _ => Self::first(),
        }
    }

    /// Returns this value shifted one bit to the left.
    #[must_use]
    pub fn doubled(&self) -> Self {
        Self(&self.0 << 1_u32)
    }

    /// Returns true when no bit is set.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true when exactly one bit is set.
    #[must_use]
    pub fn is_single_bit(&self) -> bool {
        self.0.count_ones() == 1
    }

    /// Zero-based index of the bit, for single-bit values.
    #[must_use]
    pub fn bit_position(&self) -> Option<u64> {
        if self.is_single_bit() {
            self.0.trailing_zeros()
        } else {
            None
        }
    }

    /// Returns true when every bit of `required` is set in `self`.
    ///
    /// A zero requirement never matches since every registered permission owns
    /// exactly one bit.
    #[must_use]
    pub fn contains(&self, required: &Self) -> bool {
        if required.is_zero() {
            return false;
        }

        (&self.0 & &required.0) == required.0
    }

    /// Adds every bit of `other` into `self`.
    pub fn insert(&mut self, other: &Self) {
        self.0 |= &other.0;
    }

    /// Returns the union of all provided bitfields.
    #[must_use]
    pub fn union_of<'a>(values: impl IntoIterator<Item = &'a Self>) -> Self {
        let mut aggregate = Self::zero();
        for value in values {
            aggregate.insert(value);
        }
        aggregate
    }

    /// Parses a decimal string.
    pub fn from_decimal(value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "permission bitfield must not be empty".to_owned(),
            ));
        }

        trimmed
            .parse::<BigUint>()
            .map(Self)
            .map_err(|error| {
                AppError::Validation(format!("invalid permission bitfield '{value}': {error}"))
            })
    }

    /// Returns the decimal representation.
    #[must_use]
    pub fn to_decimal(&self) -> String {
        self.0.to_str_radix(10)
    }
}

impl FromStr for PermissionBitfield {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_decimal(value)
    }
}

impl Display for PermissionBitfield {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<u64> for PermissionBitfield {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl Serialize for PermissionBitfield {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.to_decimal().as_str())
    }
}

impl<'de> Deserialize<'de> for PermissionBitfield {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::from_decimal(value.as_str()).map_err(serde::de::Error::custom)
    }
}
