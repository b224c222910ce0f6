//! Identifiers for templates, batches and reports
//!
//! All identifiers are UUIDv7 values: chronologically sortable, 128-bit unique,
//! and generated without coordination between workers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! uuid_v7_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u128);

        impl $name {
            /// Generate a new UUIDv7-based identifier
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7().as_u128())
            }

            /// Create an identifier from a raw u128 value
            pub fn from_value(value: u128) -> Self {
                Self(value)
            }

            /// Get the raw u128 value
            pub fn value(&self) -> u128 {
                self.0
            }

            /// Milliseconds since the Unix epoch encoded in the UUIDv7
            pub fn timestamp(&self) -> u64 {
                (self.0 >> 80) as u64
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", uuid::Uuid::from_u128(self.0))
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s)
                    .map(|u| Self(u.as_u128()))
                    .map_err(|e| format!("Invalid {} '{}': {}", stringify!($name), s, e))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

uuid_v7_id!(
    /// Identifier of a [`Template`](crate::Template)
    TemplateId
);

uuid_v7_id!(
    /// Identifier of a [`ReportBatch`](crate::ReportBatch)
    BatchId
);

uuid_v7_id!(
    /// Identifier of a [`StructuredReport`](crate::StructuredReport)
    ReportId
);


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Ordering of identifiers matches ordering of the raw values
        #[test]
        fn test_ordering_property(a: u128, b: u128) {
            let id_a = ReportId::from_value(a);
            let id_b = ReportId::from_value(b);
            prop_assert_eq!(id_a < id_b, a < b);
            prop_assert_eq!(id_a == id_b, a == b);
        }

        /// Display/parse preserves the identifier
        #[test]
        fn test_string_roundtrip(value: u128) {
            let id = BatchId::from_value(value);
            let parsed: BatchId = id.to_string().parse().map_err(TestCaseError::fail)?;
            prop_assert_eq!(id, parsed);
        }
    }
}
