//! Strongly typed entity codes.
//!
//! The solver identifies trucks, orders and warehouses by short strings
//! ("TA01", "PED-0042", "CENTRAL").  Wrapping them keeps a truck code from
//! being passed where an order code is expected.

use std::fmt;

/// Generate a typed code wrapper around a `String`.
macro_rules! typed_code {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        $vis struct $name(pub String);

        impl $name {
            #[inline]
            pub fn new(code: impl Into<String>) -> Self {
                Self(code.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_code! {
    /// Stable truck code, e.g. `"TA01"`.  The first two letters name the
    /// vehicle class.
    pub struct TruckCode;
}

typed_code! {
    /// Customer order code.
    pub struct OrderCode;
}

typed_code! {
    /// Warehouse identity.
    pub struct WarehouseCode;
}

impl TruckCode {
    /// The class prefix (`"TA"`, `"TB"`, …) if the code carries one.
    pub fn class_prefix(&self) -> Option<&str> {
        self.0.get(..2).filter(|p| p.chars().all(|c| c.is_ascii_alphabetic()))
    }
}
