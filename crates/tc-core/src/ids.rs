//! Strongly typed string identifier wrappers.
//!
//! The external engine names every entity with a string.  Wrapping those
//! strings in distinct types keeps a vehicle id from being passed where an
//! edge id is expected.  All ids are `Clone + Ord + Hash` and implement
//! `Borrow<str>`, so maps keyed by an id can be queried with a plain `&str`.

use std::borrow::Borrow;
use std::fmt;

/// Generate a typed id wrapper around an owned `String`.
macro_rules! string_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        $vis struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// `true` for the empty id the engine reports for "nothing".
            #[inline]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
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

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Unique vehicle identifier, e.g. `"human_3"`.
    pub struct VehicleId;
}

string_id! {
    /// Vehicle type identifier, e.g. `"human"` or `"rl"`.
    pub struct VehicleTypeId;
}

string_id! {
    /// Network edge identifier.
    pub struct EdgeId;
}

string_id! {
    /// Named route known to the engine.
    pub struct RouteId;
}

string_id! {
    /// Traffic-signal (controlled junction) identifier.
    pub struct SignalId;
}

impl VehicleId {
    /// The id given to the `index`-th vehicle of a type in a roster.
    pub fn for_roster(type_id: &VehicleTypeId, index: usize) -> Self {
        Self(format!("{type_id}_{index}"))
    }
}

impl RouteId {
    /// The route the scenario defines as starting on `edge`.
    ///
    /// Scenario generators name one route per starting edge as
    /// `route<edge>`; resets use this to place a vehicle on a new edge.
    pub fn for_edge(edge: &EdgeId) -> Self {
        Self(format!("route{edge}"))
    }
}
