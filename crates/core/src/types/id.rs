//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. All Novabay IDs are
//! issued by external providers and treated as opaque strings - they are
//! never parsed or generated locally.

/// Macro to define a type-safe opaque ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>` and `From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use novabay_core::define_id;
/// define_id!(UserId);
/// define_id!(VariantId);
///
/// let user_id = UserId::new("uid_3kf9s");
/// let variant_id = VariantId::new("var_001");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = variant_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a provider-issued string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Identity provider IDs
define_id!(UserId);

// Catalog IDs
define_id!(ItemId);
define_id!(VariantId);

// Commerce provider IDs
define_id!(RemoteCartId);
define_id!(RemoteLineId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        let id = VariantId::new("var_42");
        assert_eq!(id.as_str(), "var_42");
        assert_eq!(id.to_string(), "var_42");
        assert_eq!(id.clone().into_inner(), "var_42");
    }

    #[test]
    fn test_id_equality() {
        assert_eq!(UserId::new("a"), UserId::from("a"));
        assert_ne!(UserId::new("a"), UserId::new("b"));
    }

    #[test]
    fn test_serde_transparent() {
        let id = RemoteCartId::new("cart_xyz");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"cart_xyz\"");

        let parsed: RemoteCartId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
