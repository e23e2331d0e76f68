//! Newtype IDs for type-safe entity references.
//!
//! The catalog backend issues UUID v7 identifiers as strings. Use the
//! `define_id!` macro to create wrappers that prevent accidentally passing a
//! category id where a product id is expected.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `is_uuid_v7()`
/// - `From<String>`, `From<&str>`, `Display` and `AsRef<str>` implementations
///
/// # Example
///
/// ```rust
/// # use gravis_core::define_id;
/// define_id!(WarehouseId);
/// define_id!(DealerId);
///
/// let warehouse = WarehouseId::new("0190b2a4-7c1e-7a3d-9f00-6a2b8c4d5e6f");
/// assert!(warehouse.is_uuid_v7());
///
/// // These are different types, so this won't compile:
/// // let _: DealerId = warehouse;
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
            /// Create a new ID from its string form.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the id is a well-formed UUID version 7.
            #[must_use]
            pub fn is_uuid_v7(&self) -> bool {
                $crate::types::id::is_uuid_v7(&self.0)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
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

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

/// Returns true when `s` parses as a UUID whose version nibble is 7.
#[must_use]
pub fn is_uuid_v7(s: &str) -> bool {
    uuid::Uuid::parse_str(s).is_ok_and(|id| id.get_version_num() == 7)
}

define_id!(ProductId);
define_id!(CategoryId);
define_id!(CategoryFilterId);
define_id!(FilterOptionId);
define_id!(CustomerId);
define_id!(ImageId);
define_id!(GuestId);

#[cfg(test)]
mod tests {
    use super::*;

    const V7: &str = "0190b2a4-7c1e-7a3d-9f00-6a2b8c4d5e6f";
    const V4: &str = "3f2504e0-4f89-41d3-9a0c-0305e82c3301";

    #[test]
    fn test_uuid_v7_detection() {
        assert!(is_uuid_v7(V7));
        assert!(!is_uuid_v7(V4));
        assert!(!is_uuid_v7("not-a-uuid"));
        assert!(!is_uuid_v7(""));
    }

    #[test]
    fn test_id_wrapper() {
        let id = ProductId::new(V7);
        assert!(id.is_uuid_v7());
        assert_eq!(id.as_str(), V7);
        assert_eq!(id.to_string(), V7);
    }

    #[test]
    fn test_id_is_transparent_in_json() {
        let id = CategoryId::from("abc");
        assert_eq!(serde_json::to_string(&id).ok().as_deref(), Some("\"abc\""));
    }
}
