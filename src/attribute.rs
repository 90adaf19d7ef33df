//! Typed attribute values exchanged with storage backends.
//!
//! An [`Attribute`] is a tagged union over every scalar and vector type the
//! openPMD standard allows. The tag is explicit: [`Attribute::dtype`] returns
//! the [`Datatype`] the value was stored with, and extraction through
//! [`Attribute::get`] only succeeds for exactly that type. Values are never
//! coerced between widths or signedness.
//!
//! The serde representation keeps the tag next to the value, so a backend that
//! persists attributes as JSON restores the original datatype on read:
//!
//! ```text
//! { "datatype": "UINT32", "value": 0 }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors raised when extracting a typed value from an [`Attribute`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttributeError {
    /// The stored datatype differs from the requested one
    #[error("Attribute holds {found}, but {expected} was requested")]
    TypeMismatch {
        /// Datatype the caller asked for
        expected: Datatype,
        /// Datatype actually stored
        found: Datatype,
    },

    /// No attribute of this name is set
    #[error("Attribute '{0}' is not set")]
    Missing(String),
}

/// Rust types that can be stored in and extracted from an [`Attribute`]
pub trait AttributeType: Sized {
    /// Datatype tag belonging to this Rust type
    const DATATYPE: Datatype;

    /// Take the value out of an attribute holding exactly this type
    fn from_attribute(attribute: Attribute) -> Result<Self, AttributeError>;

    /// Borrow the value of an attribute holding exactly this type
    fn from_attribute_ref(attribute: &Attribute) -> Option<&Self>;
}

macro_rules! attribute_types {
    (
        scalars { $($s_variant:ident($s_ty:ty) = $s_name:literal),* $(,)? }
        vectors { $($v_variant:ident($v_ty:ty) = $v_name:literal),* $(,)? }
    ) => {
        /// Datatype tag of an [`Attribute`]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Datatype {
            $(
                #[doc = concat!("`", stringify!($s_ty), "`")]
                #[serde(rename = $s_name)]
                $s_variant,
            )*
            $(
                #[doc = concat!("`", stringify!($v_ty), "`")]
                #[serde(rename = $v_name)]
                $v_variant,
            )*
        }

        impl Datatype {
            /// Canonical upper-case name, as persisted by backends
            pub fn name(&self) -> &'static str {
                match self {
                    $(Datatype::$s_variant => $s_name,)*
                    $(Datatype::$v_variant => $v_name,)*
                }
            }

            /// Whether this datatype describes an array of values
            pub fn is_vector(&self) -> bool {
                match self {
                    $(Datatype::$s_variant => false,)*
                    $(Datatype::$v_variant => true,)*
                }
            }
        }

        /// One typed attribute value together with its datatype tag
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "datatype", content = "value")]
        pub enum Attribute {
            $(
                #[doc = concat!("Scalar `", stringify!($s_ty), "`")]
                #[serde(rename = $s_name)]
                $s_variant($s_ty),
            )*
            $(
                #[doc = concat!("Array of `", stringify!($v_ty), "`")]
                #[serde(rename = $v_name)]
                $v_variant($v_ty),
            )*
        }

        impl Attribute {
            /// Datatype tag of the stored value
            pub fn dtype(&self) -> Datatype {
                match self {
                    $(Attribute::$s_variant(_) => Datatype::$s_variant,)*
                    $(Attribute::$v_variant(_) => Datatype::$v_variant,)*
                }
            }
        }

        impl fmt::Display for Attribute {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Attribute::$s_variant(v) => write!(f, "{}", v),)*
                    $(Attribute::$v_variant(v) => write!(f, "{:?}", v),)*
                }
            }
        }

        $(
            impl From<$s_ty> for Attribute {
                fn from(value: $s_ty) -> Self {
                    Attribute::$s_variant(value)
                }
            }

            impl AttributeType for $s_ty {
                const DATATYPE: Datatype = Datatype::$s_variant;

                fn from_attribute(attribute: Attribute) -> Result<Self, AttributeError> {
                    match attribute {
                        Attribute::$s_variant(v) => Ok(v),
                        other => Err(AttributeError::TypeMismatch {
                            expected: Self::DATATYPE,
                            found: other.dtype(),
                        }),
                    }
                }

                fn from_attribute_ref(attribute: &Attribute) -> Option<&Self> {
                    match attribute {
                        Attribute::$s_variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*

        $(
            impl From<$v_ty> for Attribute {
                fn from(value: $v_ty) -> Self {
                    Attribute::$v_variant(value)
                }
            }

            impl AttributeType for $v_ty {
                const DATATYPE: Datatype = Datatype::$v_variant;

                fn from_attribute(attribute: Attribute) -> Result<Self, AttributeError> {
                    match attribute {
                        Attribute::$v_variant(v) => Ok(v),
                        other => Err(AttributeError::TypeMismatch {
                            expected: Self::DATATYPE,
                            found: other.dtype(),
                        }),
                    }
                }

                fn from_attribute_ref(attribute: &Attribute) -> Option<&Self> {
                    match attribute {
                        Attribute::$v_variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

attribute_types! {
    scalars {
        Bool(bool) = "BOOL",
        Int8(i8) = "INT8",
        Int16(i16) = "INT16",
        Int32(i32) = "INT32",
        Int64(i64) = "INT64",
        Uint8(u8) = "UINT8",
        Uint16(u16) = "UINT16",
        Uint32(u32) = "UINT32",
        Uint64(u64) = "UINT64",
        Float(f32) = "FLOAT",
        Double(f64) = "DOUBLE",
        String(String) = "STRING",
    }
    vectors {
        VecInt8(Vec<i8>) = "VEC_INT8",
        VecInt16(Vec<i16>) = "VEC_INT16",
        VecInt32(Vec<i32>) = "VEC_INT32",
        VecInt64(Vec<i64>) = "VEC_INT64",
        VecUint8(Vec<u8>) = "VEC_UINT8",
        VecUint16(Vec<u16>) = "VEC_UINT16",
        VecUint32(Vec<u32>) = "VEC_UINT32",
        VecUint64(Vec<u64>) = "VEC_UINT64",
        VecFloat(Vec<f32>) = "VEC_FLOAT",
        VecDouble(Vec<f64>) = "VEC_DOUBLE",
        VecString(Vec<String>) = "VEC_STRING",
    }
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Attribute::String(value.to_string())
    }
}

impl Attribute {
    /// Extract a copy of the value, failing unless the datatype matches exactly
    pub fn get<T: AttributeType + Clone>(&self) -> Result<T, AttributeError> {
        T::from_attribute_ref(self)
            .cloned()
            .ok_or(AttributeError::TypeMismatch {
                expected: T::DATATYPE,
                found: self.dtype(),
            })
    }

    /// Consume the attribute and return its value
    pub fn into_value<T: AttributeType>(self) -> Result<T, AttributeError> {
        T::from_attribute(self)
    }

    /// Borrow the string payload, if this is a string attribute
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Attribute::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_follows_variant() {
        assert_eq!(Attribute::from(0u32).dtype(), Datatype::Uint32);
        assert_eq!(Attribute::from("1.1.0").dtype(), Datatype::String);
        assert_eq!(Attribute::from(vec![1.0f64, 2.0]).dtype(), Datatype::VecDouble);
        assert!(Datatype::VecString.is_vector());
        assert!(!Datatype::Double.is_vector());
    }

    #[test]
    fn test_no_silent_coercion() {
        let attr = Attribute::from(7u32);
        assert_eq!(attr.get::<u32>(), Ok(7));
        assert_eq!(
            attr.get::<u64>(),
            Err(AttributeError::TypeMismatch {
                expected: Datatype::Uint64,
                found: Datatype::Uint32,
            })
        );
        assert!(attr.get::<i32>().is_err());
    }

    #[test]
    fn test_json_keeps_datatype_tag() {
        let attr = Attribute::from(0u32);
        let json = serde_json::to_string(&attr).unwrap();
        assert_eq!(json, r#"{"datatype":"UINT32","value":0}"#);

        let back: Attribute = serde_json::from_str(&json).unwrap();
        assert_eq!(back.dtype(), Datatype::Uint32);

        let strings = Attribute::from(vec!["a".to_string(), "b".to_string()]);
        let json = serde_json::to_string(&strings).unwrap();
        let back: Attribute = serde_json::from_str(&json).unwrap();
        assert_eq!(back, strings);
    }

    #[test]
    fn test_display() {
        assert_eq!(Attribute::from("meshes/").to_string(), "meshes/");
        assert_eq!(Attribute::from(vec![1u8, 2]).to_string(), "[1, 2]");
        assert_eq!(Datatype::VecUint64.to_string(), "VEC_UINT64");
    }
}
