//! Identifier newtypes.
//!
//! The backend hands out auto-increment integers, but older endpoints and
//! the realtime channel send the same ids as strings. Every id here accepts
//! either form and writes it back the way it arrived, so a numeric id goes
//! out as a JSON number. Equality and hashing only look at the text.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
}

macro_rules! wire_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            value: String,
            numeric: bool,
        }

        impl $name {
            /// Id typed by a user. Integer-looking input takes the numeric wire form.
            pub fn new(value: impl Into<String>) -> Self {
                let value = value.into();
                let numeric = value.parse::<i64>().is_ok();
                Self { value, numeric }
            }

            pub fn as_str(&self) -> &str {
                &self.value
            }

            pub fn is_empty(&self) -> bool {
                self.value.is_empty()
            }

            /// Whether the id is written to the wire as a JSON number.
            pub fn is_numeric(&self) -> bool {
                self.numeric
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.value == other.value
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.value.hash(state);
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.value.cmp(&other.value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.value)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self {
                    value: value.to_string(),
                    numeric: true,
                }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self {
                    value: value.to_string(),
                    numeric: false,
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self {
                    value,
                    numeric: false,
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self::new(s))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match self.value.parse::<i64>() {
                    Ok(n) if self.numeric => serializer.serialize_i64(n),
                    _ => serializer.serialize_str(&self.value),
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                Ok(match RawId::deserialize(deserializer)? {
                    RawId::Text(value) => Self::from(value),
                    RawId::Int(n) => Self::from(n),
                })
            }
        }
    };
}

wire_id!(
    /// Identity of a question inside a retro.
    QuestionId
);
wire_id!(
    /// Server-assigned identity of a post-it.
    PostItId
);
wire_id!(RetroId);
wire_id!(TemplateId);
wire_id!(
    /// Identity of a user. The empty id never matches a logged-in user.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_accepts_integer_and_string() {
        let from_int: PostItId = serde_json::from_str("42").unwrap();
        let from_str: PostItId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(from_int, from_str);
        assert_eq!(from_int.as_str(), "42");

        let set: HashSet<PostItId> = [from_int, from_str].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_id_keeps_the_wire_form_it_arrived_in() {
        let numeric: TemplateId = serde_json::from_str("1").unwrap();
        assert_eq!(serde_json::to_string(&numeric).unwrap(), "1");

        let text: TemplateId = serde_json::from_str("\"1\"").unwrap();
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"1\"");

        assert_eq!(serde_json::to_string(&RetroId::from(5)).unwrap(), "5");
        assert_eq!(serde_json::to_string(&PostItId::from("p1")).unwrap(), "\"p1\"");
    }

    #[test]
    fn test_typed_ids_infer_numeric_form() {
        assert!(QuestionId::new("10").is_numeric());
        assert!(!QuestionId::new("abc").is_numeric());
        let parsed: TemplateId = "7".parse().unwrap();
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "7");
    }

    #[test]
    fn test_id_rejects_non_scalar() {
        assert!(serde_json::from_str::<QuestionId>("{\"id\":1}").is_err());
        assert!(serde_json::from_str::<QuestionId>("true").is_err());
    }

    #[test]
    fn test_id_parse_and_display() {
        let id: UserId = "u1".parse().unwrap();
        assert_eq!(id.to_string(), "u1");
        assert!(!id.is_empty());
        assert!(UserId::default().is_empty());
    }
}
