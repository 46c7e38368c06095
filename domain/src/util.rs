//! Shared utility macros and helpers.

/// Declare a fieldless enum whose wire form is a fixed snake_case string.
///
/// Generates `as_str()`, an `ALL` slice, `Display`, and a `FromStr` whose
/// error lists the valid values. Serde derives still live on the enum so
/// the serialized form and `as_str()` must agree; the caller supplies both.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(format!(
                        "Unknown {}: {}. Valid: {}",
                        stringify!($name),
                        s,
                        [$($wire),+].join(", ")
                    )),
                }
            }
        }
    };
}

pub(crate) use wire_enum;

/// Trimmed non-empty check used by constructors and mappers.
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    wire_enum! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        enum Sample {
            One => "one",
            TwoWords => "two_words",
        }
    }

    #[test]
    fn test_wire_enum_round_trips_strings() {
        assert_eq!(Sample::TwoWords.as_str(), "two_words");
        assert_eq!("TWO_WORDS".parse::<Sample>().unwrap(), Sample::TwoWords);
        assert_eq!(Sample::ALL.len(), 2);
    }

    #[test]
    fn test_wire_enum_serde_matches_as_str() {
        let json = serde_json::to_string(&Sample::TwoWords).unwrap();
        assert_eq!(json, "\"two_words\"");
    }

    #[test]
    fn test_wire_enum_error_lists_values() {
        let err = "three".parse::<Sample>().unwrap_err();
        assert!(err.contains("one, two_words"));
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank("  "));
        assert!(!is_blank(" a "));
    }
}
