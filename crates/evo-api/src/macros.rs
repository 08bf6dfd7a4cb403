//! Declarative helpers shared by the model modules.

/// Declare an open enumeration of server-controlled string values.
///
/// Every listed variant maps to one wire value. Values the server sends
/// that are not listed parse into `Unknown(raw)` and keep the raw text.
/// Matching ignores ASCII case and treats `.`, `-` and `_` as equal, so
/// `messages.upsert` and `MESSAGES_UPSERT` are the same event.
macro_rules! open_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $wire:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
            /// A value this version of the library does not know.
            Unknown(String),
        }

        impl $name {
            /// Every known variant.
            pub fn known() -> Vec<$name> {
                vec![$($name::$variant),+]
            }

            /// Parse a wire value. Never fails.
            pub fn parse(raw: &str) -> Self {
                let wanted = $crate::macros::normalize_token(raw);
                $(
                    if wanted == $crate::macros::normalize_token($wire) {
                        return $name::$variant;
                    }
                )+
                $name::Unknown(raw.to_string())
            }

            /// The wire value.
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Unknown(raw) => raw.as_str(),
                }
            }

            /// Returns true for values outside the known set.
            pub fn is_unknown(&self) -> bool {
                matches!(self, $name::Unknown(_))
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                $name::parse(raw)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                $name::parse(&raw)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Self, D::Error> {
                let raw = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                Ok($name::parse(&raw))
            }
        }
    };
}

/// Canonical form used to compare wire tokens.
pub(crate) fn normalize_token(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '.' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}
