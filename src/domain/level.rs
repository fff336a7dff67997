use std::{cmp::Ordering, fmt, str::FromStr};

use nonempty::NonEmpty;
use serde::{Deserialize, Deserializer, de};

/// A dotted numeric level such as `1`, `1.0`, or `2.1.3`.
///
/// Levels order items within a document and choose the heading command an item
/// is rendered with. Ordering is part-wise numeric, so `1.9` sorts before
/// `1.10`.
#[derive(Debug, Clone)]
pub struct Level(NonEmpty<usize>);

impl Level {
    /// Creates a level from its parts.
    #[must_use]
    pub const fn new(parts: NonEmpty<usize>) -> Self {
        Self(parts)
    }

    /// The numeric parts of the level, in order.
    pub fn parts(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// The rendering depth of this level.
    ///
    /// Trailing zero parts carry no depth (`1.0` is as deep as `1`, `1.1.0` as
    /// deep as `1.1`), and the depth is never less than one.
    #[must_use]
    pub fn depth(&self) -> usize {
        let significant = self.0.len() - self.0.iter().rev().take_while(|&&part| part == 0).count();
        significant.max(1)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{text}")
    }
}

impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool {
        self.0.iter().eq(other.0.iter())
    }
}

impl Eq for Level {}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.iter().cmp(other.0.iter())
    }
}

impl FromStr for Level {
    type Err = InvalidLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split('.')
            .map(|part| part.parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| InvalidLevelError(s.to_string()))?;

        NonEmpty::from_vec(parts)
            .map(Self)
            .ok_or_else(|| InvalidLevelError(s.to_string()))
    }
}

/// Error returned when a string is not a valid dotted level.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid level '{0}': expected dot-separated non-negative integers")]
pub struct InvalidLevelError(String);

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LevelVisitor;

        impl de::Visitor<'_> for LevelVisitor {
            type Value = Level;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a dotted level such as \"2.1\" (string or number)")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                value.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                usize::try_from(value)
                    .map(|part| Level(NonEmpty::new(part)))
                    .map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                u64::try_from(value)
                    .map_err(E::custom)
                    .and_then(|part| self.visit_u64(part))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
                if !value.is_finite() || value < 0.0 {
                    return Err(E::custom(InvalidLevelError(value.to_string())));
                }
                // A YAML float drops trailing fraction zeros (1.10 reads as
                // 1.1); levels that need them must be quoted. A whole-number
                // float like 2.0 still carries its heading zero.
                let text = if value.fract().abs() < f64::EPSILON {
                    format!("{value:.1}")
                } else {
                    value.to_string()
                };
                text.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(LevelVisitor)
    }
}
