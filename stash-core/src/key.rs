//! Symbolic cache keys.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, StashError};

/// Maximum key length in bytes.
pub const MAX_KEY_LEN: usize = 255;

/// A symbolic identifier under which one cached value is stored.
///
/// Keys are immutable and cheap to clone; every clone shares one allocation.
/// A valid key is 1 to [`MAX_KEY_LEN`] bytes long and contains no whitespace
/// or control characters.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Arc<str>);

impl Key {
    /// Parses an untrusted string into a key.
    pub fn parse(name: &str) -> Result<Self> {
        validate(name)?;
        Ok(Self(Arc::from(name)))
    }

    /// Builds a key from a literal.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a valid key. Literal keys are part of the
    /// program, so an invalid one is a bug at the call site.
    #[track_caller]
    pub fn from_static(name: &'static str) -> Self {
        match Self::parse(name) {
            Ok(key) => key,
            Err(err) => panic!("{err}"),
        }
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(StashError::invalid_key(name, "key is empty"));
    }
    if name.len() > MAX_KEY_LEN {
        return Err(StashError::invalid_key(
            name,
            format!("key is {} bytes, maximum is {}", name.len(), MAX_KEY_LEN),
        ));
    }
    if let Some(c) = name.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(StashError::invalid_key(
            name,
            format!("key contains forbidden character {:?}", c),
        ));
    }
    Ok(())
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for Key {
    type Err = StashError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Key {
    type Error = StashError;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Key {
    type Error = StashError;

    fn try_from(value: String) -> Result<Self> {
        validate(&value)?;
        Ok(Self(Arc::from(value)))
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Key::try_from(s).map_err(serde::de::Error::custom)
    }
}
