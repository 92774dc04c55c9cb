//! Attribute identifier module.
//!
//! Provides the `AttrId` type, an interned attribute name such as
//! `"maxVelocity"` or `"damageMultiplier"`. Uses `Arc<str>` so the same
//! name can be shared between static data, modifiers and cache keys
//! without reallocating.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

/// Interned attribute name.
///
/// # Examples
///
/// ```rust
/// use fitcalc::AttrId;
///
/// let velocity = AttrId::new("maxVelocity");
/// let velocity2: AttrId = "maxVelocity".into();
/// let velocity3: AttrId = String::from("maxVelocity").into();
///
/// assert_eq!(velocity, velocity2);
/// assert_eq!(velocity, velocity3);
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttrId(Arc<str>);

impl Serialize for AttrId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AttrId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(AttrId::from(s))
    }
}

impl AttrId {
    /// Create a new `AttrId` from a string slice.
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the attribute name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fitcalc::AttrId;
    ///
    /// assert_eq!(AttrId::new("agility").as_str(), "agility");
    /// ```
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AttrId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AttrId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl std::fmt::Display for AttrId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
