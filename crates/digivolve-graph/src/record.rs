//! Typed Digimon records.

use serde::{Deserialize, Serialize};

/// Wire sentinel for a Digimon without an attribute.
pub const NO_ATTRIBUTE: &str = "None";

/// One row of the source dataset.
///
/// `attribute` is a proper optional internally; the `"None"` string only exists
/// at the serialization boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digimon {
    /// Informational id; `0` when the source cell was missing or unparseable.
    pub number: u32,
    pub name: String,
    pub stage: String,
    #[serde(with = "attribute_sentinel")]
    pub attribute: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl Digimon {
    pub fn new(number: u32, name: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            stage: stage.into(),
            attribute: None,
            image: None,
        }
    }

    /// Set the attribute; blank values and the `"None"` sentinel mean absent.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        let attribute = attribute.into();
        let trimmed = attribute.trim();
        self.attribute = if trimmed.is_empty() || trimmed == NO_ATTRIBUTE {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    /// Set the image reference; blank values mean absent.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        let image = image.into();
        let trimmed = image.trim();
        self.image = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    /// Attribute as shown on the wire.
    pub fn attribute_label(&self) -> &str {
        self.attribute.as_deref().unwrap_or(NO_ATTRIBUTE)
    }
}

mod attribute_sentinel {
    use super::NO_ATTRIBUTE;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_deref().unwrap_or(NO_ATTRIBUTE))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.filter(|v| v != NO_ATTRIBUTE))
    }
}
