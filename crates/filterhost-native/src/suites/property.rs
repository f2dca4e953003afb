//! Host properties read and written through the property procs.

use std::collections::HashMap;

use filterhost_abi::{PHOTOSHOP_SIGNATURE, property_key};

use super::{SuiteError, SuiteResult};

/// Host version advertised through the `vers` property, major in the high
/// word.
pub const HOST_VERSION: isize = 1 << 16;

/// Interpolation preference: bicubic.
pub const INTERPOLATION_BICUBIC: isize = 3;

/// Big nudge distance: ten pixels, 16.16 fixed.
pub const BIG_NUDGE: isize = 10 << 16;

/// Ruler units: pixels.
pub const RULER_PIXELS: isize = 0;

/// A property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// Returned in the integer slot.
    Simple(isize),
    /// Returned as a new handle holding these bytes.
    Complex(Vec<u8>),
}

/// Document facts the properties report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentProperties {
    /// Channels in the document.
    pub channel_count: i32,
    /// Record image mode.
    pub image_mode: i16,
    /// Document title.
    pub title: String,
}

/// Properties of one session, with values the plug-in has set.
#[derive(Debug, Default)]
pub struct PropertyStore {
    document: DocumentProperties,
    overrides: HashMap<(u32, i32), PropertyValue>,
}

impl PropertyStore {
    /// Properties describing `document`.
    pub fn new(document: DocumentProperties) -> Self {
        Self {
            document,
            overrides: HashMap::new(),
        }
    }

    /// Read a property.
    ///
    /// # Errors
    ///
    /// [`SuiteError::PropertyUndefined`] for foreign signatures and keys
    /// this host does not provide.
    pub fn get(&self, signature: u32, key: u32, index: i32) -> SuiteResult<PropertyValue> {
        if signature != PHOTOSHOP_SIGNATURE {
            return Err(SuiteError::PropertyUndefined { key });
        }
        if let Some(value) = self.overrides.get(&(key, index)) {
            return Ok(value.clone());
        }
        let value = match key {
            property_key::NUMBER_OF_CHANNELS => {
                PropertyValue::Simple(self.document.channel_count as isize)
            }
            property_key::IMAGE_MODE => PropertyValue::Simple(self.document.image_mode as isize),
            property_key::BIG_NUDGE_H | property_key::BIG_NUDGE_V => {
                PropertyValue::Simple(BIG_NUDGE)
            }
            property_key::INTERPOLATION_METHOD => PropertyValue::Simple(INTERPOLATION_BICUBIC),
            property_key::HOST_VERSION => PropertyValue::Simple(HOST_VERSION),
            property_key::RULER_UNITS => PropertyValue::Simple(RULER_PIXELS),
            property_key::CAPTION => PropertyValue::Complex(Vec::new()),
            property_key::TITLE => PropertyValue::Complex(self.document.title.as_bytes().to_vec()),
            property_key::SERIAL_STRING => PropertyValue::Complex(b"0".to_vec()),
            _ => return Err(SuiteError::PropertyUndefined { key }),
        };
        Ok(value)
    }

    /// Store a property value for later reads in this session.
    ///
    /// # Errors
    ///
    /// [`SuiteError::PropertyUndefined`] for foreign signatures.
    pub fn set(
        &mut self,
        signature: u32,
        key: u32,
        index: i32,
        value: PropertyValue,
    ) -> SuiteResult<()> {
        if signature != PHOTOSHOP_SIGNATURE {
            return Err(SuiteError::PropertyUndefined { key });
        }
        tracing::debug!(key = format_args!("{key:#010x}"), index, "Property set by plug-in");
        self.overrides.insert((key, index), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filterhost_abi::four_cc;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn store() -> PropertyStore {
        PropertyStore::new(DocumentProperties {
            channel_count: 4,
            image_mode: 3,
            title: "Photo".into(),
        })
    }

    #[test]
    fn test_document_properties() -> TestResult {
        let store = store();
        assert_eq!(
            store.get(PHOTOSHOP_SIGNATURE, property_key::NUMBER_OF_CHANNELS, 0)?,
            PropertyValue::Simple(4)
        );
        assert_eq!(
            store.get(PHOTOSHOP_SIGNATURE, property_key::TITLE, 0)?,
            PropertyValue::Complex(b"Photo".to_vec())
        );
        Ok(())
    }

    #[test]
    fn test_foreign_signature_is_undefined() {
        let store = store();
        assert_eq!(
            store.get(four_cc(*b"ABCD"), property_key::IMAGE_MODE, 0),
            Err(SuiteError::PropertyUndefined {
                key: property_key::IMAGE_MODE
            })
        );
    }

    #[test]
    fn test_unknown_key_is_undefined() {
        let key = four_cc(*b"zzzz");
        assert_eq!(
            store().get(PHOTOSHOP_SIGNATURE, key, 0),
            Err(SuiteError::PropertyUndefined { key })
        );
    }

    #[test]
    fn test_set_overrides_later_reads() -> TestResult {
        let mut store = store();
        store.set(
            PHOTOSHOP_SIGNATURE,
            property_key::CAPTION,
            0,
            PropertyValue::Complex(b"note".to_vec()),
        )?;
        assert_eq!(
            store.get(PHOTOSHOP_SIGNATURE, property_key::CAPTION, 0)?,
            PropertyValue::Complex(b"note".to_vec())
        );
        Ok(())
    }
}
