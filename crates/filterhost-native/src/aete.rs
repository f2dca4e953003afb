//! Scripting metadata (`aete`) of a filter.
//!
//! The tree describes one scripting event with its parameters and the
//! enumerations those parameters draw from. It is pure data: decoded once
//! during discovery and read by the action descriptor suite.

use serde::{Deserialize, Serialize};

use crate::error::PiplError;
use crate::pipl::ByteReader;

/// One scripting parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AeteParameter {
    /// Display name.
    pub name: String,
    /// Unique key under which the value is stored in a descriptor.
    pub key: u32,
    /// Four-character type code.
    pub type_code: u32,
    /// Description.
    pub description: String,
    /// Parameter flags.
    pub flags: i16,
}

/// One value of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AeteEnum {
    /// Display name.
    pub name: String,
    /// Four-character value code.
    pub type_code: u32,
    /// Description.
    pub description: String,
}

/// An enumeration referenced by parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AeteEnums {
    /// Four-character enumeration type.
    pub type_code: u32,
    /// Values in declaration order.
    pub enums: Vec<AeteEnum>,
}

/// The scripting event a filter registers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AeteEvent {
    /// Vendor name.
    pub vendor: String,
    /// Event description.
    pub description: String,
    /// Event class code.
    pub event_class: u32,
    /// Event id code.
    pub event_type: u32,
    /// Type of the reply.
    pub reply_type: u32,
    /// Type of the direct parameter.
    pub param_type: u32,
    /// Direct parameter flags.
    pub flags: i16,
    /// Parameters in declaration order.
    pub parameters: Vec<AeteParameter>,
    /// Enumerations.
    pub enums: Vec<AeteEnums>,
}

impl AeteEvent {
    /// Parameter registered under `key`.
    pub fn parameter(&self, key: u32) -> Option<&AeteParameter> {
        self.parameters.iter().find(|p| p.key == key)
    }
}

/// Decoded `aete` resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginAete {
    /// Major format version.
    pub major: i32,
    /// Minor format version.
    pub minor: i32,
    /// Suite level.
    pub suite_level: i16,
    /// Suite version.
    pub suite_version: i16,
    /// The filter's event.
    pub event: AeteEvent,
}

/// Decode an `aete` resource.
///
/// Only the first event of the first suite is kept; filters register
/// exactly one. Returns `Ok(None)` when the resource declares no event.
///
/// # Errors
///
/// Returns [`PiplError`] when the data is truncated or a count is negative.
pub fn parse_aete(data: &[u8]) -> Result<Option<PluginAete>, PiplError> {
    let mut r = ByteReader::new(data);

    let major = i32::from(r.u8()?);
    let minor = i32::from(r.u8()?);
    let _language = r.i16()?;
    let _script = r.i16()?;
    let suite_count = r.count16()?;
    if suite_count == 0 {
        return Ok(None);
    }

    let _suite_vendor = r.aligned_pascal_string()?;
    let _suite_description = r.aligned_pascal_string()?;
    let _suite_id = r.u32()?;
    let suite_level = r.i16()?;
    let suite_version = r.i16()?;
    let event_count = r.count16()?;
    if event_count == 0 {
        return Ok(None);
    }

    let vendor = r.aligned_pascal_string()?;
    let description = r.aligned_pascal_string()?;
    let event_class = r.u32()?;
    let event_type = r.u32()?;
    let reply_type = r.u32()?;
    let _reply_description = r.aligned_pascal_string()?;
    let _reply_flags = r.i16()?;
    let param_type = r.u32()?;
    let _direct_description = r.aligned_pascal_string()?;
    let flags = r.i16()?;

    let param_count = r.count16()?;
    let mut parameters = Vec::with_capacity(param_count);
    for _ in 0..param_count {
        parameters.push(AeteParameter {
            name: r.aligned_pascal_string()?,
            key: r.u32()?,
            type_code: r.u32()?,
            description: r.aligned_pascal_string()?,
            flags: r.i16()?,
        });
    }

    let _class_count = r.count16()?;
    let _comparison_count = r.count16()?;
    let enum_count = r.count16()?;
    let mut enums = Vec::with_capacity(enum_count);
    for _ in 0..enum_count {
        let type_code = r.u32()?;
        let count = r.count16()?;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(AeteEnum {
                name: r.aligned_pascal_string()?,
                type_code: r.u32()?,
                description: r.aligned_pascal_string()?,
            });
        }
        enums.push(AeteEnums {
            type_code,
            enums: values,
        });
    }

    Ok(Some(PluginAete {
        major,
        minor,
        suite_level,
        suite_version,
        event: AeteEvent {
            vendor,
            description,
            event_class,
            event_type,
            reply_type,
            param_type,
            flags,
            parameters,
            enums,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_suite_list_has_no_event() -> Result<(), PiplError> {
        let data = [1, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(parse_aete(&data)?, None);
        Ok(())
    }

    #[test]
    fn test_truncated_header() {
        assert_eq!(
            parse_aete(&[1, 0, 0]),
            Err(PiplError::UnexpectedEof { offset: 2 })
        );
    }
}
