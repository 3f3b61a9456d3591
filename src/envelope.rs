//! Host-tagged package envelope.
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 4 | host id (signed) |
//! | 4 | 4 | package sequence number |
//! | 8 | n | package |

use std::fmt;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::package::Package;
use crate::wire::parse_i32_le;
use crate::{Result, TelemetryError};

/// Size of the host id and package id prefix.
pub const ENVELOPE_HEADER_SIZE: usize = 8;

/// A package as relayed between hosts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkPackage {
    pub host_id: i32,
    /// Sequence number assigned by the sending host
    pub package_id: i32,
    pub package: Package,
}

impl NetworkPackage {
    pub fn new(host_id: i32, package_id: i32, package: Package) -> Self {
        Self { host_id, package_id, package }
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut prefix = [0u8; ENVELOPE_HEADER_SIZE];
        reader.read_exact(&mut prefix)?;

        Ok(Self {
            host_id: parse_i32_le(&prefix, 0)?,
            package_id: parse_i32_le(&prefix, 4)?,
            package: Package::read_from(reader)?,
        })
    }

    /// Parse the envelope at the front of `data`, returning it and the
    /// number of bytes consumed.
    pub fn parse(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < ENVELOPE_HEADER_SIZE {
            return Err(TelemetryError::framing(
                "Envelope parsing",
                format!("Need {} prefix bytes, have {}", ENVELOPE_HEADER_SIZE, data.len()),
            ));
        }

        let host_id = parse_i32_le(data, 0)?;
        let package_id = parse_i32_le(data, 4)?;
        let (package, consumed) = Package::parse(&data[ENVELOPE_HEADER_SIZE..])?;

        Ok((Self { host_id, package_id, package }, ENVELOPE_HEADER_SIZE + consumed))
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::parse(data).map(|(envelope, _)| envelope)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.host_id.to_le_bytes())?;
        writer.write_all(&self.package_id.to_le_bytes())?;
        self.package.write_to(writer)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    pub fn encoded_len(&self) -> usize {
        ENVELOPE_HEADER_SIZE + self.package.encoded_len()
    }
}

impl fmt::Display for NetworkPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HostId= {}, PackageId={}, Content=[{}]",
            self.host_id, self.package_id, self.package
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::test_utils::sample_package;
    use crate::types::PackageFormat;
    use std::io::Cursor;

    fn envelope() -> NetworkPackage {
        let payload = vec![8, 1, 0, 0, 0, 2, 0];
        NetworkPackage::new(-3, 42, sample_package(PackageFormat::Events, payload))
    }

    #[test]
    fn prefix_layout() {
        let bytes = envelope().to_bytes().unwrap();
        assert_eq!(&bytes[..4], &(-3i32).to_le_bytes());
        assert_eq!(&bytes[4..8], &42i32.to_le_bytes());
        assert_eq!(bytes.len(), ENVELOPE_HEADER_SIZE + 18 + 7);
    }

    #[test]
    fn read_from_stream() {
        let original = envelope();
        let mut cursor = Cursor::new(original.to_bytes().unwrap());

        let decoded = NetworkPackage::read_from(&mut cursor).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.package.events().unwrap().object_states[&1], 2);
    }

    #[test]
    fn parse_reports_consumed_bytes() {
        let original = envelope();
        let mut bytes = original.to_bytes().unwrap();
        let len = bytes.len();
        bytes.extend_from_slice(&[0xAA; 5]);

        let (decoded, consumed) = NetworkPackage::parse(&bytes).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(consumed, len);
    }

    #[test]
    fn short_prefix_is_framing_error() {
        let err = NetworkPackage::from_bytes(&[1, 0, 0, 0, 2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Framing);

        let err = NetworkPackage::read_from(&mut Cursor::new(vec![1, 0, 0])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Framing);
    }

    #[test]
    fn truncated_package_is_framing_error() {
        let bytes = envelope().to_bytes().unwrap();
        let err = NetworkPackage::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Framing);
    }

    #[test]
    fn display_wraps_package() {
        let text = envelope().to_string();
        assert!(text.starts_with("HostId= -3, PackageId=42, Content=[DevId="), "{}", text);
        assert!(text.ends_with(']'));
    }
}
