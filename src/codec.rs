//! Streaming framers for [`Package`] and [`NetworkPackage`].
//!
//! Both codecs plug into `tokio_util::codec::{FramedRead, FramedWrite}` and do
//! no I/O of their own. A frame is yielded only once all of its bytes are
//! buffered; a partial frame left over at end of stream is a framing error.
//!
//! ```
//! use bytes::BytesMut;
//! use telepack::{Package, PackageCodec, PackageFormat};
//! use tokio_util::codec::{Decoder, Encoder};
//!
//! let mut codec = PackageCodec::new();
//! let mut buf = BytesMut::new();
//! let package = Package::new(1, 2, 0, 16, PackageFormat::Heartbeat, Vec::new());
//! codec.encode(package.clone(), &mut buf).unwrap();
//!
//! assert_eq!(codec.decode(&mut buf).unwrap(), Some(package));
//! assert!(buf.is_empty());
//! ```

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::config::CodecConfig;
use crate::envelope::{ENVELOPE_HEADER_SIZE, NetworkPackage};
use crate::package::{PACKAGE_HEADER_SIZE, Package, PackageHeader};
use crate::wire::parse_i32_le;
use crate::{Result, TelemetryError};

/// Frames a byte stream of bare packages.
#[derive(Debug, Clone)]
pub struct PackageCodec {
    max_payload_len: usize,
}

impl PackageCodec {
    pub fn new() -> Self {
        Self::with_config(&CodecConfig::default())
    }

    pub fn with_config(config: &CodecConfig) -> Self {
        Self { max_payload_len: config.max_payload_len }
    }
}

impl Default for PackageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for PackageCodec {
    type Item = Package;
    type Error = TelemetryError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Package>> {
        let Some((header, frame_len)) = buffered_frame(src, 0, self.max_payload_len)? else {
            return Ok(None);
        };

        let frame = src.split_to(frame_len);
        Ok(Some(Package::from_parts(header, frame[PACKAGE_HEADER_SIZE..].to_vec())))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Package>> {
        match self.decode(src)? {
            Some(package) => Ok(Some(package)),
            None => trailing_bytes(src),
        }
    }
}

impl Encoder<Package> for PackageCodec {
    type Error = TelemetryError;

    fn encode(&mut self, item: Package, dst: &mut BytesMut) -> Result<()> {
        check_payload_limit(&item, self.max_payload_len)?;
        dst.reserve(item.encoded_len());
        item.write_to(&mut dst.writer())
    }
}

/// Frames a byte stream of host-tagged envelopes.
#[derive(Debug, Clone)]
pub struct NetworkPackageCodec {
    max_payload_len: usize,
}

impl NetworkPackageCodec {
    pub fn new() -> Self {
        Self::with_config(&CodecConfig::default())
    }

    pub fn with_config(config: &CodecConfig) -> Self {
        Self { max_payload_len: config.max_payload_len }
    }
}

impl Default for NetworkPackageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for NetworkPackageCodec {
    type Item = NetworkPackage;
    type Error = TelemetryError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<NetworkPackage>> {
        let Some((header, frame_len)) =
            buffered_frame(src, ENVELOPE_HEADER_SIZE, self.max_payload_len)?
        else {
            return Ok(None);
        };

        let frame = src.split_to(frame_len);
        let payload = frame[ENVELOPE_HEADER_SIZE + PACKAGE_HEADER_SIZE..].to_vec();
        Ok(Some(NetworkPackage {
            host_id: parse_i32_le(&frame, 0)?,
            package_id: parse_i32_le(&frame, 4)?,
            package: Package::from_parts(header, payload),
        }))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<NetworkPackage>> {
        match self.decode(src)? {
            Some(envelope) => Ok(Some(envelope)),
            None => trailing_bytes(src),
        }
    }
}

impl Encoder<NetworkPackage> for NetworkPackageCodec {
    type Error = TelemetryError;

    fn encode(&mut self, item: NetworkPackage, dst: &mut BytesMut) -> Result<()> {
        check_payload_limit(&item.package, self.max_payload_len)?;
        dst.reserve(item.encoded_len());
        item.write_to(&mut dst.writer())
    }
}

/// Locate a complete frame whose package header starts at `header_offset`.
///
/// Returns `None` and reserves capacity while the frame is incomplete.
fn buffered_frame(
    src: &mut BytesMut,
    header_offset: usize,
    max_payload_len: usize,
) -> Result<Option<(PackageHeader, usize)>> {
    let header_end = header_offset + PACKAGE_HEADER_SIZE;
    if src.len() < header_end {
        src.reserve(header_end - src.len());
        return Ok(None);
    }

    let header_data: &[u8; PACKAGE_HEADER_SIZE] =
        src[header_offset..header_end].try_into().map_err(|_| {
            TelemetryError::framing("Stream framing", "Package header slice has wrong length")
        })?;
    let header = PackageHeader::parse(header_data)?;

    let payload_len = header.payload_len as usize;
    if payload_len > max_payload_len {
        return Err(TelemetryError::framing(
            "Stream framing",
            format!(
                "Declared payload of {} bytes exceeds the configured limit of {}",
                payload_len, max_payload_len
            ),
        ));
    }

    let frame_len = header_end + payload_len;
    if src.len() < frame_len {
        trace!("Waiting for {} more frame bytes", frame_len - src.len());
        src.reserve(frame_len - src.len());
        return Ok(None);
    }

    Ok(Some((header, frame_len)))
}

fn trailing_bytes<T>(src: &BytesMut) -> Result<Option<T>> {
    if src.is_empty() {
        Ok(None)
    } else {
        Err(TelemetryError::framing(
            "Stream framing",
            format!("Stream ended inside a frame with {} bytes buffered", src.len()),
        ))
    }
}

fn check_payload_limit(package: &Package, max_payload_len: usize) -> Result<()> {
    if package.payload.len() > max_payload_len {
        return Err(TelemetryError::framing(
            "Stream encoding",
            format!(
                "Payload of {} bytes exceeds the configured limit of {}",
                package.payload.len(),
                max_payload_len
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::test_utils::sample_package;
    use crate::types::PackageFormat;

    #[test]
    fn waits_for_complete_package() {
        let package = sample_package(PackageFormat::Data, vec![1, 0, 2, 0]);
        let bytes = package.to_bytes().unwrap();
        let mut codec = PackageCodec::new();
        let mut buf = BytesMut::new();

        for (i, byte) in bytes.iter().enumerate() {
            assert_eq!(codec.decode(&mut buf).unwrap(), None, "decoded early at byte {}", i);
            buf.put_u8(*byte);
        }
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(package));
        assert!(buf.is_empty());
    }

    #[test]
    fn decodes_back_to_back_packages() {
        let first = sample_package(PackageFormat::Events, vec![8, 1, 0, 0, 0, 1, 0]);
        let second = sample_package(PackageFormat::Heartbeat, Vec::new());
        let mut buf = BytesMut::new();
        let mut codec = PackageCodec::new();
        codec.encode(first.clone(), &mut buf).unwrap();
        codec.encode(second.clone(), &mut buf).unwrap();

        assert_eq!(codec.decode(&mut buf).unwrap(), Some(first));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(second));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn payload_limit_applies_to_declared_length() {
        let config = CodecConfig { max_payload_len: 4 };
        let mut codec = PackageCodec::with_config(&config);
        let bytes = sample_package(PackageFormat::Data, vec![0; 8]).to_bytes().unwrap();

        // The header alone is enough to reject the frame.
        let mut buf = BytesMut::from(&bytes[..PACKAGE_HEADER_SIZE]);
        let err = codec.decode(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Framing);
    }

    #[test]
    fn encoder_enforces_payload_limit() {
        let config = CodecConfig { max_payload_len: 4 };
        let mut codec = PackageCodec::with_config(&config);
        let mut buf = BytesMut::new();

        let err =
            codec.encode(sample_package(PackageFormat::Data, vec![0; 5]), &mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Framing);
        assert!(buf.is_empty());
    }

    #[test]
    fn truncated_frame_at_eof_is_framing_error() {
        let bytes = sample_package(PackageFormat::Data, vec![1, 2]).to_bytes().unwrap();
        let mut buf = BytesMut::from(&bytes[..bytes.len() - 1]);

        let err = PackageCodec::new().decode_eof(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Framing);
    }

    #[test]
    fn clean_eof_yields_none() {
        let mut buf = BytesMut::new();
        assert_eq!(PackageCodec::new().decode_eof(&mut buf).unwrap(), None);
        assert_eq!(NetworkPackageCodec::new().decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn network_codec_matches_envelope_encoding() {
        let envelope =
            NetworkPackage::new(7, 1001, sample_package(PackageFormat::Data, vec![9; 6]));
        let mut buf = BytesMut::new();
        let mut codec = NetworkPackageCodec::new();
        codec.encode(envelope.clone(), &mut buf).unwrap();

        assert_eq!(&buf[..], &envelope.to_bytes().unwrap()[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(envelope));
    }

    #[test]
    fn network_codec_waits_for_prefix_and_header() {
        let envelope =
            NetworkPackage::new(7, 1, sample_package(PackageFormat::Heartbeat, Vec::new()));
        let bytes = envelope.to_bytes().unwrap();
        let mut codec = NetworkPackageCodec::new();

        let mut buf = BytesMut::from(&bytes[..ENVELOPE_HEADER_SIZE + 3]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(&bytes[ENVELOPE_HEADER_SIZE + 3..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(envelope));
    }
}
