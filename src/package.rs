//! Package framing.
//!
//! ## Wire Layout
//!
//! All integers are little-endian.
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 8 | timestamp, microseconds since the Unix epoch |
//! | 8 | 4 | device id (signed) |
//! | 12 | 2 | sensor count |
//! | 14 | 1 | bits per sensor |
//! | 15 | 1 | format tag |
//! | 16 | 2 | payload length |
//! | 18 | n | payload |
//!
//! The payload length is declared independently of the sensor count and bit
//! width, which is what allows sample payloads to be size-reduced.

use std::fmt;
use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::events::PackageEvents;
use crate::snapshot::{FailureStates, ObjectStates};
use crate::time::{format_rfc3339_nanos, time_from_micros};
use crate::types::{PackageFormat, host_for_virtual_device};
use crate::value::sample_decoder;
use crate::wire::{parse_i32_le, parse_u8, parse_u16_le, parse_u64_le};
use crate::{Result, TelemetryError};

/// Size of the fixed package header in bytes.
pub const PACKAGE_HEADER_SIZE: usize = 18;

/// Largest payload a package header can declare.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Fixed-size package header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageHeader {
    pub timestamp: u64,
    pub device_id: i32,
    pub sensor_count: u16,
    pub bits_per_sensor: u8,
    pub format: PackageFormat,
    pub payload_len: u16,
}

impl PackageHeader {
    pub fn parse(data: &[u8; PACKAGE_HEADER_SIZE]) -> Result<Self> {
        Ok(Self {
            timestamp: parse_u64_le(data, 0)?,
            device_id: parse_i32_le(data, 8)?,
            sensor_count: parse_u16_le(data, 12)?,
            bits_per_sensor: parse_u8(data, 14)?,
            format: PackageFormat::from_byte(parse_u8(data, 15)?),
            payload_len: parse_u16_le(data, 16)?,
        })
    }

    pub fn parse_from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        trace!("Reading package header ({} bytes)", PACKAGE_HEADER_SIZE);
        let mut header_data = [0u8; PACKAGE_HEADER_SIZE];
        reader.read_exact(&mut header_data).map_err(|e| read_error("Package header reading", e))?;
        Self::parse(&header_data)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.timestamp.to_le_bytes())?;
        writer.write_all(&self.device_id.to_le_bytes())?;
        writer.write_all(&self.sensor_count.to_le_bytes())?;
        writer.write_all(&[self.bits_per_sensor, self.format.as_byte()])?;
        writer.write_all(&self.payload_len.to_le_bytes())?;
        Ok(())
    }
}

/// One framed unit of telemetry.
///
/// The payload is owned: decoded packages outlive the buffer they were read
/// from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Package {
    /// Microseconds since the Unix epoch
    pub timestamp: u64,
    pub device_id: i32,
    pub sensor_count: u16,
    pub bits_per_sensor: u8,
    pub format: PackageFormat,
    pub payload: Vec<u8>,
}

impl Package {
    pub fn new(
        timestamp: u64,
        device_id: i32,
        sensor_count: u16,
        bits_per_sensor: u8,
        format: PackageFormat,
        payload: Vec<u8>,
    ) -> Self {
        Self { timestamp, device_id, sensor_count, bits_per_sensor, format, payload }
    }

    /// Read one package from a byte stream.
    ///
    /// Fails with a framing error if the stream ends before the declared
    /// payload length has been read.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let header = PackageHeader::parse_from_reader(reader)?;

        let mut payload = vec![0u8; header.payload_len as usize];
        if !payload.is_empty() {
            reader.read_exact(&mut payload).map_err(|e| read_error("Package payload reading", e))?;
        }

        let package = Self::from_parts(header, payload);
        debug!("Read package {}", package);
        Ok(package)
    }

    /// Parse the package at the front of `data`.
    ///
    /// Returns the package and the number of bytes it occupied; bytes after it
    /// are left untouched.
    pub fn parse(data: &[u8]) -> Result<(Self, usize)> {
        let header_data: &[u8; PACKAGE_HEADER_SIZE] = data
            .get(..PACKAGE_HEADER_SIZE)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| {
                TelemetryError::framing(
                    "Package header parsing",
                    format!("Need {} header bytes, have {}", PACKAGE_HEADER_SIZE, data.len()),
                )
            })?;
        let header = PackageHeader::parse(header_data)?;

        let end = PACKAGE_HEADER_SIZE + header.payload_len as usize;
        let payload = data.get(PACKAGE_HEADER_SIZE..end).ok_or_else(|| {
            TelemetryError::framing(
                "Package payload parsing",
                format!(
                    "Declared payload of {} bytes, only {} available",
                    header.payload_len,
                    data.len() - PACKAGE_HEADER_SIZE
                ),
            )
        })?;

        Ok((Self::from_parts(header, payload.to_vec()), end))
    }

    /// Parse the package at the front of `data`, ignoring anything after it.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::parse(data).map(|(package, _)| package)
    }

    pub(crate) fn from_parts(header: PackageHeader, payload: Vec<u8>) -> Self {
        Self {
            timestamp: header.timestamp,
            device_id: header.device_id,
            sensor_count: header.sensor_count,
            bits_per_sensor: header.bits_per_sensor,
            format: header.format,
            payload,
        }
    }

    pub fn header(&self) -> Result<PackageHeader> {
        let payload_len = u16::try_from(self.payload.len()).map_err(|_| {
            TelemetryError::framing(
                "Package encoding",
                format!(
                    "Payload of {} bytes exceeds the {} byte limit",
                    self.payload.len(),
                    MAX_PAYLOAD_LEN
                ),
            )
        })?;

        Ok(PackageHeader {
            timestamp: self.timestamp,
            device_id: self.device_id,
            sensor_count: self.sensor_count,
            bits_per_sensor: self.bits_per_sensor,
            format: self.format,
            payload_len,
        })
    }

    /// Write the package in wire layout.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.header()?.write_to(writer)?;
        if !self.payload.is_empty() {
            writer.write_all(&self.payload)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Wire layout as standard, padded base64 text.
    pub fn to_base64(&self) -> Result<String> {
        Ok(STANDARD.encode(self.to_bytes()?))
    }

    pub fn encoded_len(&self) -> usize {
        PACKAGE_HEADER_SIZE + self.payload.len()
    }

    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    pub fn time(&self) -> DateTime<Utc> {
        time_from_micros(self.timestamp)
    }

    /// Host behind a virtual device id.
    pub fn host_id(&self) -> Result<i32> {
        host_for_virtual_device(self.device_id)
    }

    /// Payload length implied by the sensor count and bit width, if the width
    /// is one of 2, 8, 16 or 32.
    pub fn expected_payload_len(&self) -> Option<usize> {
        let count = self.sensor_count as usize;
        match self.bits_per_sensor {
            2 => Some(count.div_ceil(4)),
            8 => Some(count),
            16 => Some(count * 2),
            32 => Some(count * 4),
            _ => None,
        }
    }

    /// Whether a raw sample payload is size-reduced relative to its header.
    ///
    /// Packages of any other format are never compressed.
    pub fn is_compressed(&self) -> bool {
        self.format == PackageFormat::Data
            && self.expected_payload_len().is_some_and(|len| len != self.payload.len())
    }

    /// Decode one sensor reading using the package's declared bit width.
    ///
    /// Sensors beyond the end of the payload read as NaN.
    pub fn sample(&self, sensor: u16) -> Result<f32> {
        let decode = sample_decoder(self.bits_per_sensor)?;
        Ok(decode(&self.payload, sensor))
    }

    /// Decode all declared sensor readings.
    pub fn samples(&self) -> Result<Vec<f32>> {
        let decode = sample_decoder(self.bits_per_sensor)?;
        Ok((0..self.sensor_count).map(|sensor| decode(&self.payload, sensor)).collect())
    }

    /// Decode an event-bearing payload into last-known-state maps.
    pub fn events(&self) -> Result<PackageEvents> {
        PackageEvents::parse(self.format, &self.payload)
    }

    /// Decode a full object-state snapshot.
    pub fn full_object_states(&self) -> Result<ObjectStates> {
        crate::snapshot::parse_full_object_states(self.format, &self.payload)
    }

    /// Decode a full failure-state snapshot.
    pub fn full_failure_states(&self) -> Result<FailureStates> {
        crate::snapshot::parse_full_failure_states(self.format, &self.payload)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DevId={},Format={},Time={}",
            self.device_id,
            self.format,
            format_rfc3339_nanos(&self.time())
        )
    }
}

fn read_error(context: &str, err: std::io::Error) -> TelemetryError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        TelemetryError::framing(context, format!("Stream ended early: {}", err))
    } else {
        TelemetryError::Io { source: err }
    }
}
