//! Versioned binary framing for the append-only audit store.
//!
//! Every struct is written as one frame:
//!
//! ```text
//! +----------+----------+-------------+------------------+
//! | struct_v | compat_v | len: u32 LE | payload (len B)  |
//! +----------+----------+-------------+------------------+
//! ```
//!
//! `struct_v` is the writer's version, `compat_v` the oldest reader version
//! that can still make sense of the payload. A reader that knows version
//! `n` decodes a nested frame with `struct_v > n` by reading the fields it
//! knows and skipping the rest of the payload; a frame with `compat_v > n`
//! is rejected. A scope record read on its own through
//! [`ScopeInfo::from_binary`] is stricter: any `struct_v` newer than the
//! reader fails with [`DecodeError::VersionMismatch`]. Nested inside another
//! record, it follows the nested-frame rule.
//!
//! Fields are only ever appended at the end of a version. Existing fields
//! are never reordered or repurposed.
//!
//! Primitives:
//!
//! - strings: `u32 LE` byte length, then UTF-8 bytes
//! - bool and presence bytes: one byte, `0` or `1`
//! - sequences: `u32 LE` element count, then the elements
//! - integers: fixed width, little-endian
//!
//! Lengths and counts are `u32`, so a single string, sequence or frame
//! payload is limited to `u32::MAX` bytes or elements. Larger values are
//! written as `u32::MAX` and fail to decode as [`DecodeError::Truncated`].

use crate::error::DecodeError;
use crate::scope::{ApplicationCredential, Domain, Project, ScopeInfo, User};

/// Size of a frame header in bytes.
pub const FRAME_HEADER_LEN: usize = 6;

/// Current version of the top-level scope record.
pub const SCOPE_INFO_VERSION: u8 = 1;

const DOMAIN_VERSION: u8 = 1;
const PROJECT_VERSION: u8 = 1;
const USER_VERSION: u8 = 1;
const APP_CRED_VERSION: u8 = 1;

/// Types that can be written as a binary frame.
pub trait Encode {
    /// Appends `self` to the encoder.
    fn encode(&self, enc: &mut Encoder);
}

/// Types that can be read back from a binary frame.
pub trait Decode: Sized {
    /// Reads one value from the decoder.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the input is truncated, malformed or too new.
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, DecodeError>;
}

/// Append-only byte writer.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    /// Creates an empty encoder.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Writes a frame header, runs `body`, then patches in the payload length.
    pub fn frame(&mut self, version: u8, compat: u8, body: impl FnOnce(&mut Encoder)) {
        self.buf.push(version);
        self.buf.push(compat);
        let len_at = self.buf.len();
        self.buf.extend_from_slice(&[0; 4]);

        body(self);

        let len = wire_len(self.buf.len() - len_at - 4);
        self.buf[len_at..len_at + 4].copy_from_slice(&len.to_le_bytes());
    }

    /// Writes a single byte.
    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Writes a bool as `0` or `1`.
    pub fn put_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    /// Writes a presence byte for an optional sub-record.
    pub fn put_presence(&mut self, present: bool) {
        self.put_bool(present);
    }

    /// Writes a little-endian `u16`.
    pub fn put_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian `u32`.
    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian `u64`.
    pub fn put_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn put_str(&mut self, value: &str) {
        self.put_u32(wire_len(value.len()));
        self.buf.extend_from_slice(value.as_bytes());
    }

    /// Writes a count-prefixed sequence of strings.
    pub fn put_strings(&mut self, values: &[String]) {
        self.put_u32(wire_len(values.len()));
        for value in values {
            self.put_str(value);
        }
    }

    /// Writes an optional sub-record: a presence byte, then the frame if any.
    pub fn put_optional<T: Encode>(&mut self, value: Option<&T>) {
        self.put_presence(value.is_some());
        if let Some(value) = value {
            value.encode(self);
        }
    }

    /// Returns the bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the encoder, returning the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

fn wire_len(len: usize) -> u32 {
    debug_assert!(
        u32::try_from(len).is_ok(),
        "length {len} exceeds the u32 wire limit"
    );
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Cursor over an encoded buffer.
#[derive(Debug)]
pub struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    /// Creates a decoder over `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.buf.len() {
            return Err(DecodeError::Truncated {
                needed: n,
                remaining: self.buf.len(),
            });
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Reads a single byte.
    pub fn get_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    /// Reads a bool, rejecting anything but `0` and `1`.
    pub fn get_bool(&mut self) -> Result<bool, DecodeError> {
        match self.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::malformed(format!("invalid bool byte {other}"))),
        }
    }

    /// Reads a presence byte, rejecting anything but `0` and `1`.
    pub fn get_presence(&mut self) -> Result<bool, DecodeError> {
        match self.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::malformed(format!(
                "invalid presence byte {other}"
            ))),
        }
    }

    /// Reads a little-endian `u16`.
    pub fn get_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    /// Reads a little-endian `u32`.
    pub fn get_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    /// Reads a little-endian `u64`.
    pub fn get_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn get_str(&mut self) -> Result<String, DecodeError> {
        let len = self.get_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| DecodeError::malformed("string is not valid utf-8"))
    }

    /// Reads a count-prefixed sequence of strings.
    pub fn get_strings(&mut self) -> Result<Vec<String>, DecodeError> {
        let count = self.get_u32()? as usize;
        // Every string costs at least its 4-byte length prefix.
        let mut values = Vec::with_capacity(count.min(self.remaining() / 4));
        for _ in 0..count {
            values.push(self.get_str()?);
        }
        Ok(values)
    }

    /// Reads an optional sub-record written by [`Encoder::put_optional`].
    pub fn get_optional<T: Decode>(&mut self) -> Result<Option<T>, DecodeError> {
        if self.get_presence()? {
            T::decode(self).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Reads a nested frame that may come from a newer writer.
    ///
    /// `body` receives a decoder limited to the frame payload and the
    /// writer's `struct_v`. Payload bytes left unread by a newer writer are
    /// skipped; left unread by a same-or-older writer they are an error.
    pub fn frame<T>(
        &mut self,
        supported: u8,
        body: impl FnOnce(&mut Decoder<'a>, u8) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        let (version, mut payload) = self.frame_header(supported)?;
        let value = body(&mut payload, version)?;

        if version <= supported && !payload.is_empty() {
            return Err(DecodeError::malformed(format!(
                "{} unread bytes in version {version} frame",
                payload.remaining()
            )));
        }
        Ok(value)
    }

    /// Reads a top-level frame, rejecting any version newer than `supported`.
    pub fn strict_frame<T>(
        &mut self,
        supported: u8,
        body: impl FnOnce(&mut Decoder<'a>, u8) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        self.expect_version(supported)?;
        self.frame(supported, body)
    }

    /// Checks the `struct_v` of the next frame without consuming it.
    ///
    /// # Errors
    ///
    /// [`DecodeError::VersionMismatch`] if the frame is newer than
    /// `supported`, [`DecodeError::Truncated`] on empty input.
    pub fn expect_version(&self, supported: u8) -> Result<(), DecodeError> {
        let version = *self.buf.first().ok_or(DecodeError::Truncated {
            needed: FRAME_HEADER_LEN,
            remaining: 0,
        })?;
        if version > supported {
            return Err(DecodeError::VersionMismatch {
                found: version,
                supported,
            });
        }
        Ok(())
    }

    fn frame_header(&mut self, supported: u8) -> Result<(u8, Decoder<'a>), DecodeError> {
        let version = self.get_u8()?;
        let compat = self.get_u8()?;
        let len = self.get_u32()? as usize;

        if compat > supported {
            return Err(DecodeError::VersionMismatch {
                found: compat,
                supported,
            });
        }
        let payload = self.take(len)?;
        Ok((version, Decoder::new(payload)))
    }

    /// Fails if any bytes are left over.
    pub fn finish(self) -> Result<(), DecodeError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::malformed(format!(
                "{} trailing bytes after record",
                self.remaining()
            )))
        }
    }
}

impl Encode for Domain {
    fn encode(&self, enc: &mut Encoder) {
        enc.frame(DOMAIN_VERSION, 1, |enc| {
            enc.put_str(&self.id);
            enc.put_str(&self.name);
        });
    }
}

impl Decode for Domain {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        dec.frame(DOMAIN_VERSION, |dec, _| {
            Ok(Domain {
                id: dec.get_str()?,
                name: dec.get_str()?,
            })
        })
    }
}

impl Encode for Project {
    fn encode(&self, enc: &mut Encoder) {
        enc.frame(PROJECT_VERSION, 1, |enc| {
            enc.put_str(&self.id);
            enc.put_str(&self.name);
            self.domain.encode(enc);
        });
    }
}

impl Decode for Project {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        dec.frame(PROJECT_VERSION, |dec, _| {
            Ok(Project {
                id: dec.get_str()?,
                name: dec.get_str()?,
                domain: Domain::decode(dec)?,
            })
        })
    }
}

impl Encode for User {
    fn encode(&self, enc: &mut Encoder) {
        enc.frame(USER_VERSION, 1, |enc| {
            enc.put_str(&self.id);
            enc.put_str(&self.name);
            self.domain.encode(enc);
        });
    }
}

impl Decode for User {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        dec.frame(USER_VERSION, |dec, _| {
            Ok(User {
                id: dec.get_str()?,
                name: dec.get_str()?,
                domain: Domain::decode(dec)?,
            })
        })
    }
}

impl Encode for ApplicationCredential {
    fn encode(&self, enc: &mut Encoder) {
        enc.frame(APP_CRED_VERSION, 1, |enc| {
            enc.put_str(&self.id);
            enc.put_str(&self.name);
            enc.put_bool(self.restricted);
        });
    }
}

impl Decode for ApplicationCredential {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        dec.frame(APP_CRED_VERSION, |dec, _| {
            Ok(ApplicationCredential {
                id: dec.get_str()?,
                name: dec.get_str()?,
                restricted: dec.get_bool()?,
            })
        })
    }
}

impl Encode for ScopeInfo {
    fn encode(&self, enc: &mut Encoder) {
        enc.frame(SCOPE_INFO_VERSION, 1, |enc| {
            self.project.encode(enc);
            enc.put_optional(self.user.as_ref());
            enc.put_strings(&self.roles);
            enc.put_optional(self.app_cred.as_ref());
        });
    }
}

impl Decode for ScopeInfo {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        dec.frame(SCOPE_INFO_VERSION, |dec, _| {
            Ok(ScopeInfo {
                project: Project::decode(dec)?,
                user: dec.get_optional()?,
                roles: dec.get_strings()?,
                app_cred: dec.get_optional()?,
            })
        })
    }
}

impl ScopeInfo {
    /// Encodes the record in the binary framing.
    ///
    /// # Example
    ///
    /// ```
    /// use scope_audit::{Project, ScopeInfo};
    ///
    /// let info = ScopeInfo::new(Project { id: "p1".to_string(), ..Default::default() });
    /// let bytes = info.to_binary();
    /// assert_eq!(ScopeInfo::from_binary(&bytes).unwrap(), info);
    /// ```
    pub fn to_binary(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        self.encode(&mut enc);
        enc.into_bytes()
    }

    /// Decodes exactly one record from `bytes`.
    ///
    /// # Errors
    ///
    /// [`DecodeError::VersionMismatch`] for records from a newer writer,
    /// [`DecodeError::Truncated`] when a length runs past the input, and
    /// [`DecodeError::Malformed`] for invalid bytes or trailing data.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut dec = Decoder::new(bytes);
        dec.expect_version(SCOPE_INFO_VERSION)?;
        let info = ScopeInfo::decode(&mut dec)?;
        dec.finish()?;
        Ok(info)
    }
}
