//! Binary struct codec for index files.
//!
//! Every file written through [`StructWriter`] ends with a little-endian
//! CRC32 of all preceding bytes. [`StructReader::new`] loads the file and
//! validates that footer before any field is read, so a torn or tampered
//! file is reported as `Corrupted` up front.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher;

use crate::error::{LucerneError, Result};
use crate::storage::{StorageInput, StorageOutput};

const FOOTER_LEN: usize = 4;

/// Writes primitive values to a storage output.
#[derive(Debug)]
pub struct StructWriter<W: StorageOutput> {
    output: W,
    hasher: Hasher,
    position: u64,
}

impl<W: StorageOutput> StructWriter<W> {
    pub fn new(output: W) -> Self {
        StructWriter {
            output,
            hasher: Hasher::new(),
            position: 0,
        }
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.output.write_all(bytes)?;
        self.hasher.update(bytes);
        self.position += bytes.len() as u64;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.put(&[value])
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        let mut buf = [0u8; 4];
        (&mut buf[..]).write_u32::<LittleEndian>(value)?;
        self.put(&buf)
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        let mut buf = [0u8; 8];
        (&mut buf[..]).write_u64::<LittleEndian>(value)?;
        self.put(&buf)
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        let mut buf = [0u8; 8];
        (&mut buf[..]).write_f64::<LittleEndian>(value)?;
        self.put(&buf)
    }

    /// LEB128 variable-length unsigned integer.
    pub fn write_varint(&mut self, mut value: u64) -> Result<()> {
        let mut buf = [0u8; 10];
        let mut len = 0;
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                buf[len] = byte;
                len += 1;
                break;
            }
            buf[len] = byte | 0x80;
            len += 1;
        }
        self.put(&buf[..len])
    }

    /// Length-prefixed byte string.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_varint(bytes.len() as u64)?;
        self.put(bytes)
    }

    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_bytes(value.as_bytes())
    }

    /// Bytes written so far, excluding the footer.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Append the checksum footer, then sync and close the output.
    pub fn close(mut self) -> Result<()> {
        let checksum = self.hasher.clone().finalize();
        self.output.write_u32::<LittleEndian>(checksum)?;
        self.output.flush_and_sync()?;
        self.output.close()
    }
}

/// Reads primitive values written by [`StructWriter`].
#[derive(Debug)]
pub struct StructReader {
    cursor: Cursor<Vec<u8>>,
    len: u64,
}

impl StructReader {
    /// Load the whole input and verify its checksum footer.
    pub fn new<R: StorageInput>(mut input: R) -> Result<Self> {
        let mut data = Vec::with_capacity(input.size()? as usize);
        input.read_to_end(&mut data)?;

        if data.len() < FOOTER_LEN {
            return Err(LucerneError::corrupted(format!(
                "file too short for checksum footer ({} bytes)",
                data.len()
            )));
        }
        let body_len = data.len() - FOOTER_LEN;
        let stored = (&data[body_len..]).read_u32::<LittleEndian>()?;
        let actual = crc32fast::hash(&data[..body_len]);
        if stored != actual {
            return Err(LucerneError::corrupted(format!(
                "checksum mismatch: stored {stored:#010x}, computed {actual:#010x}"
            )));
        }
        data.truncate(body_len);

        Ok(StructReader {
            len: body_len as u64,
            cursor: Cursor::new(data),
        })
    }

    fn check_remaining(&self, needed: u64) -> Result<()> {
        if self.cursor.position() + needed > self.len {
            return Err(LucerneError::corrupted(format!(
                "unexpected end of data at offset {}",
                self.cursor.position()
            )));
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.check_remaining(1)?;
        Ok(self.cursor.read_u8()?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.check_remaining(4)?;
        Ok(self.cursor.read_u32::<LittleEndian>()?)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.check_remaining(8)?;
        Ok(self.cursor.read_u64::<LittleEndian>()?)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.check_remaining(8)?;
        Ok(self.cursor.read_f64::<LittleEndian>()?)
    }

    pub fn read_varint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        let mut shift = 0;
        loop {
            let byte = self.read_u8()?;
            if shift >= 64 {
                return Err(LucerneError::corrupted("varint overflows u64"));
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_varint()?;
        self.check_remaining(len)?;
        let mut buf = vec![0u8; len as usize];
        self.cursor.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes)
            .map_err(|e| LucerneError::corrupted(format!("invalid UTF-8 string: {e}")))
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn is_eof(&self) -> bool {
        self.cursor.position() >= self.len
    }
}
