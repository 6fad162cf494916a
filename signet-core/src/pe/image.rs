//! Random-access view of a PE image: digesting, padding, and rewriting the
//! Certificate Table data directory (§4.1).

use std::io::Write as _;
use std::path::Path;

use tracing::{debug, debug_span};

use crate::error::{Result, SigningError};
use crate::hash::HashAlgorithm;
use crate::pe::checksum::compute_checksum;
use crate::pe::layout::{self, PeLayout, CERTIFICATE_TABLE_INDEX};

/// Owns the full image bytes and the offsets computed by
/// [`layout::locate`]; mutated only through `pad`, `write_data_directory`,
/// and the checksum refresh inside `close`.
#[derive(Debug)]
pub struct PeImage {
    bytes: Vec<u8>,
    layout: PeLayout,
}

fn read_directory_entry(bytes: &[u8], entry_offset: usize) -> (u32, u32) {
    let rva = u32::from_le_bytes(bytes[entry_offset..entry_offset + 4].try_into().unwrap());
    let size = u32::from_le_bytes(bytes[entry_offset + 4..entry_offset + 8].try_into().unwrap());
    (rva, size)
}

fn write_directory_entry(bytes: &mut [u8], entry_offset: usize, rva: u32, size: u32) {
    bytes[entry_offset..entry_offset + 4].copy_from_slice(&rva.to_le_bytes());
    bytes[entry_offset + 4..entry_offset + 8].copy_from_slice(&size.to_le_bytes());
}

impl PeImage {
    /// Read a PE file from disk and locate its digest-relevant offsets.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let layout = layout::locate(&bytes)?;
        Ok(Self { bytes, layout })
    }

    /// Remove any previously-embedded Certificate Table and zero its
    /// directory entry, so re-signing replaces rather than appends beside
    /// a prior signature (testable property: signing is idempotent in
    /// structure). A no-op if no table is present.
    pub fn strip_existing_certificate_table(&mut self) {
        let (rva, size) = read_directory_entry(&self.bytes, self.layout.certificate_dir_entry_offset);
        if size == 0 {
            return;
        }
        let table_start = rva as usize;
        if table_start < self.bytes.len() {
            debug!(table_start, size, "stripping prior certificate table");
            self.bytes.truncate(table_start);
        }
        write_directory_entry(&mut self.bytes, self.layout.certificate_dir_entry_offset, 0, 0);
    }

    /// Extend the file with zero bytes until its length is a multiple of
    /// `alignment`. A no-op if already aligned.
    pub fn pad(&mut self, alignment: usize) {
        let remainder = self.bytes.len() % alignment;
        if remainder != 0 {
            self.bytes.resize(self.bytes.len() + (alignment - remainder), 0);
        }
    }

    /// Authenticode digest of the file: every byte except the `CheckSum`
    /// field, the `IMAGE_DIRECTORY_ENTRY_SECURITY` directory entry, and
    /// (if present) the certificate table itself.
    pub fn compute_digest(&self, algorithm: HashAlgorithm) -> Vec<u8> {
        let _span = debug_span!("compute_digest", algorithm = algorithm.name()).entered();

        let checksum_start = self.layout.checksum_offset;
        let checksum_end = checksum_start + 4;
        let dir_entry_start = self.layout.certificate_dir_entry_offset;
        let dir_entry_end = dir_entry_start + 8;
        let (cert_rva, cert_size) = read_directory_entry(&self.bytes, dir_entry_start);
        let cert_range = if cert_size > 0 {
            Some(cert_rva as usize..(cert_rva as usize + cert_size as usize))
        } else {
            None
        };

        let mut buffer = Vec::with_capacity(self.bytes.len());
        buffer.extend_from_slice(&self.bytes[..checksum_start]);
        buffer.extend_from_slice(&self.bytes[checksum_end..dir_entry_start]);
        match &cert_range {
            Some(range) => {
                buffer.extend_from_slice(&self.bytes[dir_entry_end..range.start]);
                buffer.extend_from_slice(&self.bytes[range.end..]);
            }
            None => buffer.extend_from_slice(&self.bytes[dir_entry_end..]),
        }

        let digest = algorithm.digest(&buffer);
        debug!(bytes_digested = buffer.len(), "authenticode_digest");
        digest
    }

    /// Append `blob` to the file and point the `which`-th data directory
    /// entry at it. Callers in this crate only ever pass
    /// [`CERTIFICATE_TABLE_INDEX`]; for that directory the RVA field is a
    /// raw file offset, by Authenticode convention (every other directory
    /// entry's "RVA" really is a virtual address).
    pub fn write_data_directory(&mut self, which: usize, blob: &[u8]) -> Result<()> {
        if which != CERTIFICATE_TABLE_INDEX {
            return Err(SigningError::PeStructure(format!(
                "write_data_directory only supports the certificate table (index {CERTIFICATE_TABLE_INDEX}), got {which}"
            )));
        }
        self.pad(8);
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(blob);
        write_directory_entry(
            &mut self.bytes,
            self.layout.certificate_dir_entry_offset,
            offset as u32,
            blob.len() as u32,
        );
        debug!(offset, len = blob.len(), "write_data_directory(certificate_table)");
        Ok(())
    }

    /// Recompute the Optional Header `CheckSum` field in place.
    pub fn refresh_checksum(&mut self) {
        let sum = compute_checksum(&self.bytes, self.layout.checksum_offset);
        self.bytes[self.layout.checksum_offset..self.layout.checksum_offset + 4]
            .copy_from_slice(&sum.to_le_bytes());
    }

    /// Write the image to `path`, recomputing the checksum first unless
    /// `recompute_checksum` is false. Stages to a temporary file in the
    /// same directory and renames into place, so a crash mid-write leaves
    /// either the original file or the fully-signed one, never a partial
    /// write (§5, §9 atomicity note).
    pub fn close(mut self, path: &Path, recompute_checksum: bool) -> Result<()> {
        if recompute_checksum {
            self.refresh_checksum();
        }
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&self.bytes)?;
        tmp.flush()?;
        tmp.persist(path)
            .map_err(|e| SigningError::Io(e.error))?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
