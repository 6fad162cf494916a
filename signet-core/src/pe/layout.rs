//! File-offset arithmetic for the three Authenticode digest-skip regions.
//!
//! Signing needs to locate and later overwrite the `CheckSum` field and
//! the `IMAGE_DIRECTORY_ENTRY_SECURITY` directory entry in place, which
//! means it needs their file *offsets*, not just their values. A borrowed
//! PE-parsing crate like `goblin` exposes the latter but not the former,
//! so this module recomputes the offsets directly from the fixed
//! COFF/Optional-Header layout described by the PE/COFF specification.

use crate::error::{Result, SigningError};

const DOS_E_LFANEW_OFFSET: usize = 0x3c;
const PE_SIGNATURE_SIZE: usize = 4; // "PE\0\0"
const COFF_HEADER_SIZE: usize = 20;

const MAGIC_PE32: u16 = 0x10b;
const MAGIC_PE32_PLUS: u16 = 0x20b;

const SIZEOF_STANDARD_FIELDS_32: usize = 28;
const SIZEOF_STANDARD_FIELDS_64: usize = 24;
const SIZEOF_WINDOWS_FIELDS_32: usize = 68;
const SIZEOF_WINDOWS_FIELDS_64: usize = 88;

/// Offset of `CheckSum` within `WindowsFields`, counted from the start of
/// the windows-specific fields block (after the standard fields).
const CHECKSUM_OFFSET_IN_WINDOWS_FIELDS_32: usize = 36;
const CHECKSUM_OFFSET_IN_WINDOWS_FIELDS_64: usize = 40;

/// Index of `IMAGE_DIRECTORY_ENTRY_SECURITY` (the certificate table) in
/// the Data Directories array.
pub const CERTIFICATE_TABLE_INDEX: usize = 4;
const SIZEOF_DATA_DIRECTORY: usize = 8;

/// File offsets needed to perform the Authenticode digest and to rewrite
/// the certificate table directory entry.
#[derive(Debug, Clone, Copy)]
pub struct PeLayout {
    pub checksum_offset: usize,
    pub certificate_dir_entry_offset: usize,
}

/// Locate `checksum_offset` and `certificate_dir_entry_offset` in `image`.
/// Fails if the DOS stub, PE signature, or optional header magic don't
/// look like a PE image we understand.
pub fn locate(image: &[u8]) -> Result<PeLayout> {
    if image.len() < DOS_E_LFANEW_OFFSET + 4 {
        return Err(SigningError::PeStructure("file too small for a DOS header".into()));
    }
    let pe_sig_offset = u32::from_le_bytes(
        image[DOS_E_LFANEW_OFFSET..DOS_E_LFANEW_OFFSET + 4]
            .try_into()
            .unwrap(),
    ) as usize;

    let sig_end = pe_sig_offset
        .checked_add(PE_SIGNATURE_SIZE)
        .ok_or_else(|| SigningError::PeStructure("e_lfanew overflow".into()))?;
    if image.len() < sig_end || &image[pe_sig_offset..sig_end] != b"PE\0\0" {
        return Err(SigningError::PeStructure("missing PE signature".into()));
    }

    let optional_header_offset = sig_end + COFF_HEADER_SIZE;
    if image.len() < optional_header_offset + 2 {
        return Err(SigningError::PeStructure("truncated COFF header".into()));
    }
    let magic = u16::from_le_bytes(
        image[optional_header_offset..optional_header_offset + 2]
            .try_into()
            .unwrap(),
    );

    let (standard_fields_size, windows_fields_size, checksum_in_windows_fields) = match magic {
        MAGIC_PE32 => (
            SIZEOF_STANDARD_FIELDS_32,
            SIZEOF_WINDOWS_FIELDS_32,
            CHECKSUM_OFFSET_IN_WINDOWS_FIELDS_32,
        ),
        MAGIC_PE32_PLUS => (
            SIZEOF_STANDARD_FIELDS_64,
            SIZEOF_WINDOWS_FIELDS_64,
            CHECKSUM_OFFSET_IN_WINDOWS_FIELDS_64,
        ),
        other => {
            return Err(SigningError::PeStructure(format!(
                "unrecognised optional header magic {other:#06x}"
            )))
        }
    };

    let checksum_offset = optional_header_offset + standard_fields_size + checksum_in_windows_fields;
    let data_directories_offset = optional_header_offset + standard_fields_size + windows_fields_size;
    let certificate_dir_entry_offset =
        data_directories_offset + CERTIFICATE_TABLE_INDEX * SIZEOF_DATA_DIRECTORY;

    if image.len() < certificate_dir_entry_offset + SIZEOF_DATA_DIRECTORY {
        return Err(SigningError::PeStructure(
            "optional header data directories extend past end of file".into(),
        ));
    }

    Ok(PeLayout {
        checksum_offset,
        certificate_dir_entry_offset,
    })
}
