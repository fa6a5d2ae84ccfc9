//! Post-processing of `ar` archives for reproducible output.
//!
//! Archivers stamp every member header with a modification time, owner uid
//! and group id. Two otherwise identical builds on different machines
//! therefore produce different bytes. [`ArchiveScrubber`] rewrites those
//! header fields to a fixed value so the archive depends only on its inputs.
//!
//! Member header layout (60 bytes):
//!
//! | offset | len | field |
//! |-------:|----:|-------|
//! | 0  | 16 | name  |
//! | 16 | 12 | mtime |
//! | 28 | 6  | uid   |
//! | 34 | 6  | gid   |
//! | 40 | 8  | mode  |
//! | 48 | 10 | size  |
//! | 58 | 2  | "`\n" |

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const GLOBAL_HEADER: &[u8; 8] = b"!<arch>\n";
pub const THIN_HEADER: &[u8; 8] = b"!<thin>\n";
pub const MEMBER_HEADER_LEN: usize = 60;
const MEMBER_TRAILER: &[u8; 2] = b"`\n";

const DATE_FIELD: (usize, usize) = (16, 12);
const UID_FIELD: (usize, usize) = (28, 6);
const GID_FIELD: (usize, usize) = (34, 6);
const SIZE_FIELD: (usize, usize) = (48, 10);

/// Error scrubbing an archive.
#[derive(Debug, Error)]
pub enum ScrubError {
    #[error("not an ar archive (bad magic)")]
    BadMagic,

    #[error("truncated archive: member header at offset {offset} is incomplete")]
    TruncatedHeader { offset: usize },

    #[error("corrupt member header at offset {offset}: missing terminator")]
    BadTrailer { offset: usize },

    #[error("corrupt member header at offset {offset}: invalid size field `{value}`")]
    BadSize { offset: usize, value: String },

    #[error("truncated archive: member at offset {offset} claims {size} bytes")]
    TruncatedMember { offset: usize, size: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where padding goes when a number is shorter than its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaddingStyle {
    /// Spaces before the digits (right-aligned).
    Left,
    /// Spaces after the digits (left-aligned).
    Right,
}

/// Zeroes the date, uid and gid of every member header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveScrubber {
    padding: PaddingStyle,
}

impl ArchiveScrubber {
    pub fn date_uid_gid(padding: PaddingStyle) -> Self {
        ArchiveScrubber { padding }
    }

    pub fn padding(&self) -> PaddingStyle {
        self.padding
    }

    /// Scrub the archive at `path` in place.
    pub fn scrub_file(&self, path: &Path) -> Result<(), ScrubError> {
        let mut data = fs::read(path)?;
        self.scrub_bytes(&mut data)?;
        fs::write(path, &data)?;
        Ok(())
    }

    /// Scrub an in-memory archive.
    pub fn scrub_bytes(&self, data: &mut [u8]) -> Result<(), ScrubError> {
        let thin = if data.starts_with(GLOBAL_HEADER) {
            false
        } else if data.starts_with(THIN_HEADER) {
            true
        } else {
            return Err(ScrubError::BadMagic);
        };

        let mut offset = GLOBAL_HEADER.len();
        while offset < data.len() {
            if offset + MEMBER_HEADER_LEN > data.len() {
                return Err(ScrubError::TruncatedHeader { offset });
            }

            let header = &mut data[offset..offset + MEMBER_HEADER_LEN];
            if &header[58..60] != MEMBER_TRAILER {
                return Err(ScrubError::BadTrailer { offset });
            }

            let size = parse_size(header, offset)?;
            let stores_data = !thin || is_index_member(&header[..16]);

            self.write_zero(header, DATE_FIELD);
            self.write_zero(header, UID_FIELD);
            self.write_zero(header, GID_FIELD);

            offset += MEMBER_HEADER_LEN;
            if stores_data {
                if offset + size > data.len() {
                    return Err(ScrubError::TruncatedMember {
                        offset: offset - MEMBER_HEADER_LEN,
                        size,
                    });
                }
                offset += size + size % 2;
            }
        }

        Ok(())
    }

    fn write_zero(&self, header: &mut [u8], (start, len): (usize, usize)) {
        let field = &mut header[start..start + len];
        field.fill(b' ');
        match self.padding {
            PaddingStyle::Left => field[len - 1] = b'0',
            PaddingStyle::Right => field[0] = b'0',
        }
    }
}

fn parse_size(header: &[u8], offset: usize) -> Result<usize, ScrubError> {
    let (start, len) = SIZE_FIELD;
    let raw = String::from_utf8_lossy(&header[start..start + len]).into_owned();
    raw.trim().parse::<usize>().map_err(|_| ScrubError::BadSize {
        offset,
        value: raw.trim_end().to_string(),
    })
}

/// Thin archives still embed the symbol table and the long-name table.
fn is_index_member(name: &[u8]) -> bool {
    let name = String::from_utf8_lossy(name);
    matches!(name.trim_end(), "/" | "//" | "/SYM64/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ArchiveFixture, MemberFixture};

    fn field(data: &[u8], member_offset: usize, (start, len): (usize, usize)) -> String {
        String::from_utf8_lossy(&data[member_offset + start..member_offset + start + len])
            .into_owned()
    }

    #[test]
    fn test_scrub_zeroes_date_uid_gid() {
        let mut data = ArchiveFixture::normal()
            .member(MemberFixture::new("a.o/", b"abc").stamped(1_700_000_000, 1000, 100))
            .member(MemberFixture::new("b.o/", b"defg").stamped(1_700_000_123, 501, 20))
            .build();

        ArchiveScrubber::date_uid_gid(PaddingStyle::Right)
            .scrub_bytes(&mut data)
            .unwrap();

        // a.o has odd size, so the next header follows a pad byte
        let second = 8 + 60 + 4;
        for offset in [8, second] {
            assert_eq!(field(&data, offset, DATE_FIELD), "0           ");
            assert_eq!(field(&data, offset, UID_FIELD), "0     ");
            assert_eq!(field(&data, offset, GID_FIELD), "0     ");
        }
        // Mode and payload untouched
        assert_eq!(field(&data, 8, (40, 8)), "100644  ");
        assert_eq!(&data[8 + 60..8 + 63], b"abc");
    }

    #[test]
    fn test_left_padding() {
        let mut data = ArchiveFixture::normal()
            .member(MemberFixture::new("a.o/", b"ab").stamped(42, 7, 7))
            .build();

        ArchiveScrubber::date_uid_gid(PaddingStyle::Left)
            .scrub_bytes(&mut data)
            .unwrap();

        assert_eq!(field(&data, 8, DATE_FIELD), "           0");
        assert_eq!(field(&data, 8, UID_FIELD), "     0");
    }

    #[test]
    fn test_scrub_is_idempotent_and_canonical() {
        let scrubber = ArchiveScrubber::date_uid_gid(PaddingStyle::Right);

        let mut first = ArchiveFixture::normal()
            .member(MemberFixture::new("a.o/", b"same").stamped(1, 2, 3))
            .build();
        let mut second = ArchiveFixture::normal()
            .member(MemberFixture::new("a.o/", b"same").stamped(999_999, 64, 65))
            .build();
        assert_ne!(first, second);

        scrubber.scrub_bytes(&mut first).unwrap();
        scrubber.scrub_bytes(&mut second).unwrap();
        assert_eq!(first, second);

        let once = first.clone();
        scrubber.scrub_bytes(&mut first).unwrap();
        assert_eq!(first, once);
    }

    #[test]
    fn test_thin_archive_members_have_no_data() {
        let mut data = ArchiveFixture::thin()
            .member(MemberFixture::new("/", &[0, 0, 0, 0]).stamped(5, 5, 5))
            .member(MemberFixture::new("//", b"obj/long_name.o/\n").stamped(5, 5, 5))
            .member(MemberFixture::external("/0", 4096).stamped(5, 5, 5))
            .member(MemberFixture::external("b.o/", 1234).stamped(5, 5, 5))
            .build();

        ArchiveScrubber::date_uid_gid(PaddingStyle::Right)
            .scrub_bytes(&mut data)
            .unwrap();

        let symtab = 8;
        let names = symtab + 60 + 4;
        let first_ext = names + 60 + 18;
        let second_ext = first_ext + 60;
        assert_eq!(data.len(), second_ext + 60);
        for offset in [symtab, names, first_ext, second_ext] {
            assert_eq!(field(&data, offset, DATE_FIELD), "0           ");
        }
    }

    #[test]
    fn test_empty_archive() {
        let mut data = GLOBAL_HEADER.to_vec();
        ArchiveScrubber::date_uid_gid(PaddingStyle::Right)
            .scrub_bytes(&mut data)
            .unwrap();
        assert_eq!(data, GLOBAL_HEADER.to_vec());
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut data = b"not an archive".to_vec();
        assert!(matches!(
            ArchiveScrubber::date_uid_gid(PaddingStyle::Right).scrub_bytes(&mut data),
            Err(ScrubError::BadMagic)
        ));
    }

    #[test]
    fn test_rejects_truncated_member() {
        let mut data = ArchiveFixture::normal()
            .member(MemberFixture::new("a.o/", b"abcdef"))
            .build();
        data.truncate(data.len() - 3);

        assert!(matches!(
            ArchiveScrubber::date_uid_gid(PaddingStyle::Right).scrub_bytes(&mut data),
            Err(ScrubError::TruncatedMember { offset: 8, size: 6 })
        ));
    }

    #[test]
    fn test_rejects_truncated_header() {
        let mut data = ArchiveFixture::normal()
            .member(MemberFixture::new("a.o/", b"ab"))
            .build();
        data.extend_from_slice(b"partial header");

        assert!(matches!(
            ArchiveScrubber::date_uid_gid(PaddingStyle::Right).scrub_bytes(&mut data),
            Err(ScrubError::TruncatedHeader { .. })
        ));
    }

    #[test]
    fn test_scrub_file_in_place() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("libfoo.a");
        std::fs::write(
            &path,
            ArchiveFixture::normal()
                .member(MemberFixture::new("a.o/", b"xy").stamped(77, 1, 1))
                .build(),
        )
        .unwrap();

        ArchiveScrubber::date_uid_gid(PaddingStyle::Right)
            .scrub_file(&path)
            .unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(field(&data, 8, DATE_FIELD), "0           ");
    }
}
