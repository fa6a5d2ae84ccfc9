//! Byte-level `ar` archive fixtures.
//!
//! Builds archives the way GNU and BSD `ar` lay them out, with control over
//! the header fields that the scrubber rewrites.

use crate::builder::scrub::{GLOBAL_HEADER, THIN_HEADER};

/// One member of an [`ArchiveFixture`].
#[derive(Debug, Clone)]
pub struct MemberFixture {
    name: String,
    data: Vec<u8>,
    size: usize,
    external: bool,
    date: u64,
    uid: u32,
    gid: u32,
}

impl MemberFixture {
    /// A member whose bytes are stored in the archive.
    pub fn new(name: &str, data: &[u8]) -> Self {
        MemberFixture {
            name: name.to_string(),
            data: data.to_vec(),
            size: data.len(),
            external: false,
            date: 0,
            uid: 0,
            gid: 0,
        }
    }

    /// A thin-archive member: the header records `size` but no bytes follow.
    pub fn external(name: &str, size: usize) -> Self {
        MemberFixture {
            name: name.to_string(),
            data: Vec::new(),
            size,
            external: true,
            date: 0,
            uid: 0,
            gid: 0,
        }
    }

    /// Set the mtime, uid and gid written into the header.
    pub fn stamped(mut self, date: u64, uid: u32, gid: u32) -> Self {
        self.date = date;
        self.uid = uid;
        self.gid = gid;
        self
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        let header = format!(
            "{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n",
            self.name, self.date, self.uid, self.gid, "100644", self.size
        );
        assert_eq!(header.len(), 60, "member header for `{}` overflows", self.name);
        out.extend_from_slice(header.as_bytes());

        if !self.external {
            out.extend_from_slice(&self.data);
            if self.data.len() % 2 == 1 {
                out.push(b'\n');
            }
        }
    }
}

/// An in-memory `ar` archive.
#[derive(Debug, Clone)]
pub struct ArchiveFixture {
    thin: bool,
    members: Vec<MemberFixture>,
}

impl ArchiveFixture {
    pub fn normal() -> Self {
        ArchiveFixture {
            thin: false,
            members: Vec::new(),
        }
    }

    pub fn thin() -> Self {
        ArchiveFixture {
            thin: true,
            members: Vec::new(),
        }
    }

    pub fn member(mut self, member: MemberFixture) -> Self {
        self.members.push(member);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(if self.thin { THIN_HEADER } else { GLOBAL_HEADER });
        for member in &self.members {
            member.write_to(&mut out);
        }
        out
    }
}
