//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use flate2::Crc;
use vpkfs::archive::{HEADER_LEN_V1, HEADER_LEN_V2, INLINE_CHUNK, RECORD_LEN, SIGNATURE};

/// Where a file's bytes (after the preload) are stored.
#[derive(Clone, Copy)]
pub enum Placement {
    /// Appended to the numbered chunk.
    Chunk(u16),
    /// Appended after the tree in the directory file.
    ///
    /// Inline offsets count from the tree size, so the encoded offset
    /// includes the header length.
    Inline,
}

struct File {
    ext: String,
    dir: String,
    name: String,
    crc: u32,
    preload: Vec<u8>,
    chunk: u16,
    offset: u32,
    length: u32,
}

/// Builds VPK archives on disk.
pub struct VpkBuilder {
    version: u32,
    files: Vec<File>,
    chunks: BTreeMap<u16, Vec<u8>>,
    inline: Vec<u8>,
}

impl VpkBuilder {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            files: Vec::new(),
            chunks: BTreeMap::new(),
            inline: Vec::new(),
        }
    }

    /// Add `/dir/name.ext` whose content is `preload` followed by `data`.
    pub fn file(mut self, path: &str, preload: &[u8], data: &[u8], placement: Placement) -> Self {
        let (dir, file_name) = match path.trim_start_matches('/').rsplit_once('/') {
            Some((dir, name)) => (dir.to_string(), name),
            None => (" ".to_string(), path.trim_start_matches('/')),
        };
        let (name, ext) = match file_name.rsplit_once('.') {
            Some((name, ext)) => (name.to_string(), ext.to_string()),
            None => (file_name.to_string(), " ".to_string()),
        };

        let mut crc = Crc::new();
        crc.update(preload);
        crc.update(data);

        let (chunk, buffer) = match placement {
            Placement::Chunk(index) => (index, self.chunks.entry(index).or_default()),
            Placement::Inline => (INLINE_CHUNK, &mut self.inline),
        };
        let offset = buffer.len() as u32;
        buffer.extend_from_slice(data);

        self.files.push(File {
            ext,
            dir,
            name,
            crc: crc.sum(),
            preload: preload.to_vec(),
            chunk,
            offset,
            length: data.len() as u32,
        });
        self
    }

    /// Encode the directory file: header, tree, then inline data.
    ///
    /// Mirrors the in-crate archive fixture encoder; keep the two in step.
    pub fn directory_bytes(&self) -> Vec<u8> {
        let header_len = if self.version == 1 { HEADER_LEN_V1 } else { HEADER_LEN_V2 };
        let mut tree = Vec::new();
        let mut exts: Vec<&str> = Vec::new();
        for f in &self.files {
            if !exts.contains(&f.ext.as_str()) {
                exts.push(&f.ext);
            }
        }
        for ext in exts {
            push_str(&mut tree, ext);
            let mut dirs: Vec<&str> = Vec::new();
            for f in self.files.iter().filter(|f| f.ext == ext) {
                if !dirs.contains(&f.dir.as_str()) {
                    dirs.push(&f.dir);
                }
            }
            for dir in dirs {
                push_str(&mut tree, dir);
                for f in self.files.iter().filter(|f| f.ext == ext && f.dir == dir) {
                    push_str(&mut tree, &f.name);
                    let offset = if f.chunk == INLINE_CHUNK {
                        f.offset + header_len as u32
                    } else {
                        f.offset
                    };
                    let record_start = tree.len();
                    tree.extend_from_slice(&f.crc.to_le_bytes());
                    tree.extend_from_slice(&(f.preload.len() as u16).to_le_bytes());
                    tree.extend_from_slice(&f.chunk.to_le_bytes());
                    tree.extend_from_slice(&offset.to_le_bytes());
                    tree.extend_from_slice(&f.length.to_le_bytes());
                    debug_assert_eq!(tree.len() - record_start, RECORD_LEN);
                    tree.extend_from_slice(&f.preload);
                }
                tree.push(0);
            }
            tree.push(0);
        }
        tree.push(0);

        let mut out = Vec::new();
        out.extend_from_slice(&SIGNATURE.to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&(tree.len() as u32).to_le_bytes());
        if self.version == 2 {
            out.extend_from_slice(&(self.inline.len() as u32).to_le_bytes());
            out.extend_from_slice(&[0u8; 12]);
        }
        out.extend_from_slice(&tree);
        out.extend_from_slice(&self.inline);
        out
    }

    /// Write `<base>_dir.vpk` and every `<base>_NNN.vpk` into `dir`.
    pub fn write_multi(&self, dir: &Path, base: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(format!("{}_dir.vpk", base)), self.directory_bytes()).unwrap();
        for (index, data) in &self.chunks {
            std::fs::write(dir.join(format!("{}_{:03}.vpk", base, index)), data).unwrap();
        }
    }

    /// Write a single-file archive. Only inline placement is meaningful here.
    pub fn write_single(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, self.directory_bytes()).unwrap();
    }
}

fn push_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
    out.push(0);
}

/// Write a text file, creating parent directories.
pub fn write(path: &Path, contents: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// `/`-delimited form of a path for the storage backends.
pub fn slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
