//! Store Snapshots
//!
//! Point-in-time image of a vector store, split into two co-located files.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// Vector file format:
/// - Magic: 4 bytes "VMXV"
/// - Version: 1 byte
/// - Generation: 8 bytes
/// - Saved at: 8 bytes (unix millis)
/// - Dimension: 4 bytes
/// - Count: 8 bytes
/// - Vectors: count * dimension little-endian f32, row-major
///
/// Metadata file format:
/// - Magic: 4 bytes "VMXM"
/// - Version: 1 byte
/// - Generation: 8 bytes
/// - Count: 8 bytes
/// - External ids: count little-endian i64, slot order
const VECTOR_MAGIC: &[u8; 4] = b"VMXV";
const METADATA_MAGIC: &[u8; 4] = b"VMXM";
const FORMAT_VERSION: u8 = 1;

const VECTOR_HEADER_LEN: usize = 4 + 1 + 8 + 8 + 4 + 8;
const METADATA_HEADER_LEN: usize = 4 + 1 + 8 + 8;

/// Borrowed view of the state being written
#[derive(Debug, Clone, Copy)]
pub struct SnapshotView<'a> {
    pub generation: u64,
    pub dimension: usize,
    /// Row-major `count * dimension` floats
    pub vectors: &'a [f32],
    pub external_ids: &'a [i64],
}

/// Snapshot read back from disk
#[derive(Debug, Clone)]
pub struct LoadedSnapshot {
    pub generation: u64,
    pub saved_at_ms: i64,
    pub dimension: usize,
    pub vectors: Vec<f32>,
    pub external_ids: Vec<i64>,
}

impl LoadedSnapshot {
    pub fn count(&self) -> usize {
        self.external_ids.len()
    }
}

/// Which of the two artifacts exist on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotPresence {
    Missing,
    Complete,
    /// Exactly one of the two files exists
    Partial,
}

/// Path of the metadata file paired with a vector file: the full file name
/// plus `.meta`, so `a.vdx` and `a.bin` never share metadata.
pub fn metadata_path(path: &Path) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(".meta");
    PathBuf::from(s)
}

pub fn presence(path: &Path) -> SnapshotPresence {
    match (path.exists(), metadata_path(path).exists()) {
        (true, true) => SnapshotPresence::Complete,
        (false, false) => SnapshotPresence::Missing,
        _ => SnapshotPresence::Partial,
    }
}

/// Write both artifacts, each via temp file + fsync + rename.
///
/// Metadata goes first; a crash between the two renames leaves files with
/// different generations, which `read` reports as corrupt.
pub fn write(path: &Path, view: SnapshotView<'_>) -> Result<()> {
    let count = view.external_ids.len();
    if view.vectors.len() != count * view.dimension {
        return Err(Error::corrupt(
            path,
            format!(
                "in-memory shape mismatch: {} floats for {} x {}",
                view.vectors.len(),
                count,
                view.dimension
            ),
        ));
    }

    let saved_at_ms = chrono::Utc::now().timestamp_millis();

    let mut meta = BytesMut::with_capacity(METADATA_HEADER_LEN + count * 8);
    meta.put_slice(METADATA_MAGIC);
    meta.put_u8(FORMAT_VERSION);
    meta.put_u64_le(view.generation);
    meta.put_u64_le(count as u64);
    for &id in view.external_ids {
        meta.put_i64_le(id);
    }

    let mut data = BytesMut::with_capacity(VECTOR_HEADER_LEN + view.vectors.len() * 4);
    data.put_slice(VECTOR_MAGIC);
    data.put_u8(FORMAT_VERSION);
    data.put_u64_le(view.generation);
    data.put_i64_le(saved_at_ms);
    data.put_u32_le(view.dimension as u32);
    data.put_u64_le(count as u64);
    for &x in view.vectors {
        data.put_f32_le(x);
    }

    write_atomic(&metadata_path(path), &meta)?;
    write_atomic(path, &data)?;

    debug!(
        "Wrote snapshot {:?} (generation={}, vectors={})",
        path, view.generation, count
    );
    Ok(())
}

/// Read and cross-check both artifacts.
pub fn read(path: &Path) -> Result<LoadedSnapshot> {
    let meta_path = metadata_path(path);
    let data = Bytes::from(fs::read(path)?);
    let meta = Bytes::from(fs::read(&meta_path)?);

    let (generation, saved_at_ms, dimension, vectors) = decode_vectors(path, data)?;
    let (meta_generation, external_ids) = decode_metadata(&meta_path, meta)?;

    if meta_generation != generation {
        return Err(Error::corrupt(
            path,
            format!(
                "generation mismatch: vectors at {}, metadata at {}",
                generation, meta_generation
            ),
        ));
    }

    let count = vectors.len() / dimension;
    if external_ids.len() != count {
        return Err(Error::corrupt(
            path,
            format!(
                "count mismatch: {} vectors, {} metadata entries",
                count,
                external_ids.len()
            ),
        ));
    }

    Ok(LoadedSnapshot {
        generation,
        saved_at_ms,
        dimension,
        vectors,
        external_ids,
    })
}

fn decode_vectors(path: &Path, mut buf: Bytes) -> Result<(u64, i64, usize, Vec<f32>)> {
    if buf.len() < VECTOR_HEADER_LEN {
        return Err(Error::corrupt(path, "truncated vector header"));
    }
    if &buf[..4] != VECTOR_MAGIC {
        return Err(Error::corrupt(path, "invalid vector file magic"));
    }
    buf.advance(4);

    let version = buf.get_u8();
    if version != FORMAT_VERSION {
        return Err(Error::corrupt(
            path,
            format!("unsupported format version: {}", version),
        ));
    }

    let generation = buf.get_u64_le();
    let saved_at_ms = buf.get_i64_le();
    let dimension = buf.get_u32_le() as usize;
    let count = buf.get_u64_le();

    if dimension == 0 {
        return Err(Error::corrupt(path, "zero dimension"));
    }

    let floats = usize::try_from(count)
        .ok()
        .and_then(|n| n.checked_mul(dimension))
        .ok_or_else(|| Error::corrupt(path, format!("implausible vector count {}", count)))?;
    let expected = floats
        .checked_mul(4)
        .ok_or_else(|| Error::corrupt(path, format!("implausible vector count {}", count)))?;
    if buf.remaining() != expected {
        return Err(Error::corrupt(
            path,
            format!(
                "payload is {} bytes, header promises {} ({} x {})",
                buf.remaining(),
                expected,
                count,
                dimension
            ),
        ));
    }

    let mut vectors = Vec::with_capacity(floats);
    for _ in 0..floats {
        vectors.push(buf.get_f32_le());
    }

    Ok((generation, saved_at_ms, dimension, vectors))
}

fn decode_metadata(path: &Path, mut buf: Bytes) -> Result<(u64, Vec<i64>)> {
    if buf.len() < METADATA_HEADER_LEN {
        return Err(Error::corrupt(path, "truncated metadata header"));
    }
    if &buf[..4] != METADATA_MAGIC {
        return Err(Error::corrupt(path, "invalid metadata file magic"));
    }
    buf.advance(4);

    let version = buf.get_u8();
    if version != FORMAT_VERSION {
        return Err(Error::corrupt(
            path,
            format!("unsupported format version: {}", version),
        ));
    }

    let generation = buf.get_u64_le();
    let count = buf.get_u64_le();

    let expected = usize::try_from(count)
        .ok()
        .and_then(|n| n.checked_mul(8))
        .ok_or_else(|| Error::corrupt(path, format!("implausible entry count {}", count)))?;
    if buf.remaining() != expected {
        return Err(Error::corrupt(
            path,
            format!(
                "payload is {} bytes, header promises {} entries",
                buf.remaining(),
                count
            ),
        ));
    }

    let mut ids = Vec::with_capacity(count as usize);
    while buf.has_remaining() {
        ids.push(buf.get_i64_le());
    }

    Ok((generation, ids))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(".tmp");
    PathBuf::from(s)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = tmp_path(path);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> (Vec<f32>, Vec<i64>) {
        (
            vec![1.0, 2.0, 3.0, -0.5, f32::MIN_POSITIVE, 1e-30],
            vec![10, 20],
        )
    }

    #[test]
    fn test_snapshot_write_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.vdx");
        let (vectors, ids) = sample();

        write(
            &path,
            SnapshotView {
                generation: 7,
                dimension: 3,
                vectors: &vectors,
                external_ids: &ids,
            },
        )
        .unwrap();

        assert_eq!(presence(&path), SnapshotPresence::Complete);
        assert!(!tmp_path(&path).exists());

        let loaded = read(&path).unwrap();
        assert_eq!(loaded.generation, 7);
        assert_eq!(loaded.dimension, 3);
        assert_eq!(loaded.count(), 2);
        assert_eq!(loaded.external_ids, ids);
        let bits: Vec<u32> = loaded.vectors.iter().map(|x| x.to_bits()).collect();
        let expected: Vec<u32> = vectors.iter().map(|x| x.to_bits()).collect();
        assert_eq!(bits, expected);
    }

    #[test]
    fn test_metadata_path() {
        assert_eq!(
            metadata_path(Path::new("/data/index.vdx")),
            PathBuf::from("/data/index.vdx.meta")
        );
        assert_ne!(
            metadata_path(Path::new("/data/a.vdx")),
            metadata_path(Path::new("/data/a.bin"))
        );
        assert_eq!(
            metadata_path(Path::new("/data/index")),
            PathBuf::from("/data/index.meta")
        );
    }

    #[test]
    fn test_stores_differing_only_by_extension_stay_apart() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.vdx");
        let b = dir.path().join("a.bin");
        let (vectors, ids) = sample();
        let view = SnapshotView {
            generation: 1,
            dimension: 3,
            vectors: &vectors,
            external_ids: &ids,
        };
        write(&a, view).unwrap();
        write(
            &b,
            SnapshotView {
                vectors: &vectors[..3],
                external_ids: &ids[..1],
                ..view
            },
        )
        .unwrap();

        assert_eq!(read(&a).unwrap().external_ids, vec![10, 20]);
        assert_eq!(read(&b).unwrap().external_ids, vec![10]);
    }

    #[test]
    fn test_truncated_vector_file_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.vdx");
        let (vectors, ids) = sample();
        write(
            &path,
            SnapshotView {
                generation: 1,
                dimension: 3,
                vectors: &vectors,
                external_ids: &ids,
            },
        )
        .unwrap();

        let raw = fs::read(&path).unwrap();
        fs::write(&path, &raw[..raw.len() - 2]).unwrap();

        assert!(matches!(read(&path), Err(Error::CorruptStore { .. })));
    }

    #[test]
    fn test_stale_metadata_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.vdx");
        let (vectors, ids) = sample();
        let view = SnapshotView {
            generation: 1,
            dimension: 3,
            vectors: &vectors,
            external_ids: &ids,
        };
        write(&path, view).unwrap();
        let old_meta = fs::read(metadata_path(&path)).unwrap();

        write(
            &path,
            SnapshotView {
                generation: 2,
                ..view
            },
        )
        .unwrap();
        fs::write(metadata_path(&path), old_meta).unwrap();

        let err = read(&path).unwrap_err();
        assert!(matches!(err, Error::CorruptStore { .. }));
        assert!(err.to_string().contains("generation mismatch"));
    }

    #[test]
    fn test_count_mismatch_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.vdx");
        let other = dir.path().join("other.vdx");
        let (vectors, ids) = sample();

        // Same generation on both sides, but the metadata carries one extra id
        write(
            &path,
            SnapshotView {
                generation: 4,
                dimension: 3,
                vectors: &vectors,
                external_ids: &ids,
            },
        )
        .unwrap();
        write(
            &other,
            SnapshotView {
                generation: 4,
                dimension: 2,
                vectors: &vectors,
                external_ids: &[10, 20, 30],
            },
        )
        .unwrap();
        fs::copy(metadata_path(&other), metadata_path(&path)).unwrap();

        let err = read(&path).unwrap_err();
        assert!(matches!(err, Error::CorruptStore { .. }));
        assert!(err.to_string().contains("count mismatch"));
    }

    #[test]
    fn test_bad_magic_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.vdx");
        fs::write(&path, vec![0u8; VECTOR_HEADER_LEN]).unwrap();
        fs::write(metadata_path(&path), vec![0u8; METADATA_HEADER_LEN]).unwrap();

        assert!(matches!(read(&path), Err(Error::CorruptStore { .. })));
    }

    #[test]
    fn test_partial_presence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.vdx");
        assert_eq!(presence(&path), SnapshotPresence::Missing);

        fs::write(&path, b"x").unwrap();
        assert_eq!(presence(&path), SnapshotPresence::Partial);
    }
}
