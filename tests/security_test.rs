use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use safe_pack::{CompressOptions, Error, FsPath};
use tempfile::tempdir;
use zip::write::SimpleFileOptions;

// ============================================================================
// Helper Functions
// ============================================================================

/// Write a zip at `path` containing `files` in the given order.
fn write_zip(path: &Path, files: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in files {
        zip.start_file(*name, options.clone()).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
}

/// Build a tar header whose raw name bytes are `name`.
///
/// The tar crate's set_path() blocks ".." and absolute paths, so the name is
/// patched into the header bytes directly.
fn raw_header(name: &str, size: u64) -> tar::Header {
    let mut header = tar::Header::new_gnu();
    header.set_path("placeholder").unwrap();
    header.set_size(size);
    header.set_mode(0o644);

    let raw = name.as_bytes();
    header.as_mut_bytes()[..100].fill(0);
    header.as_mut_bytes()[..raw.len()].copy_from_slice(raw);

    header.set_cksum();
    header
}

/// Write a tar.gz at `path` whose entries carry raw (unchecked) names.
fn write_raw_tar_gz(path: &Path, files: &[(&str, &[u8])]) {
    let encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, content) in files {
        let header = raw_header(name, content.len() as u64);
        builder.append(&header, *content).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

// ============================================================================
// Path traversal
// ============================================================================

#[test]
fn test_zip_blocks_traversal() {
    let tmp = tempdir().unwrap();
    let archive_path = tmp.path().join("evil.zip");
    write_zip(
        &archive_path,
        &[("safe.txt", b"safe content"), ("../../evil.txt", b"evil content")],
    );

    let archive = FsPath::new(&archive_path).unwrap();
    let out = tmp.path().join("dest");
    let result = safe_pack::extract_zip(&archive, &out, CompressOptions::default());

    match result {
        Err(Error::IllegalPath { entry, .. }) => {
            println!("✅ Successfully blocked traversal: {}", entry);
            assert_eq!(entry, "../../evil.txt");
        }
        Ok(_) => panic!("❌ SECURITY FAIL: Malicious file was extracted!"),
        Err(e) => panic!("❌ Unexpected error type: {:?}", e),
    }

    // dest/evil/../../evil.txt would land in the temp root
    assert!(!tmp.path().join("evil.txt").exists());
    // No rollback: the entry before the bad one stays
    assert!(out.join("evil/safe.txt").exists());
}

#[test]
fn test_tar_gz_blocks_traversal() {
    let tmp = tempdir().unwrap();
    let archive_path = tmp.path().join("evil.tar.gz");
    write_raw_tar_gz(&archive_path, &[("../../etc_passwd", b"evil")]);

    let archive = FsPath::new(&archive_path).unwrap();
    let out = tmp.path().join("dest");
    let result = safe_pack::extract_tar_gz(&archive, &out, CompressOptions::default());

    assert!(
        matches!(result, Err(Error::IllegalPath { ref entry, .. }) if entry == "../../etc_passwd"),
        "got {:?}",
        result
    );
    assert!(!tmp.path().join("etc_passwd").exists());
}

#[test]
fn test_tar_gz_blocks_nested_traversal() {
    let tmp = tempdir().unwrap();
    let archive_path = tmp.path().join("nested.tar.gz");
    write_raw_tar_gz(&archive_path, &[("foo/../../../escaped.txt", b"evil")]);

    let archive = FsPath::new(&archive_path).unwrap();
    let result =
        safe_pack::extract_tar_gz(&archive, tmp.path().join("dest"), CompressOptions::default());

    assert!(matches!(result, Err(Error::IllegalPath { .. })), "got {:?}", result);
    assert!(!tmp.path().join("escaped.txt").exists());
}

#[test]
fn test_tar_gz_blocks_absolute_path() {
    let tmp = tempdir().unwrap();
    let archive_path = tmp.path().join("abs.tar.gz");
    let target = tmp.path().join("absolute_target.txt");
    write_raw_tar_gz(&archive_path, &[(target.to_str().unwrap(), b"evil")]);

    let archive = FsPath::new(&archive_path).unwrap();
    let result =
        safe_pack::extract_tar_gz(&archive, tmp.path().join("dest"), CompressOptions::default());

    assert!(matches!(result, Err(Error::IllegalPath { .. })), "got {:?}", result);
    assert!(!target.exists());
}

#[test]
fn test_traversal_checked_before_size() {
    let tmp = tempdir().unwrap();
    let archive_path = tmp.path().join("both.zip");
    write_zip(&archive_path, &[("../big.txt", &[0u8; 64])]);

    let archive = FsPath::new(&archive_path).unwrap();
    let result = safe_pack::extract_zip(
        &archive,
        tmp.path().join("dest"),
        CompressOptions::default().max_size(8),
    );

    assert!(matches!(result, Err(Error::IllegalPath { .. })), "got {:?}", result);
}

// ============================================================================
// Size limits
// ============================================================================

#[test]
fn test_size_limit_stops_extraction() {
    let tmp = tempdir().unwrap();
    let archive_path = tmp.path().join("sizes.zip");
    write_zip(
        &archive_path,
        &[("small.txt", b"ok"), ("large.txt", &[1u8; 500]), ("after.txt", b"never")],
    );

    let archive = FsPath::new(&archive_path).unwrap();
    let out = tmp.path().join("dest");
    let result = safe_pack::extract_zip(&archive, &out, CompressOptions::default().max_size(100));

    match result {
        Err(Error::FileTooLarge { entry, size, limit }) => {
            assert_eq!(entry, "large.txt");
            assert_eq!(size, 500);
            assert_eq!(limit, 100);
        }
        other => panic!("expected FileTooLarge, got {:?}", other),
    }

    assert!(out.join("sizes/small.txt").exists());
    assert!(!out.join("sizes/large.txt").exists());
    assert!(!out.join("sizes/after.txt").exists());
}

#[test]
fn test_size_limit_distinguishable_from_io() {
    let tmp = tempdir().unwrap();
    let archive_path = tmp.path().join("limit.tar.gz");
    write_raw_tar_gz(&archive_path, &[("data.bin", &[9u8; 4096])]);

    let archive = FsPath::new(&archive_path).unwrap();
    let err = safe_pack::extract_tar_gz(
        &archive,
        tmp.path().join("dest"),
        CompressOptions::default().max_size(4095),
    )
    .unwrap_err();

    assert!(matches!(err, Error::FileTooLarge { .. }));
    assert!(err.to_string().contains("data.bin"));
}

// ============================================================================
// Write completeness
// ============================================================================

/// Overwrite every little-endian u32 `from` that follows a ZIP header
/// signature at `offset` with `to`.
fn patch_zip_field(bytes: &mut [u8], signature: [u8; 4], offset: usize, from: u32, to: u32) {
    let mut patched = 0;
    for i in 0..bytes.len().saturating_sub(offset + 4) {
        if bytes[i..i + 4] == signature && bytes[i + offset..i + offset + 4] == from.to_le_bytes() {
            bytes[i + offset..i + offset + 4].copy_from_slice(&to.to_le_bytes());
            patched += 1;
        }
    }
    assert_eq!(patched, 1, "signature {:?} not found", signature);
}

#[test]
fn test_zip_size_mismatch_is_incomplete_write() {
    let tmp = tempdir().unwrap();
    let archive_path = tmp.path().join("liar.zip");
    write_zip(&archive_path, &[("liar.txt", b"twelve bytes")]);

    // Declare 3 uncompressed bytes in both the local and the central header
    let mut bytes = fs::read(&archive_path).unwrap();
    patch_zip_field(&mut bytes, [0x50, 0x4b, 0x03, 0x04], 22, 12, 3);
    patch_zip_field(&mut bytes, [0x50, 0x4b, 0x01, 0x02], 24, 12, 3);
    fs::write(&archive_path, bytes).unwrap();

    let archive = FsPath::new(&archive_path).unwrap();
    let result =
        safe_pack::extract_zip(&archive, tmp.path().join("dest"), CompressOptions::default());

    match result {
        Err(Error::IncompleteWrite {
            entry,
            written,
            expected,
        }) => {
            assert_eq!(entry, "liar.txt");
            assert_eq!(expected, 3);
            assert_ne!(written, expected);
        }
        other => panic!("expected IncompleteWrite, got {:?}", other),
    }
}

#[test]
fn test_tar_gz_short_body_is_incomplete_write() {
    let tmp = tempdir().unwrap();
    let archive_path = tmp.path().join("short.tar.gz");

    // Header declares 64 bytes, the stream ends after 10 of them
    let mut builder = tar::Builder::new(Vec::new());
    builder.append(&raw_header("short.bin", 64), &[3u8; 64][..]).unwrap();
    let mut tar_bytes = builder.into_inner().unwrap();
    tar_bytes.truncate(512 + 10);

    let mut encoder = GzEncoder::new(File::create(&archive_path).unwrap(), Compression::default());
    encoder.write_all(&tar_bytes).unwrap();
    encoder.finish().unwrap();

    let archive = FsPath::new(&archive_path).unwrap();
    let result =
        safe_pack::extract_tar_gz(&archive, tmp.path().join("dest"), CompressOptions::default());

    match result {
        Err(Error::IncompleteWrite {
            entry,
            written,
            expected,
        }) => {
            assert_eq!(entry, "short.bin");
            assert_eq!(written, 10);
            assert_eq!(expected, 64);
        }
        other => panic!("expected IncompleteWrite, got {:?}", other),
    }
}

// ============================================================================
// Corrupt input
// ============================================================================

#[test]
fn test_corrupt_zip_is_codec_error() {
    let tmp = tempdir().unwrap();
    let archive_path = tmp.path().join("garbage.zip");
    fs::write(&archive_path, b"this is not a zip file at all").unwrap();

    let archive = FsPath::new(&archive_path).unwrap();
    let result =
        safe_pack::extract_zip(&archive, tmp.path().join("dest"), CompressOptions::default());
    assert!(matches!(result, Err(Error::Zip(_))), "got {:?}", result);
}

#[test]
fn test_corrupt_tar_gz_is_io_error() {
    let tmp = tempdir().unwrap();
    let archive_path = tmp.path().join("garbage.tar.gz");
    fs::write(&archive_path, b"definitely not gzip").unwrap();

    let archive = FsPath::new(&archive_path).unwrap();
    let result =
        safe_pack::extract_tar_gz(&archive, tmp.path().join("dest"), CompressOptions::default());
    assert!(matches!(result, Err(Error::Io { .. })), "got {:?}", result);
}

#[test]
fn test_missing_archive_is_io_error() {
    let tmp = tempdir().unwrap();
    let archive = FsPath::new(tmp.path().join("missing.zip")).unwrap();
    let result =
        safe_pack::extract_zip(&archive, tmp.path().join("dest"), CompressOptions::default());

    match result {
        Err(Error::Io { context, .. }) => assert!(context.contains("missing.zip")),
        other => panic!("expected Io, got {:?}", other),
    }
}
