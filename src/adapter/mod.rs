//! Archive format adapters.
//!
//! Adapters normalize different archive formats into a common interface
//! for the extraction driver: a sequence of [`EntryInfo`](crate::EntryInfo)
//! values, each paired with a reader for file entries.

mod tar_adapter;
mod zip_adapter;

use std::io::{Read, Write};

pub use tar_adapter::TarAdapter;
pub use zip_adapter::ZipAdapter;

/// Copy at most `limit` bytes from `reader` to `writer`.
///
/// Returns the number of bytes copied. Stops at EOF or at the limit,
/// whichever comes first.
pub fn copy_limited<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    limit: u64,
) -> std::io::Result<u64> {
    let mut total = 0u64;
    let mut buf = [0u8; 8192];

    loop {
        let remaining = limit.saturating_sub(total);
        if remaining == 0 {
            break;
        }

        let to_read = buf.len().min(remaining as usize);
        let n = match reader.read(&mut buf[..to_read]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        writer.write_all(&buf[..n])?;
        total += n as u64;
    }

    Ok(total)
}
