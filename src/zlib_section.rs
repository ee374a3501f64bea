//! Slicing zlib-compressed sections out of a mapblock blob.
//!
//! The node-data and node-metadata sections are each a bare zlib stream
//! immediately followed by the next section, with no length prefix. The
//! only way to know where one ends is to let the decompressor tell us how
//! many input bytes it actually consumed.

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use std::io::Write;

use crate::error::MapblockError;

/// Decompresses the zlib stream starting at the front of `data`, which may
/// have further sections appended after it.
///
/// Returns the decompressed bytes and the number of leading bytes of `data`
/// the stream occupied, so the caller can slice past it.
pub fn decompress_prefix(data: &[u8]) -> Result<(Vec<u8>, usize), MapblockError> {
    let mut decompress = Decompress::new(true);
    let mut output = Vec::new();

    loop {
        let consumed = decompress.total_in() as usize;
        let produced_before = decompress.total_out();
        let remaining = data.get(consumed..).ok_or_else(|| {
            MapblockError::Malformed("zlib stream ran past end of blob".into())
        })?;

        output.reserve(8192);
        let status = decompress
            .decompress_vec(remaining, &mut output, FlushDecompress::None)
            .map_err(|e| MapblockError::Malformed(format!("zlib decompression failed: {e}")))?;

        if status == Status::StreamEnd {
            break;
        }

        let made_progress = decompress.total_in() as usize > consumed
            || decompress.total_out() > produced_before;
        if !made_progress {
            return Err(MapblockError::Malformed(
                "zlib stream truncated before end".into(),
            ));
        }
    }

    Ok((output, decompress.total_in() as usize))
}

/// Compresses `data` into a standalone zlib stream.
pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .expect("writing to an in-memory Vec cannot fail");
    encoder
        .finish()
        .expect("finishing an in-memory zlib encoder cannot fail")
}
