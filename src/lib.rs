//! PDF Recompressor Library
//!
//! Re-saves every page of a PDF into a fresh document, recompressing page
//! content streams with Flate, and reports how much smaller the file got.
//!
//! Two fixed profiles are available through [`CompressionMode`]: a lossless
//! page copy at the default Flate level, and a maximum profile that also
//! packs objects into compressed object streams.

pub mod backend;
pub mod error;
pub mod page_copy;
pub mod progress;
pub mod report;

use std::fs;
use std::path::Path;
use std::time::Instant;

pub use backend::{LopdfBackend, PdfBackend};
pub use error::{CompressError, Result};
pub use progress::{ConsoleProgress, NoProgress, ProgressObserver};
pub use report::CompressionReport;

/// Compression profile for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMode {
    /// Lossless page copy with default Flate settings
    #[default]
    HighQuality,
    /// Best Flate level plus object and cross-reference streams
    Maximum,
}

impl CompressionMode {
    pub fn from_high_quality(high_quality: bool) -> Self {
        if high_quality {
            CompressionMode::HighQuality
        } else {
            CompressionMode::Maximum
        }
    }
}

/// Compress `input_path` into `output_path` with lopdf, printing progress
/// and the final report to stdout.
pub fn compress(input_path: &Path, output_path: &Path, mode: CompressionMode) -> Result<CompressionReport> {
    let report = compress_with(&LopdfBackend, input_path, output_path, mode, &mut ConsoleProgress)?;
    println!("\n{}", report);
    Ok(report)
}

/// Run the compress pipeline against any backend and observer.
///
/// Fails with [`CompressError::DocumentRead`] before anything is written if
/// the input cannot be loaded. Write failures leave whatever the writer
/// already produced at `output_path`.
pub fn compress_with<B, P>(
    backend: &B,
    input_path: &Path,
    output_path: &Path,
    mode: CompressionMode,
    progress: &mut P,
) -> Result<CompressionReport>
where
    B: PdfBackend,
    P: ProgressObserver + ?Sized,
{
    let start = Instant::now();

    let source = backend.open(input_path)?;
    let original_size = fs::metadata(input_path)
        .map_err(|e| CompressError::read(input_path, e))?
        .len();

    let pages = backend.pages(&source);
    let total = pages.len();
    progress.started(total);

    let mut output = backend.new_output(&source);
    for (index, page) in pages.into_iter().enumerate() {
        backend.add_page(&mut output, &source, page, mode)?;
        progress.page_done(index + 1, total);
    }
    drop(source);

    progress.saving();
    backend.save(output, output_path, mode)?;

    let compressed_size = fs::metadata(output_path)
        .map_err(|e| CompressError::write(output_path, e))?
        .len();

    let report = CompressionReport::new(original_size, compressed_size, start.elapsed(), total);
    log::info!(
        "{:?} -> {:?}: {} -> {} bytes ({:.1}%)",
        input_path,
        output_path,
        report.original_size_bytes,
        report.compressed_size_bytes,
        report.reduction_percent
    );
    Ok(report)
}
