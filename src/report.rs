//! Statistics gathered from a single recompression run.

use std::fmt;
use std::time::Duration;

/// Summary of one compress operation
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionReport {
    /// Size of the input file on disk
    pub original_size_bytes: u64,
    /// Size of the written output file on disk
    pub compressed_size_bytes: u64,
    /// Percentage saved relative to the input; negative if the output grew
    pub reduction_percent: f64,
    /// Wall-clock time of the whole run
    pub elapsed: Duration,
    /// Number of pages copied into the output
    pub page_count: usize,
}

impl CompressionReport {
    pub fn new(original_size_bytes: u64, compressed_size_bytes: u64, elapsed: Duration, page_count: usize) -> Self {
        Self {
            original_size_bytes,
            compressed_size_bytes,
            reduction_percent: reduction_percent(original_size_bytes, compressed_size_bytes),
            elapsed,
            page_count,
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn original_size_kb(&self) -> f64 {
        self.original_size_bytes as f64 / 1024.0
    }

    pub fn compressed_size_kb(&self) -> f64 {
        self.compressed_size_bytes as f64 / 1024.0
    }
}

/// `(1 - compressed / original) * 100`, or 0 for an empty original.
pub fn reduction_percent(original_size_bytes: u64, compressed_size_bytes: u64) -> f64 {
    if original_size_bytes == 0 {
        return 0.0;
    }
    (1.0 - compressed_size_bytes as f64 / original_size_bytes as f64) * 100.0
}

impl fmt::Display for CompressionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compression completed successfully!")?;
        writeln!(f, "Pages: {}", self.page_count)?;
        writeln!(f, "Original size: {:.2} KB", self.original_size_kb())?;
        writeln!(f, "Compressed size: {:.2} KB", self.compressed_size_kb())?;
        writeln!(f, "Reduction: {:.1}%", self.reduction_percent)?;
        write!(f, "Processing time: {:.2} seconds", self.elapsed_seconds())
    }
}
