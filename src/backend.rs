//! PDF backend abstraction layer.
//!
//! The recompression pipeline only needs four capabilities from a PDF
//! library: open a document, enumerate its pages, append pages to a new
//! document and save that document. [`PdfBackend`] names exactly those;
//! [`LopdfBackend`] binds them to lopdf.

use flate2::Compression;
use lopdf::{Document, ObjectId, SaveOptions};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{CompressError, Result};
use crate::page_copy::OutputBuilder;
use crate::CompressionMode;

/// Narrow interface over the PDF library used for a compress run.
pub trait PdfBackend {
    /// An opened input document
    type Source;
    /// Handle to one page of a `Source`
    type Page;
    /// A document under construction
    type Output;

    /// Load the document at `path`.
    fn open(&self, path: &Path) -> Result<Self::Source>;

    /// Pages of `source` in reading order.
    fn pages(&self, source: &Self::Source) -> Vec<Self::Page>;

    /// Start an empty output document for `source`.
    fn new_output(&self, source: &Self::Source) -> Self::Output;

    /// Append `page` to `output`.
    fn add_page(&self, output: &mut Self::Output, source: &Self::Source, page: Self::Page, mode: CompressionMode) -> Result<()>;

    /// Write `output` to `path`, creating or truncating the file.
    fn save(&self, output: Self::Output, path: &Path, mode: CompressionMode) -> Result<()>;
}

/// A loaded input document and the path it came from
pub struct LopdfSource {
    pub path: PathBuf,
    pub doc: Document,
}

/// lopdf binding of [`PdfBackend`]
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfBackend;

impl LopdfBackend {
    /// Flate level used when recompressing page content streams
    pub fn flate_level(mode: CompressionMode) -> Compression {
        match mode {
            CompressionMode::HighQuality => Compression::default(),
            CompressionMode::Maximum => Compression::best(),
        }
    }

    /// Writer settings for the alternate, higher-compression save path
    pub fn maximum_save_options() -> SaveOptions {
        SaveOptions::builder()
            .use_object_streams(true)
            .use_xref_streams(true)
            .compression_level(9)
            .build()
    }
}

impl PdfBackend for LopdfBackend {
    type Source = LopdfSource;
    type Page = ObjectId;
    type Output = OutputBuilder;

    fn open(&self, path: &Path) -> Result<LopdfSource> {
        // Report a missing or unreadable file as such, not as a parse failure
        let metadata = fs::metadata(path).map_err(|e| CompressError::read(path, e))?;
        if !metadata.is_file() {
            return Err(CompressError::read(path, "not a regular file"));
        }

        let doc = Document::load(path).map_err(|e| CompressError::read(path, e))?;
        log::info!("Loaded {:?}: PDF {}, {} objects", path, doc.version, doc.objects.len());

        Ok(LopdfSource {
            path: path.to_path_buf(),
            doc,
        })
    }

    fn pages(&self, source: &LopdfSource) -> Vec<ObjectId> {
        source.doc.get_pages().into_values().collect()
    }

    fn new_output(&self, source: &LopdfSource) -> OutputBuilder {
        OutputBuilder::for_source(&source.doc)
    }

    fn add_page(&self, output: &mut OutputBuilder, source: &LopdfSource, page: ObjectId, mode: CompressionMode) -> Result<()> {
        output
            .add_page(&source.doc, page, Self::flate_level(mode))
            .map_err(|e| CompressError::read(&source.path, format!("page {:?}: {}", page, e)))?;
        Ok(())
    }

    fn save(&self, output: OutputBuilder, path: &Path, mode: CompressionMode) -> Result<()> {
        let mut doc = output.into_document();

        let file = File::create(path).map_err(|e| CompressError::write(path, e))?;
        let mut writer = BufWriter::new(file);

        let saved = match mode {
            CompressionMode::HighQuality => doc.save_to(&mut writer),
            CompressionMode::Maximum => {
                doc.compress();
                doc.save_with_options(&mut writer, Self::maximum_save_options())
            }
        };
        saved.map_err(|e| CompressError::write(path, e))?;

        writer.flush().map_err(|e| CompressError::write(path, e))?;
        log::info!("Saved {:?} ({:?} mode)", path, mode);
        Ok(())
    }
}
