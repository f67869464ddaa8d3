//! Progress notifications emitted while pages are copied.

/// Receives progress events from a compress run.
pub trait ProgressObserver {
    /// Called once before the first page, with the page count.
    fn started(&mut self, total: usize);

    /// Called after each page is added; `index` is 1-based.
    fn page_done(&mut self, index: usize, total: usize);

    /// Called right before the output document is written.
    fn saving(&mut self) {}
}

/// Prints progress lines to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn started(&mut self, total: usize) {
        println!("Processing {} pages...", total);
    }

    fn page_done(&mut self, index: usize, total: usize) {
        println!("Compressed page {}/{}", index, total);
    }

    fn saving(&mut self) {
        println!("Saving compressed file...");
    }
}

/// Discards all progress events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn started(&mut self, _total: usize) {}

    fn page_done(&mut self, _index: usize, _total: usize) {}
}
