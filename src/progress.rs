//! Progress bar display for installer downloads

use std::io::Read;

use indicatif::{ProgressBar, ProgressBarIter, ProgressStyle};

/// Progress display for one installer download
///
/// Draws to stderr and stays hidden when stderr is not a terminal.
pub struct DownloadProgress {
    bar: ProgressBar,
}

impl DownloadProgress {
    /// Create a progress display; a bar when the size is known, a spinner otherwise
    pub fn new(total_bytes: Option<u64>, file_name: &str) -> Self {
        let bar = match total_bytes {
            Some(total) => {
                let bar = ProgressBar::new(total);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("[{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                {
                    bar.set_style(style.progress_chars("#>-"));
                }
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {bytes} {msg}") {
                    bar.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"]));
                }
                bar
            }
        };
        bar.set_message(file_name.to_string());
        Self { bar }
    }

    /// Count bytes read through `reader` on the bar
    pub fn wrap_read<R: Read>(&self, reader: R) -> ProgressBarIter<R> {
        self.bar.wrap_read(reader)
    }

    /// Finish the bar after `bytes` were received
    pub fn finish(&self, bytes: u64) {
        self.bar.set_position(bytes);
        self.bar.finish_and_clear();
    }

    /// Abandon on error
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}
