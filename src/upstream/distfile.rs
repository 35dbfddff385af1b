// src/upstream/distfile.rs

//! Streaming distfile downloads

use super::client::HttpClient;
use crate::error::Result;
use crate::manifest::DistfileFetcher;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::time::Duration;

/// Fetches distfiles over HTTP, optionally drawing a progress bar
pub struct HttpDistfileFetcher {
    client: HttpClient,
    progress: bool,
}

impl HttpDistfileFetcher {
    /// Create a fetcher whose downloads time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(timeout)?,
            progress: false,
        })
    }

    /// Draw a progress bar while streaming
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }
}

impl DistfileFetcher for HttpDistfileFetcher {
    fn fetch(&self, url: &str, name: &str) -> Result<Box<dyn Read + '_>> {
        let response = self.client.get(url)?;
        if !self.progress {
            return Ok(Box::new(response));
        }

        let pb = create_progress_bar(response.content_length(), name);
        Ok(Box::new(FinishOnDrop {
            inner: pb.wrap_read(response),
            pb,
        }))
    }
}

/// Styled progress bar for a distfile download; a spinner if size is unknown
fn create_progress_bar(size: Option<u64>, name: &str) -> ProgressBar {
    let pb = match size {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {bytes} ({bytes_per_sec}) {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb
        }
    };
    pb.set_message(name.to_string());
    pb
}

/// Clears the bar once the reconciler is done with the stream
struct FinishOnDrop<R> {
    inner: indicatif::ProgressBarIter<R>,
    pb: ProgressBar,
}

impl<R: Read> Read for FinishOnDrop<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R> Drop for FinishOnDrop<R> {
    fn drop(&mut self) {
        self.pb.finish_and_clear();
    }
}
