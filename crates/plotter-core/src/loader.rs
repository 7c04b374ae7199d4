// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Asynchronous CSV file reading.
//!
//! Reads run on a tokio runtime so the UI thread never blocks on disk. The
//! UI polls for finished reads once per frame. Starting a new read cancels
//! the one still pending, and any superseded result that slips through is
//! discarded, so the most recently requested file is the one that lands.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::PlotterError;

/// A finished file read.
#[derive(Debug)]
pub struct FileReadOutcome {
    pub path: PathBuf,
    pub generation: u64,
    pub result: Result<String, PlotterError>,
}

/// Background CSV reader with last-request-wins semantics.
#[derive(Debug)]
pub struct FileLoader {
    runtime: Handle,
    sender: mpsc::UnboundedSender<FileReadOutcome>,
    receiver: mpsc::UnboundedReceiver<FileReadOutcome>,
    generation: u64,
    pending: Option<CancellationToken>,
}

impl FileLoader {
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            runtime,
            sender,
            receiver,
            generation: 0,
            pending: None,
        }
    }

    /// Start reading `path` in the background.
    ///
    /// Returns the request's generation number, or
    /// [`PlotterError::UnsupportedFile`] if the path is not a `.csv` file.
    pub fn request(&mut self, path: impl Into<PathBuf>) -> Result<u64, PlotterError> {
        let path = path.into();
        if !is_csv_path(&path) {
            return Err(PlotterError::UnsupportedFile {
                name: display_name(&path),
            });
        }

        if let Some(previous) = self.pending.take() {
            debug!("Cancelling superseded read (generation {})", self.generation);
            previous.cancel();
        }

        self.generation += 1;
        let generation = self.generation;
        let token = CancellationToken::new();
        self.pending = Some(token.clone());

        let sender = self.sender.clone();
        self.runtime.spawn(async move {
            let result = tokio::select! {
                () = token.cancelled() => return,
                result = read_csv_file(&path) => result,
            };
            if sender
                .send(FileReadOutcome {
                    path,
                    generation,
                    result,
                })
                .is_err()
            {
                debug!("File loader dropped before read {generation} finished");
            }
        });

        Ok(generation)
    }

    /// Accept the files of one drop gesture. Only the first is read.
    pub fn accept_dropped<I>(&mut self, paths: I) -> Option<Result<u64, PlotterError>>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut paths = paths.into_iter();
        let first = paths.next()?;
        let ignored = paths.count();
        if ignored > 0 {
            warn!(
                "Only one file can be imported at a time; ignoring {ignored} extra file(s)"
            );
        }
        Some(self.request(first))
    }

    /// Next completed read for the latest request, if it has finished.
    pub fn poll(&mut self) -> Option<FileReadOutcome> {
        while let Ok(outcome) = self.receiver.try_recv() {
            if outcome.generation == self.generation {
                self.pending = None;
                return Some(outcome);
            }
            debug!(
                "Discarding superseded read of {} (generation {})",
                outcome.path.display(),
                outcome.generation
            );
        }
        None
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Read a CSV file to text.
pub async fn read_csv_file(path: &Path) -> Result<String, PlotterError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| PlotterError::FileRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    decode_csv_bytes(&path.display().to_string(), bytes)
}

/// Decode file contents as UTF-8 text.
pub fn decode_csv_bytes(name: &str, bytes: Vec<u8>) -> Result<String, PlotterError> {
    String::from_utf8(bytes).map_err(|e| PlotterError::FileRead {
        path: name.to_string(),
        reason: e.to_string(),
    })
}

/// Whether `path` has a `.csv` extension (any case).
#[must_use]
pub fn is_csv_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
