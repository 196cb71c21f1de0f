//! Batch upload state machine
//!
//! Each file moves through
//! `Pending -> Classified -> Requested -> {Skipped | Uploading} -> Done`, or ends early as
//! `NotMedia`. Files are handled one at a time in listing order and the first error
//! aborts the batch. Files already moved to the done directory stay there.

use crate::pending;
use chrono::{DateTime, Utc};
use shoebox_api_client::UploadGateway;
use shoebox_core::{FileMetadata, MediaKind, UploadDecision};
use shoebox_processing::{capture_time_from_file, classify, digest_reader, read_prefix};
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncSeekExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Pending,
    Classified,
    NotMedia,
    Requested,
    Skipped,
    Uploading,
    Done,
}

impl FileState {
    pub fn can_transition_to(self, next: FileState) -> bool {
        use FileState::*;
        matches!(
            (self, next),
            (Pending, Classified)
                | (Classified, NotMedia)
                | (Classified, Requested)
                | (Requested, Skipped)
                | (Requested, Uploading)
                | (Skipped, Done)
                | (Uploading, Done)
        )
    }
}

/// How a single file left the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Uploaded,
    AlreadyPresent,
    NotMedia,
}

impl FileOutcome {
    /// Whether the file is accounted for remotely and may leave the pending set
    pub fn is_complete(self) -> bool {
        matches!(self, FileOutcome::Uploaded | FileOutcome::AlreadyPresent)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub uploaded: usize,
    pub already_present: usize,
    pub not_media: usize,
}

impl BatchReport {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Uploaded => self.uploaded += 1,
            FileOutcome::AlreadyPresent => self.already_present += 1,
            FileOutcome::NotMedia => self.not_media += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.uploaded + self.already_present + self.not_media
    }
}

/// Progress notifications; the runner itself never logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Started {
        index: usize,
        total: usize,
        name: String,
    },
    NotMedia {
        name: String,
        content_type: String,
    },
    CaptureTimeFallback {
        name: String,
        reason: String,
    },
    AlreadyPresent {
        name: String,
        id: String,
    },
    Uploaded {
        name: String,
        id: String,
        size: u64,
    },
    Finished(BatchReport),
}

pub trait BatchObserver: Send + Sync {
    fn on_event(&self, event: &BatchEvent);
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to list pending directory {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to prepare done directory {path}: {source}")]
    DoneDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} has no usable file name")]
    InvalidName { path: PathBuf },

    #[error("upload request for {name} failed: {source:#}")]
    Request {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("coordinator rejected {name}: {message}")]
    Rejected { name: String, message: String },

    #[error("transfer of {name} failed: {source:#}")]
    Transfer {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to move {path} to the done directory: {source}")]
    MarkComplete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid state transition {from:?} -> {to:?}")]
    InvalidTransition { from: FileState, to: FileState },
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub pending_dir: PathBuf,
    pub done_dir: PathBuf,
    pub test_upload: bool,
}

/// Drives a single file through the state machine. Never moves the file.
pub struct FileUploader<G> {
    gateway: G,
    test_upload: bool,
    observer: Arc<dyn BatchObserver>,
}

struct Tracker {
    state: FileState,
}

impl Tracker {
    fn advance(&mut self, next: FileState) -> Result<(), BatchError> {
        if !self.state.can_transition_to(next) {
            return Err(BatchError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

impl<G: UploadGateway> FileUploader<G> {
    pub fn new(gateway: G, test_upload: bool, observer: Arc<dyn BatchObserver>) -> Self {
        FileUploader {
            gateway,
            test_upload,
            observer,
        }
    }

    /// Process one file; `index` is 1-based.
    pub async fn process(
        &self,
        path: &Path,
        index: usize,
        total: usize,
    ) -> Result<FileOutcome, BatchError> {
        let mut tracker = Tracker {
            state: FileState::Pending,
        };
        let read_err = |source: io::Error| BatchError::Read {
            path: path.to_path_buf(),
            source,
        };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| BatchError::InvalidName {
                path: path.to_path_buf(),
            })?
            .to_string();

        self.observer.on_event(&BatchEvent::Started {
            index,
            total,
            name: name.clone(),
        });

        let mut file = tokio::fs::File::open(path).await.map_err(read_err)?;
        let stat = file.metadata().await.map_err(read_err)?;
        let size = stat.len();

        let id = digest_reader(&mut file).await.map_err(read_err)?;

        file.seek(SeekFrom::Start(0)).await.map_err(read_err)?;
        let prefix = read_prefix(&mut file).await.map_err(read_err)?;
        let classification = classify(&prefix);
        tracker.advance(FileState::Classified)?;

        let kind = match classification.kind {
            Some(kind) => kind,
            None => {
                tracker.advance(FileState::NotMedia)?;
                self.observer.on_event(&BatchEvent::NotMedia {
                    name,
                    content_type: classification.content_type.to_string(),
                });
                return Ok(FileOutcome::NotMedia);
            }
        };

        let fs_mtime: DateTime<Utc> = stat.modified().map_err(read_err)?.into();
        let mtime = if kind == MediaKind::Image {
            match capture_time_from_file(path).await {
                Ok(captured) => captured,
                Err(e) => {
                    self.observer.on_event(&BatchEvent::CaptureTimeFallback {
                        name: name.clone(),
                        reason: e.to_string(),
                    });
                    fs_mtime
                }
            }
        } else {
            fs_mtime
        };

        let meta = FileMetadata {
            id: id.into_string(),
            name: name.clone(),
            mtime,
            size,
            content_type: classification.content_type.to_string(),
            test_upload: self.test_upload,
        };

        let decision = self
            .gateway
            .request_upload(&meta)
            .await
            .map_err(|source| BatchError::Request {
                name: name.clone(),
                source,
            })?;
        tracker.advance(FileState::Requested)?;

        match decision {
            UploadDecision::Skip => {
                tracker.advance(FileState::Skipped)?;
                self.observer.on_event(&BatchEvent::AlreadyPresent {
                    name,
                    id: meta.id,
                });
                tracker.advance(FileState::Done)?;
                Ok(FileOutcome::AlreadyPresent)
            }
            UploadDecision::Ok(capability) => {
                tracker.advance(FileState::Uploading)?;
                file.seek(SeekFrom::Start(0)).await.map_err(read_err)?;
                self.gateway
                    .transfer(&capability, file, size)
                    .await
                    .map_err(|source| BatchError::Transfer {
                        name: name.clone(),
                        source,
                    })?;
                self.observer.on_event(&BatchEvent::Uploaded {
                    name,
                    id: meta.id,
                    size,
                });
                tracker.advance(FileState::Done)?;
                Ok(FileOutcome::Uploaded)
            }
            UploadDecision::Error { error } => Err(BatchError::Rejected {
                name,
                message: error,
            }),
        }
    }
}

/// Runs every pending file through a [`FileUploader`] and moves finished ones to done.
pub struct BatchRunner<G> {
    uploader: FileUploader<G>,
    config: BatchConfig,
}

impl<G: UploadGateway> BatchRunner<G> {
    pub fn new(gateway: G, config: BatchConfig, observer: Arc<dyn BatchObserver>) -> Self {
        BatchRunner {
            uploader: FileUploader::new(gateway, config.test_upload, observer),
            config,
        }
    }

    pub async fn run(&self) -> Result<BatchReport, BatchError> {
        let files = pending::scan_pending(&self.config.pending_dir)
            .await
            .map_err(|source| BatchError::Scan {
                path: self.config.pending_dir.clone(),
                source,
            })?;

        pending::prepare_done_dir(&self.config.done_dir)
            .await
            .map_err(|source| BatchError::DoneDir {
                path: self.config.done_dir.clone(),
                source,
            })?;

        let total = files.len();
        let mut report = BatchReport::default();

        for (i, path) in files.iter().enumerate() {
            let outcome = self.uploader.process(path, i + 1, total).await?;

            if outcome.is_complete() {
                pending::mark_complete(path, &self.config.done_dir)
                    .await
                    .map_err(|source| BatchError::MarkComplete {
                        path: path.clone(),
                        source,
                    })?;
            }
            report.record(outcome);
        }

        self.uploader
            .observer
            .on_event(&BatchEvent::Finished(report.clone()));
        Ok(report)
    }
}
