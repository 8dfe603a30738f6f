//! Background discovery and flattening.
//!
//! Discovery runs on its own thread over a shared, read-only document and
//! hands the finished registry back over a channel; from then on the
//! registry belongs to the caller. Flattening runs on another thread over
//! a snapshot of the registry.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use formflat_core::{AnnotationStore, FormFieldRegistry, FormOptions, PdfError};
use formflat_parse::{DiscoveredForm, LopdfDocument, discover_form_fields};

use crate::flatten::{FlattenedOutput, Flattener};

/// Receiving end of a background discovery pass.
#[derive(Debug)]
pub struct DiscoveryHandle {
    receiver: Receiver<DiscoveredForm>,
    worker: Option<JoinHandle<()>>,
}

impl DiscoveryHandle {
    pub(crate) fn spawn(doc: Arc<LopdfDocument>, options: FormOptions) -> Self {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::spawn(move || {
            let form = discover_form_fields(doc.inner(), &options);
            // The receiver may already be gone; the result is then dropped.
            let _ = sender.send(form);
        });
        Self {
            receiver,
            worker: Some(worker),
        }
    }

    /// Block until discovery finishes and take ownership of its result.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::TaskFailed`] if the discovery thread ended
    /// without sending a result.
    pub fn wait(mut self) -> Result<DiscoveredForm, PdfError> {
        let result = self.receiver.recv().map_err(|_| task_failed("discovery"));
        self.join_worker();
        result
    }

    /// Take the result if discovery has finished, without blocking.
    ///
    /// Returns `Ok(None)` while discovery is still running.
    pub fn try_take(&mut self) -> Result<Option<DiscoveredForm>, PdfError> {
        match self.receiver.try_recv() {
            Ok(form) => {
                self.join_worker();
                Ok(Some(form))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                self.join_worker();
                Err(task_failed("discovery"))
            }
        }
    }

    fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// A flattening pass running in the background.
#[derive(Debug)]
pub struct FlattenTask {
    worker: JoinHandle<Result<FlattenedOutput, PdfError>>,
}

impl FlattenTask {
    /// Start rendering `doc` with the field values of `registry` and the
    /// marks in `annotations`.
    pub fn spawn(
        doc: Arc<LopdfDocument>,
        registry: FormFieldRegistry,
        annotations: AnnotationStore,
        options: FormOptions,
    ) -> Self {
        let worker = thread::spawn(move || {
            Flattener::new(&doc, &registry, &options)
                .with_annotations(&annotations)
                .render_all_pages()
        });
        Self { worker }
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the flattened output.
    ///
    /// # Errors
    ///
    /// Returns the rendering error, or [`PdfError::TaskFailed`] if the
    /// rendering thread panicked.
    pub fn join(self) -> Result<FlattenedOutput, PdfError> {
        self.worker.join().map_err(|_| task_failed("flattening"))?
    }
}

fn task_failed(task: &str) -> PdfError {
    PdfError::TaskFailed(format!("{task} thread ended without a result"))
}
