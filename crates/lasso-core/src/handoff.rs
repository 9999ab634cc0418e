//! Downstream handoff
//!
//! The pipeline ends by moving one [`ExtractedSelection`] to a single
//! consumer chosen by user action. The handoff call is synchronous and the
//! pipeline does not wait for the consumer's work to finish: a consumer that
//! needs to upload, OCR, or write a clipboard does so on its own time after
//! `deliver` returns. Concrete consumers (clipboard writer, search launcher,
//! OCR invoker) live in the CLI crate.

use crate::error::SelectResult;
use crate::model::ExtractedSelection;

/// A downstream consumer of the extracted pixels.
///
/// `deliver` takes the selection by value: ownership transfers out of the
/// pipeline, which retains no reference afterwards. `Ok(())` means the
/// handoff was dispatched, not that the consumer's work completed.
pub trait SelectionConsumer {
    /// Short name for logging and error messages
    fn name(&self) -> &'static str;

    /// Accepts the selection. Must not block on long-running work.
    fn deliver(&self, selection: ExtractedSelection) -> SelectResult<()>;
}

/// Hands the selection to the chosen consumer, logging the dispatch
pub fn hand_off(
    selection: ExtractedSelection,
    consumer: &dyn SelectionConsumer,
) -> SelectResult<()> {
    tracing::info!(
        consumer = consumer.name(),
        width = selection.width(),
        height = selection.height(),
        "handing off selection"
    );
    consumer.deliver(selection)
}
