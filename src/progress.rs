//! Terminal progress bars for retrieval loops.
//!
//! Renders [`ProgressEvent`]s from the fan-out and lookup loops with
//! `indicatif`. The bar draws to stderr and hides itself when stderr is
//! not a terminal.

use std::sync::{Arc, Mutex};

use indicatif::{ProgressBar, ProgressStyle};
use retrieval_core::{ProgressCallback, ProgressEvent};

const TEMPLATE: &str = "{msg} [{bar:30}] {pos}/{len}q {per_sec} ETA {eta}";

/// A [`ProgressCallback`] that draws one bar per loop.
pub fn terminal_progress() -> ProgressCallback {
    let bar: Mutex<Option<ProgressBar>> = Mutex::new(None);
    Arc::new(move |event| {
        let Ok(mut slot) = bar.lock() else {
            return;
        };
        match event {
            ProgressEvent::Started { desc, total } => {
                let pb = ProgressBar::new(total as u64);
                if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
                    pb.set_style(style);
                }
                pb.set_message(desc);
                *slot = Some(pb);
            }
            ProgressEvent::Advanced { completed, .. } => {
                if let Some(pb) = slot.as_ref() {
                    pb.set_position(completed as u64);
                }
            }
            ProgressEvent::Finished { .. } => {
                if let Some(pb) = slot.take() {
                    pb.finish_and_clear();
                }
            }
        }
    })
}
