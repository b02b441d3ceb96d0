use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use futures_util::FutureExt;
use grabber_core::{resolve_direct_asset_url, sticker_extension, sticker_filename};
use grabber_logging::{grab_debug, grab_warn};
use tokio::sync::{mpsc, Semaphore};

use crate::fetch::{AssetFetcher, ProgressSink};
use crate::{EngineEvent, FailureKind, FetchError, FetchResult};

/// Download every item into `dest_dir` with at most `concurrency` transfers
/// in flight.
///
/// Item `i` (0-based) is saved as `sticker_{i+1:04}.<ext>`, so names depend
/// only on input order. Results come back in completion order and one entry
/// per item; a failed or panicking item never stops the others.
pub async fn fetch_all(
    fetcher: Arc<dyn AssetFetcher>,
    items: Vec<String>,
    dest_dir: &Path,
    concurrency: usize,
    sink: &dyn ProgressSink,
) -> Vec<FetchResult> {
    let total = items.len();
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<FetchResult>();

    for (offset, source_url) in items.into_iter().enumerate() {
        let fetcher = Arc::clone(&fetcher);
        let permits = Arc::clone(&permits);
        let result_tx = result_tx.clone();
        let dest_dir = dest_dir.to_path_buf();
        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            let direct_url = resolve_direct_asset_url(&source_url);
            let file_name = sticker_filename(offset + 1, sticker_extension(&source_url));
            let download = AssertUnwindSafe(fetcher.fetch_to(&direct_url, &dest_dir, &file_name));
            let result = match download.catch_unwind().await {
                Ok(Ok(asset)) => {
                    grab_debug!("Saved {} ({} bytes)", asset.path.display(), asset.byte_len);
                    FetchResult::saved(source_url, asset.path)
                }
                Ok(Err(err)) => {
                    grab_warn!("Download failed for {}: {}", direct_url, err);
                    FetchResult::failed(source_url, err)
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    grab_warn!("Download task for {} panicked: {}", direct_url, message);
                    FetchResult::failed(source_url, FetchError::new(FailureKind::Panicked, message))
                }
            };
            let _ = result_tx.send(result);
        });
    }
    drop(result_tx);

    let mut results = Vec::with_capacity(total);
    let mut succeeded = 0;
    while let Some(result) = result_rx.recv().await {
        if result.is_success() {
            succeeded += 1;
        }
        results.push(result.clone());
        sink.emit(EngineEvent::FetchProgress {
            completed: results.len(),
            total,
            succeeded,
            result,
        });
    }

    if results.len() < total {
        grab_warn!("{} of {} downloads ended without a result", total - results.len(), total);
    }
    results
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}
