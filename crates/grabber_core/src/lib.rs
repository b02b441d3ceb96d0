//! Grabber core: target normalisation and the pure scan bookkeeping.
mod asset;
mod comment;
mod scan_state;
mod target;

pub use asset::{is_direct_media_host, resolve_direct_asset_url, sticker_extension, sticker_filename};
pub use comment::{CommentRecord, UNKNOWN_AUTHOR};
pub use scan_state::{MergeStats, RoundVerdict, RoundYield, ScanOutcome, ScanState};
pub use target::{identify_target, normalize_page_url, InputError, Target, TargetKind};
