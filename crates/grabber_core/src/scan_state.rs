use std::collections::{BTreeSet, HashSet};

use serde::Deserialize;

use crate::comment::CommentRecord;

/// Raw items read from the page during one round, before deduplication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoundYield {
    pub stickers: Vec<String>,
    pub comments: Vec<CommentRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeStats {
    pub new_stickers: usize,
    pub new_comments: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundVerdict {
    Continue,
    /// Stagnation threshold reached with no load-more control in sight.
    Exhausted,
}

/// Mutable bookkeeping for a single scan. Created at scan start and turned
/// into a [`ScanOutcome`] at the end; nothing survives between scans.
#[derive(Debug, Clone, Default)]
pub struct ScanState {
    stickers: BTreeSet<String>,
    comments: Vec<CommentRecord>,
    seen_comments: HashSet<(String, String)>,
    last_sticker_count: usize,
    stagnant_rounds: u32,
    round_index: u32,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_round(&mut self, round_index: u32) {
        self.round_index = round_index;
    }

    pub fn round_index(&self) -> u32 {
        self.round_index
    }

    pub fn sticker_count(&self) -> usize {
        self.stickers.len()
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    pub fn stagnant_rounds(&self) -> u32 {
        self.stagnant_rounds
    }

    pub fn stickers(&self) -> &BTreeSet<String> {
        &self.stickers
    }

    pub fn comments(&self) -> &[CommentRecord] {
        &self.comments
    }

    /// Union stickers into the set and append unseen comments in discovery
    /// order. The sticker set never shrinks.
    pub fn merge(&mut self, round: RoundYield) -> MergeStats {
        let mut stats = MergeStats::default();
        for sticker in round.stickers {
            let sticker = sticker.trim();
            if !sticker.is_empty() && self.stickers.insert(sticker.to_string()) {
                stats.new_stickers += 1;
            }
        }
        for comment in round.comments.into_iter().filter_map(CommentRecord::normalized) {
            if self.seen_comments.insert(comment.signature()) {
                self.comments.push(comment);
                stats.new_comments += 1;
            }
        }
        stats
    }

    /// Update the stagnation counter against the previous round's sticker
    /// count and return the new counter value.
    pub fn settle_round(&mut self) -> u32 {
        let count = self.stickers.len();
        if count > self.last_sticker_count {
            self.stagnant_rounds = 0;
        } else {
            self.stagnant_rounds += 1;
        }
        self.last_sticker_count = count;
        self.stagnant_rounds
    }

    /// A visible load-more control always keeps the scan going.
    pub fn verdict(&self, stagnant_threshold: u32, load_more_visible: bool) -> RoundVerdict {
        if self.stagnant_rounds >= stagnant_threshold && !load_more_visible {
            RoundVerdict::Exhausted
        } else {
            RoundVerdict::Continue
        }
    }

    /// Merge, settle and judge one round in a single step. Also returns
    /// what the round added.
    pub fn observe_round(
        &mut self,
        round: RoundYield,
        stagnant_threshold: u32,
        load_more_visible: bool,
    ) -> (MergeStats, RoundVerdict) {
        let added = self.merge(round);
        self.settle_round();
        (added, self.verdict(stagnant_threshold, load_more_visible))
    }

    pub fn into_outcome(self) -> ScanOutcome {
        ScanOutcome {
            stickers: self.stickers,
            comments: self.comments,
        }
    }
}

/// What a finished scan hands to the rest of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub stickers: BTreeSet<String>,
    pub comments: Vec<CommentRecord>,
}
