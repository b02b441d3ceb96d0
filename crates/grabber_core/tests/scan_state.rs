use grabber_core::{
    CommentRecord, MergeStats, RoundVerdict, RoundYield, ScanState, UNKNOWN_AUTHOR,
};
use pretty_assertions::assert_eq;

fn stickers(urls: &[&str]) -> RoundYield {
    RoundYield {
        stickers: urls.iter().map(|u| u.to_string()).collect(),
        comments: Vec::new(),
    }
}

fn comments(pairs: &[(&str, &str)]) -> RoundYield {
    RoundYield {
        stickers: Vec::new(),
        comments: pairs
            .iter()
            .map(|(a, t)| CommentRecord::new(*a, *t))
            .collect(),
    }
}

#[test]
fn sticker_set_never_shrinks_across_rounds() {
    grabber_logging::initialize_for_tests();
    let rounds = [
        stickers(&["a", "b"]),
        stickers(&[]),
        stickers(&["b"]),
        stickers(&["c", "a"]),
        stickers(&[]),
    ];
    let mut state = ScanState::new();
    let mut previous = 0;
    for round in rounds {
        state.merge(round);
        assert!(state.sticker_count() >= previous);
        previous = state.sticker_count();
    }
    assert_eq!(state.sticker_count(), 3);
}

#[test]
fn repeated_sticker_across_rounds_is_kept_once() {
    let mut state = ScanState::new();
    let first = state.merge(stickers(&["https://media.giphy.com/x.gif"]));
    let second = state.merge(stickers(&["https://media.giphy.com/x.gif"]));
    assert_eq!(first.new_stickers, 1);
    assert_eq!(second.new_stickers, 0);
    let outcome = state.into_outcome();
    assert_eq!(outcome.stickers.len(), 1);
}

#[test]
fn comments_dedupe_on_author_and_text() {
    let mut state = ScanState::new();
    state.merge(comments(&[("ann", "nice"), ("bob", "nice")]));
    state.merge(comments(&[("ann", "nice"), ("ann", "  nice  ")]));
    assert_eq!(
        state.comments(),
        &[CommentRecord::new("ann", "nice"), CommentRecord::new("bob", "nice")]
    );
}

#[test]
fn blank_author_becomes_unknown_and_blank_text_is_dropped() {
    let mut state = ScanState::new();
    let stats = state.merge(comments(&[("", "hello"), ("carl", "   ")]));
    assert_eq!(stats.new_comments, 1);
    assert_eq!(state.comments()[0].author, UNKNOWN_AUTHOR);
}

#[test]
fn stagnation_resets_on_growth() {
    let mut state = ScanState::new();
    state.merge(stickers(&["a"]));
    assert_eq!(state.settle_round(), 0);
    assert_eq!(state.settle_round(), 1);
    assert_eq!(state.settle_round(), 2);
    state.merge(stickers(&["b"]));
    assert_eq!(state.settle_round(), 0);
}

#[test]
fn verdict_requires_threshold_and_no_load_more() {
    let mut state = ScanState::new();
    let mut verdicts = Vec::new();
    for _ in 0..3 {
        let (added, verdict) = state.observe_round(RoundYield::default(), 3, false);
        assert_eq!(added, MergeStats::default());
        verdicts.push(verdict);
    }
    assert_eq!(
        verdicts,
        vec![RoundVerdict::Continue, RoundVerdict::Continue, RoundVerdict::Exhausted]
    );
    assert_eq!(state.verdict(3, true), RoundVerdict::Continue);
}

#[test]
fn observed_round_reports_only_new_items() {
    let mut state = ScanState::new();
    let (first, _) = state.observe_round(stickers(&["a", "b"]), 3, false);
    assert_eq!(
        first,
        MergeStats {
            new_stickers: 2,
            new_comments: 0
        }
    );

    let (second, verdict) = state.observe_round(stickers(&["b", "c", "c"]), 3, false);
    assert_eq!(second.new_stickers, 1);
    assert_eq!(verdict, RoundVerdict::Continue);
    assert_eq!(state.sticker_count(), 3);
}
