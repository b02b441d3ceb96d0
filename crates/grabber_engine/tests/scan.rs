mod support;

use std::time::Duration;

use grabber_core::{identify_target, CommentRecord, Target};
use grabber_engine::{scan_target, EngineEvent, ScanSettings, ScrollTarget, StopReason};
use pretty_assertions::assert_eq;
use support::{found, Extraction, FakeDriver, TestSink};

const POST: &str = "https://site.example/p/ABC123/";
const LOAD_MORE: &str = "svg[aria-label='Load more comments']";

fn target() -> Target {
    identify_target(POST).unwrap()
}

fn settings(max_rounds: u32, stagnant_threshold: u32) -> ScanSettings {
    ScanSettings {
        max_rounds,
        stagnant_threshold,
        base_pause: Duration::ZERO,
        max_jitter: Duration::ZERO,
        drift_pause: Duration::ZERO,
        click_settle: Duration::ZERO,
        ..ScanSettings::default()
    }
}

#[tokio::test]
async fn empty_page_stops_after_threshold_rounds() {
    grabber_logging::initialize_for_tests();
    let mut driver = FakeDriver::on(POST).with_steady(found(&[], &[]));
    let report = scan_target(&mut driver, &target(), &settings(50, 4), &TestSink::new()).await;

    assert_eq!(report.stop, StopReason::Exhausted);
    assert_eq!(report.rounds, 4);
    assert!(report.outcome.stickers.is_empty());
}

#[tokio::test]
async fn plateaued_stickers_stop_well_before_round_limit() {
    let mut driver = FakeDriver::on(POST).with_steady(found(&["https://media.giphy.com/a.gif"], &[]));
    let report = scan_target(&mut driver, &target(), &settings(50, 4), &TestSink::new()).await;

    assert_eq!(report.stop, StopReason::Exhausted);
    // The first round grows the set, then four flat rounds follow.
    assert_eq!(report.rounds, 5);
    assert_eq!(report.outcome.stickers.len(), 1);
}

#[tokio::test]
async fn visible_load_more_overrides_stagnation() {
    let mut driver = FakeDriver::on(POST)
        .with_present(&["article", LOAD_MORE])
        .with_steady(found(&["https://media.giphy.com/a.gif"], &[]));
    let report = scan_target(&mut driver, &target(), &settings(20, 3), &TestSink::new()).await;

    assert_eq!(report.stop, StopReason::RoundLimit);
    assert_eq!(report.rounds, 20);
    assert_eq!(driver.extraction_count(), 20);
}

#[tokio::test]
async fn results_are_deduplicated_across_rounds() {
    let mut driver = FakeDriver::on(POST).with_extractions(vec![
        found(&["s1", "s2"], &[("ann", "so good")]),
        found(&["s2"], &[("ann", "so good"), ("bob", "so good")]),
        Extraction::Fails,
        found(&["s3", "s1"], &[("ann", "so good")]),
    ]);
    let sink = TestSink::new();
    let report = scan_target(&mut driver, &target(), &settings(30, 3), &sink).await;

    let stickers: Vec<_> = report.outcome.stickers.iter().cloned().collect();
    assert_eq!(stickers, vec!["s1", "s2", "s3"]);
    assert_eq!(
        report.outcome.comments,
        vec![
            CommentRecord::new("ann", "so good"),
            CommentRecord::new("bob", "so good"),
        ]
    );

    let counts: Vec<usize> = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::ScanRound(progress) => Some(progress.stickers),
            _ => None,
        })
        .collect();
    assert!(counts.windows(2).all(|w| w[0] <= w[1]), "{counts:?}");
    assert_eq!(counts.last(), Some(&3));
}

#[tokio::test]
async fn first_present_container_is_used() {
    let mut driver = FakeDriver::on(POST)
        .with_present(&["article", "main"])
        .with_steady(found(&[], &[]));
    scan_target(&mut driver, &target(), &settings(2, 10), &TestSink::new()).await;

    assert_eq!(driver.extraction_args[0]["container"].as_str(), Some("article"));
    assert_eq!(driver.scrolls[0], ScrollTarget::Container("article".to_string()));
}

#[tokio::test]
async fn missing_containers_fall_back_to_whole_page() {
    let mut driver = FakeDriver::on(POST).with_steady(found(&[], &[]));
    scan_target(&mut driver, &target(), &settings(2, 10), &TestSink::new()).await;

    assert!(driver.extraction_args[0]["container"].is_null());
    assert_eq!(driver.scrolls[0], ScrollTarget::Page);
}

#[tokio::test]
async fn drift_away_from_target_triggers_renavigation() {
    let mut driver = FakeDriver::on(&format!("{POST}?igsh=xyz")).with_steady(found(&[], &[]));
    driver
        .redirect_on_scroll
        .push_back("https://site.example/accounts/login/?next=%2Fp%2FABC123%2F".to_string());
    scan_target(&mut driver, &target(), &settings(3, 10), &TestSink::new()).await;

    // The query-string variant is not drift; the login bounce is.
    assert_eq!(driver.navigations, vec![POST.to_string()]);
    assert_eq!(driver.url, POST);
}

#[tokio::test]
async fn load_more_and_replies_are_clicked_inside_container() {
    let mut driver = FakeDriver::on(POST)
        .with_present(&["article"])
        .with_steady(found(&[], &[]));
    driver.clickable.insert(LOAD_MORE.to_string());
    driver.clickable.insert("span".to_string());
    scan_target(&mut driver, &target(), &settings(1, 10), &TestSink::new()).await;

    let scoped_load_more = format!("article {LOAD_MORE}");
    let clicked: Vec<_> = driver.clicks.iter().map(|l| l.css.as_str()).collect();
    assert_eq!(clicked, vec![scoped_load_more.as_str(), "article span"]);
    assert_eq!(driver.clicks[1].text.as_deref(), Some("View all"));
}

#[tokio::test]
async fn failing_clicks_do_not_abort_the_scan() {
    let mut driver = FakeDriver::on(POST).with_steady(found(&["a"], &[]));
    driver.failing_clicks = true;
    let report = scan_target(&mut driver, &target(), &settings(10, 2), &TestSink::new()).await;

    assert_eq!(report.stop, StopReason::Exhausted);
    assert_eq!(report.outcome.stickers.len(), 1);
}
