//! End-to-end tests of the analysis session with synthetic photos and mock ports.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::cast_possible_truncation)]

use roofscan_core::domain::{
    DamageKind, PhotoCategory, PhotoInput, Severity, MANUAL_REVIEW_CATEGORY, NO_DAMAGE_CATEGORY,
};
use roofscan_core::features::FeatureExtractor;
use roofscan_core::inference::LazyDetector;
use roofscan_core::pricing::{MarketCosts, RandomCostSampler, DEFAULT_SOURCE_LABEL};
use roofscan_core::AnalysisSession;
use roofscan_test_support::{
    counting_lazy, failing_lazy, FixedCostSampler, MockDetector, MockPricingSource,
    MockProgressSink, RangeEnd, SyntheticRoofBuilder as Roof,
};
use time::macros::datetime;

fn session(detector: MockDetector) -> AnalysisSession {
    AnalysisSession::new(LazyDetector::ready(detector))
        .with_sampler(Box::new(FixedCostSampler::new(RangeEnd::Max)))
}

fn healthy(category: PhotoCategory) -> PhotoInput {
    Roof::photo("healthy.png", category, &Roof::healthy(200, 200))
}

fn missing(category: PhotoCategory, ratio: f64) -> PhotoInput {
    Roof::photo("missing.png", category, &Roof::missing_shingles(200, 200, ratio))
}

fn market() -> MarketCosts {
    MarketCosts::industry_average(datetime!(2025-03-01 00:00 UTC))
}

#[test]
fn test_empty_batch_does_not_load_detector() {
    let (lazy, loads) = counting_lazy(MockDetector::empty());
    let mut session = AnalysisSession::new(lazy);
    let progress = MockProgressSink::new();

    let analysis = session.analyze(&[], &progress);

    assert!(analysis.findings.is_empty());
    assert_eq!(analysis.total_estimate, 0);
    assert!(!analysis.manual_review);
    assert_eq!(loads.count(), 0);
    assert!(progress.started().is_empty());
    assert_eq!(progress.finished_counts(), Some((0, 0)));
}

#[test]
fn test_severely_dark_shingles_are_severe() {
    let mut session = session(MockDetector::empty());

    let analysis = session.analyze(
        &[missing(PhotoCategory::Shingles, 0.35)],
        &MockProgressSink::new(),
    );

    assert_eq!(analysis.findings.len(), 1);
    let finding = &analysis.findings[0];
    assert_eq!(finding.category, "Asphalt Shingles");
    assert_eq!(finding.severity, Severity::Severe);
    assert_eq!(finding.cost_kind, Some(DamageKind::SevereDamage));
    assert_eq!(finding.estimated_cost, 15_000);
    assert_eq!(analysis.total_estimate, 15_000);
}

#[test]
fn test_damage_category_routes_like_shingles() {
    let mut session = session(MockDetector::empty());
    let analysis = session.analyze(
        &[missing(PhotoCategory::Damage, 0.2)],
        &MockProgressSink::new(),
    );
    assert_eq!(analysis.findings[0].category, "Asphalt Shingles");
    assert_eq!(analysis.findings[0].severity, Severity::Moderate);
}

#[test]
fn test_cluttered_gutters() {
    let detector = MockDetector::with_boxes(4, "debris", 0.9);
    let handle = detector.clone();
    let mut session = session(detector);

    let analysis = session.analyze(&[healthy(PhotoCategory::Gutters)], &MockProgressSink::new());

    assert_eq!(handle.calls(), 1);
    assert_eq!(analysis.findings.len(), 1);
    assert_eq!(analysis.findings[0].category, "Gutter System");
    assert_eq!(analysis.findings[0].severity, Severity::Minor);
}

#[test]
fn test_unsure_detections_do_not_count() {
    let mut session = session(MockDetector::with_boxes(6, "debris", 0.3));
    let analysis = session.analyze(&[healthy(PhotoCategory::Gutters)], &MockProgressSink::new());
    assert_eq!(analysis.findings[0].category, "Overall Assessment");
}

#[test]
fn test_detector_load_failure_falls_back_to_manual_review() {
    let (lazy, loads) = failing_lazy("weights not found");
    let mut session = AnalysisSession::new(lazy);
    let photos = [healthy(PhotoCategory::General), missing(PhotoCategory::Shingles, 0.4)];

    for _ in 0..2 {
        let progress = MockProgressSink::new();
        let analysis = session.analyze(&photos, &progress);

        assert!(analysis.manual_review);
        assert_eq!(analysis.findings.len(), 1);
        assert_eq!(analysis.findings[0].category, MANUAL_REVIEW_CATEGORY);
        assert_eq!(analysis.findings[0].estimated_cost, 0);
        assert_eq!(analysis.total_estimate, 0);
        assert!(progress.started().is_empty());
    }
    assert_eq!(loads.count(), 1);
}

#[test]
fn test_progress_reports_every_photo_in_order() {
    let mut session = session(MockDetector::empty());
    let progress = MockProgressSink::new();
    let photos = [
        healthy(PhotoCategory::General),
        healthy(PhotoCategory::Vents),
        missing(PhotoCategory::Shingles, 0.2),
    ];

    session.analyze(&photos, &progress);

    assert_eq!(progress.started(), vec![(1, 3), (2, 3), (3, 3)]);
    assert_eq!(progress.finished_counts(), Some((3, 0)));
}

#[test]
fn test_corrupt_photo_is_skipped() {
    let mut session = session(MockDetector::empty());
    let progress = MockProgressSink::new();
    let photos = [
        Roof::corrupt("broken.jpg", PhotoCategory::Shingles),
        missing(PhotoCategory::Shingles, 0.35),
    ];

    let analysis = session.analyze(&photos, &progress);

    assert_eq!(analysis.skipped.len(), 1);
    assert_eq!(analysis.skipped[0].index, 0);
    assert_eq!(analysis.skipped[0].label, "broken.jpg");
    assert_eq!(analysis.findings.len(), 1);
    assert_eq!(analysis.findings[0].id, 1);
    assert_eq!(progress.started().len(), 2);
    assert_eq!(progress.skipped_count(), 1);
    assert_eq!(progress.finished_counts(), Some((1, 1)));
}

#[test]
fn test_failing_detection_skips_photo() {
    let mut session = session(MockDetector::failing("tensor shape mismatch"));
    let analysis = session.analyze(&[healthy(PhotoCategory::Gutters)], &MockProgressSink::new());

    assert!(!analysis.manual_review);
    assert_eq!(analysis.skipped.len(), 1);
    assert!(analysis.skipped[0].reason.contains("tensor shape mismatch"));
    assert_eq!(analysis.findings.len(), 1);
    assert_eq!(analysis.findings[0].category, NO_DAMAGE_CATEGORY);
}

#[test]
fn test_all_photos_unreadable_still_yields_a_finding() {
    let mut session = session(MockDetector::empty());
    let photos = [
        Roof::corrupt("a.jpg", PhotoCategory::General),
        Roof::corrupt("b.jpg", PhotoCategory::Chimney),
    ];

    let analysis = session.analyze(&photos, &MockProgressSink::new());

    assert_eq!(analysis.findings.len(), 1);
    assert_eq!(analysis.findings[0].category, NO_DAMAGE_CATEGORY);
    assert_eq!(analysis.findings[0].estimated_cost, 0);
    assert_eq!(analysis.skipped.len(), 2);
}

#[test]
fn test_healthy_roof_reports_no_damage() {
    let mut session = session(MockDetector::empty());
    let analysis = session.analyze(&[healthy(PhotoCategory::Shingles)], &MockProgressSink::new());

    assert_eq!(analysis.findings.len(), 1);
    assert_eq!(analysis.findings[0].category, "Overall Assessment");
    assert_eq!(analysis.findings[0].estimated_cost, 0);
    assert!(!analysis.has_damage());
}

#[test]
fn test_flat_roof_is_fair_with_fixed_cost() {
    let mut session = session(MockDetector::empty());
    let photo = Roof::photo("flat.png", PhotoCategory::General, &Roof::uniform(120, 120, 150));

    let analysis = session.analyze(&[photo], &MockProgressSink::new());

    assert_eq!(analysis.findings[0].estimated_cost, 800);
    assert_eq!(analysis.findings[0].cost_kind, None);
}

#[test]
fn test_ids_are_sequential_and_total_is_exact() {
    let mut session = AnalysisSession::new(LazyDetector::ready(MockDetector::empty()))
        .with_sampler(Box::new(RandomCostSampler::seeded(7)));
    let photos = [
        missing(PhotoCategory::Shingles, 0.2),
        Roof::photo("rust.png", PhotoCategory::Flashing, &Roof::rusty_flashing(200, 200, 0.2)),
        healthy(PhotoCategory::Vents),
        Roof::photo("cracks.png", PhotoCategory::Shingles, &Roof::cracked(200, 200)),
        missing(PhotoCategory::Chimney, 0.4),
    ];

    let analysis = session.analyze(&photos, &MockProgressSink::new());

    let ids: Vec<u32> = analysis.findings.iter().map(|f| f.id).collect();
    let expected: Vec<u32> = (1..=ids.len() as u32).collect();
    assert_eq!(ids, expected);

    let sum: u64 = analysis
        .findings
        .iter()
        .map(|f| u64::from(f.estimated_cost))
        .sum();
    assert_eq!(analysis.total_estimate, sum);

    for finding in &analysis.findings {
        if let Some(kind) = finding.cost_kind {
            let range = session.pricing().range(kind);
            assert!(
                range.contains(finding.estimated_cost),
                "{} cost {} outside {range}",
                finding.category,
                finding.estimated_cost
            );
        }
    }
}

#[test]
fn test_findings_follow_photo_order() {
    let mut session = session(MockDetector::empty());
    let photos = [
        Roof::photo("rust.png", PhotoCategory::Flashing, &Roof::rusty_flashing(200, 200, 0.2)),
        healthy(PhotoCategory::Vents),
    ];

    let analysis = session.analyze(&photos, &MockProgressSink::new());
    let categories: Vec<&str> = analysis.findings.iter().map(|f| f.category.as_str()).collect();
    assert_eq!(categories, ["Metal Flashing", "Roof Ventilation"]);
}

#[test]
fn test_pricing_refresh_runs_once() {
    let source = MockPricingSource::ok(market());
    let mut session = session(MockDetector::empty()).with_pricing_source(Box::new(source.clone()));
    let photos = [missing(PhotoCategory::Shingles, 0.35)];

    let first = session.analyze(&photos, &MockProgressSink::new());
    let second = session.analyze(&photos, &MockProgressSink::new());

    assert_eq!(source.fetch_count(), 1);
    assert_eq!(first.pricing_source, "Industry data (2025)");
    assert_eq!(second.pricing_source, "Industry data (2025)");
    assert!(session.pricing().is_refreshed());
}

#[test]
fn test_failed_refresh_only_changes_costs() {
    let photos = [
        missing(PhotoCategory::Shingles, 0.35),
        Roof::photo("rust.png", PhotoCategory::Flashing, &Roof::rusty_flashing(200, 200, 0.2)),
        healthy(PhotoCategory::Gutters),
    ];

    let failing = MockPricingSource::failing("connection refused");
    let mut offline = session(MockDetector::empty()).with_pricing_source(Box::new(failing.clone()));
    let mut online =
        session(MockDetector::empty()).with_pricing_source(Box::new(MockPricingSource::ok(market())));

    let degraded = offline.analyze(&photos, &MockProgressSink::new());
    offline.analyze(&photos, &MockProgressSink::new());
    let refreshed = online.analyze(&photos, &MockProgressSink::new());

    assert_eq!(failing.fetch_count(), 1);
    assert_eq!(degraded.pricing_source, DEFAULT_SOURCE_LABEL);

    let shape = |a: &roofscan_core::DamageAnalysis| -> Vec<(String, Severity)> {
        a.findings
            .iter()
            .map(|f| (f.category.clone(), f.severity))
            .collect()
    };
    assert_eq!(shape(&degraded), shape(&refreshed));
}

#[test]
fn test_feature_extraction_is_deterministic() {
    let extractor = FeatureExtractor::default();
    let image = Roof::missing_shingles(240, 180, 0.25).to_rgb8();
    assert_eq!(extractor.extract(&image), extractor.extract(&image));
}

#[test]
fn test_sampler_sees_table_ranges() {
    let sampler = FixedCostSampler::new(RangeEnd::Min);
    let mut session = AnalysisSession::new(LazyDetector::ready(MockDetector::empty()))
        .with_sampler(Box::new(sampler.clone()));

    let analysis = session.analyze(&[missing(PhotoCategory::Shingles, 0.35)], &MockProgressSink::new());

    assert_eq!(sampler.ranges(), vec![DamageKind::SevereDamage.default_range()]);
    assert_eq!(analysis.findings[0].estimated_cost, 8_000);
}
