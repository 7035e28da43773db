//! End-to-end runs against a scripted driver
//!
//! Run with: cargo test -p pageload-harness --test runner_scenarios

#[path = "common/scripted.rs"]
mod scripted;

use pageload_harness::config::{Config, MetricLimits, SkipPolicy};
use pageload_harness::evaluate::{Check, Outlier, ResourceSnapshot, Verdict};
use pageload_harness::runner::{PageStatus, PerfRunner};
use pageload_harness::stats::{aggregate, SampleSet};
use pageload_harness::timing::Metric;
use pageload_harness::PerfError;
use pretty_assertions::assert_eq;
use scripted::{Load, ScriptedDriver};

const BASE_URL: &str = "http://site.test";

fn url(path: &str) -> String {
    format!("{}{}", BASE_URL, path)
}

/// Budgets off, no settle delay, default limits
fn config(pages: &[&str], iterations: u32) -> Config {
    let pages = pages
        .iter()
        .map(|p| format!("\"{}\"", p))
        .collect::<Vec<_>>()
        .join(", ");
    let toml = format!(
        r#"
        [run]
        name = "Scripted site"
        base_url = "{}"
        pages = [{}]
        iterations = {}
        settle_delay_ms = 0
        check_budgets = false
        "#,
        BASE_URL, pages, iterations
    );
    Config::from_str(&toml).unwrap()
}

fn slow_tail_loads() -> Vec<f64> {
    let mut loads = vec![300.0; 9];
    loads.insert(6, 5000.0);
    loads
}

#[tokio::test]
async fn test_single_catastrophic_load_is_an_outlier_not_an_average_failure() {
    let mut config = config(&["/"], 10);
    // Nearest-rank p90 of ten samples is the slowest one, so leave room for it.
    config.thresholds.p90.load_complete = Some(6000.0);

    let driver = ScriptedDriver::new().with_load_times(&url("/"), &slow_tail_loads());
    let report = PerfRunner::new(driver).run(&config).await.unwrap();

    let page = &report.pages[0];
    let summary = page.summary.as_ref().unwrap();
    assert_eq!(page.status, PageStatus::Pass);
    assert_eq!(summary.count, 10);
    assert_eq!(summary.load_complete.avg, 770.0);
    assert_eq!(summary.load_complete.p90, 5000.0);
    assert!(page.checks.iter().all(|c| c.verdict.is_pass()));

    let aggregate = report.aggregate.as_ref().unwrap();
    assert_eq!(aggregate.summary.load_complete.avg, 770.0);
    assert!(aggregate.checks.iter().all(|c| c.verdict.is_pass()));

    assert_eq!(
        report.outliers,
        vec![Outlier {
            page: "/".to_string(),
            iteration: 6,
            value: 5000.0,
        }]
    );
    assert!(!report.passed);
    assert_eq!(
        report.failures,
        vec!["Found 1 loads exceeding 3000ms: / run 7: 5000ms".to_string()]
    );
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn test_default_p90_limit_flags_the_slow_tail() {
    let config = config(&["/"], 10);
    let driver = ScriptedDriver::new().with_load_times(&url("/"), &slow_tail_loads());
    let report = PerfRunner::new(driver).run(&config).await.unwrap();

    let page = &report.pages[0];
    assert_eq!(page.status, PageStatus::Fail);

    let avg = page
        .checks
        .iter()
        .find(|c| c.check == Check::Average(Metric::LoadComplete))
        .unwrap();
    let p90 = page
        .checks
        .iter()
        .find(|c| c.check == Check::P90(Metric::LoadComplete))
        .unwrap();
    assert!(avg.verdict.is_pass());
    assert_eq!(
        p90.verdict,
        Verdict::Fail {
            measured: 5000.0,
            limit: 1500.0
        }
    );
    assert!(report
        .failures
        .contains(&"/: Load Complete P90 5000ms exceeds 1500ms".to_string()));
}

#[tokio::test]
async fn test_fast_site_passes() {
    let config = config(&["/", "/about/"], 3);
    let driver = ScriptedDriver::new()
        .with_load_times(&url("/"), &[200.0, 220.0, 240.0])
        .with_load_times(&url("/about/"), &[300.0, 310.0, 320.0]);
    let runner = PerfRunner::new(driver);
    let report = runner.run(&config).await.unwrap();

    assert!(report.passed, "failures: {:?}", report.failures);
    assert_eq!(report.exit_code(), 0);
    assert!(report.outliers.is_empty());
    assert_eq!(
        runner.driver().navigations(),
        vec![
            url("/"),
            url("/"),
            url("/"),
            url("/about/"),
            url("/about/"),
            url("/about/"),
        ]
    );
}

#[tokio::test]
async fn test_page_set_aggregate_uses_concatenated_samples() {
    let config = config(&["/", "/about/"], 2);
    let driver = ScriptedDriver::new()
        .with_load_times(&url("/"), &[100.0, 100.0])
        .with_load_times(&url("/about/"), &[100.0, 900.0]);
    let report = PerfRunner::new(driver).run(&config).await.unwrap();

    let all = SampleSet::concat(report.pages.iter().map(|p| &p.samples));
    let expected = aggregate(&all).unwrap();

    let aggregate = report.aggregate.unwrap();
    assert_eq!(aggregate.page_count, 2);
    assert_eq!(aggregate.summary, expected);
    assert_eq!(aggregate.summary.count, 4);
    assert_eq!(aggregate.summary.load_complete.avg, 300.0);
    assert_eq!(aggregate.summary.load_complete.p90, 900.0);
}

#[tokio::test]
async fn test_lenient_policy_skips_failing_page() {
    let config = config(&["/", "/broken/"], 3);
    let driver = ScriptedDriver::new().with_load_times(&url("/"), &[200.0, 200.0, 200.0]);
    let report = PerfRunner::new(driver).run(&config).await.unwrap();

    let broken = &report.pages[1];
    assert_eq!(broken.status, PageStatus::Skipped);
    assert!(broken.summary.is_none());
    assert!(broken.checks.is_empty());
    assert!(broken
        .skip_reason
        .as_deref()
        .unwrap()
        .contains("net::ERR_CONNECTION_REFUSED"));

    let aggregate = report.aggregate.as_ref().unwrap();
    assert_eq!(aggregate.page_count, 1);
    assert_eq!(Some(&aggregate.summary), report.pages[0].summary.as_ref());

    // A skipped page is reported, but does not fail the run on its own.
    assert!(report.passed, "failures: {:?}", report.failures);
    assert_eq!(report.skipped_pages().count(), 1);
}

#[tokio::test]
async fn test_strict_policy_aborts_on_failing_page() {
    let mut config = config(&["/broken/", "/"], 3);
    config.run.skip_policy = SkipPolicy::Strict;

    let driver = ScriptedDriver::new().with_load_times(&url("/"), &[200.0, 200.0, 200.0]);
    let runner = PerfRunner::new(driver);
    let err = runner.run(&config).await.unwrap_err();

    assert!(err.is_collection());
    assert_eq!(runner.driver().navigations(), vec![url("/broken/")]);
}

#[tokio::test]
async fn test_page_without_timing_is_skipped() {
    let config = config(&["/legacy/"], 2);
    let driver =
        ScriptedDriver::new().with_loads(&url("/legacy/"), [Load::NoTiming, Load::NoTiming]);
    let report = PerfRunner::new(driver).run(&config).await.unwrap();

    assert_eq!(report.pages[0].status, PageStatus::Skipped);
    assert!(report.pages[0]
        .skip_reason
        .as_deref()
        .unwrap()
        .contains("no navigation timing available"));
}

#[tokio::test]
async fn test_every_page_skipped_fails_the_run() {
    let config = config(&["/a/", "/b/"], 2);
    let report = PerfRunner::new(ScriptedDriver::new())
        .run(&config)
        .await
        .unwrap();

    assert!(report.aggregate.is_none());
    assert_eq!(report.evaluated_pages().count(), 0);
    assert!(!report.passed);
    assert_eq!(
        report.failures,
        vec!["No pages were evaluated: every page was skipped".to_string()]
    );
}

#[tokio::test]
async fn test_every_page_skipped_can_be_allowed() {
    let mut config = config(&["/a/"], 2);
    config.run.allow_no_evaluated_pages = true;

    let report = PerfRunner::new(ScriptedDriver::new())
        .run(&config)
        .await
        .unwrap();

    assert!(report.aggregate.is_none());
    assert!(report.passed);
}

#[tokio::test]
async fn test_retry_recovers_flaky_page() {
    let mut config = config(&["/flaky/"], 3);
    config.run.retries = 1;

    let page = url("/flaky/");
    let driver = ScriptedDriver::new()
        .with_loads(
            &page,
            [
                Load::Timing(scripted::record(999.0)),
                Load::Fail("navigation timed out".to_string()),
            ],
        )
        .with_load_times(&page, &[200.0, 210.0, 220.0]);
    let report = PerfRunner::new(driver).run(&config).await.unwrap();

    let flaky = &report.pages[0];
    assert_eq!(flaky.status, PageStatus::Pass);
    assert_eq!(flaky.attempts, 2);
    // Samples from the failed attempt are discarded.
    let loads: Vec<f64> = flaky.samples.values(Metric::LoadComplete);
    assert_eq!(loads, vec![200.0, 210.0, 220.0]);
}

#[tokio::test]
async fn test_retries_exhausted_skips_page() {
    let mut config = config(&["/down/"], 1);
    config.run.retries = 2;

    let runner = PerfRunner::new(ScriptedDriver::new());
    let report = runner.run(&config).await.unwrap();

    assert_eq!(report.pages[0].status, PageStatus::Skipped);
    assert_eq!(report.pages[0].attempts, 3);
    assert_eq!(runner.driver().navigations().len(), 3);
}

#[tokio::test]
async fn test_cookies_cleared_before_every_load() {
    let config = config(&["/"], 4);
    let driver = ScriptedDriver::new().with_load_times(&url("/"), &[200.0; 4]);
    let runner = PerfRunner::new(driver);
    runner.run(&config).await.unwrap();
    assert_eq!(runner.driver().cookie_clears(), 4);

    let mut config = config;
    config.run.clear_cookies = false;
    let driver = ScriptedDriver::new().with_load_times(&url("/"), &[200.0; 4]);
    let runner = PerfRunner::new(driver);
    runner.run(&config).await.unwrap();
    assert_eq!(runner.driver().cookie_clears(), 0);
}

#[tokio::test]
async fn test_resource_budgets_are_checked_on_budget_page() {
    let mut config = config(&["/"], 2);
    config.run.check_budgets = true;

    let driver = ScriptedDriver::new()
        .with_load_times(&url("/"), &[200.0, 200.0])
        .with_resources(ResourceSnapshot {
            resource_count: 25,
            transfer_bytes: 100 * 1024,
            dom_nodes: 300,
        });
    let report = PerfRunner::new(driver).run(&config).await.unwrap();

    let budgets = report.budgets.as_ref().unwrap();
    assert_eq!(budgets.page, "/");
    assert_eq!(budgets.snapshot.unwrap().resource_count, 25);
    let verdicts: Vec<bool> = budgets.checks.iter().map(|c| c.verdict.is_fail()).collect();
    assert_eq!(verdicts, vec![true, false, false]);

    assert!(!report.passed);
    assert_eq!(
        report.failures,
        vec!["/: Resource count 25 exceeds 20".to_string()]
    );
}

#[tokio::test]
async fn test_unreachable_budget_page_is_skipped_when_lenient() {
    let mut config = config(&["/"], 2);
    config.run.check_budgets = true;
    config.run.budget_page = "/gone/".to_string();

    let driver = ScriptedDriver::new().with_load_times(&url("/"), &[200.0, 200.0]);
    let report = PerfRunner::new(driver).run(&config).await.unwrap();

    let budgets = report.budgets.unwrap();
    assert!(budgets.snapshot.is_none());
    assert_eq!(budgets.checks.len(), 3);
    assert!(budgets.checks.iter().all(|c| c.verdict.is_skipped()));
    assert!(report.passed);
}

#[tokio::test]
async fn test_unreachable_budget_page_aborts_when_strict() {
    let mut config = config(&["/"], 2);
    config.run.check_budgets = true;
    config.run.budget_page = "/gone/".to_string();
    config.run.skip_policy = SkipPolicy::Strict;

    let driver = ScriptedDriver::new().with_load_times(&url("/"), &[200.0, 200.0]);
    let err = PerfRunner::new(driver).run(&config).await.unwrap_err();
    assert!(err.is_collection());
}

#[tokio::test]
async fn test_custom_limits_only_check_listed_metrics() {
    let mut config = config(&["/"], 2);
    config.thresholds.avg = MetricLimits {
        load_complete: Some(250.0),
        ..MetricLimits::default()
    };
    config.thresholds.p90 = MetricLimits::default();

    let driver = ScriptedDriver::new().with_load_times(&url("/"), &[200.0, 300.0]);
    let report = PerfRunner::new(driver).run(&config).await.unwrap();

    let page = &report.pages[0];
    assert_eq!(page.checks.len(), 1);
    // 250 == 250 is within the limit.
    assert!(page.checks[0].verdict.is_pass());
    assert!(report.passed);
}

#[tokio::test]
async fn test_zero_iterations_is_rejected() {
    let mut config = config(&["/"], 1);
    config.run.iterations = 0;

    let err = PerfRunner::new(ScriptedDriver::new())
        .run(&config)
        .await
        .unwrap_err();
    assert!(matches!(err, PerfError::InvalidConfig(_)));
}

#[test]
fn test_empty_sample_set_cannot_be_aggregated() {
    assert_eq!(
        aggregate(&SampleSet::default()).unwrap_err(),
        PerfError::EmptySampleSet
    );
}
