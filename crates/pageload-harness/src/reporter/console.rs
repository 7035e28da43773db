//! Console reporter
//!
//! ASCII tables with status indicators.

use anyhow::Result;
use std::fmt::Write;

use crate::config::ThresholdPolicy;
use crate::evaluate::{Check, Verdict};
use crate::runner::{AggregateReport, BudgetReport, PageReport, PerfReport};
use crate::timing::Metric;

const RULE: &str = "────────────────────────────────────────────────────────────────";

/// Console format reporter
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn format(report: &PerfReport) -> Result<String> {
        let mut output = String::new();

        // Header
        writeln!(output)?;
        writeln!(output, "╔══════════════════════════════════════════════════════════════╗")?;
        writeln!(output, "║                   PAGE LOAD PERFORMANCE                      ║")?;
        writeln!(output, "╚══════════════════════════════════════════════════════════════╝")?;
        writeln!(output)?;

        writeln!(output, "Suite:     {}", report.suite_name)?;
        writeln!(output, "Base URL:  {}", report.base_url)?;
        writeln!(output, "Started:   {}", report.started_at)?;
        writeln!(output, "Duration:  {}ms", report.total_duration_ms)?;
        writeln!(output)?;

        let config = &report.config_summary;
        writeln!(output, "Configuration:")?;
        writeln!(output, "  Pages:           {}", config.page_count)?;
        writeln!(output, "  Iterations:      {}", config.iterations)?;
        writeln!(output, "  Settle Delay:    {}ms", config.settle_delay_ms)?;
        writeln!(output, "  Clear Cookies:   {}", config.clear_cookies)?;
        writeln!(output, "  Retries:         {}", config.retries)?;
        writeln!(output, "  Skip Policy:     {:?}", config.skip_policy)?;
        writeln!(output, "  Outlier Ceiling: {:.0}ms", config.thresholds.max_load_time)?;
        writeln!(output)?;

        match &report.aggregate {
            Some(aggregate) => Self::format_aggregate(&mut output, aggregate, &config.thresholds)?,
            None => {
                writeln!(output, "{}", RULE)?;
                writeln!(output, "All pages: no samples (every page was skipped)")?;
                writeln!(output)?;
            }
        }

        Self::format_pages(&mut output, &report.pages)?;

        if !report.outliers.is_empty() {
            writeln!(output, "Outliers (> {:.0}ms):", config.thresholds.max_load_time)?;
            for outlier in &report.outliers {
                writeln!(output, "  ✗ {}", outlier)?;
            }
            writeln!(output)?;
        }

        if let Some(budgets) = &report.budgets {
            Self::format_budgets(&mut output, budgets)?;
        }

        // Summary
        writeln!(output, "{}", RULE)?;
        let status = if report.passed { "PASSED" } else { "FAILED" };
        let status_symbol = if report.passed { "✓" } else { "✗" };
        writeln!(output, "Overall Status: {} {}", status_symbol, status)?;

        if !report.failures.is_empty() {
            writeln!(output)?;
            writeln!(output, "Failures:")?;
            for failure in &report.failures {
                writeln!(output, "  • {}", failure)?;
            }
        }

        writeln!(output)?;
        Ok(output)
    }

    fn format_aggregate(
        output: &mut String,
        aggregate: &AggregateReport,
        thresholds: &ThresholdPolicy,
    ) -> Result<()> {
        writeln!(output, "{}", RULE)?;
        writeln!(
            output,
            "All pages ({} pages, {} samples)",
            aggregate.page_count, aggregate.summary.count
        )?;
        writeln!(output, "{}", RULE)?;
        writeln!(output)?;

        writeln!(output, "  ┌────────────────────┬─────────┬─────────┬─────────────────┐")?;
        writeln!(output, "  │ Metric             │ Average │   P90   │ Threshold       │")?;
        writeln!(output, "  ├────────────────────┼─────────┼─────────┼─────────────────┤")?;

        for metric in Metric::ALL {
            let stats = aggregate.summary.stats(metric);
            let threshold = match (thresholds.avg.get(metric), thresholds.p90.get(metric)) {
                (None, None) => "-".to_string(),
                (avg, p90) => format!("{} / {}", format_limit(avg), format_limit(p90)),
            };
            writeln!(
                output,
                "  │ {:<18} │ {:>7.0} │ {:>7.0} │ {:<15} │",
                metric.label(),
                stats.avg,
                stats.p90,
                threshold
            )?;
        }

        writeln!(output, "  └────────────────────┴─────────┴─────────┴─────────────────┘")?;
        writeln!(output)?;

        for check in &aggregate.checks {
            if let Some(message) = check.failure_message() {
                writeln!(output, "  ✗ {}", message)?;
            }
        }
        if aggregate.checks.iter().any(|c| c.verdict.is_fail()) {
            writeln!(output)?;
        }
        Ok(())
    }

    fn format_pages(output: &mut String, pages: &[PageReport]) -> Result<()> {
        writeln!(output, "Per page (averages, ms):")?;
        writeln!(output, "  ┌──────────────────────┬─────────┬───────────┬─────────┬─────────┐")?;
        writeln!(output, "  │ Page                 │  TTFB   │ DOMLoaded │  Load   │ Status  │")?;
        writeln!(output, "  ├──────────────────────┼─────────┼───────────┼─────────┼─────────┤")?;

        for page in pages {
            let (ttfb, dcl, load) = match &page.summary {
                Some(summary) => (
                    format!("{:.0}", summary.ttfb.avg),
                    format!("{:.0}", summary.dom_content_loaded.avg),
                    format!("{:.0}", summary.load_complete.avg),
                ),
                None => ("-".to_string(), "-".to_string(), "-".to_string()),
            };
            writeln!(
                output,
                "  │ {:<20} │ {:>7} │ {:>9} │ {:>7} │ {:<7} │",
                page.path,
                ttfb,
                dcl,
                load,
                page.status.as_str()
            )?;
        }

        writeln!(output, "  └──────────────────────┴─────────┴───────────┴─────────┴─────────┘")?;
        writeln!(output)?;

        for page in pages {
            if let Some(reason) = &page.skip_reason {
                writeln!(output, "  {} skipped: {}", page.path, reason)?;
            }
            for check in &page.checks {
                if let Some(message) = check.failure_message() {
                    writeln!(output, "  ✗ {}: {}", page.path, message)?;
                }
            }
        }
        if pages
            .iter()
            .any(|p| p.skip_reason.is_some() || p.checks.iter().any(|c| c.verdict.is_fail()))
        {
            writeln!(output)?;
        }
        Ok(())
    }

    fn format_budgets(output: &mut String, budgets: &BudgetReport) -> Result<()> {
        writeln!(output, "Resource budgets ({}):", budgets.page)?;
        for result in &budgets.checks {
            let line = match &result.verdict {
                Verdict::Pass => {
                    let measured = budgets
                        .snapshot
                        .map(|s| match result.check {
                            Check::ResourceCount => s.resource_count.to_string(),
                            Check::TransferBytes => {
                                format!("{:.1}KB", s.transfer_bytes as f64 / 1024.0)
                            }
                            _ => s.dom_nodes.to_string(),
                        })
                        .unwrap_or_default();
                    format!("✓ {} {}", result.check, measured)
                }
                Verdict::Fail { .. } => {
                    format!("✗ {}", result.failure_message().unwrap_or_default())
                }
                Verdict::Skipped { reason } => format!("- {} skipped: {}", result.check, reason),
            };
            writeln!(output, "  {}", line)?;
        }
        writeln!(output)?;
        Ok(())
    }
}

fn format_limit(limit: Option<f64>) -> String {
    limit.map_or_else(|| "-".to_string(), |l| format!("{:.0}", l))
}
