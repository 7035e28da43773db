use pageload_harness::config::Config;
use std::env;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let config_path = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("crates/pageload-harness/scenarios/site.toml")
    };

    println!("Validating config file: {}", config_path.display());

    let config = Config::from_file(&config_path)?;
    let run = &config.run;

    println!("\n✓ Successfully parsed configuration!");
    println!("\nRun: {}", run.name);
    println!("Base URL: {}", run.base_url);
    println!("Iterations: {}", run.iterations);
    println!("Settle delay: {:?}", run.settle_delay);
    println!("Navigation timeout: {:?}", run.navigation_timeout);
    println!("Retries: {}, skip policy: {:?}", run.retries, run.skip_policy);

    println!("\nPages ({}):", run.pages.len());
    for (i, page) in run.pages.iter().enumerate() {
        println!("  {}. {}", i + 1, config.page_url(page));
    }

    let policy = config.policy();
    println!("\nThresholds:");
    for (metric, limit) in policy.avg.iter() {
        println!("  {} avg: {}ms", metric.label(), limit);
    }
    for (metric, limit) in policy.p90.iter() {
        println!("  {} p90: {}ms", metric.label(), limit);
    }
    println!("  Outlier ceiling: {}ms", policy.max_load_time);

    if run.check_budgets {
        println!("\nBudgets ({}):", run.budget_page);
        println!("  Resources: {}", policy.budgets.max_resources);
        println!("  Transfer: {} bytes", policy.budgets.max_transfer_bytes);
        println!("  DOM nodes: {}", policy.budgets.max_dom_nodes);
    }

    println!("\n✓ All validations passed!");

    Ok(())
}
