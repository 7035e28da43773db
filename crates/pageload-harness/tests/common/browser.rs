//! Browser helpers for tests that need a real Chrome

use pageload_harness::driver::{ChromeDriver, ChromeOptions};
use std::path::PathBuf;

/// Check if browser tests should be skipped (when Chrome isn't available)
pub fn should_skip() -> bool {
    std::env::var("SKIP_BROWSER_TESTS").is_ok()
}

/// Macro to skip test if Chrome isn't available
#[macro_export]
macro_rules! skip_if_no_chrome {
    () => {
        if browser::should_skip() {
            eprintln!("Skipping test: SKIP_BROWSER_TESTS is set");
            return;
        }
    };
}

/// Find Chrome for Testing installed by Puppeteer
pub fn find_chrome_for_testing() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    let cache = std::path::Path::new(&home).join(".cache/puppeteer/chrome");

    let mut versions: Vec<PathBuf> = std::fs::read_dir(&cache)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    versions.sort_by(|a, b| b.cmp(a));

    versions.into_iter().find_map(|version| {
        [
            "chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing",
            "chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing",
            "chrome-linux64/chrome",
        ]
        .iter()
        .map(|binary| version.join(binary))
        .find(|path| path.exists())
    })
}

/// Options with a fresh profile directory per call, so parallel tests never
/// share browser state
pub fn test_options() -> ChromeOptions {
    use std::sync::atomic::{AtomicU64, Ordering};
    static BROWSER_ID: AtomicU64 = AtomicU64::new(0);

    let id = BROWSER_ID.fetch_add(1, Ordering::SeqCst);
    let user_data_dir = std::env::temp_dir().join(format!(
        "pageload-harness-{}-{}",
        std::process::id(),
        id
    ));
    if user_data_dir.exists() {
        let _ = std::fs::remove_dir_all(&user_data_dir);
    }

    ChromeOptions {
        chrome_executable: find_chrome_for_testing(),
        user_data_dir: Some(user_data_dir),
        ..ChromeOptions::default()
    }
}

/// Try to launch a driver, skip test if Chrome not found
pub async fn require_driver() -> Option<ChromeDriver> {
    match ChromeDriver::launch(test_options()).await {
        Ok(driver) => Some(driver),
        Err(e) => {
            if e.to_string().contains("Could not auto detect") {
                eprintln!("Skipping: Chrome not installed ({})", e);
                None
            } else {
                panic!("Unexpected browser error: {}", e);
            }
        }
    }
}
