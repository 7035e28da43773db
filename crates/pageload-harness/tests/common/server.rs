//! Site-under-test helpers

/// Base URL of the site to measure, `PERF_BASE_URL` or a local dev server
pub fn base_url() -> String {
    std::env::var("PERF_BASE_URL").unwrap_or_else(|_| "http://localhost:4000".to_string())
}

/// Check if a local server is available
pub async fn is_server_available(url: &str) -> bool {
    match reqwest::get(url).await {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    }
}

/// Macro to skip test if the site under test isn't running
#[macro_export]
macro_rules! require_local_server {
    ($url:expr) => {{
        if !server::is_server_available($url).await {
            eprintln!("Skipping: no site running at {}", $url);
            eprintln!("  Start one, or point PERF_BASE_URL at a running site.");
            return;
        }
    }};
}
