//! Chrome DevTools Protocol driver
//!
//! A single headless Chrome instance with one page. All measurements of a
//! run go through that page, one navigation at a time.
//!
//! # Example
//!
//! ```no_run
//! use pageload_harness::driver::{ChromeDriver, ChromeOptions, PageDriver};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let driver = ChromeDriver::launch(ChromeOptions::default()).await?;
//! driver.navigate("http://localhost:4000/").await?;
//! println!("DOM nodes: {}", driver.dom_node_count().await?);
//! driver.close().await?;
//! # Ok(())
//! # }
//! ```

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::ClearBrowserCookiesParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use super::{PageDriver, DOM_NODE_COUNT_SCRIPT, RESOURCE_COUNT_SCRIPT, TRANSFER_BYTES_SCRIPT};
use crate::error::{PerfError, Result};
use crate::timing::{RawNavigationTiming, TimingEnvelope, NAVIGATION_TIMING_SCRIPT};

/// Launch options for [`ChromeDriver`]
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    /// Run without a visible window (default: true)
    pub headless: bool,
    /// Explicit Chrome binary; auto-detected when `None`
    pub chrome_executable: Option<PathBuf>,
    /// Viewport size in CSS pixels
    pub window_size: (u32, u32),
    /// Upper bound for a single navigation
    pub navigation_timeout: Duration,
    /// Profile directory; Chrome's default when `None`
    pub user_data_dir: Option<PathBuf>,
}

impl Default for ChromeOptions {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            window_size: (1280, 720),
            navigation_timeout: Duration::from_secs(30),
            user_data_dir: None,
        }
    }
}

impl ChromeOptions {
    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .window_size(self.window_size.0, self.window_size.1)
            .request_timeout(self.navigation_timeout);

        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        if let Some(dir) = &self.user_data_dir {
            builder = builder.user_data_dir(dir);
        }

        builder.build().map_err(PerfError::Browser)
    }
}

/// [`PageDriver`] backed by a chromiumoxide browser page
pub struct ChromeDriver {
    browser: Browser,
    page: Page,
    navigation_timeout: Duration,
    current_url: Mutex<String>,
    _handle: tokio::task::JoinHandle<()>,
}

impl ChromeDriver {
    /// Launch Chrome and open the page used for all measurements
    ///
    /// # Errors
    ///
    /// Returns [`PerfError::Browser`] if Chrome cannot be found or started.
    pub async fn launch(options: ChromeOptions) -> Result<Self> {
        info!("Launching browser for page-load measurement");
        let config = options.browser_config()?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| PerfError::Browser(format!("Failed to launch browser: {}", e)))?;

        // Spawn handler to process browser events
        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| PerfError::Browser(format!("Failed to create page: {}", e)))?;

        info!("Browser launched successfully");
        Ok(Self {
            browser,
            page,
            navigation_timeout: options.navigation_timeout,
            current_url: Mutex::new("about:blank".to_string()),
            _handle: handle,
        })
    }

    /// Close the page and shut the browser down
    pub async fn close(mut self) -> Result<()> {
        info!("Closing browser");
        if let Err(e) = self.page.close().await {
            warn!("Failed to close page: {}", e);
        }
        self.browser
            .close()
            .await
            .map_err(|e| PerfError::Browser(format!("Failed to close browser: {}", e)))?;
        Ok(())
    }

    fn current_url(&self) -> String {
        self.current_url
            .lock()
            .map(|url| url.clone())
            .unwrap_or_default()
    }

    /// Evaluate a script in the page and deserialize its result
    async fn query<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        let url = self.current_url();
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| PerfError::collection(&url, e))?;

        result
            .into_value::<T>()
            .map_err(|e| PerfError::collection(&url, format!("unexpected script result: {}", e)))
    }

    async fn query_count(&self, script: &str) -> Result<u64> {
        // JS numbers can arrive as floats
        let value: f64 = self.query(script).await?;
        Ok(value.max(0.0).round() as u64)
    }
}

impl PageDriver for ChromeDriver {
    #[instrument(skip(self))]
    async fn navigate(&self, url: &str) -> Result<()> {
        if let Ok(mut current) = self.current_url.lock() {
            *current = url.to_string();
        }

        debug!("Navigating to: {}", url);
        match timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(PerfError::collection(url, format!("navigation failed: {}", e))),
            Err(_) => Err(PerfError::collection(
                url,
                format!("navigation timed out after {:?}", self.navigation_timeout),
            )),
        }
    }

    async fn clear_cookies(&self) -> Result<()> {
        self.page
            .execute(ClearBrowserCookiesParams::default())
            .await
            .map_err(|e| {
                PerfError::collection(self.current_url(), format!("failed to clear cookies: {}", e))
            })?;
        Ok(())
    }

    async fn navigation_timing(&self) -> Result<Option<RawNavigationTiming>> {
        let envelope: TimingEnvelope = self.query(NAVIGATION_TIMING_SCRIPT).await?;
        Ok(envelope.timing)
    }

    async fn resource_count(&self) -> Result<u64> {
        self.query_count(RESOURCE_COUNT_SCRIPT).await
    }

    async fn transfer_bytes(&self) -> Result<u64> {
        self.query_count(TRANSFER_BYTES_SCRIPT).await
    }

    async fn dom_node_count(&self) -> Result<u64> {
        self.query_count(DOM_NODE_COUNT_SCRIPT).await
    }
}
