//! Configuration pointing every archive at a mock server

use radioquery::{Config, RetryConfig};
use std::path::Path;
use std::time::Duration;
use wiremock::MockServer;

/// FIRST CGI path on the mock server
pub const FIRST_PATH: &str = "/cgi-bin/firstcutout";
/// NVSS CGI path on the mock server
pub const NVSS_PATH: &str = "/cgi-bin/postage.pl";
/// LoTSS cutout path on the mock server
pub const LOTSS_PATH: &str = "/dr2-cutout.fits";
/// VLASS tile directory on the mock server
pub const VLASS_DIR: &str = "/vlass/quicklook/ql_median_stack/";

/// Config with all endpoints on `server`, output under `root` and millisecond backoff
pub fn mock_config(server: &MockServer, root: &Path) -> Config {
    let mut config = Config {
        output_root: root.to_path_buf(),
        ..Default::default()
    };
    config.endpoints.first_url = format!("{}{FIRST_PATH}", server.uri());
    config.endpoints.nvss_url = format!("{}{NVSS_PATH}", server.uri());
    config.endpoints.lotss_url = format!("{}{LOTSS_PATH}", server.uri());
    config.endpoints.vlass_tile_url = format!("{}{VLASS_DIR}", server.uri());
    config.http.request_timeout = Duration::from_secs(5);
    config.http.tile_timeout = Duration::from_secs(5);
    config.retry = RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        backoff_multiplier: 2.0,
        jitter: false,
    };
    config
}
