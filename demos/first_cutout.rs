//! Cutout download example
//!
//! Fetches a cutout of one position from a survey and prints where it landed.
//!
//! ```bash
//! cargo run --example first_cutout -- FIRST 10h50m07.270s +30d40m37.52s 5
//! ```
//!
//! Running it twice reuses the file from the first run.

use radioquery::{Config, CutoutQuery, DEFAULT_SIZE_ARCMIN, SkyPosition, Survey};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let survey: Survey = args.next().unwrap_or_else(|| "FIRST".to_string()).parse()?;
    let ra = args.next().unwrap_or_else(|| "10h50m07.270s".to_string());
    let dec = args.next().unwrap_or_else(|| "+30d40m37.52s".to_string());
    let size = match args.next() {
        Some(size) => size.parse::<f64>()?,
        None => DEFAULT_SIZE_ARCMIN,
    };

    // Optional JSON configuration, e.g. to change the output root
    let config = match std::env::var("RADIOQUERY_CONFIG") {
        Ok(path) => Config::from_json_file(std::path::Path::new(&path))?,
        Err(_) => Config::default(),
    };

    let position = SkyPosition::from_sexagesimal(&ra, &dec)?;
    let query = CutoutQuery::with_config(survey, position, size, config)?;
    let result = query.download_image().await;

    if result.success {
        let how = if result.fetched { "downloaded" } else { "already on disk" };
        println!("✓ {survey} cutout {how}: {}", result.path.display());
    } else if let Some(error) = result.error {
        println!("✗ {survey} cutout not retrieved ({error})");
        println!("  expected path: {}", result.path.display());
    }

    Ok(())
}
