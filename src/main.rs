//! Standalone CLI for tuning the recoloring rules
//!
//! Replays a page fixture through the scanner on a virtual clock and
//! prints the inline overrides it ends up with.
//!
//! Run with: cargo run --features cli --bin espn-dark-cli -- demos/boxscore.json

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use espn_dark_mode::sim::{ElementReport, PageFixture};
    use espn_dark_mode::{DarkMode, ScanSchedule};
    use serde::Serialize;
    use tracing::info;
    use tracing_subscriber::{fmt, EnvFilter};

    #[derive(Serialize)]
    struct Report {
        url: String,
        settle_ms: u64,
        callbacks: usize,
        elements: usize,
        overridden: usize,
        overrides: Vec<ElementReport>,
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,espn_dark_mode=debug"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: espn-dark-cli <fixture.json>")?;

    let schedule = match std::env::var("ESPN_DARK_SCHEDULE") {
        Ok(file) => {
            info!(file = %file, "Loading schedule");
            ScanSchedule::from_file(&file)?
        }
        Err(_) => ScanSchedule::default(),
    };
    let settle_ms = schedule.settle_time_ms();

    let fixture = PageFixture::from_json(&std::fs::read_to_string(&path)?)?;
    let url = fixture.url.clone();
    info!(fixture = %path, url = %url, "Replaying page");

    let mut dark_mode = DarkMode::new(fixture.into_host(), schedule);
    dark_mode.preload();
    dark_mode.activate();
    let callbacks = dark_mode.advance(settle_ms);

    let host = dark_mode.host();
    let report = Report {
        url,
        settle_ms,
        callbacks,
        elements: espn_dark_mode::Dom::all_elements(host).len(),
        overridden: host.overridden_count(),
        overrides: host.report(),
    };
    info!(
        elements = report.elements,
        overridden = report.overridden,
        callbacks,
        "Settled"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
