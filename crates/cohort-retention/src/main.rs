mod bootstrap;
mod render;

use anyhow::{Context, Result};
use cohort_core::settings::Settings;
use cohort_data::analysis::analyze_path;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("cohort-retention v{} starting", env!("CARGO_PKG_VERSION"));

    let input = settings.input_path()?;
    tracing::info!(
        "Input: {}, metric: {}, format: {}",
        input.display(),
        settings.metric,
        settings.format
    );

    let report = analyze_path(input)?;

    let rendered = match settings.format.as_str() {
        "json" => render::render_json(&report, &settings.metric)?,
        _ => render::render_text(&report, &settings.metric),
    };

    match &settings.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("writing output to {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => print!("{}", rendered),
    }

    Ok(())
}
