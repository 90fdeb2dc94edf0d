use std::path::PathBuf;

use clap::Parser;
use tokio::task::JoinHandle;
use stylegen::logger::{self, LoggerConfig};
use stylegen::{
    export_image, suggested_file_stem, Config, Controller, DirectoryTarget, ExportOutcome,
    GenerationOutcome, Snapshot,
};

/// Generate a styled image of one subject with Gemini.
///
///   stylegen "red fox" watercolor --out shots
#[derive(Parser, Debug)]
#[command(name = "stylegen")]
#[command(about = "Generate a styled image of a single subject with Google Gemini")]
struct Args {
    /// What to draw (e.g. "red fox")
    // Blank values are passed through so the controller reports them.
    #[arg(default_value = "")]
    subject: String,

    /// The style to draw it in (e.g. watercolor)
    #[arg(default_value = "")]
    style: String,

    /// Directory the image is saved into
    #[arg(long, env = "STYLEGEN_OUTPUT_DIR")]
    out: Option<PathBuf>,

    /// Show the result without saving it
    #[arg(long)]
    no_save: bool,
}

fn render(snapshot: &Snapshot) {
    match &snapshot.outcome {
        GenerationOutcome::Empty => {}
        GenerationOutcome::InFlight => println!("⏳ Generating..."),
        GenerationOutcome::Blocked => {
            println!(
                "🚫 The image was blocked by safety filters. Try a different subject or style."
            )
        }
        GenerationOutcome::Failed { message, .. } => println!("❌ {}", message),
        GenerationOutcome::Succeeded { payload } => println!(
            "✅ Image ready ({}, {} base64 characters)",
            payload.mime_type,
            payload.base64_data.len()
        ),
    }
}

/// Waits for the renderer to drain the channel. Returns false if it panicked.
async fn finish_rendering(renderer: JoinHandle<()>) -> bool {
    match renderer.await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Renderer task failed: {}", e);
            false
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    logger::init_with_config(LoggerConfig::from_env())?;
    if !dotenv_loaded {
        log::debug!("No .env file found, using process environment");
    }

    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(dir) = args.out.clone() {
        config = config.with_output_dir(dir);
    }
    log::info!("Model: {}", config.gemini.model);
    log::info!(
        "API key: {}",
        if config.gemini.credential().is_some() { "✅" } else { "❌" }
    );

    let mut controller = Controller::new(&config.gemini)?;

    let mut rx = controller.subscribe();
    let renderer = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            render(&snapshot);
        }
    });

    let outcome = controller.submit(&args.subject, &args.style).await;

    for line in controller.trace().lines() {
        log::debug!("  {}", line);
    }
    let name = controller
        .last_request()
        .map(|r| suggested_file_stem(&r.subject, &r.style))
        .unwrap_or_else(|| suggested_file_stem("", ""));

    // Dropping the controller closes the channel once the final state is rendered.
    drop(controller);
    finish_rendering(renderer).await;

    let exit_code = match &outcome {
        GenerationOutcome::Succeeded { .. } if !args.no_save => {
            let target = DirectoryTarget::new(&config.output_dir);
            match export_image(outcome.payload(), &name, &target) {
                Ok(ExportOutcome::Saved(path)) => {
                    println!("💾 Saved {}", path.display());
                    0
                }
                Ok(ExportOutcome::NothingToExport) => 0,
                Err(e) => {
                    println!("❌ {}", e);
                    1
                }
            }
        }
        GenerationOutcome::Succeeded { .. } | GenerationOutcome::Blocked => 0,
        _ => 1,
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_positional_and_flags() {
        let parsed =
            Args::try_parse_from(["stylegen", "fox", "watercolor", "--out", "shots", "--no-save"])
                .unwrap();
        assert_eq!(parsed.subject, "fox");
        assert_eq!(parsed.style, "watercolor");
        assert_eq!(parsed.out, Some(PathBuf::from("shots")));
        assert!(parsed.no_save);
    }

    #[test]
    fn missing_values_stay_blank() {
        let parsed = Args::try_parse_from(["stylegen", "fox"]).unwrap();
        assert_eq!(parsed.subject, "fox");
        assert_eq!(parsed.style, "");
        assert!(!parsed.no_save);

        let parsed = Args::try_parse_from(["stylegen"]).unwrap();
        assert_eq!(parsed.subject, "");
        assert!(Args::try_parse_from(["stylegen", "fox", "ink", "--out"]).is_err());
    }

    #[tokio::test]
    async fn renderer_panic_is_reported_not_propagated() {
        assert!(finish_rendering(tokio::spawn(async {})).await);

        let renderer = tokio::spawn(async { panic!("render failed") });
        assert!(!finish_rendering(renderer).await);
    }
}
