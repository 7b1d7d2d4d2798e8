//! tessglyph - extract glyph detail and/or quick text via Tesseract
//!
//!     -c [config] -e [engine] -i [image] -l [lang] -p [psm] -o [output]
//!     -q (quick text only) -b (quick text and XML)
//!
//! Flag codes for `-p` and `-e` are this tool's own numbering; see
//! `engine::PageSegMode::from_code` and `engine::EngineMode::from_code`.

use std::env;
use std::process::ExitCode;

use anyhow::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

use tessglyph::alto::{self, Policy};
use tessglyph::config::Config;
use tessglyph::engine::tesseract::TesseractSession;
use tessglyph::engine::EngineError;

fn main() -> ExitCode {
    // Logs go to stderr; stdout is reserved for the quick-text output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = match Config::parse(&args) {
        Ok(config) => config,
        Err(usage) => {
            // Historical contract: a missing flag value diagnoses on
            // stderr but the process still exits 0.
            eprintln!("{usage}");
            return ExitCode::SUCCESS;
        }
    };

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            let code = err
                .downcast_ref::<EngineError>()
                .map(EngineError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn run(config: &Config) -> Result<()> {
    // The session owns the engine handle and the decoded image; both are
    // released when it drops, whichever branch below runs or fails.
    let mut session = TesseractSession::init(config)?;
    session.set_image(&config.image)?;
    session.recognize()?;

    if config.quick_text || config.both {
        let text = session.page_text()?;
        print!("{text}");
    }

    if !config.quick_text {
        let mut cursor = session.symbols();
        if let Err(err) = alto::write_glyph_xml(&config.output, &mut cursor, &Policy::detailed())
        {
            // A bad output path degrades the run but does not fail it; the
            // exit status stays 0.
            error!("write_glyph_xml: {err:#}");
        }
    }

    Ok(())
}
