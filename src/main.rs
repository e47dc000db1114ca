use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, prelude::*};

use tably::catalog::{self, DatasetEntry};
use tably::controller::Controller;
use tably::domain::{GridConfig, GridError};
use tably::model::{Model, Status};
use tably::ui;

#[derive(Parser)]
#[command(version, about = "A tui dataset viewer with summary statistics and histograms.")]
struct Cli {
    /// Dataset file to open directly (csv, parquet, arrow)
    dataset: Option<String>,

    /// Catalog file: a JSON list of {"name", "url", "row_count"}
    #[arg(short, long)]
    catalog: Option<String>,

    /// Write tracing output to this file (filtered by RUST_LOG)
    #[arg(long)]
    log_file: Option<String>,
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

fn expand(path: &str) -> Result<PathBuf, GridError> {
    let expanded = shellexpand::full(path)
        .map_err(|e| GridError::CatalogLoad(format!("cannot expand {path}: {e}")))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn init_tracing(log_file: Option<&str>) -> Result<(), GridError> {
    let Some(path) = log_file else {
        return Ok(());
    };
    // The terminal belongs to ratatui, logs go to a file.
    let file = std::fs::File::create(path)?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file)
                .with_ansi(false),
        )
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn build_catalog(cli: &Cli) -> Result<Vec<DatasetEntry>, GridError> {
    if let Some(path) = &cli.catalog {
        return catalog::load_catalog(&expand(path)?);
    }
    if let Some(dataset) = &cli.dataset {
        let path = expand(dataset)?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset")
            .to_string();
        return Ok(vec![DatasetEntry {
            name,
            url: path.to_string_lossy().into_owned(),
            row_count: 0,
        }]);
    }
    Err(GridError::CatalogLoad(
        "pass a dataset file or --catalog <file>".to_string(),
    ))
}

fn run() -> Result<(), GridError> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;
    let catalog = build_catalog(&cli)?;

    let config = GridConfig::default();
    let controller = Controller::new(&config);

    let mut terminal = ratatui::init();
    let size = terminal.size()?;
    let mut model = Model::init(config, catalog, size.width as usize, size.height as usize)?;

    while model.status != Status::Quitting {
        terminal.draw(|f| ui::draw(&model, f))?;
        if let Some(message) = controller.handle_event(&model)? {
            model.update(message)?;
        }
        model.tick();
    }

    Ok(())
}
