use cardsheet::pipeline::config::DEFAULT_PROXY_URL;
use cardsheet::{PipelineBuilder, PipelineConfig, PipelineError, SheetRenderer, SlotSpacing, Template};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

// Many short-lived buffers per card (HTTP bodies, decoded and resized bitmaps).
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Spacing {
    Packed,
    Distribute,
}

impl From<Spacing> for SlotSpacing {
    fn from(spacing: Spacing) -> Self {
        match spacing {
            Spacing::Packed => SlotSpacing::Packed,
            Spacing::Distribute => SlotSpacing::Distribute,
        }
    }
}

/// Builds printable proxy sheets from a card list.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Card list, one card per line ("Luke Skywalker x2"). Use - for stdin.
    list: PathBuf,

    /// JSON pipeline configuration. Flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Card data proxy endpoint.
    #[arg(long, env = "CARDSHEET_PROXY")]
    proxy: Option<String>,

    /// Directory for the sheet-N.png files.
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Maximum number of cards loaded at once.
    #[arg(long)]
    concurrency: Option<usize>,

    #[arg(long)]
    rows: Option<u32>,

    #[arg(long)]
    cols: Option<u32>,

    #[arg(long)]
    dpi: Option<u32>,

    #[arg(long, value_enum)]
    spacing: Option<Spacing>,

    /// Outline every slot as a cutting guide.
    #[arg(long)]
    guides: bool,

    /// Image stretched over the page beneath the cards (a print template).
    #[arg(long)]
    underlay: Option<PathBuf>,

    /// Opacity of the underlay, 0 to 1.
    #[arg(long, default_value_t = 1.0)]
    underlay_opacity: f32,

    /// Image stretched over the finished page (a cut path).
    #[arg(long)]
    overlay: Option<PathBuf>,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig, PipelineError> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(proxy) = &self.proxy {
            config.proxy_url = proxy.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(rows) = self.rows {
            config.sheet.rows = rows;
        }
        if let Some(cols) = self.cols {
            config.sheet.cols = cols;
        }
        if let Some(dpi) = self.dpi {
            config.sheet.dpi = dpi;
        }
        if let Some(spacing) = self.spacing {
            config.sheet.spacing = spacing.into();
        }
        Ok(config)
    }

    fn renderer(&self) -> Result<SheetRenderer, PipelineError> {
        let mut renderer = SheetRenderer::new().with_guides(self.guides);
        if renderer.label_font().is_none() {
            warn!("No system font available; failure markers will be unlabeled.");
        }
        if let Some(path) = &self.underlay {
            renderer = renderer.with_underlay(Template::open(path, self.underlay_opacity)?);
        }
        if let Some(path) = &self.overlay {
            renderer = renderer.with_overlay(Template::open(path, 1.0)?);
        }
        Ok(renderer)
    }

    fn read_list(&self) -> Result<String, PipelineError> {
        if self.list.as_os_str() == "-" {
            return Ok(io::read_to_string(io::stdin())?);
        }
        fs::read_to_string(&self.list).map_err(|e| {
            PipelineError::Io(io::Error::new(
                e.kind(),
                format!("Failed to read card list '{}': {}", self.list.display(), e),
            ))
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.pipeline_config()?;
    if config.proxy_url == DEFAULT_PROXY_URL {
        info!("Using the local proxy at {}; pass --proxy to change it.", DEFAULT_PROXY_URL);
    }
    let list = cli.read_list()?;
    let renderer = cli.renderer()?;

    let pipeline = PipelineBuilder::new()
        .with_config(config)
        .with_progress(|p| info!("[{}/{}] {}", p.completed, p.total, p.name))
        .build()?;

    let started = Instant::now();
    let batch = pipeline.generate(&list).await?;
    if batch.sheets.is_empty() {
        warn!("No cards found in '{}'.", cli.list.display());
        return Ok(());
    }
    if let Some(overflow) = batch.overflow() {
        warn!("Grid does not fit the page ({}); output is clipped.", overflow);
    }

    fs::create_dir_all(&cli.out)?;
    for sheet in &batch.sheets {
        let path = cli.out.join(format!("sheet-{}.png", sheet.index + 1));
        renderer.render(&batch, sheet)?.save(&path)?;
        info!("{}: {}", path.display(), batch.summary(sheet));
        for failure in sheet.failures() {
            warn!("  {}", failure);
        }
    }

    info!(
        "Wrote {} sheet(s) with {} cards in {:.2?}.",
        batch.sheets.len(),
        batch.placement_count(),
        started.elapsed()
    );
    Ok(())
}
