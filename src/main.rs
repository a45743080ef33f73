use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use pointpick::config::{SelectionMode, SessionConfig};
use pointpick::{coords, gui, load_image, Scale, Session};

// ── Arguments ───────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "pointpick", version, about = "Click points on an image and save their pixel coordinates")]
struct Args {
    /// Image to annotate. A file dialog opens when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory receiving the coordinate file and the annotated image.
    #[arg(short, long, default_value = "outputs")]
    output: PathBuf,

    /// Preview scale relative to the source image.
    #[arg(short, long)]
    scale: Option<f64>,

    /// Keep only the most recent click.
    #[arg(long)]
    single: bool,

    /// Coordinate file with points to start from.
    #[arg(long)]
    seed: Option<PathBuf>,

    /// TOML session config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Draw markers without index labels.
    #[arg(long)]
    no_labels: bool,
}

impl Args {
    fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load(path)?,
            None => SessionConfig::default(),
        };
        if let Some(factor) = self.scale {
            config.scale = Scale::new(factor)
                .with_context(|| format!("scale must be a positive number, got {factor}"))?;
        }
        if self.single {
            config.mode = SelectionMode::Single;
        }
        if self.no_labels {
            config.marker.labels = false;
        }
        Ok(config)
    }
}

fn pick_input(args: &Args) -> Result<PathBuf> {
    if let Some(path) = &args.input {
        if !path.is_file() {
            bail!("input file does not exist: {}", path.display());
        }
        return Ok(path.clone());
    }

    rfd::FileDialog::new()
        .set_title("Select an image to annotate")
        .add_filter("Images", &["png", "jpg", "jpeg", "PNG", "JPG", "JPEG"])
        .pick_file()
        .context("no input image selected")
}

fn save_results(output_dir: &Path, stem: &str, output: &pointpick::SessionOutput) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create output directory {}", output_dir.display()))?;

    let points_path = output_dir.join(format!("{stem}_points.txt"));
    coords::write_coordinates(&points_path, &output.points)?;
    log::info!("saved {}", points_path.display());

    let image_path = output_dir.join(format!("{stem}_annotated.png"));
    output
        .frame
        .save(&image_path)
        .with_context(|| format!("cannot save annotated image to {}", image_path.display()))?;
    log::info!("saved {}", image_path.display());
    Ok(())
}

// ── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.session_config()?;
    let input = pick_input(&args)?;
    let image = load_image(&input)?;

    let mut session = Session::new(image, config)?;
    if let Some(seed) = &args.seed {
        session = session.seed(coords::load_coordinates(seed)?);
    }

    let title = format!(
        "pointpick — {}",
        input.file_name().unwrap_or_default().to_string_lossy()
    );
    let output = gui::run(session, &title)?;

    println!("\n[Final Points]");
    for (i, point) in output.points.iter().enumerate() {
        println!("{i}: {point}");
    }

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    save_results(&args.output, &stem, &output)
}
