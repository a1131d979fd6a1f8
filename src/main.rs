use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use lcms_deconv::{deconvolute, Config, Spectrum};

/// Charge-envelope deconvolution for intact-protein and small-molecule
/// LC-MS spectra.
///
/// Reads a spectrum from a two-column CSV (`mz,intensity`) or a JSON
/// `{"mz": [...], "intensity": [...]}` fixture, runs the deconvolution
/// pipeline, and prints the resulting components.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Spectrum file: two-column CSV or JSON `Spectrum`
    input: PathBuf,

    /// Config file (TOML or JSON) layered under the defaults, overridden
    /// in turn by any flags below
    #[arg(long)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print a compact table instead of JSON
    #[arg(long)]
    table: bool,

    #[arg(long)]
    min_charge: Option<u16>,
    #[arg(long)]
    max_charge: Option<u16>,
    #[arg(long)]
    min_peaks: Option<usize>,
    #[arg(long)]
    noise_cutoff: Option<f64>,
    #[arg(long)]
    abundance_cutoff: Option<f64>,
    #[arg(long)]
    mw_agreement: Option<f64>,
    #[arg(long)]
    mw_assign_cutoff: Option<f64>,
    #[arg(long)]
    envelope_cutoff: Option<f64>,
    #[arg(long)]
    pwhh: Option<f64>,
    #[arg(long)]
    low_mw: Option<f64>,
    #[arg(long)]
    high_mw: Option<f64>,
    #[arg(long)]
    contig_min: Option<usize>,
    #[arg(long)]
    use_mz_agreement: bool,
    #[arg(long)]
    use_monoisotopic_proton: bool,
    #[arg(long)]
    max_overlap: Option<f64>,
}

fn apply_overrides(mut config: Config, args: &Args) -> Config {
    if let Some(v) = args.min_charge {
        config.min_charge = v;
    }
    if let Some(v) = args.max_charge {
        config.max_charge = v;
    }
    if let Some(v) = args.min_peaks {
        config.min_peaks = v;
    }
    if let Some(v) = args.noise_cutoff {
        config.noise_cutoff = v;
    }
    if let Some(v) = args.abundance_cutoff {
        config.abundance_cutoff = v;
    }
    if let Some(v) = args.mw_agreement {
        config.mw_agreement = v;
    }
    if let Some(v) = args.mw_assign_cutoff {
        config.mw_assign_cutoff = v;
    }
    if let Some(v) = args.envelope_cutoff {
        config.envelope_cutoff = v;
    }
    if let Some(v) = args.pwhh {
        config.pwhh = v;
    }
    if let Some(v) = args.low_mw {
        config.low_mw = v;
    }
    if let Some(v) = args.high_mw {
        config.high_mw = v;
    }
    if let Some(v) = args.contig_min {
        config.contig_min = v;
    }
    if args.use_mz_agreement {
        config.use_mz_agreement = true;
    }
    if args.use_monoisotopic_proton {
        config.use_monoisotopic_proton = true;
    }
    if let Some(v) = args.max_overlap {
        config.max_overlap = v;
    }
    config
}

fn read_spectrum(path: &PathBuf) -> Result<Spectrum> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        let spectrum: Spectrum = serde_json::from_str(&raw).context("parsing JSON spectrum")?;
        return Ok(spectrum);
    }

    let mut mz = Vec::new();
    let mut intensity = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split(',');
        let m: f64 = fields
            .next()
            .with_context(|| format!("line {}: missing m/z column", line_no + 1))?
            .trim()
            .parse()
            .with_context(|| format!("line {}: invalid m/z value", line_no + 1))?;
        let i: f64 = fields
            .next()
            .with_context(|| format!("line {}: missing intensity column", line_no + 1))?
            .trim()
            .parse()
            .with_context(|| format!("line {}: invalid intensity value", line_no + 1))?;
        mz.push(m);
        intensity.push(i);
    }
    Ok(Spectrum::new(mz, intensity))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("failed to set tracing subscriber");

    let base_config = match &args.config {
        Some(path) => Config::from_file(path).with_context(|| format!("loading config {path}"))?,
        None => Config::default(),
    };
    let config = apply_overrides(base_config, &args);

    info!(input = %args.input.display(), "reading spectrum");
    let spectrum = read_spectrum(&args.input)?;
    info!(points = spectrum.len(), "spectrum loaded");

    let components = deconvolute(&spectrum, &config);
    info!(component_count = components.len(), "deconvolution complete");

    if args.table {
        println!(
            "{:>12} {:>10} {:>8} {:>12} {:>6} {:>6}",
            "mass", "mass_std", "charges", "intensity", "peaks", "r2"
        );
        for c in &components {
            println!(
                "{:>12.3} {:>10.3} {:>8} {:>12.1} {:>6} {:>6.2}",
                c.mass, c.mass_std, c.num_charges, c.intensity, c.peaks_found, c.r2
            );
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&components)?);
    }

    Ok(())
}
