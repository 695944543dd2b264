//! mcodec CLI - encode, decode, and evaluate `.mcodec` medical images.
//!
//! Exit codes: 0 on success, 1 on bad arguments, 2 on any other failure.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tracing::info;

use mcodec_rs::bitstream::ByteReader;
use mcodec_rs::io::{parse_image, pgm};
use mcodec_rs::{decode, encode, Image, McodecHeader};

/// Baseline lossy codec for grayscale medical images
#[derive(Parser)]
#[command(name = "mcodec")]
#[command(author = "mcodec-rs contributors")]
#[command(version)]
#[command(about = "Encode, decode, and evaluate .mcodec images", long_about = None)]
#[command(after_help = "EXAMPLES:
    mcodec encode --input slice.dcm --output slice.mcodec --quality 85
    mcodec decode --input slice.mcodec --output slice.pgm
    mcodec evaluate --input slice.dcm --quality 90 50 10 \\
        --tmp-dir tmp --out metrics.csv --fig-dir figs
    mcodec info --input slice.mcodec

SUPPORTED INPUTS:
    PGM (P5, 8/16-bit) and uncompressed single-frame monochrome DICOM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a PGM or DICOM image into a .mcodec file
    #[command(visible_alias = "e")]
    Encode {
        /// Input image (PGM or DICOM)
        #[arg(short, long)]
        input: PathBuf,

        /// Output .mcodec file
        #[arg(short, long)]
        output: PathBuf,

        /// Quality level, 1 (coarsest) to 100 (finest quantization)
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..=100))]
        quality: u16,
    },

    /// Decode a .mcodec file to PGM
    #[command(visible_alias = "d")]
    Decode {
        /// Input .mcodec file
        #[arg(short, long)]
        input: PathBuf,

        /// Output PGM file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Encode then decode at several qualities and report rate/distortion
    ///
    /// Writes one CSV row per quality plus reference, reconstruction, and
    /// error-map images for visual inspection.
    Evaluate {
        /// Reference image (PGM or DICOM)
        #[arg(short, long)]
        input: PathBuf,

        /// Quality levels to sweep
        #[arg(short, long, num_args = 1.., value_parser = clap::value_parser!(u16).range(1..=100))]
        quality: Vec<u16>,

        /// Directory for intermediate .mcodec files
        #[arg(long)]
        tmp_dir: PathBuf,

        /// Output CSV path
        #[arg(long)]
        out: PathBuf,

        /// Directory for reference/reconstruction/error images
        #[arg(long)]
        fig_dir: PathBuf,
    },

    /// Print the container header of a .mcodec file
    #[command(visible_alias = "i")]
    Info {
        /// Input .mcodec file
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            std::process::exit(code);
        }
    };

    let result = match cli.command {
        Commands::Encode {
            input,
            output,
            quality,
        } => run_encode(&input, &output, quality),
        Commands::Decode { input, output } => run_decode(&input, &output),
        Commands::Evaluate {
            input,
            quality,
            tmp_dir,
            out,
            fig_dir,
        } => run_evaluate(&input, &quality, &tmp_dir, &out, &fig_dir),
        Commands::Info { input } => run_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(2);
    }
}

fn load_input(path: &Path) -> Result<Image> {
    let bytes = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let image = parse_image(path, &bytes)
        .with_context(|| format!("cannot parse image {}", path.display()))?;
    Ok(image)
}

fn run_encode(input: &Path, output: &Path, quality: u16) -> Result<()> {
    let image = load_input(input)?;
    let bytes = encode(&image, quality)?;

    fs::write(output, &bytes).with_context(|| format!("cannot write {}", output.display()))?;
    let raw_bytes = image.pixel_count() * usize::from(image.bits_allocated / 8);
    info!(
        "encoded {}x{} ({} raw bytes) to {} ({} bytes, quality {})",
        image.width,
        image.height,
        raw_bytes,
        output.display(),
        bytes.len(),
        quality
    );
    Ok(())
}

fn run_decode(input: &Path, output: &Path) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("cannot read {}", input.display()))?;
    let image = decode(&bytes)?;

    fs::write(output, pgm::write_pgm(&image)?)
        .with_context(|| format!("cannot write {}", output.display()))?;
    info!(
        "decoded {}x{} ({} bits stored) to {}",
        image.width,
        image.height,
        image.bits_stored,
        output.display()
    );
    Ok(())
}

fn run_evaluate(
    input: &Path,
    qualities: &[u16],
    tmp_dir: &Path,
    out_csv: &Path,
    fig_dir: &Path,
) -> Result<()> {
    ensure!(!qualities.is_empty(), "need at least one quality value");
    fs::create_dir_all(tmp_dir)?;
    fs::create_dir_all(fig_dir)?;

    let reference = load_input(input)?;
    let maxv = reference.max_sample_value() as u32;
    let raw_bytes = reference.pixel_count() * usize::from(reference.bits_allocated / 8);
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string();

    fs::write(
        fig_dir.join(format!("{stem}_ref.pgm")),
        pgm::write_pgm(&reference)?,
    )?;

    let mut csv = String::from(
        "quality,block_size,compressed_bytes,bpp,raw_bytes,compression_ratio,rmse,psnr\n",
    );
    let reference_u = map_to_unsigned(&reference, maxv);

    for &quality in qualities {
        let bytes = encode(&reference, quality)?;
        let compressed_bytes = bytes.len();
        fs::write(tmp_dir.join(format!("{stem}_q{quality}.mcodec")), &bytes)?;

        let bpp = 8.0 * compressed_bytes as f64 / reference.pixel_count() as f64;
        let ratio = raw_bytes as f64 / compressed_bytes as f64;

        let recon = decode(&bytes)?;
        ensure!(
            recon.width == reference.width
                && recon.height == reference.height
                && recon.bits_stored == reference.bits_stored
                && recon.is_signed == reference.is_signed,
            "decoded metadata does not match the reference"
        );

        let recon_u = map_to_unsigned(&recon, maxv);
        let (rmse, psnr) = rmse_psnr(&reference_u, &recon_u, maxv);

        fs::write(
            fig_dir.join(format!("{stem}_q{quality}_recon.pgm")),
            pgm::write_pgm(&recon)?,
        )?;
        fs::write(
            fig_dir.join(format!("{stem}_q{quality}_err.pgm")),
            pgm::write_pgm(&error_map(&reference_u, &recon_u, reference.width, reference.height))?,
        )?;

        csv.push_str(&format!(
            "{quality},{},{compressed_bytes},{bpp},{raw_bytes},{ratio},{rmse},{psnr}\n",
            mcodec_rs::constants::DEFAULT_BLOCK_SIZE
        ));
        info!(
            "quality {quality}: {compressed_bytes} bytes, bpp {bpp:.3}, rmse {rmse:.3}, psnr {psnr:.2}"
        );
    }

    fs::write(out_csv, csv).with_context(|| format!("cannot write {}", out_csv.display()))?;
    info!("evaluation completed -> {}", out_csv.display());
    Ok(())
}

fn run_info(input: &Path) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("cannot read {}", input.display()))?;
    let hdr = McodecHeader::read(&mut ByteReader::new(bytes.clone()))?;

    println!("File: {}", input.display());
    println!("Size: {} bytes", bytes.len());
    println!();
    println!("Format: mcodec v{}", hdr.version);
    println!("  Dimensions:     {}x{}", hdr.width, hdr.height);
    println!("  Channels:       {}", hdr.channels);
    println!(
        "  Bit depth:      {} stored / {} allocated",
        hdr.bits_stored, hdr.bits_allocated
    );
    println!("  Signed:         {}", if hdr.is_signed { "yes" } else { "no" });
    println!(
        "  Level shift:    {}",
        if hdr.flags & mcodec_rs::constants::FLAG_LEVEL_SHIFT != 0 {
            "applied"
        } else {
            "not applied"
        }
    );
    println!("  Block size:     {}", hdr.block_size);
    println!("  Quality:        {}", hdr.quality);
    println!("  Payload:        {} bytes", hdr.payload_bytes);
    Ok(())
}

// Metric helpers

/// Maps samples into the unsigned `[0, maxv]` domain so RMSE/PSNR are
/// comparable across signed and unsigned inputs.
fn map_to_unsigned(image: &Image, maxv: u32) -> Vec<u32> {
    let offset = if image.is_signed {
        1i32 << (image.bits_stored - 1)
    } else {
        0
    };
    image
        .pixels
        .iter()
        .map(|&v| (v + offset).clamp(0, maxv as i32) as u32)
        .collect()
}

fn rmse_psnr(reference: &[u32], reconstruction: &[u32], maxv: u32) -> (f64, f64) {
    let mse: f64 = reference
        .iter()
        .zip(reconstruction)
        .map(|(&a, &b)| {
            let d = f64::from(a) - f64::from(b);
            d * d
        })
        .sum::<f64>()
        / reference.len() as f64;
    let rmse = mse.sqrt();
    let psnr = if mse == 0.0 {
        f64::INFINITY
    } else {
        20.0 * f64::from(maxv).log10() - 10.0 * mse.log10()
    };
    (rmse, psnr)
}

/// 8-bit absolute-error image scaled by the 99th percentile, so a few
/// outliers do not wash out the map.
fn error_map(reference: &[u32], reconstruction: &[u32], width: u32, height: u32) -> Image {
    let err: Vec<u32> = reference
        .iter()
        .zip(reconstruction)
        .map(|(&a, &b)| a.abs_diff(b))
        .collect();

    let mut sorted = err.clone();
    sorted.sort_unstable();
    let idx = (0.99 * (sorted.len() as f64 - 1.0)).floor() as usize;
    let scale = sorted[idx].max(1);

    let pixels = err
        .iter()
        .map(|&e| ((255.0 * f64::from(e.min(scale)) / f64::from(scale)).round() as i32).clamp(0, 255))
        .collect();

    Image {
        width,
        height,
        channels: 1,
        bits_allocated: 8,
        bits_stored: 8,
        is_signed: false,
        pixels,
    }
}
