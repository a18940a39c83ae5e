use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use svd_core::DegeneratePolicy;
use svd_image_compress::config::{parse_channel_policy, parse_degenerate_policy, CompressConfig};
use svd_image_compress::error::{classify, ErrorSeverity};
use svd_image_compress::{
    compress_image, describe_output, ChannelPolicy, HasRecoverySuggestion, HasSeverity, SvdError,
};

/// Low-rank grayscale image compression by truncated SVD:
/// decompose once, keep the k largest singular values, export the
/// normalized reconstruction as PNG.
#[derive(Parser, Debug)]
#[command(name = "svdimg")]
#[command(about = "Compress a grayscale image to rank k with truncated SVD")]
#[command(long_about = "Decompose a grayscale image with SVD, rebuild it from its k largest singular values,
and save the min-max normalized result as PNG. Several ranks can be evaluated in one run;
the decomposition is computed once and reused.")]
struct Args {
    /// Grayscale PNG or JPEG to compress
    input: String,

    /// Output PNG path
    #[arg(short, long, default_value = "result_svd.png",
          help = "Output PNG path; with several ranks each file gets a _k<rank> suffix")]
    output: String,

    /// Ranks to keep
    #[arg(short = 'k', long = "rank", value_delimiter = ',',
          help = "Number of singular values to keep (repeat or comma-separate for several); default: half of min(width, height)")]
    ranks: Vec<usize>,

    /// Channel policy for color input
    #[arg(long, default_value = "require-gray", value_parser = parse_channel_policy,
          help = "Color input: require-gray (reject real color), first (take red channel), luma (weighted conversion)")]
    channel: ChannelPolicy,

    /// Constant reconstruction policy
    #[arg(long, default_value = "mid-gray", value_parser = parse_degenerate_policy,
          help = "Constant reconstruction: mid-gray (flat 128), preserve (flat constant), reject (fail)")]
    degenerate: DegeneratePolicy,

    /// Comparison figure path
    #[arg(long, help = "Also save a side-by-side PNG of the original and the first rank's result")]
    comparison: Option<String>,

    /// Gap between comparison panels
    #[arg(long, default_value_t = 16, help = "White gap between comparison panels, in pixels")]
    gap: u32,

    /// Print data URIs
    #[arg(long, help = "Print each export as a data:image/png;base64 URI")]
    data_uri: bool,

    /// JSON report
    #[arg(long, help = "Print the run report as JSON")]
    json: bool,

    /// SVD iteration cap
    #[arg(long, default_value_t = 0, help = "Maximum SVD iterations (0 = until convergence)")]
    max_iterations: usize,
}

/// Exit status for errors caused by the image or the arguments.
const EXIT_INPUT: u8 = 2;

/// Exit status for everything else.
const EXIT_FAILURE: u8 = 1;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let svd_error = err.downcast_ref::<SvdError>();
            if let Some(hint) = svd_error.and_then(|e| e.recovery_suggestion()) {
                eprintln!("hint: {}", hint);
            }
            if svd_error.is_some_and(|e| e.severity() == ErrorSeverity::Critical) {
                eprintln!("note: this is an internal failure, not a problem with the input");
            }
            match svd_error {
                Some(e) if classify::is_input_error(e) => ExitCode::from(EXIT_INPUT),
                _ => ExitCode::from(EXIT_FAILURE),
            }
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = CompressConfig {
        input: args.input,
        output: args.output,
        ranks: args.ranks,
        channel: args.channel,
        degenerate: args.degenerate,
        comparison: args.comparison,
        comparison_gap: args.gap,
        data_uri: args.data_uri,
        json: args.json,
        max_iterations: args.max_iterations,
    };
    config.validate()?;

    let report = compress_image(config.to_options())?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
        return Ok(());
    }

    println!("Input: {} ({}x{})", report.input.display(), report.cols, report.rows);
    println!(
        "Singular values: {} (default rank {}), decomposed in {:.1} ms",
        report.max_rank, report.default_rank, report.decompose_ms
    );
    for output in &report.outputs {
        println!("{}", describe_output(output));
        if let Some(uri) = &output.data_uri {
            println!("{}", uri);
        }
    }
    if let Some(path) = &report.comparison {
        println!("Comparison: {}", path.display());
    }
    Ok(())
}
