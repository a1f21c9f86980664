use std::path::PathBuf;

use clap::{Args, Parser};

use pathops::{generators, BinaryOp, OpOptions, Path};

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
enum Example {
    Checkerboard,
    SlantedCheckerboard,
    Slanties,
    Circles,
}

/// Applies a boolean operation to two paths and prints the result.
///
/// Paths are read in the text form `[fill] M x y L x y Q .. K .. C .. Z`.
#[derive(Parser)]
struct Cli {
    #[command(flatten)]
    input: Input,

    /// The operation; without one, the first path is simplified.
    #[arg(long)]
    op: Option<BinaryOp>,

    /// Write the inputs and the output to this SVG file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Override the tolerance for merging points.
    #[arg(long)]
    tolerance: Option<f64>,

    /// Compare the output against the rasterized inputs.
    #[arg(long)]
    check: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Input {
    /// Two files, each holding one path.
    #[arg(num_args = 1..=2)]
    files: Vec<PathBuf>,

    #[arg(long)]
    example: Option<Example>,
}

fn get_paths(input: &Input) -> anyhow::Result<(Path, Option<Path>)> {
    if let Some(example) = input.example {
        let (a, b) = match example {
            Example::Checkerboard => generators::checkerboard(10),
            Example::SlantedCheckerboard => generators::slanted_checkerboard(10),
            Example::Slanties => generators::slanties(10),
            Example::Circles => generators::circles(4),
        };
        return Ok((a, Some(b)));
    }
    let mut paths = input
        .files
        .iter()
        .map(|f| -> anyhow::Result<Path> { Ok(std::fs::read_to_string(f)?.parse()?) });
    let a = paths.next().ok_or_else(|| anyhow::anyhow!("no input"))??;
    let b = paths.next().transpose()?;
    Ok((a, b))
}

pub fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let (a, b) = get_paths(&args.input)?;

    let mut opts = match &b {
        Some(b) => OpOptions::for_paths([&a, b]),
        None => OpOptions::for_paths([&a]),
    };
    if let Some(tol) = args.tolerance {
        opts.point_tolerance = tol;
    }

    let (result, op) = match (&b, args.op) {
        (Some(b), Some(op)) => (pathops::op_with_options(&a, b, op, &opts)?, Some(op)),
        (None, Some(_)) => anyhow::bail!("an operation needs two paths"),
        (_, None) => (pathops::simplify_with_options(&a, &opts)?, None),
    };
    println!("{result:#}");

    if args.check {
        let cmp = pathops_util::compare_op(&a, b.as_ref().filter(|_| op.is_some()), op, &result, 256);
        eprintln!("{} of {} pixels differ", cmp.mismatched, cmp.total);
    }

    if let Some(output) = &args.output {
        let mut layers = vec![(&a, "blue")];
        if let Some(b) = &b {
            layers.push((b, "red"));
        }
        layers.push((&result, "black"));
        svg::save(output, &pathops_util::svg_document(&layers))?;
    }

    Ok(())
}
