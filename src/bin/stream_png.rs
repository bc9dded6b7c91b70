use anyhow::{bail, ensure, Context};
use lazy_png::{inspect, Framing, ImageDescriptor, PngEncoder};
use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::PathBuf,
};

const USAGE: &str = "usage: stream-png [-v] [--conformant] [--verify] [--report <file>] \
<raw-rgba> <width> <height> [<output.png>]";

struct Args {
    verbosity: log::LevelFilter,
    framing: Framing,
    verify: bool,
    report: Option<PathBuf>,
    input: PathBuf,
    width: u32,
    height: u32,
    output: PathBuf,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut verbosity = log::LevelFilter::Error;
    let mut framing = Framing::default();
    let mut verify = false;
    let mut report = None;
    let mut positional = vec![];
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-v" => verbosity = log::LevelFilter::Debug,
            "--conformant" => framing = Framing::Conformant,
            "--verify" => verify = true,
            "--report" => report = Some(PathBuf::from(args.next().context(USAGE)?)),
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            flag if flag.starts_with('-') => bail!("unknown flag {flag}\n{USAGE}"),
            _ => positional.push(arg),
        }
    }
    ensure!((3..=4).contains(&positional.len()), USAGE);
    Ok(Args {
        verbosity,
        framing,
        verify,
        report,
        input: PathBuf::from(&positional[0]),
        width: positional[1].parse().context("width must be a number")?,
        height: positional[2].parse().context("height must be a number")?,
        output: PathBuf::from(positional.get(3).map_or("output.png", String::as_str)),
    })
}

fn main() -> anyhow::Result<()> {
    let args = parse_args()?;
    pretty_env_logger::formatted_builder()
        .filter_level(args.verbosity)
        .parse_default_env()
        .init();

    let pixels = fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let image = ImageDescriptor::new(args.width, args.height, &pixels);
    let encoder = PngEncoder::new(image, args.framing)?;
    log::debug!("layout:\n{}", encoder.layout());

    let mut output = BufWriter::new(
        File::create(&args.output)
            .with_context(|| format!("Failed to create {}", args.output.display()))?,
    );
    let written = io::copy(&mut encoder.stream(), &mut output)?;
    output.flush()?;
    ensure!(
        written == encoder.total_size(),
        "wrote {written} of {} bytes",
        encoder.total_size()
    );
    log::info!("wrote {written} bytes to {}", args.output.display());

    let verified = if args.verify {
        let inspection = inspect(&fs::read(&args.output)?)
            .with_context(|| format!("Failed to inspect {}", args.output.display()))?;
        let decoded = inspection.decode_pixels()?;
        ensure!(
            decoded[..] == pixels[..decoded.len()],
            "decoded pixels differ from the input"
        );
        Some(true)
    } else {
        None
    };

    if let Some(report_path) = &args.report {
        let now = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Iso8601::DEFAULT)?;
        let checksums = encoder.checksums();
        let results = serde_json::json!({
            "date": now,
            "input": args.input.display().to_string(),
            "output": args.output.display().to_string(),
            "width": args.width,
            "height": args.height,
            "framing": args.framing.to_string(),
            "total_size": encoder.total_size(),
            "block_count": encoder.layout().block_count,
            "adler32": format!("{:08x}", checksums.adler32),
            "idat_crc32": format!("{:08x}", checksums.idat_crc32),
            "verified": verified,
        });
        fs::write(report_path, results.to_string())?;
    }
    Ok(())
}
