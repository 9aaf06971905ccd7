/// chuff – Huffman compression tool.
///
///   chuff file.txt              → compress to file.txt.pine
///   chuff -d file.txt.pine      → decompress to file.txt
///   chuff -d archive.bin        → decompress to decoded_archive.bin
///   chuff -o out.pine file.txt  → compress to an explicit path
///   chuff -c file.txt           → compress to stdout
///   chuff -l file.txt.pine      → list info about a compressed file
use std::ffi::{OsStr, OsString};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use log::{Level, LevelFilter, Log, Metadata, Record};

use chuff::header;
use chuff::{compress_stream, decompress_stream, ChuffResult, CodecOptions};

/// Extension appended to compressed files.
const EXTENSION: &str = "pine";
/// Prefix for decoded files whose name lacks [`EXTENSION`].
const DECODED_PREFIX: &str = "decoded_";

#[derive(Debug, Parser)]
#[command(name = "chuff", version, about = "chuff - lossless Huffman compression tool")]
struct Opts {
    /// Decompress mode
    #[arg(short, long)]
    decompress: bool,

    /// Output file (default: FILE.pine, or FILE without .pine when decompressing)
    #[arg(short, long, visible_short_alias = 'f', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Write to stdout
    #[arg(short = 'c', long = "stdout", conflicts_with = "output")]
    to_stdout: bool,

    /// Overwrite existing output files
    #[arg(long)]
    force: bool,

    /// List info about a compressed file
    #[arg(short, long, conflicts_with_all = ["decompress", "output", "to_stdout"])]
    list: bool,

    /// Verbose output (-vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Input file
    file: PathBuf,
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error | Level::Warn => {
                eprintln!("chuff: {}: {}", record.level().as_str().to_lowercase(), record.args())
            }
            _ => eprintln!("chuff: {}", record.args()),
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(opts: &Opts) {
    let level = if opts.quiet {
        LevelFilter::Error
    } else {
        match opts.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

/// Determine the output filename for compression.
fn compress_output_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(".");
    name.push(EXTENSION);
    PathBuf::from(name)
}

/// Determine the output filename for decompression: strip the extension if
/// present, otherwise prefix the file name.
fn decompress_output_path(input: &Path) -> PathBuf {
    if input.extension() == Some(OsStr::new(EXTENSION)) {
        if let Some(stem) = input.file_stem() {
            return input.with_file_name(stem);
        }
    }
    let mut name = OsString::from(DECODED_PREFIX);
    name.push(input.file_name().unwrap_or_default());
    input.with_file_name(name)
}

/// Create `path` and hand a buffered writer to `f`. The file is removed
/// again if `f` fails, so no partial output survives.
fn write_output<T>(
    path: &Path,
    force: bool,
    f: impl FnOnce(&mut BufWriter<File>) -> ChuffResult<T>,
) -> Result<T, String> {
    let shown = path.display();
    let file = OpenOptions::new()
        .write(true)
        .create_new(!force)
        .create(force)
        .truncate(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => format!("{shown} already exists; use --force to overwrite"),
            _ => format!("{shown}: {e}"),
        })?;
    let mut out = BufWriter::new(file);
    let result = f(&mut out)
        .map_err(|e| e.to_string())
        .and_then(|v| out.flush().map(|_| v).map_err(|e| format!("{shown}: {e}")));

    if result.is_err() {
        drop(out);
        if let Err(e) = fs::remove_file(path) {
            log::warn!("{shown}: cannot remove partial output: {e}");
        }
    }
    result
}

/// Run `f` against an in-memory buffer and copy the result to `sink` only
/// if it succeeds, so a failed session leaves nothing behind.
fn write_all_or_nothing<S: Write, T>(
    mut sink: S,
    f: impl FnOnce(&mut Vec<u8>) -> ChuffResult<T>,
) -> Result<T, String> {
    let mut buf = Vec::new();
    let value = f(&mut buf).map_err(|e| e.to_string())?;
    sink.write_all(&buf)
        .and_then(|_| sink.flush())
        .map_err(|e| format!("stdout: {e}"))?;
    Ok(value)
}

fn open_input(path: &Path) -> Result<BufReader<File>, String> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| format!("{}: {e}", path.display()))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn process_compress(opts: &Opts, options: &CodecOptions) -> Result<(), String> {
    let path = opts.file.as_path();
    let input = open_input(path)?;

    if opts.to_stdout {
        write_all_or_nothing(io::stdout().lock(), |out| compress_stream(input, out, options))
            .map_err(|e| format!("{}: {e}", path.display()))?;
        return Ok(());
    }

    let out_path = opts
        .output
        .clone()
        .unwrap_or_else(|| compress_output_path(path));
    if same_file(path, &out_path) {
        return Err(format!("{}: input and output are the same file", path.display()));
    }

    let summary = write_output(&out_path, opts.force, |out| {
        compress_stream(input, out, options)
    })
    .map_err(|e| format!("{}: {e}", path.display()))?;

    let ratio = if summary.input_bytes > 0 {
        (summary.output_bytes as f64 / summary.input_bytes as f64) * 100.0
    } else {
        0.0
    };
    log::info!(
        "{}: {ratio:.1}% ({} → {} bytes, {} symbols)",
        path.display(),
        summary.input_bytes,
        summary.output_bytes,
        summary.symbols
    );
    Ok(())
}

fn process_decompress(opts: &Opts, options: &CodecOptions) -> Result<(), String> {
    let path = opts.file.as_path();
    let input = open_input(path)?;

    if opts.to_stdout {
        write_all_or_nothing(io::stdout().lock(), |out| decompress_stream(input, out, options))
            .map_err(|e| format!("{}: {e}", path.display()))?;
        return Ok(());
    }

    let out_path = opts
        .output
        .clone()
        .unwrap_or_else(|| decompress_output_path(path));
    if same_file(path, &out_path) {
        return Err(format!("{}: input and output are the same file", path.display()));
    }

    let summary = write_output(&out_path, opts.force, |out| {
        decompress_stream(input, out, options)
    })
    .map_err(|e| format!("{}: {e}", path.display()))?;

    log::info!(
        "{}: {} → {} bytes",
        path.display(),
        summary.input_bytes,
        summary.output_bytes
    );
    Ok(())
}

fn list_file<W: Write>(path: &Path, out: &mut W) -> Result<(), String> {
    let shown = path.display();
    let mut input = open_input(path)?;
    let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let (table, header_len) =
        header::read_header(&mut input).map_err(|e| format!("{shown}: not a chuff file: {e}"))?;

    writeln!(
        out,
        "{:>8} {:>8} {:>10} {:>12} name",
        "symbols", "codes", "header", "compressed"
    )
    .and_then(|_| {
        writeln!(
            out,
            "{:>8} {:>8} {:>10} {:>12} {}",
            table.len(),
            format!("{}-{}", table.min_len(), table.max_len()),
            header_len,
            size,
            shown
        )
    })
    .map_err(|e| format!("stdout: {e}"))
}

fn run() -> Result<(), String> {
    let opts = Opts::parse();
    init_logging(&opts);
    log::trace!("{opts:?}");

    let options = CodecOptions::default();
    if opts.list {
        list_file(&opts.file, &mut io::stdout().lock())
    } else if opts.decompress {
        process_decompress(&opts, &options)
    } else {
        process_compress(&opts, &options)
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("chuff: {e}");
            ExitCode::FAILURE
        }
    }
}
