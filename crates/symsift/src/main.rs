use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use symsift_core::dump::{DumpKind, DumpTool, StagedDumps, DEFAULT_PDBUTIL, PDBUTIL_ENV};
use symsift_core::options::{ConflictPolicy, FlushPolicy, SiftOptions, Strictness};
use symsift_core::report::write_report;
use symsift_core::sifter::{DumpPaths, Sifter};
use symsift_core::{SymsiftError, SymsiftResult};
use symsift_utils::{info, init_logging, init_logging_with_level, warn, LogFormat, LogLevel};

/// Catalog the C++ types with virtual tables found in a PDB.
#[derive(Parser, Debug)]
#[command(name = "symsift")]
#[command(version)]
#[command(about = "Catalog C++ vftable types, their sizes and field lists from a PDB", long_about = None)]
struct Cli
{
    /// PDB to sift; its file stem names the dumps and the report
    pdb: PathBuf,

    /// Read existing `<stem>.{sections,globals,types}.txt` dumps from this directory instead of running the dump tool
    #[arg(long, value_name = "DIR")]
    dumps_dir: Option<PathBuf>,

    /// Write `<stem>.output.txt` and keep the produced dumps in this directory
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Path to llvm-pdbutil
    #[arg(long, value_name = "PATH", env = PDBUTIL_ENV, default_value = DEFAULT_PDBUTIL)]
    pdbutil: PathBuf,

    /// Treat malformed numbers, unknown sections and address overflows as errors
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// Abort on a type defined twice with different sizes
    #[arg(long, default_value_t = false)]
    fail_on_conflict: bool,

    /// Drop the last type record unless another header follows it
    #[arg(long, default_value_t = false)]
    require_trailing_header: bool,

    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,
}

impl Cli
{
    fn options(&self) -> SiftOptions
    {
        let mut options = SiftOptions::new();
        if self.strict {
            options = options.with_strictness(Strictness::Strict);
        }
        if self.fail_on_conflict {
            options = options.with_conflict_policy(ConflictPolicy::Fail);
        }
        if self.require_trailing_header {
            options = options.with_flush_policy(FlushPolicy::TrailingHeader);
        }
        options
    }

    fn stem(&self) -> SymsiftResult<String>
    {
        self.pdb
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| SymsiftError::InvalidArgument(format!("{} has no file name", self.pdb.display())))
    }
}

fn main()
{
    let cli = Cli::parse();

    let logging = match cli.log_level {
        Some(level) => LogFormat::from_env().and_then(|format| init_logging_with_level(level, format)),
        None => init_logging(),
    };
    if let Err(e) = logging {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> SymsiftResult<()>
{
    let stem = cli.stem()?;

    // Staged dumps must outlive the sift; their temporary files vanish on drop.
    let (paths, staged) = match &cli.dumps_dir {
        Some(dir) => (DumpPaths::in_dir(dir, &stem), None),
        None => {
            let staged = produce_dumps(&cli.pdbutil, &cli.pdb)?;
            (staged.sift_paths()?, Some(staged))
        }
    };

    info!(pdb = %cli.pdb.display(), "sifting");
    let outcome = Sifter::new(cli.options()).sift_files(&paths)?;
    let (partitions, merge) = outcome.partition();

    for conflict in &merge.conflicts {
        warn!(
            name = %conflict.current.name,
            previous = conflict.previous.size,
            current = conflict.current.size,
            "type defined with different sizes"
        );
    }
    if !merge.incomplete.is_empty() {
        warn!(records = merge.incomplete.len(), "incomplete type records skipped");
    }

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    match &cli.out_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let report_path = dir.join(format!("{stem}.output.txt"));
            let mut file = BufWriter::new(File::create(&report_path)?);
            let mut sinks: [&mut dyn Write; 2] = [&mut stdout, &mut file];
            write_report(&partitions, &mut sinks)?;
            info!(path = %report_path.display(), "report written");

            if let Some(staged) = staged {
                let kept = staged.persist(dir, &stem)?;
                info!(dumps = kept.len(), dir = %dir.display(), "dumps kept");
            }
        }
        None => {
            let mut sinks: [&mut dyn Write; 1] = [&mut stdout];
            write_report(&partitions, &mut sinks)?;
        }
    }
    stdout.flush()?;

    info!(
        virtual_types = partitions.virtual_types.len(),
        other_types = partitions.other_types.len(),
        unexpanded = partitions.unexpanded.len(),
        "done"
    );
    Ok(())
}

fn produce_dumps(pdbutil: &Path, pdb: &Path) -> SymsiftResult<StagedDumps>
{
    if !pdb.is_file() {
        return Err(SymsiftError::InvalidArgument(format!("{} is not a file", pdb.display())));
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(DumpTool::new(pdbutil).produce(pdb, DumpKind::ALL))
}
