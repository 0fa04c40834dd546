//! sfxkit release builder binary

use clap::{Parser, Subcommand};
use sfxkit::exit_codes::{EXIT_PANIC, EXIT_SUCCESS};
use sfxkit::{
    ArchiveRequest, AssemblyMethod, ChecksumAlgorithm, ReleaseManifest, ReleaseRequest,
    SfxVariant, StatusResult, Toolkit, build_release,
};
use std::{env, panic, path::PathBuf, process};

const VERSION: &str = sfxkit::version::VERSION;

#[derive(Parser, Debug)]
#[command(version = VERSION, about = "Build self-extracting 7-Zip releases")]
struct Args {
    /// Log level (trace, debug, info, warn, error; prefix with json: for JSON output)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved installation root
    Locate,

    /// Manage the hidden scratch workspace
    Workspace {
        #[command(subcommand)]
        action: WorkspaceAction,
    },

    /// Copy the contents of a directory into a staging directory
    Stage {
        /// Directory whose contents are copied
        source: PathBuf,
        /// Destination directory (created if missing)
        dest: PathBuf,
    },

    /// Compress a directory into {name}.7z
    Archive {
        /// Directory whose contents become the archive
        input: PathBuf,
        /// Archive base name
        #[arg(short, long)]
        name: String,
        /// Output directory (defaults to the workspace)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Archiver executable (defaults to the bundled 7za.exe)
        #[arg(long)]
        archiver: Option<PathBuf>,
        /// Compression level 0-9
        #[arg(short = 'l', long, default_value_t = 5)]
        level: u8,
    },

    /// Stage the SFX module for a variant
    PrepareSfx {
        /// GUI-Mode, CMD-Mode, Installer or Custom
        variant: SfxVariant,
    },

    /// Stage the config template for a variant as config.txt
    PrepareCfg {
        /// GUI-Mode, CMD-Mode, Installer or Custom
        variant: SfxVariant,
    },

    /// Assemble the release executable from the staged workspace
    Release {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        version: String,
        /// auto, copy or stream
        #[arg(short, long, default_value = "auto")]
        method: AssemblyMethod,
        /// Output directory (defaults to release/{name}-{version})
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write a checksum report (sha256 or sha512)
        #[arg(long)]
        checksum: Option<ChecksumAlgorithm>,
    },

    /// Write a checksum report for a file
    Checksum {
        input: PathBuf,
        #[arg(short, long, default_value = "sha256")]
        algorithm: ChecksumAlgorithm,
        /// Report directory (defaults to the input's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Run a complete build from a release manifest
    Build {
        /// Path to the release manifest (JSON)
        #[arg(short, long)]
        manifest: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum WorkspaceAction {
    /// Create the workspace (idempotent)
    Create,
    /// Remove everything inside the workspace
    Clean,
    /// Remove the workspace directory
    Destroy,
}

fn main() {
    // Set up panic handler to return specific exit code
    panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: {}", panic_info);
        process::exit(EXIT_PANIC);
    }));

    let result = panic::catch_unwind(run);

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(_) => {
            eprintln!("Fatal: Unhandled panic in builder");
            process::exit(EXIT_PANIC);
        }
    }
}

fn run() -> i32 {
    // Handle --version before clap
    if env::args().nth(1).as_deref() == Some("--version") {
        println!("sfxkit-builder {}", sfxkit::version::full_version());
        return EXIT_SUCCESS;
    }

    let args = Args::parse();

    if let Some(ref level) = args.log_level {
        sfxkit::logger::JsonLogger::init_with_level(level, "CLI --log-level");
    } else {
        sfxkit::logger::JsonLogger::init();
    }

    let toolkit = Toolkit::system();

    match args.command {
        Command::Locate => report(toolkit.locate()),
        Command::Workspace { action } => match action {
            WorkspaceAction::Create => report(toolkit.create_hidden_temp_data()),
            WorkspaceAction::Clean => report(toolkit.clean_hidden_temp_data()),
            WorkspaceAction::Destroy => report(toolkit.remove_hidden_temp_data()),
        },
        Command::Stage { source, dest } => report(toolkit.prepare_data_bundle(&source, &dest)),
        Command::Archive {
            input,
            name,
            output_dir,
            archiver,
            level,
        } => {
            let mut request = ArchiveRequest::new(input, name).with_compression_level(level);
            if let Some(dir) = output_dir {
                request = request.with_output_dir(dir);
            }
            if let Some(archiver) = archiver {
                request = request.with_archiver(archiver);
            }
            report(toolkit.create_data_bundle(&request))
        }
        Command::PrepareSfx { variant } => report(toolkit.prepare_sfx(variant)),
        Command::PrepareCfg { variant } => report(toolkit.prepare_cfg(variant)),
        Command::Release {
            name,
            version,
            method,
            output,
            checksum,
        } => {
            let mut request = ReleaseRequest::new(name, version).with_method(method);
            if let Some(output) = output {
                request = request.with_output_path(output);
            }
            if let Some(algorithm) = checksum {
                request = request.with_checksum(algorithm);
            }
            report(toolkit.create_release(&request))
        }
        Command::Checksum {
            input,
            algorithm,
            output_dir,
        } => report(toolkit.create_checksum(&input, algorithm, output_dir.as_deref())),
        Command::Build { manifest } => match ReleaseManifest::from_file(&manifest) {
            Ok(manifest) => report(build_release(&toolkit, &manifest)),
            Err(e) => {
                eprintln!("Manifest error: {}", e);
                e.exit_code()
            }
        },
    }
}

/// Print the outcome and map it to the process exit code
fn report<T>(status: StatusResult<T>) -> i32 {
    if status.is_success() {
        println!("{}", status.message);
    } else {
        eprintln!("{}", status.message);
    }
    status.exit_code()
}
