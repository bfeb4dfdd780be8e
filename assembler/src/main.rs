//! assembler will take the given 3903 source file and generate an object
//! file for the linker along with a listing of the assembled code.

use assemble::{parse_file, Diagnostic, Diagnostics};
use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use std::{fs::write, io, path::PathBuf};
use tracing::Level;

/// assembler will take the given 3903 source file and generate an object
/// file for the linker along with a listing of the assembled code.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Assembly source file.
    filename: PathBuf,

    #[arg(
        long,
        help = "Object file to write. Defaults to the source name with an .obj extension"
    )]
    object: Option<PathBuf>,

    #[arg(long, help = "Listing file to write. Defaults to stdout")]
    listing: Option<PathBuf>,

    #[arg(long, help = "Also write the pass 1 intermediate form here")]
    intermediate: Option<PathBuf>,

    /// One of `TRACE`, `DEBUG`, `INFO`, `WARN`, or `ERROR`
    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,
}

// Warnings keep their own level even when the run fails.
fn severity(d: &Diagnostic) -> Level {
    if d.kind.is_warning() {
        Level::WARN
    } else {
        Level::ERROR
    }
}

fn log(d: &Diagnostic) {
    if severity(d) == Level::WARN {
        tracing::warn!("{d}");
    } else {
        tracing::error!("{d}");
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(io::stderr)
        .init();

    let res = match parse_file(&args.filename) {
        Ok(res) => res,
        Err(e) => {
            if let Some(diags) = e.downcast_ref::<Diagnostics>() {
                diags.iter().for_each(log);
                return Err(eyre!(
                    "{} failed to assemble with {} problems",
                    args.filename.display(),
                    diags.len()
                ));
            }
            return Err(e);
        }
    };

    res.warnings.iter().for_each(log);

    let object = args
        .object
        .unwrap_or_else(|| args.filename.with_extension("obj"));
    write(&object, &res.object)?;
    tracing::info!("wrote {}", object.display());

    if let Some(path) = &args.intermediate {
        write(path, res.program.render())?;
        tracing::info!("wrote {}", path.display());
    }

    match &args.listing {
        Some(path) => write(path, &res.listing)?,
        None => print!("{}", res.listing),
    }
    Ok(())
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Args::command().debug_assert();
}

#[test]
fn diagnostic_levels() {
    use assemble::Kind;
    let warning = Diagnostic {
        kind: Kind::UndefinedTrap,
        line: Some(2),
    };
    let error = Diagnostic {
        kind: Kind::EmptySymbol,
        line: Some(2),
    };
    assert!(severity(&warning) == Level::WARN);
    assert!(severity(&error) == Level::ERROR);
}
