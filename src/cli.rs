//! Command-line parsing shared by the three tools.

use std::path::PathBuf;

use crate::error::Error;

/// Which tool is parsing its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Reindex,
    BoardToAssets,
    BoardToGeneral,
}

impl Tool {
    pub fn binary_name(&self) -> &'static str {
        match self {
            Tool::Reindex => "invokedb-reindex",
            Tool::BoardToAssets => "invokedb-board-to-assets",
            Tool::BoardToGeneral => "invokedb-board-to-general",
        }
    }

    fn takes_board(&self) -> bool {
        !matches!(self, Tool::Reindex)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    pub db: PathBuf,
    /// Outputs root (reindex only).
    pub outputs: Option<PathBuf>,
    /// Board to reclassify (board tools only).
    pub board_name: Option<String>,
    pub dry_run: bool,
    pub verbose: bool,
    pub gen_thumbs: bool,
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(Args),
    Help,
    Version,
}

/// Parse `args` (without the program name) for `tool`.
pub fn parse_args_from(tool: Tool, args: &[String]) -> Result<Command, Error> {
    let mut parsed = Args::default();
    let mut db = None;

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--dry-run" => parsed.dry_run = true,
            "--verbose" | "-v" => parsed.verbose = true,
            "--gen-thumbs" if tool == Tool::Reindex => parsed.gen_thumbs = true,
            "--db" => db = Some(PathBuf::from(value(args, &mut i)?)),
            "--config" | "-c" => parsed.config = Some(PathBuf::from(value(args, &mut i)?)),
            "--outputs" if tool == Tool::Reindex => {
                parsed.outputs = Some(PathBuf::from(value(args, &mut i)?));
            }
            "--board-name" if tool.takes_board() => {
                parsed.board_name = Some(value(args, &mut i)?.to_string());
            }
            _ => return Err(Error::Usage(format!("Unknown argument: {}", arg))),
        }
        i += 1;
    }

    parsed.db = db.ok_or_else(|| Error::Usage("--db is required".to_string()))?;

    if tool == Tool::Reindex && parsed.outputs.is_none() {
        return Err(Error::Usage("--outputs is required".to_string()));
    }
    if tool.takes_board() && parsed.board_name.is_none() {
        return Err(Error::Usage("--board-name is required".to_string()));
    }

    Ok(Command::Run(parsed))
}

fn value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str, Error> {
    let flag = &args[*i];
    if *i + 1 < args.len() {
        *i += 1;
        Ok(args[*i].as_str())
    } else {
        Err(Error::Usage(format!("{} requires a value", flag)))
    }
}

/// Parse the process arguments, handling `--help`, `--version` and usage
/// errors by exiting.
pub fn parse_args(tool: Tool) -> Args {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match parse_args_from(tool, &args) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            print_help(tool);
            std::process::exit(0);
        }
        Ok(Command::Version) => {
            println!("{} {}", tool.binary_name(), env!("CARGO_PKG_VERSION"));
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help(tool);
            std::process::exit(2);
        }
    }
}

pub fn print_help(tool: Tool) {
    let (about, usage, specific) = match tool {
        Tool::Reindex => (
            "Rebuild the InvokeAI images index from the files in outputs/images.\n\
             New images are added as general/internal and linked into a dated board.",
            "--db PATH --outputs PATH [OPTIONS]",
            "    --outputs PATH      Path to InvokeAI outputs directory (root of outputs/)\n\
             \x20   --gen-thumbs        Generate thumbnails for newly inserted images if missing\n",
        ),
        Tool::BoardToAssets => (
            "Mark all images of a board as assets (user/external).",
            "--db PATH --board-name NAME [OPTIONS]",
            "    --board-name NAME   Board whose images should be reclassified (case-insensitive)\n",
        ),
        Tool::BoardToGeneral => (
            "Mark all images of a board as regular internal images (general/internal).",
            "--db PATH --board-name NAME [OPTIONS]",
            "    --board-name NAME   Board whose images should be reclassified (case-insensitive)\n",
        ),
    };

    println!(
        r#"{name} - {about}

USAGE:
    {name} {usage}

OPTIONS:
    --db PATH           Path to invokeai.db (SQLite file)
{specific}    --dry-run           Do not modify anything, only print what would change
    --verbose, -v       Verbose output
    --config, -c PATH   Path to config file
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    INVOKEDB_CONFIG     Path to config file (overrides default location)
    INVOKEDB_LOG        Log level (trace, debug, info, warn, error)"#,
        name = tool.binary_name(),
        about = about,
        usage = usage,
        specific = specific,
    );
}
