//! invokedb-reindex: catalog image files that are missing from `invokeai.db`.
//!
//! ```bash
//! invokedb-reindex --db invokeai.db --outputs ~/invokeai/outputs --gen-thumbs
//! invokedb-reindex --db invokeai.db --outputs ~/invokeai/outputs --dry-run --verbose
//! ```

use anyhow::Result;
use tracing::info;

use invokedb::cli::{self, Tool};
use invokedb::config::Config;
use invokedb::db::Database;
use invokedb::logging;
use invokedb::reindex::{ReindexOptions, Reindexer};

fn main() -> Result<()> {
    let args = cli::parse_args(Tool::Reindex);

    let config = Config::load(args.config.as_deref())?;
    logging::init(args.verbose, config.logging.dir.as_deref())?;

    let db = Database::open(&args.db)?;
    info!("Database opened at {:?}", args.db);

    let outputs = args
        .outputs
        .as_deref()
        .ok_or_else(|| invokedb::Error::Usage("--outputs is required".to_string()))?;

    let options = ReindexOptions {
        dry_run: args.dry_run,
        gen_thumbs: args.gen_thumbs,
    };
    let reindexer = Reindexer::new(&db, &config, outputs, options);
    info!("Importing into board '{}'", reindexer.board_name());

    let summary = reindexer.run()?;

    let prefix = if args.dry_run { "[DRY] Would import" } else { "Imported" };
    println!(
        "{} {} of {} images ({} already in DB, {} failed, {} thumbnails)",
        prefix,
        summary.imported(),
        summary.found(),
        summary.skipped(),
        summary.failed(),
        summary.thumbnails_created(),
    );
    if let Some(board) = &summary.board {
        println!("Board: '{}' (id={})", board.board_name, board.board_id);
    }
    println!("Done.");

    Ok(())
}
