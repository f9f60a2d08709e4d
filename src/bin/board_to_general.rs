//! invokedb-board-to-general: mark every image of a board as a regular
//! internal image.
//!
//! Sets `image_category = 'general'` and `image_origin = 'internal'` for all
//! images linked to the board. `is_intermediate` and timestamps are kept.

use anyhow::Result;

use invokedb::cli::{self, Tool};
use invokedb::config::Config;
use invokedb::db::Database;
use invokedb::logging;
use invokedb::reclassify::{reclassify_board, Reclassification};

fn main() -> Result<()> {
    let args = cli::parse_args(Tool::BoardToGeneral);

    let config = Config::load(args.config.as_deref())?;
    logging::init(args.verbose, config.logging.dir.as_deref())?;

    let db = Database::open(&args.db)?;
    let board_name = args.board_name.as_deref().unwrap_or_default();

    let summary = reclassify_board(&db, board_name, Reclassification::General, args.dry_run)?;

    if args.dry_run {
        println!("[DRY] Would update {} images.", summary.updated);
    } else {
        println!("Updated {} images as general/internal.", summary.updated);
    }
    println!("Done.");

    Ok(())
}
