//! invokedb-board-to-assets: mark every image of a board as an asset.
//!
//! Sets `image_category = 'user'` and `image_origin = 'external'` for all
//! images linked to the board. Nothing else is modified.
//!
//! ```bash
//! invokedb-board-to-assets --db invokeai.db --board-name "Recovered 21-11-25"
//! invokedb-board-to-assets --db invokeai.db --board-name "My Assets Board" --dry-run --verbose
//! ```

use anyhow::Result;

use invokedb::cli::{self, Tool};
use invokedb::config::Config;
use invokedb::db::Database;
use invokedb::logging;
use invokedb::reclassify::{reclassify_board, Reclassification};

fn main() -> Result<()> {
    let args = cli::parse_args(Tool::BoardToAssets);

    let config = Config::load(args.config.as_deref())?;
    logging::init(args.verbose, config.logging.dir.as_deref())?;

    let db = Database::open(&args.db)?;
    let board_name = args.board_name.as_deref().unwrap_or_default();

    let summary = reclassify_board(&db, board_name, Reclassification::Assets, args.dry_run)?;

    if args.dry_run {
        println!("[DRY] Would update {} images.", summary.updated);
    } else {
        println!("Updated {} images as assets.", summary.updated);
    }

    Ok(())
}
