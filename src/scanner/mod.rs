pub mod discovery;
pub mod metadata;
pub mod thumbnails;
pub mod timestamp;

pub use discovery::discover_images;
pub use metadata::OpenedImage;
pub use thumbnails::{ThumbnailOutcome, ThumbnailWriter};
pub use timestamp::resolve_created_at;
