//! Dataset-level structure: the directory layout, the image index, the
//! seeded splitter and the file moves that realize a split.

pub mod index;
pub mod layout;
pub mod split;
pub mod transfer;

pub use index::{read_image_meta, ImageIndex, IMAGE_EXTENSIONS};
pub use layout::{DatasetLayout, Split};
pub use split::{DatasetSplitter, SplitAssignment};
pub use transfer::{realize_split, transfer_file, SplitInventory, TransferMode, TransferSummary};
