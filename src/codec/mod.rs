// Memory-image codec: quantized weights -> BRAM initialization files

pub mod error;
pub mod hex;
pub mod layout;
pub mod reader;
pub mod writer;

pub use error::CodecError;
pub use hex::{decode_hex, encode_byte, HexError};
pub use layout::{Coord, LaneOrder, LayoutDescriptor, LinePlan, L1_LAYOUT, L2_LAYOUT, SHIFT_LAYOUT};
pub use reader::{read_dir, read_image, read_matrix, verify_dir};
pub use writer::{write_all, ExportMode, FileManifest, ManifestEntry, MemoryImageWriter};
