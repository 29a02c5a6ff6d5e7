pub mod bitreader;
pub mod clut;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod render;
pub mod rle;
mod segment;
pub mod store;

pub use decoder::{Decoder, DecoderConfig};
pub use error::{Error, Result};
pub use render::{
    HeapRegionRaster, HeapSubpictureAllocator, PositionedRegion, RegionFormat, RegionRaster,
    Subpicture, SubpictureAllocator,
};
