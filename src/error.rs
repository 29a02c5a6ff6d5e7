use thiserror::Error;

/// Decoding errors.
///
/// None of these are fatal to the `Decoder` itself: every variant is
/// local to one subtitle unit or one segment, and version mismatches
/// (the normal mechanism for incremental updates) are not errors at
/// all. See the unit dispatcher and renderer for where each variant is
/// produced and how it is recovered from.
#[derive(Debug, Error)]
pub enum Error {
    /// The PES payload did not begin with the expected `0x20` data
    /// identifier.
    #[error("wrong data identifier: {0:#04x}")]
    WrongDataIdentifier(u8),
    /// The `0xFF` end marker was missing after the last segment.
    #[error("missing end marker")]
    MissingEndMarker,
    /// A read or skip ran past the end of the unit's buffer while
    /// attempting to consume {0} bits.
    #[error("stream truncated while reading {0} bits")]
    StreamTruncated(u32),
    /// A segment carried a type this decoder does not recognise.
    #[error("unknown segment type: {0:#04x}")]
    UnknownSegmentType(u8),
    /// An object used a coding method other than pixels (e.g.
    /// character-coded subtitles), which is recognised but not
    /// rendered.
    #[error("unsupported object coding method: {0}")]
    UnsupportedCoding(u8),
    /// A region definition referenced a region id that was never
    /// installed by a region composition segment.
    #[error("no region found with id {0}")]
    MissingRegion(u8),
    /// An object definition referenced an object id that was never
    /// installed by an object data segment.
    #[error("no object found with id {0}")]
    MissingObject(u16),
    /// The unit's presentation timestamp was not positive.
    #[error("non-dated subtitle unit (pts <= 0)")]
    NonDatedUnit,
    /// The host's pixel-buffer factory failed to allocate a raster for
    /// a region.
    #[error("cannot allocate raster for region {0}")]
    RegionAllocationFailed(u8),
}

/// A specialised `Result` type for decoding operations.
pub type Result<T> = ::std::result::Result<T, Error>;
