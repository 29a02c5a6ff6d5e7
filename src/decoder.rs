//! Unit dispatcher (C6): validates the PES envelope, walks segments,
//! and invokes the renderer.
//!
//! See: 4.6 (C6).

use crate::bitreader::BitReader;
use crate::constants::{DATA_IDENTIFIER, END_MARKER, SYNC_BYTE};
use crate::error::{Error, Result};
use crate::render::{HeapSubpictureAllocator, Subpicture, SubpictureAllocator};
use crate::segment;
use crate::store::Store;

/// Decoder construction parameters: which page ids this decoder
/// accepts segments for.
///
/// See: 6. EXTERNAL INTERFACES, 7.3 Configuration.
#[derive(Debug, Clone, Copy)]
pub struct DecoderConfig {
    pub primary_page_id: u16,
    pub ancillary_page_id: u16,
}

impl DecoderConfig {
    /// Splits a 32-bit composite identifier into its primary (low 16
    /// bits) and ancillary (high 16 bits) page ids.
    pub fn from_composite_id(id: u32) -> Self {
        DecoderConfig {
            primary_page_id: (id & 0xFFFF) as u16,
            ancillary_page_id: (id >> 16) as u16,
        }
    }
}

/// A DVB subtitle decoder: accumulated object store plus the page ids
/// it was opened with.
pub struct Decoder {
    config: DecoderConfig,
    store: Store,
}

impl Decoder {
    pub fn new(config: DecoderConfig) -> Self {
        Decoder {
            config,
            store: Store::new(),
        }
    }

    /// Decodes one subtitle PES payload carrying `pts`, a presentation
    /// timestamp in microseconds, using the default heap-backed
    /// allocator.
    pub fn decode_unit(&mut self, buf: &[u8], pts: i64) -> Result<Option<Subpicture>> {
        let mut alloc = HeapSubpictureAllocator;
        self.decode_unit_with(buf, pts, &mut alloc)
    }

    /// As [`Decoder::decode_unit`], but with a caller-supplied
    /// [`SubpictureAllocator`].
    ///
    /// See: 4.6 (C6).
    pub fn decode_unit_with(
        &mut self,
        buf: &[u8],
        pts: i64,
        alloc: &mut dyn SubpictureAllocator,
    ) -> Result<Option<Subpicture>> {
        if pts <= 0 {
            log::warn!("discarding non-dated subtitle unit");
            return Ok(None);
        }

        let mut r = BitReader::new(buf);

        let data_identifier = r.read(8)? as u8;
        if data_identifier != DATA_IDENTIFIER {
            log::debug!("wrong data identifier: {:#04x}", data_identifier);
            return Ok(None);
        }
        r.skip(8)?; // subtitle stream id, not enforced

        loop {
            match r.peek(8) {
                Ok(byte) if byte as u8 == SYNC_BYTE => {}
                Ok(_) => break,
                Err(Error::StreamTruncated(_)) => break,
                Err(err) => return Err(err),
            }

            match segment::dispatch(
                &mut self.store,
                &mut r,
                self.config.primary_page_id,
                self.config.ancillary_page_id,
            ) {
                Ok(()) => {}
                Err(Error::StreamTruncated(_)) => {
                    log::warn!("stream truncated mid-segment, abandoning remainder of unit");
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        match r.read(8) {
            Ok(byte) if byte as u8 == END_MARKER => {}
            _ => log::warn!("missing end marker"),
        }

        if self.store.page.is_some() {
            Ok(crate::render::render(&self.store, pts, alloc))
        } else {
            Ok(None)
        }
    }
}
