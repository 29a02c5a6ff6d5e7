//! Segment parsers (C4): one per segment type, each mutating the
//! object store.
//!
//! Every segment begins with sync byte `0x0F`, a 1-byte type, a 2-byte
//! page id, and a 2-byte length; [`dispatch`] reads that common header,
//! filters by page id, routes to the type-specific parser below, and
//! then advances the reader past anything the parser left unconsumed
//! (the normal case on a version-match skip).
//!
//! See: 4.4 (C4).

use crate::bitreader::BitReader;
use crate::clut::{Clut, Color};
use crate::constants::{
    CodingMethod, PageState, OBJECT_TYPE_BASIC_CHAR, OBJECT_TYPE_COMPOSITE_STRING,
    SEGMENT_CLUT_DEFINITION, SEGMENT_END_OF_DISPLAY, SEGMENT_OBJECT_DATA,
    SEGMENT_PAGE_COMPOSITION, SEGMENT_REGION_COMPOSITION, SEGMENT_STUFFING,
};
use crate::error::Result;
use crate::rle;
use crate::store::{DvbObject, ObjectDef, ObjectPayload, Page, Region, RegionDef, Store};

/// Reads one segment (sync byte through its payload) and applies it to
/// `store`. The caller is expected to have already peeked the sync
/// byte to decide whether to call this at all.
///
/// See: 4.6 (C6), step 5.
pub(crate) fn dispatch(
    store: &mut Store,
    r: &mut BitReader,
    primary_id: u16,
    ancillary_id: u16,
) -> Result<()> {
    r.skip(8)?; // sync_byte, already checked by the caller
    let segment_type = r.read(8)? as u8;
    let page_id = r.read(16)? as u16;
    let length = r.read(16)? as u16;
    let end_byte = r.byte_pos() + length as usize;

    if page_id != primary_id && page_id != ancillary_id {
        log::debug!("segment skipped (page id: {})", page_id);
        return skip_to(r, end_byte);
    }

    match segment_type {
        SEGMENT_PAGE_COMPOSITION => parse_page_composition(store, r, end_byte, page_id)?,
        SEGMENT_REGION_COMPOSITION => parse_region_composition(store, r, end_byte)?,
        SEGMENT_CLUT_DEFINITION => parse_clut(store, r, end_byte)?,
        SEGMENT_OBJECT_DATA => parse_object_data(store, r, end_byte)?,
        SEGMENT_END_OF_DISPLAY | SEGMENT_STUFFING => {}
        other => log::debug!("unsupported segment type: {:#04x}", other),
    }

    skip_to(r, end_byte)
}

/// Advances `r` to `end_byte`, tolerating parsers that stopped early
/// (a version-match skip) or a malformed segment whose fields already
/// ran past its declared length.
fn skip_to(r: &mut BitReader, end_byte: usize) -> Result<()> {
    if r.byte_pos() < end_byte {
        let bits = ((end_byte - r.byte_pos()) * 8) as u32;
        r.skip(bits)?;
    }
    Ok(())
}

/// See: 4.4 "Page composition".
fn parse_page_composition(
    store: &mut Store,
    r: &mut BitReader,
    end_byte: usize,
    page_id: u16,
) -> Result<()> {
    let timeout = r.read(8)? as u8;
    let version = r.read(4)? as u8;
    let state = PageState::from_bits(r.read(2)?);
    r.skip(2)?; // reserved

    if state == PageState::ModeChange {
        store.reset();
    } else if store.page.is_none() && state != PageState::Acquisition {
        // Not a full page composition; wait for one.
        return Ok(());
    }

    if state == PageState::Acquisition {
        store.purge_objects();
    }

    if let Some(page) = &store.page {
        if page.version == version {
            return Ok(());
        }
    }

    let mut region_defs = Vec::new();
    while r.byte_pos() < end_byte {
        let region_id = r.read(8)? as u8;
        r.skip(8)?; // reserved
        let x = r.read(16)? as u16;
        let y = r.read(16)? as u16;
        region_defs.push(RegionDef { region_id, x, y });
    }

    store.page = Some(Page {
        id: page_id,
        timeout,
        version,
        state,
        region_defs,
    });
    Ok(())
}

/// See: 4.4 "Region composition".
fn parse_region_composition(store: &mut Store, r: &mut BitReader, end_byte: usize) -> Result<()> {
    let region_id = r.read(8)? as u8;
    let version = r.read(4)? as u8;
    let fill = r.read_bool()?;
    r.skip(3)?; // reserved

    if let Some(region) = store.regions.get(&region_id) {
        if region.version == version {
            return Ok(());
        }
    }

    let width = r.read(16)? as u16;
    let height = r.read(16)? as u16;
    let level_compatibility = r.read(3)? as u8;
    let depth = r.read(3)? as u8;
    r.skip(2)?; // reserved
    let clut_id = r.read(8)? as u8;
    let default_8bpp_code = r.read(8)? as u8;
    let default_4bpp_code = r.read(4)? as u8;
    let default_2bpp_code = r.read(2)? as u8;
    r.skip(2)?; // reserved

    let mut object_defs = Vec::new();
    while r.byte_pos() < end_byte {
        let object_id = r.read(16)? as u16;
        let object_type = r.read(2)? as u8;
        let provider = r.read(2)? as u8;
        let x = r.read(12)? as u16;
        r.skip(4)?; // reserved
        let y = r.read(12)? as u16;

        let (fg_palette, bg_palette) =
            if object_type == OBJECT_TYPE_BASIC_CHAR || object_type == OBJECT_TYPE_COMPOSITE_STRING
            {
                (Some(r.read(8)? as u8), Some(r.read(8)? as u8))
            } else {
                (None, None)
            };

        object_defs.push(ObjectDef {
            object_id,
            object_type,
            provider,
            x,
            y,
            fg_palette,
            bg_palette,
        });
    }

    store.regions.insert(
        region_id,
        Region {
            version,
            fill,
            width,
            height,
            level_compatibility,
            depth,
            clut_id,
            default_8bpp_code,
            default_4bpp_code,
            default_2bpp_code,
            object_defs,
        },
    );
    Ok(())
}

/// See: 4.4 "CLUT definition".
fn parse_clut(store: &mut Store, r: &mut BitReader, end_byte: usize) -> Result<()> {
    let clut_id = r.read(8)? as u8;
    let version = r.read(4)? as u8;
    r.skip(4)?; // reserved

    if let Some(clut) = store.cluts.get(&clut_id) {
        if clut.version == version {
            return Ok(());
        }
    }

    let mut clut = Clut::blank(version);

    while r.byte_pos() < end_byte {
        let entry_id = r.read(8)? as u8;
        let entry_type = r.read(3)? as u8;
        r.skip(4)?; // reserved
        let full_range = r.read_bool()?;

        // Per EN 300 743 7.2.3 note 1, at most one bit of `type` should
        // be set, but real streams don't always respect that; apply to
        // every table the bitmask names.
        let color = if full_range {
            Color {
                y: r.read(8)? as u8,
                cr: r.read(8)? as u8,
                cb: r.read(8)? as u8,
                t: r.read(8)? as u8,
            }
        } else {
            // Stored as the raw small-range values, without rescaling
            // to 8-bit range. This mirrors a quirk in the reference
            // decoder rather than a standard-mandated behaviour; see
            // DESIGN.md.
            Color {
                y: r.read(6)? as u8,
                cr: r.read(4)? as u8,
                cb: r.read(4)? as u8,
                t: r.read(2)? as u8,
            }
        };

        if entry_type & 0x04 != 0 {
            if let Some(slot) = clut.entries_2bpp.get_mut(entry_id as usize) {
                *slot = color;
            }
        }
        if entry_type & 0x02 != 0 {
            if let Some(slot) = clut.entries_4bpp.get_mut(entry_id as usize) {
                *slot = color;
            }
        }
        if entry_type & 0x01 != 0 {
            clut.entries_8bpp[entry_id as usize] = color;
        }
    }

    store.cluts.insert(clut_id, clut);
    Ok(())
}

/// See: 4.4 "Object data".
fn parse_object_data(store: &mut Store, r: &mut BitReader, _end_byte: usize) -> Result<()> {
    let object_id = r.read(16)? as u16;
    let version = r.read(4)? as u8;
    let coding = CodingMethod::from_bits(r.read(2)?);
    let non_modifying_color = r.read_bool()?;
    r.skip(1)?; // reserved

    match coding {
        CodingMethod::Pixels => {
            if let Some(obj) = store.objects.get(&object_id) {
                if obj.version == version {
                    return Ok(());
                }
            }

            let top_field_length = r.read(16)? as u16;
            let bottom_field_length = r.read(16)? as u16;
            let top_field = rle::parse_field(r, top_field_length)?;
            let bottom_field = rle::parse_field(r, bottom_field_length)?;

            store.objects.insert(
                object_id,
                DvbObject {
                    version,
                    non_modifying_color,
                    payload: ObjectPayload::Pixels {
                        top_field,
                        bottom_field,
                    },
                },
            );
        }
        CodingMethod::Characters(method) => {
            log::debug!(
                "object {} uses unsupported coding method {}, skipping",
                object_id,
                method
            );
        }
    }
    Ok(())
}
