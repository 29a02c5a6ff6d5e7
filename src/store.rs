//! The object store (C5): current page, region set, object set, and
//! CLUT table.
//!
//! Regions, objects and CLUTs are keyed by id in `HashMap`s rather than
//! the reference decoder's intrusive singly-linked lists — this gives
//! O(1) lookup for the renderer and avoids any manual list-splicing on
//! version replacement. The page's region-definition order is kept
//! explicit since it, unlike the region/object/CLUT sets, is
//! significant: it is the order regions are painted in.
//!
//! See: 3. DATA MODEL, 4.5 (C5).

use std::collections::HashMap;

use crate::clut::Clut;
use crate::constants::PageState;

/// One entry in a page's region-definition list: which region to draw,
/// and where on the canvas to place its top-left corner.
#[derive(Debug, Clone, Copy)]
pub struct RegionDef {
    pub region_id: u8,
    pub x: u16,
    pub y: u16,
}

/// The single active page.
#[derive(Debug, Clone)]
pub struct Page {
    pub id: u16,
    pub timeout: u8,
    pub version: u8,
    pub state: PageState,
    pub region_defs: Vec<RegionDef>,
}

/// Where an object should be drawn within a region, and (for
/// character-coded objects) which palette indices to use as foreground
/// and background.
#[derive(Debug, Clone, Copy)]
pub struct ObjectDef {
    pub object_id: u16,
    pub object_type: u8,
    pub provider: u8,
    pub x: u16,
    pub y: u16,
    pub fg_palette: Option<u8>,
    pub bg_palette: Option<u8>,
}

/// A rectangular display area: its own CLUT reference, default pixel
/// codes, and an ordered list of objects to paint into it.
#[derive(Debug, Clone)]
pub struct Region {
    pub version: u8,
    pub fill: bool,
    pub width: u16,
    pub height: u16,
    pub level_compatibility: u8,
    pub depth: u8,
    pub clut_id: u8,
    pub default_8bpp_code: u8,
    pub default_4bpp_code: u8,
    pub default_2bpp_code: u8,
    pub object_defs: Vec<ObjectDef>,
}

/// A pixel or character object. Pixel objects carry their decoded top
/// and bottom field subimages; character objects are recognised but
/// carry no renderable payload.
#[derive(Debug, Clone)]
pub struct DvbObject {
    pub version: u8,
    pub non_modifying_color: bool,
    pub payload: ObjectPayload,
}

#[derive(Debug, Clone)]
pub enum ObjectPayload {
    Pixels {
        top_field: crate::rle::Subimage,
        bottom_field: crate::rle::Subimage,
    },
    Characters,
}

/// Holds everything accumulated across subtitle units for one epoch:
/// the current page, the region/object/CLUT sets, and a fabricated
/// default CLUT used when a region references an uninstalled one.
#[derive(Debug)]
pub struct Store {
    pub page: Option<Page>,
    pub regions: HashMap<u8, Region>,
    pub objects: HashMap<u16, DvbObject>,
    pub cluts: HashMap<u8, Clut>,
    pub default_clut: Clut,
}

impl Store {
    pub fn new() -> Self {
        Store {
            page: None,
            regions: HashMap::new(),
            objects: HashMap::new(),
            cluts: HashMap::new(),
            default_clut: Clut::default_clut(),
        }
    }

    /// Frees the page, every region, every object, and every installed
    /// CLUT. Called on a page-composition segment carrying
    /// `mode-change` state, and on decoder teardown.
    pub fn reset(&mut self) {
        self.page = None;
        self.regions.clear();
        self.objects.clear();
        self.cluts.clear();
    }

    /// Frees only the object set, leaving the page, regions and CLUTs
    /// intact. Called on a page-composition segment carrying
    /// `acquisition` state, to refresh stale bitmaps.
    pub fn purge_objects(&mut self) {
        self.objects.clear();
    }

    /// Resolves the CLUT a region should render with: the region's
    /// installed CLUT if present, else the fabricated default.
    pub fn clut_for(&self, clut_id: u8) -> &Clut {
        self.cluts.get(&clut_id).unwrap_or(&self.default_clut)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
