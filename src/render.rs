//! Renderer (C7): paints accumulated store state into positioned
//! YCbCrA rasters.
//!
//! See: 4.7 (C7), 6. EXTERNAL INTERFACES.

use crate::clut::Clut;
use crate::constants::MAX_ROWS;
use crate::error::Result;
use crate::rle::Subimage;
use crate::store::Store;

/// A pixel format request passed to [`SubpictureAllocator::create_region`].
#[derive(Debug, Clone, Copy)]
pub struct RegionFormat {
    pub width: u16,
    pub height: u16,
}

/// The planes backing one rendered region: planar YCbCr 4:4:4 plus an
/// 8-bit alpha plane, all sharing one pitch.
pub trait RegionRaster {
    fn pitch(&self) -> usize;
    fn y_mut(&mut self) -> &mut [u8];
    fn u_mut(&mut self) -> &mut [u8];
    fn v_mut(&mut self) -> &mut [u8];
    fn a_mut(&mut self) -> &mut [u8];
}

/// A positioned, rendered region within a subpicture.
pub struct PositionedRegion {
    pub x: u16,
    pub y: u16,
    pub raster: Box<dyn RegionRaster>,
}

/// The decoder's output: zero or more positioned regions with a
/// validity interval.
///
/// See: 6. EXTERNAL INTERFACES.
pub struct Subpicture {
    pub start_pts: i64,
    pub stop_pts: i64,
    pub ephemeral: bool,
    pub regions: Vec<PositionedRegion>,
}

/// Host-supplied pixel-buffer factory. Allocating the output raster is
/// an external collaborator, not something this crate owns.
///
/// See: 6. EXTERNAL INTERFACES.
pub trait SubpictureAllocator {
    fn new_subpicture(&mut self) -> Subpicture;
    fn create_region(&mut self, format: RegionFormat) -> Result<Box<dyn RegionRaster>>;
}

/// A straightforward `Vec<u8>`-backed [`RegionRaster`], so the decoder
/// is usable without a host integration.
pub struct HeapRegionRaster {
    pitch: usize,
    y: Vec<u8>,
    u: Vec<u8>,
    v: Vec<u8>,
    a: Vec<u8>,
}

impl HeapRegionRaster {
    fn new(format: RegionFormat) -> Self {
        let pitch = format.width as usize;
        let len = pitch * format.height as usize;
        HeapRegionRaster {
            pitch,
            y: vec![0; len],
            u: vec![0; len],
            v: vec![0; len],
            a: vec![0; len],
        }
    }
}

impl RegionRaster for HeapRegionRaster {
    fn pitch(&self) -> usize {
        self.pitch
    }
    fn y_mut(&mut self) -> &mut [u8] {
        &mut self.y
    }
    fn u_mut(&mut self) -> &mut [u8] {
        &mut self.u
    }
    fn v_mut(&mut self) -> &mut [u8] {
        &mut self.v
    }
    fn a_mut(&mut self) -> &mut [u8] {
        &mut self.a
    }
}

/// Default [`SubpictureAllocator`]: allocates heap-backed planes and
/// never fails.
#[derive(Debug, Default)]
pub struct HeapSubpictureAllocator;

impl SubpictureAllocator for HeapSubpictureAllocator {
    fn new_subpicture(&mut self) -> Subpicture {
        Subpicture {
            start_pts: 0,
            stop_pts: 0,
            ephemeral: true,
            regions: Vec::new(),
        }
    }

    fn create_region(&mut self, format: RegionFormat) -> Result<Box<dyn RegionRaster>> {
        Ok(Box::new(HeapRegionRaster::new(format)))
    }
}

/// Paints every region named by the current page, in definition order,
/// into a new subpicture timed against `pts`.
///
/// See: 4.7 (C7).
pub fn render(
    store: &Store,
    pts: i64,
    alloc: &mut dyn SubpictureAllocator,
) -> Option<Subpicture> {
    let page = store.page.as_ref()?;

    let mut subpicture = alloc.new_subpicture();
    subpicture.start_pts = pts;
    subpicture.stop_pts = pts + page.timeout as i64 * 1_000_000;
    subpicture.ephemeral = true;

    for region_def in &page.region_defs {
        let region = match store.regions.get(&region_def.region_id) {
            Some(region) => region,
            None => {
                log::debug!("missing region {}", region_def.region_id);
                continue;
            }
        };

        let format = RegionFormat {
            width: region.width,
            height: region.height,
        };
        let mut raster = match alloc.create_region(format) {
            Ok(raster) => raster,
            Err(err) => {
                log::error!(
                    "cannot allocate raster for region {}: {}",
                    region_def.region_id,
                    err
                );
                continue;
            }
        };

        let clut = store.clut_for(region.clut_id);

        for object_def in &region.object_defs {
            let object = match store.objects.get(&object_def.object_id) {
                Some(object) => object,
                None => {
                    log::debug!("missing object {}", object_def.object_id);
                    continue;
                }
            };

            if let crate::store::ObjectPayload::Pixels {
                top_field,
                bottom_field,
            } = &object.payload
            {
                paint_field(
                    raster.as_mut(),
                    clut,
                    top_field,
                    object_def.x,
                    object_def.y,
                    0,
                    region.width,
                    region.height,
                );
                paint_field(
                    raster.as_mut(),
                    clut,
                    bottom_field,
                    object_def.x,
                    object_def.y,
                    1,
                    region.width,
                    region.height,
                );
            }
        }

        subpicture.regions.push(PositionedRegion {
            x: region_def.x,
            y: region_def.y,
            raster,
        });
    }

    Some(subpicture)
}

/// Paints one field's runs into `raster`, interlacing into either even
/// (`field_offset = 0`, top) or odd (`field_offset = 1`, bottom) output
/// lines.
///
/// See: 4.7 (C7), steps 4.
#[allow(clippy::too_many_arguments)]
fn paint_field(
    raster: &mut dyn RegionRaster,
    clut: &Clut,
    field: &Subimage,
    object_x: u16,
    object_y: u16,
    field_offset: u16,
    region_width: u16,
    region_height: u16,
) {
    let pitch = raster.pitch();
    let mut run_idx = 0usize;
    for row in 0..field.rows as usize {
        if row >= MAX_ROWS {
            break;
        }
        let out_y = object_y as usize + 2 * row + field_offset as usize;
        if out_y >= region_height as usize {
            break;
        }

        let row_cols = field.cols.get(row).copied().unwrap_or(0);
        let mut col = 0u16;
        while col < row_cols && run_idx < field.runs.len() {
            let run = field.runs[run_idx];
            run_idx += 1;

            let palette = clut.palette(run.depth);
            let color = palette
                .get(run.color as usize)
                .copied()
                .unwrap_or_default();
            let alpha = 255u8.saturating_sub(color.t);

            for i in 0..run.length {
                let out_x = object_x as usize + (col + i) as usize;
                if out_x >= region_width as usize {
                    break;
                }
                let offset = out_y * pitch + out_x;
                if offset >= raster.y_mut().len() {
                    break;
                }
                raster.y_mut()[offset] = color.y;
                raster.u_mut()[offset] = color.cb;
                raster.v_mut()[offset] = color.cr;
                raster.a_mut()[offset] = alpha;
            }
            col += run.length;
        }
    }
}
