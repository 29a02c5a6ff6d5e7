use dvbsub::{Decoder, DecoderConfig};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `20 20` (data id, stream id) then a page composition segment for
/// page 1 in `acquisition` state with no region definitions, then the
/// end marker. See SPEC_FULL.md 8, scenario 1.
#[test]
fn empty_page_yields_a_subpicture_with_no_regions() {
    init_logger();
    let buf: Vec<u8> = vec![
        0x20, 0x20, // data id, stream id
        0x0F, 0x10, 0x00, 0x01, 0x00, 0x02, // sync, type=page, page_id=1, length=2
        0x00, 0x04, // timeout=0, version=0/state=acquisition/reserved=0
        0xFF, // end marker
    ];

    let mut decoder = Decoder::new(DecoderConfig {
        primary_page_id: 1,
        ancillary_page_id: 0,
    });
    let subpicture = decoder.decode_unit(&buf, 1_000).unwrap().unwrap();
    assert_eq!(subpicture.regions.len(), 0);
    assert_eq!(subpicture.start_pts, subpicture.stop_pts);
}

/// A page naming one 1x1 region, a region composition installing one
/// 1x1 basic-bitmap object, and an object data segment carrying a
/// single 4-bpp pixel of color index 5. See SPEC_FULL.md 8, scenario 2.
fn one_pixel_unit(color: u8) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.push(0x20);
    buf.push(0x20);

    // Page composition: page 1, acquisition, one region def (id 1 at 0,0).
    buf.extend_from_slice(&[0x0F, 0x10, 0x00, 0x01, 0x00, 0x08]);
    buf.extend_from_slice(&[0x00, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);

    // Region composition: region 1, 1x1, clut 0, one basic-bitmap
    // object def (id 1 at 0,0).
    buf.extend_from_slice(&[0x0F, 0x11, 0x00, 0x01, 0x00, 0x10]);
    buf.extend_from_slice(&[
        0x01, // region_id
        0x00, // version/fill/reserved
        0x00, 0x01, // width = 1
        0x00, 0x01, // height = 1
        0x10, // level/depth/reserved
        0x00, // clut_id = 0
        0x00, // default_8bpp_code
        0x00, // default_4bpp/default_2bpp/reserved
        0x00, 0x01, // object_id = 1
        0x00, 0x00, // type=0/provider=0/x=0
        0x00, 0x00, // reserved/y=0
    ]);

    // Object data: object 1, pixels, top field "one pixel, EOL", empty
    // bottom field. The pixel code occupies the high nibble of the
    // byte after the data type; the low nibble (0) begins the
    // end-of-block sequence completed by the following 0x00.
    buf.extend_from_slice(&[0x0F, 0x13, 0x00, 0x01, 0x00, 0x0B]);
    buf.extend_from_slice(&[
        0x00, 0x01, // object_id = 1
        0x00, // version/coding=pixels/non_modifying/reserved
        0x00, 0x04, // top_field_length = 4
        0x00, 0x00, // bottom_field_length = 0
        0x11, color << 4, 0x00, 0xF0, // top field: 4bpp data type, one pixel, EOB, EOL
    ]);

    buf.push(0xFF);
    buf
}

#[test]
fn one_pixel_4bpp_object_paints_default_palette_color() {
    init_logger();
    let buf = one_pixel_unit(5);
    let mut decoder = Decoder::new(DecoderConfig {
        primary_page_id: 1,
        ancillary_page_id: 0,
    });
    let mut subpicture = decoder.decode_unit(&buf, 1_000).unwrap().unwrap();
    assert_eq!(subpicture.regions.len(), 1);

    let raster = &mut subpicture.regions[0].raster;
    // Default 4-bpp palette index 5 = 0b0101: R and B at full scale, G
    // at zero (see clut.rs default_4bpp_index5_is_full_saturation_rb).
    assert_eq!(raster.y_mut()[0], 105);
    assert_eq!(raster.v_mut()[0], 86); // Cr
    assert_eq!(raster.u_mut()[0], 109); // Cb
    assert_eq!(raster.a_mut()[0], 255);
}

#[test]
fn resubmitting_the_same_unit_is_idempotent() {
    init_logger();
    let buf = one_pixel_unit(5);
    let mut decoder = Decoder::new(DecoderConfig {
        primary_page_id: 1,
        ancillary_page_id: 0,
    });

    let mut first = decoder.decode_unit(&buf, 1_000).unwrap().unwrap();
    let mut second = decoder.decode_unit(&buf, 2_000).unwrap().unwrap();

    let first_raster = &mut first.regions[0].raster;
    let second_raster = &mut second.regions[0].raster;
    assert_eq!(first_raster.y_mut()[0], second_raster.y_mut()[0]);
    assert_eq!(first_raster.v_mut()[0], second_raster.v_mut()[0]);
    assert_eq!(first_raster.u_mut()[0], second_raster.u_mut()[0]);
}

#[test]
fn clut_override_replaces_default_palette_entry() {
    init_logger();
    let mut buf = Vec::new();
    buf.push(0x20);
    buf.push(0x20);

    buf.extend_from_slice(&[0x0F, 0x10, 0x00, 0x01, 0x00, 0x08]);
    buf.extend_from_slice(&[0x00, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);

    buf.extend_from_slice(&[0x0F, 0x11, 0x00, 0x01, 0x00, 0x10]);
    buf.extend_from_slice(&[
        0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x10, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00,
        0x00,
    ]);

    // CLUT definition: clut 0, version 1, entry 1 in the 4-bpp table
    // (type bitmask 0x02) set to full-range (Y=0, Cr=128, Cb=128, T=0).
    buf.extend_from_slice(&[0x0F, 0x12, 0x00, 0x01, 0x00, 0x08]);
    buf.extend_from_slice(&[
        0x00, // clut_id = 0
        0x10, // version=1/reserved
        0x01, // entry_id = 1
        0x41, // type=0b010 (4bpp)/reserved/full_range=1
        0x00, 0x80, 0x80, 0x00, // Y, Cr, Cb, T
    ]);

    buf.extend_from_slice(&[0x0F, 0x13, 0x00, 0x01, 0x00, 0x0B]);
    buf.extend_from_slice(&[
        0x00, 0x01, 0x00, 0x00, 0x04, 0x00, 0x00, 0x11, 0x10, 0x00, 0xF0,
    ]);

    buf.push(0xFF);

    let mut decoder = Decoder::new(DecoderConfig {
        primary_page_id: 1,
        ancillary_page_id: 0,
    });
    let mut subpicture = decoder.decode_unit(&buf, 1_000).unwrap().unwrap();
    let raster = &mut subpicture.regions[0].raster;
    assert_eq!(raster.y_mut()[0], 0);
    assert_eq!(raster.v_mut()[0], 128);
    assert_eq!(raster.u_mut()[0], 128);
    assert_eq!(raster.a_mut()[0], 255);
}

/// A 4x2 region with one object whose top field paints a full row of
/// color 1 and whose bottom field paints a full row of color 2; the
/// renderer must interlace them into output rows 0 and 1 respectively.
/// See SPEC_FULL.md 8, scenario 6.
#[test]
fn top_and_bottom_fields_interlace_into_even_and_odd_rows() {
    init_logger();
    let mut buf = Vec::new();
    buf.push(0x20);
    buf.push(0x20);

    buf.extend_from_slice(&[0x0F, 0x10, 0x00, 0x01, 0x00, 0x08]);
    buf.extend_from_slice(&[0x00, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);

    buf.extend_from_slice(&[0x0F, 0x11, 0x00, 0x01, 0x00, 0x10]);
    buf.extend_from_slice(&[
        0x01, // region_id
        0x00, // version/fill/reserved
        0x00, 0x04, // width = 4
        0x00, 0x02, // height = 2
        0x10, // level/depth/reserved
        0x00, // clut_id = 0
        0x00, // default_8bpp_code
        0x00, // default_4bpp/default_2bpp/reserved
        0x00, 0x01, // object_id = 1
        0x00, 0x00, // type=0/provider=0/x=0
        0x00, 0x00, // reserved/y=0
    ]);

    // Object data: top field four pixels of color 1 then end-of-block
    // then end-of-line; bottom field four pixels of color 2 likewise.
    buf.extend_from_slice(&[0x0F, 0x13, 0x00, 0x01, 0x00, 0x11]);
    buf.extend_from_slice(&[
        0x00, 0x01, // object_id = 1
        0x00, // version/coding=pixels/non_modifying/reserved
        0x00, 0x05, // top_field_length = 5
        0x00, 0x05, // bottom_field_length = 5
        0x11, 0x11, 0x11, 0x00, 0xF0, // top field: four pixels color 1, EOL
        0x11, 0x22, 0x22, 0x00, 0xF0, // bottom field: four pixels color 2, EOL
    ]);

    buf.push(0xFF);

    let mut decoder = Decoder::new(DecoderConfig {
        primary_page_id: 1,
        ancillary_page_id: 0,
    });
    let mut subpicture = decoder.decode_unit(&buf, 1_000).unwrap().unwrap();
    let raster = &mut subpicture.regions[0].raster;
    let pitch = raster.pitch();

    // Row 0 (top field): default 4-bpp index 1 is full-scale red.
    for x in 0..4 {
        assert_eq!(raster.y_mut()[x], 76); // Y of (255,0,0)
    }
    // Row 1 (bottom field): default 4-bpp index 2 is full-scale green.
    for x in 0..4 {
        assert_eq!(raster.y_mut()[pitch + x], 149); // Y of (0,255,0)
    }
}
