//! A tiny TrueType font assembled in memory for tests.
//!
//! Metrics (font units, 1000 per em, ascender 800, descender -200):
//!
//! | glyph | char  | advance | outline                 |
//! |-------|-------|---------|-------------------------|
//! | 0     | notdef| 500     | none                    |
//! | 1     | `H`   | 600     | rect (100,0)-(500,700)  |
//! | 2     | `i`   | 300     | rect (100,0)-(200,500)  |
//! | 3     | space | 250     | none                    |

pub(crate) const ADVANCE_H: f64 = 600.0;
pub(crate) const ADVANCE_I: f64 = 300.0;
pub(crate) const ADVANCE_SPACE: f64 = 250.0;

#[derive(Default)]
struct Buf(Vec<u8>);

impl Buf {
    fn u16(&mut self, v: u16) -> &mut Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn i16(&mut self, v: i16) -> &mut Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn u32(&mut self, v: u32) -> &mut Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn i64(&mut self, v: i64) -> &mut Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }
}

/// One closed rectangular contour, clockwise, all points on-curve.
fn rect_glyph(x0: i16, y0: i16, x1: i16, y1: i16) -> Vec<u8> {
    let mut b = Buf::default();
    b.i16(1).i16(x0).i16(y0).i16(x1).i16(y1);
    b.u16(3); // end point of contour 0
    b.u16(0); // no instructions
    b.0.extend_from_slice(&[0x01; 4]);
    // Coordinates are deltas; with flags 0x01 they are full i16 values.
    b.i16(x0).i16(0).i16(x1 - x0).i16(0);
    b.i16(y0).i16(y1 - y0).i16(0).i16(y0 - y1);
    b.0
}

fn head() -> Vec<u8> {
    let mut b = Buf::default();
    b.u32(0x0001_0000).u32(0x0001_0000).u32(0).u32(0x5F0F_3CF5);
    b.u16(0x000B).u16(1000);
    b.i64(0).i64(0);
    b.i16(0).i16(-200).i16(500).i16(700);
    b.u16(0).u16(8).i16(2);
    b.i16(1); // long loca offsets
    b.i16(0);
    b.0
}

fn hhea() -> Vec<u8> {
    let mut b = Buf::default();
    b.u32(0x0001_0000);
    b.i16(800).i16(-200).i16(0);
    b.u16(600).i16(0).i16(0).i16(500);
    b.i16(1).i16(0).i16(0);
    b.i16(0).i16(0).i16(0).i16(0);
    b.i16(0);
    b.u16(4);
    b.0
}

fn maxp() -> Vec<u8> {
    let mut b = Buf::default();
    b.u32(0x0000_5000).u16(4);
    b.0
}

fn hmtx() -> Vec<u8> {
    let mut b = Buf::default();
    b.u16(500).i16(0);
    b.u16(ADVANCE_H as u16).i16(100);
    b.u16(ADVANCE_I as u16).i16(100);
    b.u16(ADVANCE_SPACE as u16).i16(0);
    b.0
}

fn cmap() -> Vec<u8> {
    let groups: [(u32, u32); 3] = [(' ' as u32, 3), ('H' as u32, 1), ('i' as u32, 2)];
    let mut b = Buf::default();
    b.u16(0).u16(1);
    b.u16(3).u16(10).u32(12);
    b.u16(12).u16(0);
    b.u32(16 + 12 * groups.len() as u32).u32(0).u32(groups.len() as u32);
    for (code, glyph) in groups {
        b.u32(code).u32(code).u32(glyph);
    }
    b.0
}

/// Build the font file.
pub(crate) fn build() -> Vec<u8> {
    let h = rect_glyph(100, 0, 500, 700);
    let i = rect_glyph(100, 0, 200, 500);
    let glyf = [h.as_slice(), i.as_slice()].concat();

    let mut loca = Buf::default();
    for offset in [0, 0, h.len(), h.len() + i.len(), h.len() + i.len()] {
        loca.u32(offset as u32);
    }

    // Tags must be sorted; lookups binary-search the table directory.
    let tables: [(&[u8; 4], Vec<u8>); 7] = [
        (b"cmap", cmap()),
        (b"glyf", glyf),
        (b"head", head()),
        (b"hhea", hhea()),
        (b"hmtx", hmtx()),
        (b"loca", loca.0),
        (b"maxp", maxp()),
    ];

    let mut out = Buf::default();
    out.u32(0x0001_0000).u16(tables.len() as u16);
    out.u16(64).u16(2).u16(tables.len() as u16 * 16 - 64);

    let mut offset = 12 + 16 * tables.len();
    let mut data = Vec::new();
    for (tag, table) in &tables {
        out.0.extend_from_slice(*tag);
        out.u32(0).u32(offset as u32).u32(table.len() as u32);

        data.extend_from_slice(table);
        let padded = table.len().next_multiple_of(4);
        data.resize(data.len() + padded - table.len(), 0);
        offset += padded;
    }

    out.0.extend_from_slice(&data);
    out.0
}
