use crate::composite::anchor::Placement;
use crate::foundation::math::mul_div255_u8;
use crate::media::source::RgbaFrame;

pub type StraightRgba8 = [u8; 4];

/// Source-over for straight-alpha pixels.
///
/// Over an opaque destination this is exactly `dst * (1 - a) + src * a`. Translucent destinations
/// go through premultiplied space and back.
pub fn over(dst: StraightRgba8, src: StraightRgba8) -> StraightRgba8 {
    let sa = u16::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 || dst[3] == 0 {
        return src;
    }
    let inv = 255u16 - sa;

    if dst[3] == 255 {
        let mut out = [0u8, 0, 0, 255];
        for i in 0..3 {
            out[i] = add_sat_u8(
                mul_div255(u16::from(src[i]), sa),
                mul_div255(u16::from(dst[i]), inv),
            );
        }
        return out;
    }

    let da = u16::from(mul_div255(u16::from(dst[3]), inv));
    let out_a = sa + da;
    if out_a == 0 {
        return [0, 0, 0, 0];
    }
    let mut out = [0u8; 4];
    out[3] = out_a.min(255) as u8;
    for i in 0..3 {
        let premul =
            u32::from(mul_div255(u16::from(src[i]), sa)) + u32::from(mul_div255(u16::from(dst[i]), da));
        let straight = (premul * 255 + u32::from(out_a) / 2) / u32::from(out_a);
        out[i] = straight.min(255) as u8;
    }
    out
}

/// Blend `overlay` onto `dst` inside `placement`; pixels outside are left untouched.
///
/// `placement` must come from resolving against `dst`'s and `overlay`'s dimensions.
pub fn blend_region(dst: &mut RgbaFrame, overlay: &RgbaFrame, placement: Placement) {
    if placement.width == 0 || placement.height == 0 {
        return;
    }
    let dst_stride = dst.width() as usize * 4;
    let src_stride = overlay.width() as usize * 4;
    let row_len = placement.width as usize * 4;
    let x_off = placement.x as usize * 4;
    let src = overlay.as_bytes();
    let dst = dst.as_bytes_mut();

    for row in 0..placement.height as usize {
        let d0 = (placement.y as usize + row) * dst_stride + x_off;
        let s0 = row * src_stride;
        let d_row = &mut dst[d0..d0 + row_len];
        let s_row = &src[s0..s0 + row_len];
        for (d, s) in d_row.chunks_exact_mut(4).zip(s_row.chunks_exact(4)) {
            let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
            d.copy_from_slice(&out);
        }
    }
}

/// Premultiply an RGBA8 buffer in place.
pub fn premultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = mul_div255(u16::from(*c), a);
        }
    }
}

/// Undo [`premultiply_in_place`].
pub fn unpremultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 255 {
            continue;
        }
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    mul_div255_u8(x, y)
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/composite/blend.rs"]
mod tests;
