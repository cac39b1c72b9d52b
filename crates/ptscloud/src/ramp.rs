//! Blue → cyan → green → yellow → red color ramp used to tell scans apart.

/// Stand-in for `vmax - vmin` when the range collapses to a point.
pub const RAMP_EPSILON: f64 = f64::EPSILON;

/// Ramp output. Channels are nominally in `[0, 1]` but are not clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb { r: 1.0, g: 1.0, b: 1.0 };

    /// Scale to 8-bit: multiply by 255, clamp, truncate.
    #[inline]
    pub fn to_rgb8(self) -> [u8; 3] {
        [to_u8(self.r), to_u8(self.g), to_u8(self.b)]
    }
}

#[inline(always)]
fn to_u8(c: f64) -> u8 {
    (c * 255.0).clamp(0.0, 255.0) as u8
}

/// Map `v` within `[vmin, vmax]` onto the four-band ramp.
///
/// The result starts white and each band only overwrites the channels it
/// names; the untouched channel keeps its initial 1.0. Band 2 therefore has
/// green pinned at 1 and band 4 has red pinned at 1.
pub fn ramp(v: f64, vmin: f64, vmax: f64) -> Rgb {
    let mut c = Rgb::WHITE;

    let v = v.max(vmin).min(vmax);
    let mut dv = vmax - vmin;
    if !(dv > 0.0) {
        dv = RAMP_EPSILON;
    }

    if v < vmin + 0.25 * dv {
        c.r = 0.0;
        c.g = 4.0 * (v - vmin) / dv;
    } else if v < vmin + 0.5 * dv {
        c.r = 0.0;
        c.b = 1.0 + 4.0 * (vmin + 0.25 * dv - v) / dv;
    } else if v < vmin + 0.75 * dv {
        c.r = 4.0 * (v - vmin - 0.5 * dv) / dv;
        c.b = 0.0;
    } else {
        c.g = 1.0 + 4.0 * (vmin + 0.75 * dv - v) / dv;
        c.b = 0.0;
    }

    c
}

/// 8-bit color for the scan at `rank` among `total` selected scans.
#[inline]
pub fn rank_color(rank: usize, total: usize) -> [u8; 3] {
    let top = total.saturating_sub(1) as f64;
    ramp(rank as f64, 0.0, top).to_rgb8()
}
