use plotters::style::RGBColor;

const COOL: (f64, f64, f64) = (59.0, 76.0, 192.0);
const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

/// Cell colour for undefined correlations
pub const MISSING: RGBColor = RGBColor(245, 245, 245);

/// Diverging blue-grey-red colour for a value in [-1, 1], centred on 0
pub fn diverging(value: f64) -> RGBColor {
    let v = value.clamp(-1.0, 1.0);
    let (from, to, t) = if v < 0.0 {
        (NEUTRAL, COOL, -v)
    } else {
        (NEUTRAL, WARM, v)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}
