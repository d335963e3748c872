//! Conversions between sRGB, CIE XYZ and CIE Lab, and the CIEDE2000 color difference.
//!
//! RGB channels are in the 0-255 range, XYZ is scaled to 0-100 and Lab uses the
//! D65 reference white. All functions are pure.

/// RGB color with channels in [0, 255]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// CIE XYZ color, D65, scaled so that Y of reference white is 100
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// CIE L*a*b* color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Rgb {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Round each channel to the nearest byte
    pub fn to_u8(&self) -> [u8; 3] {
        [self.r, self.g, self.b].map(|c| c.round().clamp(0.0, 255.0) as u8)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r as f64, g as f64, b as f64)
    }
}

impl From<image::Rgb<u8>> for Rgb {
    fn from(pixel: image::Rgb<u8>) -> Self {
        pixel.0.into()
    }
}

impl Lab {
    pub fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.l, self.a, self.b]
    }

    /// Reinterpret the first three coordinates of a point as L*, a*, b*
    pub fn from_slice(point: &[f64]) -> Self {
        Self::new(point[0], point[1], point[2])
    }
}

/// D65 reference white used for Lab
const REFERENCE_WHITE: Xyz = Xyz {
    x: 95.047,
    y: 100.0,
    z: 108.883,
};

const LAB_EPSILON: f64 = 0.008856;
const LAB_KAPPA: f64 = 7.787;
const LAB_OFFSET: f64 = 16.0 / 116.0;

fn gamma_decode(c: f64) -> f64 {
    if c > 0.04045 {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

fn gamma_encode(c: f64) -> f64 {
    if c > 0.0031308 {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    } else {
        c * 12.92
    }
}

pub fn rgb_to_xyz(rgb: &Rgb) -> Xyz {
    let r = gamma_decode(rgb.r / 255.0);
    let g = gamma_decode(rgb.g / 255.0);
    let b = gamma_decode(rgb.b / 255.0);

    let x = r * 0.4124 + g * 0.3576 + b * 0.1805;
    let y = r * 0.2126 + g * 0.7152 + b * 0.0722;
    let z = r * 0.0193 + g * 0.1192 + b * 0.9505;

    Xyz {
        x: x * 100.0,
        y: y * 100.0,
        z: z * 100.0,
    }
}

/// Convert XYZ back to RGB, clamping out-of-gamut channels
pub fn xyz_to_rgb(xyz: &Xyz) -> Rgb {
    let x = xyz.x / 100.0;
    let y = xyz.y / 100.0;
    let z = xyz.z / 100.0;

    let r = x * 3.2406 + y * -1.5372 + z * -0.4986;
    let g = x * -0.9689 + y * 1.8758 + z * 0.0415;
    let b = x * 0.0557 + y * -0.204 + z * 1.057;

    let [r, g, b] = [r, g, b].map(|c| gamma_encode(c).clamp(0.0, 1.0) * 255.0);
    Rgb { r, g, b }
}

pub fn xyz_to_lab(xyz: &Xyz) -> Lab {
    let f = |t: f64| {
        if t > LAB_EPSILON {
            t.cbrt()
        } else {
            LAB_KAPPA * t + LAB_OFFSET
        }
    };
    let x = f(xyz.x / REFERENCE_WHITE.x);
    let y = f(xyz.y / REFERENCE_WHITE.y);
    let z = f(xyz.z / REFERENCE_WHITE.z);

    Lab {
        l: 116.0 * y - 16.0,
        a: 500.0 * (x - y),
        b: 200.0 * (y - z),
    }
}

pub fn lab_to_xyz(lab: &Lab) -> Xyz {
    // The threshold is compared against the cubed value, not the linear one
    let f_inv = |t: f64| {
        let cubed = t.powi(3);
        if cubed > LAB_EPSILON {
            cubed
        } else {
            (t - LAB_OFFSET) / LAB_KAPPA
        }
    };
    let y = (lab.l + 16.0) / 116.0;
    let x = lab.a / 500.0 + y;
    let z = y - lab.b / 200.0;

    Xyz {
        x: f_inv(x) * REFERENCE_WHITE.x,
        y: f_inv(y) * REFERENCE_WHITE.y,
        z: f_inv(z) * REFERENCE_WHITE.z,
    }
}

pub fn rgb_to_lab(rgb: &Rgb) -> Lab {
    xyz_to_lab(&rgb_to_xyz(rgb))
}

pub fn lab_to_rgb(lab: &Lab) -> Rgb {
    xyz_to_rgb(&lab_to_xyz(lab))
}

/// Parametric weighting factors kL, kC and kH of CIEDE2000
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ciede2000Weights {
    pub lightness: f64,
    pub chroma: f64,
    pub hue: f64,
}

impl Default for Ciede2000Weights {
    fn default() -> Self {
        Self {
            lightness: 1.0,
            chroma: 1.0,
            hue: 1.0,
        }
    }
}

/// CIEDE2000 color difference with unit weighting factors
pub fn color_diff(lab1: &Lab, lab2: &Lab) -> f64 {
    color_diff_weighted(lab1, lab2, &Ciede2000Weights::default())
}

/// Hue angle in degrees within [0, 360)
fn hue_angle(b: f64, a_prime: f64) -> f64 {
    if b == 0.0 && a_prime == 0.0 {
        return 0.0;
    }
    let h = b.atan2(a_prime).to_degrees();
    if h >= 0.0 { h } else { h + 360.0 }
}

/// Signed hue difference wrapped into [-180, 180]
fn hue_difference(c1: f64, c2: f64, h1: f64, h2: f64) -> f64 {
    if c1 * c2 == 0.0 {
        return 0.0;
    }
    let dh = h2 - h1;
    if dh.abs() <= 180.0 {
        dh
    } else if dh > 180.0 {
        dh - 360.0
    } else {
        dh + 360.0
    }
}

fn mean_hue(c1: f64, c2: f64, h1: f64, h2: f64) -> f64 {
    if c1 * c2 == 0.0 {
        return h1 + h2;
    }
    if (h1 - h2).abs() <= 180.0 {
        (h1 + h2) / 2.0
    } else if h1 + h2 < 360.0 {
        (h1 + h2 + 360.0) / 2.0
    } else {
        (h1 + h2 - 360.0) / 2.0
    }
}

/// CIEDE2000 color difference with explicit weighting factors
///
/// Symmetric in its arguments and zero for identical colors. Angles are
/// handled in degrees and converted to radians only for trigonometry.
pub fn color_diff_weighted(lab1: &Lab, lab2: &Lab, weights: &Ciede2000Weights) -> f64 {
    const POW25_7: f64 = 6_103_515_625.0; // 25^7

    let Lab {
        l: l1,
        a: a1,
        b: b1,
    } = *lab1;
    let Lab {
        l: l2,
        a: a2,
        b: b2,
    } = *lab2;

    let c1 = a1.hypot(b1);
    let c2 = a2.hypot(b2);
    let mean_c7 = ((c1 + c2) / 2.0).powi(7);
    let g = 0.5 * (1.0 - (mean_c7 / (mean_c7 + POW25_7)).sqrt());

    let a1p = (1.0 + g) * a1;
    let a2p = (1.0 + g) * a2;
    let c1p = a1p.hypot(b1);
    let c2p = a2p.hypot(b2);
    let h1p = hue_angle(b1, a1p);
    let h2p = hue_angle(b2, a2p);

    let dlp = l2 - l1;
    let dcp = c2p - c1p;
    let dhp = hue_difference(c1, c2, h1p, h2p);
    let dhp_big = 2.0 * (c1p * c2p).sqrt() * (dhp.to_radians() / 2.0).sin();

    let mean_l = (l1 + l2) / 2.0;
    let mean_cp = (c1p + c2p) / 2.0;
    let mean_hp = mean_hue(c1, c2, h1p, h2p);

    let t = 1.0 - 0.17 * (mean_hp - 30.0).to_radians().cos()
        + 0.24 * (2.0 * mean_hp).to_radians().cos()
        + 0.32 * (3.0 * mean_hp + 6.0).to_radians().cos()
        - 0.2 * (4.0 * mean_hp - 63.0).to_radians().cos();
    let d_ro = 30.0 * (-((mean_hp - 275.0) / 25.0).powi(2)).exp();
    let mean_cp7 = mean_cp.powi(7);
    let rc = (mean_cp7 / (mean_cp7 + POW25_7)).sqrt();
    let sl = 1.0 + (0.015 * (mean_l - 50.0).powi(2)) / (20.0 + (mean_l - 50.0).powi(2)).sqrt();
    let sc = 1.0 + 0.045 * mean_cp;
    let sh = 1.0 + 0.015 * mean_cp * t;
    let rt = -2.0 * rc * (2.0 * d_ro).to_radians().sin();

    let l_term = dlp / (sl * weights.lightness);
    let c_term = dcp / (sc * weights.chroma);
    let h_term = dhp_big / (sh * weights.hue);

    (l_term.powi(2) + c_term.powi(2) + h_term.powi(2) + rt * c_term * h_term).sqrt()
}

/// Euclidean distance between two points of equal dimension
///
/// Applied to Lab coordinates this is the CIE76 color difference.
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
