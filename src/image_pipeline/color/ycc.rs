//! Rec. 709 luma/chroma conversion.

pub const KR: f32 = 0.2126;
pub const KG: f32 = 0.7152;
pub const KB: f32 = 0.0722;

const CB_SCALE: f32 = 2.0 * (1.0 - KB);
const CR_SCALE: f32 = 2.0 * (1.0 - KR);

/// `[Y, Cb, Cr]` from linear-range `[R, G, B]`.
#[inline]
pub fn rgb_to_ycbcr([r, g, b]: [f32; 3]) -> [f32; 3] {
    let y = KR * r + KG * g + KB * b;
    [y, (b - y) / CB_SCALE, (r - y) / CR_SCALE]
}

#[inline]
pub fn ycbcr_to_rgb([y, cb, cr]: [f32; 3]) -> [f32; 3] {
    let r = y + CR_SCALE * cr;
    let b = y + CB_SCALE * cb;
    let g = (y - KR * r - KB * b) / KG;
    [r, g, b]
}

/// Scales chroma by `chroma` and rotates it by the angle whose cosine and
/// sine are given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChromaAdjust {
    chroma: f32,
    cos: f32,
    sin: f32,
}

impl ChromaAdjust {
    pub fn new(chroma: f32, hue_degrees: f32) -> Self {
        let (sin, cos) = hue_degrees.to_radians().sin_cos();
        Self { chroma, cos, sin }
    }

    pub fn is_identity(&self) -> bool {
        self.chroma == 1.0 && self.sin == 0.0
    }

    #[inline]
    pub fn apply(&self, [y, cb, cr]: [f32; 3]) -> [f32; 3] {
        let (cb, cr) = (cb * self.chroma, cr * self.chroma);
        [y, cb * self.cos - cr * self.sin, cb * self.sin + cr * self.cos]
    }
}
