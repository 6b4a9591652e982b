//! Tone curve metadata: a label plus up to 32 (x, y) control points.

use crate::image_pipeline::common::error::{CineError, Result};

pub const MAX_TONE_POINTS: usize = 32;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToneCurve {
    pub label: String,
    pub points: Vec<(f32, f32)>,
}

impl ToneCurve {
    pub fn new(label: impl Into<String>, points: Vec<(f32, f32)>) -> Result<Self> {
        if points.len() > MAX_TONE_POINTS {
            return Err(CineError::Format(format!(
                "tone curve has {} points, at most {MAX_TONE_POINTS} allowed",
                points.len()
            )));
        }
        Ok(Self { label: label.into(), points })
    }

    /// Parses `"[LABEL] x1 y1 x2 y2 ..."`.
    ///
    /// An odd token count means the first token is the label.
    pub fn parse(text: &str) -> Result<Self> {
        let mut tokens: Vec<&str> = text.split_whitespace().collect();
        let label = if tokens.len() % 2 == 1 { tokens.remove(0).to_string() } else { String::new() };

        let values = tokens
            .iter()
            .map(|t| {
                t.parse::<f32>()
                    .map_err(|_| CineError::Format(format!("invalid tone point value '{t}'")))
            })
            .collect::<Result<Vec<f32>>>()?;

        let points = values.chunks_exact(2).map(|p| (p[0], p[1])).collect();
        Self::new(label, points)
    }

    /// A curve with fewer than two points cannot be interpolated and is treated as identity.
    pub fn is_identity(&self) -> bool {
        self.points.len() < 2
    }

    /// Piecewise-linear evaluation, clamped to the first and last point outside their range.
    pub fn eval(&self, x: f32) -> f32 {
        if self.is_identity() {
            return x;
        }
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }
        for pair in self.points.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if x <= x1 {
                if x1 <= x0 {
                    return y1;
                }
                return y0 + (x - x0) * (y1 - y0) / (x1 - x0);
            }
        }
        last.1
    }

    /// Points sorted by x, which `eval` relies on.
    pub fn sorted(mut self) -> Self {
        self.points.sort_by(|a, b| a.0.total_cmp(&b.0));
        self
    }
}

impl std::fmt::Display for ToneCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label)?;
        for (x, y) in &self.points {
            write!(f, " {x} {y}")?;
        }
        Ok(())
    }
}
