//! Color pipeline configuration types

/// Source of the gamma exponents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GammaMode {
    /// One exponent `1/gamma` for all three channels, ignoring the setup.
    Fixed(f32),
    /// Green uses `1/fGamma`, red `1/(fGamma + fGammaR)`, blue `1/(fGamma + fGammaB)`.
    FromSetup,
}

impl Default for GammaMode {
    fn default() -> Self {
        GammaMode::Fixed(2.2)
    }
}

/// How the color-correction half of the calibration matrix is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixNormalization {
    /// Divide every row by its sum.
    #[default]
    RowSum,
    /// Keep the off-diagonal terms and set each diagonal term to one minus them.
    DiagonalResidual,
}

/// Configuration for RAW to RGB color processing
#[derive(Debug, Clone)]
pub struct ColorConfig {
    /// Subtracted from every raw sample before white balance. The setup's
    /// `fFlare` is not consulted; callers that want it pass it here.
    pub flare: f32,
    pub gamma: GammaMode,
    pub normalization: MatrixNormalization,
    /// Apply the setup's user matrix when the setup also enables it
    pub apply_user_matrix: bool,
    /// Apply the setup's crop and resample settings after color processing
    pub post_process: bool,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            flare: 0.0,
            gamma: GammaMode::default(),
            normalization: MatrixNormalization::default(),
            apply_user_matrix: true,
            post_process: true,
        }
    }
}

impl ColorConfig {
    pub fn builder() -> ColorConfigBuilder {
        ColorConfigBuilder::default()
    }
}

/// Builder for ColorConfig
#[derive(Default)]
pub struct ColorConfigBuilder {
    flare: Option<f32>,
    gamma: Option<GammaMode>,
    normalization: Option<MatrixNormalization>,
    apply_user_matrix: Option<bool>,
    post_process: Option<bool>,
}

impl ColorConfigBuilder {
    pub fn flare(mut self, flare: f32) -> Self {
        self.flare = Some(flare);
        self
    }

    pub fn gamma(mut self, gamma: GammaMode) -> Self {
        self.gamma = Some(gamma);
        self
    }

    pub fn normalization(mut self, normalization: MatrixNormalization) -> Self {
        self.normalization = Some(normalization);
        self
    }

    pub fn apply_user_matrix(mut self, enable: bool) -> Self {
        self.apply_user_matrix = Some(enable);
        self
    }

    pub fn post_process(mut self, enable: bool) -> Self {
        self.post_process = Some(enable);
        self
    }

    pub fn build(self) -> ColorConfig {
        let default = ColorConfig::default();
        ColorConfig {
            flare: self.flare.unwrap_or(default.flare),
            gamma: self.gamma.unwrap_or(default.gamma),
            normalization: self.normalization.unwrap_or(default.normalization),
            apply_user_matrix: self.apply_user_matrix.unwrap_or(default.apply_user_matrix),
            post_process: self.post_process.unwrap_or(default.post_process),
        }
    }
}
