pub type FramegifResult<T> = Result<T, FramegifError>;

#[derive(thiserror::Error, Debug)]
pub enum FramegifError {
    /// Invalid settings or inputs detected before any frame is decoded. Fatal.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A transform could not be applied to one frame (bad crop bounds, degenerate scale).
    #[error("geometry error: {0}")]
    Geometry(String),

    /// A source could not be read or decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A transformed frame could not be reduced to an indexed palette.
    #[error("quantization error: {0}")]
    Quantization(String),

    /// The animation could not be assembled, serialized or written. Fatal.
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FramegifError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn quantization(msg: impl Into<String>) -> Self {
        Self::Quantization(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Errors scoped to a single frame; the pipeline drops that frame and keeps going.
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            Self::Geometry(_) | Self::Decode(_) | Self::Quantization(_)
        )
    }
}
