/// Default upper bound for a single frame, in octets
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 64 * 1024;

/// Knobs for [`Parser`](crate::Parser).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParserOptions {
    /// Frames announcing more octets than this are rejected before anything
    /// is read from them. Unframed input longer than this is rejected.
    pub max_frame_length: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
        }
    }
}

impl ParserOptions {
    pub fn with_max_frame_length(mut self, max_frame_length: usize) -> Self {
        self.max_frame_length = max_frame_length;
        self
    }
}
