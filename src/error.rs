/// Convenience alias used across the crate.
pub type StagecraftResult<T> = Result<T, StagecraftError>;

#[derive(thiserror::Error, Debug)]
/// Error taxonomy for compositing and camera direction.
pub enum StagecraftError {
    /// Scene/timeline invariant broken before any work started.
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed motion clip metadata (zero-length cycle, non-finite
    /// displacement). Fatal for the affected character's track.
    #[error("invalid clip data: {0}")]
    InvalidClipData(String),

    /// Two cues for the same character overlap in time. Raised before any
    /// host mutation.
    #[error("overlapping cue: {0}")]
    OverlappingCue(String),

    /// A cue or camera references a character with no rig. Fatal during
    /// validation; downgraded to a warning inside the director.
    #[error("missing character reference: {0}")]
    MissingCharacter(String),

    /// An animation host call failed. Aborts the render; a partially
    /// populated host timeline is not a meaningful output.
    #[error("host call failed: {0}")]
    Host(String),

    /// Scene timeline document could not be parsed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StagecraftError {
    /// Build a [`StagecraftError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StagecraftError::InvalidClipData`].
    pub fn invalid_clip(msg: impl Into<String>) -> Self {
        Self::InvalidClipData(msg.into())
    }

    /// Build a [`StagecraftError::OverlappingCue`].
    pub fn overlapping_cue(msg: impl Into<String>) -> Self {
        Self::OverlappingCue(msg.into())
    }

    /// Build a [`StagecraftError::MissingCharacter`].
    pub fn missing_character(msg: impl Into<String>) -> Self {
        Self::MissingCharacter(msg.into())
    }

    /// Build a [`StagecraftError::Host`].
    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    /// Build a [`StagecraftError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}
