/// ragvec error types
#[derive(Debug, thiserror::Error)]
pub enum RagVecError {
    /// Malformed or missing corpus/request field
    #[error("Invalid input: {0}")]
    InputValidation(String),

    /// Query vector length differs from the index dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A required artifact file or version is missing
    #[error("Artifact not found: {version}/{artifact}")]
    ArtifactNotFound { version: String, artifact: String },

    /// An artifact failed to parse or disagrees with its siblings
    #[error("Corrupt artifact {version}/{artifact}: {reason}")]
    CorruptArtifact {
        version: String,
        artifact: String,
        reason: String,
    },

    /// No index version has been loaded yet
    #[error("No index version loaded")]
    NotLoaded,

    /// Index build failed; nothing was published
    #[error("Build aborted: {0}")]
    BuildAborted(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RagVecError {
    /// Create input validation error
    pub fn input_validation<S: Into<String>>(msg: S) -> Self {
        Self::InputValidation(msg.into())
    }

    /// Create dimension mismatch error
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Create artifact not found error
    pub fn artifact_not_found<V: Into<String>, A: Into<String>>(version: V, artifact: A) -> Self {
        Self::ArtifactNotFound {
            version: version.into(),
            artifact: artifact.into(),
        }
    }

    /// Create corrupt artifact error
    pub fn corrupt_artifact<V, A, R>(version: V, artifact: A, reason: R) -> Self
    where
        V: Into<String>,
        A: Into<String>,
        R: Into<String>,
    {
        Self::CorruptArtifact {
            version: version.into(),
            artifact: artifact.into(),
            reason: reason.into(),
        }
    }

    /// Create build aborted error
    pub fn build_aborted<S: Into<String>>(msg: S) -> Self {
        Self::BuildAborted(msg.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Stable kind name, used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InputValidation(_) => "InputValidation",
            Self::DimensionMismatch { .. } => "DimensionMismatch",
            Self::ArtifactNotFound { .. } => "ArtifactNotFound",
            Self::CorruptArtifact { .. } => "CorruptArtifact",
            Self::NotLoaded => "NotLoaded",
            Self::BuildAborted(_) => "BuildAborted",
            Self::Config(_) => "Config",
            Self::Io(_) => "Io",
            Self::Json(_) => "Json",
            Self::Other(_) => "Internal",
        }
    }
}

// HTTP response conversion
impl RagVecError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InputValidation(_) => 400,
            Self::DimensionMismatch { .. } => 400,
            Self::ArtifactNotFound { .. } => 404,
            Self::CorruptArtifact { .. } => 500,
            Self::NotLoaded => 503,
            Self::BuildAborted(_) => 500,
            Self::Config(_) => 500,
            Self::Io(_) => 500,
            Self::Json(_) => 400,
            Self::Other(_) => 500,
        }
    }
}
