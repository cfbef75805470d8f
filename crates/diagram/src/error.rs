use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("Invalid option {option}: {reason}")]
    Configuration { option: String, reason: String },
    #[error("Model inconsistency: {missing_type} not found among compiled classes")]
    ModelInconsistency { missing_type: String },
    #[error("Graphviz is not available: {reason}")]
    RendererUnavailable { reason: String },
    #[error("Failed to render diagram {diagram}: {reason}")]
    RendererExecution { diagram: String, reason: String },
    #[error("Rendering diagram {diagram} timed out after {timeout:?}")]
    RendererTimeout { diagram: String, timeout: Duration },
    #[error("Failed to find an insertion point in {} (tried: {})", page.display(), tried.join(", "))]
    AnchorNotFound { page: PathBuf, tried: Vec<String> },
    #[error("Unknown type: {name}")]
    UnknownType { name: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiagramError {
    pub fn configuration(option: &str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            option: option.to_string(),
            reason: reason.into(),
        }
    }

    /// 是否应中断整个运行
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::ModelInconsistency { .. } | Self::RendererUnavailable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DiagramError>;
