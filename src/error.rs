use thiserror::Error;

/// Errors that abort a scan or fill operation outright.
///
/// Per-placeholder content problems (a spreadsheet that will not parse, an
/// image that will not decode) are deliberately absent here: those degrade
/// to an inline marker at the placeholder's location and the operation still
/// succeeds. Only template-level problems surface as `FillError`.
#[derive(Debug, Error)]
pub enum FillError {
    /// The template extension is neither `.docx` nor `.pptx`.
    #[error("unsupported template file type: .{0}")]
    UnsupportedFormat(String),

    /// The template is not a readable OOXML package (bad archive, missing
    /// required part).
    #[error("invalid document package: {0}")]
    Package(String),

    /// A document part exists but its XML cannot be parsed or rewritten.
    #[error("malformed document xml: {0}")]
    Xml(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FillError>;
