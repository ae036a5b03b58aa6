//! Registry configuration

/// Where inlets for newly discovered streams are opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Open synchronously inside `reconcile`
    #[default]
    Inline,
    /// Open on the tokio blocking pool; publish the stream once the open
    /// completes so slow opens never delay polling of tracked streams
    Background,
}
