use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open usage store at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("usage store query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("could not determine a cache directory")]
    NoCacheDir,
}

/// A parse error in an application-info file, carrying the same four error
/// codes the reference loader distinguishes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppInfoError {
    #[error("second <hudappinfo> header")]
    DuplicateHeaders,
    #[error("two <desktopfile> definitions: first '{first}' then '{second}'")]
    DuplicateDesktopfile { first: String, second: String },
    #[error("element '{0}' seen before the <hudappinfo> header")]
    MissingHeader(String),
    #[error("<menus> with no <desktopfile> defined")]
    MissingDesktop,
    #[error("malformed XML: {0}")]
    Xml(String),
}
