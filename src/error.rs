use thiserror::Error;

/// Errors raised by the frequency, voicing, catalog and voice engines.
#[derive(Debug, Error)]
pub enum ChordError {
    /// The string does not match `<A-G><#|b>?<octave>`.
    #[error("Invalid note format: {0}")]
    InvalidNoteFormat(String),

    /// The pitch class could not be normalized. The pitch-class set is closed,
    /// so this indicates an internal inconsistency rather than bad input.
    #[error("Unknown pitch class: {0}")]
    UnknownPitchClass(String),

    /// A chord symbol such as `Am3` or `F#m` could not be parsed.
    #[error("Invalid chord symbol: {0}")]
    InvalidChordSymbol(String),

    /// A key wheel entry refers to a chord identity with no note list.
    #[error("Unknown chord identity: {0}")]
    UnknownChordIdentity(String),

    #[error("Catalog data error: {0}")]
    Catalog(#[from] serde_json::Error),

    #[error("Audio device error: {0}")]
    Device(#[from] DeviceError),
}

/// Errors reported by an output device backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    /// The host refused to create an output device (e.g. no audio permission).
    #[error("output device unavailable: {0}")]
    Unavailable(String),

    /// The device was closed and cannot be resumed.
    #[error("output device is closed")]
    Closed,

    #[error("backend failure: {0}")]
    Backend(String),
}
