use {std::io, thiserror::Error};

/// An error that can occur while writing a VCP value.
#[derive(Debug, Error)]
pub enum Error {
    /// Every backend probe failed
    #[error("no supported DDC/CI backend found (NVIDIA, AMD, monitor API or ddcutil required)")]
    NoBackend,

    /// A backend could not be initialized
    #[error("{backend} backend unavailable: {reason}")]
    Unavailable {
        /// Backend name
        backend: &'static str,
        /// Why the probe failed
        reason: String,
    },

    /// The resolved display index is beyond what the backend enumerated
    #[error("display index {index} not found (only {count} displays detected)")]
    DisplayNotFound {
        /// Requested 0-based index
        index: usize,
        /// Number of displays the backend enumerated
        count: usize,
    },

    /// A vendor API call returned a non-success status
    #[error("{call} failed with status {status}")]
    Status {
        /// Name of the failing entry point
        call: &'static str,
        /// Raw status code
        status: i32,
    },

    /// An external tool exited unsuccessfully
    #[error("{program} command failed with status {status}")]
    ToolStatus {
        /// Program that was run
        program: String,
        /// Exit status, or -1 when terminated by a signal
        status: i32,
    },

    /// An external tool could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program that was run
        program: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The backend can only address the standard VCP sub-address
    #[error("sub-address {sub_address:#04x} is not supported by the {backend} backend")]
    UnsupportedSubAddress {
        /// Requested sub-address
        sub_address: u8,
        /// Backend name
        backend: &'static str,
    },

    /// Windows API error
    #[cfg(windows)]
    #[error(transparent)]
    Win32(#[from] windows::core::Error),
}

impl Error {
    pub(crate) fn unavailable<R: ToString>(backend: &'static str, reason: R) -> Self {
        Error::Unavailable {
            backend,
            reason: reason.to_string(),
        }
    }

    /// Map a vendor status code to `Ok` when it matches `ok`.
    #[cfg(windows)]
    pub(crate) fn check(call: &'static str, status: i32, ok: i32) -> Result<(), Self> {
        match status {
            s if s == ok => Ok(()),
            status => Err(Error::Status { call, status }),
        }
    }
}
