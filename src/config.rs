use {
    clap::ValueEnum,
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
    },
};

/// A DDC/CI backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum BackendKind {
    /// NVIDIA NVAPI I2C writes
    Nvapi,
    /// AMD ADL DDC block access
    Adl,
    /// Windows monitor configuration API (standard VCP sub-address only)
    Monitor,
    /// The external `ddcutil` tool
    Ddcutil,
}

impl BackendKind {
    /// Short backend name, as used in diagnostics.
    pub const fn name(&self) -> &'static str {
        match self {
            BackendKind::Nvapi => "NVIDIA",
            BackendKind::Adl => "AMD",
            BackendKind::Monitor => "monitor API",
            BackendKind::Ddcutil => "ddcutil",
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime settings for a single invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Only probe this backend
    pub backend: Option<BackendKind>,
    /// `ddcutil` executable
    pub ddcutil: PathBuf,
    /// `xrandr` executable, used for primary display detection
    pub xrandr: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: None,
            ddcutil: "ddcutil".into(),
            xrandr: "xrandr".into(),
        }
    }
}
