//! DDC/CI write backends.
//!
//! Exactly one backend is used per invocation: [`select`] probes candidates in
//! order and keeps the first one that initializes.

use {
    crate::{BackendKind, Config, Error, PrimaryDisplay, VcpWrite},
    log::{debug, info},
};

pub mod adl;
pub mod ddcutil;
#[cfg(windows)]
pub mod monitor;
#[cfg(windows)]
pub mod nvapi;

/// A backend capable of delivering a VCP write to a display.
pub trait Transport {
    /// Backend name, as used in diagnostics.
    fn name(&self) -> &'static str;

    /// Find the primary display in this backend's own enumeration.
    ///
    /// By default the operating system's ordering is assumed to match.
    fn locate_primary(&mut self, primary: &PrimaryDisplay) -> Option<usize> {
        primary.index
    }

    /// Write a single value to the display at `display` (0-based).
    fn write(&mut self, display: usize, vcp: &VcpWrite) -> Result<(), Error>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn locate_primary(&mut self, primary: &PrimaryDisplay) -> Option<usize> {
        (**self).locate_primary(primary)
    }

    fn write(&mut self, display: usize, vcp: &VcpWrite) -> Result<(), Error> {
        (**self).write(display, vcp)
    }
}

/// Initializes a backend, failing if it isn't present on this system.
pub type Probe = fn(&Config) -> Result<Box<dyn Transport>, Error>;

/// The backends available on this platform, in preference order.
pub fn probes() -> Vec<(BackendKind, Probe)> {
    #[cfg(windows)]
    let probes: Vec<(BackendKind, Probe)> = vec![
        (BackendKind::Nvapi, probe_nvapi as Probe),
        (BackendKind::Adl, probe_adl as Probe),
        (BackendKind::Monitor, probe_monitor as Probe),
    ];
    #[cfg(not(windows))]
    let probes: Vec<(BackendKind, Probe)> = vec![(BackendKind::Ddcutil, probe_ddcutil as Probe)];
    probes
}

#[cfg(windows)]
fn probe_nvapi(_config: &Config) -> Result<Box<dyn Transport>, Error> {
    Ok(Box::new(nvapi::Nvapi::load()?))
}

#[cfg(windows)]
fn probe_adl(_config: &Config) -> Result<Box<dyn Transport>, Error> {
    Ok(Box::new(adl::Adl::load()?))
}

#[cfg(windows)]
fn probe_monitor(_config: &Config) -> Result<Box<dyn Transport>, Error> {
    Ok(Box::new(monitor::MonitorApi::new()?))
}

#[cfg(not(windows))]
fn probe_ddcutil(config: &Config) -> Result<Box<dyn Transport>, Error> {
    Ok(Box::new(ddcutil::Ddcutil::probe(&config.ddcutil)?))
}

/// Initialize the first available backend.
///
/// When `config.backend` is set only that backend is considered. A backend
/// that fails to initialize is skipped; once one succeeds it is used even if
/// the write itself later fails.
pub fn select<I>(config: &Config, probes: I) -> Result<Box<dyn Transport>, Error>
where
    I: IntoIterator<Item = (BackendKind, Probe)>,
{
    for (kind, probe) in probes {
        if config.backend.map(|forced| forced != kind).unwrap_or(false) {
            continue
        }

        match probe(config) {
            Ok(transport) => {
                info!("Using {} backend", transport.name());
                return Ok(transport)
            },
            Err(e) => debug!("{kind} backend unavailable: {e}"),
        }
    }

    Err(Error::NoBackend)
}
