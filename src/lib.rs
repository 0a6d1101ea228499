#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/ddc-write/0.1.0/")]

//! Write a single DDC/CI VCP value to a monitor.
//!
//! Writes go through whichever vendor path is present: NVAPI or ADL on
//! Windows (falling back to the monitor configuration API), and `ddcutil`
//! elsewhere. Vendor registers such as LG's `0x50` input switch sub-address
//! are only reachable through the raw I2C paths.
//!
//! # Example
//!
//! ```rust,no_run
//! # fn main() -> Result<(), ddc_write::Error> {
//! use ddc_write::{transport, Config, DisplaySelector, VcpWrite, WriteRequest};
//!
//! let config = Config::default();
//! let mut transport = transport::select(&config, transport::probes())?;
//! let request = WriteRequest {
//!     display: DisplaySelector::Primary,
//!     vcp: VcpWrite::new(0x60, 0x0f),
//! };
//! request.execute(&mut transport, &*ddc_write::os_primary_source(&config))?;
//! # Ok(())
//! # }
//! ```

#[cfg(windows)]
pub use self::display::{DisplayDevice, DisplayDeviceFlags, GdiDisplays};
pub use self::{
    config::{BackendKind, Config},
    error::Error,
    packet::{checksum, DdcPacket, VcpWrite, I2C_WRITE_ADDRESS_DDC_CI, OPCODE_SET_VCP_FEATURE, SUB_ADDRESS_LG},
    primary::{PrimaryDisplay, PrimarySource, Xrandr},
    request::WriteRequest,
    resolve::{resolve, DisplaySelector},
    transport::Transport,
};
#[doc(no_inline)]
pub use ddc::{FeatureCode, SUB_ADDRESS_DDC_CI};

mod config;
#[cfg(windows)]
mod display;
mod error;
#[cfg(windows)]
mod library;
mod packet;
mod primary;
mod request;
mod resolve;
pub mod transport;

/// The primary display lookup native to this platform.
///
/// GDI on Windows, `xrandr` everywhere else.
pub fn os_primary_source(config: &Config) -> Box<dyn PrimarySource> {
    #[cfg(windows)]
    let source: Box<dyn PrimarySource> = {
        let _ = config;
        Box::new(GdiDisplays)
    };
    #[cfg(not(windows))]
    let source: Box<dyn PrimarySource> = Box::new(Xrandr::new(&config.xrandr));
    source
}

#[cfg(windows)]
mod win32 {
    use {
        std::{
            borrow::Cow,
            mem::align_of,
            ptr,
        },
        widestring::{WideCStr, WideStr},
    };

    pub(crate) fn wide_str_from_slice_truncated(sz: &[u16]) -> &WideStr {
        match WideCStr::from_slice_truncate(sz) {
            Ok(str) => str.as_ref(),
            Err(_) => WideStr::from_slice(sz),
        }
    }

    fn is_aligned<T>(ptr: *const T) -> bool {
        // TODO: Replace this with pointer::is_aligned() once the MSRV allows it
        (ptr as usize) & (align_of::<T>() - 1) == 0
    }

    pub(crate) fn borrow_unaligned<'a, T: Clone, D: ?Sized>(_lifetime: &'a D, ptr: *const T) -> Cow<'a, T> {
        match is_aligned(ptr) {
            true => Cow::Borrowed(unsafe { &*ptr }),
            false => Cow::Owned(unsafe { ptr::read_unaligned(ptr) }),
        }
    }
}
