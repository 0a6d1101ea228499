#[cfg(doc)]
use windows::Win32;
use {
    crate::{win32::wide_str_from_slice_truncated, PrimaryDisplay, PrimarySource},
    log::debug,
    std::{
        fmt::{self, Debug, Display, Formatter},
        mem,
    },
    widestring::WideStr,
    windows::{
        core::PCWSTR,
        Win32::Graphics::Gdi::{self, EnumDisplayDevicesW, DISPLAY_DEVICEW},
    },
};

/// A display adapter device, as reported by GDI
///
/// This wraps a [`DISPLAY_DEVICE`][display_device].
///
/// See also: [`Win32::Graphics::Gdi::DISPLAY_DEVICEW`]
///
/// [display_device]: https://learn.microsoft.com/en-us/windows/win32/api/wingdi/ns-wingdi-display_devicew
#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(transparent)]
#[doc(alias = "DISPLAY_DEVICEW")]
pub struct DisplayDevice {
    info: DISPLAY_DEVICEW,
}

impl DisplayDevice {
    /// Enumerate all display devices in GDI order
    ///
    /// This is a wrapper around [`EnumDisplayDevicesW`][enumdisplaydevicesw],
    /// with no `lpDevice` requested.
    ///
    /// [enumdisplaydevicesw]: https://learn.microsoft.com/en-us/windows/win32/api/winuser/nf-winuser-enumdisplaydevicesw
    #[doc(alias = "EnumDisplayDevicesW")]
    pub fn enumerate() -> impl Iterator<Item = Self> {
        (0..)
            .map(Self::win32_enum)
            .take_while(|d| d.is_some())
            .flatten()
            .map(|info| Self { info })
    }

    /// The adapter's device name, e.g. `\\.\DISPLAY1`
    pub fn name<'a>(&'a self) -> impl Display + Debug + 'a {
        self.win32_name().display()
    }

    /// Device state flags
    pub fn flags(&self) -> DisplayDeviceFlags {
        DisplayDeviceFlags::from_bits_truncate(self.info.StateFlags)
    }

    /// Whether the primary desktop is on this device
    pub fn is_primary(&self) -> bool {
        self.flags().contains(DisplayDeviceFlags::PRIMARY_DEVICE)
    }

    fn win32_name(&self) -> &WideStr {
        wide_str_from_slice_truncated(&self.info.DeviceName)
    }

    fn win32_string(&self) -> &WideStr {
        wide_str_from_slice_truncated(&self.info.DeviceString)
    }

    #[doc(alias = "EnumDisplayDevicesW")]
    fn win32_enum(index: u32) -> Option<DISPLAY_DEVICEW> {
        let mut info = DISPLAY_DEVICEW::default();
        info.cb = mem::size_of::<DISPLAY_DEVICEW>() as u32;
        unsafe { EnumDisplayDevicesW(None::<PCWSTR>, index, &mut info, 0) }
            .ok()
            .map(|()| info)
            .ok()
    }
}

impl Debug for DisplayDevice {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("DisplayDevice")
            .field("name", &self.win32_name())
            .field("string", &self.win32_string())
            .field("flags", &self.flags())
            .finish()
    }
}

bitflags::bitflags! {
    /// The [`StateFlags` field][stateflags] of [`DisplayDevice::flags`]
    ///
    /// [stateflags]: https://learn.microsoft.com/en-us/windows/win32/api/wingdi/ns-wingdi-display_devicew#members
    #[derive(Default)]
    pub struct DisplayDeviceFlags: u32 {
        /// The device is part of the desktop
        ///
        /// See also: [`Gdi::DISPLAY_DEVICE_ACTIVE`]
        #[doc(alias = "DISPLAY_DEVICE_ACTIVE")]
        const ACTIVE = Gdi::DISPLAY_DEVICE_ACTIVE;

        /// A pseudo device used to mirror application drawing
        ///
        /// See also: [`Gdi::DISPLAY_DEVICE_MIRRORING_DRIVER`]
        #[doc(alias = "DISPLAY_DEVICE_MIRRORING_DRIVER")]
        const MIRRORING_DRIVER = Gdi::DISPLAY_DEVICE_MIRRORING_DRIVER;

        /// The primary desktop is on the device
        ///
        /// For a system with multiple display cards, only one device can have this set.
        ///
        /// See also: [`Gdi::DISPLAY_DEVICE_PRIMARY_DEVICE`]
        #[doc(alias = "DISPLAY_DEVICE_PRIMARY_DEVICE")]
        const PRIMARY_DEVICE = Gdi::DISPLAY_DEVICE_PRIMARY_DEVICE;

        /// The device is removable, and so can't be the primary display
        ///
        /// See also: [`Gdi::DISPLAY_DEVICE_REMOVABLE`]
        #[doc(alias = "DISPLAY_DEVICE_REMOVABLE")]
        const REMOVABLE = Gdi::DISPLAY_DEVICE_REMOVABLE;
    }
}

/// Primary display lookup through GDI display device enumeration.
///
/// The reported index is the device's position in [`DisplayDevice::enumerate`],
/// which GPU vendor enumerations follow closely enough to pick a display by.
#[derive(Copy, Clone, Debug, Default)]
pub struct GdiDisplays;

impl PrimarySource for GdiDisplays {
    fn primary(&self) -> Option<PrimaryDisplay> {
        DisplayDevice::enumerate()
            .inspect(|device| debug!("{device:?}"))
            .enumerate()
            .find(|(_, device)| device.is_primary())
            .map(|(index, device)| PrimaryDisplay {
                name: device.name().to_string(),
                index: Some(index),
            })
    }
}
