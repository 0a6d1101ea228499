//! Windows monitor configuration API backend.
//!
//! `dxva2` speaks DDC/CI on behalf of any GPU driver, but only exposes the
//! standard VCP commands. Vendor registers can't be reached through it.

#[cfg(doc)]
use windows::Win32;
use {
    super::Transport,
    crate::{
        win32::{borrow_unaligned, wide_str_from_slice_truncated},
        BackendKind, Error, PrimaryDisplay, VcpWrite,
    },
    log::debug,
    std::{
        fmt::{self, Debug, Formatter},
        mem, ptr,
    },
    windows::{
        core::Result as WinResult,
        Win32::{
            Devices::Display::{
                DestroyPhysicalMonitor, GetNumberOfPhysicalMonitorsFromHMONITOR, GetPhysicalMonitorsFromHMONITOR,
                SetVCPFeature, PHYSICAL_MONITOR,
            },
            Foundation::{BOOL, HANDLE, LPARAM, RECT},
            Graphics::Gdi::{EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFOEXW},
        },
    },
};

/// A handle to an attached physical monitor.
///
/// This is a wrapper around a [`PHYSICAL_MONITOR`][physicalmonitor],
/// destroyed on drop.
///
/// See also: [`Win32::Devices::Display::PHYSICAL_MONITOR`]
///
/// [physicalmonitor]: https://learn.microsoft.com/en-us/windows/win32/api/physicalmonitorenumerationapi/ns-physicalmonitorenumerationapi-physical_monitor
#[repr(align(2))]
#[doc(alias = "PHYSICAL_MONITOR")]
pub struct Monitor {
    monitor: PHYSICAL_MONITOR,
    device: String,
}

impl Monitor {
    /// Every physical monitor on every desktop output, in `EnumDisplayMonitors` order.
    #[doc(alias = "EnumDisplayMonitors")]
    pub fn enumerate() -> WinResult<Vec<Self>> {
        let mut monitors = Vec::new();
        for output in win32_enumerate_outputs()? {
            let device = match win32_monitor_info(output) {
                Ok(info) => wide_str_from_slice_truncated(&info.szDevice).to_string_lossy(),
                Err(e) => {
                    debug!("No device name for output {output:?}: {e}");
                    String::new()
                },
            };
            match win32_physical_monitors(output) {
                Ok(physical) => monitors.extend(physical.into_iter().map(|monitor| Monitor {
                    monitor,
                    device: device.clone(),
                })),
                Err(e) => debug!("Skipping output {output:?}: {e}"),
            }
        }
        Ok(monitors)
    }

    /// Physical monitor description string.
    #[doc(alias = "szPhysicalMonitorDescription")]
    pub fn description(&self) -> String {
        let description = borrow_unaligned(&self.monitor, ptr::addr_of!(self.monitor.szPhysicalMonitorDescription));
        wide_str_from_slice_truncated(&description[..]).to_string_lossy()
    }

    /// GDI device name of the output this monitor is attached to, e.g. `\\.\DISPLAY1`
    #[doc(alias = "szDevice")]
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Physical monitor winapi handle.
    #[doc(alias = "hPhysicalMonitor")]
    pub fn win32_handle(&self) -> HANDLE {
        self.monitor.hPhysicalMonitor
    }

    /// Sets the value of a Virtual Control Panel (VCP) code for a monitor.
    #[doc(alias = "SetVCPFeature")]
    pub fn win32_set_vcp_feature(&self, code: u8, value: u32) -> WinResult<()> {
        BOOL(unsafe { SetVCPFeature(self.win32_handle(), code, value) }).ok()
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        let _ = unsafe { DestroyPhysicalMonitor(self.win32_handle()) };
    }
}

impl Debug for Monitor {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("handle", &self.win32_handle())
            .field("description", &self.description())
            .field("device", &self.device)
            .finish()
    }
}

#[doc(alias = "EnumDisplayMonitors")]
fn win32_enumerate_outputs() -> WinResult<Vec<HMONITOR>> {
    unsafe extern "system" fn callback(handle: HMONITOR, _hdc_monitor: HDC, _lprc: *mut RECT, userdata: LPARAM) -> BOOL {
        let outputs: &mut Vec<HMONITOR> = unsafe { mem::transmute(userdata) };
        outputs.push(handle);
        BOOL::from(true)
    }

    let mut outputs = Vec::<HMONITOR>::new();
    let userdata = LPARAM(&mut outputs as *mut _ as _);
    unsafe { EnumDisplayMonitors(None, None, Some(callback), userdata) }.ok()?;
    Ok(outputs)
}

#[doc(alias = "GetMonitorInfoW")]
fn win32_monitor_info(output: HMONITOR) -> WinResult<MONITORINFOEXW> {
    let mut out = MONITORINFOEXW::default();
    out.monitorInfo.cbSize = mem::size_of::<MONITORINFOEXW>() as _;
    unsafe { GetMonitorInfoW(output, ptr::addr_of_mut!(out.monitorInfo)).ok() }.map(|()| out)
}

/// Position of the first monitor attached to the GDI device `name`.
fn position_by_device<'a, I: IntoIterator<Item = &'a str>>(devices: I, name: &str) -> Option<usize> {
    devices.into_iter().position(|device| device.eq_ignore_ascii_case(name))
}

#[doc(alias = "GetPhysicalMonitorsFromHMONITOR")]
fn win32_physical_monitors(output: HMONITOR) -> WinResult<Vec<PHYSICAL_MONITOR>> {
    let mut len = 0;
    BOOL(unsafe { GetNumberOfPhysicalMonitorsFromHMONITOR(output, &mut len) }).ok()?;

    let mut monitors = vec![PHYSICAL_MONITOR::default(); len as usize];
    BOOL(unsafe { GetPhysicalMonitorsFromHMONITOR(output, &mut monitors) }).ok()?;

    Ok(monitors)
}

/// The monitor configuration API backend.
///
/// Physical monitors are enumerated when the backend is created and released
/// with it.
#[derive(Debug)]
pub struct MonitorApi {
    monitors: Vec<Monitor>,
}

impl MonitorApi {
    /// Enumerate the physical monitors of every desktop output.
    pub fn new() -> Result<Self, Error> {
        let monitors = Monitor::enumerate().map_err(|e| Error::unavailable(BackendKind::Monitor.name(), e))?;
        match monitors.is_empty() {
            true => Err(Error::unavailable(BackendKind::Monitor.name(), "no physical monitors")),
            false => Ok(Self { monitors }),
        }
    }
}

impl Transport for MonitorApi {
    fn name(&self) -> &'static str {
        BackendKind::Monitor.name()
    }

    /// Physical monitors are listed per output rather than in GDI device
    /// order, so match on the output's device name instead.
    fn locate_primary(&mut self, primary: &PrimaryDisplay) -> Option<usize> {
        position_by_device(self.monitors.iter().map(Monitor::device), &primary.name)
    }

    fn write(&mut self, display: usize, vcp: &VcpWrite) -> Result<(), Error> {
        if !vcp.is_standard() {
            return Err(Error::UnsupportedSubAddress {
                sub_address: vcp.sub_address,
                backend: self.name(),
            })
        }

        let monitor = self.monitors.get(display).ok_or(Error::DisplayNotFound {
            index: display,
            count: self.monitors.len(),
        })?;
        debug!("{monitor:?} <- VCP {:#04x} = {:#04x}", vcp.code, vcp.value);
        monitor.win32_set_vcp_feature(vcp.code, vcp.value as u32)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_by_device_name() {
        let devices = [r"\\.\DISPLAY2", r"\\.\DISPLAY1", r"\\.\DISPLAY1"];
        assert_eq!(position_by_device(devices, r"\\.\DISPLAY1"), Some(1));
        assert_eq!(position_by_device(devices, r"\\.\display2"), Some(0));
        assert_eq!(position_by_device(devices, r"\\.\DISPLAY3"), None);
        assert_eq!(position_by_device([""], r"\\.\DISPLAY1"), None);
    }
}
