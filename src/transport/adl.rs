//! AMD Display Library backend.
//!
//! ADL reports every display it knows about per adapter, including
//! disconnected ones and duplicates across logical adapters. Displays are
//! flattened into a single list of connected desktop displays so that indices
//! line up with what the user sees.

#[cfg(windows)]
use {
    super::Transport,
    crate::{library::Library, BackendKind, Error, VcpWrite},
    log::debug,
    std::{
        ffi::{c_char, c_int, c_void},
        mem, ptr,
    },
};

bitflags::bitflags! {
    /// `ADLDisplayInfo::iDisplayInfoValue` bits
    #[derive(Default)]
    pub struct DisplayInfoFlags: u32 {
        /// `ADL_DISPLAY_DISPLAYINFO_DISPLAYCONNECTED`
        const CONNECTED = 0x0000_0001;
        /// `ADL_DISPLAY_DISPLAYINFO_DISPLAYMAPPED`
        const MAPPED = 0x0000_0002;
        /// `ADL_DISPLAY_DISPLAYINFO_NONLOCAL`
        const NONLOCAL = 0x0000_0004;
        /// `ADL_DISPLAY_DISPLAYINFO_FORCIBLESUPPORTED`
        const FORCIBLE_SUPPORTED = 0x0000_0008;
        /// `ADL_DISPLAY_DISPLAYINFO_GENLOCKSUPPORTED`
        const GENLOCK_SUPPORTED = 0x0000_0010;
        /// `ADL_DISPLAY_DISPLAYINFO_MULTIVPU_SUPPORTED`
        const MULTIVPU_SUPPORTED = 0x0000_0020;
    }
}

/// A display as ADL enumerates it under one adapter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AdlDisplay {
    /// Adapter the display was enumerated under
    pub adapter_index: i32,
    /// `displayID.iDisplayLogicalAdapterIndex`
    pub logical_adapter_index: i32,
    /// `displayID.iDisplayLogicalIndex`
    pub logical_index: i32,
    /// `iDisplayInfoValue`
    pub flags: DisplayInfoFlags,
}

/// An addressable display: the adapter and display indices ADL calls expect.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AdlTarget {
    /// ADL adapter index
    pub adapter: i32,
    /// ADL logical display index
    pub display: i32,
}

impl AdlDisplay {
    /// Connected, part of the desktop, and owned by the adapter it was listed under.
    pub fn is_addressable(&self) -> bool {
        self.flags.contains(DisplayInfoFlags::CONNECTED | DisplayInfoFlags::MAPPED)
            && self.adapter_index == self.logical_adapter_index
    }
}

/// Flatten per-adapter display listings into selectable targets, in enumeration order.
pub fn flatten<I: IntoIterator<Item = AdlDisplay>>(displays: I) -> Vec<AdlTarget> {
    displays
        .into_iter()
        .filter(AdlDisplay::is_addressable)
        .map(|display| AdlTarget {
            adapter: display.adapter_index,
            display: display.logical_index,
        })
        .collect()
}

#[cfg(windows)]
const ADL_OK: c_int = 0;
#[cfg(windows)]
const ADL_MAX_PATH: usize = 256;

#[cfg(windows)]
#[repr(C)]
#[allow(non_snake_case, dead_code)]
struct AdapterInfo {
    iSize: c_int,
    iAdapterIndex: c_int,
    strUDID: [c_char; ADL_MAX_PATH],
    iBusNumber: c_int,
    iDeviceNumber: c_int,
    iFunctionNumber: c_int,
    iVendorID: c_int,
    strAdapterName: [c_char; ADL_MAX_PATH],
    strDisplayName: [c_char; ADL_MAX_PATH],
    iPresent: c_int,
    iExist: c_int,
    strDriverPath: [c_char; ADL_MAX_PATH],
    strDriverPathExt: [c_char; ADL_MAX_PATH],
    strPNPString: [c_char; ADL_MAX_PATH],
    iOSDisplayIndex: c_int,
}

#[cfg(windows)]
#[repr(C)]
#[derive(Copy, Clone)]
#[allow(non_snake_case, dead_code)]
struct ADLDisplayID {
    iDisplayLogicalIndex: c_int,
    iDisplayPhysicalIndex: c_int,
    iDisplayLogicalAdapterIndex: c_int,
    iDisplayPhysicalAdapterIndex: c_int,
}

#[cfg(windows)]
#[repr(C)]
#[derive(Copy, Clone)]
#[allow(non_snake_case, dead_code)]
struct ADLDisplayInfo {
    displayID: ADLDisplayID,
    iDisplayControllerIndex: c_int,
    strDisplayName: [c_char; ADL_MAX_PATH],
    strDisplayManufacturerName: [c_char; ADL_MAX_PATH],
    iDisplayType: c_int,
    iDisplayOutputType: c_int,
    iDisplayConnector: c_int,
    iDisplayInfoMask: c_int,
    iDisplayInfoValue: c_int,
}

#[cfg(windows)]
type MallocCallback = unsafe extern "system" fn(c_int) -> *mut c_void;

#[cfg(windows)]
unsafe extern "system" fn adl_malloc(size: c_int) -> *mut c_void {
    unsafe { libc::malloc(size.max(0) as usize) }
}

/// Memory handed out through [`adl_malloc`], freed on drop.
#[cfg(windows)]
struct AdlBuffer<T>(*mut T);

#[cfg(windows)]
impl<T> Drop for AdlBuffer<T> {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { libc::free(self.0 as *mut c_void) }
        }
    }
}

#[cfg(windows)]
#[derive(Copy, Clone)]
struct Api {
    main_control_create: unsafe extern "C" fn(MallocCallback, c_int) -> c_int,
    main_control_destroy: unsafe extern "C" fn() -> c_int,
    adapter_number_of_adapters_get: unsafe extern "C" fn(*mut c_int) -> c_int,
    adapter_adapter_info_get: unsafe extern "C" fn(*mut AdapterInfo, c_int) -> c_int,
    display_display_info_get: unsafe extern "C" fn(c_int, *mut c_int, *mut *mut ADLDisplayInfo, c_int) -> c_int,
    display_ddc_block_access_get:
        unsafe extern "C" fn(c_int, c_int, c_int, c_int, c_int, *mut c_char, *mut c_int, *mut c_char) -> c_int,
}

#[cfg(windows)]
impl Api {
    unsafe fn resolve(library: &Library) -> Option<Self> {
        unsafe {
            Some(Self {
                main_control_create: library.symbol(b"ADL_Main_Control_Create\0")?,
                main_control_destroy: library.symbol(b"ADL_Main_Control_Destroy\0")?,
                adapter_number_of_adapters_get: library.symbol(b"ADL_Adapter_NumberOfAdapters_Get\0")?,
                adapter_adapter_info_get: library.symbol(b"ADL_Adapter_AdapterInfo_Get\0")?,
                display_display_info_get: library.symbol(b"ADL_Display_DisplayInfo_Get\0")?,
                display_ddc_block_access_get: library.symbol(b"ADL_Display_DDCBlockAccess_Get\0")?,
            })
        }
    }
}

/// An initialized ADL session.
///
/// Dropping it destroys the session and unloads the library.
#[cfg(windows)]
pub struct Adl {
    api: Api,
    // released after the session is destroyed
    _library: Library,
}

#[cfg(windows)]
impl Adl {
    /// Load `atiadlxx.dll`, or the 32-bit `atiadlxy.dll`, and start a session
    /// limited to active adapters.
    #[doc(alias = "ADL_Main_Control_Create")]
    pub fn load() -> Result<Self, Error> {
        let name = BackendKind::Adl.name();
        let library =
            Library::open_any(&["atiadlxx.dll", "atiadlxy.dll"]).ok_or_else(|| Error::unavailable(name, "ADL not installed"))?;
        let api = unsafe { Api::resolve(&library) }
            .ok_or_else(|| Error::unavailable(name, format!("{} is missing entry points", library.name())))?;

        let status = unsafe { (api.main_control_create)(adl_malloc, 1) };
        Error::check("ADL_Main_Control_Create", status, ADL_OK).map_err(|e| Error::unavailable(name, e))?;

        Ok(Self {
            api,
            _library: library,
        })
    }

    fn adapters(&self) -> Result<Vec<c_int>, Error> {
        let mut count: c_int = 0;
        let status = unsafe { (self.api.adapter_number_of_adapters_get)(&mut count) };
        Error::check("ADL_Adapter_NumberOfAdapters_Get", status, ADL_OK)?;
        if count <= 0 {
            return Ok(Vec::new())
        }

        let mut infos: Vec<AdapterInfo> = (0..count).map(|_| unsafe { mem::zeroed() }).collect();
        let size = (mem::size_of::<AdapterInfo>() * infos.len()) as c_int;
        let status = unsafe { (self.api.adapter_adapter_info_get)(infos.as_mut_ptr(), size) };
        Error::check("ADL_Adapter_AdapterInfo_Get", status, ADL_OK)?;

        Ok(infos.iter().map(|info| info.iAdapterIndex).collect())
    }

    fn displays(&self, adapter: c_int) -> Result<Vec<AdlDisplay>, Error> {
        let mut count: c_int = 0;
        let mut info: *mut ADLDisplayInfo = ptr::null_mut();
        let status = unsafe { (self.api.display_display_info_get)(adapter, &mut count, &mut info, 0) };
        let buffer = AdlBuffer(info);
        Error::check("ADL_Display_DisplayInfo_Get", status, ADL_OK)?;

        let info = match buffer.0.is_null() || count <= 0 {
            true => &[][..],
            false => unsafe { std::slice::from_raw_parts(buffer.0, count as usize) },
        };
        Ok(info
            .iter()
            .map(|display| AdlDisplay {
                adapter_index: adapter,
                logical_adapter_index: display.displayID.iDisplayLogicalAdapterIndex,
                logical_index: display.displayID.iDisplayLogicalIndex,
                flags: DisplayInfoFlags::from_bits_truncate(display.iDisplayInfoValue as u32),
            })
            .collect())
    }

    /// Every connected desktop display across all adapters.
    pub fn targets(&self) -> Result<Vec<AdlTarget>, Error> {
        let mut displays = Vec::new();
        for adapter in self.adapters()? {
            match self.displays(adapter) {
                Ok(list) => displays.extend(list),
                Err(e) => debug!("Skipping adapter {adapter}: {e}"),
            }
        }
        Ok(flatten(displays))
    }
}

#[cfg(windows)]
impl Transport for Adl {
    fn name(&self) -> &'static str {
        BackendKind::Adl.name()
    }

    #[doc(alias = "ADL_Display_DDCBlockAccess_Get")]
    fn write(&mut self, display: usize, vcp: &VcpWrite) -> Result<(), Error> {
        let targets = self.targets()?;
        let target = *targets.get(display).ok_or(Error::DisplayNotFound {
            index: display,
            count: targets.len(),
        })?;

        let mut packet = *vcp.packet().as_bytes();
        debug!("ADL {target:?} <- {:02x?}", packet);

        let mut received: c_int = 0;
        let status = unsafe {
            (self.api.display_ddc_block_access_get)(
                target.adapter,
                target.display,
                0,
                0,
                packet.len() as c_int,
                packet.as_mut_ptr() as *mut c_char,
                &mut received,
                ptr::null_mut(),
            )
        };
        Error::check("ADL_Display_DDCBlockAccess_Get", status, ADL_OK)
    }
}

#[cfg(windows)]
impl Drop for Adl {
    fn drop(&mut self) {
        let _ = unsafe { (self.api.main_control_destroy)() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(adapter: i32, logical_adapter: i32, logical: i32, flags: DisplayInfoFlags) -> AdlDisplay {
        AdlDisplay {
            adapter_index: adapter,
            logical_adapter_index: logical_adapter,
            logical_index: logical,
            flags,
        }
    }

    fn active() -> DisplayInfoFlags {
        DisplayInfoFlags::CONNECTED | DisplayInfoFlags::MAPPED
    }

    #[test]
    fn keeps_connected_mapped_displays_in_order() {
        let displays = vec![
            display(0, 0, 0, active()),
            display(0, 0, 1, DisplayInfoFlags::CONNECTED),
            display(0, 0, 2, DisplayInfoFlags::MAPPED),
            display(0, 0, 3, active() | DisplayInfoFlags::NONLOCAL),
            display(1, 1, 0, active()),
        ];
        assert_eq!(flatten(displays), [
            AdlTarget { adapter: 0, display: 0 },
            AdlTarget { adapter: 0, display: 3 },
            AdlTarget { adapter: 1, display: 0 },
        ]);
    }

    #[test]
    fn skips_displays_listed_under_foreign_adapters() {
        // the same display shows up under every logical adapter of a GPU
        let displays = vec![
            display(0, 0, 0, active()),
            display(1, 0, 0, active()),
            display(1, 1, 1, active()),
        ];
        assert_eq!(flatten(displays), [
            AdlTarget { adapter: 0, display: 0 },
            AdlTarget { adapter: 1, display: 1 },
        ]);
    }

    #[test]
    fn nothing_addressable() {
        assert!(flatten(vec![display(0, 0, 0, DisplayInfoFlags::empty())]).is_empty());
        assert!(flatten(Vec::new()).is_empty());
    }
}
