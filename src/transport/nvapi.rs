//! NVIDIA NVAPI backend.
//!
//! The driver only exports `nvapi_QueryInterface`; every other entry point is
//! looked up through it by a fixed interface id.

use {
    super::Transport,
    crate::{library::Library, BackendKind, Error, VcpWrite},
    log::debug,
    std::{
        ffi::{c_int, c_void},
        mem, ptr,
    },
};

type NvStatus = c_int;
type NvDisplayHandle = *mut c_void;
type NvPhysicalGpuHandle = *mut c_void;

const NVAPI_OK: NvStatus = 0;
const NVAPI_END_ENUMERATION: NvStatus = -7;
const NVAPI_MAX_PHYSICAL_GPUS: usize = 64;

/// Deprecated `i2cSpeed` value, still read by older drivers.
const I2C_SPEED: u32 = 27;

const ID_INITIALIZE: u32 = 0x0150_e828;
const ID_UNLOAD: u32 = 0xd22b_dd7e;
const ID_ENUM_NVIDIA_DISPLAY_HANDLE: u32 = 0x9abd_d40d;
const ID_GET_PHYSICAL_GPUS_FROM_DISPLAY: u32 = 0x34ef_9506;
const ID_GET_ASSOCIATED_DISPLAY_OUTPUT_ID: u32 = 0xd995_937e;
const ID_I2C_WRITE: u32 = 0xe812_eb07;

/// `NV_I2C_INFO_V3`
#[repr(C)]
#[allow(non_snake_case)]
struct NvI2cInfo {
    version: u32,
    displayMask: u32,
    bIsDDCPort: u8,
    i2cDevAddress: u8,
    pbI2cRegAddress: *mut u8,
    regAddrSize: u32,
    pbData: *mut u8,
    cbSize: u32,
    i2cSpeed: u32,
    i2cSpeedKhz: u32,
    portId: u8,
    bIsPortIdSet: u32,
}

impl NvI2cInfo {
    const VERSION: u32 = mem::size_of::<Self>() as u32 | (3 << 16);
}

type QueryInterface = unsafe extern "C" fn(u32) -> *mut c_void;

#[derive(Copy, Clone)]
struct Api {
    unload: unsafe extern "C" fn() -> NvStatus,
    enum_nvidia_display_handle: unsafe extern "C" fn(u32, *mut NvDisplayHandle) -> NvStatus,
    get_physical_gpus_from_display: unsafe extern "C" fn(NvDisplayHandle, *mut NvPhysicalGpuHandle, *mut u32) -> NvStatus,
    get_associated_display_output_id: unsafe extern "C" fn(NvDisplayHandle, *mut u32) -> NvStatus,
    i2c_write: unsafe extern "C" fn(NvPhysicalGpuHandle, *mut NvI2cInfo) -> NvStatus,
}

impl Api {
    unsafe fn query<F: Copy>(query: QueryInterface, id: u32) -> Option<F> {
        debug_assert_eq!(mem::size_of::<F>(), mem::size_of::<*mut c_void>());
        match unsafe { query(id) } {
            f if f.is_null() => None,
            f => Some(unsafe { mem::transmute_copy(&f) }),
        }
    }

    unsafe fn resolve(query: QueryInterface) -> Option<Self> {
        unsafe {
            Some(Self {
                unload: Self::query(query, ID_UNLOAD)?,
                enum_nvidia_display_handle: Self::query(query, ID_ENUM_NVIDIA_DISPLAY_HANDLE)?,
                get_physical_gpus_from_display: Self::query(query, ID_GET_PHYSICAL_GPUS_FROM_DISPLAY)?,
                get_associated_display_output_id: Self::query(query, ID_GET_ASSOCIATED_DISPLAY_OUTPUT_ID)?,
                i2c_write: Self::query(query, ID_I2C_WRITE)?,
            })
        }
    }
}

/// An initialized NVAPI session.
///
/// Dropping it unloads NVAPI and releases the driver library.
pub struct Nvapi {
    api: Api,
    _library: Library,
}

impl Nvapi {
    #[cfg(target_pointer_width = "64")]
    const LIBRARY: &'static str = "nvapi64.dll";
    #[cfg(not(target_pointer_width = "64"))]
    const LIBRARY: &'static str = "nvapi.dll";

    /// Load the NVAPI driver library and initialize it.
    #[doc(alias = "NvAPI_Initialize")]
    pub fn load() -> Result<Self, Error> {
        let name = BackendKind::Nvapi.name();
        let library = Library::open(Self::LIBRARY).ok_or_else(|| Error::unavailable(name, "NVAPI not installed"))?;
        let query: QueryInterface = unsafe { library.symbol(b"nvapi_QueryInterface\0") }
            .ok_or_else(|| Error::unavailable(name, "nvapi_QueryInterface not exported"))?;

        let initialize: unsafe extern "C" fn() -> NvStatus = unsafe { Api::query(query, ID_INITIALIZE) }
            .ok_or_else(|| Error::unavailable(name, "NvAPI_Initialize not found"))?;
        let api = unsafe { Api::resolve(query) }.ok_or_else(|| Error::unavailable(name, "missing NVAPI interfaces"))?;

        let status = unsafe { initialize() };
        Error::check("NvAPI_Initialize", status, NVAPI_OK).map_err(|e| Error::unavailable(name, e))?;

        Ok(Self {
            api,
            _library: library,
        })
    }

    /// Every NVIDIA display handle, in enumeration order.
    #[doc(alias = "NvAPI_EnumNvidiaDisplayHandle")]
    fn display_handles(&self) -> Result<Vec<NvDisplayHandle>, Error> {
        let mut handles = Vec::new();
        for i in 0.. {
            let mut handle: NvDisplayHandle = ptr::null_mut();
            match unsafe { (self.api.enum_nvidia_display_handle)(i, &mut handle) } {
                NVAPI_OK => handles.push(handle),
                NVAPI_END_ENUMERATION => break,
                status => return Err(Error::Status {
                    call: "NvAPI_EnumNvidiaDisplayHandle",
                    status,
                }),
            }
        }
        Ok(handles)
    }
}

impl Transport for Nvapi {
    fn name(&self) -> &'static str {
        BackendKind::Nvapi.name()
    }

    #[doc(alias = "NvAPI_I2CWrite")]
    fn write(&mut self, display: usize, vcp: &VcpWrite) -> Result<(), Error> {
        let handles = self.display_handles()?;
        let handle = *handles.get(display).ok_or(Error::DisplayNotFound {
            index: display,
            count: handles.len(),
        })?;

        let mut gpus: [NvPhysicalGpuHandle; NVAPI_MAX_PHYSICAL_GPUS] = [ptr::null_mut(); NVAPI_MAX_PHYSICAL_GPUS];
        let mut gpu_count = 0u32;
        let status = unsafe { (self.api.get_physical_gpus_from_display)(handle, gpus.as_mut_ptr(), &mut gpu_count) };
        Error::check("NvAPI_GetPhysicalGPUsFromDisplay", status, NVAPI_OK)?;
        if gpu_count == 0 {
            return Err(Error::Status {
                call: "NvAPI_GetPhysicalGPUsFromDisplay",
                status: NVAPI_END_ENUMERATION,
            })
        }

        let mut output_id = 0u32;
        let status = unsafe { (self.api.get_associated_display_output_id)(handle, &mut output_id) };
        Error::check("NvAPI_GetAssociatedDisplayOutputId", status, NVAPI_OK)?;

        // NVAPI sends the device and register address itself and expects the
        // rest of the packet, checksum included, as data.
        let packet = vcp.packet();
        let mut register = [packet.sub_address()];
        let mut data = [0u8; 6];
        data.copy_from_slice(packet.payload());
        debug!("NVAPI output {output_id:#x} <- {packet:?}");

        let mut info = NvI2cInfo {
            version: NvI2cInfo::VERSION,
            displayMask: output_id,
            bIsDDCPort: 1,
            i2cDevAddress: packet.device_address(),
            pbI2cRegAddress: register.as_mut_ptr(),
            regAddrSize: register.len() as u32,
            pbData: data.as_mut_ptr(),
            cbSize: data.len() as u32,
            i2cSpeed: I2C_SPEED,
            i2cSpeedKhz: 0,
            portId: 0,
            bIsPortIdSet: 0,
        };
        let status = unsafe { (self.api.i2c_write)(gpus[0], &mut info) };
        Error::check("NvAPI_I2CWrite", status, NVAPI_OK)
    }
}

impl Drop for Nvapi {
    fn drop(&mut self) {
        let _ = unsafe { (self.api.unload)() };
    }
}
