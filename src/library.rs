use {
    log::debug,
    std::mem,
    widestring::WideCString,
    windows::{
        core::{PCSTR, PCWSTR},
        Win32::{
            Foundation::HINSTANCE,
            System::LibraryLoader::{FreeLibrary, GetProcAddress, LoadLibraryW},
        },
    },
};

/// A dynamically loaded vendor library, released on drop.
#[derive(Debug)]
pub(crate) struct Library {
    handle: HINSTANCE,
    name: &'static str,
}

impl Library {
    /// Load the first of `names` that exists.
    #[doc(alias = "LoadLibraryW")]
    pub fn open_any(names: &[&'static str]) -> Option<Self> {
        names.iter().find_map(|&name| Self::open(name))
    }

    #[doc(alias = "LoadLibraryW")]
    pub fn open(name: &'static str) -> Option<Self> {
        let wide = WideCString::from_str(name).ok()?;
        match unsafe { LoadLibraryW(PCWSTR(wide.as_ptr())) } {
            Ok(handle) => {
                debug!("Loaded {name}");
                Some(Self { handle, name })
            },
            Err(e) => {
                debug!("Failed to load {name}: {e}");
                None
            },
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Resolve an exported function.
    ///
    /// `symbol` must be nul-terminated.
    ///
    /// # Safety
    ///
    /// `F` must be a function pointer type matching the export's real signature.
    #[doc(alias = "GetProcAddress")]
    pub unsafe fn symbol<F: Copy>(&self, symbol: &'static [u8]) -> Option<F> {
        debug_assert_eq!(symbol.last(), Some(&0));
        debug_assert_eq!(mem::size_of::<F>(), mem::size_of::<usize>());
        unsafe { GetProcAddress(self.handle, PCSTR(symbol.as_ptr())) }.map(|f| unsafe { mem::transmute_copy(&f) })
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        let _ = unsafe { FreeLibrary(self.handle) };
    }
}
