//! Reading PiPL and `aete` resources from Windows modules.

use std::ffi::c_void;
use std::path::Path;

use windows::Win32::Foundation::{FreeLibrary, HMODULE};
use windows::Win32::System::LibraryLoader::{
    EnumResourceNamesW, FindResourceW, LOAD_LIBRARY_AS_DATAFILE, LOAD_LIBRARY_AS_IMAGE_RESOURCE,
    LoadLibraryExW, LoadResource, LockResource, SizeofResource,
};
use windows::core::{BOOL, PCWSTR, PWSTR, w};

use crate::error::{FilterHostError, Result};
use crate::handles::{NativeResource, SafeHandle};
use crate::pipl::PiplSource;

/// A module mapped as a data file, used only for its resources.
struct DataModule(isize);

impl DataModule {
    fn handle(&self) -> HMODULE {
        HMODULE(self.0 as *mut c_void)
    }
}

impl NativeResource for DataModule {
    const KIND: &'static str = "resource module";

    fn release(self) {
        // SAFETY: the handle came from LoadLibraryExW and is freed once.
        if let Err(e) = unsafe { FreeLibrary(self.handle()) } {
            tracing::warn!(error = %e, "FreeLibrary failed");
        }
    }
}

type SafeDataModule = SafeHandle<DataModule>;

enum ResourceName {
    Id(u16),
    Name(Vec<u16>),
}

impl ResourceName {
    fn as_pcwstr(&self) -> PCWSTR {
        match self {
            ResourceName::Id(id) => PCWSTR(usize::from(*id) as *const u16),
            ResourceName::Name(name) => PCWSTR(name.as_ptr()),
        }
    }
}

unsafe extern "system" fn collect_name(
    _module: HMODULE,
    _kind: PCWSTR,
    name: PWSTR,
    param: isize,
) -> BOOL {
    // SAFETY: `param` is the address of the Vec passed to EnumResourceNamesW,
    // which outlives the enumeration.
    let names = unsafe { &mut *(param as *mut Vec<ResourceName>) };
    let raw = name.0 as usize;
    if raw <= 0xFFFF {
        names.push(ResourceName::Id(raw as u16));
    } else {
        // SAFETY: non-integer names are NUL-terminated strings owned by the
        // loader for the duration of the callback.
        let wide = unsafe { name.as_wide() };
        let mut owned = wide.to_vec();
        owned.push(0);
        names.push(ResourceName::Name(owned));
    }
    BOOL(1)
}

fn open(path: &Path) -> Result<SafeDataModule> {
    let wide: Vec<u16> = path
        .to_string_lossy()
        .encode_utf16()
        .chain(std::iter::once(0))
        .collect();
    // SAFETY: `wide` is NUL-terminated and outlives the call; data-file
    // loading runs no module code.
    let module = unsafe {
        LoadLibraryExW(
            PCWSTR(wide.as_ptr()),
            None,
            LOAD_LIBRARY_AS_DATAFILE | LOAD_LIBRARY_AS_IMAGE_RESOURCE,
        )
    }
    .map_err(|e| {
        FilterHostError::filter_run(format!("Unable to open {}", path.display()), e)
    })?;
    Ok(SafeDataModule::new(DataModule(module.0 as isize)))
}

fn read(module: &DataModule, name: &ResourceName, kind: PCWSTR) -> Option<Vec<u8>> {
    // SAFETY: the module is loaded for the lifetime of `module`; the
    // resource memory stays mapped until it is unloaded and is copied out
    // before returning.
    unsafe {
        let info = FindResourceW(Some(module.handle()), name.as_pcwstr(), kind);
        if info.is_invalid() {
            return None;
        }
        let loaded = LoadResource(Some(module.handle()), info).ok()?;
        let data = LockResource(loaded) as *const u8;
        let size = SizeofResource(Some(module.handle()), info) as usize;
        if data.is_null() || size == 0 {
            return None;
        }
        Some(std::slice::from_raw_parts(data, size).to_vec())
    }
}

/// [`PiplSource`] that reads `PIPL` and `AETE` resources from the module.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResourcePiplSource;

impl PiplSource for ResourcePiplSource {
    fn read_pipls(&self, path: &Path) -> Result<Vec<Vec<u8>>> {
        let module = open(path)?;
        let Some(data_module) = module.raw_for_abi() else {
            return Ok(Vec::new());
        };

        let mut names: Vec<ResourceName> = Vec::new();
        // SAFETY: `collect_name` only touches `names`, which outlives the call.
        let enumerated = unsafe {
            EnumResourceNamesW(
                Some(data_module.handle()),
                w!("PIPL"),
                Some(collect_name),
                &mut names as *mut Vec<ResourceName> as isize,
            )
        };
        if enumerated.is_err() {
            return Ok(Vec::new());
        }

        Ok(names
            .iter()
            .filter_map(|name| read(data_module, name, w!("PIPL")))
            .collect())
    }

    fn read_aete(&self, path: &Path, resource_id: i16) -> Result<Option<Vec<u8>>> {
        let module = open(path)?;
        Ok(module
            .raw_for_abi()
            .and_then(|m| read(m, &ResourceName::Id(resource_id as u16), w!("AETE"))))
    }
}
