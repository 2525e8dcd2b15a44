// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! LabJack gateway backed by the vendor LJM library
//!
//! The LJM shared library is loaded at runtime so that the application can be
//! built and run in simulation on machines without the LabJack software.
//! A single device handle is opened at construction and used for every
//! channel until [`DeviceGateway::close`] is called.

use async_trait::async_trait;
use libloading::{Library, Symbol};
use log::{debug, info, warn};
use std::ffi::{c_char, c_double, c_int, CStr, CString};
use std::path::{Path, PathBuf};

use super::{DeviceError, DeviceGateway};
use crate::config::DeviceConfig;

/// LJME_NOERROR
const LJM_SUCCESS: c_int = 0;
/// LJM_MAX_NAME_SIZE, size of the buffer filled by `LJM_ErrorToString`
const LJM_MAX_NAME_SIZE: usize = 256;

#[cfg(target_os = "windows")]
const LJM_LIBRARY_NAME: &str = "LabJackM.dll";
#[cfg(target_os = "macos")]
const LJM_LIBRARY_NAME: &str = "libLabJackM.dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const LJM_LIBRARY_NAME: &str = "libLabJackM.so";

type FnOpenS = unsafe extern "C" fn(
    device_type: *const c_char,
    connection_type: *const c_char,
    identifier: *const c_char,
    handle: *mut c_int,
) -> c_int;
type FnEWriteName = unsafe extern "C" fn(handle: c_int, name: *const c_char, value: c_double) -> c_int;
type FnEReadName =
    unsafe extern "C" fn(handle: c_int, name: *const c_char, value: *mut c_double) -> c_int;
type FnClose = unsafe extern "C" fn(handle: c_int) -> c_int;
type FnErrorToString = unsafe extern "C" fn(error_code: c_int, error_string: *mut c_char);

/// Entry points resolved from the LJM library
struct Ljm {
    _lib: Library,
    open_s: FnOpenS,
    e_write_name: FnEWriteName,
    e_read_name: FnEReadName,
    close: FnClose,
    error_to_string: FnErrorToString,
}

impl Ljm {
    fn load(path: &Path) -> Result<Self, DeviceError> {
        let library_error = |e: libloading::Error| DeviceError::Library {
            library: path.display().to_string(),
            message: e.to_string(),
        };

        // SAFETY: loading the vendor library runs its initialisers; the
        // symbols below are the documented LJM C API.
        unsafe {
            let lib = Library::new(path).map_err(library_error)?;
            macro_rules! sym {
                ($t:ty, $name:expr) => {{
                    let s: Symbol<$t> = lib.get($name).map_err(library_error)?;
                    *s
                }};
            }
            Ok(Self {
                open_s: sym!(FnOpenS, b"LJM_OpenS\0"),
                e_write_name: sym!(FnEWriteName, b"LJM_eWriteName\0"),
                e_read_name: sym!(FnEReadName, b"LJM_eReadName\0"),
                close: sym!(FnClose, b"LJM_Close\0"),
                error_to_string: sym!(FnErrorToString, b"LJM_ErrorToString\0"),
                _lib: lib,
            })
        }
    }

    fn describe(&self, code: c_int) -> String {
        let mut buf = [0 as c_char; LJM_MAX_NAME_SIZE];
        // SAFETY: the buffer has the size required by LJM_ErrorToString.
        let text = unsafe {
            (self.error_to_string)(code, buf.as_mut_ptr());
            CStr::from_ptr(buf.as_ptr()).to_string_lossy().trim().to_string()
        };
        format!("LJM error {}: {}", code, text)
    }
}

/// Gateway to a LabJack device (T4, T7, T8...) through LJM
pub struct LabJackGateway {
    ljm: Ljm,
    handle: Option<c_int>,
}

fn c_string(value: &str) -> Result<CString, DeviceError> {
    CString::new(value).map_err(|_| DeviceError::InvalidChannel(value.to_string()))
}

impl LabJackGateway {
    /// Load LJM and open the device described by `config`.
    ///
    /// Fails if the library cannot be loaded or no matching device answers.
    pub fn open(config: &DeviceConfig) -> Result<Self, DeviceError> {
        let path = config
            .library_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(LJM_LIBRARY_NAME));
        debug!("Loading LJM library from {:?}", path);
        let ljm = Ljm::load(&path)?;

        let device_type = c_string(&config.device_type)?;
        let connection_type = c_string(&config.connection_type)?;
        let identifier = c_string(&config.identifier)?;

        let mut handle: c_int = 0;
        // SAFETY: all strings are NUL terminated and outlive the call.
        let code = unsafe {
            (ljm.open_s)(
                device_type.as_ptr(),
                connection_type.as_ptr(),
                identifier.as_ptr(),
                &mut handle,
            )
        };
        if code != LJM_SUCCESS {
            return Err(DeviceError::Open(ljm.describe(code)));
        }

        info!("LabJack device opened with handle {}", handle);
        Ok(Self {
            ljm,
            handle: Some(handle),
        })
    }

    fn handle(&self) -> Result<c_int, DeviceError> {
        self.handle.ok_or(DeviceError::Closed)
    }
}

#[async_trait]
impl DeviceGateway for LabJackGateway {
    async fn write(&mut self, channel: &str, value: f64) -> Result<(), DeviceError> {
        let handle = self.handle()?;
        let name = c_string(channel)?;
        // SAFETY: `name` is NUL terminated and the handle is open.
        let code = unsafe { (self.ljm.e_write_name)(handle, name.as_ptr(), value) };
        if code != LJM_SUCCESS {
            return Err(DeviceError::Write {
                channel: channel.to_string(),
                value,
                message: self.ljm.describe(code),
            });
        }
        debug!("LJM write: {} = {}", channel, value);
        Ok(())
    }

    async fn read(&mut self, channel: &str) -> Result<f64, DeviceError> {
        let handle = self.handle()?;
        let name = c_string(channel)?;
        let mut value: c_double = 0.0;
        // SAFETY: `name` is NUL terminated and `value` is a valid out pointer.
        let code = unsafe { (self.ljm.e_read_name)(handle, name.as_ptr(), &mut value) };
        if code != LJM_SUCCESS {
            return Err(DeviceError::Read {
                channel: channel.to_string(),
                message: self.ljm.describe(code),
            });
        }
        debug!("LJM read: {} = {}", channel, value);
        Ok(value)
    }

    async fn close(&mut self) -> Result<(), DeviceError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        // SAFETY: the handle was returned by LJM_OpenS and is closed once.
        let code = unsafe { (self.ljm.close)(handle) };
        if code != LJM_SUCCESS {
            return Err(DeviceError::Close(self.ljm.describe(code)));
        }
        info!("LabJack device handle {} closed", handle);
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "labjack"
    }
}

impl Drop for LabJackGateway {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            warn!("LabJack handle {} dropped without close, closing it", handle);
            // SAFETY: see `close`.
            unsafe {
                (self.ljm.close)(handle);
            }
        }
    }
}
