//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`]: the [`SystemConfig`] is stored as one
//! `postcard` blob under `aquamood::syscfg`.
//!
//! - Config validation: every field is range-checked before persistence.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//! - Host builds keep the blob in memory (tests and simulation only).

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;
use log::info;

#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &core::ffi::CStr = c"aquamood";
const CONFIG_KEY: &core::ffi::CStr = c"syscfg";

#[allow(dead_code)]
const MAX_BLOB_SIZE: usize = 512;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    blob: std::cell::RefCell<Option<Vec<u8>>>,
}

impl NvsAdapter {
    /// Initialise NVS flash.
    ///
    /// Returns `Err(ConfigError::IoError)` if flash initialisation fails
    /// unrecoverably. On first boot or after a version mismatch the NVS
    /// partition is erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // main task before any other NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as i32 || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as i32 {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            blob: std::cell::RefCell::new(None),
        })
    }

    /// Open the config namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_handle<T>(write: bool, f: impl FnOnce(nvs_handle_t) -> Result<T, i32>) -> Result<T, i32> {
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        let ret = unsafe { nvs_open(CONFIG_NAMESPACE.as_ptr(), mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }
        let result = f(handle);
        unsafe { nvs_close(handle) };
        result
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let result = Self::with_handle(false, |handle| {
            let mut size: usize = 0;
            let ret = unsafe {
                nvs_get_blob(handle, CONFIG_KEY.as_ptr(), core::ptr::null_mut(), &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            if size == 0 || size > MAX_BLOB_SIZE {
                return Err(ESP_ERR_NVS_INVALID_LENGTH as i32);
            }
            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(handle, CONFIG_KEY.as_ptr(), buf.as_mut_ptr().cast(), &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(buf)
        });
        match result {
            Ok(buf) => Ok(Some(buf)),
            // A missing namespace on first boot shows up as NOT_FOUND too.
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND as i32 => Ok(None),
            Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH as i32 => Err(ConfigError::Corrupted),
            Err(e) => {
                warn!("NvsAdapter: NVS read error {}", e);
                Err(ConfigError::IoError)
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        Ok(self.blob.borrow().clone())
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        Self::with_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(handle, CONFIG_KEY.as_ptr(), bytes.as_ptr().cast(), bytes.len())
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
        .map_err(|e| {
            warn!("NvsAdapter: NVS write error {}", e);
            if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32 {
                ConfigError::StorageFull
            } else {
                ConfigError::IoError
            }
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        *self.blob.borrow_mut() = Some(bytes.to_vec());
        Ok(())
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let Some(bytes) = self.read_blob()? else {
            info!("NvsAdapter: no stored config, using defaults");
            return Ok(SystemConfig::default());
        };
        let cfg: SystemConfig = postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate().map_err(ConfigError::ValidationFailed)?;
        info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
        Ok(cfg)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationFailed)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.write_blob(&bytes)?;
        info!(
            "NvsAdapter: config saved ({} bytes) to {:?}/{:?}",
            bytes.len(),
            CONFIG_NAMESPACE,
            CONFIG_KEY
        );
        Ok(())
    }
}
