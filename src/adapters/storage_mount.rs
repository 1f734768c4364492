//! Filesystem mounts behind the file-backed adapters.
//!
//! [`FrameFiles`](super::frame_files::FrameFiles) reads from the SPIFFS
//! partition and [`CsvEventLog`](super::csv_log::CsvEventLog) appends to the
//! SD card. Both paths only exist once the VFS drivers are registered, so
//! these run before any coordinator task starts.
//!
//! ```text
//!   flash "storage" partition ──SPIFFS──▶ /spiffs/frames/…
//!   SD card on SPI2           ──FAT─────▶ /sdcard/care_log.csv
//! ```

use core::ffi::CStr;
use core::fmt;

use log::info;

pub const SPIFFS_BASE: &CStr = c"/spiffs";
pub const SPIFFS_PARTITION: &CStr = c"storage";
pub const SD_BASE: &CStr = c"/sdcard";

/// Open file handles per mounted volume.
pub const MAX_OPEN_FILES: usize = 5;

// esp_err_t values the mount calls report.
const ERR_FAIL: i32 = -1;
const ERR_NO_MEM: i32 = 0x101;
const ERR_INVALID_STATE: i32 = 0x103;
const ERR_NOT_FOUND: i32 = 0x105;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountError {
    /// The partition table has no partition with the requested label.
    PartitionNotFound,
    /// The driver found the medium but could not mount a filesystem on it.
    MountFailed,
    /// Already mounted or the bus is already in use.
    AlreadyMounted,
    OutOfMemory,
    /// Any other `esp_err_t`.
    Driver(i32),
    /// No VFS on this target.
    Unsupported,
}

impl MountError {
    /// Map a non-OK `esp_err_t` from a mount call.
    pub fn from_esp(code: i32) -> Self {
        match code {
            ERR_FAIL => Self::MountFailed,
            ERR_NO_MEM => Self::OutOfMemory,
            ERR_INVALID_STATE => Self::AlreadyMounted,
            ERR_NOT_FOUND => Self::PartitionNotFound,
            other => Self::Driver(other),
        }
    }
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PartitionNotFound => write!(f, "partition not found"),
            Self::MountFailed => write!(f, "failed to mount filesystem"),
            Self::AlreadyMounted => write!(f, "already mounted"),
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::Driver(code) => write!(f, "driver error 0x{:x}", code),
            Self::Unsupported => write!(f, "no filesystem driver on this target"),
        }
    }
}

/// SPI wiring of the SD card slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdSpiPins {
    pub mosi: i32,
    pub miso: i32,
    pub sclk: i32,
    pub cs: i32,
}

/// Space on a mounted SPIFFS partition, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolumeUsage {
    pub total: usize,
    pub used: usize,
}

impl VolumeUsage {
    pub fn free(&self) -> usize {
        self.total.saturating_sub(self.used)
    }
}

/// Register the SPIFFS partition at [`SPIFFS_BASE`]. The partition is
/// never formatted: frames are flashed with the image.
#[cfg(target_os = "espidf")]
pub fn mount_spiffs() -> Result<VolumeUsage, MountError> {
    use esp_idf_svc::sys::{ESP_OK, esp_spiffs_info, esp_vfs_spiffs_conf_t, esp_vfs_spiffs_register};

    // SAFETY: plain C config struct, all-zero is valid. The strings are
    // 'static and the driver copies what it keeps.
    let mut conf: esp_vfs_spiffs_conf_t = unsafe { core::mem::zeroed() };
    conf.base_path = SPIFFS_BASE.as_ptr();
    conf.partition_label = SPIFFS_PARTITION.as_ptr();
    conf.max_files = MAX_OPEN_FILES;
    conf.format_if_mount_failed = false;
    let ret = unsafe { esp_vfs_spiffs_register(&conf) };
    if ret != ESP_OK {
        return Err(MountError::from_esp(ret));
    }

    let mut usage = VolumeUsage::default();
    let ret = unsafe { esp_spiffs_info(SPIFFS_PARTITION.as_ptr(), &mut usage.total, &mut usage.used) };
    if ret == ESP_OK {
        info!(
            "STORAGE: SPIFFS mounted, {} KB total, {} KB used",
            usage.total / 1024,
            usage.used / 1024
        );
    } else {
        log::warn!("STORAGE: SPIFFS mounted, usage unknown (0x{:x})", ret);
    }
    Ok(usage)
}

#[cfg(not(target_os = "espidf"))]
pub fn mount_spiffs() -> Result<VolumeUsage, MountError> {
    info!("STORAGE: no SPIFFS on this target ({:?})", SPIFFS_BASE);
    Err(MountError::Unsupported)
}

/// Bring up the SPI bus and mount the card's FAT volume at [`SD_BASE`].
#[cfg(target_os = "espidf")]
pub fn mount_sdcard(pins: &SdSpiPins) -> Result<(), MountError> {
    use esp_idf_svc::sys::{
        ESP_OK, SDMMC_FREQ_DEFAULT, SDMMC_HOST_FLAG_DEINIT_ARG, SDMMC_HOST_FLAG_SPI,
        esp_vfs_fat_sdmmc_mount_config_t, esp_vfs_fat_sdspi_mount, gpio_num_t_GPIO_NUM_NC,
        sdmmc_card_t, sdmmc_host_t, sdspi_device_config_t, sdspi_host_do_transaction,
        sdspi_host_get_real_freq, sdspi_host_init, sdspi_host_io_int_enable, sdspi_host_io_int_wait,
        sdspi_host_remove_device, sdspi_host_set_card_clk, spi_bus_config_t, spi_bus_free,
        spi_bus_initialize, spi_common_dma_t_SPI_DMA_CH_AUTO, spi_host_device_t_SPI2_HOST,
    };

    const MAX_TRANSFER: i32 = 4000;

    let spi_host = spi_host_device_t_SPI2_HOST;

    // SAFETY: plain C config structs; all-zero is valid and every field the
    // driver reads is set below.
    let mut bus: spi_bus_config_t = unsafe { core::mem::zeroed() };
    bus.__bindgen_anon_1.mosi_io_num = pins.mosi;
    bus.__bindgen_anon_2.miso_io_num = pins.miso;
    bus.sclk_io_num = pins.sclk;
    bus.__bindgen_anon_3.quadwp_io_num = gpio_num_t_GPIO_NUM_NC;
    bus.__bindgen_anon_4.quadhd_io_num = gpio_num_t_GPIO_NUM_NC;
    bus.max_transfer_sz = MAX_TRANSFER;
    let ret = unsafe { spi_bus_initialize(spi_host, &bus, spi_common_dma_t_SPI_DMA_CH_AUTO) };
    if ret != ESP_OK {
        return Err(MountError::from_esp(ret));
    }

    // Equivalent of SDSPI_HOST_DEFAULT().
    let mut host: sdmmc_host_t = unsafe { core::mem::zeroed() };
    host.flags = SDMMC_HOST_FLAG_SPI | SDMMC_HOST_FLAG_DEINIT_ARG;
    host.slot = spi_host as i32;
    host.max_freq_khz = SDMMC_FREQ_DEFAULT as i32;
    host.io_voltage = 3.3;
    host.init = Some(sdspi_host_init);
    host.set_card_clk = Some(sdspi_host_set_card_clk);
    host.do_transaction = Some(sdspi_host_do_transaction);
    host.__bindgen_anon_1.deinit_p = Some(sdspi_host_remove_device);
    host.io_int_enable = Some(sdspi_host_io_int_enable);
    host.io_int_wait = Some(sdspi_host_io_int_wait);
    host.get_real_freq = Some(sdspi_host_get_real_freq);

    let mut slot: sdspi_device_config_t = unsafe { core::mem::zeroed() };
    slot.host_id = spi_host;
    slot.gpio_cs = pins.cs;
    slot.gpio_cd = gpio_num_t_GPIO_NUM_NC;
    slot.gpio_wp = gpio_num_t_GPIO_NUM_NC;
    slot.gpio_int = gpio_num_t_GPIO_NUM_NC;

    let mut mount: esp_vfs_fat_sdmmc_mount_config_t = unsafe { core::mem::zeroed() };
    mount.format_if_mount_failed = false;
    mount.max_files = MAX_OPEN_FILES as i32;
    mount.allocation_unit_size = 16 * 1024;

    let mut card: *mut sdmmc_card_t = core::ptr::null_mut();
    let ret = unsafe { esp_vfs_fat_sdspi_mount(SD_BASE.as_ptr(), &host, &slot, &mount, &mut card) };
    if ret != ESP_OK {
        unsafe { spi_bus_free(spi_host) };
        return Err(MountError::from_esp(ret));
    }
    // SAFETY: a successful mount leaves `card` pointing at the driver's
    // card record, valid until unmount (never, in this firmware).
    let (sectors, sector_size) = unsafe { ((*card).csd.capacity, (*card).csd.sector_size) };
    let capacity_mb = sectors as u64 * sector_size as u64 / (1024 * 1024);
    info!("STORAGE: SD card mounted at {:?}, {} MB", SD_BASE, capacity_mb);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn mount_sdcard(pins: &SdSpiPins) -> Result<(), MountError> {
    info!("STORAGE: no SD card on this target (cs={})", pins.cs);
    Err(MountError::Unsupported)
}
