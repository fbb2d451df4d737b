//! SD-card storage adapter.
//!
//! Implements [`StoragePort`] with `std::fs` once a FAT volume is mounted.
//!
//! - **`target_os = "espidf"`**: SPI SD card mounted at [`MOUNT_POINT`]
//!   through `esp_idf_svc::fs::fatfs`.  Paths are used as given.
//! - **all other targets**: a host directory stands in for the card;
//!   absolute paths are re-rooted under it.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use log::{info, warn};

use crate::app::ports::{OpenMode, StoragePort};
use crate::error::StorageError;

pub const MOUNT_POINT: &str = "/sdcard";

pub struct SdCard {
    mounted: bool,
    #[cfg(target_os = "espidf")]
    volume: Option<Box<dyn core::any::Any>>,
    #[cfg(not(target_os = "espidf"))]
    root: PathBuf,
}

impl SdCard {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        Self {
            mounted: false,
            volume: None,
        }
    }

    /// Host stand-in rooted at `root`.
    #[cfg(not(target_os = "espidf"))]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            mounted: false,
            root: root.into(),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    #[cfg(target_os = "espidf")]
    fn resolve(&self, path: &str) -> PathBuf {
        PathBuf::from(path)
    }

    #[cfg(not(target_os = "espidf"))]
    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    #[cfg(target_os = "espidf")]
    fn platform_mount(&mut self, cs_gpio: i32) -> Result<(), StorageError> {
        use esp_idf_svc::fs::fatfs::Fatfs;
        use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin};
        use esp_idf_svc::hal::sd::spi::SdSpiHostDriver;
        use esp_idf_svc::hal::sd::{SdCardConfiguration, SdCardDriver};
        use esp_idf_svc::hal::spi::{Dma, SPI2, SpiDriver, SpiDriverConfig};
        use esp_idf_svc::io::vfs::MountedFatfs;

        use crate::pins;

        // SAFETY: SPI2 and these GPIOs are owned by the card alone; nothing
        // else in the peripheral firmware claims them.
        let (spi, sclk, mosi, miso, cs) = unsafe {
            (
                SPI2::new(),
                AnyIOPin::new(pins::SD_SCK_GPIO),
                AnyIOPin::new(pins::SD_MOSI_GPIO),
                AnyIOPin::new(pins::SD_MISO_GPIO),
                AnyOutputPin::new(cs_gpio),
            )
        };
        let fail = |what: &str, e: esp_idf_svc::sys::EspError| {
            warn!("SD: {} failed ({})", what, e);
            StorageError::MountFailed
        };

        let spi = SpiDriver::new(
            spi,
            sclk,
            mosi,
            Some(miso),
            &SpiDriverConfig::default().dma(Dma::Auto(4096)),
        )
        .map_err(|e| fail("SPI bus init", e))?;
        let host = SdSpiHostDriver::new(
            spi,
            Some(cs),
            AnyIOPin::none(),
            AnyIOPin::none(),
            AnyIOPin::none(),
            None,
        )
        .map_err(|e| fail("SD host init", e))?;
        let card = SdCardDriver::new_spi(host, &SdCardConfiguration::new())
            .map_err(|e| fail("card init", e))?;
        let fatfs = Fatfs::new_sdcard(0, card).map_err(|e| fail("FAT init", e))?;
        let mounted = MountedFatfs::mount(fatfs, MOUNT_POINT, 4).map_err(|e| fail("mount", e))?;

        self.volume = Some(Box::new(mounted));
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_mount(&mut self, _cs_gpio: i32) -> Result<(), StorageError> {
        std::fs::create_dir_all(self.resolve(MOUNT_POINT)).map_err(|e| {
            warn!("SD(sim): {} unusable: {}", self.root.display(), e);
            StorageError::MountFailed
        })
    }
}

#[cfg(target_os = "espidf")]
impl Default for SdCard {
    fn default() -> Self {
        Self::new()
    }
}

impl StoragePort for SdCard {
    type File = File;

    fn mount(&mut self, cs_gpio: i32) -> Result<(), StorageError> {
        self.platform_mount(cs_gpio)?;
        self.mounted = true;
        info!("SD: mounted (cs=GPIO{})", cs_gpio);
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.mounted && self.resolve(path).exists()
    }

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<File, StorageError> {
        if !self.mounted {
            return Err(StorageError::NotMounted);
        }
        let full = self.resolve(path);
        let result = match mode {
            OpenMode::Write => File::create(&full),
            OpenMode::Append => OpenOptions::new().create(true).append(true).open(&full),
        };
        result.map_err(|e| {
            warn!("SD: open {} failed: {}", full.display(), e);
            StorageError::OpenFailed
        })
    }

    fn append(&mut self, file: &mut File, data: &[u8]) -> Result<(), StorageError> {
        file.write_all(data).map_err(|_| StorageError::WriteFailed)
    }

    fn close(&mut self, file: File) {
        if let Err(e) = file.sync_all() {
            warn!("SD: sync failed: {}", e);
        }
    }
}
