//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements                    | Connects to               |
//! |---------------|-------------------------------|---------------------------|
//! | `gatt_server` | GattServerPort                | Bluedroid GATTS + GAP adv |
//! | `gatt_client` | GattClientPort                | Bluedroid GATTC + GAP scan|
//! | `hardware`    | SensorPort, IndicatorPort     | ADXL343, MAX17048, LEDC   |
//! |               | DisplayPort                   | SSD1327                   |
//! | `storage`     | StoragePort                   | SPI SD card, FAT          |
//! | `log_sink`    | EventSink                     | Serial log output         |
//! | `time`        | (clock)                       | ESP32 system timer        |

pub mod ble_stack;
pub mod gatt_client;
pub mod gatt_server;
pub mod hardware;
pub mod log_sink;
pub mod storage;
pub mod time;
