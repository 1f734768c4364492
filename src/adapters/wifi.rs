//! WiFi station status adapter.
//!
//! Implements [`Connectivity`] for the network task. Bringing the station
//! up (credentials, association, DHCP) happens elsewhere; this adapter only
//! answers "is the link usable right now".
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: asks the WiFi driver for the current AP
//!   record and the STA netif for an IPv4 address.
//! - **all other targets**: a shared flag that tests and simulations flip.

use crate::app::ports::Connectivity;

#[cfg(not(target_os = "espidf"))]
use std::sync::Arc;
#[cfg(not(target_os = "espidf"))]
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Clone, Default)]
pub struct StationLink {
    #[cfg(not(target_os = "espidf"))]
    up: Arc<AtomicBool>,
}

impl StationLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulation only: mark the link up or down. Clones share the flag.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_up(&self, up: bool) {
        self.up.store(up, Ordering::Release);
        log::info!("WiFi(sim): link {}", if up { "up" } else { "down" });
    }
}

impl Connectivity for StationLink {
    #[cfg(target_os = "espidf")]
    fn is_network_ready(&self) -> bool {
        use esp_idf_svc::sys::{
            ESP_OK, esp_netif_get_handle_from_ifkey, esp_netif_get_ip_info, esp_netif_ip_info_t,
            esp_wifi_sta_get_ap_info, wifi_ap_record_t,
        };

        // SAFETY: both records are plain C structs for which all-zero is a
        // valid value; the driver only writes into them.
        let mut ap: wifi_ap_record_t = unsafe { core::mem::zeroed() };
        if unsafe { esp_wifi_sta_get_ap_info(&mut ap) } != ESP_OK {
            return false;
        }
        let netif = unsafe { esp_netif_get_handle_from_ifkey(c"WIFI_STA_DEF".as_ptr()) };
        if netif.is_null() {
            return false;
        }
        let mut ip: esp_netif_ip_info_t = unsafe { core::mem::zeroed() };
        if unsafe { esp_netif_get_ip_info(netif, &mut ip) } != ESP_OK {
            return false;
        }
        ip.ip.addr != 0
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_network_ready(&self) -> bool {
        self.up.load(Ordering::Acquire)
    }
}
