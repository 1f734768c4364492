//! Dashboard telemetry over a Blynk-style HTTP "update" API.
//!
//! Every snapshot becomes a single GET request that writes all virtual pins
//! at once:
//!
//! ```text
//!   http://<server>/external/api/update?token=<token>&V0=0.00&V1=0.00&…
//! ```
//!
//! | Pin | Value                      |
//! |-----|----------------------------|
//! | V0  | ammonia ppm                |
//! | V1  | nitrite ppm                |
//! | V2  | nitrate ppm                |
//! | V3  | hours since feeding        |
//! | V4  | days since water change    |
//! | V5  | mood label                 |
//! | V6  | advisory text (if any)     |
//! | V7  | pH                         |

use core::fmt::Write as _;

use crate::app::events::TelemetrySnapshot;
use crate::app::ports::TelemetryPort;
use crate::error::TelemetryError;

pub const PIN_AMMONIA: u8 = 0;
pub const PIN_NITRITE: u8 = 1;
pub const PIN_NITRATE: u8 = 2;
pub const PIN_FEEDING: u8 = 3;
pub const PIN_CLEANING: u8 = 4;
pub const PIN_MOOD: u8 = 5;
pub const PIN_ADVICE: u8 = 6;
pub const PIN_PH: u8 = 7;

const TIMEOUT_MS: u32 = 5_000;

/// Percent-encode one query value. Carriage returns are dropped first so
/// multi-line advice arrives with plain `\n` breaks.
pub fn encode_value(value: &str, out: &mut String) {
    if value.contains('\r') {
        out.push_str(&urlencoding::encode(&value.replace('\r', "")));
    } else {
        out.push_str(&urlencoding::encode(value));
    }
}

/// Pin/value pairs for one snapshot, in pin order. The advice pin is left
/// out while no advice has been shown.
pub fn pin_values(snapshot: &TelemetrySnapshot) -> Vec<(u8, String)> {
    let mut pins = vec![
        (PIN_AMMONIA, format!("{:.2}", snapshot.ammonia_ppm)),
        (PIN_NITRITE, format!("{:.2}", snapshot.nitrite_ppm)),
        (PIN_NITRATE, format!("{:.1}", snapshot.nitrate_ppm)),
        (PIN_FEEDING, format!("{:.1}", snapshot.hours_since_feed)),
        (PIN_CLEANING, format!("{:.1}", snapshot.days_since_water_change)),
        (PIN_MOOD, snapshot.mood.label().to_string()),
    ];
    if !snapshot.advice.is_empty() {
        pins.push((PIN_ADVICE, snapshot.advice.to_string()));
    }
    pins.push((PIN_PH, format!("{:.2}", snapshot.ph)));
    pins
}

/// Full update URL for one snapshot.
pub fn update_url(server: &str, token: &str, snapshot: &TelemetrySnapshot) -> String {
    let mut url = format!("http://{server}/external/api/update?token={token}");
    for (pin, value) in pin_values(snapshot) {
        let _ = write!(url, "&V{pin}=");
        encode_value(&value, &mut url);
    }
    url
}

pub struct BlynkTelemetry {
    server: String,
    token: String,
}

impl BlynkTelemetry {
    pub fn new(server: &str, token: &str) -> Self {
        Self {
            server: server.into(),
            token: token.into(),
        }
    }
}

impl TelemetryPort for BlynkTelemetry {
    #[cfg(target_os = "espidf")]
    fn push(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), TelemetryError> {
        use super::http::{Method, request};

        let url = update_url(&self.server, &self.token, snapshot);
        let response = request(Method::Get, &url, None, TIMEOUT_MS, 256)?;
        if response.status == 200 {
            Ok(())
        } else {
            Err(TelemetryError::Rejected(response.status))
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn push(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), TelemetryError> {
        let url = update_url(&self.server, &self.token, snapshot);
        log::debug!("TELEM: no HTTP transport on this target ({} ms): {}", TIMEOUT_MS, url);
        Err(crate::error::TransportError::Unavailable.into())
    }
}
