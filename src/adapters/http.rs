//! Blocking HTTP(S) request helper over `esp_http_client`.
//!
//! Shared by the advisory and telemetry adapters. Compiled only for
//! `target_os = "espidf"`; host builds use the adapters' stub paths.

use std::ffi::CString;

use log::{debug, warn};

use esp_idf_svc::sys::{
    ESP_OK, esp_crt_bundle_attach, esp_http_client_cleanup, esp_http_client_close,
    esp_http_client_config_t, esp_http_client_fetch_headers, esp_http_client_get_status_code,
    esp_http_client_handle_t, esp_http_client_init, esp_http_client_method_t_HTTP_METHOD_GET,
    esp_http_client_method_t_HTTP_METHOD_POST, esp_http_client_open,
    esp_http_client_read_response, esp_http_client_set_header, esp_http_client_write,
};

use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Method {
    Get,
    Post,
}

pub(super) struct Response {
    pub(super) status: u16,
    pub(super) body: Vec<u8>,
}

/// Owns an `esp_http_client` handle; closes and frees it on drop.
struct Client(esp_http_client_handle_t);

impl Drop for Client {
    fn drop(&mut self) {
        // SAFETY: the handle came from `esp_http_client_init` and is freed
        // exactly once here. Closing an unopened client is a no-op.
        unsafe {
            esp_http_client_close(self.0);
            esp_http_client_cleanup(self.0);
        }
    }
}

/// Perform one request and collect up to `max_body` bytes of the response.
pub(super) fn request(
    method: Method,
    url: &str,
    json_body: Option<&[u8]>,
    timeout_ms: u32,
    max_body: usize,
) -> Result<Response, TransportError> {
    let url_c = CString::new(url).map_err(|_| TransportError::Connect)?;

    // SAFETY: an all-zero config is the documented "unset" state for every
    // field of `esp_http_client_config_t`.
    let mut config: esp_http_client_config_t = unsafe { core::mem::zeroed() };
    config.url = url_c.as_ptr();
    config.timeout_ms = timeout_ms as i32;
    config.method = match method {
        Method::Get => esp_http_client_method_t_HTTP_METHOD_GET,
        Method::Post => esp_http_client_method_t_HTTP_METHOD_POST,
    };
    config.crt_bundle_attach = Some(esp_crt_bundle_attach);

    // SAFETY: `config` and `url_c` outlive the init call; the client copies
    // the URL internally.
    let handle = unsafe { esp_http_client_init(&config) };
    if handle.is_null() {
        warn!("HTTP: client init failed");
        return Err(TransportError::Connect);
    }
    let client = Client(handle);

    let body = json_body.unwrap_or_default();
    if json_body.is_some() {
        // SAFETY: both header strings are NUL-terminated literals.
        unsafe {
            esp_http_client_set_header(client.0, c"Content-Type".as_ptr(), c"application/json".as_ptr());
        }
    }

    // SAFETY: `client.0` is a live handle for the rest of this function.
    let ret = unsafe { esp_http_client_open(client.0, body.len() as i32) };
    if ret != ESP_OK {
        warn!("HTTP: open failed ({})", ret);
        return Err(TransportError::Connect);
    }

    if !body.is_empty() {
        let written =
            unsafe { esp_http_client_write(client.0, body.as_ptr().cast(), body.len() as i32) };
        if written < 0 || written as usize != body.len() {
            warn!("HTTP: body write failed ({} of {} bytes)", written, body.len());
            return Err(TransportError::Connect);
        }
    }

    if unsafe { esp_http_client_fetch_headers(client.0) } < 0 {
        return Err(TransportError::Timeout);
    }
    let status = unsafe { esp_http_client_get_status_code(client.0) } as u16;

    let mut out = Vec::new();
    let mut chunk = [0u8; 512];
    while out.len() < max_body {
        let n = unsafe {
            esp_http_client_read_response(client.0, chunk.as_mut_ptr().cast(), chunk.len() as i32)
        };
        if n < 0 {
            return Err(TransportError::Timeout);
        }
        if n == 0 {
            break;
        }
        let n = (n as usize).min(max_body - out.len());
        out.extend_from_slice(&chunk[..n]);
    }

    debug!("HTTP: {:?} -> {} ({} bytes)", method, status, out.len());
    Ok(Response { status, body: out })
}
