//! SoftPOS backend endpoints

use crate::http_helpers::join_url;

pub const KERNELS_ENDPOINT: &str = "/api/v1/public/kernels";
pub const LATEST_KERNEL_ENDPOINT: &str = "/api/v1/public/kernels/latest";
pub const REGISTER_DEVICE_ENDPOINT: &str = "/api/v1/devices/register";
pub const INJECT_KEY_ENDPOINT: &str = "/api/v1/public/keys/inject";
pub const ATTEST_ENDPOINT: &str = "/api/v1/transactions/attest";
pub const PROCESS_ENDPOINT: &str = "/api/v1/transactions/process";
pub const HEALTH_ENDPOINT: &str = "/health";

/// Version reported for the kernel bundled with the shell
pub const MOCK_KERNEL_VERSION: &str = "v0.0.0-mock";

pub fn kernels_url(backend_url: &str) -> String {
    join_url(backend_url, KERNELS_ENDPOINT)
}

pub fn latest_kernel_url(backend_url: &str) -> String {
    join_url(backend_url, LATEST_KERNEL_ENDPOINT)
}

pub fn kernel_download_url(backend_url: &str, version: &str) -> String {
    join_url(backend_url, &format!("{KERNELS_ENDPOINT}/{version}/download"))
}

pub fn register_device_url(backend_url: &str) -> String {
    join_url(backend_url, REGISTER_DEVICE_ENDPOINT)
}

pub fn inject_key_url(backend_url: &str) -> String {
    join_url(backend_url, INJECT_KEY_ENDPOINT)
}

pub fn attest_url(backend_url: &str) -> String {
    join_url(backend_url, ATTEST_ENDPOINT)
}

pub fn process_url(backend_url: &str) -> String {
    join_url(backend_url, PROCESS_ENDPOINT)
}

pub fn health_url(kernel_service_url: &str) -> String {
    join_url(kernel_service_url, HEALTH_ENDPOINT)
}
