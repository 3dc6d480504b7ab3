//! Native host of the EMV kernel module
//!
//! The kernel is a wasm-bindgen module built for the browser; its exports
//! cannot be called without the JavaScript glue it was generated with. The
//! native host therefore validates the module it is handed and emulates the
//! exports deterministically, keyed by the module hash.

use anyhow::{Context, Result, bail, ensure};
use log::{debug, info, warn};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use softpos_demo_core::{KernelOperation, KernelOutput, api::MOCK_KERNEL_VERSION};
use std::path::PathBuf;

/// `\0asm` followed by binary format version 1
const WASM_HEADER: [u8; 8] = [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];

/// Smallest valid module, loaded when no mock kernel file is configured
const BUILTIN_MOCK_MODULE: &[u8] = &WASM_HEADER;

const STATUS_OK: &str = "9000";
const VISA_CREDIT_AID: &str = "A0000000031010";

/// Length of the CDOL1 data the terminal builds for GENERATE AC
const CDOL1_LEN: usize = 22;

/// PAN and expiry date of the emulated card
const CARD_RECORD: &str = "5A0841111111111111115F2403251231";

/// Check the WebAssembly magic number and binary format version
pub fn validate_module(module: &[u8]) -> Result<()> {
    ensure!(
        module.len() >= WASM_HEADER.len(),
        "kernel module too small: {} bytes",
        module.len()
    );
    ensure!(
        module[..4] == WASM_HEADER[..4],
        "kernel module is not a WebAssembly module"
    );
    ensure!(
        module[4..8] == WASM_HEADER[4..8],
        "unsupported WebAssembly version {:?}",
        &module[4..8]
    );
    Ok(())
}

/// Hex encoded SHA-256 of `module`
pub fn module_hash(module: &[u8]) -> String {
    hex::encode(Sha256::digest(module))
}

/// Whether `value` looks like a hex encoded SHA-256 digest
pub fn is_sha256_digest(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Compare the module against the hash published with its metadata
pub fn verify_hash(module: &[u8], expected: &str) -> Result<()> {
    let actual = module_hash(module);
    ensure!(
        actual.eq_ignore_ascii_case(expected.trim()),
        "kernel hash mismatch: expected {expected}, got {actual}"
    );
    Ok(())
}

#[derive(Debug)]
struct KernelInstance {
    version: String,
    country_code: String,
    currency_code: String,
    module_hash: Vec<u8>,
    selected_aid: Option<String>,
    /// Application transaction counter
    atc: u16,
}

/// Loads kernel modules and answers kernel effects
#[derive(Debug, Default)]
pub struct KernelHost {
    mock_kernel_path: Option<PathBuf>,
    instance: Option<KernelInstance>,
}

impl KernelHost {
    pub fn new(mock_kernel_path: Option<PathBuf>) -> Self {
        Self {
            mock_kernel_path,
            instance: None,
        }
    }

    /// Version of the loaded kernel
    pub fn version(&self) -> Option<&str> {
        self.instance.as_ref().map(|i| i.version.as_str())
    }

    /// Perform a kernel effect of the core
    pub async fn execute(&mut self, operation: KernelOperation) -> KernelOutput {
        let result = match operation {
            KernelOperation::Load {
                version,
                module,
                expected_hash,
                country_code,
                currency_code,
            } => self
                .load(version, &module, expected_hash.as_deref(), country_code, currency_code)
                .map(|version| KernelOutput::Loaded { version }),
            KernelOperation::LoadMock {
                country_code,
                currency_code,
            } => self
                .load_mock(country_code, currency_code)
                .await
                .map(|version| KernelOutput::Loaded { version }),
            operation => self.call(operation).map(|json| KernelOutput::Response {
                json: json.to_string(),
            }),
        };

        result.unwrap_or_else(|e| {
            warn!("kernel operation failed: {e:#}");
            KernelOutput::Error {
                message: format!("{e:#}"),
            }
        })
    }

    fn load(
        &mut self,
        version: String,
        module: &[u8],
        expected_hash: Option<&str>,
        country_code: String,
        currency_code: String,
    ) -> Result<String> {
        validate_module(module)?;

        match expected_hash.map(str::trim) {
            Some(expected) if is_sha256_digest(expected) => verify_hash(module, expected)?,
            Some(expected) => {
                warn!("kernel {version} hash {expected} is not a SHA-256 digest, skipping verification")
            }
            None => warn!("kernel {version} has no published hash, skipping verification"),
        }

        info!(
            "kernel {version} instantiated ({} bytes, country {country_code}, currency {currency_code})",
            module.len()
        );

        self.instance = Some(KernelInstance {
            version: version.clone(),
            country_code,
            currency_code,
            module_hash: Sha256::digest(module).to_vec(),
            selected_aid: None,
            atc: 0,
        });

        Ok(version)
    }

    async fn load_mock(&mut self, country_code: String, currency_code: String) -> Result<String> {
        let module = match &self.mock_kernel_path {
            Some(path) => tokio::fs::read(path)
                .await
                .context(format!("failed to read mock kernel {}", path.display()))?,
            None => BUILTIN_MOCK_MODULE.to_vec(),
        };

        self.load(
            MOCK_KERNEL_VERSION.to_string(),
            &module,
            None,
            country_code,
            currency_code,
        )
    }

    fn call(&mut self, operation: KernelOperation) -> Result<Value> {
        let Some(instance) = self.instance.as_mut() else {
            bail!("Kernel not loaded");
        };
        debug!("kernel {} call {operation:?}", instance.version);

        match operation {
            KernelOperation::SelectPpse => Ok(json!({
                "status": STATUS_OK,
                "applications": [{
                    "aid": VISA_CREDIT_AID,
                    "label": "VISA CREDIT",
                    "priority": 1
                }]
            })),

            KernelOperation::SelectApplication { aid } => {
                let bytes = decode_hex("AID", &aid)?;
                ensure!(
                    (5..=16).contains(&bytes.len()),
                    "invalid AID length: {} bytes",
                    bytes.len()
                );
                instance.selected_aid = Some(aid.to_uppercase());
                Ok(json!({ "status": STATUS_OK, "aid": aid.to_uppercase() }))
            }

            KernelOperation::GetProcessingOptions { pdol } => {
                ensure!(instance.selected_aid.is_some(), "no application selected");
                let bytes = decode_hex("PDOL", &pdol)?;
                ensure!(
                    bytes.first() == Some(&0x83),
                    "PDOL data must start with tag 83"
                );
                Ok(json!({ "status": STATUS_OK, "aip": "1980", "afl": "08010100" }))
            }

            KernelOperation::ReadRecord { sfi, record } => {
                ensure!(instance.selected_aid.is_some(), "no application selected");
                ensure!((1..=30).contains(&sfi), "invalid SFI {sfi}");
                ensure!(record >= 1, "invalid record number {record}");
                let length = CARD_RECORD.len() / 2;
                Ok(json!({
                    "status": STATUS_OK,
                    "sfi": sfi,
                    "record": record,
                    "tlv": format!("70{length:02X}{CARD_RECORD}")
                }))
            }

            KernelOperation::GenerateAc { ac_type, cdol } => {
                ensure!(instance.selected_aid.is_some(), "no application selected");
                let data = decode_hex("CDOL", &cdol)?;
                ensure!(
                    data.len() >= CDOL1_LEN,
                    "CDOL data too short: {} bytes",
                    data.len()
                );

                instance.atc = instance.atc.wrapping_add(1);
                let cryptogram = instance.cryptogram(&data);

                Ok(json!({
                    "status": STATUS_OK,
                    "cid": format!("{:02X}", ac_type as u8),
                    "atc": format!("{:04X}", instance.atc),
                    "cryptogram": cryptogram,
                    "country": instance.country_code,
                    "currency": instance.currency_code
                }))
            }

            KernelOperation::Load { .. } | KernelOperation::LoadMock { .. } => {
                bail!("load requests are not kernel calls")
            }
        }
    }
}

impl KernelInstance {
    /// 8 byte application cryptogram over the CDOL data and the counter
    fn cryptogram(&self, cdol: &[u8]) -> String {
        let digest = Sha256::new()
            .chain_update(&self.module_hash)
            .chain_update(cdol)
            .chain_update(self.atc.to_be_bytes())
            .finalize();
        hex::encode_upper(&digest[..8])
    }
}

fn decode_hex(what: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value).context(format!("invalid {what} hex data '{value}'"))
}
