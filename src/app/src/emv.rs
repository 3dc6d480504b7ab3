//! Terminal-side EMV data preparation
//!
//! The kernel owns the protocol. These helpers only build the inputs the
//! terminal hands to it and pick the results the terminal needs back out of
//! its JSON responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};

/// AID selected when the PPSE response does not name an application
pub const DEFAULT_AID: &str = "A0000000031010";

/// Command data of GET PROCESSING OPTIONS for an empty PDOL
pub const EMPTY_PDOL: &str = "8300";

/// Transaction type "goods and services"
pub const TRANSACTION_TYPE_PURCHASE: u8 = 0x00;

/// Cryptogram type requested with GENERATE AC
#[derive(Debug, Clone, Copy, Serialize_repr, Deserialize_repr, PartialEq, Eq)]
#[repr(u8)]
pub enum AcType {
    Aac = 0x00,
    Tc = 0x40,
    Arqc = 0x80,
}

/// Steps the terminal walks the kernel through for one payment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum EmvStep {
    #[default]
    SelectPpse,
    SelectApplication,
    GetProcessingOptions,
    ReadRecord,
    GenerateAc,
}

impl EmvStep {
    pub fn next(self) -> Option<Self> {
        match self {
            EmvStep::SelectPpse => Some(EmvStep::SelectApplication),
            EmvStep::SelectApplication => Some(EmvStep::GetProcessingOptions),
            EmvStep::GetProcessingOptions => Some(EmvStep::ReadRecord),
            EmvStep::ReadRecord => Some(EmvStep::GenerateAc),
            EmvStep::GenerateAc => None,
        }
    }
}

/// Parse a keypad amount into minor units, rounding half up at the cent
///
/// Accepts `12`, `12.5`, `.5` and `12.`; rejects empty input, a lone `.`
/// and anything but digits and one decimal point.
pub fn amount_to_minor_units(amount: &str) -> Result<u64, String> {
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));

    if whole.is_empty() && fraction.is_empty() {
        return Err(format!("invalid amount: '{amount}'"));
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(format!("invalid amount: '{amount}'"));
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|e| format!("invalid amount '{amount}': {e}"))?
    };

    let digit = |i: usize| {
        fraction
            .as_bytes()
            .get(i)
            .map_or(0, |b| u64::from(b - b'0'))
    };
    let cents = digit(0) * 10 + digit(1) + u64::from(digit(2) >= 5);

    whole
        .checked_mul(100)
        .and_then(|v| v.checked_add(cents))
        .ok_or_else(|| format!("amount out of range: '{amount}'"))
}

/// Encode minor units as EMV format n12 (6 bytes BCD)
pub fn encode_n12(minor_units: u64) -> Result<[u8; 6], String> {
    if minor_units > 999_999_999_999 {
        return Err(format!("amount {minor_units} does not fit n12"));
    }

    let digits = format!("{minor_units:012}");
    let mut out = [0u8; 6];
    for (i, pair) in digits.as_bytes().chunks(2).enumerate() {
        out[i] = ((pair[0] - b'0') << 4) | (pair[1] - b'0');
    }
    Ok(out)
}

/// ISO 4217 numeric code of the currencies the demo handles
pub fn currency_numeric(code: &str) -> Option<&'static str> {
    match code.to_ascii_uppercase().as_str() {
        "USD" => Some("840"),
        "CNY" => Some("156"),
        "EUR" => Some("978"),
        "GBP" => Some("826"),
        "JPY" => Some("392"),
        "HKD" => Some("344"),
        _ => None,
    }
}

/// Encode a three digit numeric code as n3 (2 bytes, left padded)
fn encode_n3(code: &str) -> Result<String, String> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("'{code}' is not a three digit numeric code"));
    }
    Ok(format!("0{code}"))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// Build the CDOL1 data for GENERATE AC
///
/// Layout: amount authorised (9F02), amount other (9F03), terminal country
/// code (9F1A), TVR (95), transaction currency code (5F2A), transaction type
/// (9C). Date and unpredictable number are left to the kernel.
pub fn build_cdol1(
    amount_minor: u64,
    country_code: &str,
    currency: &str,
    transaction_type: u8,
) -> Result<String, String> {
    let currency_code =
        currency_numeric(currency).ok_or_else(|| format!("unsupported currency '{currency}'"))?;

    let mut cdol = String::new();
    cdol.push_str(&to_hex(&encode_n12(amount_minor)?));
    cdol.push_str(&to_hex(&encode_n12(0)?));
    cdol.push_str(&encode_n3(country_code)?);
    cdol.push_str(&to_hex(&[0u8; 5]));
    cdol.push_str(&encode_n3(currency_code)?);
    cdol.push_str(&format!("{transaction_type:02X}"));
    Ok(cdol)
}

/// First AID announced in a PPSE response
pub fn extract_aid(response: &str) -> Option<String> {
    let value: Value = serde_json::from_str(response).ok()?;

    if let Some(aid) = value.get("aid").and_then(Value::as_str) {
        return Some(aid.to_string());
    }

    value
        .get("applications")?
        .as_array()?
        .iter()
        .find_map(|app| app.get("aid").and_then(Value::as_str))
        .map(str::to_string)
}

/// Application cryptogram of a GENERATE AC response
pub fn extract_cryptogram(response: &str) -> Option<String> {
    let value: Value = serde_json::from_str(response).ok()?;

    let cryptogram = match &value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => ["cryptogram", "applicationCryptogram", "ac"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str)),
        _ => None,
    }?;

    (!cryptogram.is_empty()).then(|| cryptogram.to_string())
}
