//! Kernel command definitions.
//!
//! The EMV kernel is an external WebAssembly module. The Core asks the Shell
//! to load it and to call its exports; the Shell reports the JSON results.

use crux_core::{capability::Operation, command, Command};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

use crate::emv::AcType;

// Operations that the Shell performs on the kernel module
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum KernelOperation {
    Load {
        version: String,
        module: Vec<u8>,
        expected_hash: Option<String>,
        country_code: String,
        currency_code: String,
    },
    LoadMock {
        country_code: String,
        currency_code: String,
    },
    SelectPpse,
    SelectApplication {
        aid: String,
    },
    ReadRecord {
        sfi: u8,
        record: u8,
    },
    GetProcessingOptions {
        pdol: String,
    },
    GenerateAc {
        ac_type: AcType,
        cdol: String,
    },
}

// The result of a kernel operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum KernelOutput {
    Loaded { version: String },
    Response { json: String },
    Error { message: String },
}

impl Operation for KernelOperation {
    type Output = KernelOutput;
}

/// Command-based kernel API
pub struct Kernel<Effect, Event> {
    _effect: PhantomData<Effect>,
    _event: PhantomData<Event>,
}

impl<Effect, Event> Kernel<Effect, Event>
where
    Effect: Send + From<crux_core::Request<KernelOperation>> + 'static,
    Event: Send + 'static,
{
    /// Instantiate a downloaded kernel module
    pub fn load(
        version: impl Into<String>,
        module: Vec<u8>,
        expected_hash: Option<String>,
        country_code: impl Into<String>,
        currency_code: impl Into<String>,
    ) -> RequestBuilder<Effect, Event> {
        RequestBuilder::new(KernelOperation::Load {
            version: version.into(),
            module,
            expected_hash,
            country_code: country_code.into(),
            currency_code: currency_code.into(),
        })
    }

    /// Instantiate the kernel bundled with the Shell
    pub fn load_mock(
        country_code: impl Into<String>,
        currency_code: impl Into<String>,
    ) -> RequestBuilder<Effect, Event> {
        RequestBuilder::new(KernelOperation::LoadMock {
            country_code: country_code.into(),
            currency_code: currency_code.into(),
        })
    }

    pub fn select_ppse() -> RequestBuilder<Effect, Event> {
        RequestBuilder::new(KernelOperation::SelectPpse)
    }

    pub fn select_application(aid: impl Into<String>) -> RequestBuilder<Effect, Event> {
        RequestBuilder::new(KernelOperation::SelectApplication { aid: aid.into() })
    }

    pub fn read_record(sfi: u8, record: u8) -> RequestBuilder<Effect, Event> {
        RequestBuilder::new(KernelOperation::ReadRecord { sfi, record })
    }

    pub fn get_processing_options(pdol: impl Into<String>) -> RequestBuilder<Effect, Event> {
        RequestBuilder::new(KernelOperation::GetProcessingOptions { pdol: pdol.into() })
    }

    pub fn generate_ac(ac_type: AcType, cdol: impl Into<String>) -> RequestBuilder<Effect, Event> {
        RequestBuilder::new(KernelOperation::GenerateAc {
            ac_type,
            cdol: cdol.into(),
        })
    }
}

/// Request builder for kernel operations
#[must_use]
pub struct RequestBuilder<Effect, Event> {
    operation: KernelOperation,
    _effect: PhantomData<Effect>,
    _event: PhantomData<fn() -> Event>,
}

impl<Effect, Event> RequestBuilder<Effect, Event>
where
    Effect: Send + From<crux_core::Request<KernelOperation>> + 'static,
    Event: Send + 'static,
{
    fn new(operation: KernelOperation) -> Self {
        Self {
            operation,
            _effect: PhantomData,
            _event: PhantomData,
        }
    }

    /// Build the request into a Command RequestBuilder
    pub fn build(
        self,
    ) -> command::RequestBuilder<Effect, Event, impl std::future::Future<Output = KernelOutput>>
    {
        command::RequestBuilder::new(move |ctx| async move {
            Command::request_from_shell(self.operation)
                .into_future(ctx)
                .await
        })
    }
}
