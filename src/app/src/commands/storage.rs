//! Client-local key-value storage.
//!
//! The browser Shell backs this with `localStorage`, the native Shell with a
//! JSON file. Values are plain strings.

use crux_core::{capability::Operation, command, Command};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StorageOperation {
    Get { key: String },
    Set { key: String, value: String },
    Remove { key: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StorageOutput {
    Value { value: Option<String> },
    Done,
    Error { message: String },
}

impl Operation for StorageOperation {
    type Output = StorageOutput;
}

/// Command-based storage API
pub struct Storage<Effect, Event> {
    _effect: PhantomData<Effect>,
    _event: PhantomData<Event>,
}

impl<Effect, Event> Storage<Effect, Event>
where
    Effect: Send + From<crux_core::Request<StorageOperation>> + 'static,
    Event: Send + 'static,
{
    pub fn get(key: impl Into<String>) -> RequestBuilder<Effect, Event> {
        RequestBuilder::new(StorageOperation::Get { key: key.into() })
    }

    pub fn set(key: impl Into<String>, value: impl Into<String>) -> RequestBuilder<Effect, Event> {
        RequestBuilder::new(StorageOperation::Set {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn remove(key: impl Into<String>) -> RequestBuilder<Effect, Event> {
        RequestBuilder::new(StorageOperation::Remove { key: key.into() })
    }
}

#[must_use]
pub struct RequestBuilder<Effect, Event> {
    operation: StorageOperation,
    _effect: PhantomData<Effect>,
    _event: PhantomData<fn() -> Event>,
}

impl<Effect, Event> RequestBuilder<Effect, Event>
where
    Effect: Send + From<crux_core::Request<StorageOperation>> + 'static,
    Event: Send + 'static,
{
    fn new(operation: StorageOperation) -> Self {
        Self {
            operation,
            _effect: PhantomData,
            _event: PhantomData,
        }
    }

    pub fn build(
        self,
    ) -> command::RequestBuilder<Effect, Event, impl std::future::Future<Output = StorageOutput>>
    {
        command::RequestBuilder::new(move |ctx| async move {
            Command::request_from_shell(self.operation)
                .into_future(ctx)
                .await
        })
    }
}
