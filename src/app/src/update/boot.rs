use crux_core::{render::render, Command};
use log::{error, info, warn};

use crate::api;
use crate::commands::{kernel::KernelOutput, storage::StorageOutput};
use crate::events::{BootEvent, Event};
use crate::model::Model;
use crate::types::*;
use crate::{backend_get, backend_post, Effect, KernelCmd, StorageCmd};

/// Start (or restart) the boot sequence with `config`
pub fn initialize(config: TerminalConfig, model: &mut Model) -> Command<Effect, Event> {
    *model = Model {
        config,
        ..Default::default()
    };

    if let Err(e) = model.config.ensure_valid() {
        model.fail_initialization(&e);
        return render();
    }

    info!("terminal configuration: {:?}", model.config);
    model.transition(TerminalState::Booting, "Initializing Secure Kernel...");

    Command::all([
        render(),
        StorageCmd::get(DEVICE_ID_KEY)
            .build()
            .then_send(|output| Event::Boot(BootEvent::CachedDeviceIdLoaded(output))),
    ])
}

/// Handle boot sequence events
pub fn handle(event: BootEvent, model: &mut Model) -> Command<Effect, Event> {
    if !model.state.is_booting() && !matches!(event, BootEvent::IdentityPersisted(_)) {
        warn!("ignoring boot event in state {:?}: {event:?}", model.state);
        return Command::done();
    }

    match event {
        BootEvent::CachedDeviceIdLoaded(output) => {
            let mut commands = vec![render()];

            match output {
                StorageOutput::Value { value: Some(id) } => match DeviceIdFormat::classify(&id) {
                    DeviceIdFormat::Uuid => {
                        info!("cached device id: {id}");
                        model.cached_device_id = Some(id);
                    }
                    DeviceIdFormat::Legacy => {
                        warn!("discarding cached device id {id} in legacy format");
                        commands.push(forget(DEVICE_ID_KEY));
                        commands.push(forget(IMEI_KEY));
                    }
                    DeviceIdFormat::Unknown => {
                        warn!("cached device id {id} has an unknown format");
                        model.cached_device_id = Some(id);
                    }
                },
                StorageOutput::Value { value: None } => {
                    info!("no cached device id, registering on first boot")
                }
                StorageOutput::Done => {}
                StorageOutput::Error { message } => {
                    warn!("failed to read cached device id: {message}")
                }
            }

            commands.push(fetch_kernel(model));
            Command::all(commands)
        }

        BootEvent::KernelMetadataResponse(Ok(kernel)) => {
            info!("latest kernel version: {}", kernel.version);
            let url = api::kernel_download_url(&model.config.backend_url, &kernel.version);
            model.pending_kernel = Some(kernel);
            backend_get!(Boot, BootEvent, url, KernelDownloadResponse, "Kernel download", expect_bytes)
        }

        BootEvent::KernelMetadataResponse(Err(e)) | BootEvent::KernelDownloadResponse(Err(e)) => {
            fall_back_to_mock_kernel(model, &e)
        }

        BootEvent::KernelDownloadResponse(Ok(module)) => {
            let kernel = model.pending_kernel.clone().unwrap_or_default();
            info!("downloaded kernel {} ({} bytes)", kernel.version, module.len());

            let expected_hash = (!kernel.file_hash.is_empty()).then_some(kernel.file_hash);
            KernelCmd::load(
                kernel.version,
                module,
                expected_hash,
                model.config.country_code.clone(),
                model.config.kernel_currency.clone(),
            )
            .build()
            .then_send(|output| Event::Boot(BootEvent::KernelLoaded(output)))
        }

        BootEvent::KernelLoaded(KernelOutput::Loaded { version }) => kernel_ready(model, version),

        BootEvent::KernelLoaded(output) => {
            fall_back_to_mock_kernel(model, &unexpected_output(&output))
        }

        BootEvent::MockKernelLoaded(KernelOutput::Loaded { version }) => {
            kernel_ready(model, version)
        }

        BootEvent::MockKernelLoaded(output) => {
            model.fail_initialization(&format!(
                "failed to load mock kernel: {}",
                unexpected_output(&output)
            ));
            render()
        }

        BootEvent::RegisterResponse(Ok(registration)) => {
            let Some(device_id) = registration.device_id.clone().filter(|id| !id.is_empty())
            else {
                model.fail_initialization("No device_id in registration response");
                return render();
            };

            if registration.is_existing_device() {
                info!("using existing device with ID: {device_id}");
            } else {
                info!("new device registered successfully with ID: {device_id}");
            }

            if let Some(cached) = model.cached_device_id.as_ref().filter(|c| **c != device_id) {
                warn!("backend assigned {device_id}, replacing cached device id {cached}");
            }

            model.device_id = Some(device_id.clone());
            model.cached_device_id = Some(device_id.clone());
            model.transition(TerminalState::InjectingKeys, "Injecting Keys...");
            info!("injecting keys for device {device_id}");

            let request = InjectKeyRequest {
                device_id: device_id.clone(),
            };
            Command::all([
                render(),
                remember(DEVICE_ID_KEY, device_id),
                remember(IMEI_KEY, model.config.default_imei.clone()),
                backend_post!(
                    Boot,
                    BootEvent,
                    api::inject_key_url(&model.config.backend_url),
                    InjectKeysResponse,
                    "Key injection",
                    body_json: &request
                ),
            ])
        }

        BootEvent::RegisterResponse(Err(e)) => {
            model.fail_initialization(&format!("device registration failed: {e}"));
            render()
        }

        BootEvent::IdentityPersisted(StorageOutput::Error { message }) => {
            warn!("failed to update client storage: {message}");
            Command::done()
        }

        BootEvent::IdentityPersisted(_) => Command::done(),

        BootEvent::InjectKeysResponse(result) => {
            match result {
                Ok(()) => info!("keys injected successfully"),
                Err(e) if e.contains("already been injected") => {
                    info!("keys already injected for this device, skipping")
                }
                Err(e) => {
                    model.fail_initialization(&format!("key injection failed: {e}"));
                    return render();
                }
            }

            model.registration_done = true;
            model.transition(TerminalState::Ready, "Ready for Transaction");
            render()
        }
    }
}

/// Download the configured kernel version, or ask for the latest one
fn fetch_kernel(model: &mut Model) -> Command<Effect, Event> {
    model.transition(TerminalState::Booting, "Downloading Kernel...");
    let backend_url = model.config.backend_url.clone();

    match model.config.kernel_version.clone() {
        Some(version) => {
            info!("downloading configured kernel {version}");
            let url = api::kernel_download_url(&backend_url, &version);
            model.pending_kernel = Some(KernelVersion {
                version,
                ..Default::default()
            });
            backend_get!(Boot, BootEvent, url, KernelDownloadResponse, "Kernel download", expect_bytes)
        }
        None => {
            info!("fetching latest kernel from backend");
            backend_get!(
                Boot,
                BootEvent,
                api::latest_kernel_url(&backend_url),
                KernelMetadataResponse,
                "Fetch latest kernel",
                expect_json: KernelVersion
            )
        }
    }
}

fn fall_back_to_mock_kernel(model: &mut Model, reason: &str) -> Command<Effect, Event> {
    error!("kernel load failed: {reason}");
    warn!("falling back to mock kernel");
    model.pending_kernel = None;

    KernelCmd::load_mock(
        model.config.country_code.clone(),
        model.config.kernel_currency.clone(),
    )
    .build()
    .then_send(|output| Event::Boot(BootEvent::MockKernelLoaded(output)))
}

fn kernel_ready(model: &mut Model, version: String) -> Command<Effect, Event> {
    info!("kernel {version} loaded successfully");
    model.kernel_loaded = true;
    model.kernel_version = Some(version);
    model.pending_kernel = None;

    if !model.config.auto_register {
        info!("automatic registration disabled");
        model.registration_done = true;
        model.transition(TerminalState::Ready, "Ready for Transaction");
        return render();
    }

    model.transition(TerminalState::Registering, "Registering Device...");
    info!("registering device with IMEI {}", model.config.default_imei);

    let request = RegisterDeviceRequest {
        imei: model.config.default_imei.clone(),
        model: model.config.device_model.clone(),
        os_version: "1.0.0".to_string(),
        tee_type: model.config.tee_type,
        public_key: MOCK_PUBLIC_KEY.to_string(),
        device_mode: model.config.device_mode,
        nfc_present: true,
    };

    Command::all([
        render(),
        backend_post!(
            Boot,
            BootEvent,
            api::register_device_url(&model.config.backend_url),
            RegisterResponse,
            "Registration",
            body_json: &request,
            expect_json: RegistrationResult
        ),
    ])
}

fn remember(key: &'static str, value: String) -> Command<Effect, Event> {
    StorageCmd::set(key, value)
        .build()
        .then_send(|output| Event::Boot(BootEvent::IdentityPersisted(output)))
}

fn forget(key: &'static str) -> Command<Effect, Event> {
    StorageCmd::remove(key)
        .build()
        .then_send(|output| Event::Boot(BootEvent::IdentityPersisted(output)))
}

fn unexpected_output(output: &KernelOutput) -> String {
    match output {
        KernelOutput::Error { message } => message.clone(),
        other => format!("unexpected kernel output {other:?}"),
    }
}
