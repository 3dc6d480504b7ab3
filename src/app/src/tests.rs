use super::*;
use crux_core::Request;
use crux_http::protocol::{HttpRequest, HttpResponse, HttpResult as HttpOutcome};
use serde_json::json;

const DEVICE_ID: &str = "6f1c2a9e-8d7b-4c3a-9e21-0b5d4f6a7c88";

#[derive(Default)]
struct Effects {
    renders: usize,
    http: Vec<Request<HttpRequest>>,
    kernel: Vec<Request<KernelOperation>>,
    storage: Vec<Request<StorageOperation>>,
}

fn drain(cmd: &mut Command<Effect, Event>) -> Effects {
    let mut effects = Effects::default();
    for effect in cmd.effects() {
        match effect {
            Effect::Render(_) => effects.renders += 1,
            Effect::Http(request) => effects.http.push(request),
            Effect::Kernel(request) => effects.kernel.push(request),
            Effect::Storage(request) => effects.storage.push(request),
        }
    }
    effects
}

fn send(event: Event, model: &mut Model) -> Effects {
    let mut cmd = update::update(event, model);
    drain(&mut cmd)
}

fn boot(event: BootEvent, model: &mut Model) -> Effects {
    send(Event::Boot(event), model)
}

fn pay(event: PaymentEvent, model: &mut Model) -> Effects {
    send(Event::Payment(event), model)
}

fn ready_model() -> Model {
    Model {
        state: TerminalState::Ready,
        status_message: "Ready for Transaction".to_string(),
        device_id: Some(DEVICE_ID.to_string()),
        registration_done: true,
        kernel_loaded: true,
        kernel_version: Some("v1.0.0".to_string()),
        ..Default::default()
    }
}

fn processing_model(step: EmvStep) -> Model {
    let mut model = ready_model();
    model.state = TerminalState::Processing;
    model.amount = "12.50".to_string();
    model.transaction = Some(Transaction {
        amount_minor: 1250,
        requested_at: "2026-01-01T00:00:00Z".to_string(),
        step,
        aid: Some(emv::DEFAULT_AID.to_string()),
        ..Default::default()
    });
    model
}

fn response(json: serde_json::Value) -> KernelOutput {
    KernelOutput::Response {
        json: json.to_string(),
    }
}

mod boot_sequence {
    use super::*;

    #[test]
    fn initialize_reads_cached_device_id() {
        let mut model = Model::default();
        let effects = send(
            Event::Initialize {
                config: TerminalConfig::default(),
            },
            &mut model,
        );

        assert_eq!(model.state, TerminalState::Booting);
        assert_eq!(model.status_message, "Initializing Secure Kernel...");
        assert_eq!(effects.storage.len(), 1);
        assert_eq!(
            effects.storage[0].operation,
            StorageOperation::Get {
                key: DEVICE_ID_KEY.to_string()
            }
        );
    }

    #[test]
    fn initialize_rejects_invalid_config() {
        let mut model = Model::default();
        let config = TerminalConfig {
            default_imei: "123".to_string(),
            ..Default::default()
        };

        let effects = send(Event::Initialize { config }, &mut model);

        assert_eq!(model.state, TerminalState::Error);
        assert_eq!(model.status_message, "Initialization Failed");
        assert!(effects.storage.is_empty());
    }

    #[test]
    fn storage_output_is_delivered_as_boot_event() {
        let mut model = Model::default();
        let mut cmd = update::update(
            Event::Initialize {
                config: TerminalConfig::default(),
            },
            &mut model,
        );
        let mut effects = drain(&mut cmd);

        effects.storage[0]
            .resolve(StorageOutput::Value {
                value: Some(DEVICE_ID.to_string()),
            })
            .unwrap();

        let events: Vec<Event> = cmd.events().collect();
        assert_eq!(
            events,
            vec![Event::Boot(BootEvent::CachedDeviceIdLoaded(
                StorageOutput::Value {
                    value: Some(DEVICE_ID.to_string())
                }
            ))]
        );
    }

    #[test]
    fn cached_uuid_is_kept_and_latest_kernel_requested() {
        let mut model = Model {
            state: TerminalState::Booting,
            ..Default::default()
        };

        let effects = boot(
            BootEvent::CachedDeviceIdLoaded(StorageOutput::Value {
                value: Some(DEVICE_ID.to_string()),
            }),
            &mut model,
        );

        assert_eq!(model.cached_device_id.as_deref(), Some(DEVICE_ID));
        assert_eq!(model.status_message, "Downloading Kernel...");
        assert_eq!(effects.http.len(), 1);
        assert_eq!(effects.http[0].operation.method, "GET");
        assert_eq!(
            effects.http[0].operation.url,
            "http://localhost:8080/api/v1/public/kernels/latest"
        );
    }

    #[test]
    fn legacy_device_id_is_removed() {
        let mut model = Model {
            state: TerminalState::Booting,
            ..Default::default()
        };

        let effects = boot(
            BootEvent::CachedDeviceIdLoaded(StorageOutput::Value {
                value: Some("demo-device-42".to_string()),
            }),
            &mut model,
        );

        assert_eq!(model.cached_device_id, None);
        let removed: Vec<_> = effects
            .storage
            .iter()
            .map(|request| request.operation.clone())
            .collect();
        assert_eq!(removed.len(), 2);
        for key in [DEVICE_ID_KEY, IMEI_KEY] {
            assert!(removed.contains(&StorageOperation::Remove {
                key: key.to_string()
            }));
        }
    }

    #[test]
    fn configured_kernel_version_is_downloaded_directly() {
        let mut model = Model {
            state: TerminalState::Booting,
            config: TerminalConfig {
                kernel_version: Some("v1.2.0".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let effects = boot(
            BootEvent::CachedDeviceIdLoaded(StorageOutput::Value { value: None }),
            &mut model,
        );

        assert_eq!(
            effects.http[0].operation.url,
            "http://localhost:8080/api/v1/public/kernels/v1.2.0/download"
        );
    }

    #[test]
    fn enveloped_kernel_metadata_is_decoded() {
        let mut model = Model {
            state: TerminalState::Booting,
            ..Default::default()
        };
        let mut cmd = update::update(
            Event::Boot(BootEvent::CachedDeviceIdLoaded(StorageOutput::Value {
                value: None,
            })),
            &mut model,
        );
        let mut effects = drain(&mut cmd);

        let body = json!({
            "code": 200,
            "data": { "version": "v1.3.0", "file_hash": "abc" },
            "message": "ok"
        });
        effects.http[0]
            .resolve(HttpOutcome::Ok(HttpResponse::ok().json(body).build()))
            .unwrap();

        let events: Vec<Event> = cmd.events().collect();
        let Some(Event::Boot(BootEvent::KernelMetadataResponse(Ok(kernel)))) = events.first()
        else {
            panic!("expected kernel metadata, got {events:?}");
        };
        assert_eq!(kernel.version, "v1.3.0");
        assert_eq!(kernel.file_hash, "abc");
    }

    #[test]
    fn downloaded_module_is_loaded_with_its_hash() {
        let mut model = Model {
            state: TerminalState::Booting,
            pending_kernel: Some(KernelVersion {
                version: "v1.3.0".to_string(),
                file_hash: "abc".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };

        let effects = boot(BootEvent::KernelDownloadResponse(Ok(vec![0, 1, 2])), &mut model);

        assert_eq!(
            effects.kernel[0].operation,
            KernelOperation::Load {
                version: "v1.3.0".to_string(),
                module: vec![0, 1, 2],
                expected_hash: Some("abc".to_string()),
                country_code: "156".to_string(),
                currency_code: "CNY".to_string(),
            }
        );
    }

    #[test]
    fn download_failure_falls_back_to_mock_kernel() {
        let mut model = Model {
            state: TerminalState::Booting,
            ..Default::default()
        };

        let effects = boot(
            BootEvent::KernelMetadataResponse(Err("connection refused".to_string())),
            &mut model,
        );

        assert_eq!(
            effects.kernel[0].operation,
            KernelOperation::LoadMock {
                country_code: "156".to_string(),
                currency_code: "CNY".to_string(),
            }
        );
    }

    #[test]
    fn failed_load_falls_back_to_mock_kernel() {
        let mut model = Model {
            state: TerminalState::Booting,
            ..Default::default()
        };

        let effects = boot(
            BootEvent::KernelLoaded(KernelOutput::Error {
                message: "hash mismatch".to_string(),
            }),
            &mut model,
        );

        assert!(matches!(
            effects.kernel[0].operation,
            KernelOperation::LoadMock { .. }
        ));
    }

    #[test]
    fn failed_mock_kernel_fails_initialization() {
        let mut model = Model {
            state: TerminalState::Booting,
            ..Default::default()
        };

        boot(
            BootEvent::MockKernelLoaded(KernelOutput::Error {
                message: "no module".to_string(),
            }),
            &mut model,
        );

        assert_eq!(model.state, TerminalState::Error);
        assert_eq!(model.status_message, "Initialization Failed");
    }

    #[test]
    fn loaded_kernel_starts_registration() {
        let mut model = Model {
            state: TerminalState::Booting,
            ..Default::default()
        };

        let effects = boot(
            BootEvent::KernelLoaded(KernelOutput::Loaded {
                version: "v1.3.0".to_string(),
            }),
            &mut model,
        );

        assert!(model.kernel_loaded);
        assert_eq!(model.kernel_version.as_deref(), Some("v1.3.0"));
        assert_eq!(model.state, TerminalState::Registering);
        assert_eq!(model.status_message, "Registering Device...");

        let request = &effects.http[0].operation;
        assert_eq!(request.method, "POST");
        assert_eq!(request.url, "http://localhost:8080/api/v1/devices/register");
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["imei"], "863592048725123");
        assert_eq!(body["tee_type"], "QTEE");
    }

    #[test]
    fn disabled_registration_goes_straight_to_ready() {
        let mut model = Model {
            state: TerminalState::Booting,
            config: TerminalConfig {
                auto_register: false,
                ..Default::default()
            },
            ..Default::default()
        };

        let effects = boot(
            BootEvent::MockKernelLoaded(KernelOutput::Loaded {
                version: api::MOCK_KERNEL_VERSION.to_string(),
            }),
            &mut model,
        );

        assert_eq!(model.state, TerminalState::Ready);
        assert!(model.is_operational());
        assert!(effects.http.is_empty());
    }

    #[test]
    fn registration_persists_identity_and_injects_keys() {
        let mut model = Model {
            state: TerminalState::Registering,
            ..Default::default()
        };

        let effects = boot(
            BootEvent::RegisterResponse(Ok(RegistrationResult {
                device_id: Some(DEVICE_ID.to_string()),
                message: Some("Device already registered".to_string()),
            })),
            &mut model,
        );

        assert_eq!(model.device_id.as_deref(), Some(DEVICE_ID));
        assert_eq!(model.state, TerminalState::InjectingKeys);
        assert_eq!(model.status_message, "Injecting Keys...");

        let stored: Vec<_> = effects
            .storage
            .iter()
            .map(|request| request.operation.clone())
            .collect();
        assert_eq!(stored.len(), 2);
        assert!(stored.contains(&StorageOperation::Set {
            key: DEVICE_ID_KEY.to_string(),
            value: DEVICE_ID.to_string()
        }));
        assert!(stored.contains(&StorageOperation::Set {
            key: IMEI_KEY.to_string(),
            value: "863592048725123".to_string()
        }));

        let request = &effects.http[0].operation;
        assert_eq!(request.url, "http://localhost:8080/api/v1/public/keys/inject");
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body, json!({ "deviceId": DEVICE_ID }));
    }

    #[test]
    fn registration_without_device_id_fails() {
        let mut model = Model {
            state: TerminalState::Registering,
            ..Default::default()
        };

        boot(
            BootEvent::RegisterResponse(Ok(RegistrationResult::default())),
            &mut model,
        );

        assert_eq!(model.state, TerminalState::Error);
        assert_eq!(model.status_message, "Initialization Failed");
    }

    #[test]
    fn keys_already_injected_counts_as_success() {
        let mut model = Model {
            state: TerminalState::InjectingKeys,
            kernel_loaded: true,
            ..Default::default()
        };

        boot(
            BootEvent::InjectKeysResponse(Err(
                "Key injection failed: HTTP 409: keys have already been injected".to_string(),
            )),
            &mut model,
        );

        assert_eq!(model.state, TerminalState::Ready);
        assert_eq!(model.status_message, "Ready for Transaction");
        assert!(model.is_operational());
    }

    #[test]
    fn key_injection_failure_fails_initialization() {
        let mut model = Model {
            state: TerminalState::InjectingKeys,
            ..Default::default()
        };

        boot(
            BootEvent::InjectKeysResponse(Err("HTTP 500".to_string())),
            &mut model,
        );

        assert_eq!(model.state, TerminalState::Error);
        assert!(!model.registration_done);
    }

    #[test]
    fn late_boot_events_are_ignored() {
        let mut model = ready_model();

        let effects = boot(
            BootEvent::KernelMetadataResponse(Err("late".to_string())),
            &mut model,
        );

        assert_eq!(model.state, TerminalState::Ready);
        assert!(effects.kernel.is_empty());
    }
}

mod keypad {
    use super::*;

    fn press(keys: &str, model: &mut Model) {
        for key in keys.chars() {
            pay(PaymentEvent::KeyPress { key }, model);
        }
    }

    #[test]
    fn digits_and_one_decimal_point_are_accepted() {
        let mut model = ready_model();
        press("12.3.4x", &mut model);
        assert_eq!(model.amount, "12.34");
    }

    #[test]
    fn input_is_capped() {
        let mut model = ready_model();
        press("1234567890123", &mut model);
        assert_eq!(model.amount, "123456789");
    }

    #[test]
    fn keys_are_ignored_outside_ready() {
        let mut model = ready_model();
        model.state = TerminalState::Processing;
        press("5", &mut model);
        pay(PaymentEvent::Clear, &mut model);
        assert_eq!(model.amount, "");
    }

    #[test]
    fn clear_empties_the_amount() {
        let mut model = ready_model();
        model.amount = "9.99".to_string();
        let effects = pay(PaymentEvent::Clear, &mut model);
        assert_eq!(model.amount, "");
        assert_eq!(effects.renders, 1);
    }
}

mod payment {
    use super::*;

    fn pay_now() -> PaymentEvent {
        PaymentEvent::Pay {
            requested_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn pay_with_zero_amount_is_ignored() {
        let mut model = ready_model();
        model.amount = "0.00".to_string();

        let effects = pay(pay_now(), &mut model);

        assert_eq!(model.state, TerminalState::Ready);
        assert!(effects.kernel.is_empty());
    }

    #[test]
    fn pay_with_lone_decimal_point_is_ignored() {
        let mut model = ready_model();
        model.amount = ".".to_string();

        pay(pay_now(), &mut model);

        assert_eq!(model.state, TerminalState::Ready);
    }

    #[test]
    fn pay_is_ignored_while_switching_kernel() {
        let mut model = ready_model();
        model.amount = "12.5".to_string();
        send(
            Event::Kernel(KernelEvent::LoadVersion {
                version: "v2.0.0".to_string(),
            }),
            &mut model,
        );

        let effects = pay(pay_now(), &mut model);

        assert_eq!(model.state, TerminalState::Ready);
        assert_eq!(model.transaction, None);
        assert!(effects.kernel.is_empty());
    }

    #[test]
    fn pay_starts_with_ppse_selection() {
        let mut model = ready_model();
        model.amount = "12.5".to_string();

        let effects = pay(pay_now(), &mut model);

        assert_eq!(model.state, TerminalState::Processing);
        assert_eq!(model.status_message, "Processing Transaction...");
        let transaction = model.transaction.as_ref().unwrap();
        assert_eq!(transaction.amount_minor, 1250);
        assert_eq!(transaction.step, EmvStep::SelectPpse);
        assert_eq!(effects.kernel[0].operation, KernelOperation::SelectPpse);
    }

    #[test]
    fn kernel_output_is_delivered_as_step_completion() {
        let mut model = ready_model();
        model.amount = "1".to_string();
        let mut cmd = update::update(Event::Payment(pay_now()), &mut model);
        let mut effects = drain(&mut cmd);

        let output = response(json!({ "status": "9000" }));
        effects.kernel[0].resolve(output.clone()).unwrap();

        let events: Vec<Event> = cmd.events().collect();
        assert_eq!(
            events,
            vec![Event::Payment(PaymentEvent::KernelStepCompleted(output))]
        );
    }

    #[test]
    fn ppse_response_selects_announced_application() {
        let mut model = processing_model(EmvStep::SelectPpse);

        let effects = pay(
            PaymentEvent::KernelStepCompleted(response(json!({
                "applications": [{ "aid": "A0000000041010", "label": "MASTERCARD" }]
            }))),
            &mut model,
        );

        assert_eq!(
            effects.kernel[0].operation,
            KernelOperation::SelectApplication {
                aid: "A0000000041010".to_string()
            }
        );
    }

    #[test]
    fn emv_steps_run_in_order() {
        let mut model = processing_model(EmvStep::SelectApplication);

        let effects = pay(
            PaymentEvent::KernelStepCompleted(response(json!({ "status": "9000" }))),
            &mut model,
        );
        assert_eq!(
            effects.kernel[0].operation,
            KernelOperation::GetProcessingOptions {
                pdol: emv::EMPTY_PDOL.to_string()
            }
        );

        let effects = pay(
            PaymentEvent::KernelStepCompleted(response(json!({ "aip": "1980" }))),
            &mut model,
        );
        assert_eq!(
            effects.kernel[0].operation,
            KernelOperation::ReadRecord { sfi: 1, record: 1 }
        );

        let effects = pay(
            PaymentEvent::KernelStepCompleted(response(json!({ "tlv": "70" }))),
            &mut model,
        );
        let KernelOperation::GenerateAc { ac_type, cdol } = &effects.kernel[0].operation else {
            panic!("expected GENERATE AC");
        };
        assert_eq!(*ac_type, AcType::Tc);
        assert!(cdol.starts_with("000000001250"));
    }

    #[test]
    fn cryptogram_is_attested_with_backend() {
        let mut model = processing_model(EmvStep::GenerateAc);

        let effects = pay(
            PaymentEvent::KernelStepCompleted(response(json!({ "cryptogram": "A1B2C3D4E5F60718" }))),
            &mut model,
        );

        assert_eq!(model.status_message, "Processing with Backend...");
        assert_eq!(
            model.transaction.as_ref().unwrap().local_cryptogram.as_deref(),
            Some("A1B2C3D4E5F60718")
        );

        let request = &effects.http[0].operation;
        assert_eq!(
            request.url,
            "http://localhost:8080/api/v1/transactions/attest"
        );
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["deviceId"], DEVICE_ID);
        assert_eq!(body["amount"], 1250);
        assert_eq!(body["currency"], "USD");
        assert_eq!(body["healthCheck"]["securityScore"], 95);
    }

    #[test]
    fn kernel_error_fails_transaction() {
        let mut model = processing_model(EmvStep::GenerateAc);

        pay(
            PaymentEvent::KernelStepCompleted(KernelOutput::Error {
                message: "Kernel not loaded".to_string(),
            }),
            &mut model,
        );

        assert_eq!(model.state, TerminalState::Error);
        assert_eq!(model.status_message, "Transaction Failed");
        assert_eq!(model.transaction, None);
    }

    #[test]
    fn missing_cryptogram_fails_transaction() {
        let mut model = processing_model(EmvStep::GenerateAc);

        pay(
            PaymentEvent::KernelStepCompleted(response(json!({ "cid": "40" }))),
            &mut model,
        );

        assert_eq!(model.state, TerminalState::Error);
    }

    #[test]
    fn token_triggers_client_ip_lookup() {
        let mut model = processing_model(EmvStep::GenerateAc);

        let effects = pay(
            PaymentEvent::AttestResponse(Ok(AttestResult {
                transaction_token: Some("tok-1".to_string()),
            })),
            &mut model,
        );

        assert_eq!(
            effects.http[0].operation.url,
            "https://api.ipify.org?format=json"
        );
        assert_eq!(
            model.transaction.as_ref().unwrap().transaction_token.as_deref(),
            Some("tok-1")
        );
    }

    #[test]
    fn failed_ip_lookup_uses_loopback_address() {
        let mut model = processing_model(EmvStep::GenerateAc);
        model.transaction.as_mut().unwrap().transaction_token = Some("tok-1".to_string());

        let effects = pay(
            PaymentEvent::ClientIpResponse(Err("offline".to_string())),
            &mut model,
        );

        let request = &effects.http[0].operation;
        assert_eq!(
            request.url,
            "http://localhost:8080/api/v1/transactions/process"
        );
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["clientIp"], "127.0.0.1");
        assert_eq!(body["transactionToken"], "tok-1");
        assert_eq!(body["transactionType"], "PAYMENT");
        assert_eq!(body["locationTimestamp"], "2026-01-01T00:00:00Z");
    }

    #[test]
    fn processed_transaction_uses_backend_cryptogram() {
        let mut model = processing_model(EmvStep::GenerateAc);
        model.transaction.as_mut().unwrap().local_cryptogram = Some("LOCAL".to_string());

        pay(
            PaymentEvent::ProcessResponse(Ok(ProcessResult {
                cryptogram: Some("BACKEND".to_string()),
                ..Default::default()
            })),
            &mut model,
        );

        assert_eq!(model.state, TerminalState::Success);
        assert_eq!(model.status_message, "Transaction Approved");
        assert_eq!(model.cryptogram, "BACKEND");
        assert_eq!(model.transaction, None);
    }

    #[test]
    fn processed_transaction_without_cryptogram_keeps_local_one() {
        let mut model = processing_model(EmvStep::GenerateAc);
        model.transaction.as_mut().unwrap().local_cryptogram = Some("LOCAL".to_string());

        pay(
            PaymentEvent::ProcessResponse(Ok(ProcessResult::default())),
            &mut model,
        );

        assert_eq!(model.cryptogram, "LOCAL");
    }

    #[test]
    fn backend_failure_attests_locally() {
        let mut model = processing_model(EmvStep::GenerateAc);
        model.transaction.as_mut().unwrap().local_cryptogram = Some("LOCAL".to_string());

        pay(
            PaymentEvent::AttestResponse(Err("HTTP 503".to_string())),
            &mut model,
        );

        assert_eq!(model.state, TerminalState::Success);
        assert_eq!(model.status_message, "Transaction Approved (Local)");
        assert_eq!(model.cryptogram, "LOCAL");
    }

    #[test]
    fn missing_token_attests_locally() {
        let mut model = processing_model(EmvStep::GenerateAc);
        model.transaction.as_mut().unwrap().local_cryptogram = Some("LOCAL".to_string());

        pay(
            PaymentEvent::AttestResponse(Ok(AttestResult::default())),
            &mut model,
        );

        assert_eq!(model.status_message, "Transaction Approved (Local)");
    }

    #[test]
    fn backend_failure_without_cryptogram_declines() {
        let mut model = processing_model(EmvStep::GenerateAc);

        pay(
            PaymentEvent::ProcessResponse(Err("HTTP 500".to_string())),
            &mut model,
        );

        assert_eq!(model.state, TerminalState::Error);
        assert_eq!(model.status_message, "Transaction Failed");
    }

    #[test]
    fn stale_backend_responses_are_ignored() {
        let mut model = ready_model();

        pay(
            PaymentEvent::ProcessResponse(Err("late".to_string())),
            &mut model,
        );

        assert_eq!(model.state, TerminalState::Ready);
    }

    #[test]
    fn new_transaction_resets_finished_terminal() {
        let mut model = ready_model();
        model.state = TerminalState::Success;
        model.amount = "5".to_string();
        model.cryptogram = "ABC".to_string();

        pay(PaymentEvent::NewTransaction, &mut model);

        assert_eq!(model.state, TerminalState::Ready);
        assert_eq!(model.status_message, "Ready for Transaction");
        assert_eq!(model.amount, "");
        assert_eq!(model.cryptogram, "");
    }

    #[test]
    fn new_transaction_after_failed_boot_restarts_boot() {
        let mut model = Model {
            state: TerminalState::Error,
            ..Default::default()
        };

        let effects = pay(PaymentEvent::NewTransaction, &mut model);

        assert_eq!(model.state, TerminalState::Booting);
        assert_eq!(effects.storage.len(), 1);
    }

    #[test]
    fn new_transaction_is_ignored_while_ready() {
        let mut model = ready_model();
        model.amount = "5".to_string();

        pay(PaymentEvent::NewTransaction, &mut model);

        assert_eq!(model.amount, "5");
    }
}

mod kernel_management {
    use super::*;

    #[test]
    fn list_kernels_requests_stable_versions() {
        let mut model = ready_model();

        let effects = send(Event::Kernel(KernelEvent::ListKernels), &mut model);

        assert!(model.is_loading);
        assert_eq!(
            effects.http[0].operation.url,
            "http://localhost:8080/api/v1/public/kernels"
        );
    }

    #[test]
    fn kernel_list_is_stored() {
        let mut model = ready_model();
        model.is_loading = true;
        let kernels = vec![KernelVersion {
            version: "v1.0.0".to_string(),
            ..Default::default()
        }];

        send(
            Event::Kernel(KernelEvent::KernelListResponse(Ok(kernels.clone()))),
            &mut model,
        );

        assert!(!model.is_loading);
        assert_eq!(model.available_kernels, kernels);
    }

    #[test]
    fn load_version_is_refused_while_processing() {
        let mut model = processing_model(EmvStep::SelectPpse);

        let effects = send(
            Event::Kernel(KernelEvent::LoadVersion {
                version: "v2.0.0".to_string(),
            }),
            &mut model,
        );

        assert!(effects.http.is_empty());
        assert_eq!(model.pending_kernel, None);
    }

    #[test]
    fn load_version_reports_failure_without_mock_fallback() {
        let mut model = ready_model();
        model.pending_kernel = Some(KernelVersion {
            version: "v2.0.0".to_string(),
            ..Default::default()
        });

        let effects = send(
            Event::Kernel(KernelEvent::VersionLoaded(KernelOutput::Error {
                message: "invalid module".to_string(),
            })),
            &mut model,
        );

        assert!(effects.kernel.is_empty());
        assert_eq!(
            model.error_message.as_deref(),
            Some("Kernel load failed: invalid module")
        );
        assert_eq!(model.kernel_version.as_deref(), Some("v1.0.0"));
    }

    #[test]
    fn loaded_version_replaces_kernel() {
        let mut model = ready_model();

        send(
            Event::Kernel(KernelEvent::VersionLoaded(KernelOutput::Loaded {
                version: "v2.0.0".to_string(),
            })),
            &mut model,
        );

        assert_eq!(model.kernel_version.as_deref(), Some("v2.0.0"));
    }

    #[test]
    fn health_check_without_service_is_a_no_op() {
        let mut model = ready_model();
        let mut cmd = update::update(Event::Kernel(KernelEvent::CheckHealth), &mut model);
        assert!(cmd.is_done());
    }

    #[test]
    fn health_check_queries_kernel_service() {
        let mut model = ready_model();
        model.config.kernel_service_url = Some("http://localhost:9000/".to_string());

        let effects = send(Event::Kernel(KernelEvent::CheckHealth), &mut model);

        assert_eq!(effects.http[0].operation.url, "http://localhost:9000/health");
    }
}

#[test]
fn clear_error() {
    let mut model = Model {
        error_message: Some("Some error".to_string()),
        ..Default::default()
    };

    send(Event::Ui(UiEvent::ClearError), &mut model);

    assert_eq!(model.error_message, None);
}
