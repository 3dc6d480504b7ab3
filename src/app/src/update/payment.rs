use crux_core::{render::render, Command};
use log::{debug, error, info, warn};

use crate::api;
use crate::commands::kernel::KernelOutput;
use crate::emv::{self, AcType, EmvStep};
use crate::events::{Event, PaymentEvent};
use crate::model::{Model, Transaction};
use crate::types::*;
use crate::{backend_get, backend_post, update_field, Effect, KernelCmd};

/// Longest amount the keypad still appends to
const MAX_AMOUNT_LEN: usize = 8;

/// Client IP reported when the lookup service is unavailable
const FALLBACK_CLIENT_IP: &str = "127.0.0.1";

/// Handle keypad and transaction events
pub fn handle(event: PaymentEvent, model: &mut Model) -> Command<Effect, Event> {
    match event {
        PaymentEvent::KeyPress { key } => {
            if model.state != TerminalState::Ready
                || !(key.is_ascii_digit() || key == '.')
                || (key == '.' && model.amount.contains('.'))
                || model.amount.len() > MAX_AMOUNT_LEN
            {
                return Command::done();
            }

            model.amount.push(key);
            render()
        }

        PaymentEvent::Clear => {
            if model.state != TerminalState::Ready {
                return Command::done();
            }
            update_field!(model.amount, String::new())
        }

        PaymentEvent::Pay { requested_at } => start_payment(model, requested_at),

        PaymentEvent::NewTransaction => {
            if !model.state.is_finished() {
                return Command::done();
            }

            if !model.is_operational() {
                info!("terminal did not finish booting, restarting initialization");
                return super::boot::initialize(model.config.clone(), model);
            }

            model.amount.clear();
            model.cryptogram.clear();
            model.transaction = None;
            model.transition(TerminalState::Ready, "Ready for Transaction");
            render()
        }

        event => {
            if model.state != TerminalState::Processing || model.transaction.is_none() {
                warn!("ignoring transaction event in state {:?}: {event:?}", model.state);
                return Command::done();
            }

            match event {
                PaymentEvent::KernelStepCompleted(output) => kernel_step_completed(model, output),

                PaymentEvent::AttestResponse(Ok(AttestResult {
                    transaction_token: Some(token),
                    ..
                })) if !token.is_empty() => {
                    info!("transaction attested successfully");
                    if let Some(transaction) = model.transaction.as_mut() {
                        transaction.transaction_token = Some(token);
                    }

                    match model.config.client_ip_lookup_url.clone() {
                        Some(url) => backend_get!(
                            Payment,
                            PaymentEvent,
                            url,
                            ClientIpResponse,
                            "Client IP lookup",
                            expect_json: ClientIp
                        ),
                        None => process_transaction(model, FALLBACK_CLIENT_IP.to_string()),
                    }
                }

                PaymentEvent::AttestResponse(Ok(_)) => {
                    complete_locally(model, "No transaction token returned from attestation")
                }

                PaymentEvent::AttestResponse(Err(e)) | PaymentEvent::ProcessResponse(Err(e)) => {
                    complete_locally(model, &e)
                }

                PaymentEvent::ClientIpResponse(result) => {
                    let ip = result.map(|c| c.ip).unwrap_or_else(|e| {
                        warn!("failed to fetch public IP, using fallback: {e}");
                        FALLBACK_CLIENT_IP.to_string()
                    });
                    process_transaction(model, ip)
                }

                PaymentEvent::ProcessResponse(Ok(result)) => {
                    info!("transaction processed successfully: {:?}", result.details);
                    let local = model
                        .transaction
                        .take()
                        .and_then(|t| t.local_cryptogram)
                        .unwrap_or_default();

                    model.cryptogram = result
                        .cryptogram
                        .filter(|c| !c.is_empty())
                        .unwrap_or(local);
                    model.transition(TerminalState::Success, "Transaction Approved");
                    render()
                }

                PaymentEvent::KeyPress { .. }
                | PaymentEvent::Clear
                | PaymentEvent::Pay { .. }
                | PaymentEvent::NewTransaction => Command::done(),
            }
        }
    }
}

fn start_payment(model: &mut Model, requested_at: String) -> Command<Effect, Event> {
    if model.state != TerminalState::Ready {
        return Command::done();
    }

    if let Some(kernel) = &model.pending_kernel {
        warn!("ignoring PAY while kernel {} is loading", kernel.version);
        return Command::done();
    }

    let amount_minor = match emv::amount_to_minor_units(&model.amount) {
        Ok(0) => return Command::done(),
        Ok(amount) => amount,
        Err(e) => {
            debug!("ignoring PAY: {e}");
            return Command::done();
        }
    };

    info!("processing transaction: {} ({amount_minor} minor units)", model.amount);
    model.cryptogram.clear();
    model.transaction = Some(Transaction {
        amount_minor,
        requested_at,
        ..Default::default()
    });
    model.transition(TerminalState::Processing, "Processing Transaction...");

    Command::all([render(), kernel_step(model, EmvStep::SelectPpse)])
}

fn kernel_step_completed(model: &mut Model, output: KernelOutput) -> Command<Effect, Event> {
    let json = match output {
        KernelOutput::Response { json } => json,
        KernelOutput::Error { message } => {
            model.fail_transaction(&format!("kernel processing error: {message}"));
            return render();
        }
        KernelOutput::Loaded { version } => {
            model.fail_transaction(&format!("unexpected kernel load of {version}"));
            return render();
        }
    };

    let Some(step) = model.transaction.as_ref().map(|t| t.step) else {
        return Command::done();
    };
    debug!("kernel {step:?} result: {json}");

    if step == EmvStep::SelectPpse {
        let aid = emv::extract_aid(&json).unwrap_or_else(|| emv::DEFAULT_AID.to_string());
        if let Some(transaction) = model.transaction.as_mut() {
            transaction.aid = Some(aid);
        }
    }

    if let Some(next) = step.next() {
        return kernel_step(model, next);
    }

    let Some(cryptogram) = emv::extract_cryptogram(&json) else {
        model.fail_transaction("kernel returned no cryptogram");
        return render();
    };

    info!("generated cryptogram: {cryptogram}");
    if let Some(transaction) = model.transaction.as_mut() {
        transaction.local_cryptogram = Some(cryptogram);
    }
    model.transition(TerminalState::Processing, "Processing with Backend...");
    Command::all([render(), attest(model)])
}

/// Ask the kernel to perform `step` of the current transaction
fn kernel_step(model: &mut Model, step: EmvStep) -> Command<Effect, Event> {
    let Some(transaction) = model.transaction.as_mut() else {
        return Command::done();
    };
    transaction.step = step;
    let amount_minor = transaction.amount_minor;
    let aid = transaction
        .aid
        .clone()
        .unwrap_or_else(|| emv::DEFAULT_AID.to_string());

    let request = match step {
        EmvStep::SelectPpse => KernelCmd::select_ppse(),
        EmvStep::SelectApplication => KernelCmd::select_application(aid),
        EmvStep::GetProcessingOptions => KernelCmd::get_processing_options(emv::EMPTY_PDOL),
        EmvStep::ReadRecord => KernelCmd::read_record(1, 1),
        EmvStep::GenerateAc => match emv::build_cdol1(
            amount_minor,
            &model.config.country_code,
            &model.config.transaction_currency,
            emv::TRANSACTION_TYPE_PURCHASE,
        ) {
            Ok(cdol) => KernelCmd::generate_ac(AcType::Tc, cdol),
            Err(e) => {
                model.fail_transaction(&e);
                return render();
            }
        },
    };

    request
        .build()
        .then_send(|output| Event::Payment(PaymentEvent::KernelStepCompleted(output)))
}

fn attest(model: &Model) -> Command<Effect, Event> {
    let amount = model
        .transaction
        .as_ref()
        .map_or(0, |transaction| transaction.amount_minor);

    let request = AttestRequest {
        device_id: model.transaction_device_id(),
        amount,
        currency: model.config.transaction_currency.clone(),
        card_number: test_card::NUMBER.to_string(),
        expiry_date: test_card::EXPIRY.to_string(),
        cvv: test_card::CVV.to_string(),
        cardholder_name: test_card::HOLDER.to_string(),
        latitude: model.config.latitude,
        longitude: model.config.longitude,
        health_check: HealthCheck::default(),
    };

    backend_post!(
        Payment,
        PaymentEvent,
        api::attest_url(&model.config.backend_url),
        AttestResponse,
        "Transaction attestation",
        body_json: &request,
        expect_json: AttestResult
    )
}

fn process_transaction(model: &mut Model, client_ip: String) -> Command<Effect, Event> {
    let Some(transaction) = model.transaction.as_ref() else {
        return Command::done();
    };
    info!("completing transaction with token");

    let request = ProcessRequest {
        device_id: model.transaction_device_id(),
        transaction_type: "PAYMENT".to_string(),
        amount: transaction.amount_minor,
        currency: model.config.transaction_currency.clone(),
        encrypted_pin_block: "DUMMY_PIN_BLOCK".to_string(),
        ksn: "DUMMY_KSN".to_string(),
        card_number_masked: test_card::NUMBER_MASKED.to_string(),
        transaction_token: transaction.transaction_token.clone().unwrap_or_default(),
        latitude: model.config.latitude,
        longitude: model.config.longitude,
        location_accuracy: 10.0,
        location_timestamp: transaction.requested_at.clone(),
        client_ip,
    };

    backend_post!(
        Payment,
        PaymentEvent,
        api::process_url(&model.config.backend_url),
        ProcessResponse,
        "Transaction processing",
        body_json: &request,
        expect_json: ProcessResult
    )
}

/// The backend could not approve the payment; attest the kernel cryptogram locally
fn complete_locally(model: &mut Model, reason: &str) -> Command<Effect, Event> {
    error!("backend transaction failed: {reason}");

    let local = model
        .transaction
        .take()
        .and_then(|transaction| transaction.local_cryptogram)
        .filter(|cryptogram| !cryptogram.is_empty());

    match local {
        Some(cryptogram) => {
            info!("attested cryptogram locally: {cryptogram}");
            model.cryptogram = cryptogram;
            model.transition(TerminalState::Success, "Transaction Approved (Local)");
        }
        None => model.fail_transaction("local attestation failed: no cryptogram"),
    }

    render()
}
