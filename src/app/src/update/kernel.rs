use crux_core::{render::render, Command};
use log::{info, warn};

use crate::api;
use crate::commands::kernel::KernelOutput;
use crate::events::{Event, KernelEvent};
use crate::model::Model;
use crate::types::*;
use crate::{backend_get, Effect, KernelCmd};

/// Handle kernel listing, version switching and health checks
pub fn handle(event: KernelEvent, model: &mut Model) -> Command<Effect, Event> {
    match event {
        KernelEvent::ListKernels => {
            model.start_loading();
            Command::all([
                render(),
                backend_get!(
                    Kernel,
                    KernelEvent,
                    api::kernels_url(&model.config.backend_url),
                    KernelListResponse,
                    "Fetch kernels",
                    expect_json: Vec<KernelVersion>
                ),
            ])
        }

        KernelEvent::KernelListResponse(Ok(kernels)) => {
            info!("backend offers {} kernel versions", kernels.len());
            model.stop_loading();
            model.available_kernels = kernels;
            render()
        }

        KernelEvent::LoadVersion { version } => {
            if !matches!(model.state, TerminalState::Ready | TerminalState::Error) {
                warn!("cannot switch kernel while {:?}", model.state);
                return Command::done();
            }

            let known = model
                .available_kernels
                .iter()
                .find(|kernel| kernel.version == version)
                .cloned();

            info!("switching to kernel {version}");
            let url = api::kernel_download_url(&model.config.backend_url, &version);
            model.pending_kernel = Some(known.unwrap_or(KernelVersion {
                version,
                ..Default::default()
            }));
            model.start_loading();

            Command::all([
                render(),
                backend_get!(
                    Kernel,
                    KernelEvent,
                    url,
                    VersionDownloadResponse,
                    "Kernel download",
                    expect_bytes
                ),
            ])
        }

        KernelEvent::VersionDownloadResponse(Ok(module)) => {
            let Some(kernel) = model.pending_kernel.clone() else {
                return Command::done();
            };

            let expected_hash = (!kernel.file_hash.is_empty()).then_some(kernel.file_hash);
            KernelCmd::load(
                kernel.version,
                module,
                expected_hash,
                model.config.country_code.clone(),
                model.config.kernel_currency.clone(),
            )
            .build()
            .then_send(|output| Event::Kernel(KernelEvent::VersionLoaded(output)))
        }

        KernelEvent::VersionLoaded(KernelOutput::Loaded { version }) => {
            info!("kernel {version} loaded successfully");
            model.pending_kernel = None;
            model.kernel_loaded = true;
            model.kernel_version = Some(version);
            model.stop_loading();
            render()
        }

        KernelEvent::VersionLoaded(output) => {
            model.pending_kernel = None;
            let message = match output {
                KernelOutput::Error { message } => message,
                other => format!("unexpected kernel output {other:?}"),
            };
            model.set_error_and_render(format!("Kernel load failed: {message}"))
        }

        KernelEvent::CheckHealth => match model.config.kernel_service_url.clone() {
            Some(service_url) => backend_get!(
                Kernel,
                KernelEvent,
                api::health_url(&service_url),
                HealthCheckResponse,
                "Health check",
                expect_json: HealthResponse
            ),
            None => {
                info!("no kernel service configured, skipping health check");
                Command::done()
            }
        },

        KernelEvent::HealthCheckResponse(Ok(health)) => {
            info!("kernel service health: {}", health.status);
            update_health(model, Some(health))
        }

        KernelEvent::HealthCheckResponse(Err(e)) => {
            warn!("kernel service health check failed: {e}");
            update_health(model, None)
        }

        KernelEvent::KernelListResponse(Err(e)) | KernelEvent::VersionDownloadResponse(Err(e)) => {
            model.pending_kernel = None;
            model.set_error_and_render(e)
        }
    }
}

fn update_health(model: &mut Model, health: Option<HealthResponse>) -> Command<Effect, Event> {
    crate::update_field!(model.health, health)
}
