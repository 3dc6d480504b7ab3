use crate::{
    config::ShellConfig,
    http_client::{Transport, into_http_result},
    kernel_host::KernelHost,
    storage::FileStore,
};
use anyhow::{Context, Result};
use crux_core::Core;
use log::debug;
use softpos_demo_core::{
    App, Effect, Event, KernelEvent, PaymentEvent, TerminalConfig, TerminalView,
};
use std::collections::VecDeque;

type Renderer = Box<dyn FnMut(&TerminalView)>;

/// Drives the core and performs the effects it requests
pub struct Shell<T> {
    core: Core<App>,
    transport: T,
    kernel: KernelHost,
    store: FileStore,
    renderer: Option<Renderer>,
}

impl<T: Transport> Shell<T> {
    pub fn new(config: &ShellConfig, transport: T) -> Self {
        Self {
            core: Core::new(),
            transport,
            kernel: KernelHost::new(config.shell.mock_kernel_path.clone()),
            store: FileStore::new(config.shell.storage_path()),
            renderer: None,
        }
    }

    /// Call `renderer` with the view whenever the core asks for a render
    pub fn with_renderer(mut self, renderer: impl FnMut(&TerminalView) + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn view(&self) -> TerminalView {
        self.core.view()
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Process `event` and every effect following from it
    ///
    /// Returns once the core has nothing left to ask for.
    pub async fn dispatch(&mut self, event: Event) -> Result<TerminalView> {
        let mut queue: VecDeque<Effect> = self.core.process_event(event).into();

        while let Some(effect) = queue.pop_front() {
            let effects = match effect {
                Effect::Render(_) => {
                    self.render();
                    continue;
                }
                Effect::Http(mut request) => {
                    let result = self.transport.execute(request.operation.clone()).await;
                    self.core
                        .resolve(&mut request, into_http_result(result))
                        .context("failed to resolve HTTP request")?
                }
                Effect::Kernel(mut request) => {
                    let output = self.kernel.execute(request.operation.clone()).await;
                    self.core
                        .resolve(&mut request, output)
                        .context("failed to resolve kernel request")?
                }
                Effect::Storage(mut request) => {
                    let output = self.store.execute(request.operation.clone()).await;
                    self.core
                        .resolve(&mut request, output)
                        .context("failed to resolve storage request")?
                }
            };

            debug!("{} follow-up effects", effects.len());
            queue.extend(effects);
        }

        Ok(self.view())
    }

    /// Run the boot sequence with `config`
    pub async fn boot(&mut self, config: TerminalConfig) -> Result<TerminalView> {
        self.dispatch(Event::Initialize { config }).await
    }

    pub async fn press(&mut self, key: char) -> Result<TerminalView> {
        self.dispatch(Event::Payment(PaymentEvent::KeyPress { key }))
            .await
    }

    /// Type `amount` on the keypad, one key at a time
    pub async fn enter_amount(&mut self, amount: &str) -> Result<TerminalView> {
        for key in amount.chars() {
            self.press(key).await?;
        }
        Ok(self.view())
    }

    pub async fn clear(&mut self) -> Result<TerminalView> {
        self.dispatch(Event::Payment(PaymentEvent::Clear)).await
    }

    /// Press PAY, stamped with the current time
    pub async fn pay(&mut self) -> Result<TerminalView> {
        let requested_at = chrono::Utc::now().to_rfc3339();
        self.dispatch(Event::Payment(PaymentEvent::Pay { requested_at }))
            .await
    }

    pub async fn new_transaction(&mut self) -> Result<TerminalView> {
        self.dispatch(Event::Payment(PaymentEvent::NewTransaction))
            .await
    }

    pub async fn list_kernels(&mut self) -> Result<TerminalView> {
        self.dispatch(Event::Kernel(KernelEvent::ListKernels)).await
    }

    pub async fn load_kernel(&mut self, version: String) -> Result<TerminalView> {
        self.dispatch(Event::Kernel(KernelEvent::LoadVersion { version }))
            .await
    }

    pub async fn check_health(&mut self) -> Result<TerminalView> {
        self.dispatch(Event::Kernel(KernelEvent::CheckHealth)).await
    }

    fn render(&mut self) {
        if let Some(renderer) = self.renderer.as_mut() {
            let view = self.core.view();
            renderer(&view);
        }
    }
}
