//! Run coordination across services and workers.
//!
//! For each target service: acquire a client, select operations, then drive
//! the executor under the per-service rate limiter, sequentially or on a
//! bounded worker pool. Service pipelines themselves can run concurrently on
//! a second bounded pool. Every selected operation is attempted to
//! completion; no per-service failure stops the run.

use crate::catalog::CatalogProvider;
use crate::client::ClientFactory;
use crate::config::RunConfig;
use crate::executor::execute_operation;
use crate::limiter::RateLimiter;
use crate::recorder::{InvocationRecord, Recorder};
use crate::selector::select_operations;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct Orchestrator {
    config: RunConfig,
    catalog: Arc<dyn CatalogProvider>,
    clients: Arc<dyn ClientFactory>,
    recorder: Arc<Recorder>,
}

impl Orchestrator {
    pub fn new(
        config: RunConfig,
        catalog: Arc<dyn CatalogProvider>,
        clients: Arc<dyn ClientFactory>,
        recorder: Arc<Recorder>,
    ) -> Self {
        Self {
            config,
            catalog,
            clients,
            recorder,
        }
    }

    /// Run every target service's pipeline, optionally in parallel.
    pub async fn run(&self) {
        let concurrency = self.config.service_concurrency();
        if concurrency <= 1 {
            for service in &self.config.services {
                self.run_service(service).await;
            }
            return;
        }

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut handles = Vec::new();
        for service in self.config.services.clone() {
            let orchestrator = self.clone();
            let semaphore = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                orchestrator.run_service(&service).await;
            }));
        }
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                error!("Service pipeline task panicked: {}", e);
            }
        }
    }

    /// One service's pipeline: client -> selection -> execution.
    async fn run_service(&self, service: &str) {
        info!("Starting simulating events for {}", service.to_uppercase());

        let model = match self.catalog.service_model(service) {
            Ok(model) => Arc::new(model),
            Err(e) => {
                warn!("Skipping {}: {:#}", service, e);
                self.recorder
                    .write(&InvocationRecord::client_init_error(service, e.to_string()));
                return;
            }
        };

        let invoker = match self.clients.client_for(&model).await {
            Ok(invoker) => invoker,
            Err(e) => {
                warn!("Skipping {}: client construction failed: {:#}", service, e);
                self.recorder
                    .write(&InvocationRecord::client_init_error(service, e.to_string()));
                return;
            }
        };

        let ops = select_operations(&model, &self.config.selection_policy());
        if self.config.verbose {
            info!("{}: {} ops selected", service, ops.len());
            for op in &ops {
                info!("  - {}", op);
            }
        }

        let limiter = Arc::new(RateLimiter::new(self.config.rate_per_second));

        if self.config.threads <= 1 {
            for op in &ops {
                limiter.acquire().await;
                info!("  {} executed", op);
                execute_operation(invoker.as_ref(), &model, op, &self.recorder).await;
            }
        } else {
            // Bounded worker pool: one task per operation, held to `threads`
            // concurrent permits. Submission order is the selection order;
            // completion order is not guaranteed.
            let workers = Arc::new(Semaphore::new(self.config.threads));
            let mut handles = Vec::new();
            for op in ops.iter().cloned() {
                let workers = Arc::clone(&workers);
                let limiter = Arc::clone(&limiter);
                let invoker = Arc::clone(&invoker);
                let model = Arc::clone(&model);
                let recorder = Arc::clone(&self.recorder);
                handles.push(tokio::spawn(async move {
                    let _permit = match workers.acquire().await {
                        Ok(permit) => permit,
                        Err(_) => return,
                    };
                    limiter.acquire().await;
                    info!("  {} executed", op);
                    execute_operation(invoker.as_ref(), &model, &op, &recorder).await;
                }));
            }
            for result in futures::future::join_all(handles).await {
                if let Err(e) = result {
                    error!("Worker task panicked: {}", e);
                }
            }
        }

        info!(
            "Finished {}: {} operations attempted",
            service,
            ops.len()
        );
    }
}
