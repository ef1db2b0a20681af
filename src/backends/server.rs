// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A managed HTTP listener.
//!
//! Apply binds the listener before touching the running one, so a failed
//! bind leaves the previous listener serving. Only when the new address is
//! held by this very server is the old listener stopped first; if the
//! rebind then fails, the previous address is bound again.
//!
//! Serving happens on a background task bound to a child of the process
//! shutdown token, never to the request that triggered Apply. Destroy
//! cancels that token and waits for the task, at most `timeout.shutdown`.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;

use crate::backends::Dispatch;
use crate::errors::{Error, LifecycleError, ReferenceError, Result};
use crate::instance::{Context, InstanceCore, Plan, ValidatedConfig};
use crate::observability::messages::http::{ServerListening, ServerShutdownProblem, ServerStopped};
use crate::observability::messages::StructuredLog;
use crate::schema::{Attribute, Configuration, SchemaBuilder};
use crate::state::State;
use crate::traits::{HttpServer, InstanceRef, Resolver, Resource, ResourceInstance};

#[derive(Debug, Clone, Default)]
pub struct Timeouts {
    pub request: Duration,
    pub shutdown: Duration,
}

impl Configuration for Timeouts {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .field("request", |c| &c.request, |c| &mut c.request)
            .default("0s")
            .help("Per-request deadline; 0s disables");
        schema
            .field("shutdown", |c| &c.shutdown, |c| &mut c.shutdown)
            .default("5s")
            .help("How long Destroy waits for in-flight requests");
    }
}

#[derive(Clone, Default)]
pub struct ServerConfig {
    pub listen: String,
    pub router: Option<InstanceRef>,
    pub timeout: Timeouts,
    pub endpoint: String,
}

impl Configuration for ServerConfig {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .field("listen", |c| &c.listen, |c| &mut c.listen)
            .required()
            .help("host:port to bind; port 0 picks a free one");
        schema
            .reference("router", |c| &c.router, |c| &mut c.router)
            .required()
            .target("router");
        schema.embed("timeout.", |c| &c.timeout, |c| &mut c.timeout);
        schema
            .field("endpoint", |c| &c.endpoint, |c| &mut c.endpoint)
            .read_only()
            .help("URL of the bound listener");
    }
}

pub struct ServerResource;

impl Resource for ServerResource {
    fn name(&self) -> &str {
        "server"
    }

    fn schema(&self) -> Vec<Attribute> {
        ServerConfig::schema().attributes()
    }

    fn new_instance(self: Arc<Self>, name: &str) -> InstanceRef {
        Arc::new(ServerInstance {
            core: InstanceCore::new(name, self),
            running: tokio::sync::Mutex::new(None),
            endpoint: RwLock::new(None),
        })
    }
}

struct Running {
    addr: SocketAddr,
    endpoint: String,
    grace: Duration,
    token: CancellationToken,
    task: JoinHandle<()>,
}

pub struct ServerInstance {
    core: InstanceCore<ServerConfig>,
    running: tokio::sync::Mutex<Option<Running>>,
    endpoint: RwLock<Option<String>>,
}

impl ServerInstance {
    fn start(&self, ctx: &Context, listener: TcpListener, config: &ServerConfig) -> Result<Running> {
        let router = config.router.clone().ok_or_else(|| ReferenceError::NotSet {
            field: "router".to_string(),
        })?;
        let addr = listener.local_addr()?;
        let endpoint = format!("http://{}", addr);

        let mut app = axum::Router::new()
            .fallback_service(Dispatch::new(move || router.as_router().and_then(|r| r.service())));
        if !config.timeout.request.is_zero() {
            app = app.layer(TimeoutLayer::new(config.timeout.request));
        }

        let token = ctx.child_token();
        let shutdown = token.clone();
        let name = self.name().to_string();
        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await;
            if let Err(e) = served {
                ServerShutdownProblem {
                    instance: &name,
                    detail: &e.to_string(),
                }
                .log();
            }
        });

        ServerListening {
            instance: self.name(),
            endpoint: &endpoint,
        }
        .log();

        Ok(Running {
            addr,
            endpoint,
            grace: config.timeout.shutdown,
            token,
            task,
        })
    }

    async fn stop(&self, running: Running) {
        running.token.cancel();
        let mut task = running.task;
        match tokio::time::timeout(running.grace, &mut task).await {
            Ok(_) => ServerStopped {
                instance: self.name(),
                endpoint: &running.endpoint,
            }
            .log(),
            Err(_) => {
                task.abort();
                let _ = task.await;
                ServerShutdownProblem {
                    instance: self.name(),
                    detail: "shutdown grace period elapsed, connections aborted",
                }
                .log();
            }
        }
    }
}

fn bind_failed(listen: &str, e: std::io::Error) -> Error {
    LifecycleError::Apply {
        reason: format!("cannot listen on {}: {}", listen, e),
    }
    .into()
}

#[async_trait]
impl ResourceInstance for ServerInstance {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn resource(&self) -> Arc<dyn Resource> {
        self.core.resource()
    }

    async fn validate(
        &self,
        _ctx: &Context,
        state: &State,
        resolver: Option<&dyn Resolver>,
    ) -> Result<ValidatedConfig> {
        self.core.validate(state, resolver)
    }

    async fn plan(&self, _ctx: &Context, config: &ValidatedConfig) -> Result<Plan> {
        self.core.plan(config)
    }

    async fn apply(&self, ctx: &Context, config: ValidatedConfig) -> Result<()> {
        let config = self.core.unseal(config)?;
        let mut running = self.running.lock().await;

        let listener = match TcpListener::bind(config.listen.as_str()).await {
            Ok(listener) => listener,
            Err(first) => {
                let Some(previous) = running.take() else {
                    return Err(bind_failed(&config.listen, first));
                };
                let previous_addr = previous.addr;
                self.stop(previous).await;
                match TcpListener::bind(config.listen.as_str()).await {
                    Ok(listener) => listener,
                    Err(e) => {
                        if let Some(current) = self.core.current() {
                            if let Ok(listener) = TcpListener::bind(previous_addr).await {
                                *running = Some(self.start(ctx, listener, &current)?);
                            }
                        }
                        if running.is_none() {
                            self.endpoint.write().take();
                        }
                        return Err(bind_failed(&config.listen, e));
                    }
                }
            }
        };

        let next = self.start(ctx, listener, &config)?;
        *self.endpoint.write() = Some(next.endpoint.clone());
        if let Some(previous) = running.replace(next) {
            self.stop(previous).await;
        }
        self.core.commit(config);
        Ok(())
    }

    async fn read(&self, _ctx: &Context) -> Result<State> {
        let mut state = self.core.read();
        if let Some(endpoint) = self.endpoint.read().clone() {
            state.insert("endpoint", serde_json::Value::String(endpoint));
        }
        Ok(state)
    }

    async fn destroy(&self, _ctx: &Context) -> Result<()> {
        let mut running = self.running.lock().await;
        if let Some(previous) = running.take() {
            self.stop(previous).await;
        }
        self.endpoint.write().take();
        self.core.clear();
        Ok(())
    }

    fn references(&self) -> Vec<String> {
        self.core.references()
    }

    fn as_server(&self) -> Option<&dyn HttpServer> {
        Some(self)
    }
}

impl HttpServer for ServerInstance {
    fn endpoint(&self) -> Option<String> {
        self.endpoint.read().clone()
    }
}
