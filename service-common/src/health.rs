use crate::defaults;
use actix_web::{web, App, HttpResponse, HttpServer};
use async_trait::async_trait;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

#[derive(Clone, Debug, Error)]
#[error("health check failed: {0}")]
pub struct HealthCheckError(pub String);

impl HealthCheckError {
    pub fn from<S: ToString>(s: S) -> Self {
        Self(s.to_string())
    }
}

/// A component which can report its health.
#[async_trait]
pub trait HealthChecked: Send + Sync {
    async fn is_ready(&self) -> Result<(), HealthCheckError> {
        Ok(())
    }

    async fn is_alive(&self) -> Result<(), HealthCheckError> {
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct HealthServerConfig {
    #[serde(default = "defaults::health_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "defaults::health_workers")]
    pub workers: usize,
}

impl Default for HealthServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: defaults::health_bind_addr(),
            workers: defaults::health_workers(),
        }
    }
}

/// Internal handling of health checking.
pub struct HealthChecker {
    checks: Vec<Box<dyn HealthChecked>>,
}

impl HealthChecker {
    pub async fn is_ready(&self) -> Vec<Result<(), HealthCheckError>> {
        futures::future::join_all(self.checks.iter().map(|check| check.is_ready())).await
    }

    pub async fn is_alive(&self) -> Vec<Result<(), HealthCheckError>> {
        futures::future::join_all(self.checks.iter().map(|check| check.is_alive())).await
    }
}

/// A server running the health check and metrics endpoints.
pub struct HealthServer {
    config: HealthServerConfig,
    checker: HealthChecker,
    registry: Option<Registry>,
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({}))
}

async fn readiness(checker: web::Data<HealthChecker>) -> HttpResponse {
    let result: Result<Vec<()>, _> = checker.is_ready().await.into_iter().collect();
    match result {
        Ok(_) => HttpResponse::Ok().json(json!({"success": true})),
        Err(_) => HttpResponse::ServiceUnavailable().json(json!({"success": false})),
    }
}

async fn liveness(checker: web::Data<HealthChecker>) -> HttpResponse {
    let result: Result<Vec<()>, _> = checker.is_alive().await.into_iter().collect();
    match result {
        Ok(_) => HttpResponse::Ok().json(json!({"success": true})),
        Err(_) => HttpResponse::ServiceUnavailable().json(json!({"success": false})),
    }
}

async fn metrics(registry: web::Data<Registry>) -> HttpResponse {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&registry.gather(), &mut buffer).is_err() {
        return HttpResponse::InternalServerError().finish();
    }
    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

impl HealthServer {
    pub fn new(
        config: HealthServerConfig,
        checks: Vec<Box<dyn HealthChecked>>,
        registry: Option<Registry>,
    ) -> Self {
        Self {
            config,
            checker: HealthChecker { checks },
            registry,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        log::info!("Health server listening on {}", self.config.bind_addr);

        let checker = web::Data::new(self.checker);
        let registry = self.registry;

        let server = HttpServer::new(move || {
            let mut app = App::new()
                .app_data(checker.clone())
                .route("/", web::get().to(index))
                .route("/readiness", web::get().to(readiness))
                .route("/liveness", web::get().to(liveness));

            if let Some(registry) = &registry {
                app = app
                    .app_data(web::Data::new(registry.clone()))
                    .route("/metrics", web::get().to(metrics));
            }

            app
        })
        .workers(self.config.workers)
        .bind(self.config.bind_addr)?
        .run();

        server.await?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Failing;

    #[async_trait]
    impl HealthChecked for Failing {
        async fn is_ready(&self) -> Result<(), HealthCheckError> {
            Err(HealthCheckError::from("not ready"))
        }
    }

    struct Passing;

    #[async_trait]
    impl HealthChecked for Passing {}

    #[tokio::test]
    async fn ready_aggregates_failures() {
        let checker = HealthChecker {
            checks: vec![Box::new(Passing), Box::new(Failing)],
        };

        let result: Result<Vec<()>, _> = checker.is_ready().await.into_iter().collect();
        assert!(result.is_err());

        // liveness is untouched by the readiness failure
        let result: Result<Vec<()>, _> = checker.is_alive().await.into_iter().collect();
        assert!(result.is_ok());
    }
}
