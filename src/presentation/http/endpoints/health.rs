use std::collections::BTreeMap;
use std::sync::Arc;

use poem_openapi::{ApiResponse, OpenApi, payload::Json};
use tracing::warn;

use crate::{
    application::services::health::HealthProbe,
    presentation::http::{endpoints::root::EndpointsTags, responses::HealthDto},
};

#[derive(ApiResponse)]
pub enum HealthResponse {
    #[oai(status = 200)]
    Healthy(Json<HealthDto>),
    #[oai(status = 503)]
    Unhealthy(Json<HealthDto>),
}

#[derive(Clone)]
pub struct HealthEndpoints {
    database: Arc<dyn HealthProbe>,
    queue: Arc<dyn HealthProbe>,
}

impl HealthEndpoints {
    pub fn new(database: Arc<dyn HealthProbe>, queue: Arc<dyn HealthProbe>) -> Self {
        Self { database, queue }
    }
}

#[OpenApi]
impl HealthEndpoints {
    #[oai(path = "/v1/health", method = "get", tag = EndpointsTags::Health)]
    pub async fn health(&self) -> HealthResponse {
        let mut errors = BTreeMap::new();
        if !self.database.is_healthy().await {
            errors.insert(
                "database".to_string(),
                vec!["Database is unhealthy".to_string()],
            );
        }
        if !self.queue.is_healthy().await {
            errors.insert(
                "queue".to_string(),
                vec!["Message Queue is unhealthy".to_string()],
            );
        }

        if errors.is_empty() {
            HealthResponse::Healthy(Json(HealthDto { errors }))
        } else {
            warn!(unhealthy = ?errors.keys().collect::<Vec<_>>(), "health check failed");
            HealthResponse::Unhealthy(Json(HealthDto { errors }))
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct Fixed(bool);

    #[async_trait]
    impl HealthProbe for Fixed {
        async fn is_healthy(&self) -> bool {
            self.0
        }
    }

    fn endpoints(database: bool, queue: bool) -> HealthEndpoints {
        HealthEndpoints::new(Arc::new(Fixed(database)), Arc::new(Fixed(queue)))
    }

    #[tokio::test]
    async fn healthy_when_every_dependency_is_up() {
        match endpoints(true, true).health().await {
            HealthResponse::Healthy(Json(dto)) => assert!(dto.errors.is_empty()),
            HealthResponse::Unhealthy(_) => panic!("expected healthy response"),
        }
    }

    #[tokio::test]
    async fn reports_only_the_failing_dependency() {
        match endpoints(true, false).health().await {
            HealthResponse::Unhealthy(Json(dto)) => {
                assert_eq!(dto.errors.len(), 1);
                assert_eq!(
                    dto.errors.get("queue"),
                    Some(&vec!["Message Queue is unhealthy".to_string()])
                );
            }
            HealthResponse::Healthy(_) => panic!("expected unhealthy response"),
        }

        match endpoints(false, false).health().await {
            HealthResponse::Unhealthy(Json(dto)) => {
                assert_eq!(
                    dto.errors.keys().map(String::as_str).collect::<Vec<_>>(),
                    vec!["database", "queue"]
                );
            }
            HealthResponse::Healthy(_) => panic!("expected unhealthy response"),
        }
    }
}
