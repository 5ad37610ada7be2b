//! Load balancer rules

use super::{parse, parse_list};
use crate::api::{ApiClient, Options};
use crate::error::Result;
use crate::services::{EntityApi, EntityContext, EntityService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const LOAD_BALANCER_RULE_ENTITY_TYPE: &str = "loadbalancerrules";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadBalancerRule {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instance_ids: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub network_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub public_ip: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub public_ip_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub public_port: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub private_port: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub protocol: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub algorithm: String,
}

#[derive(Clone)]
pub struct LoadBalancerRuleService {
    entity_service: Arc<dyn EntityService>,
}

impl LoadBalancerRuleService {
    pub fn new(api_client: Arc<dyn ApiClient>, service_code: &str, environment_name: &str) -> Self {
        let context =
            EntityContext::new(service_code, environment_name, LOAD_BALANCER_RULE_ENTITY_TYPE);
        Self::with_entity_service(Arc::new(EntityApi::new(api_client, context)))
    }

    pub fn with_entity_service(entity_service: Arc<dyn EntityService>) -> Self {
        Self { entity_service }
    }

    pub async fn get(&self, id: &str) -> Result<LoadBalancerRule> {
        let data = self.entity_service.get(id, &Options::new()).await?;
        parse(&data)
    }

    pub async fn list(&self) -> Result<Vec<LoadBalancerRule>> {
        self.list_with_options(&Options::new()).await
    }

    pub async fn list_with_options(&self, options: &Options) -> Result<Vec<LoadBalancerRule>> {
        let data = self.entity_service.list(options).await?;
        parse_list(&data)
    }

    pub async fn create(&self, rule: &LoadBalancerRule) -> Result<LoadBalancerRule> {
        let body = serde_json::to_vec(rule)?;
        let data = self.entity_service.create(body, &Options::new()).await?;
        parse(&data)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.entity_service.delete(id, Vec::new(), &Options::new()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiErrorResponse, Error};
    use crate::resources::mock::MockEntityService;

    fn service(mock: MockEntityService) -> (Arc<MockEntityService>, LoadBalancerRuleService) {
        let mock = Arc::new(mock);
        (mock.clone(), LoadBalancerRuleService::with_entity_service(mock))
    }

    #[tokio::test]
    async fn test_get_rule() {
        let body = br#"{"id":"lbr-1","name":"web","instanceIds":["i-1","i-2"],"publicPort":"80","privatePort":"8080","protocol":"TCP","algorithm":"roundrobin"}"#;
        let (mock, service) = service(MockEntityService::returning(Ok(body.to_vec())));

        let rule = service.get("lbr-1").await.unwrap();

        assert_eq!(rule.instance_ids, vec!["i-1", "i-2"]);
        assert_eq!(rule.private_port, "8080");
        assert_eq!(mock.calls()[0].id.as_deref(), Some("lbr-1"));
    }

    #[tokio::test]
    async fn test_empty_list_body_is_empty_list() {
        let (_, service) = service(MockEntityService::returning(Ok(Vec::new())));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_omits_empty_fields() {
        let (mock, service) =
            service(MockEntityService::returning(Ok(br#"{"id":"lbr-9","name":"web"}"#.to_vec())));

        let created = service
            .create(&LoadBalancerRule {
                name: "web".into(),
                public_ip_id: "ip-1".into(),
                ..LoadBalancerRule::default()
            })
            .await
            .unwrap();

        assert_eq!(created.id, "lbr-9");
        assert_eq!(
            mock.calls()[0].body,
            br#"{"name":"web","publicIpId":"ip-1"}"#.to_vec()
        );
    }

    #[tokio::test]
    async fn test_delete_passes_error_through() {
        let (_, service) = service(MockEntityService::returning(Err(
            ApiErrorResponse::new(409, Vec::new()).into(),
        )));

        assert!(matches!(
            service.delete("lbr-1").await,
            Err(Error::Api(ApiErrorResponse { status_code: 409, .. }))
        ));
    }
}
