//! Baremetal servers

use super::{exists_from, parse, parse_list};
use crate::api::{ApiClient, Options};
use crate::error::Result;
use crate::services::{EntityApi, EntityContext, EntityService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const BAREMETAL_ENTITY_TYPE: &str = "baremetals";

pub const BAREMETAL_START_OPERATION: &str = "start";
pub const BAREMETAL_STOP_OPERATION: &str = "stop";
pub const BAREMETAL_REBOOT_OPERATION: &str = "reboot";
pub const BAREMETAL_RECOVER_OPERATION: &str = "recover";
pub const BAREMETAL_PURGE_OPERATION: &str = "purge";
pub const BAREMETAL_ASSOCIATE_SSH_KEY_OPERATION: &str = "associateSSHKey";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Baremetal {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub template_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub template_name: String,
    pub is_password_enabled: bool,
    pub is_ssh_key_enabled: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    /// Only returned once, by create
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub compute_offering_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub compute_offering_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub zone_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub zone_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub network_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub network_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vpc_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vpc_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mac_address: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ip_address: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub volume_id_to_attach: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub public_key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SshKeyAssociation<'a> {
    ssh_key_name: &'a str,
}

#[derive(Clone)]
pub struct BaremetalService {
    entity_service: Arc<dyn EntityService>,
}

impl BaremetalService {
    pub fn new(api_client: Arc<dyn ApiClient>, service_code: &str, environment_name: &str) -> Self {
        let context = EntityContext::new(service_code, environment_name, BAREMETAL_ENTITY_TYPE);
        Self::with_entity_service(Arc::new(EntityApi::new(api_client, context)))
    }

    pub fn with_entity_service(entity_service: Arc<dyn EntityService>) -> Self {
        Self { entity_service }
    }

    pub async fn get(&self, id: &str) -> Result<Baremetal> {
        let data = self.entity_service.get(id, &Options::new()).await?;
        parse(&data)
    }

    pub async fn list(&self) -> Result<Vec<Baremetal>> {
        self.list_with_options(&Options::new()).await
    }

    pub async fn list_with_options(&self, options: &Options) -> Result<Vec<Baremetal>> {
        let data = self.entity_service.list(options).await?;
        parse_list(&data)
    }

    /// Create a server. The returned value carries the generated password.
    pub async fn create(&self, baremetal: &Baremetal) -> Result<Baremetal> {
        let body = serde_json::to_vec(baremetal)?;
        let data = self.entity_service.create(body, &Options::new()).await?;
        parse(&data)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.entity_service.delete(id, Vec::new(), &Options::new()).await?;
        Ok(())
    }

    pub async fn exists(&self, id: &str) -> Result<bool> {
        exists_from(self.entity_service.get(id, &Options::new()).await)
    }

    async fn run(&self, id: &str, operation: &str, body: Vec<u8>) -> Result<()> {
        self.entity_service
            .execute(id, operation, body, &Options::new())
            .await?;
        Ok(())
    }

    pub async fn start(&self, id: &str) -> Result<()> {
        self.run(id, BAREMETAL_START_OPERATION, Vec::new()).await
    }

    pub async fn stop(&self, id: &str) -> Result<()> {
        self.run(id, BAREMETAL_STOP_OPERATION, Vec::new()).await
    }

    pub async fn reboot(&self, id: &str) -> Result<()> {
        self.run(id, BAREMETAL_REBOOT_OPERATION, Vec::new()).await
    }

    pub async fn recover(&self, id: &str) -> Result<()> {
        self.run(id, BAREMETAL_RECOVER_OPERATION, Vec::new()).await
    }

    /// Permanently remove the server
    pub async fn destroy(&self, id: &str) -> Result<()> {
        self.run(id, BAREMETAL_PURGE_OPERATION, Vec::new()).await
    }

    pub async fn associate_ssh_key(&self, id: &str, ssh_key_name: &str) -> Result<()> {
        let body = serde_json::to_vec(&SshKeyAssociation { ssh_key_name })?;
        self.run(id, BAREMETAL_ASSOCIATE_SSH_KEY_OPERATION, body).await
    }
}
