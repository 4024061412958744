use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::model::{BrokerUri, Content, DataReference, EntityDefinition};
use crate::traits::{Broker, OutputBroker, PublishingStatus};

use super::client::{CatalogClient, PublishRequest};
use super::{GptDefinition, TYPE};

/// Destination broker publishing records into a Geoportal Server catalog.
#[derive(Debug, Clone)]
pub struct GptBroker {
    uri: BrokerUri,
    definition: GptDefinition,
    client: CatalogClient,
}

impl GptBroker {
    pub(crate) fn new(definition: GptDefinition, client: CatalogClient) -> Self {
        Self {
            uri: BrokerUri::new(TYPE, definition.host_url()),
            definition,
            client,
        }
    }

    pub fn definition(&self) -> &GptDefinition {
        &self.definition
    }

    pub fn client(&self) -> &CatalogClient {
        &self.client
    }
}

impl Broker for GptBroker {
    fn broker_uri(&self) -> &BrokerUri {
        &self.uri
    }

    fn connector_type(&self) -> &str {
        TYPE
    }

    fn entity_definition(&self) -> &EntityDefinition {
        self.definition.entity_definition()
    }
}

#[async_trait]
impl OutputBroker for GptBroker {
    async fn publish(
        &self,
        reference: &DataReference,
        content: &Content,
    ) -> Result<PublishingStatus, DeliveryError> {
        let request = PublishRequest::new(reference, content);
        self.client
            .publish(&reference.id, &request)
            .await
            .map_err(|kind| DeliveryError {
                broker: self.uri.clone(),
                record: reference.id.clone(),
                kind,
            })
    }
}
