//! Geoportal Server catalog destination.

mod adaptor;
mod broker;
mod client;

pub use adaptor::{Credentials, GptDefinition};
pub use broker::GptBroker;
pub use client::{CatalogClient, PublishRequest};

use std::time::Duration;

use crate::error::InvalidDefinition;
use crate::model::EntityDefinition;
use crate::template::{message, Argument, UiTemplate};
use crate::traits::{Connector, OutputBroker, OutputConnector};

pub const TYPE: &str = "GPT";

pub const P_HOST_URL: &str = "gpt-host-url";
pub const P_USER_NAME: &str = "cred-username";
pub const P_USER_PASSWORD: &str = "cred-password";
pub const P_INDEX: &str = "gpt-index";

/// Request timeout of the catalog client.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Connector building [`GptBroker`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct GptConnector;

impl GptConnector {
    /// Typed variant of [`OutputConnector::create_broker`].
    ///
    /// The HTTP client is built here, so client configuration problems
    /// surface before the first record is published.
    pub fn create(&self, definition: &EntityDefinition) -> Result<GptBroker, InvalidDefinition> {
        let definition = GptDefinition::new(definition)?;
        let client = CatalogClient::new(
            definition.host_url().clone(),
            definition.credentials().cloned(),
            definition.index().map(str::to_string),
            REQUEST_TIMEOUT,
        )
        .map_err(|e| InvalidDefinition::new(TYPE, P_HOST_URL, format!("cannot build client: {}", e)))?;
        Ok(GptBroker::new(definition, client))
    }
}

impl Connector for GptConnector {
    fn connector_type(&self) -> &str {
        TYPE
    }

    fn template(&self, locale: &str) -> UiTemplate {
        let arguments = vec![
            Argument::new(P_HOST_URL, message(locale, "gpt.hostUrl")).required(),
            Argument::new(P_USER_NAME, message(locale, "gpt.userName")),
            Argument::new(P_USER_PASSWORD, message(locale, "gpt.userPassword")).password(),
            Argument::new(P_INDEX, message(locale, "gpt.index")),
        ];
        UiTemplate::new(TYPE, message(locale, "gpt"), arguments)
    }
}

impl OutputConnector for GptConnector {
    fn create_broker(
        &self,
        definition: &EntityDefinition,
    ) -> Result<Box<dyn OutputBroker>, InvalidDefinition> {
        Ok(Box::new(self.create(definition)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Broker;

    #[test]
    fn test_template_marks_password() {
        let template = GptConnector.template("en");
        assert_eq!(template.label, "Geoportal Server New Generation");
        assert!(template.argument(P_HOST_URL).unwrap().required);
        assert!(template.argument(P_USER_PASSWORD).unwrap().password);
        assert!(!template.argument(P_USER_NAME).unwrap().password);
    }

    #[test]
    fn test_create_broker_exposes_configuration() {
        let def = EntityDefinition::new(TYPE, "catalog")
            .with_property(P_HOST_URL, "https://catalog.example.org/geoportal/")
            .with_property(P_USER_NAME, "harvester")
            .with_property(P_USER_PASSWORD, "s3cret");
        let broker = GptConnector.create(&def).unwrap();

        assert_eq!(
            broker.definition().host_url().as_str(),
            "https://catalog.example.org/geoportal/"
        );
        let credentials = broker.definition().credentials().unwrap();
        assert_eq!(credentials.username, "harvester");
        assert_eq!(credentials.password.as_deref(), Some("s3cret"));
        assert_eq!(
            broker.broker_uri().as_str(),
            "GPT:https://catalog.example.org/geoportal/"
        );
        assert_eq!(broker.entity_definition(), &def);
    }

    #[test]
    fn test_create_broker_missing_url() {
        let def = EntityDefinition::new(TYPE, "catalog").with_property(P_USER_NAME, "harvester");
        let err = GptConnector.create_broker(&def).err().unwrap();
        assert_eq!(err.key, P_HOST_URL);
        assert_eq!(err.connector, TYPE);
    }
}
