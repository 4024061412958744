use std::fmt;
use url::Url;

use crate::adaptor::DefinitionAdaptor;
use crate::error::InvalidDefinition;
use crate::model::EntityDefinition;

use super::{P_HOST_URL, P_INDEX, P_USER_NAME, P_USER_PASSWORD, TYPE};

/// Basic credentials for the catalog.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Validated configuration of a catalog destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GptDefinition {
    definition: EntityDefinition,
    host_url: Url,
    credentials: Option<Credentials>,
    index: Option<String>,
}

impl GptDefinition {
    pub fn new(definition: &EntityDefinition) -> Result<Self, InvalidDefinition> {
        let adaptor = DefinitionAdaptor::new(definition, TYPE)?;

        let mut host_url = adaptor.url(P_HOST_URL)?;
        // Relative joins must stay below the configured path
        if !host_url.path().ends_with('/') {
            let path = format!("{}/", host_url.path());
            host_url.set_path(&path);
        }

        let username = adaptor.optional(P_USER_NAME);
        let password = adaptor.optional(P_USER_PASSWORD);
        let credentials = match (username, password) {
            (Some(username), password) => Some(Credentials {
                username: username.to_string(),
                password: password.map(str::to_string),
            }),
            (None, Some(_)) => {
                return Err(adaptor.invalid(P_USER_PASSWORD, "password given without a user name"))
            }
            (None, None) => None,
        };

        Ok(Self {
            definition: definition.clone(),
            host_url,
            credentials,
            index: adaptor.optional(P_INDEX).map(str::to_string),
        })
    }

    pub fn entity_definition(&self) -> &EntityDefinition {
        &self.definition
    }

    /// Catalog base URL, always ending with `/`.
    pub fn host_url(&self) -> &Url {
        &self.host_url
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> EntityDefinition {
        EntityDefinition::new(TYPE, "catalog")
            .with_property(P_HOST_URL, "http://localhost:8080/geoportal")
    }

    #[test]
    fn test_host_url_gets_trailing_slash() {
        let gpt = GptDefinition::new(&definition()).unwrap();
        assert_eq!(gpt.host_url().as_str(), "http://localhost:8080/geoportal/");
        assert!(gpt.credentials().is_none());
        assert!(gpt.index().is_none());
    }

    #[test]
    fn test_username_and_password_kept_apart() {
        let def = definition()
            .with_property(P_USER_NAME, "harvester")
            .with_property(P_USER_PASSWORD, "s3cret");
        let gpt = GptDefinition::new(&def).unwrap();
        let credentials = gpt.credentials().unwrap();
        assert_eq!(credentials.username, "harvester");
        assert_eq!(credentials.password.as_deref(), Some("s3cret"));
        assert!(!format!("{:?}", credentials).contains("s3cret"));
    }

    #[test]
    fn test_password_without_user_rejected() {
        let def = definition().with_property(P_USER_PASSWORD, "s3cret");
        assert_eq!(GptDefinition::new(&def).unwrap_err().key, P_USER_PASSWORD);
    }

    #[test]
    fn test_host_url_required_and_valid() {
        let def = EntityDefinition::new(TYPE, "catalog");
        assert_eq!(GptDefinition::new(&def).unwrap_err().key, P_HOST_URL);

        let def = EntityDefinition::new(TYPE, "catalog").with_property(P_HOST_URL, "not a url");
        assert_eq!(GptDefinition::new(&def).unwrap_err().key, P_HOST_URL);
    }
}
