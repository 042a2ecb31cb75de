//! MongoDB-compatible connector.

use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, Tls, TlsOptions};
use mongodb::{Client, Database};

use crate::config::DatabaseConfig;
use crate::db::connector::{ConnectionError, ConnectionTarget, Connector, Transport};

/// Connects with the official driver and verifies the server with `ping`.
#[derive(Debug, Clone)]
pub struct MongoConnector {
    default_database: String,
    app_name: String,
    server_selection_timeout: Duration,
}

impl MongoConnector {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            default_database: config.default_database.clone(),
            app_name: config.app_name.clone(),
            server_selection_timeout: Duration::from_secs(config.server_selection_timeout_secs),
        }
    }

    async fn client_options(&self, target: &ConnectionTarget) -> Result<ClientOptions, ConnectionError> {
        let mut options = ClientOptions::parse(&target.uri)
            .await
            .map_err(|e| ConnectionError::Configuration(e.to_string()))?;

        if let Transport::Tls { ca_file } = &target.transport {
            if !ca_file.exists() {
                return Err(ConnectionError::Configuration(format!(
                    "CA bundle {} not found",
                    ca_file.display()
                )));
            }
            let tls = TlsOptions::builder().ca_file_path(ca_file.clone()).build();
            options.tls = Some(Tls::Enabled(tls));
        }

        if options.app_name.is_none() {
            options.app_name = Some(self.app_name.clone());
        }
        options.server_selection_timeout = Some(self.server_selection_timeout);
        Ok(options)
    }
}

#[async_trait]
impl Connector for MongoConnector {
    type Handle = Database;

    async fn connect(&self, target: &ConnectionTarget) -> Result<Database, ConnectionError> {
        let options = self.client_options(target).await?;
        let client = Client::with_options(options)?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(&self.default_database));

        // The driver connects lazily; ping so failures surface here.
        database.run_command(doc! { "ping": 1 }).await?;

        tracing::debug!(database = %database.name(), "Database ping succeeded");
        Ok(database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn connector() -> MongoConnector {
        MongoConnector::new(&DatabaseConfig::default())
    }

    #[tokio::test]
    async fn test_plaintext_options() {
        let target = ConnectionTarget::new("mongodb://localhost:27017/todo", Transport::Plaintext);
        let options = connector().client_options(&target).await.unwrap();
        assert!(options.tls.is_none());
        assert_eq!(options.app_name.as_deref(), Some("todo-stack"));
        assert_eq!(options.server_selection_timeout, Some(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn test_tls_options_use_ca_bundle() {
        let ca = tempfile::NamedTempFile::new().unwrap();
        let target = ConnectionTarget::new(
            "mongodb://localhost:27017/todo?ssl=true",
            Transport::Tls {
                ca_file: ca.path().to_path_buf(),
            },
        );
        let options = connector().client_options(&target).await.unwrap();
        match options.tls {
            Some(Tls::Enabled(tls)) => {
                assert_eq!(tls.ca_file_path, Some(ca.path().to_path_buf()));
            }
            other => panic!("expected TLS to be enabled, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_ca_bundle_is_configuration_error() {
        let target = ConnectionTarget::new(
            "mongodb://localhost:27017/todo?ssl=true",
            Transport::Tls {
                ca_file: PathBuf::from("/nonexistent/ca-bundle.pem"),
            },
        );
        let err = connector().connect(&target).await.unwrap_err();
        assert!(matches!(err, ConnectionError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_invalid_uri_is_configuration_error() {
        let target = ConnectionTarget::new("postgres://localhost/todo", Transport::Plaintext);
        let err = connector().connect(&target).await.unwrap_err();
        assert!(matches!(err, ConnectionError::Configuration(_)));
    }
}
