use mongodb::bson::doc;
use mongodb::options::{ClientOptions, ServerApi, ServerApiVersion};
use mongodb::{Client, Database};
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use crate::repository::bid_repository::ensure_indexes;

pub async fn setup_mongo(uri: &str) -> mongodb::error::Result<Client> {
    let mut client_options = ClientOptions::parse(uri).await?;
    client_options.app_name = Some("jobnest".to_string());
    let server_api = ServerApi::builder()
        .version(ServerApiVersion::V1)
        .strict(true)
        .deprecation_errors(true)
        .build();
    client_options.server_api = Some(server_api);
    Client::with_options(client_options)
}

pub async fn ping(client: &Client) -> mongodb::error::Result<()> {
    client
        .database("admin")
        .run_command(doc! { "ping": 1 }, None)
        .await
        .map(|_| ())
}

/// Client built on first use. Parsing a `mongodb+srv` URI needs DNS, so a
/// failed attempt is not cached: the next caller tries again.
pub struct MongoConnection {
    uri: String,
    database: String,
    client: OnceCell<Client>,
}

impl MongoConnection {
    pub fn new(uri: String, database: String) -> Self {
        MongoConnection {
            uri,
            database,
            client: OnceCell::new(),
        }
    }

    pub async fn client(&self) -> mongodb::error::Result<&Client> {
        self.client
            .get_or_try_init(|| async {
                let client = setup_mongo(&self.uri).await?;
                match ping(&client).await {
                    Ok(()) => info!(database = %self.database, "pinged deployment, connected to MongoDB"),
                    Err(e) => error!(error = %e, "error connecting to MongoDB"),
                }
                if let Err(e) = ensure_indexes(&client.database(&self.database)).await {
                    warn!(error = %e, "could not create the bid uniqueness index");
                }
                Ok::<Client, mongodb::error::Error>(client)
            })
            .await
    }

    pub async fn database(&self) -> mongodb::error::Result<Database> {
        Ok(self.client().await?.database(&self.database))
    }
}
