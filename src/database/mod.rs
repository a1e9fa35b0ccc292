pub mod memory;
pub mod mongo_store;
pub mod store;

pub use memory::MemoryStore;
pub use store::DocumentStore;

use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database};
use std::error::Error;

pub const ACCOUNTS: &str = "accounts";
pub const USER_DOCUMENTS: &str = "user_documents";
pub const DEVICES: &str = "devices";
pub const SAVE_POINTS: &str = "save_points";
pub const API_KEYS: &str = "api_keys";
pub const RATING_REQUESTS: &str = "rating_requests";

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = uri
            .rsplit('/')
            .next()
            .and_then(|s| s.split('?').next())
            .filter(|s| !s.is_empty() && !s.contains(':') && !s.contains('@'))
            .unwrap_or("appointments");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { client, db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes the store relies on for lookups and uniqueness
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::bson::doc;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let unique = || IndexOptions::builder().unique(true).build();

        let indexes = [
            (ACCOUNTS, doc! { "email": 1 }, Some(unique())),
            (USER_DOCUMENTS, doc! { "email": 1 }, Some(unique())),
            (DEVICES, doc! { "email": 1, "device_id": 1 }, Some(unique())),
            (SAVE_POINTS, doc! { "email": 1, "created_at": -1 }, None),
            (API_KEYS, doc! { "key_id": 1 }, Some(unique())),
            (RATING_REQUESTS, doc! { "token": 1 }, Some(unique())),
        ];

        for (collection, keys, options) in indexes {
            let index = IndexModel::builder().keys(keys).options(options).build();
            match self
                .database()
                .collection::<mongodb::bson::Document>(collection)
                .create_index(index)
                .await
            {
                Ok(_) => log::info!("   ✅ Index ready: {}", collection),
                Err(e) => log::debug!("   ℹ️  Index already exists on {}: {}", collection, e),
            }
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}
