use mimalloc::MiMalloc;
use simplified::{ContentStore, Registry, TableNaming};
use tracing::info;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &simplified::config::CONFIG;
    simplified::utils::logging::init_tracing(&cfg.basic.loglevel);

    info!(
        database_url = %cfg.basic.database_url,
        loglevel = %cfg.basic.loglevel,
        prefix = %cfg.database.prefix,
        charset = %cfg.database.charset,
        engine = %cfg.database.engine,
        max_connections = cfg.database.max_connections
    );

    let db = simplified::db::spawn(&cfg.database, &cfg.basic.database_url).await?;
    let registry = Registry::builder().build();
    let store = ContentStore::new(db, registry, TableNaming::from_config(&cfg.database));

    store.install_core_tables().await?;
    let tables = store.list_tables().await?;
    info!(tables = tables.len(), "Installation complete.");
    Ok(())
}
