use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use reconciliation_engine::{
    AccountingImportApi,
    CatalogIntegrityApi,
    ItemRecoveryApi,
    RawEventReplayApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{health, CsvImportRoute, FunnelOfferIntegrityRoute, RecoverItemTypesRoute, ReplayRawEventsRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(config.database_url.reveal(), config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    } else {
        info!("🗃️ Skipping database migrations");
    }
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let import_api = AccountingImportApi::new(db.clone(), config.normalizer(), config.options);
        let replay_api =
            RawEventReplayApi::new(db.clone(), config.normalizer(), config.project_codes.clone(), config.options);
        let recovery_api = ItemRecoveryApi::new(db.clone(), config.options);
        let integrity_api = CatalogIntegrityApi::new(db.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("recon::access_log"))
            .app_data(web::Data::new(import_api))
            .app_data(web::Data::new(replay_api))
            .app_data(web::Data::new(recovery_api))
            .app_data(web::Data::new(integrity_api))
            .service(health)
            .service(CsvImportRoute::<SqliteDatabase>::new())
            .service(ReplayRawEventsRoute::<SqliteDatabase>::new())
            .service(RecoverItemTypesRoute::<SqliteDatabase>::new())
            .service(FunnelOfferIntegrityRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
