//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two belong in the engine's APIs.
//!
//! A note about performance:
//! Each worker thread processes its requests sequentially, so a handler that blocks the current thread stalls every
//! other request on that worker. Reconciliation runs can take a while, but they are entirely made up of awaited
//! database calls, so the worker stays free to interleave other requests.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use reconciliation_engine::{
    db_types::{ProjectId, ProjectLookup},
    recon_api::{import_objects::CsvImportRequest, item_recovery_api::ItemRecoveryRequest, replay_api::ReplayRequest},
    AccountingImportApi,
    CatalogIntegrityApi,
    CatalogManagement,
    ItemManagement,
    ItemRecoveryApi,
    LedgerDatabase,
    RawEventReplayApi,
    ReplayDatabase,
};
use serde::de::DeserializeOwned;

use crate::{
    data_objects::{CatalogReportResponse, CsvImportResponse, ItemRecoveryResponse, ProjectQuery, ReplayResponse},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Deserializes a JSON body that the caller may leave out entirely. An empty body yields the default request.
fn optional_json_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ServerError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    json_body(body)
}

fn json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ServerError> {
    serde_json::from_slice(body).map_err(|e| {
        debug!("💻️ Could not deserialize request body. {e}");
        ServerError::InvalidRequestBody(format!("Request body is not valid JSON. {e}"))
    })
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   CSV import  ----------------------------------------------------
route!(csv_import => Post "/reconcile/csv_import" impl LedgerDatabase);
/// Route handler for the accounting import.
///
/// The body carries `project_id`, `reference_period` and the `rows` of the accounting export. A missing field is
/// rejected with a 400 before any row is looked at. Otherwise the response is a 200, even if some rows failed: the
/// failures are listed in `result.errors`.
pub async fn csv_import<B: LedgerDatabase>(
    body: web::Bytes,
    api: web::Data<AccountingImportApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received CSV import request");
    let request = json_body::<CsvImportRequest>(&body)?;
    let result = api.import(request).await?;
    debug!(
        "💻️ CSV import complete. {} orders processed, {} errors",
        result.orders_processed,
        result.errors.len()
    );
    Ok(HttpResponse::Ok().json(CsvImportResponse::from(result)))
}

//----------------------------------------------   Replay  ----------------------------------------------------
route!(replay_raw_events => Post "/reconcile/replay_raw_events" impl ReplayDatabase);
/// Route handler for the raw-event replay.
///
/// The project is identified by `project_id` or `project_code`, given either as query parameters or in a JSON body.
/// Query parameters take precedence.
pub async fn replay_raw_events<B: ReplayDatabase>(
    query: web::Query<ReplayRequest>,
    body: web::Bytes,
    api: web::Data<RawEventReplayApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received raw event replay request");
    let from_body = optional_json_body::<ReplayRequest>(&body)?;
    let lookup = ProjectLookup::try_from(query.into_inner().or(from_body))?;
    let result = api.replay(&lookup).await.map_err(|e| {
        warn!("💻️ Replay for {lookup} failed. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(ReplayResponse::from(result)))
}

//----------------------------------------------   Item recovery  ----------------------------------------------------
route!(recover_item_types => Post "/reconcile/recover_item_types" impl ItemManagement);
pub async fn recover_item_types<B: ItemManagement>(
    body: web::Bytes,
    api: web::Data<ItemRecoveryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received item type recovery request");
    let request = optional_json_body::<ItemRecoveryRequest>(&body)?;
    let result = api.recover(request).await?;
    Ok(HttpResponse::Ok().json(ItemRecoveryResponse::from(result)))
}

//----------------------------------------------   Diagnostics  ----------------------------------------------------
route!(funnel_offer_integrity => Get "/diagnostics/funnel_offers" impl CatalogManagement);
pub async fn funnel_offer_integrity<B: CatalogManagement>(
    query: web::Query<ProjectQuery>,
    api: web::Data<CatalogIntegrityApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let project_id = query.into_inner().project_id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    debug!("💻️ GET catalog integrity report for {}", project_id.as_deref().unwrap_or("all projects"));
    let project_id = project_id.map(ProjectId::from);
    let report = api.report(project_id.as_ref()).await?;
    Ok(HttpResponse::Ok().json(CatalogReportResponse::from(report)))
}
