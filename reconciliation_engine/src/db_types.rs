use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use recon_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::attribution::Attribution;

#[derive(Debug, Clone, Error)]
#[error("Invalid {kind} value: {value}")]
pub struct ConversionError {
    kind: &'static str,
    value: String,
}

/// Declares a text-backed enum with `Display`/`FromStr` implementations that agree with its serde and sqlx encodings.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
        #[sqlx(rename_all = "snake_case")]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    s => Err(ConversionError { kind: stringify!($name), value: s.to_string() }),
                }
            }
        }
    };
}

//--------------------------------------      ProjectId       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl From<String> for ProjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ProjectId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    TransactionId     ---------------------------------------------------------
/// The provider's transaction identifier (e.g. `HP1234567890`). This is the natural key that ties webhook events,
/// accounting rows and order projections together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct TransactionId(pub String);

impl From<String> for TransactionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TransactionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl TransactionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------       Project        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: ProjectId,
    /// Short, human-friendly code used by operators to refer to the project
    pub code: Option<String>,
    pub name: Option<String>,
}

/// How a caller identifies a project: either by its id, or by its short code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectLookup {
    Id(ProjectId),
    Code(String),
}

impl Display for ProjectLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectLookup::Id(id) => write!(f, "id {id}"),
            ProjectLookup::Code(code) => write!(f, "code '{code}'"),
        }
    }
}

//--------------------------------------       RawEvent       ---------------------------------------------------------
/// A provider notification, exactly as it was received. Read-only.
#[derive(Debug, Clone, FromRow)]
pub struct RawEvent {
    pub id: String,
    pub project_id: ProjectId,
    pub provider: String,
    /// The JSON notification body
    pub payload: String,
    pub received_at: DateTime<Utc>,
}

impl RawEvent {
    pub fn document(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.payload)
    }
}

//--------------------------------------      Ledger enums     --------------------------------------------------------
text_enum! {
    /// Where a ledger event came from.
    SourceOrigin {
        Webhook => "webhook",
        Csv => "csv",
    }
}

text_enum! {
    /// How far the money in a ledger event can be trusted. Accounting data always wins over real-time data.
    ConfidenceLevel {
        Realtime => "realtime",
        Accounting => "accounting",
    }
}

text_enum! {
    LedgerEventType {
        Sale => "sale",
        PlatformFee => "platform_fee",
        Affiliate => "affiliate",
        Coproducer => "coproducer",
        Tax => "tax",
    }
}

impl LedgerEventType {
    /// The actor that receives the money for this kind of event.
    pub fn actor(&self) -> ActorRole {
        match self {
            LedgerEventType::Sale => ActorRole::Producer,
            LedgerEventType::PlatformFee => ActorRole::Platform,
            LedgerEventType::Affiliate => ActorRole::Affiliate,
            LedgerEventType::Coproducer => ActorRole::Coproducer,
            LedgerEventType::Tax => ActorRole::TaxAuthority,
        }
    }
}

text_enum! {
    ActorRole {
        Producer => "producer",
        Platform => "platform",
        Affiliate => "affiliate",
        Coproducer => "coproducer",
        TaxAuthority => "tax_authority",
    }
}

text_enum! {
    /// The financial completeness of an order. Variants are declared in ascending order, and an order's status may only
    /// move forward.
    LedgerStatus {
        Pending => "pending",
        RealtimeComplete => "realtime_complete",
        AccountingComplete => "accounting_complete",
    }
}

impl LedgerStatus {
    fn rank(&self) -> u8 {
        match self {
            LedgerStatus::Pending => 0,
            LedgerStatus::RealtimeComplete => 1,
            LedgerStatus::AccountingComplete => 2,
        }
    }

    /// Returns the status after an attempt to move to `target`. Regressions are ignored.
    pub fn advance_to(self, target: LedgerStatus) -> LedgerStatus {
        if target.rank() > self.rank() {
            target
        } else {
            self
        }
    }
}

text_enum! {
    ItemType {
        Main => "main",
        Bump => "bump",
        Upsell => "upsell",
        Downsell => "downsell",
    }
}

//--------------------------------------     LedgerEvent      ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LedgerEvent {
    pub id: i64,
    pub project_id: ProjectId,
    pub order_id: i64,
    pub transaction_id: TransactionId,
    pub provider: String,
    pub provider_event_id: String,
    pub source_origin: SourceOrigin,
    pub confidence_level: ConfidenceLevel,
    pub event_type: LedgerEventType,
    pub actor_role: ActorRole,
    /// Signed amount in the settlement currency
    pub amount_brl: Money,
    /// The amount as it was reported, before currency normalisation
    pub amount_accounting: Money,
    pub accounting_currency: String,
    pub reference_period: Option<NaiveDate>,
    /// JSON document describing where the event came from
    pub provenance: String,
    #[sqlx(flatten)]
    pub attribution: Attribution,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLedgerEvent {
    pub project_id: ProjectId,
    pub order_id: i64,
    pub transaction_id: TransactionId,
    pub provider: String,
    pub provider_event_id: String,
    pub source_origin: SourceOrigin,
    pub confidence_level: ConfidenceLevel,
    pub event_type: LedgerEventType,
    pub actor_role: ActorRole,
    pub amount_brl: Money,
    pub amount_accounting: Money,
    pub accounting_currency: String,
    pub reference_period: Option<NaiveDate>,
    pub provenance: serde_json::Value,
    pub attribution: Attribution,
}

//--------------------------------------        Order         ---------------------------------------------------------
/// The financial summary projection of a single order.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub project_id: ProjectId,
    pub transaction_id: TransactionId,
    pub provider: String,
    pub gross_brl: Option<Money>,
    pub producer_net_brl: Option<Money>,
    pub platform_fee_brl: Option<Money>,
    pub affiliate_brl: Option<Money>,
    pub coproducer_brl: Option<Money>,
    pub tax_brl: Option<Money>,
    pub ledger_status: LedgerStatus,
    #[sqlx(flatten)]
    pub attribution: Attribution,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order projection as first written by the ingestion path.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub project_id: ProjectId,
    pub transaction_id: TransactionId,
    pub provider: String,
    pub gross_brl: Option<Money>,
    pub producer_net_brl: Option<Money>,
    pub ledger_status: LedgerStatus,
    pub attribution: Attribution,
}

impl NewOrder {
    pub fn new<P: Into<ProjectId>, T: Into<TransactionId>>(project_id: P, transaction_id: T) -> Self {
        Self {
            project_id: project_id.into(),
            transaction_id: transaction_id.into(),
            provider: "hotmart".to_string(),
            gross_brl: None,
            producer_net_brl: None,
            ledger_status: LedgerStatus::Pending,
            attribution: Attribution::default(),
        }
    }

    pub fn with_gross(mut self, gross: Money) -> Self {
        self.gross_brl = Some(gross);
        self
    }

    pub fn with_producer_net(mut self, net: Money) -> Self {
        self.producer_net_brl = Some(net);
        self
    }

    pub fn with_status(mut self, status: LedgerStatus) -> Self {
        self.ledger_status = status;
        self
    }

    pub fn with_attribution(mut self, attribution: Attribution) -> Self {
        self.attribution = attribution;
        self
    }
}

/// The order-level side effects of committing an order's accounting events.
///
/// `None` totals mean "not reported by the export" and leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerAdvance {
    pub order_id: i64,
    pub gross_brl: Option<Money>,
    pub producer_net_brl: Option<Money>,
    pub platform_fee_brl: Option<Money>,
    pub affiliate_brl: Option<Money>,
    pub coproducer_brl: Option<Money>,
    pub tax_brl: Option<Money>,
}

//--------------------------------------      OrderItem       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub raw_event_id: Option<String>,
    pub offer_name: Option<String>,
    pub item_type: ItemType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order item, joined with the payload of the raw event that produced it.
#[derive(Debug, Clone, FromRow)]
pub struct ClassifiableItem {
    pub id: i64,
    pub item_type: ItemType,
    pub payload: Option<String>,
}

//--------------------------------------   SalesCoreEvent     ---------------------------------------------------------
/// The dashboard projection of a sale notification.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SalesCoreEvent {
    pub id: i64,
    pub project_id: ProjectId,
    pub provider_event_id: String,
    pub transaction_id: TransactionId,
    pub event_type: String,
    pub gross_brl: Option<Money>,
    #[sqlx(flatten)]
    pub attribution: Attribution,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSalesCoreEvent {
    pub project_id: ProjectId,
    pub provider_event_id: String,
    pub transaction_id: TransactionId,
    pub gross_brl: Option<Money>,
    pub attribution: Attribution,
    pub occurred_at: DateTime<Utc>,
}

//--------------------------------------       Catalog        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Funnel {
    pub id: String,
    pub project_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct OfferMapping {
    pub id: i64,
    pub project_id: Option<String>,
    pub funnel_id: Option<String>,
    #[sqlx(rename = "nome_produto")]
    pub product_name: Option<String>,
    #[sqlx(rename = "nome_oferta")]
    pub offer_name: Option<String>,
    #[sqlx(rename = "origem")]
    pub origin: Option<String>,
}
