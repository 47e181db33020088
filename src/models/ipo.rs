//! IPO data models and API request/response types.
//!
//! This module defines:
//! - `TradelabIpo*`: vendor listing, order book and bid payloads
//! - `IpoListing` / `IpoListResponse`: the categorised listing returned to callers
//! - `IpoMetadata`: enrichment fields pulled out of free-form metadata documents
//! - `IpoBidRequest` / `IpoBidResponse` / `IpoOrderResponse`: bid lifecycle

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mask;

/// Bidding limits per application.
pub const MAX_BIDS_PER_APPLICATION: usize = 3;

/// One IPO as listed by TradeLab `GET /api/v1/ipo/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct TradelabIpo {
    pub symbol: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub min_price: Decimal,
    #[serde(default)]
    pub max_price: Decimal,
    #[serde(default)]
    pub lot_size: Option<u32>,
    #[serde(default)]
    pub min_bid_quantity: Option<u32>,
    #[serde(default)]
    pub bidding_start_date: Option<String>,
    #[serde(default)]
    pub bidding_end_date: Option<String>,
    #[serde(default)]
    pub issue_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// TradeLab listing payload, already split by category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TradelabIpoList {
    #[serde(default)]
    pub all: Vec<TradelabIpo>,
    #[serde(default)]
    pub open: Vec<TradelabIpo>,
    #[serde(default)]
    pub upcoming: Vec<TradelabIpo>,
    #[serde(default)]
    pub closed: Vec<TradelabIpo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBand {
    pub min: Decimal,
    pub max: Decimal,
}

/// IPO as returned to internal callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpoListing {
    pub symbol: String,
    pub company_name: String,
    pub price_band: PriceBand,
    pub lot_size: Option<u32>,
    pub minimum_quantity: Option<u32>,
    /// `DD Mon YYYY`
    pub open_date: Option<String>,
    /// `DD Mon YYYY`
    pub close_date: Option<String>,
    pub issue_type: String,
    pub status: String,
    pub issue_size: Option<String>,
    pub registrar: Option<String>,
    pub rhp_url: Option<String>,
    pub logo_url: Option<String>,
}

impl IpoListing {
    /// Map a vendor IPO, filling gaps from the metadata document when one exists.
    pub fn from_vendor(ipo: TradelabIpo, metadata: Option<&IpoMetadata>) -> Self {
        let lot_size = ipo.lot_size.or_else(|| metadata.and_then(|m| m.lot_size));

        Self {
            symbol: ipo.symbol,
            company_name: ipo.company_name,
            price_band: PriceBand {
                min: ipo.min_price,
                max: ipo.max_price,
            },
            lot_size,
            minimum_quantity: ipo.min_bid_quantity.or(lot_size),
            open_date: ipo.bidding_start_date.as_deref().map(format_vendor_date),
            close_date: ipo.bidding_end_date.as_deref().map(format_vendor_date),
            issue_type: ipo.issue_type.unwrap_or_else(|| "EQUITY".to_string()),
            status: ipo.status.unwrap_or_default(),
            issue_size: metadata.and_then(|m| m.issue_size.clone()),
            registrar: metadata.and_then(|m| m.registrar.clone()),
            rhp_url: metadata.and_then(|m| m.rhp_url.clone()),
            logo_url: metadata.and_then(|m| m.logo_url.clone()),
        }
    }
}

/// Categorised listing returned by `GET /api/v1/ipo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpoListResponse {
    pub all: Vec<IpoListing>,
    pub open: Vec<IpoListing>,
    pub upcoming: Vec<IpoListing>,
    pub closed: Vec<IpoListing>,
}

/// TradeLab dates come as `YYYY-MM-DD` or `DD-MM-YYYY`; anything else is kept raw.
pub fn format_vendor_date(raw: &str) -> String {
    let raw = raw.trim();
    // Some feeds append a time component
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d-%m-%Y"))
        .map(|date| date.format("%d %b %Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Enrichment fields extracted from an `ipo_metadata` document.
///
/// The documents are maintained by hand and their layout has drifted over
/// time, so every field is looked up at several candidate paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IpoMetadata {
    pub symbol: String,
    pub lot_size: Option<u32>,
    pub issue_size: Option<String>,
    pub registrar: Option<String>,
    pub rhp_url: Option<String>,
    pub logo_url: Option<String>,
}

const SYMBOL_PATHS: &[&[&str]] = &[&["symbol"], &["ipo", "symbol"], &["details", "symbol"]];
const LOT_SIZE_PATHS: &[&[&str]] = &[
    &["lot_size"],
    &["details", "lot_size"],
    &["details", "lot", "size"],
];
const ISSUE_SIZE_PATHS: &[&[&str]] = &[
    &["issue_size"],
    &["details", "issue_size"],
    &["financials", "issue_size"],
];
const REGISTRAR_PATHS: &[&[&str]] = &[
    &["registrar", "name"],
    &["registrar"],
    &["details", "registrar", "name"],
    &["details", "registrar"],
];
const RHP_PATHS: &[&[&str]] = &[
    &["rhp_url"],
    &["documents", "rhp", "url"],
    &["documents", "rhp"],
];
const LOGO_PATHS: &[&[&str]] = &[&["logo_url"], &["logo"], &["media", "logo", "url"]];

impl IpoMetadata {
    /// Extract metadata from one document. `None` when no symbol can be found.
    pub fn from_document(doc: &Value) -> Option<Self> {
        let symbol = first_text(doc, SYMBOL_PATHS)?.to_uppercase();

        Some(Self {
            symbol,
            lot_size: first_value(doc, LOT_SIZE_PATHS).and_then(as_u32),
            issue_size: first_text(doc, ISSUE_SIZE_PATHS),
            registrar: first_text(doc, REGISTRAR_PATHS),
            rhp_url: first_text(doc, RHP_PATHS).or_else(|| link_of_kind(doc, "rhp")),
            logo_url: first_text(doc, LOGO_PATHS).or_else(|| link_of_kind(doc, "logo")),
        })
    }

    /// Index documents by upper-cased symbol, skipping unusable ones.
    pub fn index(docs: &[Value]) -> HashMap<String, IpoMetadata> {
        docs.iter()
            .filter_map(Self::from_document)
            .map(|m| (m.symbol.clone(), m))
            .collect()
    }
}

fn lookup<'a>(doc: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(doc, |node, key| node.get(key))
        .filter(|v| !v.is_null())
}

fn first_value<'a>(doc: &'a Value, paths: &[&[&str]]) -> Option<&'a Value> {
    paths.iter().find_map(|path| lookup(doc, path))
}

/// First candidate path holding a scalar, rendered as text.
fn first_text(doc: &Value, paths: &[&[&str]]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| lookup(doc, path))
        .find_map(as_text)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Search a `links: [{ "type": "...", "url": "..." }]` array.
fn link_of_kind(doc: &Value, kind: &str) -> Option<String> {
    doc.get("links")?
        .as_array()?
        .iter()
        .filter(|link| {
            link.get("type")
                .and_then(Value::as_str)
                .is_some_and(|t| t.eq_ignore_ascii_case(kind))
        })
        .find_map(|link| link.get("url").and_then(as_text))
}

/// One price/quantity line of an IPO application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpoBid {
    pub quantity: u32,
    pub price: Decimal,
    #[serde(default)]
    pub cut_off: bool,
}

/// Request to place or modify an IPO application.
///
/// # JSON Example
///
/// ```json
/// {
///   "symbol": "ACME",
///   "upi_id": "jane@okbank",
///   "bids": [{ "quantity": 14, "price": "540", "cut_off": true }]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct IpoBidRequest {
    pub symbol: String,
    pub upi_id: String,
    pub bids: Vec<IpoBid>,
}

impl IpoBidRequest {
    /// Check bid count, quantities and prices.
    pub fn validate(&self) -> Result<(), String> {
        if self.symbol.trim().is_empty() {
            return Err("Symbol is required".to_string());
        }
        if !self.upi_id.contains('@') {
            return Err("UPI id is invalid".to_string());
        }
        if self.bids.is_empty() {
            return Err("At least one bid is required".to_string());
        }
        if self.bids.len() > MAX_BIDS_PER_APPLICATION {
            return Err(format!(
                "At most {MAX_BIDS_PER_APPLICATION} bids are allowed"
            ));
        }
        for bid in &self.bids {
            if bid.quantity == 0 {
                return Err("Bid quantity must be positive".to_string());
            }
            if !bid.cut_off && bid.price <= Decimal::ZERO {
                return Err("Bid price must be positive".to_string());
            }
        }
        Ok(())
    }
}

/// Bid line in TradeLab's wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradelabBid {
    #[serde(rename = "qty")]
    pub quantity: u32,
    pub price: Decimal,
    #[serde(rename = "cutoff_flag", default)]
    pub cut_off: bool,
}

impl From<&IpoBid> for TradelabBid {
    fn from(bid: &IpoBid) -> Self {
        Self {
            quantity: bid.quantity,
            price: bid.price,
            cut_off: bid.cut_off,
        }
    }
}

impl From<TradelabBid> for IpoBid {
    fn from(bid: TradelabBid) -> Self {
        Self {
            quantity: bid.quantity,
            price: bid.price,
            cut_off: bid.cut_off,
        }
    }
}

/// Body for TradeLab `POST` / `PUT /api/v1/ipo/bid`.
#[derive(Debug, Serialize)]
pub struct TradelabBidRequest<'a> {
    pub client_id: &'a str,
    pub symbol: &'a str,
    pub upi_id: &'a str,
    pub bids: Vec<TradelabBid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_no: Option<&'a str>,
}

impl<'a> TradelabBidRequest<'a> {
    pub fn new(client_id: &'a str, request: &'a IpoBidRequest) -> Self {
        Self {
            client_id,
            symbol: &request.symbol,
            upi_id: &request.upi_id,
            bids: request.bids.iter().map(TradelabBid::from).collect(),
            application_no: None,
        }
    }
}

/// TradeLab acknowledgement for place / modify / cancel.
#[derive(Debug, Clone, Deserialize)]
pub struct TradelabBidAck {
    pub application_no: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpoBidResponse {
    pub application_number: String,
    pub status: String,
}

impl From<TradelabBidAck> for IpoBidResponse {
    fn from(ack: TradelabBidAck) -> Self {
        Self {
            application_number: ack.application_no,
            status: ack.status,
        }
    }
}

/// One application in TradeLab's IPO order book.
#[derive(Debug, Clone, Deserialize)]
pub struct TradelabIpoOrder {
    pub application_no: String,
    pub symbol: String,
    #[serde(default)]
    pub upi_id: String,
    #[serde(default)]
    pub bids: Vec<TradelabBid>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

/// IPO application as returned to internal callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpoOrderResponse {
    pub application_number: String,
    pub symbol: String,
    /// Masked
    pub upi_id: String,
    pub bids: Vec<IpoBid>,
    pub status: String,
    /// `DD Mon YYYY`
    pub applied_on: Option<String>,
    pub remarks: Option<String>,
}

impl From<TradelabIpoOrder> for IpoOrderResponse {
    fn from(order: TradelabIpoOrder) -> Self {
        Self {
            application_number: order.application_no,
            symbol: order.symbol,
            upi_id: mask::upi(&order.upi_id),
            bids: order.bids.into_iter().map(IpoBid::from).collect(),
            status: order.status,
            applied_on: order.created_at.as_deref().map(format_vendor_date),
            remarks: order.failure_reason,
        }
    }
}
