//! IPO service - listings, order book and bid lifecycle through TradeLab.
//!
//! # Listing Enrichment
//!
//! Vendor listings are joined with free-form `ipo_metadata` documents by
//! symbol. The four categories (all / open / upcoming / closed) are mapped
//! as independent tasks and joined before the result is cached.

use std::collections::HashMap;
use std::sync::Arc;

use crate::alert::{self, Severity};
use crate::cache::keys;
use crate::error::AppError;
use crate::mask;
use crate::models::ApiResponse;
use crate::models::ipo::{
    IpoBidRequest, IpoBidResponse, IpoListResponse, IpoListing, IpoMetadata, IpoOrderResponse,
    TradelabBidAck, TradelabBidRequest, TradelabIpo, TradelabIpoList, TradelabIpoOrder,
};
use crate::services::{cached, forget, remember};
use crate::state::AppState;
use crate::tradelab::{VendorRequest, paths};

pub const IPO_LIST_FETCHED: &str = "IPO list fetched successfully";
pub const IPO_ORDERS_FETCHED: &str = "IPO orders fetched successfully";
pub const IPO_BID_PLACED: &str = "IPO bid placed successfully";
pub const IPO_BID_MODIFIED: &str = "IPO bid modified successfully";
pub const IPO_BID_CANCELLED: &str = "IPO bid cancelled successfully";

type MetadataIndex = Arc<HashMap<String, IpoMetadata>>;

/// Categorised IPO listing, served from `ipo:list` when cached.
pub async fn list_ipos(state: &AppState) -> Result<ApiResponse<IpoListResponse>, AppError> {
    if let Some(listing) = cached::<IpoListResponse>(state, keys::IPO_LIST).await {
        return Ok(ApiResponse::new(IPO_LIST_FETCHED, listing));
    }

    let vendor: TradelabIpoList = state
        .tradelab
        .call("ipo.list", VendorRequest::get(paths::IPO_LIST))
        .await?;

    let metadata = match state.store.ipo_metadata_documents().await {
        Ok(docs) => IpoMetadata::index(&docs),
        Err(e) => {
            alert::raise(
                Severity::Low,
                "ipo.list",
                &format!("IPO metadata unavailable, serving listing without enrichment: {e}"),
            );
            HashMap::new()
        }
    };

    let listing = categorise(vendor, Arc::new(metadata)).await?;

    remember(state, keys::IPO_LIST, &listing, state.config.ipo_cache_ttl()).await;

    Ok(ApiResponse::new(IPO_LIST_FETCHED, listing))
}

/// Map the four vendor sub-lists concurrently.
async fn categorise(
    vendor: TradelabIpoList,
    metadata: MetadataIndex,
) -> Result<IpoListResponse, AppError> {
    let transform = |ipos: Vec<TradelabIpo>| {
        let metadata = Arc::clone(&metadata);
        tokio::spawn(async move {
            ipos.into_iter()
                .map(|ipo| {
                    let meta = metadata.get(&ipo.symbol.to_uppercase());
                    IpoListing::from_vendor(ipo, meta)
                })
                .collect::<Vec<_>>()
        })
    };

    let (all, open, upcoming, closed) = tokio::try_join!(
        transform(vendor.all),
        transform(vendor.open),
        transform(vendor.upcoming),
        transform(vendor.closed)
    )
    .map_err(|e| AppError::Internal(format!("IPO transform task failed: {e}")))?;

    Ok(IpoListResponse {
        all,
        open,
        upcoming,
        closed,
    })
}

/// The client's IPO applications, served from `ipo:orders:<client_id>` when cached.
pub async fn list_ipo_orders(
    state: &AppState,
    client_id: &str,
) -> Result<ApiResponse<Vec<IpoOrderResponse>>, AppError> {
    let key = keys::ipo_orders(client_id);
    if let Some(orders) = cached::<Vec<IpoOrderResponse>>(state, &key).await {
        return Ok(ApiResponse::new(IPO_ORDERS_FETCHED, orders));
    }

    let request = VendorRequest::get(paths::IPO_ORDERS).query("client_id", client_id);
    let vendor: Vec<TradelabIpoOrder> = state.tradelab.call("ipo.orders", request).await?;

    let orders: Vec<IpoOrderResponse> = vendor.into_iter().map(Into::into).collect();

    remember(state, &key, &orders, state.config.ipo_orders_cache_ttl()).await;

    Ok(ApiResponse::new(IPO_ORDERS_FETCHED, orders))
}

/// Submit a new IPO application.
pub async fn place_ipo_bid(
    state: &AppState,
    client_id: &str,
    request: IpoBidRequest,
) -> Result<ApiResponse<IpoBidResponse>, AppError> {
    request.validate().map_err(AppError::InvalidRequest)?;

    let body = encode(TradelabBidRequest::new(client_id, &request))?;
    let ack: TradelabBidAck = state
        .tradelab
        .call("ipo.bid.place", VendorRequest::post(paths::IPO_BID, body))
        .await?;

    tracing::info!(
        client_id = %mask::client_id(client_id),
        symbol = %request.symbol,
        application_no = %ack.application_no,
        bids = request.bids.len(),
        "IPO bid placed"
    );

    forget(state, &keys::ipo_orders(client_id)).await;

    Ok(ApiResponse::new(IPO_BID_PLACED, ack.into()))
}

/// Replace the bids of an existing application.
pub async fn modify_ipo_bid(
    state: &AppState,
    client_id: &str,
    application_no: &str,
    request: IpoBidRequest,
) -> Result<ApiResponse<IpoBidResponse>, AppError> {
    require_application_no(application_no)?;
    request.validate().map_err(AppError::InvalidRequest)?;

    let mut body = TradelabBidRequest::new(client_id, &request);
    body.application_no = Some(application_no);
    let ack: TradelabBidAck = state
        .tradelab
        .call(
            "ipo.bid.modify",
            VendorRequest::put(paths::IPO_BID, encode(body)?),
        )
        .await?;

    tracing::info!(
        client_id = %mask::client_id(client_id),
        application_no,
        "IPO bid modified"
    );

    forget(state, &keys::ipo_orders(client_id)).await;

    Ok(ApiResponse::new(IPO_BID_MODIFIED, ack.into()))
}

/// Withdraw an application.
pub async fn cancel_ipo_bid(
    state: &AppState,
    client_id: &str,
    application_no: &str,
) -> Result<ApiResponse<IpoBidResponse>, AppError> {
    require_application_no(application_no)?;

    let request = VendorRequest::delete(paths::IPO_BID)
        .query("client_id", client_id)
        .query("application_no", application_no);
    let ack: TradelabBidAck = state.tradelab.call("ipo.bid.cancel", request).await?;

    tracing::info!(
        client_id = %mask::client_id(client_id),
        application_no,
        "IPO bid cancelled"
    );

    forget(state, &keys::ipo_orders(client_id)).await;

    Ok(ApiResponse::new(IPO_BID_CANCELLED, ack.into()))
}

fn require_application_no(application_no: &str) -> Result<(), AppError> {
    if application_no.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Application number is required".to_string(),
        ));
    }
    Ok(())
}

fn encode(body: TradelabBidRequest<'_>) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(body).map_err(|e| AppError::Internal(format!("Failed to encode bid: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ipo::IpoBid;
    use crate::testing::Harness;
    use reqwest::Method;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn ipo(symbol: &str, status: &str) -> serde_json::Value {
        json!({
            "symbol": symbol,
            "company_name": format!("{symbol} Ltd"),
            "min_price": 100,
            "max_price": 110,
            "lot_size": 130,
            "bidding_start_date": "2025-03-04",
            "bidding_end_date": "2025-03-06",
            "status": status
        })
    }

    fn bid_request() -> IpoBidRequest {
        IpoBidRequest {
            symbol: "ACME".into(),
            upi_id: "jane@okbank".into(),
            bids: vec![IpoBid {
                quantity: 130,
                price: Decimal::from(110),
                cut_off: false,
            }],
        }
    }

    #[tokio::test]
    async fn list_keeps_categories_and_enriches() {
        let harness = Harness::new();
        harness
            .store
            .ipo_documents
            .lock()
            .unwrap()
            .push(json!({ "symbol": "acme", "registrar": { "name": "KFin" } }));
        harness.transport.push_success(json!({
            "all": [ipo("ACME", "OPEN"), ipo("BETA", "UPCOMING"), ipo("GAMMA", "CLOSED")],
            "open": [ipo("ACME", "OPEN")],
            "upcoming": [ipo("BETA", "UPCOMING")],
            "closed": [ipo("GAMMA", "CLOSED")]
        }));

        let response = list_ipos(&harness.state).await.unwrap();
        let listing = response.data;

        assert_eq!(response.message, IPO_LIST_FETCHED);
        assert_eq!(listing.all.len(), 3);
        assert_eq!(listing.open[0].symbol, "ACME");
        assert_eq!(listing.upcoming[0].symbol, "BETA");
        assert_eq!(listing.closed[0].symbol, "GAMMA");
        assert_eq!(listing.open[0].registrar.as_deref(), Some("KFin"));
        assert_eq!(listing.upcoming[0].registrar, None);
        assert_eq!(listing.open[0].open_date.as_deref(), Some("04 Mar 2025"));
        assert!(harness.cache.contains(keys::IPO_LIST));
    }

    #[tokio::test]
    async fn list_served_from_cache_on_second_call() {
        let harness = Harness::new();
        harness
            .transport
            .push_success(json!({ "open": [ipo("ACME", "OPEN")] }));

        let first = list_ipos(&harness.state).await.unwrap();
        let second = list_ipos(&harness.state).await.unwrap();

        assert_eq!(first.data, second.data);
        assert_eq!(harness.transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn list_without_metadata_store_still_succeeds() {
        let harness = Harness::new();
        harness.store.fail();
        harness
            .transport
            .push_success(json!({ "open": [ipo("ACME", "OPEN")] }));

        let listing = list_ipos(&harness.state).await.unwrap().data;

        assert_eq!(listing.open.len(), 1);
        assert!(listing.all.is_empty());
    }

    #[tokio::test]
    async fn list_transport_error_is_500() {
        let harness = Harness::new();
        harness.transport.push_timeout();

        let err = list_ipos(&harness.state).await.unwrap_err();
        assert_eq!(err.status().as_u16(), 500);
        assert!(!harness.cache.contains(keys::IPO_LIST));
    }

    #[tokio::test]
    async fn orders_are_mapped_and_cached() {
        let harness = Harness::new();
        harness.transport.push_success(json!([{
            "application_no": "APP-1",
            "symbol": "ACME",
            "upi_id": "jane@okbank",
            "bids": [{ "qty": 130, "price": 110 }],
            "status": "SUBMITTED"
        }]));

        let response = list_ipo_orders(&harness.state, "AB1234").await.unwrap();

        assert_eq!(response.message, IPO_ORDERS_FETCHED);
        assert_eq!(response.data[0].application_number, "APP-1");
        assert_eq!(response.data[0].upi_id, "ja**@okbank");
        assert!(harness.cache.contains("ipo:orders:AB1234"));
    }

    #[tokio::test]
    async fn place_bid_sends_vendor_shape_and_invalidates_orders() {
        let harness = Harness::new();
        harness.transport.push_success(json!([]));
        harness
            .transport
            .push_success(json!({ "application_no": "APP-2", "status": "SUBMITTED" }));

        list_ipo_orders(&harness.state, "AB1234").await.unwrap();
        let response = place_ipo_bid(&harness.state, "AB1234", bid_request())
            .await
            .unwrap();

        assert_eq!(response.message, IPO_BID_PLACED);
        assert_eq!(response.data.application_number, "APP-2");
        assert!(!harness.cache.contains("ipo:orders:AB1234"));

        let sent = &harness.transport.requests()[1];
        assert_eq!(sent.method, Method::POST);
        let body = sent.body.as_ref().unwrap();
        assert_eq!(body["bids"][0]["qty"], 130);
        assert_eq!(body["bids"][0]["cutoff_flag"], false);
        assert!(body.get("application_no").is_none());
    }

    #[tokio::test]
    async fn invalid_bid_never_reaches_vendor() {
        let harness = Harness::new();
        let mut request = bid_request();
        request.bids.clear();

        let err = place_ipo_bid(&harness.state, "AB1234", request)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert!(harness.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn modify_bid_uses_put_with_application_no() {
        let harness = Harness::new();
        harness
            .transport
            .push_success(json!({ "application_no": "APP-2", "status": "MODIFIED" }));

        let response = modify_ipo_bid(&harness.state, "AB1234", "APP-2", bid_request())
            .await
            .unwrap();

        assert_eq!(response.message, IPO_BID_MODIFIED);
        let sent = &harness.transport.requests()[0];
        assert_eq!(sent.method, Method::PUT);
        assert_eq!(sent.body.as_ref().unwrap()["application_no"], "APP-2");
    }

    #[tokio::test]
    async fn cancel_bid_passes_vendor_error_through() {
        let harness = Harness::new();
        harness.transport.push_json(
            400,
            json!({ "status": "error", "message": "Bidding closed", "error_code": "IPO_CLOSED" }),
        );

        match cancel_ipo_bid(&harness.state, "AB1234", "APP-2")
            .await
            .unwrap_err()
        {
            AppError::Vendor { status, code, .. } => {
                assert_eq!(status, 400);
                assert_eq!(code, "IPO_CLOSED");
            }
            other => panic!("unexpected {other:?}"),
        }

        let sent = &harness.transport.requests()[0];
        assert_eq!(sent.method, Method::DELETE);
        assert_eq!(
            sent.query,
            vec![
                ("client_id", "AB1234".to_string()),
                ("application_no", "APP-2".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn cancel_requires_application_no() {
        let harness = Harness::new();
        let err = cancel_ipo_bid(&harness.state, "AB1234", " ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }
}
