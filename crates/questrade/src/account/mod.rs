//! Account calls.
//!
//! [`AccountApi`] exposes the broker's logical operations over the [`Dispatcher`]. Each
//! operation has a matching `*_descriptor` builder so the exact request can be inspected
//! without a network round trip.

mod models;
mod types;

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::OrderDefaults;
use crate::dispatch::{Dispatcher, RequestDescriptor};
use crate::error::{ApiError, Result};
use crate::symbols::{SymbolRef, SymbolResolver, SymbolSearch};

pub use models::{
    Account, AccountsResponse, ActivitiesResponse, Activity, Balance, BalancesResponse,
    EquitySymbol, Execution, ExecutionsResponse, Order, OrdersResponse, PlaceOrderResponse,
    Position, PositionsResponse, ServerTime, SymbolSearchResponse,
};
pub use types::{OrderAction, OrderStateFilter, OrderType, OrdersQuery, TimeInForce, TimeRange};

const TIME: &str = "time";
const ACCOUNTS: &str = "accounts";
const POSITIONS: &str = "accounts/{0}/positions";
const BALANCES: &str = "accounts/{0}/balances";
const EXECUTIONS: &str = "accounts/{0}/executions";
const ORDERS: &str = "accounts/{0}/orders";
const ACTIVITIES: &str = "accounts/{0}/activities";

/// Per-call fields of an order. The rest of the body comes from [`OrderDefaults`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub account: String,
    pub symbol: SymbolRef,
    pub quantity: u64,
    pub limit_price: Option<f64>,
}

impl OrderRequest {
    pub fn new(
        account: impl Into<String>,
        symbol: impl Into<SymbolRef>,
        quantity: u64,
        limit_price: Option<f64>,
    ) -> Self {
        Self {
            account: account.into(),
            symbol: symbol.into(),
            quantity,
            limit_price,
        }
    }
}

pub struct AccountApi {
    dispatcher: Arc<Dispatcher>,
    symbols: Arc<SymbolResolver>,
}

impl AccountApi {
    pub fn new(dispatcher: Arc<Dispatcher>, symbols: Arc<SymbolResolver>) -> Self {
        Self {
            dispatcher,
            symbols,
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn symbols(&self) -> &Arc<SymbolResolver> {
        &self.symbols
    }

    /// Current server time.
    pub async fn time(&self) -> Result<ServerTime> {
        self.dispatcher.call(&RequestDescriptor::get(TIME)).await
    }

    /// Accounts the authorized user can see.
    pub async fn accounts(&self) -> Result<AccountsResponse> {
        self.dispatcher.call(&RequestDescriptor::get(ACCOUNTS)).await
    }

    pub async fn positions(&self, account: &str) -> Result<PositionsResponse> {
        self.dispatcher
            .call(&RequestDescriptor::get(POSITIONS).arg(account))
            .await
    }

    /// Per-currency and combined balances.
    pub async fn balances(&self, account: &str) -> Result<BalancesResponse> {
        self.dispatcher
            .call(&RequestDescriptor::get(BALANCES).arg(account))
            .await
    }

    /// Executions in `range`, today when `None`.
    pub async fn executions(
        &self,
        account: &str,
        range: Option<TimeRange>,
    ) -> Result<ExecutionsResponse> {
        self.dispatcher
            .call(&Self::ranged_descriptor(EXECUTIONS, account, range))
            .await
    }

    pub async fn orders(&self, account: &str, query: &OrdersQuery) -> Result<OrdersResponse> {
        self.dispatcher
            .call(&Self::orders_descriptor(account, query))
            .await
    }

    /// Cash transactions, dividends, trades and other activity in `range`, today when `None`.
    pub async fn activities(
        &self,
        account: &str,
        range: Option<TimeRange>,
    ) -> Result<ActivitiesResponse> {
        self.dispatcher
            .call(&Self::ranged_descriptor(ACTIVITIES, account, range))
            .await
    }

    pub async fn search_symbols(&self, prefix: &str, offset: u32) -> Result<SymbolSearchResponse> {
        self.dispatcher.search_symbols(prefix, offset).await
    }

    /// Place an order for `request.symbol`, resolving a ticker to its id first.
    ///
    /// An unknown ticker is an `InvalidArgument`; no order is sent.
    #[instrument(skip(self), fields(account = %request.account, symbol = %request.symbol))]
    pub async fn place_order(&self, request: &OrderRequest) -> Result<PlaceOrderResponse> {
        let Some(symbol_id) = self.symbols.lookup(request.symbol.clone()).await? else {
            return Err(ApiError::invalid_argument(format!(
                "unknown symbol `{}`",
                request.symbol
            )));
        };

        let defaults = &self.dispatcher.config().order_defaults;
        let descriptor = Self::place_order_descriptor(request, symbol_id, defaults)?;
        let response: PlaceOrderResponse = self.dispatcher.call(&descriptor).await?;
        info!(order_id = ?response.order_id, "Order placed");
        Ok(response)
    }

    /// GET descriptor with `startTime`/`endTime`, defaulting to today.
    pub fn ranged_descriptor(
        endpoint: &str,
        account: &str,
        range: Option<TimeRange>,
    ) -> RequestDescriptor {
        let range = range.unwrap_or_else(TimeRange::today);
        RequestDescriptor::get(endpoint)
            .arg(account)
            .param("startTime", range.start_param())
            .param("endTime", range.end_param())
    }

    pub fn orders_descriptor(account: &str, query: &OrdersQuery) -> RequestDescriptor {
        Self::ranged_descriptor(ORDERS, account, query.range)
            .param("stateFilter", query.state_filter.to_string())
            .param_opt("orderId", query.order_id)
    }

    pub fn place_order_descriptor(
        request: &OrderRequest,
        symbol_id: i64,
        defaults: &OrderDefaults,
    ) -> Result<RequestDescriptor> {
        if request.quantity == 0 {
            return Err(ApiError::invalid_argument("order quantity must be positive"));
        }
        let limit_price = match (defaults.order_type.requires_limit_price(), request.limit_price) {
            (true, None) => {
                return Err(ApiError::invalid_argument(format!(
                    "{} orders need a limit price",
                    defaults.order_type
                )));
            }
            (_, Some(price)) if !price.is_finite() || price <= 0.0 => {
                return Err(ApiError::invalid_argument(format!(
                    "limit price must be a positive number, got {price}"
                )));
            }
            (true, price) => price,
            (false, _) => None,
        };

        Ok(RequestDescriptor::post(ORDERS)
            .arg(&request.account)
            .param("accountNumber", &request.account)
            .param("symbolId", symbol_id)
            .param("quantity", request.quantity)
            .param_opt("limitPrice", limit_price)
            .param("isAllOrNone", defaults.is_all_or_none)
            .param("isAnonymous", defaults.is_anonymous)
            .param("orderType", defaults.order_type)
            .param("timeInForce", defaults.time_in_force)
            .param("action", defaults.action)
            .param("primaryRoute", &defaults.primary_route)
            .param("secondaryRoute", &defaults.secondary_route))
    }
}
