//! Response payloads.
//!
//! Top-level collections are required so an unexpected document is reported as malformed;
//! per-record fields are optional because the broker omits them freely.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerTime {
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountsResponse {
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
    pub number: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_primary: Option<bool>,
    #[serde(default)]
    pub is_billing: Option<bool>,
    #[serde(default)]
    pub client_account_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionsResponse {
    pub positions: Vec<Position>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Position {
    pub symbol: Option<String>,
    pub symbol_id: Option<i64>,
    pub open_quantity: Option<f64>,
    pub closed_quantity: Option<f64>,
    pub current_market_value: Option<f64>,
    pub current_price: Option<f64>,
    pub average_entry_price: Option<f64>,
    pub closed_pnl: Option<f64>,
    pub open_pnl: Option<f64>,
    pub total_cost: Option<f64>,
    pub is_real_time: Option<bool>,
    pub is_under_reorg: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancesResponse {
    pub per_currency_balances: Vec<Balance>,
    pub combined_balances: Vec<Balance>,
    #[serde(default)]
    pub sod_per_currency_balances: Vec<Balance>,
    #[serde(default)]
    pub sod_combined_balances: Vec<Balance>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Balance {
    pub currency: Option<String>,
    pub cash: Option<f64>,
    pub market_value: Option<f64>,
    pub total_equity: Option<f64>,
    pub buying_power: Option<f64>,
    pub maintenance_excess: Option<f64>,
    pub is_real_time: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionsResponse {
    pub executions: Vec<Execution>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Execution {
    pub symbol: Option<String>,
    pub symbol_id: Option<i64>,
    pub quantity: Option<f64>,
    pub side: Option<String>,
    pub price: Option<f64>,
    pub id: Option<i64>,
    pub order_id: Option<i64>,
    pub order_chain_id: Option<i64>,
    pub exchange_exec_id: Option<String>,
    pub timestamp: Option<String>,
    pub notes: Option<String>,
    pub venue: Option<String>,
    pub total_cost: Option<f64>,
    pub commission: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdersResponse {
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Order {
    pub id: Option<i64>,
    pub symbol: Option<String>,
    pub symbol_id: Option<i64>,
    pub total_quantity: Option<f64>,
    pub open_quantity: Option<f64>,
    pub filled_quantity: Option<f64>,
    pub canceled_quantity: Option<f64>,
    pub side: Option<String>,
    pub order_type: Option<String>,
    pub limit_price: Option<f64>,
    pub stop_price: Option<f64>,
    pub avg_exec_price: Option<f64>,
    pub time_in_force: Option<String>,
    pub state: Option<String>,
    pub creation_time: Option<String>,
    pub update_time: Option<String>,
    pub primary_route: Option<String>,
    pub secondary_route: Option<String>,
    pub is_all_or_none: Option<bool>,
    pub is_anonymous: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    #[serde(default)]
    pub order_id: Option<i64>,
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitiesResponse {
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Activity {
    pub trade_date: Option<String>,
    pub transaction_date: Option<String>,
    pub settlement_date: Option<String>,
    pub action: Option<String>,
    pub symbol: Option<String>,
    pub symbol_id: Option<i64>,
    pub description: Option<String>,
    pub currency: Option<String>,
    pub quantity: Option<f64>,
    pub price: Option<f64>,
    pub gross_amount: Option<f64>,
    pub commission: Option<f64>,
    pub net_amount: Option<f64>,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSearchResponse {
    pub symbols: Vec<EquitySymbol>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EquitySymbol {
    pub symbol: Option<String>,
    pub symbol_id: Option<i64>,
    pub description: Option<String>,
    pub security_type: Option<String>,
    pub listing_exchange: Option<String>,
    pub is_tradable: Option<bool>,
    pub is_quotable: Option<bool>,
    pub currency: Option<String>,
}
