use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Wire format for `startTime` / `endTime`.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
    TrailStopInPercentage,
    TrailStopInDollar,
    TrailStopLimitInPercentage,
    TrailStopLimitInDollar,
    LimitOnOpen,
    LimitOnClose,
}

impl OrderType {
    /// Whether the order body must carry `limitPrice`.
    pub fn requires_limit_price(&self) -> bool {
        matches!(
            self,
            Self::Limit
                | Self::StopLimit
                | Self::TrailStopLimitInPercentage
                | Self::TrailStopLimitInDollar
                | Self::LimitOnOpen
                | Self::LimitOnClose
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum TimeInForce {
    Day,
    GoodTillCanceled,
    GoodTillExtendedDay,
    GoodTillDate,
    ImmediateOrCancel,
    FillOrKill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum OrderAction {
    Buy,
    Sell,
}

/// `stateFilter` of the order listing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum OrderStateFilter {
    #[default]
    All,
    Open,
    Closed,
}

/// Inclusive time window for executions, orders and activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl TimeRange {
    pub fn new(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self { start, end }
    }

    /// Start to end of the current local day.
    pub fn today() -> Self {
        Self::day_of(Local::now().date_naive(), &Local)
    }

    /// `00:00:00` to `23:59:59` of `date` in `tz`.
    ///
    /// On a DST gap the earliest valid instant is used; if the zone has no mapping at all
    /// the day is taken as UTC offsets.
    pub fn day_of<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Self {
        let start = local_instant(date.and_hms_opt(0, 0, 0).unwrap_or_default(), tz);
        let end = local_instant(date.and_hms_opt(23, 59, 59).unwrap_or_default(), tz);
        Self { start, end }
    }

    pub fn start_param(&self) -> String {
        self.start.format(TIME_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(TIME_FORMAT).to_string()
    }
}

fn local_instant<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> DateTime<Local> {
    match tz.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.with_timezone(&Local),
        None => Local.from_utc_datetime(&naive),
    }
}

/// Filters for the order listing. Every field falls back to the listing defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrdersQuery {
    pub range: Option<TimeRange>,
    pub state_filter: OrderStateFilter,
    pub order_id: Option<i64>,
}

impl OrdersQuery {
    pub fn with_range(mut self, range: TimeRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_state(mut self, state_filter: OrderStateFilter) -> Self {
        self.state_filter = state_filter;
        self
    }

    pub fn with_order_id(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case("limit", OrderType::Limit)]
    #[case("StopLimit", OrderType::StopLimit)]
    #[case("MARKET", OrderType::Market)]
    fn test_order_type_parses_case_insensitively(#[case] input: &str, #[case] expected: OrderType) {
        assert_eq!(OrderType::from_str(input).unwrap(), expected);
    }

    #[rstest]
    #[case(OrderType::Market, false)]
    #[case(OrderType::Stop, false)]
    #[case(OrderType::Limit, true)]
    #[case(OrderType::StopLimit, true)]
    fn test_requires_limit_price(#[case] order_type: OrderType, #[case] expected: bool) {
        assert_eq!(order_type.requires_limit_price(), expected);
    }

    #[test]
    fn test_wire_names_are_pascal_case() {
        assert_eq!(OrderStateFilter::default().to_string(), "All");
        assert_eq!(
            serde_json::to_value(TimeInForce::GoodTillCanceled).unwrap(),
            "GoodTillCanceled"
        );
        assert_eq!(OrderAction::Sell.to_string(), "Sell");
    }

    #[test]
    fn test_day_of_spans_whole_day() {
        let tz = FixedOffset::west_opt(4 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let range = TimeRange::day_of(date, &tz);

        let start = range.start.with_timezone(&tz);
        let end = range.end.with_timezone(&tz);
        assert_eq!(start.format(TIME_FORMAT).to_string(), "2026-10-16T00:00:00-04:00");
        assert_eq!(end.format(TIME_FORMAT).to_string(), "2026-10-16T23:59:59-04:00");
    }

    #[test]
    fn test_today_params_share_local_date() {
        let range = TimeRange::today();
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();

        assert!(range.start_param().starts_with(&format!("{today}T00:00:00")));
        assert!(range.end_param().starts_with(&format!("{today}T23:59:59")));
    }
}
