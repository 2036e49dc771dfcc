use serde::Deserialize;

use crate::utils::{
    de_coerced_bool, de_coerced_f64, de_coerced_string, de_coerced_u32, format_aum,
    format_currency, format_percent, format_ratio_percent,
};

/// One ticker's raw attributes as returned by the screener feed.
///
/// The `#[serde(rename)]` table below is the canonical source-to-field
/// mapping; every downstream consumer depends on it. Unknown keys are
/// dropped at this boundary, and loosely-typed values are coerced rather
/// than rejected (a bad field becomes "no value", not an error).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawScreenerEntry {
    #[serde(deserialize_with = "de_coerced_string")]
    pub issuer: String,
    #[serde(rename = "n", deserialize_with = "de_coerced_string")]
    pub description: String,
    #[serde(rename = "assetClass", deserialize_with = "de_coerced_string")]
    pub asset_class: String,
    #[serde(rename = "inceptionDate", deserialize_with = "de_coerced_string")]
    pub inception_date: String,
    #[serde(deserialize_with = "de_coerced_string")]
    pub exchange: String,
    #[serde(rename = "etfLeverage", deserialize_with = "de_coerced_string")]
    pub leverage: String,
    #[serde(deserialize_with = "de_coerced_f64")]
    pub aum: Option<f64>,
    #[serde(deserialize_with = "de_coerced_f64")]
    pub close: Option<f64>,
    #[serde(deserialize_with = "de_coerced_u32")]
    pub holdings: Option<u32>,
    #[serde(deserialize_with = "de_coerced_f64")]
    pub price: Option<f64>,
    #[serde(deserialize_with = "de_coerced_string")]
    pub cusip: String,
    #[serde(deserialize_with = "de_coerced_string")]
    pub isin: String,
    #[serde(rename = "etfCategory", deserialize_with = "de_coerced_string")]
    pub category: String,
    #[serde(rename = "expenseRatio", deserialize_with = "de_coerced_f64")]
    pub expense_ratio: Option<f64>,
    #[serde(rename = "etfIndex", deserialize_with = "de_coerced_string")]
    pub tracking_index: String,
    #[serde(rename = "etfRegion", deserialize_with = "de_coerced_string")]
    pub region: String,
    #[serde(rename = "etfCountry", deserialize_with = "de_coerced_string")]
    pub country: String,
    #[serde(deserialize_with = "de_coerced_bool")]
    pub optionable: bool,
}

/// One row of the normalized ETF table.
///
/// Numeric fields keep the raw value as the canonical representation;
/// display strings are derived on demand so nothing downstream ever has
/// to re-parse `$450,000.00M` back into a number.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub ticker: String,
    pub issuer: String,
    pub description: String,
    pub asset_class: String,
    pub inception_date: String,
    pub aum: Option<f64>,
    pub expense_ratio: Option<f64>,
    pub holdings: Option<u32>,
    pub price: Option<f64>,
    /// Prior close, kept only to derive the price-change fields.
    pub close: Option<f64>,
    pub cusip: String,
    pub category: String,
    pub tracking_index: String,
    pub region: String,
    pub country: String,
    pub has_options: bool,
}

impl NormalizedRecord {
    pub fn from_raw(ticker: &str, raw: RawScreenerEntry) -> Self {
        Self {
            ticker: ticker.trim().to_uppercase(),
            issuer: raw.issuer,
            description: raw.description,
            asset_class: raw.asset_class,
            inception_date: raw.inception_date,
            aum: raw.aum,
            expense_ratio: raw.expense_ratio,
            holdings: raw.holdings,
            price: raw.price,
            close: raw.close,
            cusip: raw.cusip,
            category: raw.category,
            tracking_index: raw.tracking_index,
            region: raw.region,
            country: raw.country,
            has_options: raw.optionable,
        }
    }

    /// Current price as `$1,234.56`; empty when the value is missing.
    pub fn price_display(&self) -> String {
        self.price.map(format_currency).unwrap_or_default()
    }

    /// AUM as `$450,000.00M`; empty when the value is missing.
    pub fn aum_display(&self) -> String {
        self.aum.map(format_aum).unwrap_or_default()
    }

    /// Expense ratio as `9.45%`; empty when the value is missing.
    pub fn expense_ratio_display(&self) -> String {
        self.expense_ratio.map(format_ratio_percent).unwrap_or_default()
    }

    pub fn holdings_display(&self) -> String {
        self.holdings.map(|h| h.to_string()).unwrap_or_default()
    }
}

/// A normalized record with the actively-managed tag joined on and the
/// derived price-comparison fields computed.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub record: NormalizedRecord,
    /// Resolved tag: true iff the ticker appeared in the secondary
    /// source. Always resolved, never "unknown".
    pub actively_managed: bool,
    /// `price - close`, present iff both prices are present.
    pub price_change: Option<f64>,
    /// `(price - close) / close * 100`, additionally requires a nonzero
    /// close.
    pub price_change_percent: Option<f64>,
}

impl EnrichedRecord {
    /// Canonical column names, in export order. CUSIP leads when present,
    /// matching the identifier-first layout the dashboard expects.
    pub const COLUMNS: [&'static str; 18] = [
        "CUSIP",
        "TICKER_SYMBOL",
        "ETF_ISSUER",
        "ETF_DESCRIPTION",
        "ASSET_CLASS",
        "INCEPTION_DATE",
        "ASSETS_UNDER_MANAGEMENT",
        "EXPENSE_RATIO",
        "NUMBER_OF_HOLDINGS",
        "CURRENT_PRICE",
        "ETF_CATEGORY",
        "TRACKING_INDEX",
        "GEOGRAPHIC_REGION",
        "COUNTRY_FOCUS",
        "HAS_OPTIONS",
        "ACTIVELY_MANAGED",
        "PRICE_CHANGE",
        "PRICE_CHANGE_PERCENT",
    ];

    pub fn actively_managed_display(&self) -> &'static str {
        if self.actively_managed {
            "YES"
        } else {
            "NO"
        }
    }

    /// Signed currency string (`$1.00`, `-$0.50`); empty when absent.
    pub fn price_change_display(&self) -> String {
        self.price_change.map(format_currency).unwrap_or_default()
    }

    /// Signed percentage string (`1.00%`, `-0.50%`); empty when absent.
    pub fn price_change_percent_display(&self) -> String {
        self.price_change_percent.map(format_percent).unwrap_or_default()
    }

    /// The display cells for one table row, in `COLUMNS` order.
    pub fn display_row(&self) -> Vec<String> {
        let r = &self.record;
        vec![
            r.cusip.clone(),
            r.ticker.clone(),
            r.issuer.clone(),
            r.description.clone(),
            r.asset_class.clone(),
            r.inception_date.clone(),
            r.aum_display(),
            r.expense_ratio_display(),
            r.holdings_display(),
            r.price_display(),
            r.category.clone(),
            r.tracking_index.clone(),
            r.region.clone(),
            r.country.clone(),
            (if r.has_options { "YES" } else { "NO" }).to_string(),
            self.actively_managed_display().to_string(),
            self.price_change_display(),
            self.price_change_percent_display(),
        ]
    }
}

/// Configuration for the pipeline, loaded from environment variables
/// with sensible defaults for every knob.
#[derive(Debug, Clone)]
pub struct Config {
    pub screener_url: String,
    pub active_etf_url: String,
    pub request_timeout_secs: u64,
    pub retry_attempts: u32,
    pub page_size: u32,
    pub max_pages: u32,
    pub page_delay_ms: u64,
    pub cache_ttl_secs: u64,
}

const DEFAULT_SCREENER_URL: &str = "https://api.stockanalysis.com/api/screener/e/bd/\
                                    issuer+n+assetClass+inceptionDate+exchange+etfLeverage+\
                                    aum+close+holdings+price+cusip+isin+etfCategory+\
                                    expenseRatio+etfIndex+etfRegion+etfCountry+optionable.json";

const DEFAULT_ACTIVE_ETF_URL: &str = "https://etfdb.com/api/screener/active";

impl Default for Config {
    fn default() -> Self {
        Self {
            screener_url: DEFAULT_SCREENER_URL.to_string(),
            active_etf_url: DEFAULT_ACTIVE_ETF_URL.to_string(),
            request_timeout_secs: 30,
            retry_attempts: 3,
            page_size: 100,
            max_pages: 50,
            page_delay_ms: 500,
            cache_ttl_secs: 3600,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let defaults = Config::default();
        Ok(Config {
            screener_url: std::env::var("SCREENER_URL").unwrap_or(defaults.screener_url),
            active_etf_url: std::env::var("ACTIVE_ETF_URL").unwrap_or(defaults.active_etf_url),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            retry_attempts: env_parse("RETRY_ATTEMPTS", defaults.retry_attempts),
            page_size: env_parse("PAGE_SIZE", defaults.page_size),
            max_pages: env_parse("MAX_PAGES", defaults.max_pages),
            page_delay_ms: env_parse("PAGE_DELAY_MS", defaults.page_delay_ms),
            cache_ttl_secs: env_parse("CACHE_TTL_SECS", defaults.cache_ttl_secs),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
