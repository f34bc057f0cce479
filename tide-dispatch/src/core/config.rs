use crate::models::{PrintTarget, WatchDefinition, normalize_target_name};
use crate::printing::receipt::MIN_WIDTH;
use crate::printing::{IdentifierLayout, VenueInfo};
use crate::utils::ConfigError;
use chrono_tz::Tz;
use std::path::PathBuf;
use std::time::Duration;
use tide_printer::DeviceFamily;

/// Dispatch service configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./work_dir | order store file and logs |
/// | ENVIRONMENT | development | development / staging / production |
/// | LOG_LEVEL | info | tracing filter |
/// | LOG_JSON | false in development | JSON console logs |
/// | PRINTING_ENABLED | true only in production | gates the physical print |
/// | ORDER_COLLECTION | orders | watched collection |
/// | FALLBACK_TARGET | restaurant | target for unknown routing |
/// | PRINTER_IO_TIMEOUT_MS | 5000 | printer connect/write timeout |
/// | PRINT_TARGETS | kitchen,restaurant,main_bar,beach_bar | target names |
/// | PRINTER_<NAME>_INTERFACE | unset (target disabled) | e.g. tcp://10.0.0.5:9100 |
/// | PRINTER_<NAME>_WIDTH | 48 | characters per line, at least 24 |
/// | PRINTER_<NAME>_TYPE | epson | epson / star |
/// | VENUE_NAME | | receipt header |
/// | VENUE_ADDRESS | | address lines, `|`-separated |
/// | VENUE_PHONES | | phone numbers, `|`- or `,`-separated |
/// | RECEIPT_TIMEZONE | UTC | IANA zone for receipt timestamps |
/// | RECEIPT_RIGHT_COLUMN | unset (justified) | fixed offset of the identifier right column |
/// | WATCHERS | new_orders,reprints,kitchen | enabled watchers |
/// | INBOX_DIR | work_dir/inbox | operator command files (`*.jsonl`) |
/// | INBOX_POLL_MS | 1000 | inbox scan interval |
///
/// # Example
///
/// ```ignore
/// ENVIRONMENT=production PRINTER_RESTAURANT_INTERFACE=tcp://10.0.0.5:9100 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Holds the order store file and logs
    pub work_dir: String,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    /// Physical printing; when off, jobs are rendered and logged only
    pub printing_enabled: bool,
    pub order_collection: String,
    pub fallback_target: String,
    pub printer_io_timeout_ms: u64,
    /// Targets with a configured interface
    pub targets: Vec<PrintTarget>,
    pub venue_name: String,
    pub venue_address: Vec<String>,
    pub venue_phones: Vec<String>,
    pub receipt_timezone: String,
    pub receipt_right_column: Option<usize>,
    pub watchers: Vec<String>,
    /// Overrides work_dir/inbox
    pub inbox_dir: Option<String>,
    pub inbox_poll_ms: u64,
}

const DEFAULT_TARGETS: &str = "kitchen,restaurant,main_bar,beach_bar";
const DEFAULT_WATCHERS: &str = "new_orders,reprints,kitchen";
const DEFAULT_WIDTH: usize = 48;
const DEFAULT_INBOX_POLL_MS: u64 = 1000;

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparseable values fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let parsed = |key: &str| get(key).and_then(|v| v.to_lowercase().parse::<bool>().ok());

        let environment = get("ENVIRONMENT").unwrap_or_else(|| "development".into());
        let is_production = environment == "production";
        let printer_io_timeout_ms = get("PRINTER_IO_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        let target_names = split_list(&get("PRINT_TARGETS").unwrap_or_else(|| DEFAULT_TARGETS.into()), &[',']);
        let targets = target_names
            .iter()
            .filter_map(|name| {
                let name = normalize_target_name(name);
                let key = name.to_uppercase();
                let interface = get(&format!("PRINTER_{}_INTERFACE", key))?;
                let width = get(&format!("PRINTER_{}_WIDTH", key))
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_WIDTH);
                let family = get(&format!("PRINTER_{}_TYPE", key))
                    .map(|t| DeviceFamily::parse(&t))
                    .unwrap_or_default();
                Some(
                    PrintTarget::new(name, interface, width)
                        .with_family(family)
                        .with_timeout(Duration::from_millis(printer_io_timeout_ms)),
                )
            })
            .collect();

        Self {
            work_dir: get("WORK_DIR").unwrap_or_else(|| "./work_dir".into()),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_json: parsed("LOG_JSON").unwrap_or(environment != "development"),
            printing_enabled: parsed("PRINTING_ENABLED").unwrap_or(is_production),
            order_collection: get("ORDER_COLLECTION").unwrap_or_else(|| "orders".into()),
            fallback_target: normalize_target_name(
                &get("FALLBACK_TARGET").unwrap_or_else(|| "restaurant".into()),
            ),
            printer_io_timeout_ms,
            targets,
            venue_name: get("VENUE_NAME").unwrap_or_default(),
            venue_address: split_list(&get("VENUE_ADDRESS").unwrap_or_default(), &['|']),
            venue_phones: split_list(&get("VENUE_PHONES").unwrap_or_default(), &['|', ',']),
            receipt_timezone: get("RECEIPT_TIMEZONE").unwrap_or_else(|| "UTC".into()),
            receipt_right_column: get("RECEIPT_RIGHT_COLUMN").and_then(|v| v.parse().ok()),
            watchers: split_list(&get("WATCHERS").unwrap_or_else(|| DEFAULT_WATCHERS.into()), &[',']),
            inbox_dir: get("INBOX_DIR"),
            inbox_poll_ms: get("INBOX_POLL_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_INBOX_POLL_MS),
            environment,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("orders.redb")
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    pub fn inbox_dir(&self) -> PathBuf {
        match &self.inbox_dir {
            Some(dir) => PathBuf::from(dir),
            None => PathBuf::from(&self.work_dir).join("inbox"),
        }
    }

    pub fn inbox_poll_interval(&self) -> Duration {
        Duration::from_millis(self.inbox_poll_ms)
    }

    /// Reject values that parse but cannot work: paper narrower than the
    /// receipt minimum and zero durations
    pub fn validate(&self) -> Result<(), ConfigError> {
        for target in &self.targets {
            if target.width < MIN_WIDTH {
                return Err(ConfigError::InvalidValue {
                    key: format!("PRINTER_{}_WIDTH", target.name.to_uppercase()),
                    value: target.width.to_string(),
                });
            }
        }
        if self.printer_io_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PRINTER_IO_TIMEOUT_MS".into(),
                value: "0".into(),
            });
        }
        if self.inbox_poll_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "INBOX_POLL_MS".into(),
                value: "0".into(),
            });
        }
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.receipt_timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(self.receipt_timezone.clone()))
    }

    pub fn venue(&self) -> VenueInfo {
        VenueInfo {
            name: self.venue_name.clone(),
            address: self.venue_address.clone(),
            phones: self.venue_phones.clone(),
        }
    }

    pub fn identifier_layout(&self) -> IdentifierLayout {
        match self.receipt_right_column {
            Some(right_column) => IdentifierLayout::FixedColumn { right_column },
            None => IdentifierLayout::Justified,
        }
    }

    /// Enabled watch definitions, in configuration order
    pub fn watch_definitions(&self) -> Result<Vec<WatchDefinition>, ConfigError> {
        self.watchers
            .iter()
            .map(|name| {
                WatchDefinition::by_name(name, &self.order_collection)
                    .ok_or_else(|| ConfigError::UnknownWatcher(name.clone()))
            })
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn split_list(raw: &str, separators: &[char]) -> Vec<String> {
    raw.split(separators)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
