use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub event_buffer_size: usize,
    pub dispatch: DispatchPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

/// Knobs the dispatch engine consults at runtime.
#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    /// Reject pickups/deliveries whose code is missing or wrong instead of
    /// logging a warning and proceeding.
    pub strict_verification: bool,
    pub proof: ProofPolicy,
    pub earnings: EarningsPolicy,
}

/// Evidence a proof of delivery must carry before it can be completed.
#[derive(Debug, Clone, Copy)]
pub struct ProofPolicy {
    pub signature_required: bool,
    pub photo_required: bool,
    pub id_required: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct EarningsPolicy {
    pub base_rate: f64,
    pub per_km: f64,
    pub per_kg: f64,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            strict_verification: true,
            proof: ProofPolicy::default(),
            earnings: EarningsPolicy::default(),
        }
    }
}

impl Default for ProofPolicy {
    fn default() -> Self {
        Self {
            signature_required: true,
            photo_required: false,
            id_required: false,
        }
    }
}

impl Default for EarningsPolicy {
    fn default() -> Self {
        Self {
            base_rate: 50.0,
            per_km: 0.0,
            per_kg: 0.0,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") | Err(_) => LogFormat::Compact,
            Ok(other) => {
                return Err(AppError::Internal(format!(
                    "invalid LOG_FORMAT: {other}, expected compact/json"
                )));
            }
        };

        let defaults = DispatchPolicy::default();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            dispatch: DispatchPolicy {
                strict_verification: parse_or_default(
                    "STRICT_VERIFICATION",
                    defaults.strict_verification,
                )?,
                proof: ProofPolicy {
                    signature_required: parse_or_default(
                        "POD_SIGNATURE_REQUIRED",
                        defaults.proof.signature_required,
                    )?,
                    photo_required: parse_or_default(
                        "POD_PHOTO_REQUIRED",
                        defaults.proof.photo_required,
                    )?,
                    id_required: parse_or_default("POD_ID_REQUIRED", defaults.proof.id_required)?,
                },
                earnings: EarningsPolicy {
                    base_rate: parse_or_default("EARNINGS_BASE_RATE", defaults.earnings.base_rate)?,
                    per_km: parse_or_default("EARNINGS_PER_KM", defaults.earnings.per_km)?,
                    per_kg: parse_or_default("EARNINGS_PER_KG", defaults.earnings.per_kg)?,
                },
            },
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
