use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::ProxyError;
use crate::utils::constants::{MISSING_PARAMS_MSG, SERVICE_NAME};

/// ================================
/// Proxy-facing requests
/// ================================

/// Query filters of `GET /cities`. Empty values are not forwarded.
#[derive(Debug, Default, Clone)]
pub struct CityFilter {
    pub country_code: Option<String>,
    pub city: Option<String>,
}

impl CityFilter {
    /// Build from raw query pairs; a repeated key keeps its first value, unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut filter = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "country_code" => &mut filter.country_code,
                "city" => &mut filter.city,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        filter
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [("country_code", &self.country_code), ("city", &self.city)]
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .map(|v| (key, v))
            })
            .collect()
    }
}

/// Body of `POST /calc`. Fields arrive as numbers or numeric strings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CalcRequest {
    pub from_code: Option<Value>,
    pub to_code: Option<Value>,
    pub weight: Option<Value>,
    pub length: Option<Value>,
    pub width: Option<Value>,
    pub height: Option<Value>,
    pub tariff_code: Option<Value>,
}

impl CalcRequest {
    /// Build the calculator payload, or reject the request without touching the network.
    pub fn to_payload(&self) -> Result<TariffPayload, ProxyError> {
        let required = [&self.from_code, &self.to_code, &self.weight, &self.tariff_code];
        if !required.iter().all(|v| is_truthy(v)) {
            return Err(ProxyError::Validation(MISSING_PARAMS_MSG.to_owned()));
        }

        Ok(TariffPayload {
            kind: 1,
            currency: 1,
            tariff_code: required_number("tariff_code", &self.tariff_code)?,
            from_location: Location {
                code: required_number("from_code", &self.from_code)?,
            },
            to_location: Location {
                code: required_number("to_code", &self.to_code)?,
            },
            packages: vec![Package {
                weight: required_number("weight", &self.weight)?,
                length: dimension("length", &self.length)?,
                width: dimension("width", &self.width)?,
                height: dimension("height", &self.height)?,
            }],
        })
    }
}

/// null, false, 0 and "" count as missing
fn is_truthy(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn required_number(field: &str, value: &Option<Value>) -> Result<Number, ProxyError> {
    value
        .as_ref()
        .and_then(to_number)
        .ok_or_else(|| invalid_number(field))
}

/// absent or falsy dimensions become 0
fn dimension(field: &str, value: &Option<Value>) -> Result<Number, ProxyError> {
    if !is_truthy(value) {
        return Ok(Number::from(0));
    }
    required_number(field, value)
}

fn to_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Number::from)
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(Number::from_f64))
        }
        _ => None,
    }
}

fn invalid_number(field: &str) -> ProxyError {
    ProxyError::Validation(format!("invalid numeric parameter: {field}"))
}

/// ================================
/// Carrier wire types
/// ================================

/// Request body of `POST {api_base}/calculator/tariff`.
#[derive(Debug, Clone, Serialize)]
pub struct TariffPayload {
    #[serde(rename = "type")]
    pub kind: u8,
    pub currency: u8,
    pub tariff_code: Number,
    pub from_location: Location,
    pub to_location: Location,
    pub packages: Vec<Package>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub code: Number,
}

#[derive(Debug, Clone, Serialize)]
pub struct Package {
    pub weight: Number,
    pub length: Number,
    pub width: Number,
    pub height: Number,
}

/// Fields of a successful calculator response relayed to the client, whatever their JSON type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TariffQuote {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tariff_code: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tariff_name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_sum: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_min: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_max: Option<Value>,
}

impl TariffQuote {
    /// Pick the relayed fields out of the carrier body; everything else is dropped.
    /// A field present as `null` stays `null`, an absent one is omitted.
    pub fn from_body(body: &Value) -> Self {
        let field = |key: &str| body.get(key).cloned();
        Self {
            tariff_code: field("tariff_code"),
            tariff_name: field("tariff_name"),
            delivery_sum: field("delivery_sum"),
            period_min: field("period_min"),
            period_max: field("period_max"),
        }
    }
}

/// ================================
/// Proxy-facing responses
/// ================================

#[derive(Debug, Serialize)]
pub struct TariffResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub quote: TariffQuote,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub ok: bool,
    pub service: &'static str,
    pub routes: [&'static str; 2],
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            ok: true,
            service: SERVICE_NAME,
            routes: ["/calc", "/cities"],
        }
    }
}
