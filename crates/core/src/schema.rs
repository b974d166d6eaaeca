use crate::error::SchemaValidationError;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Vendor or buyer details.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PartyInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

/// One line item of the order or invoice.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub quantity: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub unit_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_price: Option<f64>,
}

/// The structured record extracted from one PDF. Every field is optional
/// and serializes as an explicit `null` when absent; unrecognized
/// top-level keys in a model response are a validation error, never
/// silently accepted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoBillData {
    #[serde(default)]
    pub po_number: Option<String>,
    #[serde(default)]
    pub po_date: Option<String>,
    #[serde(default)]
    pub vendor: Option<PartyInfo>,
    #[serde(default)]
    pub buyer: Option<PartyInfo>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub billing_address: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub subtotal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub tax: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub terms_and_conditions: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MaybeNumber {
    Number(f64),
    Text(String),
}

/// Accepts a JSON number, a numeric string, or null. Models often quote
/// amounts; anything that doesn't parse as a number is still an error.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<MaybeNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(MaybeNumber::Number(value)) => Ok(Some(value)),
        Some(MaybeNumber::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("expected a number, got {text:?}")))
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MaybeInt {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Accepts a JSON integer, an integral float, a numeric string, or null.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<MaybeInt>::deserialize(deserializer)? {
        None => Ok(None),
        Some(MaybeInt::Int(value)) => Ok(Some(value)),
        Some(MaybeInt::Float(value)) => {
            if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
                Ok(Some(value as i64))
            } else {
                Err(de::Error::custom(format!("expected an integer, got {value}")))
            }
        }
        Some(MaybeInt::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("expected an integer, got {text:?}")))
        }
    }
}

/// Strictly validates the model's free-form reply against [`PoBillData`].
/// Tolerates code fences and surrounding prose around the JSON object, but
/// nothing inside it: malformed JSON, wrong types, and unknown top-level
/// keys all fail with the raw response attached.
pub fn parse_model_response(raw: &str) -> Result<PoBillData, SchemaValidationError> {
    let candidate = locate_json_object(raw)
        .ok_or_else(|| SchemaValidationError::new("no JSON object in model response", raw))?;

    serde_json::from_str::<PoBillData>(candidate)
        .map_err(|error| SchemaValidationError::new(error.to_string(), raw))
}

fn locate_json_object(raw: &str) -> Option<&str> {
    let body = fenced_block(raw).unwrap_or(raw);
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&body[start..=end])
}

/// Returns the content of the first ``` fence pair, skipping the info
/// string on the opening line.
fn fenced_block(raw: &str) -> Option<&str> {
    let open = raw.find("```")?;
    let after_open = &raw[open + 3..];
    let newline = after_open.find('\n')?;
    let body = &after_open[newline + 1..];
    let close = body.find("```")?;
    Some(&body[..close])
}

struct FieldSpec {
    name: &'static str,
    kind: &'static str,
    description: &'static str,
}

const TOP_LEVEL_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "po_number", kind: "string | null", description: "Purchase Order number" },
    FieldSpec { name: "po_date", kind: "string | null", description: "Date of the PO" },
    FieldSpec { name: "vendor", kind: "{\"name\", \"address\", \"contact\": string | null} | null", description: "Details of the vendor" },
    FieldSpec { name: "buyer", kind: "{\"name\", \"address\", \"contact\": string | null} | null", description: "Details of the buyer" },
    FieldSpec { name: "shipping_address", kind: "string | null", description: "Shipping address" },
    FieldSpec { name: "billing_address", kind: "string | null", description: "Billing address" },
    FieldSpec { name: "line_items", kind: "array of line items, possibly empty", description: "List of items in the PO or Bill" },
    FieldSpec { name: "subtotal", kind: "number | null", description: "Subtotal before tax" },
    FieldSpec { name: "tax", kind: "number | null", description: "Tax amount" },
    FieldSpec { name: "total_amount", kind: "number | null", description: "Total amount including tax" },
    FieldSpec { name: "terms_and_conditions", kind: "string | null", description: "Terms and conditions" },
];

const LINE_ITEM_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "name", kind: "string | null", description: "Product or service name" },
    FieldSpec { name: "description", kind: "string | null", description: "Line item description" },
    FieldSpec { name: "quantity", kind: "integer | null", description: "Quantity ordered" },
    FieldSpec { name: "unit_price", kind: "number | null", description: "Unit price of the item" },
    FieldSpec { name: "total_price", kind: "number | null", description: "Total price (quantity x unit price)" },
];

/// Renders the machine-readable schema description embedded in the
/// extraction prompt. Pure function over the field tables above.
pub fn format_instructions() -> String {
    let mut out = String::from(
        "Respond with a single JSON object and nothing else, with exactly these fields:\n",
    );
    for field in TOP_LEVEL_FIELDS {
        out.push_str(&format!(
            "- \"{}\" ({}): {}\n",
            field.name, field.kind, field.description
        ));
    }
    out.push_str("\nEach element of \"line_items\" is an object with:\n");
    for field in LINE_ITEM_FIELDS {
        out.push_str(&format!(
            "- \"{}\" ({}): {}\n",
            field.name, field.kind, field.description
        ));
    }
    out.push_str(
        "\nUse null for any value that is not present in the document. \
         Do not invent fields that are not listed above.",
    );
    out
}
