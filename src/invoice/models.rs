use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Invoice payload accepted by `POST /api/pdf/generate`.
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceData {
    pub seller: String,
    #[serde(default)]
    pub seller_gstin: String,
    #[serde(default)]
    pub seller_address: String,
    pub buyer: String,
    #[serde(default)]
    pub buyer_gstin: String,
    #[serde(default)]
    pub buyer_address: String,
    /// Absent or `null` is accepted here and rejected when rendering.
    #[serde(default)]
    pub items: Option<Vec<LineItem>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct LineItem {
    #[serde(default)]
    pub name: String,
    /// Free text shown as given, e.g. `"5"` or `"2 boxes"`.
    #[serde(default, deserialize_with = "quantity_text")]
    pub quantity: String,
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub amount: f64,
}

/// Accept the quantity as a string or a bare JSON number.
fn quantity_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Quantity {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Quantity>::deserialize(deserializer)? {
        Some(Quantity::Text(text)) => text,
        Some(Quantity::Number(number)) => number.to_string(),
        None => String::new(),
    })
}
