use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// Lead form payload as posted by the landing page. Everything is optional
// and untrusted; `locale` is accepted but plays no part in the decision.
#[derive(Debug, Default)]
pub struct LeadSubmission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub locale: Option<String>,
}

impl TryFrom<Map<String, Value>> for LeadSubmission {
    type Error = String;

    fn try_from(mut fields: Map<String, Value>) -> Result<Self, Self::Error> {
        Ok(Self {
            name: text_field(&mut fields, "name")?,
            email: text_field(&mut fields, "email")?,
            company: text_field(&mut fields, "company")?,
            locale: text_field(&mut fields, "locale")?,
        })
    }
}

// Absent and null both mean "not filled in"; anything but a string is an error
fn text_field(fields: &mut Map<String, Value>, key: &str) -> Result<Option<String>, String> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(other) => Err(format!("field `{key}` must be a string, got {other}")),
    }
}

// Trimmed fields of an accepted submission
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    pub name: String,
    pub email: String,
    pub company: String,
}

// Body of every /api/lead response
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LeadResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Lead>,
}
