use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ACCEPTED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub food: String,
}

impl AnalysisRequest {
    /// `None` when `food` is missing, not a string, or blank. The value is trimmed.
    pub fn from_json(payload: &Value) -> Option<Self> {
        payload
            .get("food")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|food| !food.is_empty())
            .map(|food| Self {
                food: food.to_string(),
            })
    }
}

/// Body of `POST /api/analyze-image`.
#[derive(Debug, Clone)]
pub struct ImageAnalysisRequest {
    pub image: String,
    pub media_type: String,
}

impl ImageAnalysisRequest {
    /// Non-string fields read as empty.
    pub fn from_json(payload: &Value) -> Self {
        let field = |name: &str| {
            payload
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string()
        };
        Self {
            image: field("image"),
            media_type: field("media_type"),
        }
    }

    /// Base64 payload with any `data:<type>;base64,` prefix removed.
    pub fn base64_data(&self) -> &str {
        match self.image.strip_prefix("data:") {
            Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
            None => &self.image,
        }
    }
}

/// Photo ready to send upstream: bare base64 plus its MIME type.
#[derive(Debug, Clone)]
pub struct FoodImage {
    pub media_type: String,
    pub data: String,
}

/// The model's verdict, kept as the JSON object it sent so unknown or
/// oddly-typed fields pass through to the browser untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResult(pub Map<String, Value>);

impl AnalysisResult {
    pub fn food(&self) -> Option<&str> {
        self.0.get("food").and_then(Value::as_str)
    }

    #[cfg(test)]
    pub fn rating(&self) -> Option<i64> {
        self.0.get("rating").and_then(Value::as_i64)
    }

    /// `?` when the model left the rating out, for log lines.
    pub fn rating_label(&self) -> String {
        match self.0.get("rating") {
            Some(Value::Null) | None => "?".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub fn verdict(&self) -> Result<FoodVerdict, String> {
        let verdict: FoodVerdict =
            serde_json::from_value(Value::Object(self.0.clone())).map_err(|e| e.to_string())?;
        verdict.validate()?;
        Ok(verdict)
    }
}

/// Typed form of the verdict the system prompt asks for.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FoodVerdict {
    pub food: String,
    pub rating: u8,
    pub portion: String,
    pub calories: String,
    pub explanation: String,
    pub alternative: Option<String>,
}

impl FoodVerdict {
    /// Rating in 1..=10 and `alternative` present exactly when rating < 6.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=10).contains(&self.rating) {
            return Err(format!("rating {} is outside 1-10", self.rating));
        }
        match (&self.alternative, self.rating >= 6) {
            (Some(_), true) => Err(format!(
                "alternative must be null for rating {}",
                self.rating
            )),
            (None, false) => Err(format!(
                "alternative is required for rating {}",
                self.rating
            )),
            _ => Ok(()),
        }
    }
}
