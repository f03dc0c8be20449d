//! JSON bodies exchanged between the browser/terminal client and the server.

use crate::{Character, HighScore, Position};
use serde::{Deserialize, Deserializer, Serialize};

pub const MSG_ALREADY_FOUND: &str = "Already found";
pub const MSG_MISS: &str = "Try again!";
pub const MSG_INVALID_CHARACTER: &str = "Invalid character";
pub const MSG_NO_GAME: &str = "No game in progress";

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(u32),
    Text(String),
}

/// Form posts deliver ids as strings while JSON clients send numbers; accept both.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match IdRepr::deserialize(deserializer)? {
        IdRepr::Number(id) => Ok(id),
        IdRepr::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Like `deserialize_id`, but a blank value (`?imageId=`) means no id.
pub fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<IdRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IdRepr::Number(id)) => Ok(Some(id)),
        Some(IdRepr::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(IdRepr::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    #[serde(deserialize_with = "deserialize_id")]
    pub image_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub x: f64,
    pub y: f64,
    #[serde(deserialize_with = "deserialize_id")]
    pub character_id: u32,
}

impl ValidateRequest {
    pub fn click(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// Result of a click. `position` is always the character's true position,
/// never the clicked point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_found: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidateResponse {
    pub fn hit(position: Position) -> Self {
        Self {
            success: true,
            position: Some(position),
            all_found: None,
            time: None,
            message: None,
        }
    }

    pub fn completed(position: Position, time: f64) -> Self {
        Self {
            success: true,
            position: Some(position),
            all_found: Some(true),
            time: Some(time),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            position: None,
            all_found: None,
            time: None,
            message: Some(message.into()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.all_found.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveScoreRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveScoreResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoresQuery {
    #[serde(
        default,
        rename = "imageId",
        deserialize_with = "deserialize_optional_id"
    )]
    pub image_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoresResponse {
    pub scores: Vec<HighScore>,
    pub image_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub id: u32,
    pub name: String,
}

/// What a player may see of a character before finding it: no position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSummary {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl From<&Character> for CharacterSummary {
    fn from(character: &Character) -> Self {
        Self {
            id: character.id,
            name: character.name.clone(),
            icon_url: character.icon_url.clone(),
        }
    }
}

/// The active puzzle as shown to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleView {
    pub image_id: u32,
    pub image_name: String,
    pub image_url: String,
    pub characters: Vec<CharacterSummary>,
    pub found: Vec<u32>,
    pub elapsed: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_request_accepts_string_id() {
        let request: ValidateRequest =
            serde_json::from_str(r#"{"x":0.4,"y":0.6,"characterId":"12"}"#).unwrap();
        assert_eq!(request.character_id, 12);

        let request: ValidateRequest =
            serde_json::from_str(r#"{"x":0.4,"y":0.6,"characterId":3}"#).unwrap();
        assert_eq!(request.character_id, 3);
        assert_eq!(request.click(), Position::new(0.4, 0.6));
    }

    #[test]
    fn test_validate_request_rejects_garbage_id() {
        let result: Result<ValidateRequest, _> =
            serde_json::from_str(r#"{"x":0.4,"y":0.6,"characterId":"waldo"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_hit_response_shape() {
        let json = serde_json::to_value(ValidateResponse::hit(Position::new(0.45, 0.6))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["position"]["x"], 0.45);
        assert!(json.get("allFound").is_none());
        assert!(json.get("time").is_none());
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_completed_response_shape() {
        let response = ValidateResponse::completed(Position::new(0.2, 0.8), 12.5);
        assert!(response.is_complete());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["allFound"], true);
        assert_eq!(json["time"], 12.5);
    }

    #[test]
    fn test_failure_response_shape() {
        let response = ValidateResponse::failure(MSG_MISS);
        assert!(!response.is_complete());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Try again!");
        assert!(json.get("position").is_none());
    }

    #[test]
    fn test_scores_response_uses_camel_case() {
        let response = ScoresResponse {
            scores: vec![HighScore {
                id: 1,
                name: "Ada".to_string(),
                time: 3.25,
                image_id: 2,
                created_at: 99,
            }],
            image_name: "Beach Waldo".to_string(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["imageName"], "Beach Waldo");
        assert_eq!(json["scores"][0]["imageId"], 2);
        assert_eq!(json["scores"][0]["createdAt"], 99);
    }

    #[test]
    fn test_scores_query_blank_image_id_is_absent() {
        let query: ScoresQuery = serde_json::from_str(r#"{"imageId":""}"#).unwrap();
        assert_eq!(query.image_id, None);

        let query: ScoresQuery = serde_json::from_str(r#"{"imageId":"  "}"#).unwrap();
        assert_eq!(query.image_id, None);

        let query: ScoresQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.image_id, None);

        let query: ScoresQuery = serde_json::from_str(r#"{"imageId":"2"}"#).unwrap();
        assert_eq!(query.image_id, Some(2));

        let query: ScoresQuery = serde_json::from_str(r#"{"imageId":3}"#).unwrap();
        assert_eq!(query.image_id, Some(3));

        assert!(serde_json::from_str::<ScoresQuery>(r#"{"imageId":"two"}"#).is_err());
    }
}
