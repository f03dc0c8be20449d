//! Puzzle content and high score storage.

use crate::error::StoreError;
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use shared::{Character, HighScore, Position, PuzzleImage};
use std::path::Path;
use tokio::sync::RwLock;

/// A score about to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHighScore {
    pub name: String,
    pub time: f64,
    pub image_id: u32,
    pub created_at: u64,
}

/// Images, characters and scores. Images and characters are read-only once
/// seeded; scores are append-only.
#[async_trait]
pub trait PuzzleStore: Send + Sync {
    /// All images in creation order.
    async fn list_images(&self) -> Result<Vec<PuzzleImage>, StoreError>;

    async fn find_image(&self, image_id: u32) -> Result<Option<PuzzleImage>, StoreError>;

    /// The earliest created image, if any exist.
    async fn first_image(&self) -> Result<Option<PuzzleImage>, StoreError>;

    async fn find_character(&self, character_id: u32) -> Result<Option<Character>, StoreError>;

    async fn characters_for_image(&self, image_id: u32) -> Result<Vec<Character>, StoreError>;

    async fn count_characters(&self, image_id: u32) -> Result<usize, StoreError>;

    async fn insert_high_score(&self, score: NewHighScore) -> Result<HighScore, StoreError>;

    /// Fastest scores first, ties in insertion order.
    async fn top_scores(&self, image_id: u32, limit: usize) -> Result<Vec<HighScore>, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedCharacter {
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, rename = "iconUrl", skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedImage {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub characters: Vec<SeedCharacter>,
}

/// Initial puzzle content. Ids are handed out in document order from 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seed {
    pub images: Vec<SeedImage>,
}

impl Seed {
    pub fn from_json(text: &str) -> Result<Self, StoreError> {
        let seed: Seed = serde_json::from_str(text)?;
        seed.validate()?;
        Ok(seed)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        for image in &self.images {
            if image.name.trim().is_empty() {
                return Err(StoreError::Seed("image without a name".to_string()));
            }
            for character in &image.characters {
                if !Position::new(character.x, character.y).is_normalized() {
                    return Err(StoreError::Seed(format!(
                        "character '{}' in '{}' is outside the image ({}, {})",
                        character.name, image.name, character.x, character.y
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for Seed {
    fn default() -> Self {
        let image = |name: &str, url: &str, spots: [(f64, f64); 3]| {
            let names = ["Waldo", "Wizard", "Odlaw"];
            SeedImage {
                name: name.to_string(),
                url: url.to_string(),
                characters: names
                    .iter()
                    .zip(spots)
                    .map(|(name, (x, y))| SeedCharacter {
                        name: name.to_string(),
                        x,
                        y,
                        icon_url: None,
                    })
                    .collect(),
            }
        };

        Seed {
            images: vec![
                image(
                    "Classic Waldo",
                    "https://example.com/waldo1.jpg",
                    [(0.45, 0.6), (0.7, 0.2), (0.2, 0.8)],
                ),
                image(
                    "Beach Waldo",
                    "https://example.com/waldo2.jpg",
                    [(0.3, 0.5), (0.6, 0.3), (0.8, 0.7)],
                ),
                image(
                    "Space Waldo",
                    "https://example.com/waldo3.jpg",
                    [(0.4, 0.4), (0.5, 0.1), (0.9, 0.9)],
                ),
            ],
        }
    }
}

#[derive(Debug, Default)]
struct ScoreTable {
    rows: Vec<HighScore>,
    next_id: u32,
}

/// Puzzle store held in process memory.
pub struct MemoryPuzzleStore {
    images: Vec<PuzzleImage>,
    characters: Vec<Character>,
    scores: RwLock<ScoreTable>,
}

impl MemoryPuzzleStore {
    pub fn from_seed(seed: Seed) -> Result<Self, StoreError> {
        seed.validate()?;

        let mut images = Vec::with_capacity(seed.images.len());
        let mut characters = Vec::new();
        for (image_index, seed_image) in seed.images.into_iter().enumerate() {
            let image_id = image_index as u32 + 1;
            for seed_character in seed_image.characters {
                characters.push(Character {
                    id: characters.len() as u32 + 1,
                    name: seed_character.name,
                    x: seed_character.x,
                    y: seed_character.y,
                    image_id,
                    icon_url: seed_character.icon_url,
                });
            }
            images.push(PuzzleImage {
                id: image_id,
                name: seed_image.name,
                url: seed_image.url,
            });
        }

        info!(
            "Seeded {} images with {} characters",
            images.len(),
            characters.len()
        );

        Ok(Self {
            images,
            characters,
            scores: RwLock::new(ScoreTable {
                rows: Vec::new(),
                next_id: 1,
            }),
        })
    }
}

#[async_trait]
impl PuzzleStore for MemoryPuzzleStore {
    async fn list_images(&self) -> Result<Vec<PuzzleImage>, StoreError> {
        Ok(self.images.clone())
    }

    async fn find_image(&self, image_id: u32) -> Result<Option<PuzzleImage>, StoreError> {
        Ok(self.images.iter().find(|image| image.id == image_id).cloned())
    }

    async fn first_image(&self) -> Result<Option<PuzzleImage>, StoreError> {
        Ok(self.images.first().cloned())
    }

    async fn find_character(&self, character_id: u32) -> Result<Option<Character>, StoreError> {
        Ok(self
            .characters
            .iter()
            .find(|character| character.id == character_id)
            .cloned())
    }

    async fn characters_for_image(&self, image_id: u32) -> Result<Vec<Character>, StoreError> {
        Ok(self
            .characters
            .iter()
            .filter(|character| character.image_id == image_id)
            .cloned()
            .collect())
    }

    async fn count_characters(&self, image_id: u32) -> Result<usize, StoreError> {
        Ok(self
            .characters
            .iter()
            .filter(|character| character.image_id == image_id)
            .count())
    }

    async fn insert_high_score(&self, score: NewHighScore) -> Result<HighScore, StoreError> {
        let mut table = self.scores.write().await;
        let row = HighScore {
            id: table.next_id,
            name: score.name,
            time: score.time,
            image_id: score.image_id,
            created_at: score.created_at,
        };
        table.next_id += 1;
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn top_scores(&self, image_id: u32, limit: usize) -> Result<Vec<HighScore>, StoreError> {
        let table = self.scores.read().await;
        let mut rows: Vec<HighScore> = table
            .rows
            .iter()
            .filter(|row| row.image_id == image_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.time.total_cmp(&b.time));
        rows.truncate(limit);
        Ok(rows)
    }
}
