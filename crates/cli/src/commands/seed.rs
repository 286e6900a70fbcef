//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! artist: admin@example.com
//! artworks:
//!   - title: Harbour at Dusk
//!     description: Boats returning under a low sun.
//!     price: 450
//!     category: painting
//!     medium: Oil on canvas
//!     year: 2021
//!     quantity: 2
//!     featured: true
//!     tags: [sea, boats]
//!     images: [/uploads/artworks/harbour.jpg]
//!     dimensions: { width: 60, height: 40, unit: cm }
//! ```
//!
//! The artist must already have an account. Image URLs are stored as given.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use gallery_api::db::{ArtworkRepository, UserRepository};
use gallery_api::models::{ArtworkImage, NewArtwork};
use gallery_core::{Category, Dimensions, Email, Price, UserId};

use super::migrate::database_url;

/// A seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    /// Email of the account listed as artist of every artwork.
    pub artist: Option<String>,
    pub artworks: Vec<SeedArtwork>,
}

/// One artwork in a seed file.
#[derive(Debug, Deserialize)]
pub struct SeedArtwork {
    pub title: String,
    pub description: String,
    pub price: Price,
    pub category: Category,
    #[serde(default)]
    pub dimensions: Dimensions,
    pub medium: Option<String>,
    pub year: Option<i32>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

const fn default_quantity() -> u32 {
    1
}

impl SeedArtwork {
    fn into_new(self, artist: UserId) -> NewArtwork {
        let images = self
            .images
            .into_iter()
            .map(|url| ArtworkImage {
                url,
                alt: Some(self.title.clone()),
            })
            .collect();
        NewArtwork {
            artist,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            price: self.price,
            images,
            category: self.category,
            dimensions: self.dimensions,
            medium: self.medium,
            year: self.year,
            quantity: self.quantity,
            in_stock: self.quantity > 0,
            featured: self.featured,
            tags: self
                .tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }
}

/// Check a seed file before touching the database.
///
/// Returns one message per problem found.
#[must_use]
pub fn validate(seed: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();
    if seed.artworks.is_empty() {
        errors.push("no artworks listed".to_string());
    }
    for (index, artwork) in seed.artworks.iter().enumerate() {
        if artwork.title.trim().is_empty() {
            errors.push(format!("artwork {index}: title is blank"));
        }
        if artwork.description.trim().is_empty() {
            errors.push(format!("artwork {index}: description is blank"));
        }
        if artwork.images.len() > gallery_api::services::uploads::MAX_ARTWORK_IMAGES {
            errors.push(format!("artwork {index}: too many images"));
        }
    }
    errors
}

/// Insert the artworks of a seed file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails
/// validation, names an unknown artist, or a database operation fails.
pub async fn catalog(
    file_path: &str,
    artist: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog seed");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Seed validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let artist_email = artist
        .or(seed.artist.as_deref())
        .ok_or("No artist given (use --artist or `artist:` in the file)")?;
    let artist_email = Email::parse(artist_email)?;

    let pool = gallery_api::db::create_pool(&database_url()?).await?;
    info!("Connected to database");

    let artist = UserRepository::new(&pool)
        .get_by_email(&artist_email)
        .await?
        .ok_or_else(|| format!("No user with email: {artist_email}"))?;

    let repo = ArtworkRepository::new(&pool);
    let mut inserted = 0_usize;
    for artwork in seed.artworks {
        let created = repo.create(&artwork.into_new(artist.id)).await?;
        info!(artwork_id = %created.id, title = %created.title, "artwork seeded");
        inserted += 1;
    }

    info!("Seeding complete! Artworks inserted: {inserted}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SEED: &str = r"
artist: admin@example.com
artworks:
  - title: Harbour at Dusk
    description: Boats returning under a low sun.
    price: 450
    category: painting
    tags: [sea, ' ', boats]
    images: [/uploads/artworks/harbour.jpg]
    dimensions: { width: 60, height: 40 }
  - title: Granite Form
    description: Carved stone.
    price: 1200.50
    category: sculpture
    quantity: 0
";

    #[test]
    fn test_parse_seed_file() {
        let seed: SeedFile = serde_yaml::from_str(SEED).unwrap();
        assert!(validate(&seed).is_empty());
        assert_eq!(seed.artworks[0].quantity, 1);
        assert_eq!(seed.artworks[1].price, Price::parse("1200.50").unwrap());
    }

    #[test]
    fn test_into_new() {
        let mut seed: SeedFile = serde_yaml::from_str(SEED).unwrap();
        let sculpture = seed.artworks.pop().unwrap().into_new(UserId::new(1));
        assert!(!sculpture.in_stock);

        let painting = seed.artworks.pop().unwrap().into_new(UserId::new(1));
        assert!(painting.in_stock);
        assert_eq!(painting.tags, vec!["sea".to_string(), "boats".to_string()]);
        assert_eq!(painting.images[0].alt.as_deref(), Some("Harbour at Dusk"));
        assert_eq!(painting.dimensions.width, Some(60.0));
    }

    #[test]
    fn test_validate_reports_blank_fields() {
        let seed = SeedFile {
            artist: None,
            artworks: vec![SeedArtwork {
                title: " ".to_string(),
                description: String::new(),
                price: Price::ZERO,
                category: Category::Other,
                dimensions: Dimensions::default(),
                medium: None,
                year: None,
                quantity: 1,
                featured: false,
                tags: Vec::new(),
                images: Vec::new(),
            }],
        };
        assert_eq!(validate(&seed).len(), 2);
    }
}
