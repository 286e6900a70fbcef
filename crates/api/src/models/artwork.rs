//! Artwork and review domain types, and parsing of the artwork form.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gallery_core::{
    ArtworkId, Category, DimensionUnit, Dimensions, Price, Rating, ReviewId, UserId,
};

/// An uploaded image attached to an artwork.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// A catalog entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    pub id: ArtworkId,
    /// The user who listed the artwork; `None` once that account is deleted.
    pub artist: Option<UserId>,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub images: Vec<ArtworkImage>,
    pub category: Category,
    pub dimensions: Dimensions,
    pub medium: Option<String>,
    pub year: Option<i32>,
    pub quantity: u32,
    pub in_stock: bool,
    pub featured: bool,
    pub average_rating: f64,
    pub tags: Vec<String>,
    /// Populated only on the detail view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<Review>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Name and avatar of a review's author.
#[derive(Debug, Clone, Serialize)]
pub struct Reviewer {
    pub id: UserId,
    pub name: String,
    pub avatar: Option<String>,
}

/// A user's review of an artwork.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub user: Reviewer,
    pub rating: Rating,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A validated artwork ready to insert.
#[derive(Debug, Clone)]
pub struct NewArtwork {
    pub artist: UserId,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub images: Vec<ArtworkImage>,
    pub category: Category,
    pub dimensions: Dimensions,
    pub medium: Option<String>,
    pub year: Option<i32>,
    pub quantity: u32,
    pub in_stock: bool,
    pub featured: bool,
    pub tags: Vec<String>,
}

/// Validated changes to an existing artwork. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ArtworkChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub category: Option<Category>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub depth: Option<f64>,
    pub unit: Option<DimensionUnit>,
    pub medium: Option<String>,
    pub year: Option<i32>,
    pub quantity: Option<u32>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
    pub tags: Option<Vec<String>>,
    /// Appended after the existing images.
    pub new_images: Vec<ArtworkImage>,
}

impl ArtworkChanges {
    /// Whether applying these changes would modify nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.width.is_none()
            && self.height.is_none()
            && self.depth.is_none()
            && self.unit.is_none()
            && self.medium.is_none()
            && self.year.is_none()
            && self.quantity.is_none()
            && self.in_stock.is_none()
            && self.featured.is_none()
            && self.tags.is_none()
            && self.new_images.is_empty()
    }
}

/// Reasons an artwork form is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtworkFormError {
    #[error("Please provide {0}")]
    Missing(&'static str),
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Text fields collected from a multipart artwork form.
///
/// Files are handled separately; this only holds the named text values in
/// the order they arrived.
#[derive(Debug, Clone, Default)]
pub struct ArtworkForm {
    fields: HashMap<String, Vec<String>>,
}

impl ArtworkForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a text field. Repeated names accumulate.
    pub fn push(&mut self, name: &str, value: String) {
        let name = name.strip_suffix("[]").unwrap_or(name);
        self.fields.entry(name.to_string()).or_default().push(value);
    }

    /// Build a new artwork listed by `artist`.
    ///
    /// # Errors
    ///
    /// Returns `ArtworkFormError::Missing` if title, description, price or
    /// category is absent, and `ArtworkFormError::Invalid` for values that
    /// do not parse.
    pub fn into_new(
        self,
        artist: UserId,
        images: Vec<ArtworkImage>,
    ) -> Result<NewArtwork, ArtworkFormError> {
        let title = self.text("title").ok_or(ArtworkFormError::Missing("a title"))?;
        let description = self
            .text("description")
            .ok_or(ArtworkFormError::Missing("a description"))?;
        let price = self.price()?.ok_or(ArtworkFormError::Missing("a price"))?;
        let category = self
            .category()?
            .ok_or(ArtworkFormError::Missing("a category"))?;
        let quantity = self.quantity()?.unwrap_or(1);
        let in_stock = self.flag("inStock")?.unwrap_or(quantity > 0);

        Ok(NewArtwork {
            artist,
            images: with_alt(images, &title),
            title,
            description,
            price,
            category,
            dimensions: Dimensions {
                width: self.measurement("width")?,
                height: self.measurement("height")?,
                depth: self.measurement("depth")?,
                unit: self.unit()?.unwrap_or_default(),
            },
            medium: self.text("medium"),
            year: self.parsed("year")?,
            quantity,
            in_stock,
            featured: self.flag("featured")?.unwrap_or(false),
            tags: self.tags().unwrap_or_default(),
        })
    }

    /// Build changes for an existing artwork. Every field is optional.
    ///
    /// # Errors
    ///
    /// Returns `ArtworkFormError::Invalid` for values that do not parse.
    pub fn into_changes(
        self,
        new_images: Vec<ArtworkImage>,
    ) -> Result<ArtworkChanges, ArtworkFormError> {
        let title = self.text("title");
        let new_images = match &title {
            Some(title) => with_alt(new_images, title),
            None => new_images,
        };

        Ok(ArtworkChanges {
            description: self.text("description"),
            price: self.price()?,
            category: self.category()?,
            width: self.measurement("width")?,
            height: self.measurement("height")?,
            depth: self.measurement("depth")?,
            unit: self.unit()?,
            medium: self.text("medium"),
            year: self.parsed("year")?,
            quantity: self.quantity()?,
            in_stock: self.flag("inStock")?,
            featured: self.flag("featured")?,
            tags: self.tags(),
            title,
            new_images,
        })
    }

    /// First non-empty value for `name`, trimmed.
    fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)?
            .iter()
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn parsed<T>(&self, name: &'static str) -> Result<Option<T>, ArtworkFormError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.text(name)
            .map(|v| {
                v.parse::<T>().map_err(|e| ArtworkFormError::Invalid {
                    field: name,
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    /// Stock quantity: a whole number that fits the database column.
    fn quantity(&self) -> Result<Option<u32>, ArtworkFormError> {
        let Some(value) = self.parsed::<i64>("quantity")? else {
            return Ok(None);
        };
        i32::try_from(value)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| ArtworkFormError::Invalid {
                field: "quantity",
                reason: format!("{value} is not between 0 and {}", i32::MAX),
            })
    }

    fn price(&self) -> Result<Option<Price>, ArtworkFormError> {
        self.text("price")
            .map(|v| {
                Price::parse(&v).map_err(|e| ArtworkFormError::Invalid {
                    field: "price",
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    fn category(&self) -> Result<Option<Category>, ArtworkFormError> {
        self.parsed("category")
    }

    fn unit(&self) -> Result<Option<DimensionUnit>, ArtworkFormError> {
        self.parsed("unit")
    }

    fn measurement(&self, name: &'static str) -> Result<Option<f64>, ArtworkFormError> {
        match self.parsed::<f64>(name)? {
            Some(v) if !v.is_finite() || v < 0.0 => Err(ArtworkFormError::Invalid {
                field: name,
                reason: "must be a non-negative number".to_string(),
            }),
            other => Ok(other),
        }
    }

    fn flag(&self, name: &'static str) -> Result<Option<bool>, ArtworkFormError> {
        self.text(name)
            .map(|v| match v.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Ok(true),
                "false" | "0" | "off" | "no" => Ok(false),
                _ => Err(ArtworkFormError::Invalid {
                    field: name,
                    reason: format!("expected true or false, got {v}"),
                }),
            })
            .transpose()
    }

    /// Tags may arrive as repeated fields or comma separated.
    fn tags(&self) -> Option<Vec<String>> {
        let values = self.fields.get("tags")?;
        let mut tags: Vec<String> = Vec::new();
        for tag in values.iter().flat_map(|v| v.split(',')) {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        Some(tags)
    }
}

fn with_alt(images: Vec<ArtworkImage>, title: &str) -> Vec<ArtworkImage> {
    images
        .into_iter()
        .map(|image| ArtworkImage {
            alt: image.alt.or_else(|| Some(title.to_string())),
            ..image
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> ArtworkForm {
        let mut form = ArtworkForm::new();
        for (name, value) in pairs {
            form.push(name, (*value).to_string());
        }
        form
    }

    fn image(url: &str) -> ArtworkImage {
        ArtworkImage {
            url: url.to_string(),
            alt: None,
        }
    }

    #[test]
    fn test_into_new_with_defaults() {
        let new = form(&[
            ("title", " Harbor at Dusk "),
            ("description", "Oil on canvas"),
            ("price", "450"),
            ("category", "painting"),
        ])
        .into_new(UserId::new(1), vec![image("/uploads/artworks/a.jpg")])
        .unwrap();

        assert_eq!(new.title, "Harbor at Dusk");
        assert_eq!(new.price, Price::from_cents(45_000));
        assert_eq!(new.quantity, 1);
        assert!(new.in_stock);
        assert!(!new.featured);
        assert_eq!(new.dimensions.unit, DimensionUnit::Cm);
        assert_eq!(new.images[0].alt.as_deref(), Some("Harbor at Dusk"));
    }

    #[test]
    fn test_into_new_requires_fields() {
        let err = form(&[("title", "Untitled"), ("price", "10"), ("category", "other")])
            .into_new(UserId::new(1), Vec::new())
            .unwrap_err();
        assert_eq!(err, ArtworkFormError::Missing("a description"));

        let err = form(&[
            ("title", "Untitled"),
            ("description", "x"),
            ("price", "10"),
            ("category", "fresco"),
        ])
        .into_new(UserId::new(1), Vec::new())
        .unwrap_err();
        assert!(matches!(err, ArtworkFormError::Invalid { field: "category", .. }));
    }

    #[test]
    fn test_into_new_rejects_negative_price() {
        let err = form(&[
            ("title", "Untitled"),
            ("description", "x"),
            ("price", "-5"),
            ("category", "digital"),
        ])
        .into_new(UserId::new(1), Vec::new())
        .unwrap_err();
        assert!(matches!(err, ArtworkFormError::Invalid { field: "price", .. }));
    }

    #[test]
    fn test_tags_repeated_and_comma_separated() {
        let new = form(&[
            ("title", "Untitled"),
            ("description", "x"),
            ("price", "10"),
            ("category", "digital"),
            ("tags[]", "abstract, blue"),
            ("tags", "blue"),
            ("tags", "large"),
        ])
        .into_new(UserId::new(1), Vec::new())
        .unwrap();
        assert_eq!(new.tags, vec!["abstract", "blue", "large"]);
    }

    #[test]
    fn test_zero_quantity_defaults_out_of_stock() {
        let new = form(&[
            ("title", "Untitled"),
            ("description", "x"),
            ("price", "10"),
            ("category", "sculpture"),
            ("quantity", "0"),
        ])
        .into_new(UserId::new(1), Vec::new())
        .unwrap();
        assert!(!new.in_stock);
    }

    #[test]
    fn test_quantity_must_fit_stock_column() {
        let fields = |quantity: &str| {
            form(&[
                ("title", "Untitled"),
                ("description", "x"),
                ("price", "10"),
                ("category", "sculpture"),
                ("quantity", quantity),
            ])
        };

        for quantity in ["3000000000", "-1", "2147483648"] {
            let err = fields(quantity)
                .into_new(UserId::new(1), Vec::new())
                .unwrap_err();
            assert!(
                matches!(err, ArtworkFormError::Invalid { field: "quantity", .. }),
                "{quantity}"
            );
        }

        let new = fields("2147483647")
            .into_new(UserId::new(1), Vec::new())
            .unwrap();
        assert_eq!(new.quantity, 2_147_483_647);

        let err = form(&[("quantity", "3000000000")])
            .into_changes(Vec::new())
            .unwrap_err();
        assert!(matches!(err, ArtworkFormError::Invalid { field: "quantity", .. }));
    }

    #[test]
    fn test_into_changes_only_sets_present_fields() {
        let changes = form(&[("price", "99.5"), ("featured", "true"), ("width", "")])
            .into_changes(vec![image("/uploads/artworks/b.png")])
            .unwrap();
        assert_eq!(changes.price, Some(Price::from_cents(9_950)));
        assert_eq!(changes.featured, Some(true));
        assert_eq!(changes.width, None);
        assert_eq!(changes.title, None);
        assert_eq!(changes.new_images.len(), 1);
        assert!(!changes.is_empty());

        assert!(ArtworkForm::new().into_changes(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_bad_flag_and_measurement() {
        let err = form(&[("inStock", "maybe")])
            .into_changes(Vec::new())
            .unwrap_err();
        assert!(matches!(err, ArtworkFormError::Invalid { field: "inStock", .. }));

        let err = form(&[("depth", "-2")]).into_changes(Vec::new()).unwrap_err();
        assert!(matches!(err, ArtworkFormError::Invalid { field: "depth", .. }));
    }
}
