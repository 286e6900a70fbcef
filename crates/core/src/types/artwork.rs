//! Artwork classification types.

use serde::{Deserialize, Serialize};

use super::ParseEnumError;

/// Catalog category of an artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "gallery.artwork_category", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Painting,
    Sculpture,
    Photography,
    Digital,
    Other,
}

impl Category {
    pub const ALL: [Self; 5] = [
        Self::Painting,
        Self::Sculpture,
        Self::Photography,
        Self::Digital,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Painting => "painting",
            Self::Sculpture => "sculpture",
            Self::Photography => "photography",
            Self::Digital => "digital",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| ParseEnumError::new("category", s))
    }
}

/// Unit for artwork dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "gallery.dimension_unit", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DimensionUnit {
    #[default]
    Cm,
    Inch,
}

impl std::str::FromStr for DimensionUnit {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cm" => Ok(Self::Cm),
            "inch" => Ok(Self::Inch),
            _ => Err(ParseEnumError::new("dimension unit", s)),
        }
    }
}

/// Physical size of an artwork. Every measurement is optional.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Dimensions {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub depth: Option<f64>,
    #[serde(default)]
    pub unit: DimensionUnit,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("Painting".parse::<Category>().unwrap(), Category::Painting);
        assert_eq!(" digital ".parse::<Category>().unwrap(), Category::Digital);
        let err = "watercolour".parse::<Category>().unwrap_err();
        assert_eq!(err.to_string(), "invalid category: watercolour");
    }

    #[test]
    fn test_dimensions_default_to_centimetres() {
        let dims: Dimensions = serde_json::from_str(r#"{"width": 30.0, "height": 40.0}"#).unwrap();
        assert_eq!(dims.unit, DimensionUnit::Cm);
        assert_eq!(dims.depth, None);
    }
}
