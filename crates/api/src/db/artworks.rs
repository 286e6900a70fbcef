//! Artwork catalog repository: listing, CRUD, reviews and stock locking.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use gallery_core::{
    ArtworkId, Category, DimensionUnit, Dimensions, PageRequest, Price, Rating, ReviewId, Stock,
    UserId, average_rating,
};

use super::{InvalidSort, RepositoryError, conflict_on_unique, escape_like, quantity_to_db};
use crate::models::{Artwork, ArtworkChanges, ArtworkImage, NewArtwork, Review, Reviewer};

const ARTWORK_COLUMNS: &str = "a.id, a.artist_id, a.title, a.description, a.price, a.images, \
                               a.category, a.width, a.height, a.depth, a.dimension_unit, \
                               a.medium, a.year, a.quantity, a.in_stock, a.featured, \
                               a.average_rating, a.tags, a.created_at, a.updated_at";

const DUPLICATE_REVIEW: &str = "You have already reviewed this artwork";

/// Number of artworks on the featured shelf.
pub const FEATURED_LIMIT: i64 = 6;

#[derive(sqlx::FromRow)]
struct ArtworkRow {
    id: ArtworkId,
    artist_id: Option<UserId>,
    title: String,
    description: String,
    price: Price,
    images: Json<Vec<ArtworkImage>>,
    category: Category,
    width: Option<f64>,
    height: Option<f64>,
    depth: Option<f64>,
    dimension_unit: DimensionUnit,
    medium: Option<String>,
    year: Option<i32>,
    quantity: i32,
    in_stock: bool,
    featured: bool,
    average_rating: f64,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ArtworkRow> for Artwork {
    type Error = RepositoryError;

    fn try_from(row: ArtworkRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative quantity {} on artwork {}",
                row.quantity, row.id
            ))
        })?;

        Ok(Self {
            id: row.id,
            artist: row.artist_id,
            title: row.title,
            description: row.description,
            price: row.price,
            images: row.images.0,
            category: row.category,
            dimensions: Dimensions {
                width: row.width,
                height: row.height,
                depth: row.depth,
                unit: row.dimension_unit,
            },
            medium: row.medium,
            year: row.year,
            quantity,
            in_stock: row.in_stock,
            featured: row.featured,
            average_rating: row.average_rating,
            tags: row.tags,
            reviews: None,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_artworks(rows: Vec<ArtworkRow>) -> Result<Vec<Artwork>, RepositoryError> {
    rows.into_iter().map(Artwork::try_from).collect()
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    rating: i16,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    user_id: UserId,
    user_name: String,
    user_avatar: Option<String>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = Rating::new(i64::from(row.rating))
            .map_err(|e| RepositoryError::DataCorruption(format!("review {}: {e}", row.id)))?;
        Ok(Self {
            id: row.id,
            user: Reviewer {
                id: row.user_id,
                name: row.user_name,
                avatar: row.user_avatar,
            },
            rating,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// Query parameters
// =============================================================================

/// Catalog filters. Every field is optional and they combine with AND.
#[derive(Debug, Clone, Default)]
pub struct ArtworkFilter {
    pub category: Option<Category>,
    /// Inclusive lower price bound.
    pub price_min: Option<Price>,
    /// Inclusive upper price bound.
    pub price_max: Option<Price>,
    /// Case-insensitive substring of the title or description.
    pub search: Option<String>,
}

/// Fields the catalog can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtworkSortField {
    CreatedAt,
    Price,
    Title,
    Year,
    AverageRating,
}

impl ArtworkSortField {
    const fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "a.created_at",
            Self::Price => "a.price",
            Self::Title => "a.title",
            Self::Year => "a.year",
            Self::AverageRating => "a.average_rating",
        }
    }
}

/// Catalog ordering, parsed from `field[:asc|desc]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtworkSort {
    pub field: ArtworkSortField,
    pub descending: bool,
}

impl Default for ArtworkSort {
    fn default() -> Self {
        Self {
            field: ArtworkSortField::CreatedAt,
            descending: true,
        }
    }
}

impl FromStr for ArtworkSort {
    type Err = InvalidSort;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = s.trim().split_once(':').unwrap_or((s.trim(), "asc"));
        let field = match field {
            "createdAt" => ArtworkSortField::CreatedAt,
            "price" => ArtworkSortField::Price,
            "title" => ArtworkSortField::Title,
            "year" => ArtworkSortField::Year,
            "averageRating" => ArtworkSortField::AverageRating,
            _ => return Err(InvalidSort(s.to_string())),
        };
        let descending = match direction.to_ascii_lowercase().as_str() {
            "asc" => false,
            "desc" => true,
            _ => return Err(InvalidSort(s.to_string())),
        };
        Ok(Self { field, descending })
    }
}

impl ArtworkSort {
    fn order_by(self) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        // NULL years sort last either way; id keeps pages stable.
        format!(
            "{} {direction} NULLS LAST, a.id {direction}",
            self.field.column()
        )
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ArtworkFilter) {
    qb.push(" WHERE TRUE");
    if let Some(category) = filter.category {
        qb.push(" AND a.category = ").push_bind(category);
    }
    if let Some(min) = filter.price_min {
        qb.push(" AND a.price >= ").push_bind(min);
    }
    if let Some(max) = filter.price_max {
        qb.push(" AND a.price <= ").push_bind(max);
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", escape_like(term));
        qb.push(" AND (a.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR a.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn list_query(
    filter: &ArtworkFilter,
    sort: ArtworkSort,
    page: PageRequest,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {ARTWORK_COLUMNS} FROM gallery.artwork a"));
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY ").push(sort.order_by());
    qb.push(" LIMIT ")
        .push_bind(i64::from(page.limit()))
        .push(" OFFSET ")
        .push_bind(page.offset());
    qb
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for artwork database operations.
pub struct ArtworkRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ArtworkRepository<'a> {
    /// Create a new artwork repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of the catalog and the total number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ArtworkFilter,
        sort: ArtworkSort,
        page: PageRequest,
    ) -> Result<(Vec<Artwork>, u64), RepositoryError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM gallery.artwork a");
        push_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        let mut select = list_query(filter, sort, page);
        let rows = select
            .build_query_as::<ArtworkRow>()
            .fetch_all(self.pool)
            .await?;

        Ok((into_artworks(rows)?, u64::try_from(total).unwrap_or_default()))
    }

    /// Featured artworks, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self) -> Result<Vec<Artwork>, RepositoryError> {
        let rows = sqlx::query_as::<_, ArtworkRow>(&format!(
            "SELECT {ARTWORK_COLUMNS} FROM gallery.artwork a \
             WHERE a.featured ORDER BY a.created_at DESC LIMIT $1"
        ))
        .bind(FEATURED_LIMIT)
        .fetch_all(self.pool)
        .await?;
        into_artworks(rows)
    }

    /// Get an artwork without its reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ArtworkId) -> Result<Option<Artwork>, RepositoryError> {
        let row = sqlx::query_as::<_, ArtworkRow>(&format!(
            "SELECT {ARTWORK_COLUMNS} FROM gallery.artwork a WHERE a.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        row.map(Artwork::try_from).transpose()
    }

    /// Get an artwork with its reviews attached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_with_reviews(&self, id: ArtworkId) -> Result<Option<Artwork>, RepositoryError> {
        let Some(mut artwork) = self.get(id).await? else {
            return Ok(None);
        };
        artwork.reviews = Some(self.reviews(id).await?);
        Ok(Some(artwork))
    }

    /// The artist who listed an artwork.
    ///
    /// Returns `None` if the artwork doesn't exist and `Some(None)` if its
    /// artist account was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn owner(&self, id: ArtworkId) -> Result<Option<Option<UserId>>, RepositoryError> {
        let owner = sqlx::query_scalar::<_, Option<UserId>>(
            "SELECT artist_id FROM gallery.artwork WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(owner)
    }

    /// A user's favorite artworks, most recently favorited first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn favorites_of(&self, user: UserId) -> Result<Vec<Artwork>, RepositoryError> {
        let rows = sqlx::query_as::<_, ArtworkRow>(&format!(
            "SELECT {ARTWORK_COLUMNS} FROM gallery.artwork a \
             JOIN gallery.favorite f ON f.artwork_id = a.id \
             WHERE f.user_id = $1 ORDER BY f.created_at DESC"
        ))
        .bind(user)
        .fetch_all(self.pool)
        .await?;
        into_artworks(rows)
    }

    /// Insert a new artwork.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewArtwork) -> Result<Artwork, RepositoryError> {
        let row = sqlx::query_as::<_, ArtworkRow>(&format!(
            "INSERT INTO gallery.artwork AS a \
                 (artist_id, title, description, price, images, category, width, height, \
                  depth, dimension_unit, medium, year, quantity, in_stock, featured, tags) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING {ARTWORK_COLUMNS}"
        ))
        .bind(new.artist)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.price)
        .bind(Json(&new.images))
        .bind(new.category)
        .bind(new.dimensions.width)
        .bind(new.dimensions.height)
        .bind(new.dimensions.depth)
        .bind(new.dimensions.unit)
        .bind(new.medium.as_deref())
        .bind(new.year)
        .bind(quantity_to_db(new.quantity)?)
        .bind(new.in_stock)
        .bind(new.featured)
        .bind(&new.tags)
        .fetch_one(self.pool)
        .await?;
        row.try_into()
    }

    /// Apply changes to an artwork. New images are appended.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the artwork doesn't exist.
    pub async fn update(
        &self,
        id: ArtworkId,
        changes: &ArtworkChanges,
    ) -> Result<Artwork, RepositoryError> {
        let mut query = update_query(id, changes)?;
        let row = query
            .build_query_as::<ArtworkRow>()
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        row.try_into()
    }

    /// Delete an artwork. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: ArtworkId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM gallery.artwork WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Reviews of an artwork, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reviews(&self, id: ArtworkId) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT r.id, r.rating, r.comment, r.created_at, \
                    u.id AS user_id, u.name AS user_name, u.avatar AS user_avatar \
             FROM gallery.artwork_review r \
             JOIN gallery.user u ON u.id = r.user_id \
             WHERE r.artwork_id = $1 \
             ORDER BY r.created_at DESC, r.id DESC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(Review::try_from).collect()
    }

    /// Record a review and recompute the artwork's average rating.
    ///
    /// The artwork row stays locked from the duplicate check until the new
    /// average is written, so concurrent reviews cannot lose an update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the artwork doesn't exist and
    /// `RepositoryError::Conflict` if the user already reviewed it.
    pub async fn add_review(
        &self,
        artwork: ArtworkId,
        user: UserId,
        rating: Rating,
        comment: Option<&str>,
    ) -> Result<Artwork, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, ArtworkId>(
            "SELECT id FROM gallery.artwork WHERE id = $1 FOR UPDATE",
        )
        .bind(artwork)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let already = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM gallery.artwork_review \
                           WHERE artwork_id = $1 AND user_id = $2)",
        )
        .bind(artwork)
        .bind(user)
        .fetch_one(&mut *tx)
        .await?;
        if already {
            return Err(RepositoryError::Conflict(DUPLICATE_REVIEW.to_string()));
        }

        sqlx::query(
            "INSERT INTO gallery.artwork_review (artwork_id, user_id, rating, comment) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(artwork)
        .bind(user)
        .bind(i16::from(rating.value()))
        .bind(comment)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_REVIEW))?;

        let ratings = sqlx::query_scalar::<_, i16>(
            "SELECT rating FROM gallery.artwork_review WHERE artwork_id = $1",
        )
        .bind(artwork)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|r| Rating::new(i64::from(r)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| RepositoryError::DataCorruption(format!("artwork {artwork}: {e}")))?;

        sqlx::query(
            "UPDATE gallery.artwork SET average_rating = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(artwork)
        .bind(average_rating(ratings))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_with_reviews(artwork)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}

fn update_query(
    id: ArtworkId,
    changes: &ArtworkChanges,
) -> Result<QueryBuilder<'static, Postgres>, RepositoryError> {
    let mut qb = QueryBuilder::new("UPDATE gallery.artwork AS a SET updated_at = NOW()");
    if let Some(title) = &changes.title {
        qb.push(", title = ").push_bind(title.clone());
    }
    if let Some(description) = &changes.description {
        qb.push(", description = ").push_bind(description.clone());
    }
    if let Some(price) = changes.price {
        qb.push(", price = ").push_bind(price);
    }
    if let Some(category) = changes.category {
        qb.push(", category = ").push_bind(category);
    }
    if let Some(width) = changes.width {
        qb.push(", width = ").push_bind(width);
    }
    if let Some(height) = changes.height {
        qb.push(", height = ").push_bind(height);
    }
    if let Some(depth) = changes.depth {
        qb.push(", depth = ").push_bind(depth);
    }
    if let Some(unit) = changes.unit {
        qb.push(", dimension_unit = ").push_bind(unit);
    }
    if let Some(medium) = &changes.medium {
        qb.push(", medium = ").push_bind(medium.clone());
    }
    if let Some(year) = changes.year {
        qb.push(", year = ").push_bind(year);
    }
    if let Some(quantity) = changes.quantity {
        qb.push(", quantity = ").push_bind(quantity_to_db(quantity)?);
    }
    if let Some(in_stock) = changes.in_stock {
        qb.push(", in_stock = ").push_bind(in_stock);
    }
    if let Some(featured) = changes.featured {
        qb.push(", featured = ").push_bind(featured);
    }
    if let Some(tags) = &changes.tags {
        qb.push(", tags = ").push_bind(tags.clone());
    }
    if !changes.new_images.is_empty() {
        qb.push(", images = a.images || ")
            .push_bind(Json(changes.new_images.clone()))
            .push("::jsonb");
    }
    qb.push(" WHERE a.id = ").push_bind(id);
    qb.push(format!(" RETURNING {ARTWORK_COLUMNS}"));
    Ok(qb)
}

// =============================================================================
// Stock locking (runs inside a caller's transaction)
// =============================================================================

/// An artwork row locked for a stock change.
#[derive(Debug, Clone)]
pub struct LockedArtwork {
    pub id: ArtworkId,
    pub title: String,
    pub price: Price,
    pub stock: Stock,
}

#[derive(sqlx::FromRow)]
struct LockedRow {
    id: ArtworkId,
    title: String,
    price: Price,
    quantity: i32,
    in_stock: bool,
}

/// Lock an artwork row with `SELECT ... FOR UPDATE`.
///
/// Returns `None` if the artwork doesn't exist.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_for_update(
    conn: &mut PgConnection,
    id: ArtworkId,
) -> Result<Option<LockedArtwork>, RepositoryError> {
    let row = sqlx::query_as::<_, LockedRow>(
        "SELECT id, title, price, quantity, in_stock FROM gallery.artwork \
         WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(r) = row else {
        return Ok(None);
    };
    let quantity = u32::try_from(r.quantity).map_err(|_| {
        RepositoryError::DataCorruption(format!("negative quantity on artwork {}", r.id))
    })?;
    Ok(Some(LockedArtwork {
        id: r.id,
        title: r.title,
        price: r.price,
        stock: Stock::new(quantity, r.in_stock),
    }))
}

/// Write a new stock state for a locked artwork.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the quantity does not fit the
/// column, or `RepositoryError::Database` if the update fails.
pub async fn write_stock(
    conn: &mut PgConnection,
    id: ArtworkId,
    stock: Stock,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE gallery.artwork SET quantity = $2, in_stock = $3, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(quantity_to_db(stock.quantity)?)
    .bind(stock.in_stock)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parse() {
        assert_eq!(ArtworkSort::default(), "createdAt:desc".parse().unwrap());

        let sort: ArtworkSort = "price".parse().unwrap();
        assert_eq!(sort.field, ArtworkSortField::Price);
        assert!(!sort.descending);

        let sort: ArtworkSort = "averageRating:DESC".parse().unwrap();
        assert_eq!(sort.field, ArtworkSortField::AverageRating);
        assert!(sort.descending);
    }

    #[test]
    fn test_sort_rejects_unknown_field_and_direction() {
        assert!("password_hash".parse::<ArtworkSort>().is_err());
        assert!("price:sideways".parse::<ArtworkSort>().is_err());
        assert!("price; DROP TABLE".parse::<ArtworkSort>().is_err());
    }

    #[test]
    fn test_price_range_is_inclusive() {
        let filter = ArtworkFilter {
            price_min: Some(Price::from_cents(10_000)),
            price_max: Some(Price::from_cents(50_000)),
            ..ArtworkFilter::default()
        };
        let qb = list_query(&filter, ArtworkSort::default(), PageRequest::default());
        let sql = qb.sql();
        assert!(sql.contains("a.price >= $1 AND a.price <= $2"), "{sql}");
        assert!(sql.contains("LIMIT $3 OFFSET $4"), "{sql}");
    }

    #[test]
    fn test_search_matches_title_or_description() {
        let filter = ArtworkFilter {
            category: Some(Category::Photography),
            search: Some(" harbor ".to_string()),
            ..ArtworkFilter::default()
        };
        let qb = list_query(&filter, "title:asc".parse().unwrap(), PageRequest::default());
        let sql = qb.sql();
        assert!(sql.contains("a.category = $1"), "{sql}");
        assert!(
            sql.contains("(a.title ILIKE $2 OR a.description ILIKE $3)"),
            "{sql}"
        );
        assert!(sql.contains("ORDER BY a.title ASC NULLS LAST, a.id ASC"), "{sql}");
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filter = ArtworkFilter {
            search: Some("   ".to_string()),
            ..ArtworkFilter::default()
        };
        let qb = list_query(&filter, ArtworkSort::default(), PageRequest::default());
        assert!(!qb.sql().contains("ILIKE"));
    }

    #[test]
    fn test_update_appends_images() {
        let changes = ArtworkChanges {
            price: Some(Price::from_cents(100)),
            new_images: vec![ArtworkImage {
                url: "/uploads/artworks/x.jpg".to_string(),
                alt: None,
            }],
            ..ArtworkChanges::default()
        };
        let qb = update_query(ArtworkId::new(4), &changes).unwrap();
        let sql = qb.sql();
        assert!(sql.starts_with("UPDATE gallery.artwork AS a SET updated_at = NOW(), price = $1"));
        assert!(sql.contains("images = a.images || $2::jsonb"), "{sql}");
        assert!(sql.contains("WHERE a.id = $3"), "{sql}");
    }

    #[test]
    fn test_oversized_quantity_is_rejected() {
        let changes = ArtworkChanges {
            quantity: Some(3_000_000_000),
            ..ArtworkChanges::default()
        };
        assert!(matches!(
            update_query(ArtworkId::new(4), &changes),
            Err(RepositoryError::Conflict(_))
        ));
        assert_eq!(quantity_to_db(7).unwrap(), 7);
        assert!(quantity_to_db(u32::MAX).is_err());
    }
}
