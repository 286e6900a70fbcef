//! Artwork catalog route handlers.

use axum::extract::{Multipart, State};
use serde::Deserialize;

use gallery_core::{ArtworkId, Category, Price, Rating};

use super::{MultipartBody, non_blank, page_request};
use crate::db::{ArtworkFilter, ArtworkRepository, ArtworkSort, RepositoryError};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{Artwork, ArtworkForm, ArtworkImage, CurrentUser, Review};
use crate::response::{ApiJson, ApiPath, ApiQuery, ApiResponse, Created, Empty, Paginated};
use crate::services::UploadKind;
use crate::state::AppState;

const NOT_FOUND: &str = "Artwork not found";

/// Multipart field carrying artwork images.
const IMAGES_FIELD: &str = "images";

/// Query parameters for the catalog listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListQuery {
    fn filter(&self) -> Result<ArtworkFilter> {
        Ok(ArtworkFilter {
            category: non_blank(self.category.as_ref())
                .map(str::parse::<Category>)
                .transpose()?,
            price_min: non_blank(self.price_min.as_ref())
                .map(Price::parse)
                .transpose()?,
            price_max: non_blank(self.price_max.as_ref())
                .map(Price::parse)
                .transpose()?,
            search: non_blank(self.search.as_ref()).map(str::to_string),
        })
    }

    fn sort(&self) -> Result<ArtworkSort> {
        Ok(non_blank(self.sort.as_ref())
            .map(str::parse::<ArtworkSort>)
            .transpose()?
            .unwrap_or_default())
    }
}

/// List artworks.
///
/// GET /api/artworks?category=&price_min=&price_max=&search=&sort=&page=&limit=
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Paginated<Artwork>> {
    let filter = query.filter()?;
    let sort = query.sort()?;
    let page = page_request(query.page.as_deref(), query.limit.as_deref())?;

    let (artworks, total) = ArtworkRepository::new(state.pool())
        .list(&filter, sort, page)
        .await?;

    Ok(Paginated::new(artworks, page.paginate(total)))
}

/// Featured artworks.
///
/// GET /api/artworks/featured
pub async fn featured(State(state): State<AppState>) -> Result<ApiResponse<Vec<Artwork>>> {
    let artworks = ArtworkRepository::new(state.pool()).featured().await?;
    Ok(ApiResponse::ok(artworks))
}

/// One artwork with its reviews.
///
/// GET /api/artworks/{id}
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ArtworkId>,
) -> Result<ApiResponse<Artwork>> {
    let artwork = ArtworkRepository::new(state.pool())
        .get_with_reviews(id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
    Ok(ApiResponse::ok(artwork))
}

/// Create an artwork. The creating admin becomes its artist.
///
/// POST /api/artworks (multipart)
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    multipart: Multipart,
) -> Result<Created<Artwork>> {
    let body = MultipartBody::read(multipart, IMAGES_FIELD).await?;
    let form = form_from(body.fields);
    let uploads = state.uploads();

    uploads.check_all(UploadKind::Artwork, &body.files)?;
    let urls = uploads.save_all(UploadKind::Artwork, &body.files).await?;

    let created = async {
        let new = form.into_new(user.id, images_from(&urls))?;
        Ok::<_, AppError>(ArtworkRepository::new(state.pool()).create(&new).await?)
    }
    .await;

    match created {
        Ok(artwork) => {
            tracing::info!(artwork_id = %artwork.id, user_id = %user.id, "artwork created");
            Ok(ApiResponse::created(artwork))
        }
        Err(e) => {
            uploads.remove_all(&urls).await;
            Err(e)
        }
    }
}

/// Update an artwork. New images are appended.
///
/// PUT /api/artworks/{id} (multipart)
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    ApiPath(id): ApiPath<ArtworkId>,
    multipart: Multipart,
) -> Result<ApiResponse<Artwork>> {
    let repo = ArtworkRepository::new(state.pool());
    ensure_may_modify(&repo, &user, id, "update").await?;

    let body = MultipartBody::read(multipart, IMAGES_FIELD).await?;
    let form = form_from(body.fields);
    let uploads = state.uploads();

    uploads.check_all(UploadKind::Artwork, &body.files)?;
    let urls = uploads.save_all(UploadKind::Artwork, &body.files).await?;

    let updated = async {
        let changes = form.into_changes(images_from(&urls))?;
        Ok::<_, AppError>(repo.update(id, &changes).await.map_err(not_found)?)
    }
    .await;

    match updated {
        Ok(artwork) => {
            tracing::info!(artwork_id = %id, user_id = %user.id, "artwork updated");
            Ok(ApiResponse::ok(artwork))
        }
        Err(e) => {
            uploads.remove_all(&urls).await;
            Err(e)
        }
    }
}

/// Delete an artwork and its stored images.
///
/// DELETE /api/artworks/{id}
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    ApiPath(id): ApiPath<ArtworkId>,
) -> Result<ApiResponse<Empty>> {
    let repo = ArtworkRepository::new(state.pool());
    ensure_may_modify(&repo, &user, id, "delete").await?;

    let images = repo
        .get(id)
        .await?
        .map(|a| a.images.into_iter().map(|i| i.url).collect::<Vec<_>>())
        .unwrap_or_default();

    if !repo.delete(id).await? {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    }
    state.uploads().remove_all(&images).await;

    tracing::info!(artwork_id = %id, user_id = %user.id, "artwork deleted");
    Ok(ApiResponse::ok(Empty {}))
}

/// Reviews of an artwork, newest first.
///
/// GET /api/artworks/{id}/reviews
pub async fn reviews(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ArtworkId>,
) -> Result<ApiResponse<Vec<Review>>> {
    let repo = ArtworkRepository::new(state.pool());
    if repo.owner(id).await?.is_none() {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    }
    Ok(ApiResponse::ok(repo.reviews(id).await?))
}

/// Body of a new review.
#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Add a review and recompute the average rating.
///
/// POST /api/artworks/{id}/reviews
pub async fn add_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<ArtworkId>,
    ApiJson(body): ApiJson<ReviewBody>,
) -> Result<Created<Artwork>> {
    let rating = Rating::new(body.rating)?;
    let comment = body
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    add_breadcrumb(
        "review",
        "Submitting review",
        &[("artwork_id", id.to_string()), ("rating", body.rating.to_string())],
    );

    let artwork = ArtworkRepository::new(state.pool())
        .add_review(id, user.id, rating, comment)
        .await
        .map_err(not_found)?;

    tracing::info!(artwork_id = %id, user_id = %user.id, rating = rating.value(), "review added");
    Ok(ApiResponse::created(artwork))
}

/// Check the caller may change an artwork: its artist or any admin.
async fn ensure_may_modify(
    repo: &ArtworkRepository<'_>,
    user: &CurrentUser,
    id: ArtworkId,
    action: &str,
) -> Result<()> {
    let owner = repo
        .owner(id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
    if user.may_modify(owner) {
        Ok(())
    } else {
        Err(AppError::Unauthorized(format!(
            "Not authorized to {action} this artwork"
        )))
    }
}

fn form_from(fields: Vec<(String, String)>) -> ArtworkForm {
    let mut form = ArtworkForm::new();
    for (name, value) in fields {
        form.push(&name, value);
    }
    form
}

fn images_from(urls: &[String]) -> Vec<ArtworkImage> {
    urls.iter()
        .map(|url| ArtworkImage {
            url: url.clone(),
            alt: None,
        })
        .collect()
}

fn not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound(NOT_FOUND.to_string()),
        other => other.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gallery_core::UserId;

    use super::*;

    fn query(pairs: &[(&str, &str)]) -> ListQuery {
        let encoded = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let uri: axum::http::Uri = format!("/api/artworks?{encoded}").parse().unwrap();
        axum::extract::Query::<ListQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_filter_parsing() {
        let filter = query(&[
            ("category", "painting"),
            ("price_min", "100"),
            ("price_max", "250.5"),
            ("search", "sea"),
        ])
        .filter()
        .unwrap();

        assert_eq!(filter.category, Some(Category::Painting));
        assert_eq!(filter.price_min, Some(Price::parse("100").unwrap()));
        assert_eq!(filter.price_max, Some(Price::parse("250.50").unwrap()));
        assert_eq!(filter.search.as_deref(), Some("sea"));
    }

    #[test]
    fn test_invalid_filters_are_bad_requests() {
        assert!(matches!(
            query(&[("category", "tapestry")]).filter(),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            query(&[("price_min", "cheap")]).filter(),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            query(&[("sort", "password")]).sort(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let q = query(&[("category", ""), ("search", ""), ("sort", "")]);
        let filter = q.filter().unwrap();
        assert!(filter.category.is_none());
        assert!(filter.search.is_none());
        assert_eq!(q.sort().unwrap(), ArtworkSort::default());
    }

    #[test]
    fn test_form_from_keeps_repeated_tags() {
        let form = form_from(vec![
            ("title".to_string(), "Harbour".to_string()),
            ("description".to_string(), "Boats at dusk".to_string()),
            ("price".to_string(), "90".to_string()),
            ("category".to_string(), "photography".to_string()),
            ("tags[]".to_string(), "sea".to_string()),
            ("tags[]".to_string(), "boats".to_string()),
        ]);
        let images = images_from(&["/uploads/artworks/a.jpg".to_string()]);
        let new = form.into_new(UserId::new(1), images).unwrap();
        assert_eq!(new.tags, vec!["sea".to_string(), "boats".to_string()]);
        assert_eq!(new.images[0].alt.as_deref(), Some("Harbour"));
    }
}
