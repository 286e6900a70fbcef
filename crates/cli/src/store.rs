//! Client-side store mirrored to a local JSON file.
//!
//! Holds the auth token, the signed-in user, the cart and the last fetched
//! catalog page. Every mutation is written back to disk before returning.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gallery_core::{ArtworkId, Cart, CartItem};

use crate::client::{CatalogItem, CatalogPage, SessionUser};

/// Default store file, relative to the working directory.
pub const DEFAULT_STORE_FILE: &str = ".gallery-store.json";

/// Errors reading or writing the store file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("store file {path} is not valid: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to encode store: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<SessionUser>,
    #[serde(default, skip_serializing_if = "Cart::is_empty")]
    cart: Cart,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    catalog: Option<CatalogPage>,
}

/// The local store.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    data: StoreData,
}

impl Store {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                    path: path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self { path, data })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.data.token.as_deref()
    }

    #[must_use]
    pub const fn user(&self) -> Option<&SessionUser> {
        self.data.user.as_ref()
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.data.cart
    }

    #[must_use]
    pub const fn catalog(&self) -> Option<&CatalogPage> {
        self.data.catalog.as_ref()
    }

    /// Look up an artwork in the cached catalog page.
    #[must_use]
    pub fn cached_artwork(&self, id: ArtworkId) -> Option<&CatalogItem> {
        self.catalog()
            .and_then(|page| page.items.iter().find(|item| item.id == id))
    }

    /// Remember a signed-in session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store file cannot be written.
    pub fn set_session(&mut self, token: String, user: SessionUser) -> Result<(), StoreError> {
        self.data.token = Some(token);
        self.data.user = Some(user);
        self.save()
    }

    /// Forget the token and user. The cart is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the store file cannot be written.
    pub fn clear_session(&mut self) -> Result<(), StoreError> {
        self.data.token = None;
        self.data.user = None;
        self.save()
    }

    /// Cache a fetched catalog page.
    ///
    /// # Errors
    ///
    /// Returns an error if the store file cannot be written.
    pub fn set_catalog(&mut self, page: CatalogPage) -> Result<(), StoreError> {
        self.data.catalog = Some(page);
        self.save()
    }

    /// Add an artwork to the cart, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns an error if the store file cannot be written.
    pub fn add_to_cart(&mut self, artwork: &CatalogItem, quantity: u32) -> Result<(), StoreError> {
        self.data.cart.add(CartItem {
            id: artwork.id,
            title: artwork.title.clone(),
            price: artwork.price,
            image: artwork.thumbnail(),
            quantity,
        });
        self.save()
    }

    /// Remove an artwork from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the store file cannot be written.
    pub fn remove_from_cart(&mut self, id: ArtworkId) -> Result<(), StoreError> {
        self.data.cart.remove(id);
        self.save()
    }

    /// Set the quantity of a cart line. Returns whether the line existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store file cannot be written.
    pub fn update_quantity(&mut self, id: ArtworkId, quantity: u32) -> Result<bool, StoreError> {
        let found = self.data.cart.update_quantity(id, quantity);
        if found {
            self.save()?;
        }
        Ok(found)
    }

    /// Empty the cart and drop it from the store file.
    ///
    /// # Errors
    ///
    /// Returns an error if the store file cannot be written.
    pub fn clear_cart(&mut self) -> Result<(), StoreError> {
        self.data.cart.clear();
        self.save()
    }

    fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.data)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .and_then(|()| std::fs::rename(&tmp, &self.path))
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })
    }
}
