/**
 * Note Resolution
 *
 * Viewers and producers address notes by slug or canonical id. The resolver
 * maps that reference to the canonical `ResourceId` and checks that the user
 * may access it. The default resolver keeps its table in memory and is seeded
 * from configuration; a database-backed implementation can replace it behind
 * the same trait.
 */

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use crate::backend::error::RegistrationError;
use crate::backend::realtime::ResourceId;
use crate::shared::config::ResourceSeed;

/// A reference resolved to a canonical note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    pub id: ResourceId,
    pub owner: Uuid,
}

#[async_trait]
pub trait ResourceResolver: Send + Sync {
    /// Resolve `reference` for `user_id`
    ///
    /// # Errors
    ///
    /// * `NotFound` - no note with this slug or id
    /// * `Forbidden` - the note exists but the user may not access it
    async fn resolve(&self, reference: &str, user_id: Uuid) -> Result<ResolvedResource, RegistrationError>;
}

#[derive(Debug, Clone)]
struct NoteEntry {
    owner: Uuid,
    members: Vec<Uuid>,
}

#[derive(Debug, Default)]
struct Tables {
    notes: HashMap<String, NoteEntry>,
    slugs: HashMap<String, String>,
}

/// Resolver over an in-memory note table
#[derive(Debug, Default)]
pub struct InMemoryResolver {
    tables: RwLock<Tables>,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seeds(seeds: &[ResourceSeed]) -> Self {
        let resolver = Self::new();
        for seed in seeds {
            resolver.insert(&seed.id, seed.slug.as_deref(), seed.owner);
        }
        resolver
    }

    /// Add or replace a note
    pub fn insert(&self, id: &str, slug: Option<&str>, owner: Uuid) {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables.notes.insert(
            id.to_string(),
            NoteEntry {
                owner,
                members: Vec::new(),
            },
        );
        if let Some(slug) = slug {
            tables.slugs.insert(slug.to_string(), id.to_string());
        }
    }

    /// Grant a non-owner access to a note; returns false for unknown notes
    pub fn share(&self, id: &str, user_id: Uuid) -> bool {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        match tables.notes.get_mut(id) {
            Some(entry) => {
                if !entry.members.contains(&user_id) {
                    entry.members.push(user_id);
                }
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl ResourceResolver for InMemoryResolver {
    async fn resolve(&self, reference: &str, user_id: Uuid) -> Result<ResolvedResource, RegistrationError> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);

        // Canonical ids win over slugs
        let id = if tables.notes.contains_key(reference) {
            reference
        } else {
            tables
                .slugs
                .get(reference)
                .map(String::as_str)
                .ok_or_else(|| RegistrationError::not_found(reference))?
        };
        let entry = tables
            .notes
            .get(id)
            .ok_or_else(|| RegistrationError::not_found(reference))?;

        if entry.owner != user_id && !entry.members.contains(&user_id) {
            tracing::warn!(reference, user_id = %user_id, "[Resolver] Access denied");
            return Err(RegistrationError::forbidden(reference));
        }

        Ok(ResolvedResource {
            id: ResourceId::new(id),
            owner: entry.owner,
        })
    }
}
