//! The announcement board.
//!
//! Administrators schedule short site-wide messages; the storefront shows
//! the ones whose window contains the current instant.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use styleaura_core::storage::{KeyValueStore, StorageKeys};
use styleaura_core::{Announcement, AnnouncementDraft, AnnouncementId};
use styleaura_storefront::services::validation::ValidationErrors;

use crate::db::JsonCollection;
use crate::error::{AdminError, Result};
use crate::middleware::RequireAdmin;

/// Scheduled site announcements, in creation order.
#[derive(Debug)]
pub struct AnnouncementBoard {
    announcements: JsonCollection<Announcement>,
}

impl AnnouncementBoard {
    /// Create a board over the announcements key in `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, keys: &StorageKeys) -> Self {
        Self {
            announcements: JsonCollection::new(store, keys.announcements.clone()),
        }
    }

    /// Announcements visible at `now`, in stored order.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Storage` if the board cannot be read.
    pub fn active(&self, now: DateTime<Utc>) -> Result<Vec<Announcement>> {
        Ok(self
            .announcements
            .load()?
            .into_iter()
            .filter(|announcement| announcement.is_visible_at(now))
            .collect())
    }

    /// Every announcement, including inactive and expired ones.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Storage` if the board cannot be read.
    pub fn list(&self, _admin: &RequireAdmin) -> Result<Vec<Announcement>> {
        Ok(self.announcements.load()?)
    }

    /// Publish a new announcement, id `ann-<unix millis of now>`.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Validation` for an empty message or a window that
    /// ends before it starts.
    #[instrument(skip(self, admin, draft), fields(admin_id = %admin.identity().id))]
    pub fn create(
        &self,
        admin: &RequireAdmin,
        draft: AnnouncementDraft,
        now: DateTime<Utc>,
    ) -> Result<Announcement> {
        validate(&draft.message, draft.starts_at, draft.ends_at)?;

        let created = self.announcements.update(|announcements| {
            let id = unused_id(announcements, now.timestamp_millis());
            let announcement = Announcement {
                id,
                message: draft.message.trim().to_string(),
                url: draft.url.filter(|url| !url.trim().is_empty()),
                is_active: draft.is_active,
                starts_at: draft.starts_at,
                ends_at: draft.ends_at,
            };
            announcements.push(announcement.clone());
            Ok::<_, AdminError>(announcement)
        })?;
        info!(announcement_id = %created.id, "Announcement created");
        Ok(created)
    }

    /// Replace the announcement with the same id.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Validation` as for [`Self::create`], or
    /// `AdminError::NotFound` for an unknown id.
    #[instrument(skip(self, admin, announcement), fields(admin_id = %admin.identity().id, announcement_id = %announcement.id))]
    pub fn update(&self, admin: &RequireAdmin, announcement: Announcement) -> Result<()> {
        validate(
            &announcement.message,
            announcement.starts_at,
            announcement.ends_at,
        )?;

        self.announcements.update(|announcements| {
            let slot = announcements
                .iter_mut()
                .find(|existing| existing.id == announcement.id)
                .ok_or_else(|| not_found(&announcement.id))?;
            *slot = announcement;
            Ok::<_, AdminError>(())
        })?;
        info!("Announcement updated");
        Ok(())
    }

    /// Remove an announcement and return it.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::NotFound` for an unknown id.
    #[instrument(skip(self, admin), fields(admin_id = %admin.identity().id, announcement_id = %id))]
    pub fn delete(&self, admin: &RequireAdmin, id: &AnnouncementId) -> Result<Announcement> {
        let removed = self.announcements.update(|announcements| {
            let position = announcements
                .iter()
                .position(|existing| &existing.id == id)
                .ok_or_else(|| not_found(id))?;
            Ok::<_, AdminError>(announcements.remove(position))
        })?;
        info!("Announcement deleted");
        Ok(removed)
    }

    /// Flip an announcement's active flag and return the new value.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::NotFound` for an unknown id.
    #[instrument(skip(self, admin), fields(admin_id = %admin.identity().id, announcement_id = %id))]
    pub fn toggle(&self, admin: &RequireAdmin, id: &AnnouncementId) -> Result<bool> {
        let is_active = self.announcements.update(|announcements| {
            let announcement = announcements
                .iter_mut()
                .find(|existing| &existing.id == id)
                .ok_or_else(|| not_found(id))?;
            announcement.is_active = !announcement.is_active;
            Ok::<_, AdminError>(announcement.is_active)
        })?;
        info!(is_active, "Announcement toggled");
        Ok(is_active)
    }
}

fn validate(message: &str, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<()> {
    let mut errors = ValidationErrors::new();
    errors.ensure(!message.trim().is_empty(), "message", "Message is required");
    errors.ensure(
        starts_at <= ends_at,
        "endsAt",
        "End date must be on or after the start date",
    );
    errors.into_result().map_err(AdminError::from)
}

/// `ann-<millis>`, stepping forward past ids already taken within the same
/// millisecond.
fn unused_id(announcements: &[Announcement], mut millis: i64) -> AnnouncementId {
    loop {
        let id = AnnouncementId::new(format!("ann-{millis}"));
        if announcements.iter().all(|existing| existing.id != id) {
            return id;
        }
        millis += 1;
    }
}

fn not_found(id: &AnnouncementId) -> AdminError {
    AdminError::NotFound(format!("announcement {id}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use styleaura_core::storage::MemoryStore;

    use super::*;
    use crate::test_support::{admin_guard, day};

    fn board() -> AnnouncementBoard {
        AnnouncementBoard::new(Arc::new(MemoryStore::new()), &StorageKeys::default())
    }

    fn draft(message: &str, starts_at: DateTime<Utc>, days: i64) -> AnnouncementDraft {
        AnnouncementDraft {
            message: message.to_string(),
            url: None,
            is_active: true,
            starts_at,
            ends_at: starts_at + Duration::days(days),
        }
    }

    #[test]
    fn test_create_assigns_millis_id() {
        let board = board();
        let admin = admin_guard();
        let now = day(0);

        let first = board
            .create(&admin, draft("Summer Sale!", day(0), 30), now)
            .unwrap();
        let second = board
            .create(&admin, draft("Free shipping week", day(0), 7), now)
            .unwrap();

        assert_eq!(first.id.as_str(), format!("ann-{}", now.timestamp_millis()));
        assert_ne!(first.id, second.id);
        assert_eq!(board.list(&admin).unwrap().len(), 2);
    }

    #[test]
    fn test_create_validates() {
        let board = board();
        let admin = admin_guard();

        let AdminError::Validation(errors) = board
            .create(&admin, draft("   ", day(5), -1), day(0))
            .unwrap_err()
        else {
            panic!("expected validation error");
        };
        assert!(errors.has("message"));
        assert!(errors.has("endsAt"));
        assert!(board.list(&admin).unwrap().is_empty());
    }

    #[test]
    fn test_active_respects_flag_and_window() {
        let board = board();
        let admin = admin_guard();
        let sale = board
            .create(&admin, draft("Summer Sale!", day(1), 10), day(0))
            .unwrap();
        board
            .create(&admin, draft("Diwali preview", day(20), 5), day(0))
            .unwrap();

        assert!(board.active(day(0)).unwrap().is_empty());
        assert_eq!(board.active(day(2)).unwrap(), vec![sale.clone()]);

        assert!(!board.toggle(&admin, &sale.id).unwrap());
        assert!(board.active(day(2)).unwrap().is_empty());
        assert!(board.toggle(&admin, &sale.id).unwrap());
        assert_eq!(board.active(day(2)).unwrap().len(), 1);
    }

    #[test]
    fn test_update_and_delete() {
        let board = board();
        let admin = admin_guard();
        let created = board
            .create(&admin, draft("Summer Sale!", day(1), 10), day(0))
            .unwrap();

        let edited = Announcement {
            message: "Summer Sale extended!".to_string(),
            ends_at: day(25),
            ..created.clone()
        };
        board.update(&admin, edited.clone()).unwrap();
        assert_eq!(board.list(&admin).unwrap(), vec![edited.clone()]);

        let removed = board.delete(&admin, &created.id).unwrap();
        assert_eq!(removed, edited);
        assert!(board.list(&admin).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let board = board();
        let admin = admin_guard();
        let missing = AnnouncementId::new("ann-0");

        assert!(matches!(
            board.toggle(&admin, &missing),
            Err(AdminError::NotFound(_))
        ));
        assert!(matches!(
            board.delete(&admin, &missing),
            Err(AdminError::NotFound(_))
        ));
    }
}
