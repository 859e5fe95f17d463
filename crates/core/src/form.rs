//! In-memory state of the settings form.
//!
//! Edits are staged here and only reach the database when the caller saves
//! the [`SettingsSubmission`] produced by [`SettingsForm::submission`].

use crate::types::{EventSelection, StoreDetails, TrackedEvent, TrackingId, TrackingIdError};

/// Validated payload of a save.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsSubmission {
    pub tracking_id: Option<TrackingId>,
    pub details: StoreDetails,
}

/// Editable copy of a store's settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsForm {
    tracking_id: String,
    details: StoreDetails,
}

impl SettingsForm {
    /// Start editing from the currently persisted values.
    #[must_use]
    pub fn new(tracking_id: Option<&TrackingId>, details: StoreDetails) -> Self {
        Self {
            tracking_id: tracking_id.map(ToString::to_string).unwrap_or_default(),
            details,
        }
    }

    /// Raw text of the tracking ID field.
    #[must_use]
    pub fn tracking_id_input(&self) -> &str {
        &self.tracking_id
    }

    /// Replace the tracking ID field text. Validation happens on submit.
    pub fn set_tracking_id(&mut self, value: impl Into<String>) {
        self.tracking_id = value.into();
    }

    /// Current event selection.
    #[must_use]
    pub fn events(&self) -> EventSelection {
        self.details.events()
    }

    /// Flip one event and stage the whole selection into the pending details.
    ///
    /// Returns the event's new flag.
    pub fn toggle_event(&mut self, event: TrackedEvent) -> bool {
        let mut events = self.details.events();
        let tracked = events.toggle(event);
        self.details.selected_events = Some(events);
        tracked
    }

    /// Pending details, including staged event changes.
    #[must_use]
    pub const fn details(&self) -> &StoreDetails {
        &self.details
    }

    /// Validate the form into a save payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracking ID text is non-blank and invalid.
    pub fn submission(&self) -> Result<SettingsSubmission, TrackingIdError> {
        Ok(SettingsSubmission {
            tracking_id: TrackingId::parse_optional(&self.tracking_id)?,
            details: self.details.clone(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tracking_id(s: &str) -> TrackingId {
        TrackingId::parse(s).unwrap()
    }

    #[test]
    fn test_new_prefills_tracking_id() {
        let form = SettingsForm::new(Some(&tracking_id("abc123")), StoreDetails::default());
        assert_eq!(form.tracking_id_input(), "abc123");

        let empty = SettingsForm::new(None, StoreDetails::default());
        assert_eq!(empty.tracking_id_input(), "");
    }

    #[test]
    fn test_toggle_stages_into_details() {
        let mut form = SettingsForm::new(None, StoreDetails::default());
        assert!(form.details().selected_events.is_none());

        assert!(!form.toggle_event(TrackedEvent::AddToCart));

        let staged = form.details().selected_events.unwrap();
        assert!(!staged.add_to_cart);
        assert!(staged.purchase);
    }

    #[test]
    fn test_toggle_twice_restores_selection() {
        let mut form = SettingsForm::new(None, StoreDetails::default());
        let before = form.events();

        form.toggle_event(TrackedEvent::Search);
        form.toggle_event(TrackedEvent::Search);

        assert_eq!(form.events(), before);
    }

    #[test]
    fn test_submission_parses_tracking_id() {
        let mut form = SettingsForm::new(None, StoreDetails::default());

        form.set_tracking_id("  ");
        assert_eq!(form.submission().unwrap().tracking_id, None);

        form.set_tracking_id("k2x9abc1de");
        assert_eq!(
            form.submission().unwrap().tracking_id,
            Some(tracking_id("k2x9abc1de"))
        );

        form.set_tracking_id("bad\"id");
        assert!(form.submission().is_err());
    }

    #[test]
    fn test_submission_carries_staged_events() {
        let mut form = SettingsForm::new(Some(&tracking_id("abc")), StoreDetails::default());
        form.toggle_event(TrackedEvent::Purchase);

        let submission = form.submission().unwrap();
        assert!(!submission.details.events().purchase);
    }
}
