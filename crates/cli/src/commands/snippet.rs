//! Print custom pixel code without touching the database.

use clarity_pixel_core::{EventSelection, TrackingId, TrackingIdError, snippet};

/// Render the pixel for `tracking_id` (blank or absent gives the placeholder).
///
/// # Errors
///
/// Returns `TrackingIdError` if `tracking_id` is non-blank and invalid.
pub fn render(tracking_id: Option<&str>, all_events: bool) -> Result<String, TrackingIdError> {
    let tracking_id = TrackingId::parse_optional(tracking_id.unwrap_or_default())?;

    Ok(if all_events {
        snippet::generate_for_events(tracking_id.as_ref(), &EventSelection::all())
    } else {
        snippet::generate(tracking_id.as_ref())
    })
}

/// Print the pixel to stdout.
pub fn print(tracking_id: Option<&str>, all_events: bool) -> Result<(), TrackingIdError> {
    let code = render(tracking_id, all_events)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{code}");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_render_placeholder_without_id() {
        assert!(render(None, false).unwrap().contains(snippet::PLACEHOLDER_COMMENT));
        assert!(render(Some("  "), false).unwrap().contains(snippet::PLACEHOLDER_COMMENT));
    }

    #[test]
    fn test_render_modes() {
        let single = render(Some("abc"), false).unwrap();
        assert_eq!(single.matches("analytics.subscribe(").count(), 1);

        let all = render(Some("abc"), true).unwrap();
        assert_eq!(all.matches("analytics.subscribe(").count(), 6);
    }

    #[test]
    fn test_render_rejects_invalid_id() {
        assert!(render(Some("abc'); alert(1); ('"), false).is_err());
    }
}
