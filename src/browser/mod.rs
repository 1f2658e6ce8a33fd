use anyhow::{Context, Result};

use crate::institutions::Institution;

/// Open a URL in the user's default browser
///
/// # Errors
/// Returns error if browser cannot be opened (e.g., no browser available)
pub fn open_url(url: &str) -> Result<()> {
    webbrowser::open(url).with_context(|| format!("Failed to open browser for URL: {}", url))?;
    Ok(())
}

/// Open an institution's admissions portal
pub fn open_portal(institution: &Institution) -> Result<()> {
    tracing::info!(slug = institution.slug, url = institution.url, "opening portal");
    open_url(institution.url)
}
