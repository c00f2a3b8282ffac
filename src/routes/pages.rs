use std::path::Path;

use tower_http::services::{ServeDir, ServeFile};

/// Request path of the single-page app shell inside the bundle.
pub const APP_SHELL: &str = "/index.html";

/// page_service
///
/// Serves the built front-end bundle from `public_dir`. Unknown paths fall back
/// to the app shell so client-side routes resolve. Mounted as the router
/// fallback, behind the access gate.
pub fn page_service(public_dir: &Path) -> ServeDir<ServeFile> {
    let shell = public_dir.join(APP_SHELL.trim_start_matches('/'));
    ServeDir::new(public_dir).fallback(ServeFile::new(shell))
}
