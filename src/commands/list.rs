use livebuild::reload::{DEFAULT_EXTENSIONS, KNOWN_BROWSERS, LOCALHOST};
use livebuild::ExtensionRegistry;

use crate::ui::views::list::render_list;

/// Print the supported file types, reload types, browsers and local urls
pub fn cmd_list(registry: &ExtensionRegistry) {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    print!(
        "{}",
        render_list(&[
            ("Compile", registry.extensions()),
            ("Reload", owned(DEFAULT_EXTENSIONS)),
            ("Browsers", owned(KNOWN_BROWSERS)),
            ("Localhost", owned(LOCALHOST)),
        ])
    );
}
