#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        // Config parsing and source resolution should never panic
        if let Ok(config) = toml::from_str::<livebuild::Config>(content) {
            let registry = livebuild::ExtensionRegistry::with_builtins();
            let _ = livebuild::Settings::resolve(&config, &registry);
        }
    }
});
