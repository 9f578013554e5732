//! Property tests for extension lookup.

use proptest::prelude::*;

use livebuild::{CompilerAdapter, ExtensionRegistry};

fn adapter_name(registry: &ExtensionRegistry, key: &str) -> Option<String> {
    registry.lookup(key).map(|a| a.name().to_string())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: A bare extension, a dotted one and a file name resolve alike.
    #[test]
    fn property_lookup_ignores_spelling(ext in "[a-z]{1,8}", stem in "[a-z0-9_]{1,8}") {
        let registry = ExtensionRegistry::with_builtins();
        let expected = adapter_name(&registry, &ext);
        prop_assert_eq!(&adapter_name(&registry, &format!(".{ext}")), &expected);
        prop_assert_eq!(&adapter_name(&registry, &format!("{stem}.{ext}")), &expected);
        prop_assert_eq!(&adapter_name(&registry, &format!("dir/{stem}.{}", ext.to_uppercase())), &expected);
    }

    /// PROPERTY: Every registered extension resolves.
    #[test]
    fn property_registered_extensions_resolve(stem in "[a-z]{1,8}") {
        let registry = ExtensionRegistry::with_builtins();
        for ext in registry.extensions() {
            let path = format!("{stem}.{ext}");
            prop_assert!(registry.lookup(path).is_some());
        }
    }
}
