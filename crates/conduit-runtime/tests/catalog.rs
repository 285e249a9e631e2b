// crates/conduit-runtime/tests/catalog.rs
// ============================================================================
// Module: Catalog Tests
// Description: Substitution registry, parameter builder, and object config paths.
// Purpose: Verify catalog round-trip laws and option error accumulation.
// Dependencies: conduit-runtime, proptest
// ============================================================================

//! ## Overview
//! Catalog variables feed URL templates; these tests pin the precedence and
//! round-trip rules between the typed and flat representations.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;

use conduit_core::ConnectorError;
use conduit_core::Context;
use conduit_core::ErrorKind;
use conduit_runtime::CatalogVariables;
use conduit_runtime::ObjectConfig;
use conduit_runtime::ObjectConfigs;
use conduit_runtime::ParamsBuilder;
use conduit_runtime::PostAuthInfo;
use conduit_runtime::ProviderInfo;
use conduit_runtime::SubstitutionPlan;
use conduit_runtime::SubstitutionRegistry;
use proptest::prelude::*;

// ============================================================================
// SECTION: Substitution Registry
// ============================================================================

#[test]
fn registry_renders_catalog_urls() {
    let registry = SubstitutionRegistry::from_plans([
        SubstitutionPlan {
            from: "workspace".to_string(),
            to: "acme".to_string(),
        },
        SubstitutionPlan {
            from: "server".to_string(),
            to: "na1.example.com".to_string(),
        },
    ]);
    assert_eq!(
        registry.apply("https://{{server}}/{{workspace}}/api/{{version}}"),
        "https://na1.example.com/acme/api/{{version}}"
    );
    assert_eq!(registry.plans().len(), 2);
}

#[test]
fn insert_if_absent_keeps_existing_values() {
    let mut registry = SubstitutionRegistry::new().with("workspace", "explicit");
    registry.insert_if_absent("workspace", "discovered");
    registry.insert_if_absent("server", "discovered");
    assert_eq!(registry.get("workspace"), Some("explicit"));
    assert_eq!(registry.get("server"), Some("discovered"));
}

#[test]
fn to_variables_drops_unknown_keys() {
    let registry = SubstitutionRegistry::new()
        .with("workspace", "acme")
        .with("module", "crm")
        .with("region", "eu");
    let variables = registry.to_variables();
    assert_eq!(variables.workspace.as_deref(), Some("acme"));
    assert_eq!(variables.module.as_deref(), Some("crm"));
    assert_eq!(variables.server, None);
    let rebuilt = SubstitutionRegistry::from_variables(&variables);
    assert_eq!(rebuilt.len(), 2);
    assert_eq!(rebuilt.get("region"), None);
}

/// Strategy over registries mixing known and unknown keys.
fn registry_strategy() -> impl Strategy<Value = SubstitutionRegistry> {
    let key = prop_oneof![
        Just("workspace".to_string()),
        Just("server".to_string()),
        Just("module".to_string()),
        "[a-z]{1,10}",
    ];
    proptest::collection::btree_map(key, "[a-z0-9.-]{0,12}", 0 .. 6).prop_map(|values| {
        values.into_iter().fold(SubstitutionRegistry::new(), |registry, (name, value)| {
            registry.with(name, value)
        })
    })
}

proptest! {
    #[test]
    fn variables_round_trip_is_a_subset(registry in registry_strategy()) {
        let rebuilt = SubstitutionRegistry::from_variables(&registry.to_variables());
        for plan in rebuilt.plans() {
            prop_assert_eq!(registry.get(&plan.from), Some(plan.to.as_str()));
        }
        for name in ["workspace", "server", "module"] {
            prop_assert_eq!(rebuilt.get(name), registry.get(name));
        }
    }
}

// ============================================================================
// SECTION: Parameter Builder
// ============================================================================

#[test]
fn builder_accumulates_every_option_error() {
    let mut provider = ProviderInfo::new("acme", "https://{{workspace}}.acme.com");
    provider.requires_workspace = true;
    provider.required_metadata = vec!["region".to_string()];
    let err = ParamsBuilder::new(provider)
        .with_workspace("bad/space")
        .with_module(" ")
        .with_metadata("", "x")
        .build()
        .unwrap_err();
    let ConnectorError::InvalidParameter(detail) = err else {
        panic!("unexpected error kind");
    };
    assert_eq!(detail.split("; ").count(), 5, "{detail}");
    assert!(detail.contains("URL delimiters"));
    assert!(detail.contains("requires a workspace"));
    assert!(detail.contains("requires metadata region"));
}

#[test]
fn substitutions_prefer_explicit_workspace_and_module() {
    let params = ParamsBuilder::new(ProviderInfo::new("acme", "https://{{workspace}}.acme.com"))
        .with_metadata("workspace", "from-metadata")
        .with_metadata("server", "api.acme.com")
        .with_workspace("explicit")
        .with_variables(&CatalogVariables {
            workspace: None,
            server: None,
            module: Some("crm".to_string()),
        })
        .build()
        .unwrap();
    let registry = params.substitutions();
    assert_eq!(registry.get("workspace"), Some("explicit"));
    assert_eq!(registry.get("module"), Some("crm"));
    assert_eq!(registry.get("server"), Some("api.acme.com"));
    assert_eq!(params.variables().server.as_deref(), Some("api.acme.com"));
}

/// Post-auth source returning a fixed account lookup.
struct AccountLookup;

impl PostAuthInfo for AccountLookup {
    fn post_auth_info(&self, _ctx: &Context) -> Result<BTreeMap<String, String>, ConnectorError> {
        Ok(BTreeMap::from([
            ("server".to_string(), "na3.docusign.net".to_string()),
            ("workspace".to_string(), "discovered".to_string()),
            ("timezone".to_string(), "UTC".to_string()),
        ]))
    }
}

#[test]
fn post_auth_metadata_fills_gaps_only() {
    let mut params = ParamsBuilder::new(ProviderInfo::new("docusign", "https://{{server}}"))
        .with_workspace("explicit")
        .with_metadata("timezone", "PST")
        .build()
        .unwrap();
    params.apply_post_auth(&Context::background(), &AccountLookup).unwrap();
    assert_eq!(params.workspace.as_deref(), Some("explicit"));
    assert_eq!(params.metadata["server"], "na3.docusign.net");
    assert_eq!(params.metadata["timezone"], "PST");
}

// ============================================================================
// SECTION: Object Config Paths
// ============================================================================

#[test]
fn object_configs_parse_from_flat_metadata() {
    let metadata = BTreeMap::from([
        ("$['objects']['orders']['query']".to_string(), "select * from orders".to_string()),
        ("$['objects']['orders']['timestampColumn']".to_string(), "updated_at".to_string()),
        ("$['objects']['users']['primaryKey']".to_string(), "id".to_string()),
        ("warehouse".to_string(), "compute_wh".to_string()),
    ]);
    let configs = ObjectConfigs::from_metadata(&metadata).unwrap();
    assert_eq!(configs.objects.len(), 2);
    assert_eq!(configs.get("orders").unwrap().get("timestampColumn"), Some("updated_at"));
    assert_eq!(configs.get("users").unwrap().get("primaryKey"), Some("id"));
    let mut expected = metadata;
    expected.remove("warehouse");
    assert_eq!(configs.to_metadata(), expected);
}

#[test]
fn object_configs_reject_foreign_paths() {
    for key in ["$['objects']['orders']", "$['tables']['orders']['query']", "$['objects'"] {
        let metadata = BTreeMap::from([(key.to_string(), "x".to_string())]);
        let err = ObjectConfigs::from_metadata(&metadata).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter, "key {key}");
    }
}

proptest! {
    #[test]
    fn object_configs_round_trip(
        objects in proptest::collection::btree_map(
            "[a-z'\\\\ .]{1,8}",
            proptest::collection::btree_map("[a-zA-Z'\\]\\[]{1,8}", "[ -~]{0,12}", 1 .. 4),
            0 .. 4,
        )
    ) {
        let configs = objects.into_iter().fold(ObjectConfigs::default(), |configs, (name, properties)| {
            configs.with(name, ObjectConfig { properties })
        });
        let parsed = ObjectConfigs::from_metadata(&configs.to_metadata()).unwrap();
        prop_assert_eq!(parsed, configs);
    }
}
