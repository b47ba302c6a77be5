//! Property-based tests for parsing and aggregation invariants.
//!
//! Uses `proptest` to verify invariants across many random inputs.

use proptest::prelude::*;

use ssm_admin::domain::ini::IniDocument;
use ssm_admin::domain::local_service::UnitPrefix;
use ssm_admin::domain::{ErrorList, InitSystem, ShadowPatch, parse_unit_name, validate_name};
use ssm_common::ServiceType;

fn any_service_type() -> impl Strategy<Value = ServiceType> {
    prop::sample::select(ServiceType::ALLOWED.to_vec())
}

// ============================================================================
// Unit name grammar
// ============================================================================

proptest! {
    /// Every allowed type round-trips through the unit filename grammar.
    #[test]
    fn prop_unit_names_round_trip(
        service_type in any_service_type(),
        pmm in proptest::bool::ANY,
        suffix in proptest::option::of("[0-9]{1,5}"),
    ) {
        let prefix = if pmm { "pmm" } else { "ssm" };
        let fragment = service_type.unit_name().trim_start_matches("ssm-").to_string();
        let name = match &suffix {
            Some(digits) => format!("{prefix}-{fragment}-{digits}"),
            None => format!("{prefix}-{fragment}"),
        };

        let Some(parsed) = parse_unit_name(&name) else {
            return Err(TestCaseError::fail(format!("rejected {name}")));
        };
        prop_assert_eq!(parsed.service_type, service_type);
        prop_assert_eq!(parsed.prefix == UnitPrefix::Pmm, pmm);
        prop_assert_eq!(parsed.version_suffix, suffix);
    }

    /// Names with anything after a non-numeric suffix are not ours.
    #[test]
    fn prop_non_numeric_suffix_is_rejected(
        service_type in any_service_type(),
        tail in "[a-z]{1,8}",
    ) {
        let name = format!("{}-{tail}", service_type.unit_name());
        prop_assert!(parse_unit_name(&name).is_none(), "accepted {}", name);
    }
}

// ============================================================================
// Error aggregation
// ============================================================================

proptest! {
    /// The joined message lists every slot in order, empty ones as `<nil>`.
    #[test]
    fn prop_error_join_preserves_order(
        slots in proptest::collection::vec(proptest::option::of("[a-z0-9 ]{1,20}"), 1..8),
    ) {
        let mut list = ErrorList::new();
        for slot in &slots {
            list.push_slot(slot.as_ref().map(|m| anyhow::anyhow!("{m}")));
        }
        let expected = slots
            .iter()
            .map(|s| s.as_deref().unwrap_or("<nil>"))
            .collect::<Vec<_>>()
            .join(", ");

        let err = list.into_error();
        prop_assert!(err.is_some());
        prop_assert_eq!(err.map(|e| e.to_string()).unwrap_or_default(), expected);
    }
}

#[test]
fn test_error_join_with_nil_slot() {
    let mut list = ErrorList::new();
    list.push(anyhow::anyhow!("e1"));
    list.push_slot(None);
    list.push(anyhow::anyhow!("e3"));
    let msg = list.into_error().map(|e| e.to_string());
    assert_eq!(msg.as_deref(), Some("e1, <nil>, e3"));
}

// ============================================================================
// Names and unit files
// ============================================================================

proptest! {
    /// Names from the allowed alphabet within bounds are accepted.
    #[test]
    fn prop_valid_names_accepted(name in "[-a-zA-Z0-9_:.]{2,60}") {
        prop_assert!(validate_name("alias", &name).is_ok(), "rejected {}", name);
    }

    /// Whitespace anywhere makes a name invalid.
    #[test]
    fn prop_names_with_spaces_rejected(head in "[a-z]{1,20}", tail in "[a-z]{1,20}") {
        let name = format!("{head} {tail}");
        prop_assert!(validate_name("alias", &name).is_err());
    }

    /// Unedited documents render back byte-for-byte.
    #[test]
    fn prop_untouched_ini_renders_identically(
        entries in proptest::collection::vec(("[a-z][a-z_-]{0,10}", "[a-zA-Z0-9:/._-]{0,20}"), 0..10),
    ) {
        let mut text = String::from("[web]\n");
        for (k, v) in &entries {
            text.push_str(&format!("{k} = {v}\n"));
        }
        prop_assert_eq!(IniDocument::parse(&text).render(), text);
    }

    /// A systemd shadow never restarts and always asks for reconfiguration.
    #[test]
    fn prop_systemd_shadow_is_one_shot(
        exe in "/[a-z]{1,10}/[a-z_]{1,15}",
        restart in prop::sample::select(vec!["always", "on-failure", "no"]),
    ) {
        let unit = format!("[Service]\nExecStart={exe}\nRestart={restart}\n");
        let shadow = ShadowPatch::from(InitSystem::Systemd)
            .apply(&unit, "ssm-linux-metrics-42000-upgrade");
        let doc = IniDocument::parse(&shadow);
        prop_assert_eq!(doc.get(Some("Service"), "Restart"), Some("no"));
        prop_assert_eq!(doc.get_all(Some("Service"), "Restart").len(), 1);
        prop_assert_eq!(doc.get_all(Some("Service"), "Environment"), vec!["\"ON_CONFIGURE=1\""]);
        prop_assert_eq!(doc.get(Some("Service"), "ExecStart"), Some(exe.as_str()));
    }
}
