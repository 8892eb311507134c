//! Property tests for cloak.
//!
//! These tests validate ordering, filtering and policy resolution across
//! arbitrary sequences of emitted diagnostics.

use cloak::{Cloak, Policy, Severity, SeverityMask, ThrowSwitch, emit};
use proptest::prelude::*;

// Strategy: one known severity
fn arb_severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::WARNING),
        Just(Severity::NOTICE),
        Just(Severity::USER_WARNING),
        Just(Severity::USER_NOTICE),
        Just(Severity::DEPRECATED),
        Just(Severity::USER_DEPRECATED),
    ]
}

// Strategy: a sequence of diagnostics to emit
fn arb_emissions() -> impl Strategy<Value = Vec<(Severity, String)>> {
    prop::collection::vec(
        (
            arb_severity(),
            prop::string::string_regex("[a-z ]{1,20}").unwrap(),
        ),
        0..12,
    )
}

fn arb_policy() -> impl Strategy<Value = Policy> {
    prop_oneof![
        Just(Policy::FollowDefault),
        Just(Policy::Silent),
        Just(Policy::Throw),
    ]
}

fn replay(emissions: &[(Severity, String)]) {
    for (severity, message) in emissions {
        emit(*severity, message.clone());
    }
}

proptest! {
    /// Property: Captured diagnostics keep emission order, oldest first
    #[test]
    fn proptest_capture_preserves_emission_order(emissions in arb_emissions()) {
        let mut cloak = Cloak::all(|e: &[(Severity, String)]| replay(e), Policy::Silent);

        prop_assert!(cloak.run(emissions.as_slice()).is_ok());

        let captured: Vec<(Severity, String)> = cloak
            .errors()
            .iter()
            .map(|d| (d.severity(), d.message().to_string()))
            .collect();
        prop_assert_eq!(&captured, &emissions);
        prop_assert_eq!(cloak.errors().is_empty(), emissions.is_empty());
        prop_assert_eq!(
            cloak.errors().first().map(|d| d.message().to_string()),
            emissions.first().map(|(_, m)| m.clone())
        );
        prop_assert_eq!(
            cloak.errors().last().map(|d| d.message().to_string()),
            emissions.last().map(|(_, m)| m.clone())
        );
    }

    /// Property: A cloak only ever captures severities inside its level
    #[test]
    fn proptest_level_filters_severities(
        emissions in arb_emissions(),
        level in prop::collection::vec(arb_severity(), 1..3)
    ) {
        let mask = level
            .iter()
            .fold(SeverityMask::EMPTY, |mask, severity| mask | *severity);
        let mut cloak = Cloak::new(|e: &[(Severity, String)]| replay(e), Policy::Silent, mask);

        cloak.run(emissions.as_slice()).unwrap();

        let expected: Vec<&String> = emissions
            .iter()
            .filter(|(severity, _)| mask.contains(*severity))
            .map(|(_, message)| message)
            .collect();
        let captured: Vec<&str> = cloak.errors().iter().map(|d| d.message()).collect();

        prop_assert_eq!(captured.len(), expected.len());
        for (got, want) in captured.iter().zip(expected) {
            prop_assert_eq!(*got, want.as_str());
        }
    }

    /// Property: The outcome is a failure exactly when something was captured
    /// and the policy, merged with the switch, says to throw
    #[test]
    fn proptest_policy_resolution(
        emissions in arb_emissions(),
        policy in arb_policy(),
        switch_on in any::<bool>()
    ) {
        let switch = ThrowSwitch::new();
        if switch_on {
            switch.enable();
        }

        let mut cloak = Cloak::builder(|e: &[(Severity, String)]| replay(e))
            .policy(policy)
            .level(SeverityMask::ALL)
            .throw_switch(switch)
            .build()
            .unwrap();

        let should_throw = match policy {
            Policy::Silent => false,
            Policy::Throw => true,
            Policy::FollowDefault => switch_on,
        };
        prop_assert_eq!(cloak.errors_are_thrown(), should_throw);
        prop_assert_eq!(cloak.errors_are_silenced(), !should_throw);

        let result = cloak.run(emissions.as_slice());

        if should_throw && !emissions.is_empty() {
            let err = result.unwrap_err();
            prop_assert_eq!(err.to_string(), emissions[0].1.clone());
        } else {
            prop_assert!(result.is_ok());
        }
        prop_assert_eq!(cloak.errors().len(), emissions.len());
    }
}
