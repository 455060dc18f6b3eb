//! Skip and known-failure policy
//!
//! Rules come from two places: the adapters themselves (cases their author
//! knows the library gets wrong) and the run configuration. Either way a
//! matching case resolves to `SKIPPED` with the rule's reason, never to
//! `PASS` or `FAIL`.

use crate::conformance::ConformanceCase;
use crate::draft::SchemaDraft;
use crate::error::{Error, Result};
use crate::implementation::Implementation;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A skip rule as written in configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkipRuleSpec {
    /// Short or long implementation name; `None` applies to every implementation
    pub implementation: Option<String>,
    pub draft: Option<SchemaDraft>,
    /// Pattern over the case's file path relative to its draft directory
    pub file: Option<String>,
    /// Pattern over the group description
    pub group: Option<String>,
    /// Pattern over the case description
    pub case: Option<String>,
    pub reason: String,
}

/// A compiled skip rule
#[derive(Debug, Clone)]
pub struct SkipRule {
    implementation: Option<Implementation>,
    draft: Option<SchemaDraft>,
    file: Option<Regex>,
    group: Option<Regex>,
    case: Option<Regex>,
    reason: String,
}

fn compile_pattern(pattern: &Option<String>) -> Result<Option<Regex>> {
    pattern
        .as_deref()
        .map(|p| {
            Regex::new(p).map_err(|e| Error::configuration(format!("invalid skip pattern '{}': {}", p, e)))
        })
        .transpose()
}

impl SkipRule {
    pub fn compile(spec: &SkipRuleSpec) -> Result<Self> {
        let implementation = match &spec.implementation {
            Some(name) => Some(Implementation::from_name(name).ok_or_else(|| {
                Error::configuration(format!("skip rule names unknown implementation '{}'", name))
            })?),
            None => None,
        };

        Ok(Self {
            implementation,
            draft: spec.draft,
            file: compile_pattern(&spec.file)?,
            group: compile_pattern(&spec.group)?,
            case: compile_pattern(&spec.case)?,
            reason: if spec.reason.is_empty() {
                "skipped by configuration".to_string()
            } else {
                spec.reason.clone()
            },
        })
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Every present criterion must match
    pub fn matches(&self, implementation: Implementation, case: &ConformanceCase) -> bool {
        let pattern_matches =
            |pattern: &Option<Regex>, text: &str| pattern.as_ref().map_or(true, |p| p.is_match(text));

        self.implementation.map_or(true, |i| i == implementation)
            && self.draft.map_or(true, |d| d == case.draft)
            && pattern_matches(&self.file, &case.file)
            && pattern_matches(&self.group, &case.group)
            && pattern_matches(&self.case, &case.description)
    }
}

/// All rules that apply to a run
#[derive(Debug, Clone, Default)]
pub struct SkipPolicy {
    rules: Vec<SkipRule>,
}

impl SkipPolicy {
    /// Adapter-declared rules for the given implementations plus configured ones
    pub fn new(implementations: &[Implementation], configured: &[SkipRuleSpec]) -> Result<Self> {
        let declared = implementations
            .iter()
            .flat_map(|imp| imp.adapter().known_failures());

        let rules = declared
            .chain(configured.iter().cloned())
            .map(|spec| SkipRule::compile(&spec))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The reason the first matching rule gives, if any
    pub fn reason_for(&self, implementation: Implementation, case: &ConformanceCase) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| r.matches(implementation, case))
            .map(SkipRule::reason)
    }

    /// Record known-failing annotations on each case
    pub fn annotate(&self, implementations: &[Implementation], cases: &mut [ConformanceCase]) {
        for case in cases.iter_mut() {
            for &imp in implementations {
                if let Some(reason) = self.reason_for(imp, case) {
                    let reason = reason.to_string();
                    case.known_failing.insert(imp, reason);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remotes::RemoteSchemas;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn case(file: &str, group: &str, description: &str) -> ConformanceCase {
        ConformanceCase {
            draft: SchemaDraft::Draft7,
            file: file.to_string(),
            group: group.to_string(),
            description: description.to_string(),
            comment: None,
            schema: Arc::from(r#"{"type": "integer"}"#),
            instance: "1".to_string(),
            expected: true,
            optional: false,
            remotes: Arc::new(RemoteSchemas::empty()),
            known_failing: BTreeMap::new(),
        }
    }

    #[test]
    fn test_rule_requires_all_criteria() {
        let rule = SkipRule::compile(&SkipRuleSpec {
            implementation: Some("valico".to_string()),
            file: Some(r"^ref\.json$".to_string()),
            case: Some("recursive".to_string()),
            reason: "stack overflow".to_string(),
            ..Default::default()
        })
        .unwrap();

        let hit = case("ref.json", "root pointer ref", "recursive mismatch");
        assert!(rule.matches(Implementation::Valico, &hit));
        assert!(!rule.matches(Implementation::Jsonschema, &hit));
        assert!(!rule.matches(
            Implementation::Valico,
            &case("refRemote.json", "x", "recursive mismatch")
        ));
        assert!(!rule.matches(Implementation::Valico, &case("ref.json", "x", "match")));
    }

    #[test]
    fn test_rule_without_implementation_applies_to_all() {
        let rule = SkipRule::compile(&SkipRuleSpec {
            draft: Some(SchemaDraft::Draft7),
            group: Some("unicode".to_string()),
            ..Default::default()
        })
        .unwrap();
        let c = case("pattern.json", "unicode semantics", "x");
        for imp in Implementation::all() {
            assert!(rule.matches(*imp, &c));
        }
        assert_eq!(rule.reason(), "skipped by configuration");
    }

    #[test]
    fn test_invalid_pattern_is_configuration_error() {
        let err = SkipRule::compile(&SkipRuleSpec {
            file: Some("(".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_unknown_implementation_rejected() {
        let err = SkipRule::compile(&SkipRuleSpec {
            implementation: Some("ajv".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("ajv"));
    }

    #[test]
    fn test_policy_includes_adapter_rules_and_annotates() {
        let policy = SkipPolicy::new(Implementation::all(), &[]).unwrap();
        assert!(!policy.is_empty());

        let mut cases = vec![case("refRemote.json", "remote ref", "remote ref valid")];
        policy.annotate(Implementation::all(), &mut cases);
        assert!(cases[0]
            .known_failing
            .contains_key(&Implementation::JsonschemaValid));
        assert!(!cases[0].known_failing.contains_key(&Implementation::Jsonschema));
    }
}
