//! Built-in format definitions.
//!
//! Indicator names are matched case-insensitively as substrings of the
//! serialized document and weighted by where they occur as keys.

use super::types::{FieldIndicator, FormatDefinition, SupportedFormat};

fn fields(names: &[&str]) -> Vec<FieldIndicator> {
    names.iter().map(|n| FieldIndicator::new(*n)).collect()
}

/// Zephyr Scale / Squad exports.
pub fn zephyr() -> FormatDefinition {
    FormatDefinition {
        format: SupportedFormat::Zephyr,
        unique: fields(&["testCase", "execution", "cycle"]),
        strong: vec![
            FieldIndicator::new("testScript"),
            FieldIndicator::with_pattern(
                "testCaseKey",
                r#""testCaseKey"\s*:\s*"[A-Z][A-Z0-9_]*-T\d+""#,
            ),
            FieldIndicator::new("folder"),
            FieldIndicator::new("project"),
        ],
        moderate: fields(&["objective", "precondition", "priority", "status", "labels", "steps"]),
        weak: fields(&["owner", "component", "estimatedTime", "key"]),
        alternative_keywords: Vec::new(),
    }
}

/// Jira with the Xray test-management add-on.
pub fn jira_xray() -> FormatDefinition {
    FormatDefinition {
        format: SupportedFormat::JiraXray,
        unique: fields(&["testExecutions", "testInfo", "evidences"]),
        strong: vec![
            FieldIndicator::with_pattern(
                "testExecutionKey",
                r#""testExecutionKey"\s*:\s*"[A-Z][A-Z0-9_]*-\d+""#,
            ),
            FieldIndicator::new("testPlanKey"),
            FieldIndicator::new("testEnvironments"),
            FieldIndicator::new("testKey"),
        ],
        moderate: fields(&["issues", "fields", "summary", "issuetype", "steps", "status"]),
        weak: fields(&["comment", "assignee", "labels", "key"]),
        alternative_keywords: Vec::new(),
    }
}

/// TestRail API exports.
pub fn testrail() -> FormatDefinition {
    FormatDefinition {
        format: SupportedFormat::TestRail,
        unique: fields(&["suite_id", "section_id", "milestone_id"]),
        strong: vec![
            FieldIndicator::with_pattern("case_id", r#""case_id"\s*:\s*\d+"#),
            FieldIndicator::new("run_id"),
            FieldIndicator::new("custom_steps_separated"),
            FieldIndicator::new("template_id"),
        ],
        moderate: fields(&["runs", "cases", "title", "type_id", "priority_id", "refs"]),
        weak: fields(&["created_by", "updated_on", "estimate", "status_id"]),
        alternative_keywords: Vec::new(),
    }
}

/// TestLink XML exports converted to JSON.
pub fn testlink() -> FormatDefinition {
    FormatDefinition {
        format: SupportedFormat::TestLink,
        unique: fields(&["testsuites", "testsuite", "node_order"]),
        strong: vec![
            FieldIndicator::with_pattern("externalid", r#""externalid"\s*:\s*"?\d+"#),
            FieldIndicator::new("execution_type"),
            FieldIndicator::new("testcase"),
            FieldIndicator::new("step_number"),
        ],
        moderate: fields(&["summary", "preconditions", "actions", "expectedresults", "importance"]),
        weak: fields(&["details", "version", "keywords", "name"]),
        alternative_keywords: Vec::new(),
    }
}

/// Hand-written or tool-agnostic JSON test suites.
pub fn generic() -> FormatDefinition {
    FormatDefinition {
        format: SupportedFormat::Generic,
        unique: Vec::new(),
        strong: fields(&["tests", "testcases", "test_cases", "scenarios"]),
        moderate: fields(&[
            "name",
            "description",
            "steps",
            "expected",
            "expected_result",
            "expectedResult",
        ]),
        weak: fields(&["id", "title", "priority", "tags"]),
        alternative_keywords: [
            "tests",
            "testcases",
            "test_cases",
            "scenarios",
            "cases",
            "suite",
            "test_suite",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    }
}

/// All built-in definitions, in `SupportedFormat::DETECTABLE` order.
pub fn builtin_definitions() -> Vec<FormatDefinition> {
    vec![zephyr(), jira_xray(), testrail(), testlink(), generic()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_definitions_are_valid() {
        for def in builtin_definitions() {
            def.validate()
                .unwrap_or_else(|e| panic!("{} definition invalid: {e}", def.format));
        }
    }

    #[test]
    fn test_builtin_order_matches_detectable() {
        let formats: Vec<SupportedFormat> =
            builtin_definitions().iter().map(|d| d.format).collect();
        assert_eq!(formats, SupportedFormat::DETECTABLE.to_vec());
    }

    #[test]
    fn test_builtin_patterns_compile() {
        for def in builtin_definitions() {
            for (_, tier) in def.tiers() {
                for indicator in tier {
                    if let Some(p) = &indicator.pattern {
                        assert!(regex::Regex::new(p).is_ok(), "bad pattern {p}");
                    }
                }
            }
        }
    }
}
