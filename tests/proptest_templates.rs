//! Property-based tests using proptest
//!
//! These tests verify path template rendering and matching, and resource
//! name parsing, using randomized inputs.

use dlp_client::error::TemplateError;
use dlp_client::resource::names::{
    DLP_JOB, ORGANIZATION, ORGANIZATION_DEIDENTIFY_TEMPLATE, ORGANIZATION_INSPECT_TEMPLATE,
    PROJECT, PROJECT_DEIDENTIFY_TEMPLATE, PROJECT_INSPECT_TEMPLATE,
};
use dlp_client::{Binding, PathTemplate, ResourceNames};
use proptest::prelude::*;

/// Every resource name pattern the client knows about
const PATTERNS: &[&str] = &[
    ORGANIZATION,
    ORGANIZATION_DEIDENTIFY_TEMPLATE,
    PROJECT_DEIDENTIFY_TEMPLATE,
    ORGANIZATION_INSPECT_TEMPLATE,
    PROJECT_INSPECT_TEMPLATE,
    PROJECT,
    DLP_JOB,
];

/// Templates without placeholders
const CONSTANTS: &[&str] = &["infoTypes", "v2/infoTypes", "locations/global/infoTypes"];

/// A value allowed in a single path segment
fn arb_segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.~-]{1,24}"
}

/// A known pattern plus enough values for each of its placeholders
fn arb_pattern_with_values() -> impl Strategy<Value = (PathTemplate, Vec<String>)> {
    (
        prop::sample::select(PATTERNS),
        prop::collection::vec(arb_segment(), 2),
    )
        .prop_map(|(pattern, values)| (PathTemplate::new(pattern).unwrap(), values))
}

/// Bind the template's placeholders, in declaration order, to `values`
fn bind(template: &PathTemplate, values: &[String]) -> Binding {
    template
        .placeholders()
        .zip(values)
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn job_template() -> PathTemplate {
    PathTemplate::new(DLP_JOB).unwrap()
}

fn binding(pairs: &[(&str, &str)]) -> Binding {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn is_mismatch(template: &PathTemplate, name: &str) -> bool {
    matches!(template.matches(name), Err(TemplateError::Mismatch { .. }))
}

proptest! {
    /// Rendering then matching gives back the same binding, for every pattern
    #[test]
    fn render_then_match_roundtrip((template, values) in arb_pattern_with_values()) {
        let bound = bind(&template, &values);
        prop_assert_eq!(bound.len(), template.placeholders().count());

        let rendered = template.render(&bound).unwrap();
        prop_assert!(template.is_match(&rendered));
        prop_assert_eq!(template.matches(&rendered).unwrap(), bound);
    }

    /// Leaving out any one placeholder is rejected, naming that placeholder
    #[test]
    fn missing_binding_rejected(
        (template, values) in arb_pattern_with_values(),
        drop_index in 0usize..2,
    ) {
        let mut bound = bind(&template, &values);
        let names: Vec<String> = template.placeholders().map(str::to_string).collect();
        let dropped = names[drop_index % names.len()].clone();
        bound.remove(&dropped);

        prop_assert_eq!(template.render(&bound), Err(TemplateError::MissingBinding(dropped)));
    }

    /// Keys the template does not name are rejected
    #[test]
    fn unknown_binding_rejected(
        (template, values) in arb_pattern_with_values(),
        extra in "[a-z]{3,10}",
    ) {
        prop_assume!(template.placeholders().all(|name| name != extra));
        let mut bound = bind(&template, &values);
        bound.insert(extra.clone(), "x".to_string());

        prop_assert_eq!(template.render(&bound), Err(TemplateError::UnknownBinding(extra)));
    }

    /// Values containing the separator never render
    #[test]
    fn separator_in_value_rejected(
        (template, values) in arb_pattern_with_values(),
        right in arb_segment(),
    ) {
        let mut bound = bind(&template, &values);
        let first = template.placeholders().next().unwrap().to_string();
        let joined = format!("{}/{}", values[0], right);
        bound.insert(first, joined);

        let is_invalid = matches!(template.render(&bound), Err(TemplateError::InvalidValue { .. }));
        prop_assert!(is_invalid);
    }

    /// Names with the wrong literal, segment count or a leading separator never match
    #[test]
    fn wrong_shape_does_not_match(project in arb_segment(), job in arb_segment()) {
        let template = job_template();
        let rendered = template
            .render(&binding(&[("project", &project), ("dlp_job", &job)]))
            .unwrap();
        let wrong_literal = format!("projects/{}/jobs/{}", project, job);
        let extra_segment = format!("{}/x", rendered);
        let leading = format!("/{}", rendered);
        let trailing = format!("{}/", rendered);

        prop_assert!(is_mismatch(&template, &wrong_literal));
        prop_assert!(is_mismatch(&template, &extra_segment));
        prop_assert!(is_mismatch(&template, &leading));
        prop_assert!(is_mismatch(&template, &trailing));
    }

    /// Constant templates render to themselves and match only themselves
    #[test]
    fn constant_templates(pattern in prop::sample::select(CONSTANTS), other in arb_segment()) {
        let template = PathTemplate::new(pattern).unwrap();
        prop_assert_eq!(template.placeholders().count(), 0);
        prop_assert_eq!(template.render(&Binding::new()).unwrap(), pattern);
        prop_assert!(template.matches(pattern).unwrap().is_empty());

        let longer = format!("{}/{}", pattern, other);
        prop_assert!(is_mismatch(&template, &longer));
    }

    /// Typed helpers agree with the raw templates
    #[test]
    fn names_helpers_roundtrip(org in arb_segment(), project in arb_segment(), id in arb_segment()) {
        let names = ResourceNames::new().unwrap();

        let job = names.dlp_job_path(&project, &id).unwrap();
        prop_assert_eq!(names.match_project_from_dlp_job_name(&job).unwrap(), project.clone());
        prop_assert_eq!(names.match_dlp_job_from_dlp_job_name(&job).unwrap(), id.clone());

        let org_path = names.organization_path(&org).unwrap();
        prop_assert_eq!(names.match_organization_from_organization_name(&org_path).unwrap(), org.clone());

        let project_path = names.project_path(&project).unwrap();
        prop_assert_eq!(names.match_project_from_project_name(&project_path).unwrap(), project.clone());

        let org_inspect = names.organization_inspect_template_path(&org, &id).unwrap();
        let parsed = names.parse_inspect_template_name(&org_inspect).unwrap();
        prop_assert_eq!(parsed.template_id(), id.as_str());
        prop_assert!(names.match_project_from_project_inspect_template_name(&org_inspect).is_err());

        let project_inspect = names.project_inspect_template_path(&project, &id).unwrap();
        prop_assert_eq!(
            names.match_inspect_template_from_project_inspect_template_name(&project_inspect).unwrap(),
            id.clone()
        );

        let org_deid = names.organization_deidentify_template_path(&org, &id).unwrap();
        prop_assert_eq!(
            names.match_deidentify_template_from_organization_deidentify_template_name(&org_deid).unwrap(),
            id.clone()
        );

        let project_deid = names.project_deidentify_template_path(&project, &id).unwrap();
        let parsed = names.parse_deidentify_template_name(&project_deid).unwrap();
        prop_assert_eq!(parsed.template_id(), id.as_str());
    }
}
