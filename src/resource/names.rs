//! Resource Names
//!
//! One render/match pair per resource family exposed by the DLP API.

use super::path_template::{Binding, PathTemplate};
use crate::error::TemplateError;

pub const ORGANIZATION: &str = "organizations/{organization}";
pub const ORGANIZATION_DEIDENTIFY_TEMPLATE: &str =
    "organizations/{organization}/deidentifyTemplates/{deidentify_template}";
pub const PROJECT_DEIDENTIFY_TEMPLATE: &str =
    "projects/{project}/deidentifyTemplates/{deidentify_template}";
pub const ORGANIZATION_INSPECT_TEMPLATE: &str =
    "organizations/{organization}/inspectTemplates/{inspect_template}";
pub const PROJECT_INSPECT_TEMPLATE: &str =
    "projects/{project}/inspectTemplates/{inspect_template}";
pub const PROJECT: &str = "projects/{project}";
pub const DLP_JOB: &str = "projects/{project}/dlpJobs/{dlp_job}";

/// Components of an inspect or de-identify template name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateName {
    Organization { organization: String, template: String },
    Project { project: String, template: String },
}

impl TemplateName {
    /// The template id, whichever parent owns it
    pub fn template_id(&self) -> &str {
        match self {
            Self::Organization { template, .. } | Self::Project { template, .. } => template,
        }
    }
}

/// Components of a DLP job name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DlpJobName {
    pub project: String,
    pub dlp_job: String,
}

/// The set of resource name templates used by the DLP client.
///
/// Built once and owned by the client; templates sharing a placeholder name
/// are still independent values.
#[derive(Debug, Clone)]
pub struct ResourceNames {
    organization: PathTemplate,
    organization_deidentify_template: PathTemplate,
    project_deidentify_template: PathTemplate,
    organization_inspect_template: PathTemplate,
    project_inspect_template: PathTemplate,
    project: PathTemplate,
    dlp_job: PathTemplate,
}

impl ResourceNames {
    pub fn new() -> Result<Self, TemplateError> {
        Ok(Self {
            organization: PathTemplate::new(ORGANIZATION)?,
            organization_deidentify_template: PathTemplate::new(ORGANIZATION_DEIDENTIFY_TEMPLATE)?,
            project_deidentify_template: PathTemplate::new(PROJECT_DEIDENTIFY_TEMPLATE)?,
            organization_inspect_template: PathTemplate::new(ORGANIZATION_INSPECT_TEMPLATE)?,
            project_inspect_template: PathTemplate::new(PROJECT_INSPECT_TEMPLATE)?,
            project: PathTemplate::new(PROJECT)?,
            dlp_job: PathTemplate::new(DLP_JOB)?,
        })
    }

    // =========================================================================
    // Render
    // =========================================================================

    pub fn organization_path(&self, organization: &str) -> Result<String, TemplateError> {
        self.organization
            .render_pairs([("organization", organization)])
    }

    pub fn organization_deidentify_template_path(
        &self,
        organization: &str,
        deidentify_template: &str,
    ) -> Result<String, TemplateError> {
        self.organization_deidentify_template.render_pairs([
            ("organization", organization),
            ("deidentify_template", deidentify_template),
        ])
    }

    pub fn project_deidentify_template_path(
        &self,
        project: &str,
        deidentify_template: &str,
    ) -> Result<String, TemplateError> {
        self.project_deidentify_template.render_pairs([
            ("project", project),
            ("deidentify_template", deidentify_template),
        ])
    }

    pub fn organization_inspect_template_path(
        &self,
        organization: &str,
        inspect_template: &str,
    ) -> Result<String, TemplateError> {
        self.organization_inspect_template.render_pairs([
            ("organization", organization),
            ("inspect_template", inspect_template),
        ])
    }

    pub fn project_inspect_template_path(
        &self,
        project: &str,
        inspect_template: &str,
    ) -> Result<String, TemplateError> {
        self.project_inspect_template.render_pairs([
            ("project", project),
            ("inspect_template", inspect_template),
        ])
    }

    pub fn project_path(&self, project: &str) -> Result<String, TemplateError> {
        self.project.render_pairs([("project", project)])
    }

    pub fn dlp_job_path(&self, project: &str, dlp_job: &str) -> Result<String, TemplateError> {
        self.dlp_job
            .render_pairs([("project", project), ("dlp_job", dlp_job)])
    }

    // =========================================================================
    // Match
    // =========================================================================

    pub fn match_organization_from_organization_name(
        &self,
        name: &str,
    ) -> Result<String, TemplateError> {
        take(self.organization.matches(name)?, "organization")
    }

    pub fn match_organization_from_organization_deidentify_template_name(
        &self,
        name: &str,
    ) -> Result<String, TemplateError> {
        take(
            self.organization_deidentify_template.matches(name)?,
            "organization",
        )
    }

    pub fn match_deidentify_template_from_organization_deidentify_template_name(
        &self,
        name: &str,
    ) -> Result<String, TemplateError> {
        take(
            self.organization_deidentify_template.matches(name)?,
            "deidentify_template",
        )
    }

    pub fn match_project_from_project_deidentify_template_name(
        &self,
        name: &str,
    ) -> Result<String, TemplateError> {
        take(self.project_deidentify_template.matches(name)?, "project")
    }

    pub fn match_deidentify_template_from_project_deidentify_template_name(
        &self,
        name: &str,
    ) -> Result<String, TemplateError> {
        take(
            self.project_deidentify_template.matches(name)?,
            "deidentify_template",
        )
    }

    pub fn match_organization_from_organization_inspect_template_name(
        &self,
        name: &str,
    ) -> Result<String, TemplateError> {
        take(
            self.organization_inspect_template.matches(name)?,
            "organization",
        )
    }

    pub fn match_inspect_template_from_organization_inspect_template_name(
        &self,
        name: &str,
    ) -> Result<String, TemplateError> {
        take(
            self.organization_inspect_template.matches(name)?,
            "inspect_template",
        )
    }

    pub fn match_project_from_project_inspect_template_name(
        &self,
        name: &str,
    ) -> Result<String, TemplateError> {
        take(self.project_inspect_template.matches(name)?, "project")
    }

    pub fn match_inspect_template_from_project_inspect_template_name(
        &self,
        name: &str,
    ) -> Result<String, TemplateError> {
        take(
            self.project_inspect_template.matches(name)?,
            "inspect_template",
        )
    }

    pub fn match_project_from_project_name(&self, name: &str) -> Result<String, TemplateError> {
        take(self.project.matches(name)?, "project")
    }

    pub fn match_project_from_dlp_job_name(&self, name: &str) -> Result<String, TemplateError> {
        take(self.dlp_job.matches(name)?, "project")
    }

    pub fn match_dlp_job_from_dlp_job_name(&self, name: &str) -> Result<String, TemplateError> {
        take(self.dlp_job.matches(name)?, "dlp_job")
    }

    // =========================================================================
    // Parse into typed components
    // =========================================================================

    pub fn parse_dlp_job_name(&self, name: &str) -> Result<DlpJobName, TemplateError> {
        let mut binding = self.dlp_job.matches(name)?;
        Ok(DlpJobName {
            project: take_from(&mut binding, "project"),
            dlp_job: take_from(&mut binding, "dlp_job"),
        })
    }

    /// Parse an inspect template name under either an organization or a project
    pub fn parse_inspect_template_name(&self, name: &str) -> Result<TemplateName, TemplateError> {
        parse_template_name(
            &self.organization_inspect_template,
            &self.project_inspect_template,
            "inspect_template",
            name,
        )
    }

    /// Parse a de-identify template name under either an organization or a project
    pub fn parse_deidentify_template_name(
        &self,
        name: &str,
    ) -> Result<TemplateName, TemplateError> {
        parse_template_name(
            &self.organization_deidentify_template,
            &self.project_deidentify_template,
            "deidentify_template",
            name,
        )
    }

    /// Build the parent for a template operation: an organization when one is
    /// given, the project otherwise.
    pub fn template_parent(
        &self,
        organization: Option<&str>,
        project: &str,
    ) -> Result<String, TemplateError> {
        match organization {
            Some(org) => self.organization_path(org),
            None => self.project_path(project),
        }
    }
}

fn take(mut binding: Binding, key: &str) -> Result<String, TemplateError> {
    Ok(take_from(&mut binding, key))
}

// Keys come from the template that produced the binding.
fn take_from(binding: &mut Binding, key: &str) -> String {
    binding.remove(key).unwrap_or_default()
}

fn parse_template_name(
    under_organization: &PathTemplate,
    under_project: &PathTemplate,
    template_key: &str,
    name: &str,
) -> Result<TemplateName, TemplateError> {
    if let Ok(mut binding) = under_organization.matches(name) {
        return Ok(TemplateName::Organization {
            organization: take_from(&mut binding, "organization"),
            template: take_from(&mut binding, template_key),
        });
    }

    let mut binding = under_project.matches(name)?;
    Ok(TemplateName::Project {
        project: take_from(&mut binding, "project"),
        template: take_from(&mut binding, template_key),
    })
}
