//! Human-readable rendering of an assessment.
//!
//! Rendering works on any snapshot, final or partial: sections appear only for
//! phases whose fields are present.
use crate::state::{AssessmentState, Phase};
use serde_json::{json, Value};
use std::fmt::{self, Write};

/// Turns a state into report text.
pub trait ReportRenderer {
    fn render(&self, state: &AssessmentState) -> Result<String, fmt::Error>;
}

/// Markdown report renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownReport;

impl ReportRenderer for MarkdownReport {
    fn render(&self, state: &AssessmentState) -> Result<String, fmt::Error> {
        let mut out = String::new();
        write_header(&mut out, state)?;
        write_context(&mut out, state)?;
        write_research(&mut out, state)?;
        write_architecture(&mut out, state)?;
        write_security(&mut out, state)?;
        write_licensing(&mut out, state)?;
        write_implementation(&mut out, state)?;
        write_support(&mut out, state)?;
        write_user_experience(&mut out, state)?;
        write_cost(&mut out, state)?;
        write_progress(&mut out, state)?;
        Ok(out)
    }
}

/// Structured digest stored next to the rendered report.
pub fn report_data(state: &AssessmentState) -> Value {
    let high_severity = state
        .security_concerns()
        .iter()
        .filter(|concern| concern.severity == crate::state::Severity::High)
        .count();
    json!({
        "client_name": state.client_name(),
        "project_name": state.project_name(),
        "requirements": state.requirements().len(),
        "research_findings": state.research_findings().len(),
        "components": state
            .architecture_solution()
            .map(|solution| solution.components.len())
            .unwrap_or(0),
        "security_concerns": state.security_concerns().len(),
        "high_severity_concerns": high_severity,
        "licensing_options": state.licensing_options().len(),
        "recommended_licensing": state.recommended_licensing(),
        "implementation_steps": state
            .implementation_plan()
            .map(|plan| plan.steps.len())
            .unwrap_or(0),
        "timeline_estimate": state
            .implementation_plan()
            .map(|plan| plan.timeline_estimate.as_str()),
        "training_needs": state.training_needs().len(),
        "adoption_phases": state
            .adoption_plan()
            .map(|plan| plan.phases.len())
            .unwrap_or(0),
        "cost_estimates": state.cost_estimates().len(),
        "total_cost_estimate": state.total_cost_estimate(),
        "completed_phases": state.completed_phases(),
        "errors": state.errors().len(),
    })
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn write_list(out: &mut String, title: &str, items: &[String]) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(out, "**{title}:**\n")?;
    for item in items {
        writeln!(out, "- {item}")?;
    }
    writeln!(out)
}

fn write_header(out: &mut String, state: &AssessmentState) -> fmt::Result {
    let title = match (state.project_name(), state.client_name()) {
        (Some(project), Some(client)) => format!("{project} ({client})"),
        (Some(project), None) => project.to_string(),
        (None, Some(client)) => format!("{client} Assessment"),
        (None, None) => "EUC Assessment".to_string(),
    };
    writeln!(out, "# {title}\n")?;
    writeln!(
        out,
        "## Assessment Request\n\n{}\n",
        state.assessment_request()
    )
}

fn write_context(out: &mut String, state: &AssessmentState) -> fmt::Result {
    if state.requirements().is_empty() {
        return Ok(());
    }
    writeln!(out, "## Requirements\n")?;
    for (idx, requirement) in state.requirements().iter().enumerate() {
        write!(
            out,
            "{}. {} (priority: {})",
            idx + 1,
            requirement.description,
            requirement.priority
        )?;
        match &requirement.notes {
            Some(notes) => writeln!(out, " - {notes}")?,
            None => writeln!(out)?,
        }
    }
    writeln!(out)?;

    if let Some(context) = state.organization_context().filter(|c| !c.is_empty()) {
        writeln!(out, "## Organization Context\n")?;
        if let Some(size) = &context.company_size {
            writeln!(out, "- Company size: {size}")?;
        }
        if let Some(industry) = &context.industry {
            writeln!(out, "- Industry: {industry}")?;
        }
        if !context.current_tech_stack.is_empty() {
            writeln!(
                out,
                "- Current technology: {}",
                context.current_tech_stack.join(", ")
            )?;
        }
        if !context.compliance_requirements.is_empty() {
            writeln!(
                out,
                "- Compliance: {}",
                context.compliance_requirements.join(", ")
            )?;
        }
        if let Some(extra) = &context.additional_context {
            writeln!(out, "- {extra}")?;
        }
        writeln!(out)?;
    }

    write_list(out, "Open questions", state.follow_up_questions())
}

fn write_research(out: &mut String, state: &AssessmentState) -> fmt::Result {
    let Some(summary) = state.research_summary() else {
        return Ok(());
    };
    writeln!(out, "## Research Summary\n\n{summary}\n")?;
    for (idx, finding) in state.research_findings().iter().enumerate() {
        writeln!(
            out,
            "### {}. {}\n\n{}\n",
            idx + 1,
            finding.topic,
            finding.content
        )?;
        if let Some(relevance) = &finding.relevance {
            writeln!(out, "*Relevance:* {relevance}\n")?;
        }
        write_list(out, "Sources", &finding.sources)?;
    }
    Ok(())
}

fn write_architecture(out: &mut String, state: &AssessmentState) -> fmt::Result {
    let Some(solution) = state.architecture_solution() else {
        return Ok(());
    };
    writeln!(out, "## Architecture\n\n{}\n", solution.overview)?;
    if !solution.components.is_empty() {
        writeln!(out, "| Component | Purpose | Depends on |")?;
        writeln!(out, "|---|---|---|")?;
        for component in &solution.components {
            writeln!(
                out,
                "| {} | {} | {} |",
                cell(&component.name),
                cell(&component.purpose),
                cell(&component.dependencies.join(", "))
            )?;
        }
        writeln!(out)?;
    }
    if let Some(diagram) = &solution.diagram_description {
        writeln!(out, "### Diagram\n\n{diagram}\n")?;
    }
    if let Some(considerations) = &solution.considerations {
        writeln!(out, "### Considerations\n\n{considerations}\n")?;
    }
    Ok(())
}

fn write_security(out: &mut String, state: &AssessmentState) -> fmt::Result {
    let Some(summary) = state.security_summary() else {
        return Ok(());
    };
    writeln!(out, "## Security\n\n{summary}\n")?;
    for concern in state.security_concerns() {
        write!(out, "- **[{}]** {}", concern.severity, concern.description)?;
        match &concern.mitigation {
            Some(mitigation) => writeln!(out, " Mitigation: {mitigation}")?,
            None => writeln!(out)?,
        }
    }
    if !state.security_concerns().is_empty() {
        writeln!(out)?;
    }
    Ok(())
}

fn write_licensing(out: &mut String, state: &AssessmentState) -> fmt::Result {
    let Some(info) = state.licensing_info() else {
        return Ok(());
    };
    writeln!(out, "## Licensing\n\n**Model:** {}\n", info.model)?;
    if let Some(costs) = &info.costs {
        writeln!(out, "**Costs:** {costs}\n")?;
    }
    if let Some(constraints) = &info.constraints {
        writeln!(out, "**Constraints:** {constraints}\n")?;
    }
    if let Some(recommendations) = &info.recommendations {
        writeln!(out, "**Recommendations:** {recommendations}\n")?;
    }
    if !state.licensing_options().is_empty() {
        writeln!(out, "| Option | Cost | Pros | Cons |")?;
        writeln!(out, "|---|---|---|---|")?;
        for option in state.licensing_options() {
            writeln!(
                out,
                "| {} | {} | {} | {} |",
                cell(&option.name),
                cell(&option.cost_estimate),
                cell(&option.pros.join("; ")),
                cell(&option.cons.join("; "))
            )?;
        }
        writeln!(out)?;
    }
    if let Some(recommended) = state.recommended_licensing() {
        writeln!(out, "**Recommended:** {recommended}\n")?;
    }
    Ok(())
}

fn write_implementation(out: &mut String, state: &AssessmentState) -> fmt::Result {
    let Some(plan) = state.implementation_plan() else {
        return Ok(());
    };
    writeln!(out, "## Implementation Plan\n\n{}\n", plan.summary)?;
    writeln!(out, "**Timeline:** {}\n", plan.timeline_estimate)?;
    for step in plan.ordered_steps() {
        writeln!(
            out,
            "### Step {}: {}\n\n{}\n",
            step.order,
            step.title,
            step.description
        )?;
        if let Some(effort) = &step.estimated_effort {
            writeln!(out, "- Effort: {effort}")?;
        }
        if !step.dependencies.is_empty() {
            let deps: Vec<String> = step.dependencies.iter().map(i64::to_string).collect();
            writeln!(out, "- Depends on: {}", deps.join(", "))?;
        }
        if !step.resources_required.is_empty() {
            writeln!(out, "- Resources: {}", step.resources_required.join(", "))?;
        }
        if !step.risk_factors.is_empty() {
            writeln!(out, "- Risks: {}", step.risk_factors.join(", "))?;
        }
        writeln!(out)?;
    }
    if !plan.critical_path.is_empty() {
        writeln!(
            out,
            "**Critical path:** {}\n",
            plan.critical_path.join(" → ")
        )?;
    }
    Ok(())
}

fn write_support(out: &mut String, state: &AssessmentState) -> fmt::Result {
    let Some(summary) = state.support_summary() else {
        return Ok(());
    };
    writeln!(out, "## Support and Operations\n\n{summary}\n")?;
    for requirement in state.support_requirements() {
        match &requirement.category {
            Some(category) => writeln!(out, "- **{category}:** {}", requirement.description)?,
            None => writeln!(out, "- {}", requirement.description)?,
        }
    }
    for impact in state.operational_impacts() {
        writeln!(
            out,
            "- **{}** [{}]: {}",
            impact.area, impact.severity, impact.description
        )?;
    }
    if !state.maintenance_tasks().is_empty() {
        writeln!(out, "\n| Maintenance task | Frequency |")?;
        writeln!(out, "|---|---|")?;
        for task in state.maintenance_tasks() {
            writeln!(out, "| {} | {} |", cell(&task.task), cell(&task.frequency))?;
        }
    }
    writeln!(out)
}

fn write_user_experience(out: &mut String, state: &AssessmentState) -> fmt::Result {
    let Some(summary) = state.user_experience_summary() else {
        return Ok(());
    };
    writeln!(out, "## User Experience\n\n{summary}\n")?;
    for impact in state.user_impacts() {
        writeln!(
            out,
            "- **{}:** {}",
            impact.user_group,
            impact.impact_description
        )?;
    }
    for need in state.training_needs() {
        writeln!(
            out,
            "- Training: {} for {} ({}, {})",
            need.topic,
            need.target_audience.join(", "),
            need.delivery_method,
            need.duration
        )?;
    }
    for impact in state.change_impacts() {
        writeln!(
            out,
            "- Change [{}] {}: {} Mitigation: {}",
            impact.severity, impact.area, impact.description, impact.mitigation_strategy
        )?;
    }
    writeln!(out)?;
    if let Some(plan) = state.adoption_plan() {
        writeln!(out, "### Adoption Plan\n")?;
        for phase in &plan.phases {
            writeln!(
                out,
                "- **{}** ({}): {}",
                phase.phase, phase.timeline, phase.description
            )?;
            writeln!(out, "  - Activities: {}", phase.activities.join(", "))?;
            writeln!(
                out,
                "  - Success metrics: {}",
                phase.success_metrics.join(", ")
            )?;
        }
        writeln!(
            out,
            "\n**Communication:** {}\n",
            plan.communication_strategy
        )?;
        write_list(out, "Feedback", &plan.feedback_mechanisms)?;
    }
    Ok(())
}

fn write_cost(out: &mut String, state: &AssessmentState) -> fmt::Result {
    let Some(roi) = state.roi_analysis() else {
        return Ok(());
    };
    writeln!(out, "## Cost and ROI\n")?;
    if !state.cost_estimates().is_empty() {
        writeln!(out, "| Category | Amount | Timeframe | Description |")?;
        writeln!(out, "|---|---:|---|---|")?;
        for estimate in state.cost_estimates() {
            let amount = estimate
                .amount
                .map(|amount| format!("{amount:.2}"))
                .unwrap_or_else(|| "n/a".to_string());
            writeln!(
                out,
                "| {} | {} | {} | {} |",
                cell(&estimate.category),
                amount,
                cell(estimate.timeframe.as_deref().unwrap_or("")),
                cell(&estimate.description)
            )?;
        }
        writeln!(out)?;
    }
    if let Some(total) = state.total_cost_estimate() {
        writeln!(out, "**Total estimate:** {total:.2}\n")?;
    }
    writeln!(out, "### ROI Analysis\n\n{roi}\n")
}

fn write_progress(out: &mut String, state: &AssessmentState) -> fmt::Result {
    writeln!(out, "## Assessment Progress\n")?;
    for phase in Phase::WORK {
        let mark = if state.is_phase_completed(phase) {
            "x"
        } else {
            " "
        };
        writeln!(out, "- [{mark}] {phase}")?;
    }
    writeln!(out, "\nCurrent phase: `{}`", state.current_phase())?;
    if !state.errors().is_empty() {
        writeln!(out, "\n### Errors\n")?;
        for error in state.errors() {
            writeln!(out, "- `{}` {}: {}", error.phase, error.kind, error.message)?;
        }
    }
    Ok(())
}
