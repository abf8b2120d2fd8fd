use comfy_table::{Cell, ContentArrangement, Table};

use repomig_app::remote::ServiceOverview;
use repomig_core::plan::PlanModel;
use repomig_core::selection::Candidate;

pub fn plan_table(plan: &PlanModel) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Step", "State", "Progress", "Status"]);

    for step in plan.steps() {
        let progress = if step.is_indeterminate() {
            "n/a".to_string()
        } else {
            format!("{:.0}%", step.complete * 100.0)
        };

        table.add_row(vec![
            Cell::new(step.name.as_str()),
            Cell::new(step.state.label()),
            Cell::new(progress),
            Cell::new(step.status.as_deref().unwrap_or("")),
        ]);
    }

    table
}

pub fn candidates_table(candidates: &[Candidate], is_selected: &dyn Fn(&str) -> bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["", "Repository", "Format", "Eligibility"]);

    for candidate in candidates {
        let mark = if is_selected(&candidate.id) { "[x]" } else { "[ ]" };
        let eligibility = if candidate.supported {
            "eligible".to_string()
        } else {
            format!(
                "not eligible: {}",
                candidate.reason.as_deref().unwrap_or("unsupported")
            )
        };

        table.add_row(vec![
            Cell::new(mark),
            Cell::new(candidate.name.as_str()),
            Cell::new(candidate.format.as_deref().unwrap_or("")),
            Cell::new(eligibility),
        ]);
    }

    table
}

pub fn overview_summary(info: &ServiceOverview) -> String {
    format!(
        "Service version: {}\nCurrent storage model: {}\nTarget storage model: {}\nRepositories on the server: {}",
        info.service_version, info.current_model, info.target_model, info.repository_count
    )
}
