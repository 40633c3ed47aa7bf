//! Plain-text rendering of organizations.

use orgsync_core::organization::Organization;

const DESCRIPTION_PREVIEW_CHARS: usize = 60;

pub fn status_label(organization: &Organization) -> &'static str {
    if organization.is_active {
        "active"
    } else {
        "inactive"
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= DESCRIPTION_PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(DESCRIPTION_PREVIEW_CHARS - 3).collect();
    format!("{}...", cut)
}

/// One line per organization: id, status, name and a description preview.
pub fn render_table(organizations: &[Organization]) -> String {
    if organizations.is_empty() {
        return "No organizations.".to_string();
    }

    let id_width = organizations
        .iter()
        .map(|org| org.id.chars().count())
        .max()
        .unwrap_or(0)
        .max(2);
    let name_width = organizations
        .iter()
        .map(|org| org.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut lines = vec![format!(
        "{:<id_width$}  {:<8}  {:<name_width$}  DESCRIPTION",
        "ID", "STATUS", "NAME"
    )];
    lines.extend(organizations.iter().map(|org| {
        format!(
            "{:<id_width$}  {:<8}  {:<name_width$}  {}",
            org.id,
            status_label(org),
            org.name,
            preview(&org.description)
        )
    }));
    lines.join("\n")
}

pub fn render_detail(organization: &Organization) -> String {
    let mut lines = vec![
        format!("id:          {}", organization.id),
        format!("name:        {}", organization.name),
        format!("description: {}", organization.description),
        format!("status:      {}", status_label(organization)),
        format!("created:     {}", organization.created_at.format("%Y-%m-%d %H:%M")),
    ];
    if let Some(updated_at) = organization.updated_at {
        lines.push(format!("updated:     {}", updated_at.format("%Y-%m-%d %H:%M")));
    }
    lines.join("\n")
}
