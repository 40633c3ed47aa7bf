use super::output::{render_detail, render_table};
use anyhow::{Context, Result, anyhow};
use orgsync_application::AppContext;
use orgsync_core::OrgSyncError;
use orgsync_core::organization::{NewOrganization, Organization, OrganizationPatch};

/// Adds a sign-in hint to authentication failures.
fn explain(error: OrgSyncError) -> anyhow::Error {
    if error.is_unauthorized() {
        anyhow!("{} (run `orgsync login` first)", error)
    } else {
        anyhow!(error)
    }
}

/// Looks up `id` in the freshly fetched collection.
async fn current(app: &AppContext, id: &str) -> Result<Organization> {
    app.organizations
        .fetch_organizations()
        .await
        .map_err(explain)?;
    app.organizations
        .state()
        .find(id)
        .cloned()
        .ok_or_else(|| anyhow!(OrgSyncError::not_found("Organization", id)))
}

/// Builds the edit payload: values not given on the command line are taken
/// from the current record, so name and description are always sent.
fn edit_patch(
    current: &Organization,
    name: Option<String>,
    description: Option<String>,
    is_active: Option<bool>,
) -> Result<OrganizationPatch> {
    let patch = OrganizationPatch::edit(
        name.unwrap_or_else(|| current.name.clone()),
        description.unwrap_or_else(|| current.description.clone()),
        is_active,
    );
    patch.validate()?;
    Ok(patch)
}

pub async fn list(app: &AppContext, filter: Option<&str>) -> Result<()> {
    app.organizations
        .fetch_organizations()
        .await
        .map_err(explain)?;

    let mut state = app.organizations.state();
    if let Some(filter) = filter {
        state.search_query = filter.to_string();
    }
    println!("{}", render_table(&state.filtered()));
    Ok(())
}

pub async fn search(app: &AppContext, query: &str) -> Result<()> {
    app.organizations
        .search_organizations(query)
        .await
        .map_err(explain)?;
    println!("{}", render_table(&app.organizations.state().organizations));
    Ok(())
}

pub async fn create(app: &AppContext, name: String, description: String) -> Result<()> {
    let data = NewOrganization::new(name.trim(), description.trim());
    data.validate()?;

    let created = app
        .organizations
        .create_organization(data)
        .await
        .map_err(explain)?;
    println!("Created organization {}", created.id);
    println!("{}", render_detail(&created));
    Ok(())
}

pub async fn update(
    app: &AppContext,
    id: &str,
    name: Option<String>,
    description: Option<String>,
    is_active: Option<bool>,
) -> Result<()> {
    let existing = current(app, id).await?;
    let patch = edit_patch(
        &existing,
        name.map(|n| n.trim().to_string()),
        description.map(|d| d.trim().to_string()),
        is_active,
    )?;

    let updated = app
        .organizations
        .update_organization(id, patch)
        .await
        .map_err(explain)?;
    println!("{}", render_detail(&updated));
    Ok(())
}

pub async fn toggle(app: &AppContext, id: &str) -> Result<()> {
    let existing = current(app, id).await?;
    let updated = app
        .organizations
        .update_organization(id, OrganizationPatch::set_active(!existing.is_active))
        .await
        .map_err(explain)?;
    println!(
        "Organization {} is now {}",
        updated.id,
        super::output::status_label(&updated)
    );
    Ok(())
}

pub async fn delete(app: &AppContext, id: &str) -> Result<()> {
    app.organizations
        .delete_organization(id)
        .await
        .map_err(explain)
        .with_context(|| format!("Failed to delete organization {}", id))?;
    println!("Deleted organization {}", id);
    Ok(())
}
