use super::records::{EventRecord, QrEventRecord, ResidentId, ResidentRecord};
use super::state::Tab;
use crate::format::escape_html;

pub const ACCESS_COLUMNS: usize = 4;
pub const QR_COLUMNS: usize = 6;
pub const RESIDENT_COLUMNS: usize = 6;

/// `data-action` value of the per-row delete button in the residents table.
pub const DELETE_RESIDENT_ACTION: &str = "delete-resident";

const EMPTY_MESSAGE: &str = "No data to display. (Check the search and date filters)";

/// Everything the page needs to repaint one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTable {
    pub tab: Tab,
    pub body_html: String,
    pub page_label: String,
    /// Rows matching the current filter, across all pages.
    pub total: usize,
}

impl RenderedTable {
    pub fn count_label(&self) -> String {
        match self.total {
            1 => "1 row".to_string(),
            n => format!("{} rows", n),
        }
    }
}

pub fn column_count(tab: Tab) -> usize {
    match tab {
        Tab::Access => ACCESS_COLUMNS,
        Tab::Qr => QR_COLUMNS,
        Tab::Residents => RESIDENT_COLUMNS,
    }
}

fn cell(text: &str) -> String {
    format!("<td>{}</td>", escape_html(text))
}

fn resident_id_cell(id: Option<ResidentId>) -> String {
    cell(&id.map(|v| v.to_string()).unwrap_or_default())
}

/// Single row spanning the whole table, shown when the page slice is empty.
pub fn placeholder_row(tab: Tab) -> String {
    format!(
        r#"<tr><td colspan="{}" class="empty">{}</td></tr>"#,
        column_count(tab),
        escape_html(EMPTY_MESSAGE)
    )
}

pub fn access_row(r: &EventRecord) -> String {
    format!(
        "<tr>{}{}{}{}</tr>",
        cell(&r.id),
        cell(&r.device_id),
        cell(&r.images_dir),
        cell(&r.event_time)
    )
}

pub fn qr_row(r: &QrEventRecord) -> String {
    format!(
        "<tr>{}{}{}{}{}{}</tr>",
        cell(&r.id),
        cell(&r.phone),
        cell(&r.purpose),
        cell(&r.status),
        cell(&r.device_id),
        cell(&r.event_time)
    )
}

/// Delete buttons carry the id as data; a delegated listener on the table
/// body turns clicks into typed actions.
pub fn resident_row(r: &ResidentRecord) -> String {
    let action = match r.id {
        Some(id) => format!(
            r#"<td><button class="danger small" data-action="{}" data-id="{}">Delete</button></td>"#,
            DELETE_RESIDENT_ACTION, id
        ),
        None => "<td></td>".to_string(),
    };
    format!(
        "<tr>{}{}{}{}{}{}</tr>",
        resident_id_cell(r.id),
        cell(&r.name),
        cell(&r.phone),
        cell(&r.unit),
        cell(&r.created_at),
        action
    )
}

/// Table body for a page slice, or the placeholder row when it is empty.
pub fn render_rows<T>(tab: Tab, slice: &[T], row: impl Fn(&T) -> String) -> String {
    if slice.is_empty() {
        return placeholder_row(tab);
    }
    slice.iter().map(row).collect()
}
