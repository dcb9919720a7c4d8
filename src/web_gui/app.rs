use super::api;
use super::records::{EventRecord, QrEventRecord, ResidentId, ResidentRecord};
use super::state::{AdminSettings, EventCollection, EventFilter, ResidentCollection, Tab};
use super::ui::{self, RenderedTable};
use crate::error::AdminError;
use crate::format::default_date_range;
use chrono::NaiveDate;
use log::{debug, error, info, warn};

/// User input the page forwards to the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    TabClicked(Tab),
    Refresh,
    PrevPage(Tab),
    NextPage(Tab),
    KeywordChanged(String),
    DateFromChanged(String),
    DateToChanged(String),
    ResidentSearchChanged(String),
    DeleteClicked(ResidentId),
    DeleteConfirmed(ResidentId),
}

/// Completed backend call, applied to the view once it resolves.
#[derive(Debug, Clone)]
pub enum AdminOperation {
    LoadAccess(Result<Vec<EventRecord>, AdminError>),
    LoadQr(Result<Vec<QrEventRecord>, AdminError>),
    LoadResidents(Result<Vec<ResidentRecord>, AdminError>),
    DeleteResident(ResidentId, Result<(), AdminError>),
}

/// Work the host must carry out on behalf of the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Load(Tab),
    Delete(ResidentId),
    ConfirmDelete(ResidentId),
    Alert(String),
}

pub const DELETE_CONFIRM_MESSAGE: &str = "Delete this resident registration?";
pub const DELETE_SUCCESS_MESSAGE: &str = "Resident deleted.";
pub const CONNECTION_ERROR_MESSAGE: &str = "Could not reach the server.";

/// Owned state of the admin panel: active tab, shared filter bar and the
/// three record collections.
///
/// The view never awaits. Handlers mutate state and return [`Effect`]s; the
/// host runs them (see [`perform`]) and feeds the resulting
/// [`AdminOperation`] back through [`AdminView::handle_operation`]. Responses
/// are applied in arrival order, so the last one to land wins.
#[derive(Debug, Clone)]
pub struct AdminView {
    active: Tab,
    filter: EventFilter,
    access: EventCollection<EventRecord>,
    qr: EventCollection<QrEventRecord>,
    residents: ResidentCollection,
}

impl AdminView {
    pub fn new(settings: &AdminSettings, today: NaiveDate) -> Self {
        let (date_from, date_to) = default_date_range(today);
        Self {
            active: Tab::Access,
            filter: EventFilter {
                keyword: String::new(),
                date_from,
                date_to,
            },
            access: EventCollection::new(settings.page_size),
            qr: EventCollection::new(settings.page_size),
            residents: ResidentCollection::new(settings.page_size),
        }
    }

    /// Effects to run when the page first loads: the access tab is fetched
    /// eagerly.
    pub fn start(&mut self) -> Vec<Effect> {
        info!("Admin panel started on tab '{}'", self.active.as_str());
        vec![Effect::Load(Tab::Access)]
    }

    pub fn active_tab(&self) -> Tab {
        self.active
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    pub fn filters_visible(&self) -> bool {
        self.active.uses_global_filters()
    }

    pub fn access(&self) -> &EventCollection<EventRecord> {
        &self.access
    }

    pub fn qr(&self) -> &EventCollection<QrEventRecord> {
        &self.qr
    }

    pub fn residents(&self) -> &ResidentCollection {
        &self.residents
    }

    fn is_loaded(&self, tab: Tab) -> bool {
        match tab {
            Tab::Access => self.access.loaded,
            Tab::Qr => self.qr.loaded,
            Tab::Residents => self.residents.loaded,
        }
    }

    pub fn handle_action(&mut self, action: ViewAction) -> Vec<Effect> {
        debug!("View action: {:?}", action);
        match action {
            ViewAction::TabClicked(tab) => {
                self.active = tab;
                if self.is_loaded(tab) {
                    Vec::new()
                } else {
                    vec![Effect::Load(tab)]
                }
            }
            ViewAction::Refresh => vec![Effect::Load(self.active)],
            ViewAction::PrevPage(tab) => {
                match tab {
                    Tab::Access => self.access.pager.prev(),
                    Tab::Qr => self.qr.pager.prev(),
                    Tab::Residents => self.residents.pager.prev(),
                };
                Vec::new()
            }
            ViewAction::NextPage(tab) => {
                let total = self.filtered_count(tab);
                match tab {
                    Tab::Access => self.access.pager.next(total),
                    Tab::Qr => self.qr.pager.next(total),
                    Tab::Residents => self.residents.pager.next(total),
                };
                Vec::new()
            }
            ViewAction::KeywordChanged(keyword) => {
                self.filter.keyword = keyword;
                Vec::new()
            }
            ViewAction::DateFromChanged(date) => {
                self.filter.date_from = date;
                Vec::new()
            }
            ViewAction::DateToChanged(date) => {
                self.filter.date_to = date;
                Vec::new()
            }
            ViewAction::ResidentSearchChanged(query) => {
                self.residents.set_query(&query);
                Vec::new()
            }
            ViewAction::DeleteClicked(id) => vec![Effect::ConfirmDelete(id)],
            ViewAction::DeleteConfirmed(id) => {
                info!("Deleting resident {}", id);
                vec![Effect::Delete(id)]
            }
        }
    }

    pub fn handle_operation(&mut self, operation: AdminOperation) -> Vec<Effect> {
        match operation {
            AdminOperation::LoadAccess(result) => match result {
                Ok(rows) => {
                    info!("Loaded {} access events", rows.len());
                    self.access.replace(rows);
                    Vec::new()
                }
                Err(err) => self.load_failed("Failed to load access events", &err),
            },
            AdminOperation::LoadQr(result) => match result {
                Ok(rows) => {
                    info!("Loaded {} visitor QR events", rows.len());
                    self.qr.replace(rows);
                    Vec::new()
                }
                Err(err) => self.load_failed("Failed to load visitor QR events", &err),
            },
            AdminOperation::LoadResidents(result) => match result {
                Ok(rows) => {
                    info!("Loaded {} residents", rows.len());
                    self.residents.replace(rows);
                    Vec::new()
                }
                Err(err) => self.load_failed("Failed to load the resident list.\n", &err),
            },
            AdminOperation::DeleteResident(id, result) => match result {
                Ok(()) => {
                    info!("Deleted resident {}", id);
                    vec![
                        Effect::Alert(DELETE_SUCCESS_MESSAGE.to_string()),
                        Effect::Load(Tab::Residents),
                    ]
                }
                Err(err) if err.is_network() => {
                    error!("Delete of resident {} failed: {}", id, err);
                    vec![Effect::Alert(CONNECTION_ERROR_MESSAGE.to_string())]
                }
                Err(err) => {
                    warn!("Delete of resident {} refused: {}", id, err);
                    vec![Effect::Alert(format!("Delete failed: {}", err))]
                }
            },
        }
    }

    fn load_failed(&self, context: &str, err: &AdminError) -> Vec<Effect> {
        error!("{}: {}", context.trim_end(), err);
        let separator = if context.ends_with('\n') { "" } else { ": " };
        vec![Effect::Alert(format!("{}{}{}", context, separator, err))]
    }

    fn filtered_count(&self, tab: Tab) -> usize {
        match tab {
            Tab::Access => self.access.filtered(&self.filter).len(),
            Tab::Qr => self.qr.filtered(&self.filter).len(),
            Tab::Residents => self.residents.view().len(),
        }
    }

    /// Render a table for the current filter and page, clamping the page
    /// into range first.
    pub fn render(&mut self, tab: Tab) -> RenderedTable {
        match tab {
            Tab::Access => {
                let rows = self.filter.apply(&self.access.rows);
                let pager = &mut self.access.pager;
                pager.clamp(rows.len());
                RenderedTable {
                    tab,
                    body_html: ui::render_rows(tab, pager.slice(&rows), |r| ui::access_row(r)),
                    page_label: pager.label(rows.len()),
                    total: rows.len(),
                }
            }
            Tab::Qr => {
                let rows = self.filter.apply(&self.qr.rows);
                let pager = &mut self.qr.pager;
                pager.clamp(rows.len());
                RenderedTable {
                    tab,
                    body_html: ui::render_rows(tab, pager.slice(&rows), |r| ui::qr_row(r)),
                    page_label: pager.label(rows.len()),
                    total: rows.len(),
                }
            }
            Tab::Residents => {
                let total = self.residents.view().len();
                self.residents.pager.clamp(total);
                let pager = self.residents.pager;
                RenderedTable {
                    tab,
                    body_html: ui::render_rows(tab, pager.slice(self.residents.view()), ui::resident_row),
                    page_label: pager.label(total),
                    total,
                }
            }
        }
    }

    pub fn render_all(&mut self) -> Vec<RenderedTable> {
        Tab::ALL.into_iter().map(|tab| self.render(tab)).collect()
    }
}

/// Run a network effect against the backend. Returns `None` for effects
/// that need the user rather than the network.
pub async fn perform(settings: &AdminSettings, effect: &Effect) -> Option<AdminOperation> {
    let operation = match effect {
        Effect::Load(Tab::Access) => AdminOperation::LoadAccess(api::fetch_access_events(settings).await),
        Effect::Load(Tab::Qr) => AdminOperation::LoadQr(api::fetch_qr_events(settings).await),
        Effect::Load(Tab::Residents) => AdminOperation::LoadResidents(api::fetch_residents(settings).await),
        Effect::Delete(id) => AdminOperation::DeleteResident(*id, api::delete_resident(settings, *id).await),
        Effect::ConfirmDelete(_) | Effect::Alert(_) => return None,
    };
    Some(operation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    fn view() -> AdminView {
        AdminView::new(&AdminSettings::default(), today())
    }

    fn access_rows(n: i64) -> Vec<EventRecord> {
        (1..=n)
            .map(|i| EventRecord {
                id: i.to_string(),
                device_id: format!("gate-{}", i % 2),
                images_dir: String::new(),
                event_time: "2024-01-15 08:00:00".to_string(),
            })
            .collect()
    }

    fn resident(id: i64, name: &str) -> ResidentRecord {
        ResidentRecord {
            id: Some(ResidentId(id)),
            name: name.to_string(),
            phone: "010".to_string(),
            unit: "101-203".to_string(),
            created_at: String::new(),
        }
    }

    #[test]
    fn test_initial_state() {
        let mut view = view();
        assert_eq!(view.active_tab(), Tab::Access);
        assert!(view.filters_visible());
        assert_eq!(view.filter().date_from, "2024-01-01");
        assert_eq!(view.filter().date_to, "2024-01-31");
        assert_eq!(view.start(), vec![Effect::Load(Tab::Access)]);
    }

    #[test]
    fn test_tab_loads_lazily() {
        let mut view = view();
        assert_eq!(
            view.handle_action(ViewAction::TabClicked(Tab::Qr)),
            vec![Effect::Load(Tab::Qr)]
        );
        view.handle_operation(AdminOperation::LoadQr(Ok(Vec::new())));
        assert!(view.handle_action(ViewAction::TabClicked(Tab::Qr)).is_empty());

        assert_eq!(
            view.handle_action(ViewAction::TabClicked(Tab::Residents)),
            vec![Effect::Load(Tab::Residents)]
        );
        assert!(!view.filters_visible());
        assert_eq!(view.active_tab(), Tab::Residents);
    }

    #[test]
    fn test_failed_load_is_retried_on_next_click() {
        let mut view = view();
        view.handle_action(ViewAction::TabClicked(Tab::Qr));
        let effects = view.handle_operation(AdminOperation::LoadQr(Err(AdminError::Network(
            "connection refused".to_string(),
        ))));
        assert!(matches!(&effects[..], [Effect::Alert(msg)] if msg.contains("connection refused")));
        assert_eq!(
            view.handle_action(ViewAction::TabClicked(Tab::Qr)),
            vec![Effect::Load(Tab::Qr)]
        );
    }

    #[test]
    fn test_failed_reload_keeps_stale_rows() {
        let mut view = view();
        view.handle_operation(AdminOperation::LoadAccess(Ok(access_rows(3))));
        view.handle_action(ViewAction::Refresh);
        view.handle_operation(AdminOperation::LoadAccess(Err(AdminError::Parse("eof".into()))));
        assert_eq!(view.access().rows.len(), 3);
    }

    #[test]
    fn test_last_response_wins() {
        let mut view = view();
        view.handle_operation(AdminOperation::LoadAccess(Ok(access_rows(5))));
        view.handle_operation(AdminOperation::LoadAccess(Ok(access_rows(2))));
        assert_eq!(view.access().rows.len(), 2);
    }

    #[test]
    fn test_refresh_targets_active_tab() {
        let mut view = view();
        view.handle_action(ViewAction::TabClicked(Tab::Residents));
        assert_eq!(view.handle_action(ViewAction::Refresh), vec![Effect::Load(Tab::Residents)]);
    }

    #[test]
    fn test_paging_bounds() {
        let mut view = view();
        view.handle_operation(AdminOperation::LoadAccess(Ok(access_rows(20))));

        view.handle_action(ViewAction::PrevPage(Tab::Access));
        assert_eq!(view.render(Tab::Access).page_label, "1 / 2");

        view.handle_action(ViewAction::NextPage(Tab::Access));
        view.handle_action(ViewAction::NextPage(Tab::Access));
        let table = view.render(Tab::Access);
        assert_eq!(table.page_label, "2 / 2");
        assert_eq!(table.body_html.matches("<tr>").count(), 5);
    }

    #[test]
    fn test_filter_change_clamps_page_on_render() {
        let mut view = view();
        view.handle_operation(AdminOperation::LoadAccess(Ok(access_rows(40))));
        view.handle_action(ViewAction::NextPage(Tab::Access));
        view.handle_action(ViewAction::NextPage(Tab::Access));
        assert_eq!(view.access().pager.page, 3);

        // gate-1 matches the 20 odd ids
        view.handle_action(ViewAction::KeywordChanged("gate-1".to_string()));
        assert_eq!(view.access().pager.page, 3);
        let table = view.render(Tab::Access);
        assert_eq!(table.total, 20);
        assert_eq!(table.page_label, "2 / 2");
    }

    #[test]
    fn test_fresh_load_resets_page() {
        let mut view = view();
        view.handle_operation(AdminOperation::LoadAccess(Ok(access_rows(40))));
        view.handle_action(ViewAction::NextPage(Tab::Access));
        view.handle_operation(AdminOperation::LoadAccess(Ok(access_rows(40))));
        assert_eq!(view.access().pager.page, 1);
    }

    #[test]
    fn test_date_filter_excludes_everything() {
        let mut view = view();
        view.handle_operation(AdminOperation::LoadAccess(Ok(access_rows(3))));
        view.handle_action(ViewAction::DateFromChanged("2024-02-01".to_string()));
        let table = view.render(Tab::Access);
        assert_eq!(table.total, 0);
        assert_eq!(table.page_label, "1 / 1");
        assert!(table.body_html.contains(r#"colspan="4""#));

        let qr = view.render(Tab::Qr);
        assert!(qr.body_html.contains(r#"colspan="6""#));
    }

    #[test]
    fn test_delete_flow_success() {
        let mut view = view();
        view.handle_operation(AdminOperation::LoadResidents(Ok(vec![resident(7, "Kim")])));

        let id = ResidentId(7);
        assert_eq!(
            view.handle_action(ViewAction::DeleteClicked(id)),
            vec![Effect::ConfirmDelete(id)]
        );
        assert_eq!(
            view.handle_action(ViewAction::DeleteConfirmed(id)),
            vec![Effect::Delete(id)]
        );
        let effects = view.handle_operation(AdminOperation::DeleteResident(id, Ok(())));
        assert_eq!(
            effects,
            vec![
                Effect::Alert(DELETE_SUCCESS_MESSAGE.to_string()),
                Effect::Load(Tab::Residents)
            ]
        );
        // row stays until the reload lands
        assert_eq!(view.residents().all().len(), 1);
    }

    #[test]
    fn test_delete_rejected_keeps_row() {
        let mut view = view();
        view.handle_operation(AdminOperation::LoadResidents(Ok(vec![resident(7, "Kim")])));

        let effects = view.handle_operation(AdminOperation::DeleteResident(
            ResidentId(7),
            Err(AdminError::Rejected("locked".to_string())),
        ));
        assert!(matches!(&effects[..], [Effect::Alert(msg)] if msg.contains("locked")));
        assert!(view.render(Tab::Residents).body_html.contains(r#"data-id="7""#));
    }

    #[test]
    fn test_delete_network_error_message() {
        let mut view = view();
        let effects = view.handle_operation(AdminOperation::DeleteResident(
            ResidentId(7),
            Err(AdminError::Network("reset".to_string())),
        ));
        assert_eq!(effects, vec![Effect::Alert(CONNECTION_ERROR_MESSAGE.to_string())]);
    }

    #[test]
    fn test_resident_search_and_count() {
        let mut view = view();
        view.handle_operation(AdminOperation::LoadResidents(Ok(vec![
            resident(1, "Kim"),
            resident(2, "Park"),
        ])));
        view.handle_action(ViewAction::ResidentSearchChanged("park".to_string()));
        let table = view.render(Tab::Residents);
        assert_eq!(table.count_label(), "1 row");
        assert!(table.body_html.contains("Park"));
        assert!(!table.body_html.contains("Kim"));
    }

    #[test]
    fn test_render_all_keeps_pages_in_range() {
        let mut view = view();
        view.handle_operation(AdminOperation::LoadAccess(Ok(access_rows(31))));
        for table in view.render_all() {
            let (page, max) = table.page_label.split_once(" / ").unwrap();
            let (page, max): (usize, usize) = (page.parse().unwrap(), max.parse().unwrap());
            assert!(page >= 1 && page <= max);
            assert_eq!(max, table.total.div_ceil(15).max(1));
        }
    }
}
