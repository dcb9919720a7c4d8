use super::records::{EventRecord, QrEventRecord, ResidentRecord};
use crate::format::date_prefix;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 15;

pub const ACCESS_EVENTS_PATH: &str = "/api/access-events";
pub const QR_EVENTS_PATH: &str = "/api/qr-events";
pub const RESIDENTS_PATH: &str = "/external/residents";
pub const RESIDENT_ITEM_PATH: &str = "/admin/residents";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSettings {
    pub server_url: String,
    pub page_size: usize,
}

impl Default for AdminSettings {
    fn default() -> Self {
        let server_url = {
            #[cfg(all(target_arch = "wasm32", feature = "web-gui"))]
            {
                web_sys::window()
                    .and_then(|w| w.location().origin().ok())
                    .unwrap_or_else(|| "http://localhost:5000".to_string())
            }
            #[cfg(not(all(target_arch = "wasm32", feature = "web-gui")))]
            {
                "http://localhost:5000".to_string()
            }
        };

        Self {
            server_url,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AdminSettings {
    /// Absolute URL of an API path on the configured server.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.server_url.trim_end_matches('/'), path)
    }
}

/// One of the three panels. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Access,
    Qr,
    Residents,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Access, Tab::Qr, Tab::Residents];

    /// Value of the `data-tab` / `data-target` attributes in the page.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Access => "access",
            Tab::Qr => "qr",
            Tab::Residents => "residents",
        }
    }

    pub fn parse(s: &str) -> Option<Tab> {
        Tab::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// The shared keyword/date bar applies to the event tabs only.
    pub fn uses_global_filters(&self) -> bool {
        !matches!(self, Tab::Residents)
    }
}

/// 1-indexed page cursor over a list whose length changes under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub page: usize,
    pub page_size: usize,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn max_page(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    pub fn clamp(&mut self, total: usize) {
        self.page = self.page.clamp(1, self.max_page(total));
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Returns whether the page moved.
    pub fn prev(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self, total: usize) -> bool {
        if self.page < self.max_page(total) {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Rows of the current page. Call [`Pager::clamp`] first.
    pub fn slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        let start = (self.page - 1).saturating_mul(self.page_size).min(rows.len());
        let end = (start + self.page_size).min(rows.len());
        &rows[start..end]
    }

    pub fn label(&self, total: usize) -> String {
        format!("{} / {}", self.page, self.max_page(total))
    }
}

/// Row types the shared keyword/date bar can filter.
pub trait EventRow: Serialize {
    fn event_time(&self) -> &str;

    /// Lowercased JSON of the whole row, so the keyword matches any field.
    fn search_blob(&self) -> String {
        serde_json::to_string(self)
            .map(|s| s.to_lowercase())
            .unwrap_or_default()
    }
}

impl EventRow for EventRecord {
    fn event_time(&self) -> &str {
        &self.event_time
    }
}

impl EventRow for QrEventRecord {
    fn event_time(&self) -> &str {
        &self.event_time
    }
}

/// Keyword and inclusive `YYYY-MM-DD` bounds of the shared filter bar.
/// Empty strings mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub keyword: String,
    pub date_from: String,
    pub date_to: String,
}

impl EventFilter {
    pub fn matches<R: EventRow>(&self, row: &R) -> bool {
        let keyword = self.keyword.trim().to_lowercase();
        if !keyword.is_empty() && !row.search_blob().contains(&keyword) {
            return false;
        }

        let day = date_prefix(row.event_time());
        if !self.date_from.is_empty() && day < self.date_from.as_str() {
            return false;
        }
        if !self.date_to.is_empty() && day > self.date_to.as_str() {
            return false;
        }
        true
    }

    pub fn apply<'a, R: EventRow>(&self, rows: &'a [R]) -> Vec<&'a R> {
        rows.iter().filter(|r| self.matches(*r)).collect()
    }
}

/// Rows and page cursor of an event tab.
#[derive(Debug, Clone)]
pub struct EventCollection<R> {
    pub rows: Vec<R>,
    pub pager: Pager,
    pub loaded: bool,
}

impl<R: EventRow> EventCollection<R> {
    pub fn new(page_size: usize) -> Self {
        Self {
            rows: Vec::new(),
            pager: Pager::new(page_size),
            loaded: false,
        }
    }

    /// Replace the rows with a fresh load and go back to the first page.
    pub fn replace(&mut self, rows: Vec<R>) {
        self.rows = rows;
        self.pager.reset();
        self.loaded = true;
    }

    pub fn filtered(&self, filter: &EventFilter) -> Vec<&R> {
        filter.apply(&self.rows)
    }
}

/// Residents keep the full list and a view derived from the search box.
#[derive(Debug, Clone)]
pub struct ResidentCollection {
    all: Vec<ResidentRecord>,
    view: Vec<ResidentRecord>,
    query: String,
    pub pager: Pager,
    pub loaded: bool,
}

pub fn resident_matches(row: &ResidentRecord, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }
    row.name.to_lowercase().contains(&q)
        || row.phone.to_lowercase().contains(&q)
        || row.unit.to_lowercase().contains(&q)
}

impl ResidentCollection {
    pub fn new(page_size: usize) -> Self {
        Self {
            all: Vec::new(),
            view: Vec::new(),
            query: String::new(),
            pager: Pager::new(page_size),
            loaded: false,
        }
    }

    pub fn all(&self) -> &[ResidentRecord] {
        &self.all
    }

    pub fn view(&self) -> &[ResidentRecord] {
        &self.view
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn replace(&mut self, rows: Vec<ResidentRecord>) {
        self.all = rows;
        self.pager.reset();
        self.loaded = true;
        self.refilter();
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.refilter();
    }

    fn refilter(&mut self) {
        self.view = self
            .all
            .iter()
            .filter(|r| resident_matches(r, &self.query))
            .cloned()
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web_gui::records::ResidentId;

    fn access(id: i64, time: &str, device: &str) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            device_id: device.to_string(),
            images_dir: format!("/img/{}", id),
            event_time: time.to_string(),
        }
    }

    fn resident(id: i64, name: &str, phone: &str, unit: &str) -> ResidentRecord {
        ResidentRecord {
            id: Some(ResidentId(id)),
            name: name.to_string(),
            phone: phone.to_string(),
            unit: unit.to_string(),
            created_at: String::new(),
        }
    }

    #[test]
    fn test_max_page() {
        let pager = Pager::new(15);
        assert_eq!(pager.max_page(0), 1);
        assert_eq!(pager.max_page(15), 1);
        assert_eq!(pager.max_page(16), 2);
        assert_eq!(pager.max_page(45), 3);
    }

    #[test]
    fn test_prev_next_stop_at_bounds() {
        let mut pager = Pager::new(15);
        assert!(!pager.prev());
        assert_eq!(pager.page, 1);

        assert!(pager.next(31));
        assert!(pager.next(31));
        assert_eq!(pager.page, 3);
        assert!(!pager.next(31));
        assert_eq!(pager.page, 3);
    }

    #[test]
    fn test_clamp_and_slice() {
        let rows: Vec<u32> = (0..40).collect();
        let mut pager = Pager::new(15);
        pager.page = 9;
        pager.clamp(rows.len());
        assert_eq!(pager.page, 3);
        assert_eq!(pager.slice(&rows), &rows[30..40]);
        assert_eq!(pager.label(rows.len()), "3 / 3");

        pager.clamp(0);
        assert_eq!(pager.page, 1);
        assert!(pager.slice(&rows[..0]).is_empty());
        assert_eq!(pager.label(0), "1 / 1");
    }

    #[test]
    fn test_keyword_matches_any_field() {
        let rows = vec![
            access(1, "2024-01-02 03:04:05", "Gate-North"),
            access(2, "2024-01-03 03:04:05", "gate-south"),
        ];
        let filter = EventFilter {
            keyword: "  NORTH ".to_string(),
            ..Default::default()
        };
        let hits = filter.apply(&rows);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");

        let filter = EventFilter {
            keyword: "/img/2".to_string(),
            ..Default::default()
        };
        assert_eq!(filter.apply(&rows)[0].id, "2");
    }

    #[test]
    fn test_date_range_inclusive() {
        let rows = vec![
            access(1, "2024-01-01 23:59:59", "a"),
            access(2, "2024-01-02 00:00:00", "a"),
            access(3, "2024-01-05 12:00:00", "a"),
            access(4, "2024-01-06 00:00:00", "a"),
            access(5, "", "a"),
        ];
        let filter = EventFilter {
            keyword: String::new(),
            date_from: "2024-01-02".to_string(),
            date_to: "2024-01-05".to_string(),
        };
        let ids: Vec<_> = filter.apply(&rows).iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec!["2", "3"]);

        let open_ended = EventFilter {
            date_from: "2024-01-05".to_string(),
            ..Default::default()
        };
        let ids: Vec<_> = open_ended.apply(&rows).iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec!["3", "4"]);
    }

    #[test]
    fn test_filter_is_ordered_subset() {
        let rows: Vec<_> = (0..30)
            .map(|i| access(i, "2024-02-01 00:00:00", if i % 3 == 0 { "x" } else { "y" }))
            .collect();
        let filter = EventFilter {
            keyword: "\"device_id\":\"x\"".to_string(),
            ..Default::default()
        };
        let ids: Vec<String> = filter.apply(&rows).iter().map(|r| r.id.clone()).collect();
        let expected: Vec<String> = (0..30).step_by(3).map(|i: i64| i.to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_resident_query() {
        let mut residents = ResidentCollection::new(15);
        residents.replace(vec![
            resident(1, "Kim", "010", "101-203"),
            resident(2, "Lee", "011", "102-1101"),
        ]);

        residents.set_query("kim");
        assert_eq!(residents.view().len(), 1);
        assert_eq!(residents.view()[0].name, "Kim");

        residents.set_query("999");
        assert!(residents.view().is_empty());
        assert_eq!(residents.all().len(), 2);

        residents.set_query("1101");
        assert_eq!(residents.view()[0].id, Some(ResidentId(2)));

        residents.set_query("");
        assert_eq!(residents.view().len(), 2);
    }

    #[test]
    fn test_resident_reload_keeps_query() {
        let mut residents = ResidentCollection::new(15);
        residents.set_query("lee");
        residents.replace(vec![
            resident(1, "Kim", "010", ""),
            resident(2, "Lee", "011", ""),
        ]);
        assert_eq!(residents.view().len(), 1);
        assert_eq!(residents.query(), "lee");
    }

    #[test]
    fn test_tab_parse() {
        assert_eq!(Tab::parse("qr"), Some(Tab::Qr));
        assert_eq!(Tab::parse("visitors"), None);
        assert!(!Tab::Residents.uses_global_filters());
        assert!(Tab::Access.uses_global_filters());
    }

    #[test]
    fn test_endpoint_join() {
        let settings = AdminSettings {
            server_url: "http://admin.local/".to_string(),
            page_size: 15,
        };
        assert_eq!(
            settings.endpoint(ACCESS_EVENTS_PATH),
            "http://admin.local/api/access-events"
        );
    }
}
