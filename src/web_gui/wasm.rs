//! Browser entry point: binds the admin page's controls to an [`AdminView`]
//! and paints its tables.
//!
//! Expected page elements: `.tab[data-tab]` buttons, `#panel-<tab>` panels,
//! `#filters-global` with `#kw`, `#dateFrom`, `#dateTo`, `#btn-refresh`,
//! `.pager .prev|.next|.page[data-target]`, `#tbl-access tbody`,
//! `#tbl-qr tbody`, `#residents-tbody`, `#residentSearch`, `#residentCount`.

use super::app::{perform, AdminOperation, AdminView, Effect, ViewAction, DELETE_CONFIRM_MESSAGE};
use super::records::ResidentId;
use super::state::{AdminSettings, Tab};
use super::ui::{RenderedTable, DELETE_RESIDENT_ACTION};
use crate::format::local_today;
use log::{info, warn};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlInputElement};

struct Panel {
    view: RefCell<AdminView>,
    settings: AdminSettings,
    document: Document,
}

impl Panel {
    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn set_input_value(&self, selector: &str, value: &str) {
        if let Some(input) = self
            .query(selector)
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            input.set_value(value);
        }
    }

    /// Repaint tabs, filter bar and all three tables from the view.
    fn paint(&self) {
        let (active, filters_visible, tables) = {
            let mut view = self.view.borrow_mut();
            (view.active_tab(), view.filters_visible(), view.render_all())
        };

        for tab in Tab::ALL {
            let is_active = tab == active;
            let selector = format!(".tab[data-tab=\"{}\"]", tab.as_str());
            for button in self.query_all(&selector) {
                let _ = button.class_list().toggle_with_force("active", is_active);
            }
            if let Some(panel) = self.query(&format!("#panel-{}", tab.as_str())) {
                let _ = panel.class_list().toggle_with_force("active", is_active);
            }
        }

        if let Some(bar) = self.query("#filters-global") {
            let _ = bar.class_list().toggle_with_force("hidden", !filters_visible);
        }

        for table in &tables {
            self.paint_table(table);
        }
    }

    fn paint_table(&self, table: &RenderedTable) {
        let body_selector = match table.tab {
            Tab::Access => "#tbl-access tbody",
            Tab::Qr => "#tbl-qr tbody",
            Tab::Residents => "#residents-tbody",
        };
        match self.query(body_selector) {
            Some(body) => body.set_inner_html(&table.body_html),
            None => warn!("{} not found", body_selector),
        }

        let label_selector = format!(".pager .page[data-target=\"{}\"]", table.tab.as_str());
        if let Some(label) = self.query(&label_selector) {
            label.set_text_content(Some(table.page_label.as_str()));
        }

        if table.tab == Tab::Residents {
            if let Some(count) = self.query("#residentCount") {
                count.set_text_content(Some(table.count_label().as_str()));
            }
        }
    }
}

fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
}

fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

fn dispatch(panel: &Rc<Panel>, action: ViewAction) {
    let effects = panel.view.borrow_mut().handle_action(action);
    panel.paint();
    run_effects(panel, effects);
}

/// Network effects run detached; nothing stops a second click from starting
/// another request for the same tab before the first one lands.
fn run_effects(panel: &Rc<Panel>, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::Alert(message) => alert(&message),
            Effect::ConfirmDelete(id) => {
                if confirm(DELETE_CONFIRM_MESSAGE) {
                    dispatch(panel, ViewAction::DeleteConfirmed(id));
                }
            }
            Effect::Load(_) | Effect::Delete(_) => {
                let panel = Rc::clone(panel);
                wasm_bindgen_futures::spawn_local(async move {
                    if let Some(operation) = perform(&panel.settings, &effect).await {
                        if let Some(message) = operation_error(&operation) {
                            web_sys::console::error_1(&JsValue::from_str(&message));
                        }
                        let effects = panel.view.borrow_mut().handle_operation(operation);
                        panel.paint();
                        run_effects(&panel, effects);
                    }
                });
            }
        }
    }
}

fn operation_error(operation: &AdminOperation) -> Option<String> {
    match operation {
        AdminOperation::LoadAccess(Err(e))
        | AdminOperation::LoadQr(Err(e))
        | AdminOperation::LoadResidents(Err(e))
        | AdminOperation::DeleteResident(_, Err(e)) => Some(e.to_string()),
        _ => None,
    }
}

fn listen<F>(target: &Element, event: &str, handler: F) -> Result<(), JsValue>
where
    F: FnMut(Event) + 'static,
{
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn event_input_value(event: &Event) -> String {
    event
        .target()
        .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
        .map(|input| input.value())
        .unwrap_or_default()
}

fn bind_input(
    panel: &Rc<Panel>,
    selector: &str,
    events: &[&str],
    action: fn(String) -> ViewAction,
) -> Result<(), JsValue> {
    let Some(input) = panel.query(selector) else {
        warn!("{} not found", selector);
        return Ok(());
    };
    for event in events {
        let panel = Rc::clone(panel);
        listen(&input, event, move |ev| dispatch(&panel, action(event_input_value(&ev))))?;
    }
    Ok(())
}

fn bind_controls(panel: &Rc<Panel>) -> Result<(), JsValue> {
    for button in panel.query_all(".tab") {
        let Some(tab) = button.get_attribute("data-tab").and_then(|s| Tab::parse(&s)) else {
            continue;
        };
        let panel = Rc::clone(panel);
        listen(&button, "click", move |_| dispatch(&panel, ViewAction::TabClicked(tab)))?;
    }

    if let Some(refresh) = panel.query("#btn-refresh") {
        let panel = Rc::clone(panel);
        listen(&refresh, "click", move |_| dispatch(&panel, ViewAction::Refresh))?;
    }

    for (selector, action) in [
        (".pager .prev", ViewAction::PrevPage as fn(Tab) -> ViewAction),
        (".pager .next", ViewAction::NextPage as fn(Tab) -> ViewAction),
    ] {
        for button in panel.query_all(selector) {
            let Some(tab) = button.get_attribute("data-target").and_then(|s| Tab::parse(&s)) else {
                continue;
            };
            let panel = Rc::clone(panel);
            listen(&button, "click", move |_| dispatch(&panel, action(tab)))?;
        }
    }

    bind_input(panel, "#kw", &["input"], ViewAction::KeywordChanged)?;
    bind_input(panel, "#dateFrom", &["input", "change"], ViewAction::DateFromChanged)?;
    bind_input(panel, "#dateTo", &["input", "change"], ViewAction::DateToChanged)?;
    bind_input(panel, "#residentSearch", &["input"], ViewAction::ResidentSearchChanged)?;

    // One delegated listener for every delete button the table body will ever hold.
    if let Some(body) = panel.query("#residents-tbody") {
        let panel = Rc::clone(panel);
        let selector = format!("[data-action=\"{}\"]", DELETE_RESIDENT_ACTION);
        listen(&body, "click", move |ev| {
            let id = ev
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|el| el.closest(&selector).ok().flatten())
                .and_then(|button| button.get_attribute("data-id"))
                .and_then(|id| id.parse::<i64>().ok());
            if let Some(id) = id {
                dispatch(&panel, ViewAction::DeleteClicked(ResidentId(id)));
            }
        })?;
    }

    Ok(())
}

/// Start the admin panel on the current page. `server_url` defaults to the
/// page's own origin.
#[wasm_bindgen]
pub fn start_admin_panel(server_url: Option<String>) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("No document object"))?;

    let mut settings = AdminSettings::default();
    if let Some(url) = server_url {
        settings.server_url = url;
    }

    let mut view = AdminView::new(&settings, local_today());
    let initial = view.start();
    let panel = Rc::new(Panel {
        view: RefCell::new(view),
        settings,
        document,
    });

    {
        let view = panel.view.borrow();
        panel.set_input_value("#dateFrom", &view.filter().date_from);
        panel.set_input_value("#dateTo", &view.filter().date_to);
    }

    bind_controls(&panel)?;
    panel.paint();
    run_effects(&panel, initial);

    info!("Admin panel bound to {}", panel.settings.server_url);
    Ok(())
}

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    let _ = tracing_log::LogTracer::init();
}
