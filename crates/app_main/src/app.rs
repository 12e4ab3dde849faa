//! Interactive viewer session

use anyhow::Result;
use app_core::{AppConfig, Command, CommandId, HttpTransport, PageEngine, PointerEvent, SearchForm};
use app_ui::{AuxiliaryPanel, Keymap, MountPoint, PanelKind, ShowRequest, ShowState, ViewerHost};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Surface width assumed when a click names none
const DEFAULT_SURFACE_WIDTH: f64 = 800.0;

struct App {
    host: ViewerHost,
    keymap: Keymap,
}

impl App {
    /// Execute a command. Returns false when the session should end.
    fn execute(&self, cmd: &Command) -> bool {
        let cmd_id = cmd.id.as_str();
        tracing::debug!(command = cmd_id, "executing command");

        match cmd_id {
            CommandId::NAV_NEXT => self.track(self.host.next()),
            CommandId::NAV_PREV => self.track(self.host.prev()),
            CommandId::NAV_GOTO => match page_number(cmd) {
                Some(index) => self.track(self.host.show(index)),
                None => println!("usage: goto <page number>"),
            },
            CommandId::NAV_FIRST => self.track(self.host.show(0)),
            CommandId::NAV_LAST => match self.host.size() {
                0 => println!("no pages"),
                size => self.track(self.host.show(size - 1)),
            },

            CommandId::VIEW_TOGGLE_LIST => self.toggle(PanelKind::List),
            CommandId::VIEW_TOGGLE_GRID => self.toggle(PanelKind::Grid),
            CommandId::VIEW_TOGGLE_SEARCH => self.toggle(PanelKind::Search),

            CommandId::POINTER_CLICK => {
                let Some(x) = cmd.int() else {
                    println!("usage: click <x> [surface width]");
                    return true;
                };
                let width = cmd.params.int_values.get(1).map_or(DEFAULT_SURFACE_WIDTH, |&w| w as f64);
                let event = PointerEvent::new(x as f64, 0.0, width);
                self.host.pointer_down(&event);
                self.host.pointer_up(&event);
                match self.host.click(&event) {
                    Some(request) => self.track(request),
                    None => println!("(no page turn)"),
                }
            }
            CommandId::ENTRY_CLICK => {
                let in_grid = cmd.params.string_value.as_deref().is_some_and(|s| s.contains("grid"));
                let view = if in_grid { self.host.grid() } else { self.host.list() };
                match page_number(cmd).and_then(|index| view.entry_at(index)) {
                    Some(entry) => match entry.click() {
                        Some(request) => self.track(request),
                        None => println!("entry is not attached to a viewer"),
                    },
                    None => println!("usage: pick <page number> [grid]"),
                }
            }

            CommandId::APP_SEARCH => {
                let form = parse_search_form(cmd.params.string_value.as_deref().unwrap_or(""));
                match self.host.search(&form) {
                    Some(query) => match query.to_json() {
                        Ok(json) => println!("{}", json),
                        Err(e) => println!("cannot encode query: {}", e),
                    },
                    None => println!("usage: search <text> [theme=..] [sort=..] [order=desc] [rows=..]"),
                }
            }
            CommandId::APP_STATUS => self.print_status(),
            CommandId::APP_QUIT => return false,

            _ => {
                tracing::debug!("Unhandled command: {}", cmd_id);
            }
        }
        true
    }

    fn toggle(&self, kind: PanelKind) {
        let visible = self.host.toggle_panel(kind);
        println!("{:?} panel {}", kind, if visible { "shown" } else { "hidden" });
    }

    /// Report the outcome of a show request once it settles
    fn track(&self, request: ShowRequest) {
        if request.is_settled() {
            report(request.index(), request.state(), &self.host);
            return;
        }
        println!("loading page {}...", request.index().wrapping_add(1));
        let host = self.host.downgrade();
        tokio::spawn(async move {
            let index = request.index();
            let state = request.wait().await;
            if let Some(host) = host.upgrade() {
                report(index, state, &host);
            }
        });
    }

    fn print_status(&self) {
        let host = &self.host;
        println!("status: {}", host.status());
        let size = host.size();
        if size > 0 {
            println!("{}: page {} of {}", host.label(), host.index() + 1, size);
        }
        let loaded = (0..host.list().len())
            .filter_map(|i| host.list().entry_at(i))
            .filter(|e| e.load_state() == Some(app_ui::LoadState::Loaded))
            .count();
        println!("loaded: {}/{}", loaded, host.list().len());
        println!(
            "panels: list={} grid={} search={}",
            host.list().is_visible(),
            host.grid().is_visible(),
            host.search_panel().is_visible()
        );
        let waiting: Vec<usize> = host.surface().progress().iter().map(|p| p.index() + 1).collect();
        if !waiting.is_empty() {
            println!("waiting for: {:?}", waiting);
        }
    }
}

fn report(index: usize, state: ShowState, host: &ViewerHost) {
    match state {
        ShowState::Displayed if index < host.size() => {
            let label = host
                .list()
                .entry_at(index)
                .map(|e| e.label().to_string())
                .unwrap_or_default();
            println!("page {} of {} [{}]", index + 1, host.size(), label);
        }
        ShowState::Displayed => println!("no page {}; staying on page {}", index.wrapping_add(1), host.index() + 1),
        other => match give_up_message(index, other) {
            Some(message) => println!("{}", message),
            None => tracing::debug!(index, state = ?other, "show ended"),
        },
    }
}

/// What to tell the user when a show request ends without a page
fn give_up_message(index: usize, state: ShowState) -> Option<String> {
    let page = index.wrapping_add(1);
    match state {
        ShowState::TimedOut => Some(format!("page {} did not load in time", page)),
        ShowState::Failed => Some(format!("page {} could not be fetched; try again", page)),
        _ => None,
    }
}

/// First integer parameter as a zero-based index (users count from 1)
fn page_number(cmd: &Command) -> Option<usize> {
    let n = cmd.int()?;
    usize::try_from(n).ok()?.checked_sub(1)
}

/// `key=value` tokens fill the form fields; everything else is free text
fn parse_search_form(input: &str) -> SearchForm {
    let mut form = SearchForm::default();
    let mut text = Vec::new();

    for token in input.split_whitespace() {
        match token.split_once('=') {
            Some(("theme", value)) => form.theme = Some(value.to_string()),
            Some(("sort", value)) => form.sort = Some(value.to_string()),
            Some(("order", value)) => form.descending = value.eq_ignore_ascii_case("desc"),
            Some(("rows", value)) => form.rows = Some(value.to_string()),
            _ => text.push(token),
        }
    }

    form.text = text.join(" ");
    form
}

/// Run the viewer until stdin closes or the user quits
pub async fn run(config: AppConfig) -> Result<()> {
    let transport = Arc::new(HttpTransport::new(config.viewer.request_timeout())?);
    let engine = PageEngine::new(transport.clone());
    let host = ViewerHost::new(Box::new(engine), transport, &config);
    let mount = MountPoint::new();

    let app = App {
        host: host.clone(),
        keymap: Keymap::new(&config.keybindings),
    };

    match mount.mount(&host).await {
        Ok(first) => {
            println!("{} ({} pages)", host.label(), host.size());
            app.track(first);
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            tracing::error!("Viewer failed to start: {}", e);
            return Err(e.into());
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(cmd) = app.keymap.resolve(&line) else {
            println!("unknown command: {}", line.trim());
            continue;
        };
        if !app.execute(&cmd) {
            break;
        }
    }

    tracing::info!("manga viewer exiting");
    Ok(())
}
