//! Shell Interface (§4.9): the read-only window/monitor model and the
//! command surface (§6) the external shell UI drives. This module owns no
//! X resources itself — it renders `ClientTable`/`MonitorRegistry` state
//! into the stable shapes the shell observes and forwards commands to
//! `protocol`/`geometry`.

use x11::xlib::Window;

use crate::client::{ClientState, ClientTable};
use crate::monitor::{Monitor, MonitorRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Normal,
    Minimized,
    Maximized,
}

impl From<ClientState> for WindowState {
    fn from(s: ClientState) -> Self {
        match s {
            ClientState::Normal => WindowState::Normal,
            ClientState::Minimized => WindowState::Minimized,
            ClientState::Maximized => WindowState::Maximized,
        }
    }
}

/// One row of the shell's read model (§4.9).
#[derive(Debug, Clone)]
pub struct WindowRecord {
    pub id: Window,
    pub title: String,
    pub icon_name: String,
    pub app_id: String,
    pub active: bool,
    pub workspace: usize,
    pub state: WindowState,
}

/// The commands a shell UI may issue (§6 "Shell command surface").
#[derive(Debug, Clone)]
pub enum Command {
    ListWindows,
    ListMonitors,
    Activate(Window),
    Close(Window),
    Minimize(Window),
    ToggleTiling,
    SetManualStrut { top: u32, bottom: u32, left: u32, right: u32 },
    SetWorkspace(usize),
}

/// Every command either succeeds (and schedules the appropriate side
/// effects through `Rdwm`) or is rejected: "command rejected" is the only
/// user-visible failure surface (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    Ok,
    Rejected,
}

/// Renders the current `ClientTable` into the shell's read model, filtering
/// out shell self-windows and dock clients (§4.9).
pub fn window_list(clients: &ClientTable, active: Option<Window>, shell_app_id: &str) -> Vec<WindowRecord> {
    clients
        .iter()
        .filter(|c| !c.is_dock())
        .filter(|c| !c.app_id.eq_ignore_ascii_case(shell_app_id))
        .map(|c| WindowRecord {
            id: c.window,
            title: c.title.clone(),
            icon_name: c.icon_name.clone(),
            app_id: c.app_id.clone(),
            active: Some(c.window) == active,
            workspace: c.workspace,
            state: c.state.into(),
        })
        .collect()
}

pub fn monitor_list(registry: &MonitorRegistry) -> Vec<Monitor> {
    registry.monitors().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;

    #[test]
    fn window_list_excludes_the_shell_itself() {
        let mut table = ClientTable::new();
        let mut shell_win = Client::new(1, 0);
        shell_win.app_id = "rdwm-shell".to_string();
        table.insert(shell_win);
        let mut normal = Client::new(2, 0);
        normal.app_id = "xterm".to_string();
        normal.title = "hello".to_string();
        table.insert(normal);

        let records = window_list(&table, None, "rdwm-shell");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "hello");
    }

    #[test]
    fn window_list_excludes_docks() {
        let mut table = ClientTable::new();
        let mut dock = Client::new(1, 0);
        dock.flags = crate::client::ClientFlags::DOCK;
        table.insert(dock);

        let records = window_list(&table, None, "rdwm-shell");
        assert!(records.is_empty());
    }

    #[test]
    fn active_window_is_flagged() {
        let mut table = ClientTable::new();
        table.insert(Client::new(5, 0));
        let records = window_list(&table, Some(5), "rdwm-shell");
        assert!(records[0].active);
    }
}
