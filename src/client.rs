//! Client Table (§3, §4 component 4): the lifecycle of managed top-level
//! windows, independent of whether they are decorated.

use std::collections::HashMap;
use x11::xlib::Window;

bitflags! {
    /// Internal role/lifecycle flags. The floating-vs-tiled flag lives on
    /// `Frame` instead, since it is a geometry-engine property of the
    /// decoration, not the client's own lifecycle.
    pub struct ClientFlags: u32 {
        const NONE      = 0;
        const DOCK      = 1 << 0;
        const FULLSCREEN = 1 << 2;
        const UNDECORATED = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Normal,
    Minimized,
    Maximized,
}

/// A managed top-level window (§3 "Client").
#[derive(Debug, Clone)]
pub struct Client {
    pub window: Window,
    pub title: String,
    pub icon_name: String,
    pub app_id: String,
    pub mapped: bool,
    pub workspace: usize,
    pub state: ClientState,
    pub flags: ClientFlags,
    /// Non-owning reference; resolve through the Frame Registry.
    pub frame: Option<Window>,
}

impl Client {
    pub fn new(window: Window, workspace: usize) -> Self {
        Client {
            window,
            title: String::new(),
            icon_name: String::new(),
            app_id: String::new(),
            mapped: true,
            workspace,
            state: ClientState::Normal,
            flags: ClientFlags::NONE,
            frame: None,
        }
    }

    pub fn is_dock(&self) -> bool {
        self.flags.contains(ClientFlags::DOCK)
    }

    /// `floating` is the owning Frame's own floating-vs-tiled flag (§3
    /// "Frame"); a dock or fullscreen client is never tileable regardless.
    pub fn is_tileable(&self, floating: bool) -> bool {
        self.mapped
            && self.state != ClientState::Minimized
            && self.frame.is_some()
            && !floating
            && !self.flags.intersects(ClientFlags::DOCK | ClientFlags::FULLSCREEN)
    }
}

/// Owns every `Client` record, keyed by server window ID (§3 "Ownership summary").
#[derive(Debug, Default)]
pub struct ClientTable {
    clients: HashMap<Window, Client>,
}

impl ClientTable {
    pub fn new() -> Self {
        ClientTable { clients: HashMap::new() }
    }

    pub fn insert(&mut self, client: Client) {
        self.clients.insert(client.window, client);
    }

    pub fn remove(&mut self, window: Window) -> Option<Client> {
        self.clients.remove(&window)
    }

    pub fn get(&self, window: Window) -> Option<&Client> {
        self.clients.get(&window)
    }

    pub fn get_mut(&mut self, window: Window) -> Option<&mut Client> {
        self.clients.get_mut(&window)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Client> {
        self.clients.values_mut()
    }

    pub fn on_workspace(&self, workspace: usize) -> impl Iterator<Item = &Client> {
        self.clients.values().filter(move |c| c.workspace == workspace)
    }

    pub fn contains(&self, window: Window) -> bool {
        self.clients.contains_key(&window)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_client_defaults_to_normal_and_mapped() {
        let c = Client::new(1, 0);
        assert_eq!(c.state, ClientState::Normal);
        assert!(c.mapped);
        assert!(c.frame.is_none());
    }

    #[test]
    fn client_with_no_frame_is_never_tileable() {
        let c = Client::new(1, 0);
        assert!(!c.is_tileable(false));
    }

    #[test]
    fn dock_client_is_never_tileable_even_with_frame() {
        let mut c = Client::new(1, 0);
        c.frame = Some(1);
        c.flags = ClientFlags::DOCK;
        assert!(!c.is_tileable(false));
    }

    #[test]
    fn minimized_client_is_not_tileable() {
        let mut c = Client::new(1, 0);
        c.frame = Some(1);
        c.state = ClientState::Minimized;
        assert!(!c.is_tileable(false));
    }

    #[test]
    fn floating_frame_is_not_tileable() {
        let mut c = Client::new(1, 0);
        c.frame = Some(1);
        assert!(c.is_tileable(false));
        assert!(!c.is_tileable(true));
    }

    #[test]
    fn table_round_trips_insert_get_remove() {
        let mut table = ClientTable::new();
        table.insert(Client::new(42, 0));
        assert!(table.contains(42));
        assert_eq!(table.get(42).unwrap().window, 42);
        let removed = table.remove(42).unwrap();
        assert_eq!(removed.window, 42);
        assert!(!table.contains(42));
    }
}
