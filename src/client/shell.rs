use std::{fmt, str::FromStr};

use super::{api::AuthApi, session::SessionContext, storage::SessionStorage};
use crate::auth::Permission;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Dashboard,
    Medicines,
    Stores,
    Supplies,
    Analytics,
    Users,
    Orders,
    Reports,
    Settings,
}

impl Tab {
    /// Sidebar order.
    pub const ALL: [Tab; 9] = [
        Tab::Dashboard,
        Tab::Medicines,
        Tab::Stores,
        Tab::Supplies,
        Tab::Analytics,
        Tab::Users,
        Tab::Orders,
        Tab::Reports,
        Tab::Settings,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tab::Dashboard => "dashboard",
            Tab::Medicines => "medicines",
            Tab::Stores => "stores",
            Tab::Supplies => "supplies",
            Tab::Analytics => "analytics",
            Tab::Users => "users",
            Tab::Orders => "orders",
            Tab::Reports => "reports",
            Tab::Settings => "settings",
        }
    }

    pub fn required_permission(self) -> Permission {
        match self {
            Tab::Dashboard | Tab::Settings => Permission::ViewDashboard,
            Tab::Medicines | Tab::Stores | Tab::Supplies => Permission::ViewInventory,
            Tab::Analytics | Tab::Reports => Permission::ViewAnalytics,
            Tab::Users => Permission::ManageUsers,
            Tab::Orders => Permission::ViewOrders,
        }
    }

    /// Tabs without a management panel yet render a placeholder.
    pub fn is_implemented(self) -> bool {
        !matches!(self, Tab::Orders | Tab::Reports | Tab::Settings)
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Tab::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| anyhow::anyhow!("unknown tab: {s}"))
    }
}

/// What the main area shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Login,
    AccessDenied(Tab),
    Placeholder(Tab),
    Dashboard,
    Medicines,
    Stores,
    Supplies,
    Analytics,
    Users,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shell {
    pub selected: Tab,
    pub sidebar_open: bool,
}

impl Default for Shell {
    fn default() -> Self {
        Self {
            selected: Tab::Dashboard,
            sidebar_open: true,
        }
    }
}

impl Shell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, tab: Tab) {
        self.selected = tab;
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    /// Tabs the current user may open.
    pub fn visible_tabs<S: SessionStorage, A: AuthApi>(
        &self,
        session: &SessionContext<S, A>,
    ) -> Vec<Tab> {
        Tab::ALL
            .into_iter()
            .filter(|t| session.can(t.required_permission()))
            .collect()
    }

    pub fn panel<S: SessionStorage, A: AuthApi>(&self, session: &SessionContext<S, A>) -> Panel {
        let tab = self.selected;
        if !session.is_authenticated() {
            return Panel::Login;
        }
        if !session.can(tab.required_permission()) {
            return Panel::AccessDenied(tab);
        }
        match tab {
            Tab::Dashboard => Panel::Dashboard,
            Tab::Medicines => Panel::Medicines,
            Tab::Stores => Panel::Stores,
            Tab::Supplies => Panel::Supplies,
            Tab::Analytics => Panel::Analytics,
            Tab::Users => Panel::Users,
            Tab::Orders | Tab::Reports | Tab::Settings => Panel::Placeholder(tab),
        }
    }
}
