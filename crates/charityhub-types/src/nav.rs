//! Static navigation tables of the admin UI: sidebar, header menu and routes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Super,
    #[default]
    Simple,
}

pub const EVERYONE: &[Role] = &[Role::Admin, Role::Super, Role::Simple];
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SidebarEntry {
    Header {
        header: &'static str,
    },
    #[serde(rename_all = "camelCase")]
    Item {
        title: &'static str,
        icon: &'static str,
        to: &'static str,
        available_for: &'static [Role],
    },
}

pub const SIDEBAR: &[SidebarEntry] = &[
    SidebarEntry::Item {
        title: "Dashboard",
        icon: "grid",
        to: "/dashboard/",
        available_for: EVERYONE,
    },
    SidebarEntry::Header { header: "Menu" },
    SidebarEntry::Item {
        title: "Advertisements",
        icon: "bookmark",
        to: "/menu/advertisements",
        available_for: ADMIN_ONLY,
    },
    SidebarEntry::Item {
        title: "Charities",
        icon: "home",
        to: "/menu/charities",
        available_for: EVERYONE,
    },
    SidebarEntry::Item {
        title: "Connecting",
        icon: "folder-plus",
        to: "/menu/connections",
        available_for: EVERYONE,
    },
    SidebarEntry::Item {
        title: "Contents",
        icon: "book",
        to: "/menu/contents",
        available_for: EVERYONE,
    },
    SidebarEntry::Item {
        title: "Users",
        icon: "users",
        to: "/menu/users",
        available_for: ADMIN_ONLY,
    },
];

/// Sidebar entries visible to `role`.
///
/// A header survives only if at least one visible item follows it before the
/// next header.
pub fn sidebar_for(role: Role) -> Vec<SidebarEntry> {
    let mut visible = Vec::new();
    let mut pending_header = None;

    for entry in SIDEBAR {
        match entry {
            SidebarEntry::Header { .. } => pending_header = Some(*entry),
            SidebarEntry::Item { available_for, .. } => {
                if !available_for.contains(&role) {
                    continue;
                }
                if let Some(header) = pending_header.take() {
                    visible.push(header);
                }
                visible.push(*entry);
            }
        }
    }

    visible
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeaderItem {
    pub color: &'static str,
    pub icon: &'static str,
    pub title: &'static str,
    pub desc: &'static str,
    pub to: &'static str,
    pub logout: bool,
}

pub const HEADER_ITEMS: &[HeaderItem] = &[
    HeaderItem {
        color: "warning",
        icon: "settings",
        title: "Settings",
        desc: "Manage your account",
        to: "/settings",
        logout: false,
    },
    HeaderItem {
        color: "secondary",
        icon: "log-out",
        title: "Logout",
        desc: "Exit from your account",
        to: LOGIN_PATH,
        logout: true,
    },
];

// -- Routes --

pub const LOGIN_PATH: &str = "/authentication/fulllogin";
pub const HOME_PATH: &str = "/dashboard/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Sidebar + header chrome.
    Full,
    /// Bare page, used by authentication screens.
    Blank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Route {
    pub name: &'static str,
    pub path: &'static str,
    pub layout: Layout,
}

const fn full(name: &'static str, path: &'static str) -> Route {
    Route {
        name,
        path,
        layout: Layout::Full,
    }
}

pub const ROUTES: &[Route] = &[
    full("Dashboard", HOME_PATH),
    full("Charity List", "/menu/charities"),
    full("Add Charity", "/menu/charities/add-charity"),
    full("Modify Charity", "/menu/charities/modify-charity/:id"),
    full("Advertisements List", "/menu/advertisements"),
    full("Add Advertisement", "/menu/advertisements/add-advertisement"),
    full("Modify Advertisement", "/menu/advertisements/modify-advertisement/:id"),
    full("Content List", "/menu/contents"),
    full("Add Content", "/menu/contents/add-content"),
    full("Modify Content", "/menu/contents/modify-content/:category/:id"),
    full("Users", "/menu/users"),
    full("Add User", "/menu/users/add-user"),
    full("Modify User", "/menu/users/modify-user/:id"),
    full("Connections", "/menu/connections"),
    full("Add Connection", "/menu/connections/add-connection"),
    full("Modify Connection", "/menu/connections/modify-connection/:type/:id"),
    full("Modify Account", "/settings"),
    Route {
        name: "Login",
        path: LOGIN_PATH,
        layout: Layout::Blank,
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    pub route: Route,
    pub params: BTreeMap<&'static str, String>,
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

impl Route {
    pub fn by_name(name: &str) -> Option<&'static Route> {
        ROUTES.iter().find(|r| r.name == name)
    }

    /// Match a concrete path against this route's pattern.
    /// Trailing slashes are not significant.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<&'static str, String>> {
        let pattern: Vec<&'static str> = segments(self.path).collect();
        let actual: Vec<&str> = segments(path).collect();
        if pattern.len() != actual.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (want, got) in pattern.into_iter().zip(actual) {
            match want.strip_prefix(':') {
                Some(name) => {
                    params.insert(name, got.to_string());
                }
                None if want == got => {}
                None => return None,
            }
        }
        Some(params)
    }

    /// Render the route with its `:params` filled in. `None` if one is missing.
    pub fn href(&self, params: &[(&str, &str)]) -> Option<String> {
        let mut out = String::new();
        for seg in segments(self.path) {
            out.push('/');
            match seg.strip_prefix(':') {
                Some(name) => {
                    let (_, value) = params.iter().find(|(k, _)| *k == name)?;
                    out.push_str(value);
                }
                None => out.push_str(seg),
            }
        }
        if self.path.ends_with('/') {
            out.push('/');
        }
        Some(out)
    }
}

/// Find the route for `path`; the root redirects to the dashboard.
pub fn resolve(path: &str) -> Option<RouteMatch> {
    let path = match path.split('?').next().unwrap_or_default() {
        "" | "/" => HOME_PATH,
        p => p,
    };

    ROUTES.iter().find_map(|route| {
        route.matches(path).map(|params| RouteMatch {
            route: *route,
            params,
        })
    })
}
