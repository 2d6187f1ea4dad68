//! Sidebar menu sent to the frontend after sign-in; depends on the role.

use serde::Serialize;
use utoipa::ToSchema;

use super::Role;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MenuEntry {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MenuSection {
    pub title: String,
    pub icon: String,
    pub submenu: Vec<MenuEntry>,
}

fn entry(title: &str, url: &str) -> MenuEntry {
    MenuEntry {
        title: title.to_string(),
        url: url.to_string(),
    }
}

/// Dashboard and Maintenance sections. Admins also get the Users screen.
pub fn frontend_menu(role: Role) -> Vec<MenuSection> {
    let mut maintenance = vec![entry("Hospitals", "hospitals"), entry("Doctors", "doctors")];

    match role {
        Role::Admin => maintenance.insert(0, entry("Users", "users")),
        Role::User => {}
    }

    vec![
        MenuSection {
            title: "Dashboard".to_string(),
            icon: "mdi mdi-gauge".to_string(),
            submenu: vec![
                entry("Main", "/"),
                entry("Charts", "grafica1"),
                entry("ProgressBar", "progress"),
                entry("Promises", "promesas"),
                entry("Rxjs", "rxjs"),
            ],
        },
        MenuSection {
            title: "Maintenance".to_string(),
            icon: "mdi mdi-folder-lock-open".to_string(),
            submenu: maintenance,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admins_see_users_first() {
        let menu = frontend_menu(Role::Admin);
        assert_eq!(menu[1].submenu[0], entry("Users", "users"));
        assert_eq!(menu[1].submenu.len(), 3);
    }

    #[test]
    fn regular_users_do_not_see_users() {
        let menu = frontend_menu(Role::User);
        assert!(menu[1].submenu.iter().all(|e| e.url != "users"));
        assert_eq!(menu[0].submenu.len(), 5);
    }
}
