//! Who is filing bugs.

use crate::settings::IdentitySettings;

/// The user filing bugs. Renaming it in the sidebar only affects bugs
/// filed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub uid: String,
    pub display_name: String,
}

impl CurrentUser {
    pub fn new(uid: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: display_name.into(),
        }
    }

    /// Resolve from settings, falling back to the OS account name.
    pub fn resolve(settings: &IdentitySettings) -> Self {
        let os_user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "anonymous".to_string());

        let display_name = settings
            .display_name
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| os_user.clone());
        let uid = settings
            .uid
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(os_user);

        Self::new(uid, display_name)
    }
}
