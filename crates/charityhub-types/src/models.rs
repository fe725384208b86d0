//! Records kept in the document store, one collection per type.
//!
//! Field names follow the stored documents (camelCase). Every field defaults
//! so documents written by older clients still load.

use serde::{Deserialize, Serialize};

use crate::backend::Filter;
use crate::entity::{AttachmentSlot, Entity, Flag};
use crate::nav::{ADMIN_ONLY, Role};

// -- Charities --

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Charity {
    pub id: String,
    pub accounts_date: String,
    pub address: String,
    pub beneficiary: String,
    pub category: String,
    pub charity_number: String,
    #[serde(rename = "charityURL")]
    pub charity_url: String,
    pub collected_donation: String,
    pub contact_email: String,
    pub contact_name: String,
    pub contact_number: String,
    pub country: String,
    pub cover_picture: String,
    pub created_by: String,
    pub display_picture: String,
    pub documents: String,
    pub facebook: String,
    pub feed: String,
    pub instagram: String,
    pub is_featured: bool,
    pub is_verified: bool,
    pub last_checked: String,
    pub likes: u64,
    pub long_description: String,
    pub operation: String,
    pub private: bool,
    pub registration_date: String,
    pub remove_date: String,
    pub short_description: String,
    pub start_date: String,
    pub status: String,
    pub subtitle: String,
    pub title: String,
    pub total_income: String,
    pub total_spent: String,
    pub twitter: String,
    #[serde(rename = "URL")]
    pub url: String,
    pub user: String,
    pub views: u64,
    pub website: String,
    pub youtube: String,
}

/// Editable charity details. Attachments, flags and counters are managed
/// through their own actions.
///
/// Patch types only carry the fields a client sent; `None` leaves the stored
/// value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CharityChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accounts_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charity_number: Option<String>,
    #[serde(rename = "charityURL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charity_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collected_donation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_income: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_spent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(rename = "URL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
}

const CHARITY_ATTACHMENTS: &[AttachmentSlot] = &[
    AttachmentSlot {
        field: "coverPicture",
        dir: "cover_picture",
        file_name: "cover_picture.jpeg",
        content_type: "image/jpeg",
    },
    AttachmentSlot {
        field: "displayPicture",
        dir: "display_picture",
        file_name: "display_picture.jpeg",
        content_type: "image/jpeg",
    },
    AttachmentSlot {
        field: "documents",
        dir: "documents",
        file_name: "document.pdf",
        content_type: "application/pdf",
    },
];

impl Entity for Charity {
    type Changes = CharityChanges;

    const COLLECTION: &'static str = "charities";
    const ORDER_BY: &'static str = "title";
    const ATTACHMENTS: &'static [AttachmentSlot] = CHARITY_ATTACHMENTS;

    fn id(&self) -> &str {
        &self.id
    }

    /// Private charities never show up in the admin list.
    fn filters() -> Vec<Filter> {
        vec![Filter::eq("private", false)]
    }

    fn flag(&self, flag: Flag) -> Option<bool> {
        match flag {
            Flag::Featured => Some(self.is_featured),
            Flag::Verified => Some(self.is_verified),
        }
    }

    fn set_flag(&mut self, flag: Flag, value: bool) -> bool {
        match flag {
            Flag::Featured => self.is_featured = value,
            Flag::Verified => self.is_verified = value,
        }
        true
    }

    fn attachment_url(&self, field: &str) -> Option<&str> {
        match field {
            "coverPicture" => Some(&self.cover_picture),
            "displayPicture" => Some(&self.display_picture),
            "documents" => Some(&self.documents),
            _ => None,
        }
    }
}

// -- Advertisements --

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Advertisement {
    pub id: String,
    pub created_by: String,
    pub date: String,
    pub file: String,
    pub is_featured: bool,
    pub likes: u64,
    pub long_description: String,
    pub source: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub views: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdvertisementChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_in_menu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

const FILE_ATTACHMENT: &[AttachmentSlot] = &[AttachmentSlot {
    field: "file",
    dir: "files",
    file_name: "file",
    content_type: "application/octet-stream",
}];

impl Entity for Advertisement {
    type Changes = AdvertisementChanges;

    const COLLECTION: &'static str = "ads";
    const ORDER_BY: &'static str = "title";
    const ATTACHMENTS: &'static [AttachmentSlot] = FILE_ATTACHMENT;
    const MANAGED_BY: &'static [Role] = ADMIN_ONLY;

    fn id(&self) -> &str {
        &self.id
    }

    fn flag(&self, flag: Flag) -> Option<bool> {
        (flag == Flag::Featured).then_some(self.is_featured)
    }

    fn set_flag(&mut self, flag: Flag, value: bool) -> bool {
        if flag != Flag::Featured {
            return false;
        }
        self.is_featured = value;
        true
    }

    fn attachment_url(&self, field: &str) -> Option<&str> {
        (field == "file").then_some(self.file.as_str())
    }
}

// -- Contents --

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Content {
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub created_by: String,
    pub date: String,
    pub file: String,
    pub is_featured: bool,
    pub likes: u64,
    pub views: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Entity for Content {
    type Changes = ContentChanges;

    const COLLECTION: &'static str = "contents";
    const ORDER_BY: &'static str = "title";
    const ATTACHMENTS: &'static [AttachmentSlot] = FILE_ATTACHMENT;

    fn id(&self) -> &str {
        &self.id
    }

    fn flag(&self, flag: Flag) -> Option<bool> {
        (flag == Flag::Featured).then_some(self.is_featured)
    }

    fn set_flag(&mut self, flag: Flag, value: bool) -> bool {
        if flag != Flag::Featured {
            return false;
        }
        self.is_featured = value;
        true
    }

    fn attachment_url(&self, field: &str) -> Option<&str> {
        (field == "file").then_some(self.file.as_str())
    }
}

// -- Users --

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Entity for User {
    type Changes = UserChanges;

    const COLLECTION: &'static str = "users";
    const ORDER_BY: &'static str = "name";
    const MANAGED_BY: &'static [Role] = ADMIN_ONLY;

    fn id(&self) -> &str {
        &self.id
    }
}

// -- Connections --

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(rename = "URL")]
    pub url: String,
    pub created_by: String,
    pub is_verified: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "URL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Entity for Connection {
    type Changes = ConnectionChanges;

    const COLLECTION: &'static str = "connections";
    const ORDER_BY: &'static str = "title";

    fn id(&self) -> &str {
        &self.id
    }

    fn flag(&self, flag: Flag) -> Option<bool> {
        (flag == Flag::Verified).then_some(self.is_verified)
    }

    fn set_flag(&mut self, flag: Flag, value: bool) -> bool {
        if flag != Flag::Verified {
            return false;
        }
        self.is_verified = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn charity_uses_stored_field_names() {
        let charity = Charity {
            charity_url: "https://example.org".into(),
            url: "https://x".into(),
            is_featured: true,
            ..Default::default()
        };
        let value = serde_json::to_value(&charity).unwrap();
        assert_eq!(value["charityURL"], json!("https://example.org"));
        assert_eq!(value["URL"], json!("https://x"));
        assert_eq!(value["isFeatured"], json!(true));
        assert!(value.get("charityUrl").is_none());
    }

    #[test]
    fn charity_attachment_urls_skip_empty() {
        let charity = Charity {
            cover_picture: "http://files/cover".into(),
            ..Default::default()
        };
        let urls = charity.attachment_urls();
        assert_eq!(urls.len(), 1);
        assert_eq!(urls["coverPicture"], "http://files/cover");
    }

    #[test]
    fn unsupported_flags_report_none() {
        let mut ad = Advertisement::default();
        assert_eq!(ad.flag(Flag::Verified), None);
        assert!(!ad.set_flag(Flag::Verified, true));
        assert_eq!(User::default().flag(Flag::Featured), None);
    }

    #[test]
    fn advertisement_reads_type_field() {
        let ad: Advertisement =
            serde_json::from_value(json!({"type": "banner", "title": "T"})).unwrap();
        assert_eq!(ad.kind, "banner");
        assert!(ad.id.is_empty());
    }

    #[test]
    fn admin_only_collections_match_the_sidebar() {
        use crate::nav::{SIDEBAR, SidebarEntry};

        let roles_for = |to: &str| {
            SIDEBAR.iter().find_map(|entry| match entry {
                SidebarEntry::Item {
                    to: path,
                    available_for,
                    ..
                } if *path == to => Some(*available_for),
                _ => None,
            })
        };

        assert_eq!(roles_for("/menu/advertisements"), Some(Advertisement::MANAGED_BY));
        assert_eq!(roles_for("/menu/users"), Some(User::MANAGED_BY));
        assert_eq!(roles_for("/menu/charities"), Some(Charity::MANAGED_BY));
        assert!(!User::managed_by(Role::Super));
        assert!(Content::managed_by(Role::Simple));
    }

    #[test]
    fn changes_serialize_only_sent_fields() {
        let changes: AdvertisementChanges =
            serde_json::from_value(json!({"title": "New", "type": "banner"})).unwrap();
        let value = serde_json::to_value(&changes).unwrap();
        assert_eq!(value, json!({"title": "New", "type": "banner"}));

        let empty = serde_json::to_value(CharityChanges::default()).unwrap();
        assert_eq!(empty, json!({}));
    }
}
