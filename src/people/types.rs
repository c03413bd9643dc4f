use serde::{Deserialize, Serialize};

/// A contact as returned by `people.connections.list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub resource_name: String,
    #[serde(default)]
    pub names: Vec<Name>,
    #[serde(default)]
    pub phone_numbers: Vec<PhoneNumber>,
    #[serde(default)]
    pub memberships: Vec<Membership>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_form: Option<String>,
    /// Present when the number itself is tagged with a contact group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_group_membership: Option<ContactGroupMembership>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_group_membership: Option<ContactGroupMembership>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactGroupMembership {
    #[serde(default)]
    pub contact_group_resource_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_group_id: Option<String>,
}

/// One page of `people.connections.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionsPage {
    #[serde(default)]
    pub connections: Vec<Person>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactGroup {
    pub resource_name: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactGroupsPage {
    #[serde(default)]
    pub contact_groups: Vec<ContactGroup>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl Person {
    pub fn display_name(&self) -> &str {
        self.names
            .first()
            .map(|n| n.display_name.as_str())
            .unwrap_or_default()
    }

    /// Whether any of this person's memberships points at `group_resource_name`.
    pub fn is_member_of(&self, group_resource_name: &str) -> bool {
        self.memberships.iter().any(|m| {
            m.contact_group_membership
                .as_ref()
                .is_some_and(|g| g.contact_group_resource_name == group_resource_name)
        })
    }
}

impl Membership {
    pub fn of_group(group_resource_name: &str) -> Self {
        Self {
            contact_group_membership: Some(ContactGroupMembership {
                contact_group_resource_name: group_resource_name.to_string(),
                contact_group_id: None,
            }),
        }
    }
}
