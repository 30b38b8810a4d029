//! Declarative per-resource tables.
//!
//! # Design
//! Issues, projects and users differ only in paths, field names and a few
//! filter rules. Each resource is therefore a static `ResourceSpec` value
//! and the translator is the only code that interprets them. Handler slices
//! are ordered; the translator applies them in that order.

use crate::types::{Operation, Resource};

/// How a `getAll` parameter becomes a query key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterHandler {
    /// Copy a non-empty filter value to the query key of the same name.
    Text(&'static str),

    /// `status_id` with a `custom` escape: when the status is `custom` and
    /// `custom` carries an id, that id wins.
    Status {
        param: &'static str,
        custom: &'static str,
    },

    /// A created/updated date filter spread over five parameters.
    Date(DateFilterParams),

    /// `customFields.field[]` as `cf_<id>=value` keys.
    CustomFields,
}

/// Parameter names making up one date filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFilterParams {
    pub key: &'static str,
    pub toggle: &'static str,
    pub mode: &'static str,
    pub value: &'static str,
    pub start: &'static str,
    pub end: &'static str,
}

/// Value type of a body field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Bool,
}

/// When an optional text/number field makes it into the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Included when set to something other than `""` or `0`.
    NonEmpty,
    /// Included whenever set, even to `""`.
    Explicit,
}

/// Optional body field read from `additionalFields` (or from the top-level
/// parameters for `update_fields`). Parameter and body key share the name
/// unless `key` says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyField {
    pub param: &'static str,
    pub key: &'static str,
    pub kind: FieldKind,
}

impl BodyField {
    const fn text(name: &'static str) -> Self {
        Self { param: name, key: name, kind: FieldKind::Text }
    }

    const fn number(name: &'static str) -> Self {
        Self { param: name, key: name, kind: FieldKind::Number }
    }

    const fn flag(name: &'static str) -> Self {
        Self { param: name, key: name, kind: FieldKind::Bool }
    }
}

/// Required create parameter and the body key it lands under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredField {
    pub param: &'static str,
    pub key: &'static str,
}

const fn required(param: &'static str, key: &'static str) -> RequiredField {
    RequiredField { param, key }
}

/// Static declaration of one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSpec {
    pub resource: Resource,
    pub base_path: &'static str,
    pub id_suffix: &'static str,
    /// Wrapper key of the create/update body.
    pub body_key: &'static str,
    /// Parameter holding the entity id for get/update/delete.
    pub id_param: &'static str,
    pub operations: &'static [Operation],
    /// Includes always sent with `get` and `getCurrent`.
    pub fixed_includes: &'static [&'static str],
    pub filters: &'static [FilterHandler],
    pub required_fields: &'static [RequiredField],
    pub body_fields: &'static [BodyField],
    /// Top-level parameters that only `update` reads into the body.
    pub update_fields: &'static [BodyField],
    pub update_presence: Presence,
    pub enabled_modules: bool,
}

impl ResourceSpec {
    pub fn supports(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }

    pub fn collection_path(&self) -> String {
        format!("{}{}", self.base_path, self.id_suffix)
    }

    /// `id` is percent-encoded as one path segment.
    pub fn member_path(&self, id: &str) -> String {
        format!("{}/{}{}", self.base_path, urlencoding::encode(id), self.id_suffix)
    }
}

/// Table for `resource`.
pub fn spec_for(resource: Resource) -> &'static ResourceSpec {
    match resource {
        Resource::Issue => &ISSUE,
        Resource::Project => &PROJECT,
        Resource::User => &USER,
    }
}

const CRUD: &[Operation] = &[
    Operation::Get,
    Operation::GetAll,
    Operation::Create,
    Operation::Update,
    Operation::Delete,
];

pub static ISSUE: ResourceSpec = ResourceSpec {
    resource: Resource::Issue,
    base_path: "/issues",
    id_suffix: ".json",
    body_key: "issue",
    id_param: "issueId",
    operations: CRUD,
    fixed_includes: &[],
    filters: &[
        FilterHandler::Text("issue_id"),
        FilterHandler::Text("project_id"),
        FilterHandler::Text("subproject_id"),
        FilterHandler::Text("tracker_id"),
        FilterHandler::Status {
            param: "status_id",
            custom: "custom_status_id",
        },
        FilterHandler::Text("assigned_to_id"),
        FilterHandler::Text("parent_id"),
        FilterHandler::Text("author_id"),
        FilterHandler::Text("priority_id"),
        FilterHandler::Text("category_id"),
        FilterHandler::Text("fixed_version_id"),
        FilterHandler::Text("target_version_id"),
        FilterHandler::Text("subject"),
        FilterHandler::Date(DateFilterParams {
            key: "created_on",
            toggle: "filterByCreationDate",
            mode: "creationDateFilterType",
            value: "creationDate",
            start: "creationDateStart",
            end: "creationDateEnd",
        }),
        FilterHandler::Date(DateFilterParams {
            key: "updated_on",
            toggle: "filterByUpdatedDate",
            mode: "updatedDateFilterType",
            value: "updatedDate",
            start: "updatedDateStart",
            end: "updatedDateEnd",
        }),
        FilterHandler::CustomFields,
    ],
    required_fields: &[required("projectId", "project_id"), required("subject", "subject")],
    body_fields: &[
        BodyField::text("description"),
        BodyField::text("status_id"),
        BodyField::text("tracker_id"),
        BodyField::text("priority_id"),
        BodyField::text("assigned_to_id"),
        BodyField::text("category_id"),
        BodyField::text("fixed_version_id"),
        BodyField::text("parent_issue_id"),
        BodyField::text("start_date"),
        BodyField::text("due_date"),
        BodyField::number("estimated_hours"),
        BodyField::flag("is_private"),
    ],
    update_fields: &[
        BodyField::text("subject"),
        BodyField::text("notes"),
        BodyField::flag("private_notes"),
    ],
    update_presence: Presence::NonEmpty,
    enabled_modules: false,
};

pub static PROJECT: ResourceSpec = ResourceSpec {
    resource: Resource::Project,
    base_path: "/projects",
    id_suffix: ".json",
    body_key: "project",
    id_param: "projectId",
    operations: CRUD,
    fixed_includes: &["trackers", "issue_categories", "enabled_modules"],
    filters: &[FilterHandler::Text("status")],
    required_fields: &[required("name", "name"), required("identifier", "identifier")],
    body_fields: &[
        BodyField::text("description"),
        BodyField::text("homepage"),
        BodyField::flag("is_public"),
        BodyField::text("parent_id"),
        BodyField::flag("inherit_members"),
    ],
    update_fields: &[],
    update_presence: Presence::Explicit,
    enabled_modules: true,
};

pub static USER: ResourceSpec = ResourceSpec {
    resource: Resource::User,
    base_path: "/users",
    id_suffix: ".json",
    body_key: "user",
    id_param: "userId",
    operations: &[
        Operation::Get,
        Operation::GetCurrent,
        Operation::GetAll,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ],
    fixed_includes: &["memberships", "groups"],
    filters: &[
        FilterHandler::Text("group_id"),
        FilterHandler::Text("name"),
        FilterHandler::Text("status"),
    ],
    required_fields: &[
        required("login", "login"),
        required("firstname", "firstname"),
        required("lastname", "lastname"),
        required("mail", "mail"),
        required("password", "password"),
    ],
    body_fields: &[
        BodyField::flag("admin"),
        BodyField::text("auth_source_id"),
        BodyField::text("mail_notification"),
        BodyField::flag("must_change_passwd"),
        BodyField::text("status"),
    ],
    update_fields: &[],
    update_presence: Presence::Explicit,
    enabled_modules: false,
};
