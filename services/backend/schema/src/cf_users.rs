use cf_collections::{
    AutodateField, Collection, DateField, EmailField, NumberField, SelectField, TextField,
};
use cf_domain::user::{UserRole, UserStatus};

use crate::AUTHENTICATED_ONLY;

pub const NAME: &str = "cf_users";

/// Application end users, grouped under a tenant.
pub fn collection() -> Collection {
    let mut users = Collection::new_base(NAME);
    users.list_rule = Some(AUTHENTICATED_ONLY.to_owned());
    users.view_rule = Some(AUTHENTICATED_ONLY.to_owned());

    users.fields.add(EmailField {
        name: "email".into(),
        required: true,
        presentable: true,
        ..Default::default()
    });
    users.fields.add(TextField {
        name: "name".into(),
        required: true,
        presentable: true,
        min: Some(1),
        max: Some(255),
        ..Default::default()
    });
    users.fields.add(TextField {
        name: "tenant_id".into(),
        required: true,
        ..Default::default()
    });
    users.fields.add(TextField {
        name: "product_id".into(),
        required: true,
        ..Default::default()
    });
    users.fields.add(SelectField {
        name: "role".into(),
        required: true,
        max_select: 1,
        values: UserRole::ALL.iter().map(|r| r.as_str().to_owned()).collect(),
        ..Default::default()
    });
    users.fields.add(SelectField {
        name: "status".into(),
        required: true,
        max_select: 1,
        values: UserStatus::ALL.iter().map(|s| s.as_str().to_owned()).collect(),
        ..Default::default()
    });
    users.fields.add(NumberField {
        name: "budget_limit".into(),
        min: Some(0.0),
        no_decimal: false,
        ..Default::default()
    });
    users.fields.add(NumberField {
        name: "budget_used".into(),
        min: Some(0.0),
        no_decimal: false,
        ..Default::default()
    });
    users.fields.add(TextField {
        name: "api_key".into(),
        ..Default::default()
    });
    users.fields.add(DateField {
        name: "last_login".into(),
        ..Default::default()
    });
    users.fields.add(AutodateField {
        name: "created".into(),
        system: true,
        on_create: true,
        ..Default::default()
    });
    users.fields.add(AutodateField {
        name: "updated".into(),
        system: true,
        on_create: true,
        on_update: true,
        ..Default::default()
    });

    users.add_index("idx_cf_users_email", true, "email", "");
    users.add_index("idx_cf_users_tenant", false, "tenant_id", "");
    users
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_collections::Field;

    #[test]
    fn should_declare_fields_in_order() {
        let users = collection();
        let fields: Vec<(&str, &str, bool)> = users
            .fields
            .iter()
            .map(|f| (f.name(), f.type_name(), f.is_required()))
            .collect();
        assert_eq!(
            fields,
            [
                ("email", "email", true),
                ("name", "text", true),
                ("tenant_id", "text", true),
                ("product_id", "text", true),
                ("role", "select", true),
                ("status", "select", true),
                ("budget_limit", "number", false),
                ("budget_used", "number", false),
                ("api_key", "text", false),
                ("last_login", "date", false),
                ("created", "autodate", false),
                ("updated", "autodate", false),
            ]
        );
    }

    #[test]
    fn should_constrain_role_and_status() {
        let users = collection();
        let Some(Field::Select(role)) = users.field("role") else {
            panic!("role should be a select field");
        };
        assert_eq!(role.values, ["user", "tenant_admin", "super_admin"]);
        assert_eq!(role.max_select, 1);

        let Some(Field::Select(status)) = users.field("status") else {
            panic!("status should be a select field");
        };
        assert_eq!(status.values, ["pending", "active", "suspended"]);
    }

    #[test]
    fn should_index_email_uniquely_and_tenant() {
        let users = collection();
        let indexes: Vec<(&str, bool, &[String])> = users
            .indexes
            .iter()
            .map(|i| (i.name.as_str(), i.unique, i.columns.as_slice()))
            .collect();
        assert_eq!(
            indexes,
            [
                ("idx_cf_users_email", true, &["email".to_owned()][..]),
                ("idx_cf_users_tenant", false, &["tenant_id".to_owned()][..]),
            ]
        );
    }

    #[test]
    fn should_present_email_and_name_and_mark_autodates_system() {
        let users = collection();
        let presentable: Vec<&str> = users
            .fields
            .iter()
            .filter(|f| f.is_presentable())
            .map(|f| f.name())
            .collect();
        assert_eq!(presentable, ["email", "name"]);

        let system: Vec<&str> = users
            .fields
            .iter()
            .filter(|f| f.is_system())
            .map(|f| f.name())
            .collect();
        assert_eq!(system, ["created", "updated"]);
    }

    #[test]
    fn should_allow_only_authenticated_reads() {
        let users = collection();
        assert_eq!(users.list_rule.as_deref(), Some(AUTHENTICATED_ONLY));
        assert_eq!(users.view_rule.as_deref(), Some(AUTHENTICATED_ONLY));
        assert!(users.create_rule.is_none());
        assert!(users.update_rule.is_none());
        assert!(users.delete_rule.is_none());
        assert!(users.validate().is_ok());
    }
}
